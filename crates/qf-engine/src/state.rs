use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{DMatrix, Dim, Matrix, Matrix2, Matrix4, RawStorage};
use qf_core::{ErrorInfo, Pole, QfError, RngHandle, Symbol, C64};
use qf_icon::IconSet;
use qf_register::sparse::transition;
use qf_register::{RegisterMap, SparseOperator};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bloch::BlochVector;
use crate::gates::{SingleAxisGate, TwoAxisGate};
use crate::graph::EntanglementGraph;
use crate::linalg;

/// Tolerance on `|Tr ρ - 1|` before a renormalization is logged.
pub const TRACE_TOLERANCE: f64 = 1e-6;

/// Largest `rate * dt` a single drive or decay substep may take.
pub const MAX_PUMP_FRACTION: f64 = 0.5;

fn pump_substeps(strength: f64) -> usize {
    if strength <= MAX_PUMP_FRACTION {
        1
    } else {
        (strength / MAX_PUMP_FRACTION).ceil() as usize
    }
}

/// Lifecycle of a register state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No basis state chosen yet.
    Uninitialized,
    /// Prepared in a basis state, untouched since.
    Initialized,
    /// At least one gate, drive, decay or evolution step applied.
    Evolving,
    /// Every labelled axis has been measured.
    Measured,
}

pub(crate) fn engine_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Density operator over a register, with entanglement bookkeeping and
/// per-axis measurement flags.
///
/// The state exclusively owns its density operator and RNG; nothing else
/// mutates them.
#[derive(Debug, Clone)]
pub struct RegisterState {
    pub(crate) map: RegisterMap,
    pub(crate) rho: DMatrix<C64>,
    pub(crate) phase: Phase,
    pub(crate) measured: BTreeMap<usize, Pole>,
    pub(crate) graph: EntanglementGraph,
    pub(crate) inverted: BTreeSet<Symbol>,
    pub(crate) rng: RngHandle,
}

impl RegisterState {
    /// Uninitialized state over a register map.
    pub fn new(map: RegisterMap, rng: RngHandle) -> Self {
        let dim = map.dimension();
        Self {
            map,
            rho: DMatrix::zeros(dim, dim),
            phase: Phase::Uninitialized,
            measured: BTreeMap::new(),
            graph: EntanglementGraph::new(),
            inverted: BTreeSet::new(),
            rng,
        }
    }

    /// Flags every registered symbol whose icon inverts measurement.
    pub fn inherit_inversions(&mut self, icons: &IconSet) {
        for symbol in self.map.symbols() {
            if icons.get(symbol.as_str()).map_or(false, |icon| icon.measurement_inversion) {
                self.inverted.insert(symbol.clone());
            }
        }
    }

    /// Sets or clears inversion for one symbol.
    pub fn set_inversion(&mut self, symbol: impl Into<Symbol>, inverted: bool) {
        let symbol = symbol.into();
        if inverted {
            self.inverted.insert(symbol);
        } else {
            self.inverted.remove(&symbol);
        }
    }

    /// Whether measuring onto this symbol reports the opposite pole.
    pub fn is_inverted(&self, symbol: &str) -> bool {
        self.inverted.contains(symbol)
    }

    /// Register map the state is defined over.
    pub fn map(&self) -> &RegisterMap {
        &self.map
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Density operator.
    pub fn density(&self) -> &DMatrix<C64> {
        &self.rho
    }

    /// Entanglement graph.
    pub fn graph(&self) -> &EntanglementGraph {
        &self.graph
    }

    /// Number of axes spanned.
    pub fn axis_count(&self) -> usize {
        self.map.axis_count()
    }

    /// Pinned pole of a measured axis.
    pub fn measured_pole(&self, axis: usize) -> Option<Pole> {
        self.measured.get(&axis).copied()
    }

    /// Whether the axis has been measured.
    pub fn is_measured(&self, axis: usize) -> bool {
        self.measured.contains_key(&axis)
    }

    /// Every measured axis.
    pub fn measured_axes(&self) -> BTreeSet<usize> {
        self.measured.keys().copied().collect()
    }

    /// Prepares every axis in `pole`.
    pub fn initialize_all(&mut self, pole: Pole) {
        let index = match pole {
            Pole::North => 0,
            Pole::South => self.map.dimension() - 1,
        };
        self.prepare(index);
    }

    /// Prepares the basis state `index`.
    pub fn initialize_basis(&mut self, index: usize) -> Result<(), QfError> {
        let dim = self.map.dimension();
        if index >= dim {
            return Err(QfError::Engine(
                engine_error("basis-out-of-range", "basis index exceeds register dimension")
                    .with_context("index", index)
                    .with_context("dimension", dim),
            ));
        }
        self.prepare(index);
        Ok(())
    }

    fn prepare(&mut self, index: usize) {
        let dim = self.map.dimension();
        self.rho = DMatrix::zeros(dim, dim);
        self.rho[(index, index)] = C64::new(1.0, 0.0);
        self.measured.clear();
        self.graph.clear();
        self.phase = Phase::Initialized;
        debug!(index, dim, "register initialized");
    }

    /// Drops the density operator, measurement flags and entanglement.
    pub fn reset(&mut self) {
        let dim = self.map.dimension();
        self.rho = DMatrix::zeros(dim, dim);
        self.measured.clear();
        self.graph.clear();
        self.phase = Phase::Uninitialized;
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), QfError> {
        if self.phase == Phase::Uninitialized {
            return Err(QfError::engine("state-uninitialized", "register has not been initialized"));
        }
        Ok(())
    }

    /// Checks that `axis` exists and has not been measured.
    pub(crate) fn ensure_live(&self, axis: usize) -> Result<(), QfError> {
        if axis >= self.axis_count() {
            return Err(QfError::Engine(
                engine_error("axis-unknown", "axis is outside the register")
                    .with_context("axis", axis)
                    .with_context("axis_count", self.axis_count()),
            ));
        }
        if self.is_measured(axis) {
            return Err(QfError::Engine(
                engine_error("axis-measured", "axis has already been measured")
                    .with_context("axis", axis)
                    .with_hint("reset and re-initialize the register to reuse it"),
            ));
        }
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        if self.phase == Phase::Initialized {
            self.phase = Phase::Evolving;
        }
    }

    /// Conjugates the state by a single-axis unitary.
    pub fn apply_gate_1q(&mut self, axis: usize, unitary: &Matrix2<C64>) -> Result<(), QfError> {
        self.ensure_ready()?;
        self.ensure_live(axis)?;
        self.conjugate(&[axis], unitary);
        self.touch();
        Ok(())
    }

    /// Conjugates the state by a two-axis unitary; `first` is the high bit.
    pub fn apply_gate_2q(
        &mut self,
        first: usize,
        second: usize,
        unitary: &Matrix4<C64>,
    ) -> Result<(), QfError> {
        self.ensure_ready()?;
        if first == second {
            return Err(QfError::Engine(
                engine_error("axis-repeated", "two-axis gate needs distinct axes")
                    .with_context("axis", first),
            ));
        }
        self.ensure_live(first)?;
        self.ensure_live(second)?;
        self.conjugate(&[first, second], unitary);
        self.touch();
        Ok(())
    }

    pub(crate) fn conjugate<R, C, S>(&mut self, axes: &[usize], unitary: &Matrix<C64, R, C, S>)
    where
        R: Dim,
        C: Dim,
        S: RawStorage<C64, R, C>,
    {
        let dense = DMatrix::from_fn(unitary.nrows(), unitary.ncols(), |r, c| unitary[(r, c)]);
        linalg::conjugate_by(&mut self.rho, axes, &dense);
    }

    /// One Euler step of `L = sqrt(rate) |pole><¬pole|` on the symbol's axis,
    /// pushing population onto the symbol's pole.
    ///
    /// A step with `rate * dt` above [`MAX_PUMP_FRACTION`] is split into
    /// equal substeps so the source pole never overshoots below zero.
    pub fn apply_drive(&mut self, symbol: &str, rate: f64, dt: f64) -> Result<(), QfError> {
        let Some((axis, pole)) = self.map.coordinate(symbol) else {
            return Err(QfError::Engine(
                engine_error("symbol-unknown", "symbol is not registered").with_context("symbol", symbol),
            ));
        };
        self.pump(axis, pole, rate, dt)
    }

    /// One Euler step of `L = sqrt(rate) |south><north|` on an axis.
    pub fn apply_decay(&mut self, axis: usize, rate: f64, dt: f64) -> Result<(), QfError> {
        self.pump(axis, Pole::South, rate, dt)
    }

    fn pump(&mut self, axis: usize, pole: Pole, rate: f64, dt: f64) -> Result<(), QfError> {
        self.ensure_ready()?;
        self.ensure_live(axis)?;
        if !(rate >= 0.0 && dt >= 0.0) {
            return Err(QfError::Engine(
                engine_error("invalid-rate", "rate and dt must be non-negative")
                    .with_context("rate", rate)
                    .with_context("dt", dt),
            ));
        }
        let dim = self.map.dimension();
        let mut jump = SparseOperator::zeros(dim);
        jump.add_scaled(
            &transition(dim, axis, pole.opposite(), pole),
            C64::new(rate.sqrt(), 0.0),
        );
        let channels = [linalg::Channel::new(&jump)];
        let steps = pump_substeps(rate * dt);
        let sub_dt = C64::new(dt / steps as f64, 0.0);
        for _ in 0..steps {
            let drho = linalg::lindblad_rate(&self.rho, None, &channels);
            self.rho += drho * sub_dt;
            self.renormalize()?;
        }
        self.touch();
        Ok(())
    }

    /// Hermitizes and rescales the density operator to unit trace.
    pub(crate) fn renormalize(&mut self) -> Result<(), QfError> {
        self.rho = linalg::hermitian_part(&self.rho);
        let trace = linalg::trace(&self.rho);
        if !trace.is_finite() || trace <= f64::EPSILON {
            return Err(QfError::Engine(
                engine_error("trace-collapse", "density operator lost its trace")
                    .with_context("trace", trace)
                    .with_hint("lower max_dt so each Euler substep stays small"),
            ));
        }
        if (trace - 1.0).abs() > TRACE_TOLERANCE {
            debug!(trace, "renormalizing density operator");
        }
        self.rho /= C64::new(trace, 0.0);
        Ok(())
    }

    /// Probability of `pole` on `axis`; `0.0` for axes outside the register.
    pub fn marginal(&self, axis: usize, pole: Pole) -> f64 {
        if axis >= self.axis_count() {
            return 0.0;
        }
        linalg::marginal(&self.rho, axis, pole)
    }

    /// Probability of the pole a symbol labels.
    pub fn population(&self, symbol: &str) -> Option<f64> {
        self.map
            .coordinate(symbol)
            .map(|(axis, pole)| self.marginal(axis, pole))
    }

    /// Diagonal entry at a basis index; `0.0` outside the register.
    pub fn basis_probability(&self, index: usize) -> f64 {
        if index >= self.rho.nrows() {
            return 0.0;
        }
        self.rho[(index, index)].re
    }

    /// Every basis probability in index order.
    pub fn basis_probabilities(&self) -> Vec<f64> {
        self.rho.diagonal().iter().map(|value| value.re).collect()
    }

    /// `Tr ρ`.
    pub fn trace(&self) -> f64 {
        linalg::trace(&self.rho)
    }

    /// `Tr ρ²`.
    pub fn purity(&self) -> f64 {
        (&self.rho * &self.rho).trace().re
    }

    /// Population of every registered symbol.
    pub fn populations(&self) -> BTreeMap<Symbol, f64> {
        self.map
            .axes()
            .flat_map(|axis| {
                [Pole::North, Pole::South]
                    .into_iter()
                    .map(move |pole| (axis.symbol(pole).clone(), self.marginal(axis.index, pole)))
            })
            .collect()
    }

    /// Mutual information between two axes in bits, `S(A) + S(B) - S(AB)`.
    ///
    /// Returns `0.0` for identical or out-of-range axes.
    pub fn mutual_information(&self, a: usize, b: usize) -> f64 {
        let count = self.axis_count();
        if a == b || a >= count || b >= count {
            return 0.0;
        }
        let s_a = linalg::entropy_bits(&linalg::reduced(&self.rho, &[a]));
        let s_b = linalg::entropy_bits(&linalg::reduced(&self.rho, &[b]));
        let s_ab = linalg::entropy_bits(&linalg::reduced(&self.rho, &[a, b]));
        (s_a + s_b - s_ab).max(0.0)
    }

    /// Bloch vector of one axis, traced over the rest of the register.
    pub fn bloch(&self, axis: usize) -> Option<BlochVector> {
        if axis >= self.axis_count() {
            return None;
        }
        Some(BlochVector::from_reduced(&linalg::reduced(&self.rho, &[axis])))
    }

    /// Bloch vector of every labelled axis.
    pub fn bloch_vectors(&self) -> BTreeMap<usize, BlochVector> {
        self.map
            .axes()
            .filter_map(|axis| self.bloch(axis.index).map(|bloch| (axis.index, bloch)))
            .collect()
    }

    /// Mutual information of every labelled axis pair `(a, b)` with `a < b`,
    /// in ascending order.
    pub fn all_mutual_information(&self) -> Vec<(usize, usize, f64)> {
        let axes: Vec<usize> = self.map.axes().map(|axis| axis.index).collect();
        let mut out = Vec::new();
        for (pos, &a) in axes.iter().enumerate() {
            for &b in &axes[pos + 1..] {
                out.push((a, b, self.mutual_information(a, b)));
            }
        }
        out
    }

    /// Hadamard on `a` then CNOT `a -> b`, linking both in the graph.
    pub fn entangle(&mut self, a: usize, b: usize) -> Result<(), QfError> {
        self.ensure_ready()?;
        if a == b {
            return Err(QfError::Engine(
                engine_error("axis-repeated", "cannot entangle an axis with itself")
                    .with_context("axis", a),
            ));
        }
        self.ensure_live(a)?;
        self.ensure_live(b)?;
        self.conjugate(&[a], &SingleAxisGate::H.matrix());
        self.conjugate(&[a, b], &TwoAxisGate::Cnot.matrix());
        self.graph.link(a, b);
        self.touch();
        debug!(a, b, "axes entangled");
        Ok(())
    }

    /// Entangles consecutive axes of a chain, returning the number of links.
    ///
    /// Unknown or measured axes are dropped from the chain with a warning;
    /// the remaining axes are linked in order.
    pub fn create_cluster(&mut self, axes: &[usize]) -> usize {
        let chain = self.cluster_chain(axes);
        let mut links = 0;
        for pair in chain.windows(2) {
            match self.entangle(pair[0], pair[1]) {
                Ok(()) => links += 1,
                Err(err) => warn!(a = pair[0], b = pair[1], error = %err, "cluster link failed"),
            }
        }
        links
    }

    /// Live axes of `axes` in order, first occurrence only.
    pub(crate) fn cluster_chain(&self, axes: &[usize]) -> Vec<usize> {
        let mut chain: Vec<usize> = Vec::with_capacity(axes.len());
        for &axis in axes {
            match self.ensure_live(axis) {
                Ok(()) if !chain.contains(&axis) => chain.push(axis),
                Ok(()) => warn!(axis, "axis repeated in cluster; skipped"),
                Err(err) => warn!(axis, error = %err, "cluster axis skipped"),
            }
        }
        chain
    }

    /// Removes the graph edge `a - b` without touching the density
    /// operator; the axes stay correlated until measured.
    pub fn remove_entanglement(&mut self, a: usize, b: usize) -> bool {
        self.graph.unlink(a, b)
    }
}
