use std::collections::{BTreeMap, BTreeSet};

use qf_core::{Pole, Symbol, C64};
use qf_icon::{Icon, IconSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::map::RegisterMap;
use crate::report::{BuildReport, SkipReason, SkippedTerm, TermKind};
use crate::sparse::{cross_transition, pauli_z, projector, transition, SparseOperator};

/// Instance state the builders read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildContext {
    /// Simulation time used to evaluate drivers.
    pub time: f64,
    /// Population per symbol, used for gates and alignment observables.
    pub populations: BTreeMap<Symbol, f64>,
    /// Axes already measured; every term touching them is left out.
    pub measured_axes: BTreeSet<usize>,
    /// Axes with an entanglement partner; enables bell features.
    pub entangled_axes: BTreeSet<usize>,
    /// Dephasing rate applied to every axis before icon contributions.
    pub base_dephasing: f64,
}

/// Label of a pure dephasing channel.
pub const DEPHASING_LABEL: &str = "dephasing";

/// Lindblad jump operator, already scaled by `sqrt(rate)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpOperator {
    /// `from->to`, or `dephasing@axis`.
    pub label: String,
    /// Term family, `None` for dephasing.
    pub kind: Option<TermKind>,
    /// Effective rate.
    pub rate: f64,
    /// Scaled operator.
    pub operator: SparseOperator,
}

/// Hamiltonian plus jump operators for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSet {
    /// Hermitian generator.
    pub hamiltonian: SparseOperator,
    /// Dissipative channels.
    pub jumps: Vec<JumpOperator>,
    /// Build diagnostics.
    pub report: BuildReport,
}

impl OperatorSet {
    /// Basis dimension.
    pub fn dimension(&self) -> usize {
        self.hamiltonian.dimension()
    }
}

fn skip(report: &mut BuildReport, kind: TermKind, symbol: &Symbol, endpoint: &Symbol, reason: SkipReason) {
    debug!(?kind, %symbol, %endpoint, ?reason, "coupling term skipped");
    report.skipped.push(SkippedTerm {
        kind,
        symbol: symbol.clone(),
        endpoint: endpoint.clone(),
        reason,
    });
}

/// Resolves both endpoints of a term, recording a skip when either is
/// unregistered or measured.
fn resolve(
    map: &RegisterMap,
    ctx: &BuildContext,
    report: &mut BuildReport,
    kind: TermKind,
    owner: &Symbol,
    endpoints: [&Symbol; 2],
) -> Option<[(usize, Pole); 2]> {
    let mut coords = [(0usize, Pole::North); 2];
    for (slot, endpoint) in coords.iter_mut().zip(endpoints) {
        let Some(coord) = map.coordinate(endpoint.as_str()) else {
            skip(report, kind, owner, endpoint, SkipReason::UnregisteredEndpoint);
            return None;
        };
        *slot = coord;
    }
    for ((axis, _), endpoint) in coords.iter().zip(endpoints) {
        if ctx.measured_axes.contains(axis) {
            skip(report, kind, owner, endpoint, SkipReason::MeasuredAxis);
            return None;
        }
    }
    Some(coords)
}

/// Operator moving amplitude from one coordinate to another, or `None`
/// when both name the same pole.
fn transfer(dimension: usize, from: (usize, Pole), to: (usize, Pole)) -> Option<SparseOperator> {
    if from == to {
        None
    } else if from.0 == to.0 {
        Some(transition(dimension, from.0, from.1, to.1))
    } else {
        Some(cross_transition(dimension, from, to))
    }
}

fn registered_icons<'a>(
    map: &'a RegisterMap,
    icons: &'a IconSet,
) -> impl Iterator<Item = (usize, Pole, &'a Icon)> + 'a {
    map.axes().flat_map(move |axis| {
        [Pole::North, Pole::South]
            .into_iter()
            .filter_map(move |pole| icons.get(axis.symbol(pole).as_str()).map(|icon| (axis.index, pole, icon)))
    })
}

/// Projects icon couplings onto a register as a Hermitian generator.
///
/// Self-energies (with driver and alignment modulation) sit on the pole
/// projector. A coupling between poles of one axis is a rotation on that
/// axis; a coupling across axes is a flip-flop that moves the source axis
/// off its pole while moving the target axis onto its pole.
///
/// Only the authored direction of each coupling is placed; the result is
/// averaged with its conjugate transpose, so `A->a` and `a->A` authored
/// with different strengths meet at their mean.
#[derive(Debug, Clone, Copy)]
pub struct HamiltonianBuilder<'a> {
    map: &'a RegisterMap,
}

impl<'a> HamiltonianBuilder<'a> {
    /// Builder over a register map.
    pub fn new(map: &'a RegisterMap) -> Self {
        Self { map }
    }

    /// Builds the Hamiltonian, recording skipped terms in `report`.
    pub fn build(&self, icons: &IconSet, ctx: &BuildContext, report: &mut BuildReport) -> SparseOperator {
        let dimension = self.map.dimension();
        let mut hamiltonian = SparseOperator::zeros(dimension);
        for (axis, pole, icon) in registered_icons(self.map, icons) {
            let symbol = &icon.symbol;
            if ctx.measured_axes.contains(&axis) {
                for target in icon.hamiltonian.keys() {
                    skip(report, TermKind::Hamiltonian, symbol, target, SkipReason::MeasuredAxis);
                }
                continue;
            }

            let mut energy = icon.energy_at(ctx.time);
            for (observable, strength) in &icon.alignment {
                match ctx.populations.get(observable) {
                    Some(population) => energy += strength * population,
                    None => skip(report, TermKind::Alignment, symbol, observable, SkipReason::UnknownPopulation),
                }
            }
            if energy != 0.0 {
                hamiltonian.add_scaled(&projector(dimension, axis, pole), C64::new(energy, 0.0));
                report.hamiltonian_terms += 1;
            }

            for (target, amplitude) in &icon.hamiltonian {
                let Some([from, to]) = resolve(self.map, ctx, report, TermKind::Hamiltonian, symbol, [symbol, target])
                else {
                    continue;
                };
                let g = amplitude.to_c64();
                match transfer(dimension, from, to) {
                    Some(op) => hamiltonian.add_scaled(&op, g),
                    None => hamiltonian.add_scaled(&projector(dimension, axis, pole), g),
                }
                report.hamiltonian_terms += 1;
            }
        }
        hamiltonian.coalesce();
        hamiltonian.hermitized()
    }
}

/// Projects icon rates onto a register as Lindblad jump operators.
///
/// Every term with a positive effective rate becomes one jump operator
/// `sqrt(rate) |to><from|`, so population moves at a speed proportional to
/// the rate. Each axis also receives a dephasing channel of strength
/// `base + decoherence(north) + decoherence(south)`, clamped at zero.
#[derive(Debug, Clone, Copy)]
pub struct LindbladBuilder<'a> {
    map: &'a RegisterMap,
}

impl<'a> LindbladBuilder<'a> {
    /// Builder over a register map.
    pub fn new(map: &'a RegisterMap) -> Self {
        Self { map }
    }

    /// Builds jump operators, recording skipped terms in `report`.
    pub fn build(&self, icons: &IconSet, ctx: &BuildContext, report: &mut BuildReport) -> Vec<JumpOperator> {
        let mut jumps = Vec::new();
        for (axis, _, icon) in registered_icons(self.map, icons) {
            let symbol = &icon.symbol;
            for (target, rate) in &icon.lindblad_outgoing {
                self.emit(ctx, report, &mut jumps, TermKind::LindbladOutgoing, symbol, [symbol, target], *rate);
            }
            for (source, rate) in &icon.lindblad_incoming {
                self.emit(ctx, report, &mut jumps, TermKind::LindbladIncoming, symbol, [source, symbol], *rate);
            }
            for clause in &icon.gated_lindblad {
                let Some(population) = ctx.populations.get(&clause.gate) else {
                    skip(report, TermKind::GatedLindblad, symbol, &clause.gate, SkipReason::UnknownPopulation);
                    continue;
                };
                let rate = clause.rate * clause.gate_factor(*population);
                self.emit(ctx, report, &mut jumps, TermKind::GatedLindblad, symbol, [&clause.source, symbol], rate);
            }
            if let Some(decay) = &icon.decay {
                self.emit(ctx, report, &mut jumps, TermKind::Decay, symbol, [symbol, &decay.target], decay.rate);
            }
            if ctx.entangled_axes.contains(&axis) {
                for sourced in &icon.bell_features {
                    let feature = &sourced.feature;
                    self.emit(ctx, report, &mut jumps, TermKind::BellFeature, symbol, [symbol, &feature.target], feature.rate);
                }
            }
        }

        let dimension = self.map.dimension();
        for axis in self.map.axes() {
            if ctx.measured_axes.contains(&axis.index) {
                continue;
            }
            let decoherence: f64 = [Pole::North, Pole::South]
                .into_iter()
                .filter_map(|pole| icons.get(axis.symbol(pole).as_str()))
                .map(|icon| icon.decoherence)
                .sum();
            let rate = (ctx.base_dephasing + decoherence).max(0.0);
            if rate > 0.0 {
                let mut operator = SparseOperator::zeros(dimension);
                operator.add_scaled(&pauli_z(dimension, axis.index), C64::new(rate.sqrt(), 0.0));
                jumps.push(JumpOperator {
                    label: format!("{DEPHASING_LABEL}@{}", axis.index),
                    kind: None,
                    rate,
                    operator,
                });
                report.jump_operators += 1;
            }
        }
        jumps
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        ctx: &BuildContext,
        report: &mut BuildReport,
        jumps: &mut Vec<JumpOperator>,
        kind: TermKind,
        owner: &Symbol,
        [from, to]: [&Symbol; 2],
        rate: f64,
    ) {
        if rate <= 0.0 {
            return;
        }
        let Some([from_coord, to_coord]) = resolve(self.map, ctx, report, kind, owner, [from, to]) else {
            return;
        };
        let dimension = self.map.dimension();
        let Some(op) = transfer(dimension, from_coord, to_coord) else {
            return;
        };
        let mut operator = SparseOperator::zeros(dimension);
        operator.add_scaled(&op, C64::new(rate.sqrt(), 0.0));
        operator.coalesce();
        jumps.push(JumpOperator {
            label: format!("{from}->{to}"),
            kind: Some(kind),
            rate,
            operator,
        });
        report.jump_operators += 1;
    }
}

/// Builds the full operator set for a register.
pub fn build_operators(icons: &IconSet, map: &RegisterMap, ctx: &BuildContext) -> OperatorSet {
    let mut report = BuildReport::default();
    let hamiltonian = HamiltonianBuilder::new(map).build(icons, ctx, &mut report);
    let jumps = LindbladBuilder::new(map).build(icons, ctx, &mut report);
    debug!(
        nnz = hamiltonian.nnz(),
        jumps = jumps.len(),
        skipped = report.skipped.len(),
        "operator set built"
    );
    OperatorSet {
        hamiltonian,
        jumps,
        report,
    }
}
