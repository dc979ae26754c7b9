use std::collections::BTreeMap;

use qf_core::{Pole, QfError, RngHandle, Symbol};
use qf_faction::{FactionDescriptor, FactionRegistry};
use qf_icon::{IconComposer, IconSet};
use qf_register::{build_operators, BuildContext, BuildReport, RegisterMap, SkipReason};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bloch::BlochVector;
use crate::config::InstanceConfig;
use crate::orchestrator::GateOrchestrator;
use crate::state::{Phase, RegisterState};

/// Serializable view of an instance at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Simulation clock.
    pub time: f64,
    /// Lifecycle phase of the register.
    pub phase: Phase,
    /// Population of every registered symbol.
    pub populations: BTreeMap<Symbol, f64>,
    /// `Tr ρ²`.
    pub purity: f64,
    /// Pinned pole of every measured axis.
    pub measured: BTreeMap<usize, Pole>,
    /// Entanglement graph edges.
    pub entangled: Vec<(usize, usize)>,
}

/// Forecast produced by [`QuantumInstance::lookahead`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookahead {
    /// Snapshot after each step, in order.
    pub steps: Vec<InstanceSnapshot>,
    /// Pairwise mutual information after the last step.
    pub mutual_information: Vec<(usize, usize, f64)>,
    /// Bloch vector of every labelled axis after the last step.
    pub bloch: BTreeMap<usize, BlochVector>,
}

/// One simulated instance: composed icons, a register and its clock.
#[derive(Debug, Clone)]
pub struct QuantumInstance {
    icons: IconSet,
    config: InstanceConfig,
    orchestrator: GateOrchestrator,
    time: f64,
    last_report: BuildReport,
}

impl QuantumInstance {
    /// Prepares every axis of `map` in the configured pole.
    ///
    /// Terms whose endpoints are not registered are reported once here,
    /// then left out silently on every tick.
    pub fn new(icons: IconSet, map: RegisterMap, config: InstanceConfig) -> Self {
        let rng = RngHandle::for_substream(config.seed, config.substream);
        let mut state = RegisterState::new(map, rng);
        state.inherit_inversions(&icons);
        state.initialize_all(config.initial_pole);
        let mut instance = Self {
            icons,
            config,
            orchestrator: GateOrchestrator::new(state),
            time: 0.0,
            last_report: BuildReport::default(),
        };

        let probe = build_operators(&instance.icons, instance.state().map(), &instance.context());
        let unregistered: Vec<String> = probe
            .report
            .skipped_for(SkipReason::UnregisteredEndpoint)
            .map(|term| format!("{}->{}", term.symbol, term.endpoint))
            .collect();
        if !unregistered.is_empty() {
            warn!(
                count = unregistered.len(),
                terms = ?unregistered,
                "coupling terms reach symbols outside the register; they will be ignored"
            );
        }
        instance.last_report = probe.report;
        info!(
            axes = instance.state().axis_count(),
            icons = instance.icons.len(),
            seed = instance.config.seed,
            substream = instance.config.substream,
            "instance initialized"
        );
        instance
    }

    /// Composes the active factions of a registry and builds the register
    /// described by `config`.
    ///
    /// Active factions come from `config.preset` when set, else from
    /// `config.factions`, else every registered faction. Unknown names are
    /// skipped with a warning.
    pub fn from_registry(registry: &FactionRegistry, config: InstanceConfig) -> Result<Self, QfError> {
        config.validate()?;
        let map = config.register_map()?;
        let active: Vec<&FactionDescriptor> = match (&config.preset, config.factions.is_empty()) {
            (Some(preset), _) => registry.get_preset(preset),
            (None, false) => config
                .factions
                .iter()
                .filter_map(|name| {
                    let found = registry.get_by_name(name);
                    if found.is_none() {
                        warn!(faction = %name, "configured faction is not registered; skipped");
                    }
                    found
                })
                .collect(),
            (None, true) => registry.all(),
        };
        let icons = IconComposer::compose(&active);
        Ok(Self::new(icons, map, config))
    }

    /// Builder context for the current state: configured observables
    /// overlaid with register populations.
    pub fn context(&self) -> BuildContext {
        let state = self.state();
        let mut populations = self.config.observables.clone();
        populations.extend(state.populations());
        BuildContext {
            time: self.time,
            populations,
            measured_axes: state.measured_axes(),
            entangled_axes: state.graph().entangled_axes(),
            base_dephasing: self.config.base_dephasing,
        }
    }

    /// Rebuilds the operators from current populations and evolves the
    /// register by `dt`, subcycled at `max_dt`.
    pub fn tick(&mut self, dt: f64) -> Result<(), QfError> {
        let ctx = self.context();
        let operators = build_operators(&self.icons, self.state().map(), &ctx);
        let max_dt = self.config.max_dt;
        self.orchestrator.state_mut().evolve(&operators, dt, max_dt)?;
        self.time += dt;
        self.last_report = operators.report;
        debug!(time = self.time, "tick complete");
        Ok(())
    }

    /// Runs `ticks` ticks of `dt`.
    pub fn run(&mut self, ticks: usize, dt: f64) -> Result<(), QfError> {
        for _ in 0..ticks {
            self.tick(dt)?;
        }
        Ok(())
    }

    /// Ticks a copy of the instance `steps` times and reports every
    /// intermediate state. The live register, clock and RNG are untouched.
    pub fn lookahead(&self, steps: usize, dt: f64) -> Result<Lookahead, QfError> {
        let mut branch = self.clone();
        let mut snapshots = Vec::with_capacity(steps);
        for _ in 0..steps {
            branch.tick(dt)?;
            snapshots.push(branch.snapshot());
        }
        debug!(steps, horizon = branch.time, "lookahead complete");
        Ok(Lookahead {
            steps: snapshots,
            mutual_information: branch.state().all_mutual_information(),
            bloch: branch.state().bloch_vectors(),
        })
    }

    /// Population of every registered symbol.
    pub fn populations(&self) -> BTreeMap<Symbol, f64> {
        self.state().populations()
    }

    /// Population of one symbol, if registered.
    pub fn population(&self, symbol: &str) -> Option<f64> {
        self.state().population(symbol)
    }

    /// Simulation clock.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Gate and measurement verbs.
    pub fn orchestrator(&self) -> &GateOrchestrator {
        &self.orchestrator
    }

    /// Mutable gate and measurement verbs.
    pub fn orchestrator_mut(&mut self) -> &mut GateOrchestrator {
        &mut self.orchestrator
    }

    /// Register state.
    pub fn state(&self) -> &RegisterState {
        self.orchestrator.state()
    }

    /// Report of the most recent operator build.
    pub fn last_report(&self) -> &BuildReport {
        &self.last_report
    }

    /// Composed icons.
    pub fn icons(&self) -> &IconSet {
        &self.icons
    }

    /// Instance configuration.
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Serializable view of the current state.
    pub fn snapshot(&self) -> InstanceSnapshot {
        let state = self.state();
        InstanceSnapshot {
            time: self.time,
            phase: state.phase(),
            populations: state.populations(),
            purity: state.purity(),
            measured: state
                .measured_axes()
                .into_iter()
                .filter_map(|axis| state.measured_pole(axis).map(|pole| (axis, pole)))
                .collect(),
            entangled: state.graph().edges(),
        }
    }
}
