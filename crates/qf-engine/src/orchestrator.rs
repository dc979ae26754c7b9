use std::collections::BTreeMap;

use qf_core::{Pole, QfError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gates::{SingleAxisGate, TwoAxisGate};
use crate::measure::MeasurementTrigger;
use crate::state::RegisterState;

/// One gate recorded against an axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRecord {
    /// Gate label (`H`, `CNOT`, `TRIGGER:X`, ...).
    pub gate: String,
    /// Other axis of a two-axis gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<usize>,
}

/// Application-facing verbs over a [`RegisterState`].
///
/// Every verb soft-fails: refused operations are logged and reported as
/// `false`, an empty map or a count, never as an error.
#[derive(Debug, Clone)]
pub struct GateOrchestrator {
    state: RegisterState,
    history: BTreeMap<usize, Vec<GateRecord>>,
    triggers: Vec<MeasurementTrigger>,
}

fn refused(verb: &str, err: &QfError) {
    warn!(verb, code = err.code(), error = %err, "operation refused");
}

impl GateOrchestrator {
    /// Wraps a state.
    pub fn new(state: RegisterState) -> Self {
        Self {
            state,
            history: BTreeMap::new(),
            triggers: Vec::new(),
        }
    }

    /// Underlying state.
    pub fn state(&self) -> &RegisterState {
        &self.state
    }

    /// Mutable access for evolution and initialization.
    pub fn state_mut(&mut self) -> &mut RegisterState {
        &mut self.state
    }

    /// Consumes the orchestrator.
    pub fn into_state(self) -> RegisterState {
        self.state
    }

    fn record(&mut self, axis: usize, gate: impl Into<String>, partner: Option<usize>) {
        self.history.entry(axis).or_default().push(GateRecord {
            gate: gate.into(),
            partner,
        });
    }

    /// Gates applied to an axis, oldest first.
    pub fn gate_history(&self, axis: usize) -> &[GateRecord] {
        self.history.get(&axis).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Clears histories and triggers and resets the state.
    pub fn reset(&mut self) {
        self.state.reset();
        self.history.clear();
        self.triggers.clear();
    }

    /// Applies a named single-axis gate.
    pub fn apply_gate(&mut self, axis: usize, gate: SingleAxisGate) -> bool {
        match self.state.apply_gate_1q(axis, &gate.matrix()) {
            Ok(()) => {
                self.record(axis, gate.label(), None);
                true
            }
            Err(err) => {
                refused("apply_gate", &err);
                false
            }
        }
    }

    /// Applies a named two-axis gate; `first` is the control for CNOT.
    pub fn apply_gate_2q(&mut self, first: usize, second: usize, gate: TwoAxisGate) -> bool {
        match self.state.apply_gate_2q(first, second, &gate.matrix()) {
            Ok(()) => {
                self.record(first, gate.label(), Some(second));
                self.record(second, gate.label(), Some(first));
                true
            }
            Err(err) => {
                refused("apply_gate_2q", &err);
                false
            }
        }
    }

    /// Entangles two axes.
    pub fn entangle(&mut self, a: usize, b: usize) -> bool {
        match self.state.entangle(a, b) {
            Ok(()) => {
                self.record(a, SingleAxisGate::H.label(), None);
                self.record(a, TwoAxisGate::Cnot.label(), Some(b));
                self.record(b, TwoAxisGate::Cnot.label(), Some(a));
                true
            }
            Err(err) => {
                refused("entangle", &err);
                false
            }
        }
    }

    /// Entangles each pair in order, returning how many succeeded.
    pub fn batch_entangle(&mut self, pairs: &[(usize, usize)]) -> usize {
        let linked = pairs
            .iter()
            .filter(|&&(a, b)| self.entangle(a, b))
            .count();
        if linked < pairs.len() {
            info!(linked, requested = pairs.len(), "batch entangle partially applied");
        }
        linked
    }

    /// Chains the given axes into a cluster, returning the link count.
    ///
    /// Unknown, measured and repeated axes are dropped from the chain.
    pub fn create_cluster_state(&mut self, axes: &[usize]) -> usize {
        let chain = self.state.cluster_chain(axes);
        let mut links = 0;
        for pair in chain.windows(2) {
            if self.entangle(pair[0], pair[1]) {
                links += 1;
            }
        }
        links
    }

    /// Drops the graph edge `a - b`; the density operator is untouched.
    pub fn remove_entanglement(&mut self, a: usize, b: usize) -> bool {
        let removed = self.state.remove_entanglement(a, b);
        if !removed {
            warn!(a, b, "no entanglement edge to remove");
        }
        removed
    }

    /// Arms a feed-forward trigger.
    ///
    /// Accepted only when the trigger axis is live, `targets` is non-empty
    /// and every target is a live axis in the trigger's entanglement
    /// component.
    pub fn set_measurement_trigger(
        &mut self,
        trigger: usize,
        targets: &[usize],
        condition: Pole,
        action: SingleAxisGate,
    ) -> bool {
        if let Err(err) = self.state.ensure_live(trigger) {
            refused("set_measurement_trigger", &err);
            return false;
        }
        let component = self.state.graph().component(trigger);
        let valid = !targets.is_empty()
            && targets
                .iter()
                .all(|&target| target != trigger && component.contains(&target));
        if !valid {
            warn!(trigger, ?targets, "trigger targets must share the trigger's component");
            return false;
        }
        self.triggers.push(MeasurementTrigger {
            trigger,
            targets: targets.to_vec(),
            condition,
            action,
        });
        true
    }

    /// Armed triggers in arming order.
    pub fn triggers(&self) -> &[MeasurementTrigger] {
        &self.triggers
    }

    /// Collapses the component containing `axis`; empty on refusal.
    ///
    /// Triggers whose axis collapses are discarded, whether or not they
    /// fired.
    pub fn measure(&mut self, axis: usize) -> BTreeMap<usize, Pole> {
        match self.state.measure_with(axis, &self.triggers) {
            Ok(measurement) => {
                for &idx in &measurement.fired {
                    let trigger = &self.triggers[idx];
                    let label = format!("TRIGGER:{}", trigger.action.label());
                    let targets = trigger.targets.clone();
                    let source = trigger.trigger;
                    for target in targets {
                        self.record(target, label.clone(), Some(source));
                    }
                }
                self.triggers
                    .retain(|trigger| !measurement.outcomes.contains_key(&trigger.trigger));
                measurement.outcomes
            }
            Err(err) => {
                refused("measure", &err);
                BTreeMap::new()
            }
        }
    }
}
