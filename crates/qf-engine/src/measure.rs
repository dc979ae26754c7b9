use std::collections::{BTreeMap, BTreeSet};

use qf_core::{Pole, QfError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::gates::SingleAxisGate;
use crate::linalg;
use crate::state::{Phase, RegisterState};

/// Classical feed-forward armed on one axis.
///
/// When `trigger` is measured to `condition`, `action` is applied to every
/// target that has not collapsed yet, before the targets are sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementTrigger {
    /// Axis whose outcome is watched.
    pub trigger: usize,
    /// Axes acted upon.
    pub targets: Vec<usize>,
    /// Outcome that fires the trigger.
    pub condition: Pole,
    /// Gate applied to each target.
    pub action: SingleAxisGate,
}

/// Result of collapsing one entanglement component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Reported (and pinned) pole per axis of the component.
    pub outcomes: BTreeMap<usize, Pole>,
    /// Indices into the supplied trigger list that fired.
    pub fired: Vec<usize>,
}

impl RegisterState {
    /// Collapses the component containing `axis`.
    pub fn measure(&mut self, axis: usize) -> Result<BTreeMap<usize, Pole>, QfError> {
        self.measure_with(axis, &[]).map(|m| m.outcomes)
    }

    /// Collapses the component containing `axis`, honouring triggers.
    ///
    /// Every axis of the component is sampled from its own marginal at the
    /// moment it is reached; joint correlations are not reproduced. Trigger
    /// axes in the component are reached first, in trigger order, then the
    /// remaining axes ascending. A sampled pole whose symbol is flagged for
    /// inversion is reported and pinned as the opposite pole. The component
    /// is fully collapsed before this returns.
    pub fn measure_with(
        &mut self,
        axis: usize,
        triggers: &[MeasurementTrigger],
    ) -> Result<Measurement, QfError> {
        self.ensure_ready()?;
        self.ensure_live(axis)?;
        let component = self.graph.component(axis);

        let mut order: Vec<usize> = Vec::with_capacity(component.len());
        for trigger in triggers {
            if component.contains(&trigger.trigger) && !order.contains(&trigger.trigger) {
                order.push(trigger.trigger);
            }
        }
        let rest: Vec<usize> = component
            .iter()
            .copied()
            .filter(|a| !order.contains(a))
            .collect();
        order.extend(rest);

        let mut measurement = Measurement::default();
        let mut collapsed: BTreeSet<usize> = BTreeSet::new();
        for &current in &order {
            let p_north = linalg::marginal(&self.rho, current, Pole::North).clamp(0.0, 1.0);
            let sampled = if self.rng.unit() < p_north {
                Pole::North
            } else {
                Pole::South
            };
            let inverted = self
                .map
                .symbol_at(current, sampled)
                .map_or(false, |symbol| self.inverted.contains(symbol));
            let reported = if inverted { sampled.opposite() } else { sampled };
            self.rho = linalg::reset_axis(&self.rho, current, reported);
            collapsed.insert(current);
            measurement.outcomes.insert(current, reported);
            debug!(axis = current, ?sampled, ?reported, "axis collapsed");

            for (idx, trigger) in triggers.iter().enumerate() {
                if trigger.trigger != current || reported != trigger.condition {
                    continue;
                }
                let unitary = trigger.action.matrix();
                for &target in &trigger.targets {
                    if component.contains(&target) && !collapsed.contains(&target) {
                        self.conjugate(&[target], &unitary);
                    }
                }
                measurement.fired.push(idx);
                info!(trigger = current, action = trigger.action.label(), "measurement trigger fired");
            }
        }

        self.renormalize()?;
        for (&axis, &pole) in &measurement.outcomes {
            self.measured.insert(axis, pole);
        }
        self.graph.remove_axes(&component);
        let labelled_all = self.map.axes().all(|a| self.measured.contains_key(&a.index));
        self.phase = if labelled_all {
            Phase::Measured
        } else {
            Phase::Evolving
        };
        Ok(measurement)
    }
}
