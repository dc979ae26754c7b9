#![deny(missing_docs)]
#![doc = "Density-operator register engine: Lindblad evolution, entanglement tracking, \
component-wide measurement with feed-forward triggers, the soft-failing gate \
orchestrator and the per-instance tick loop."]

/// Per-axis Bloch-sphere coordinates.
pub mod bloch;
/// Instance and run configuration.
pub mod config;
/// Master-equation integration.
pub mod evolve;
/// Named single- and two-axis unitaries.
pub mod gates;
/// Undirected entanglement bookkeeping.
pub mod graph;
/// Instance tick loop.
pub mod instance;
mod linalg;
/// Component collapse and measurement triggers.
pub mod measure;
/// Application-facing gate verbs.
pub mod orchestrator;
/// Density operator and lifecycle.
pub mod state;

pub use bloch::BlochVector;
pub use config::{AxisConfig, InstanceConfig, RunConfig};
pub use gates::{SingleAxisGate, TwoAxisGate};
pub use graph::EntanglementGraph;
pub use instance::{InstanceSnapshot, Lookahead, QuantumInstance};
pub use measure::{Measurement, MeasurementTrigger};
pub use orchestrator::{GateOrchestrator, GateRecord};
pub use state::{Phase, RegisterState, MAX_PUMP_FRACTION, TRACE_TOLERANCE};
