#![deny(missing_docs)]
#![doc = "Per-instance register maps and the builders that project composed icons onto \
a register as a Hamiltonian and a set of Lindblad jump operators."]

/// Hamiltonian and Lindblad builders.
pub mod builder;
/// Symbol to `(axis, pole)` coordinates.
pub mod map;
/// Structured build diagnostics.
pub mod report;
/// Coordinate-list operators and single-axis primitives.
pub mod sparse;

pub use builder::{
    build_operators, BuildContext, HamiltonianBuilder, JumpOperator, LindbladBuilder, OperatorSet,
    DEPHASING_LABEL,
};
pub use map::{Axis, RegisterMap, MAX_AXES};
pub use report::{BuildReport, SkipReason, SkippedTerm, TermKind};
pub use sparse::{OperatorEntry, SparseOperator};
