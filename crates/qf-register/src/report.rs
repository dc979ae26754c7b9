use std::fmt;

use qf_core::Symbol;
use serde::{Deserialize, Serialize};

/// Family of a coupling term considered by a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    /// Coherent coupling.
    Hamiltonian,
    /// Alignment modulation of a self-energy.
    Alignment,
    /// Outgoing Lindblad transfer.
    LindbladOutgoing,
    /// Incoming Lindblad transfer.
    LindbladIncoming,
    /// Population-gated transfer.
    GatedLindblad,
    /// Decay channel.
    Decay,
    /// Bell-activated feature.
    BellFeature,
}

/// Why a term did not reach the operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The far endpoint is not registered in this instance.
    UnregisteredEndpoint,
    /// The term touches an axis that has already been measured.
    MeasuredAxis,
    /// No population is known for the gate or observable symbol.
    UnknownPopulation,
}

/// One term left out of an operator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTerm {
    /// Term family.
    pub kind: TermKind,
    /// Symbol whose icon carries the term.
    pub symbol: Symbol,
    /// Endpoint, gate or observable that caused the skip.
    pub endpoint: Symbol,
    /// Cause.
    pub reason: SkipReason,
}

impl fmt::Display for SkippedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} -> {} skipped ({:?})",
            self.kind, self.symbol, self.endpoint, self.reason
        )
    }
}

/// Summary of an operator build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Hamiltonian terms realized.
    pub hamiltonian_terms: usize,
    /// Jump operators emitted.
    pub jump_operators: usize,
    /// Terms left out, in visiting order.
    pub skipped: Vec<SkippedTerm>,
}

impl BuildReport {
    /// Skips with a given reason.
    pub fn skipped_for(&self, reason: SkipReason) -> impl Iterator<Item = &SkippedTerm> {
        self.skipped.iter().filter(move |term| term.reason == reason)
    }
}
