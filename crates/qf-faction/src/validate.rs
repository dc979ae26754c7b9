use std::collections::BTreeSet;
use std::fmt;

use qf_core::Symbol;
use serde::{Deserialize, Serialize};

use crate::descriptor::FactionDescriptor;

/// Smallest signature a descriptor may declare.
pub const MIN_SIGNATURE: usize = 3;
/// Largest signature a descriptor may declare.
pub const MAX_SIGNATURE: usize = 7;

/// Which rule a [`ClosureViolation`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Signature has fewer than 3 or more than 7 symbols.
    SignatureSize,
    /// Signature lists the same symbol twice.
    DuplicateSignatureSymbol,
    /// A term is keyed by a symbol outside the signature.
    TermOwner,
    /// Hamiltonian coupling targets a symbol outside the signature.
    HamiltonianEndpoint,
    /// Outgoing Lindblad counterpart outside the signature.
    LindbladOutgoingEndpoint,
    /// Incoming Lindblad counterpart outside the signature.
    LindbladIncomingEndpoint,
    /// Gated Lindblad source outside the signature.
    GatedSource,
}

/// One breach of the signature-closure rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureViolation {
    /// Offending faction.
    pub faction: String,
    /// Rule broken.
    pub kind: ViolationKind,
    /// Symbol owning the term.
    pub symbol: Symbol,
    /// Far endpoint, when the rule concerns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Symbol>,
}

impl fmt::Display for ClosureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?} at {}", self.faction, self.kind, self.symbol)?;
        if let Some(endpoint) = &self.endpoint {
            write!(f, " -> {endpoint}")?;
        }
        Ok(())
    }
}

impl FactionDescriptor {
    /// Checks the signature-closure invariant and returns every violation.
    ///
    /// Decay targets, alignment observables and gate symbols may lie outside
    /// the signature; they are the channel for cross-faction effects.
    pub fn validate(&self) -> Vec<ClosureViolation> {
        let mut out = Vec::new();
        let violation = |kind, symbol: &Symbol, endpoint: Option<&Symbol>| ClosureViolation {
            faction: self.name.clone(),
            kind,
            symbol: symbol.clone(),
            endpoint: endpoint.cloned(),
        };

        let mut seen = BTreeSet::new();
        for symbol in &self.signature {
            if !seen.insert(symbol) {
                out.push(violation(ViolationKind::DuplicateSignatureSymbol, symbol, None));
            }
        }
        if !(MIN_SIGNATURE..=MAX_SIGNATURE).contains(&seen.len()) {
            let anchor = self
                .signature
                .first()
                .cloned()
                .unwrap_or_else(|| Symbol::new(""));
            out.push(violation(ViolationKind::SignatureSize, &anchor, None));
        }

        for owner in self.term_owners() {
            if !seen.contains(owner) {
                out.push(violation(ViolationKind::TermOwner, owner, None));
            }
        }

        for (source, targets) in &self.hamiltonian {
            for target in targets.keys() {
                if !seen.contains(target) {
                    out.push(violation(
                        ViolationKind::HamiltonianEndpoint,
                        source,
                        Some(target),
                    ));
                }
            }
        }
        for (source, targets) in &self.lindblad_outgoing {
            for target in targets.keys() {
                if !seen.contains(target) {
                    out.push(violation(
                        ViolationKind::LindbladOutgoingEndpoint,
                        source,
                        Some(target),
                    ));
                }
            }
        }
        for (target, sources) in &self.lindblad_incoming {
            for source in sources.keys() {
                if !seen.contains(source) {
                    out.push(violation(
                        ViolationKind::LindbladIncomingEndpoint,
                        target,
                        Some(source),
                    ));
                }
            }
        }
        for (target, clauses) in &self.gated_lindblad {
            for clause in clauses {
                if !seen.contains(&clause.source) {
                    out.push(violation(
                        ViolationKind::GatedSource,
                        target,
                        Some(&clause.source),
                    ));
                }
            }
        }
        out
    }

    /// Whether [`FactionDescriptor::validate`] reports nothing.
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    fn term_owners(&self) -> BTreeSet<&Symbol> {
        let mut owners = BTreeSet::new();
        owners.extend(self.self_energies.keys());
        owners.extend(self.hamiltonian.keys());
        owners.extend(self.drivers.keys());
        owners.extend(self.lindblad_outgoing.keys());
        owners.extend(self.lindblad_incoming.keys());
        owners.extend(self.gated_lindblad.keys());
        owners.extend(self.decay.keys());
        owners.extend(self.alignment.keys());
        owners.extend(self.measurement_inversion.iter());
        owners.extend(self.bell_activated.keys());
        owners.extend(self.decoherence.keys());
        owners
    }
}
