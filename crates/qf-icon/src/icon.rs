use std::collections::BTreeMap;

use qf_core::{Amplitude, Symbol};
use qf_faction::{BellFeature, Decay, Driver, GatedLindblad};
use serde::{Deserialize, Serialize};

/// How many factions contribute to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Affiliation {
    /// No faction touches the symbol.
    Unaffiliated,
    /// Exactly one faction touches the symbol.
    SingleOwner,
    /// Two or more factions touch the symbol.
    Contested,
}

impl Affiliation {
    /// Classifies a contributor count.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Affiliation::Unaffiliated,
            1 => Affiliation::SingleOwner,
            _ => Affiliation::Contested,
        }
    }
}

/// Bell-activated feature tagged with the faction that authored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedBellFeature {
    /// Authoring faction.
    pub faction: String,
    /// The feature itself.
    #[serde(flatten)]
    pub feature: BellFeature,
}

/// Merged coupling record for one symbol.
///
/// Summed fields hold the sum over contributors. `gated_lindblad` and
/// `bell_features` are concatenated in contributor order. `decay` keeps the
/// highest rate (earliest contributor on ties) and `driver` the first
/// contributor that defines one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    /// Symbol this icon describes.
    pub symbol: Symbol,
    /// Contributing faction names in composition order.
    pub contributors: Vec<String>,
    /// Summed self-energy.
    pub self_energy: f64,
    /// Summed coherent couplings by target.
    pub hamiltonian: BTreeMap<Symbol, Amplitude>,
    /// First driver found.
    pub driver: Option<Driver>,
    /// Summed outgoing rates by target.
    pub lindblad_outgoing: BTreeMap<Symbol, f64>,
    /// Summed incoming rates by source.
    pub lindblad_incoming: BTreeMap<Symbol, f64>,
    /// Every gated clause, unmerged.
    pub gated_lindblad: Vec<GatedLindblad>,
    /// Strongest decay channel.
    pub decay: Option<Decay>,
    /// Summed alignment strengths by observable.
    pub alignment: BTreeMap<Symbol, f64>,
    /// Whether any contributor inverts measurement of this symbol.
    pub measurement_inversion: bool,
    /// Latent features of every contributor.
    pub bell_features: Vec<SourcedBellFeature>,
    /// Summed decoherence coupling.
    pub decoherence: f64,
}

impl Icon {
    /// Icon with no contributions.
    pub fn empty(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            contributors: Vec::new(),
            self_energy: 0.0,
            hamiltonian: BTreeMap::new(),
            driver: None,
            lindblad_outgoing: BTreeMap::new(),
            lindblad_incoming: BTreeMap::new(),
            gated_lindblad: Vec::new(),
            decay: None,
            alignment: BTreeMap::new(),
            measurement_inversion: false,
            bell_features: Vec::new(),
            decoherence: 0.0,
        }
    }

    /// Coupling amplitude towards `target`, if any contributor defines one.
    pub fn hamiltonian_to(&self, target: &str) -> Option<Amplitude> {
        self.hamiltonian.get(target).copied()
    }

    /// Classification by contributor count.
    pub fn affiliation(&self) -> Affiliation {
        Affiliation::from_count(self.contributors.len())
    }

    /// Self-energy at time `t`, including the driver.
    pub fn energy_at(&self, t: f64) -> f64 {
        self.self_energy + self.driver.map_or(0.0, |d| d.value_at(t))
    }
}
