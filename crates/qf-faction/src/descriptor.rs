use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;

use qf_core::{Amplitude, Symbol};
use serde::{Deserialize, Serialize};

/// Position of a faction in the setting's hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    /// Mundane, grounded factions.
    Center,
    /// First ring outwards.
    First,
    /// Second ring outwards.
    Second,
    /// Third ring outwards.
    Third,
    /// Edge of the map.
    Outer,
}

impl Ring {
    /// Lowercase label used in indexes and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Ring::Center => "center",
            Ring::First => "first",
            Ring::Second => "second",
            Ring::Third => "third",
            Ring::Outer => "outer",
        }
    }
}

/// Waveform used by a time-dependent driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// `A cos(2π f t + φ)`.
    Cosine,
    /// `A sin(2π f t + φ)`.
    Sine,
    /// `A` while `sin(2π f t + φ) >= 0`, zero otherwise.
    Pulse,
}

/// Periodic modulation of a symbol's self-energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Waveform.
    pub kind: DriverKind,
    /// Frequency in cycles per unit time.
    pub frequency: f64,
    /// Phase offset in radians.
    #[serde(default)]
    pub phase: f64,
    /// Peak amplitude.
    pub amplitude: f64,
}

impl Driver {
    /// Evaluates the driver at simulation time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let angle = TAU * self.frequency * t + self.phase;
        match self.kind {
            DriverKind::Cosine => self.amplitude * angle.cos(),
            DriverKind::Sine => self.amplitude * angle.sin(),
            DriverKind::Pulse => {
                if angle.sin() >= 0.0 {
                    self.amplitude
                } else {
                    0.0
                }
            }
        }
    }
}

/// Lindblad transfer into the owning symbol whose rate is scaled by the
/// population of a gate symbol.
///
/// Effective rate is `rate * p^power`, or `rate * (1 - p)^power` when
/// `inverse` is set, where `p` is the gate population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedLindblad {
    /// Symbol amplitude is drawn from.
    pub source: Symbol,
    /// Base transfer rate.
    pub rate: f64,
    /// Symbol whose population gates the transfer.
    pub gate: Symbol,
    /// Exponent applied to the gate factor.
    #[serde(default = "default_power")]
    pub power: f64,
    /// Use the complement of the gate population.
    #[serde(default)]
    pub inverse: bool,
}

fn default_power() -> f64 {
    1.0
}

impl GatedLindblad {
    /// Multiplicative factor for the given gate population.
    pub fn gate_factor(&self, gate_population: f64) -> f64 {
        let p = gate_population.clamp(0.0, 1.0);
        let base = if self.inverse { 1.0 - p } else { p };
        base.powf(self.power)
    }
}

/// Irreversible decay of a symbol into a target that may lie outside the
/// owning faction's signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decay {
    /// Decay rate.
    pub rate: f64,
    /// Symbol receiving the decayed amplitude.
    pub target: Symbol,
}

/// Coupling that stays dormant until its symbol's axis is entangled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BellFeature {
    /// Feature label shown to players.
    pub name: String,
    /// Symbol receiving amplitude once the feature is active.
    pub target: Symbol,
    /// Transfer rate while active.
    pub rate: f64,
}

/// Immutable authored bundle of coupling terms scoped to a signature.
///
/// All per-symbol maps are keyed by the symbol that owns the term. Keys of
/// nested maps are the far endpoint (coupling target, Lindblad counterpart
/// or alignment observable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionDescriptor {
    /// Unique faction name.
    pub name: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Short tagline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motto: Option<String>,
    /// Thematic category (Commerce, Civic, Mystic, ...).
    #[serde(default)]
    pub domain: String,
    /// Hierarchy ring.
    pub ring: Ring,
    /// Closed set of symbols the faction may couple.
    pub signature: Vec<Symbol>,
    /// Free-form tags used by the registry index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Diagonal energy per symbol.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub self_energies: BTreeMap<Symbol, f64>,
    /// Coherent couplings `source -> target -> amplitude`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hamiltonian: BTreeMap<Symbol, BTreeMap<Symbol, Amplitude>>,
    /// Time-dependent self-energy drivers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub drivers: BTreeMap<Symbol, Driver>,
    /// Irreversible transfers `source -> target -> rate`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lindblad_outgoing: BTreeMap<Symbol, BTreeMap<Symbol, f64>>,
    /// Irreversible transfers `target -> source -> rate`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lindblad_incoming: BTreeMap<Symbol, BTreeMap<Symbol, f64>>,
    /// Population-gated transfers into the keyed symbol.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gated_lindblad: BTreeMap<Symbol, Vec<GatedLindblad>>,
    /// Decay channel per symbol.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decay: BTreeMap<Symbol, Decay>,
    /// Signed self-energy modulation `symbol -> observable -> strength`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alignment: BTreeMap<Symbol, BTreeMap<Symbol, f64>>,
    /// Symbols whose measured outcome is reported inverted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub measurement_inversion: BTreeSet<Symbol>,
    /// Latent couplings activated by entanglement.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bell_activated: BTreeMap<Symbol, Vec<BellFeature>>,
    /// Signed dephasing contribution per symbol.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decoherence: BTreeMap<Symbol, f64>,
}

impl FactionDescriptor {
    /// Starts a descriptor with no terms.
    pub fn new<I, S>(name: impl Into<String>, ring: Ring, signature: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            motto: None,
            domain: String::new(),
            ring,
            signature: signature.into_iter().map(Into::into).collect(),
            tags: Vec::new(),
            self_energies: BTreeMap::new(),
            hamiltonian: BTreeMap::new(),
            drivers: BTreeMap::new(),
            lindblad_outgoing: BTreeMap::new(),
            lindblad_incoming: BTreeMap::new(),
            gated_lindblad: BTreeMap::new(),
            decay: BTreeMap::new(),
            alignment: BTreeMap::new(),
            measurement_inversion: BTreeSet::new(),
            bell_activated: BTreeMap::new(),
            decoherence: BTreeMap::new(),
        }
    }

    /// Sets the flavour text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the tagline.
    pub fn with_motto(mut self, motto: impl Into<String>) -> Self {
        self.motto = Some(motto.into());
        self
    }

    /// Sets the thematic domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Appends a registry tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets a symbol's self-energy.
    pub fn with_self_energy(mut self, symbol: impl Into<Symbol>, energy: f64) -> Self {
        self.self_energies.insert(symbol.into(), energy);
        self
    }

    /// Adds a coherent coupling.
    pub fn with_hamiltonian(
        mut self,
        source: impl Into<Symbol>,
        target: impl Into<Symbol>,
        amplitude: impl Into<Amplitude>,
    ) -> Self {
        self.hamiltonian
            .entry(source.into())
            .or_default()
            .insert(target.into(), amplitude.into());
        self
    }

    /// Sets a self-energy driver.
    pub fn with_driver(mut self, symbol: impl Into<Symbol>, driver: Driver) -> Self {
        self.drivers.insert(symbol.into(), driver);
        self
    }

    /// Adds an outgoing transfer.
    pub fn with_lindblad_out(
        mut self,
        source: impl Into<Symbol>,
        target: impl Into<Symbol>,
        rate: f64,
    ) -> Self {
        self.lindblad_outgoing
            .entry(source.into())
            .or_default()
            .insert(target.into(), rate);
        self
    }

    /// Adds an incoming transfer into `target` from `source`.
    pub fn with_lindblad_in(
        mut self,
        target: impl Into<Symbol>,
        source: impl Into<Symbol>,
        rate: f64,
    ) -> Self {
        self.lindblad_incoming
            .entry(target.into())
            .or_default()
            .insert(source.into(), rate);
        self
    }

    /// Adds a gated transfer into `target`.
    pub fn with_gated_lindblad(mut self, target: impl Into<Symbol>, clause: GatedLindblad) -> Self {
        self.gated_lindblad
            .entry(target.into())
            .or_default()
            .push(clause);
        self
    }

    /// Sets the decay channel of a symbol.
    pub fn with_decay(
        mut self,
        symbol: impl Into<Symbol>,
        rate: f64,
        target: impl Into<Symbol>,
    ) -> Self {
        self.decay.insert(
            symbol.into(),
            Decay {
                rate,
                target: target.into(),
            },
        );
        self
    }

    /// Adds an alignment coupling to an external observable.
    pub fn with_alignment(
        mut self,
        symbol: impl Into<Symbol>,
        observable: impl Into<Symbol>,
        strength: f64,
    ) -> Self {
        self.alignment
            .entry(symbol.into())
            .or_default()
            .insert(observable.into(), strength);
        self
    }

    /// Flags a symbol for inverted measurement reporting.
    pub fn with_measurement_inversion(mut self, symbol: impl Into<Symbol>) -> Self {
        self.measurement_inversion.insert(symbol.into());
        self
    }

    /// Adds a bell-activated latent feature.
    pub fn with_bell_feature(mut self, symbol: impl Into<Symbol>, feature: BellFeature) -> Self {
        self.bell_activated
            .entry(symbol.into())
            .or_default()
            .push(feature);
        self
    }

    /// Sets a symbol's decoherence coupling.
    pub fn with_decoherence(mut self, symbol: impl Into<Symbol>, coupling: f64) -> Self {
        self.decoherence.insert(symbol.into(), coupling);
        self
    }

    /// Whether the symbol belongs to the signature.
    pub fn in_signature(&self, symbol: &str) -> bool {
        self.signature.iter().any(|s| s.as_str() == symbol)
    }

    /// Every symbol this faction contributes terms for, in ascending order.
    ///
    /// This is the signature plus every key of a per-symbol term map. Decay
    /// targets, alignment observables and gate symbols are far endpoints and
    /// are not included.
    pub fn touched_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols: BTreeSet<Symbol> = self.signature.iter().cloned().collect();
        symbols.extend(self.self_energies.keys().cloned());
        symbols.extend(self.hamiltonian.keys().cloned());
        symbols.extend(self.drivers.keys().cloned());
        symbols.extend(self.lindblad_outgoing.keys().cloned());
        symbols.extend(self.lindblad_incoming.keys().cloned());
        symbols.extend(self.gated_lindblad.keys().cloned());
        symbols.extend(self.decay.keys().cloned());
        symbols.extend(self.alignment.keys().cloned());
        symbols.extend(self.measurement_inversion.iter().cloned());
        symbols.extend(self.bell_activated.keys().cloned());
        symbols.extend(self.decoherence.keys().cloned());
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_factor_respects_inverse_and_power() {
        let clause = GatedLindblad {
            source: "a".into(),
            rate: 1.0,
            gate: "g".into(),
            power: 2.0,
            inverse: false,
        };
        assert!((clause.gate_factor(0.5) - 0.25).abs() < 1e-12);
        let inverse = GatedLindblad {
            inverse: true,
            ..clause
        };
        assert!((inverse.gate_factor(0.25) - 0.5625).abs() < 1e-12);
        assert_eq!(inverse.gate_factor(1.5), 0.0);
    }

    #[test]
    fn pulse_driver_is_half_wave() {
        let driver = Driver {
            kind: DriverKind::Pulse,
            frequency: 1.0,
            phase: 0.0,
            amplitude: 2.0,
        };
        assert_eq!(driver.value_at(0.25), 2.0);
        assert_eq!(driver.value_at(0.75), 0.0);
    }
}
