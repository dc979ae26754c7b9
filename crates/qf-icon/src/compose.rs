use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use qf_core::{QfError, Symbol};
use qf_faction::{FactionDescriptor, FactionRegistry};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::icon::{Affiliation, Icon, SourcedBellFeature};

/// Icons for every symbol touched by a faction subset, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconSet {
    icons: BTreeMap<Symbol, Icon>,
}

impl IconSet {
    /// Icon for a symbol, if any faction touches it.
    pub fn get(&self, symbol: &str) -> Option<&Icon> {
        self.icons.get(symbol)
    }

    /// Icons in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &Icon> {
        self.icons.values()
    }

    /// Symbols with an icon.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.icons.keys()
    }

    /// Number of icons.
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Whether no symbol is touched.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Affiliation of a symbol; symbols without an icon are unaffiliated.
    pub fn affiliation_of(&self, symbol: &str) -> Affiliation {
        self.get(symbol)
            .map_or(Affiliation::Unaffiliated, Icon::affiliation)
    }

    /// SHA-256 over the compact JSON of every icon, hex encoded.
    pub fn canonical_hash(&self) -> Result<String, QfError> {
        let mut hasher = Sha256::new();
        for icon in self.icons.values() {
            let bytes = serde_json::to_vec(icon)
                .map_err(|err| QfError::serde("json-serialize", err.to_string()))?;
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Folds descriptors into icons.
///
/// Contributors are visited in the order of the input slice, which callers
/// take from registry order. That order decides the decay tie-break and the
/// first-driver rule and orders concatenated clauses; every summed field is
/// independent of it.
#[derive(Debug, Default, Clone, Copy)]
pub struct IconComposer;

impl IconComposer {
    /// Composes icons for a faction subset.
    ///
    /// A faction listed twice contributes once.
    pub fn compose(factions: &[&FactionDescriptor]) -> IconSet {
        let mut seen = BTreeSet::new();
        let mut unique: Vec<&FactionDescriptor> = Vec::with_capacity(factions.len());
        for &faction in factions {
            if seen.insert(faction.name.as_str()) {
                unique.push(faction);
            } else {
                warn!(faction = %faction.name, "faction listed twice; composing once");
            }
        }

        let mut index: BTreeMap<Symbol, Vec<usize>> = BTreeMap::new();
        for (idx, faction) in unique.iter().enumerate() {
            for symbol in faction.touched_symbols() {
                index.entry(symbol).or_default().push(idx);
            }
        }

        let icons = index
            .into_iter()
            .map(|(symbol, contributors)| {
                let mut icon = Icon::empty(symbol.clone());
                for idx in contributors {
                    fold(&mut icon, unique[idx]);
                }
                (symbol, icon)
            })
            .collect::<BTreeMap<_, _>>();
        debug!(factions = unique.len(), icons = icons.len(), "composed icon set");
        IconSet { icons }
    }

    /// Composes every faction of a registry in registration order.
    pub fn compose_registry(registry: &FactionRegistry) -> IconSet {
        Self::compose(&registry.all())
    }

    /// Composes a registry preset.
    pub fn compose_preset(registry: &FactionRegistry, preset: &str) -> IconSet {
        Self::compose(&registry.get_preset(preset))
    }
}

fn sum_into(target: &mut BTreeMap<Symbol, f64>, source: Option<&BTreeMap<Symbol, f64>>) {
    for (key, value) in source.into_iter().flatten() {
        *target.entry(key.clone()).or_insert(0.0) += value;
    }
}

fn fold(icon: &mut Icon, faction: &FactionDescriptor) {
    let symbol = &icon.symbol;
    icon.contributors.push(faction.name.clone());

    if let Some(energy) = faction.self_energies.get(symbol) {
        icon.self_energy += energy;
    }
    if let Some(couplings) = faction.hamiltonian.get(symbol) {
        for (target, amplitude) in couplings {
            match icon.hamiltonian.entry(target.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(*amplitude);
                }
                Entry::Occupied(mut slot) => *slot.get_mut() += *amplitude,
            }
        }
    }
    if icon.driver.is_none() {
        icon.driver = faction.drivers.get(symbol).copied();
    }
    sum_into(&mut icon.lindblad_outgoing, faction.lindblad_outgoing.get(symbol));
    sum_into(&mut icon.lindblad_incoming, faction.lindblad_incoming.get(symbol));
    if let Some(clauses) = faction.gated_lindblad.get(symbol) {
        icon.gated_lindblad.extend(clauses.iter().cloned());
    }
    if let Some(decay) = faction.decay.get(symbol) {
        let stronger = icon
            .decay
            .as_ref()
            .map_or(true, |current| decay.rate > current.rate);
        if stronger {
            icon.decay = Some(decay.clone());
        }
    }
    sum_into(&mut icon.alignment, faction.alignment.get(symbol));
    icon.measurement_inversion |= faction.measurement_inversion.contains(symbol);
    if let Some(features) = faction.bell_activated.get(symbol) {
        icon.bell_features
            .extend(features.iter().cloned().map(|feature| SourcedBellFeature {
                faction: faction.name.clone(),
                feature,
            }));
    }
    if let Some(coupling) = faction.decoherence.get(symbol) {
        icon.decoherence += coupling;
    }
}
