use std::collections::BTreeMap;

use qf_core::{QfError, Symbol};
use tracing::warn;

use crate::descriptor::{FactionDescriptor, Ring};
use crate::library::FactionLibrary;
use crate::validate::ClosureViolation;

/// Indexed collection of faction descriptors.
///
/// Descriptors keep their registration order, which is the contributor
/// order every downstream consumer sees. Lookup indexes are plain owned maps
/// rebuilt by [`FactionRegistry::rebuild`]; there is no shared global cache.
#[derive(Debug, Clone, Default)]
pub struct FactionRegistry {
    factions: Vec<FactionDescriptor>,
    by_name: BTreeMap<String, usize>,
    by_symbol: BTreeMap<Symbol, Vec<usize>>,
    by_tag: BTreeMap<String, Vec<usize>>,
    by_ring: BTreeMap<Ring, Vec<usize>>,
    by_domain: BTreeMap<String, Vec<usize>>,
    presets: BTreeMap<String, Vec<String>>,
}

impl FactionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every faction of a library in library order, then its
    /// presets.
    pub fn from_library(library: &FactionLibrary) -> Result<Self, QfError> {
        let mut registry = Self::new();
        for faction in &library.factions {
            registry.register(faction.clone())?;
        }
        for (name, members) in &library.presets {
            registry.define_preset(name.clone(), members.iter().cloned());
        }
        Ok(registry)
    }

    /// Appends a descriptor. Names must be unique.
    ///
    /// Invalid descriptors are admitted; call [`FactionRegistry::validate_all`]
    /// to inspect closure violations.
    pub fn register(&mut self, faction: FactionDescriptor) -> Result<(), QfError> {
        if self.by_name.contains_key(&faction.name) {
            return Err(QfError::Faction(
                qf_core::ErrorInfo::new("duplicate-faction", "faction name already registered")
                    .with_context("name", &faction.name),
            ));
        }
        let idx = self.factions.len();
        self.factions.push(faction);
        self.index_one(idx);
        Ok(())
    }

    /// Rebuilds every lookup index from the stored descriptors.
    pub fn rebuild(&mut self) {
        self.by_name.clear();
        self.by_symbol.clear();
        self.by_tag.clear();
        self.by_ring.clear();
        self.by_domain.clear();
        for idx in 0..self.factions.len() {
            self.index_one(idx);
        }
    }

    fn index_one(&mut self, idx: usize) {
        let faction = &self.factions[idx];
        self.by_name.insert(faction.name.clone(), idx);
        for symbol in faction.touched_symbols() {
            self.by_symbol.entry(symbol).or_default().push(idx);
        }
        for tag in &faction.tags {
            let slot = self.by_tag.entry(tag.clone()).or_default();
            if !slot.contains(&idx) {
                slot.push(idx);
            }
        }
        self.by_ring.entry(faction.ring).or_default().push(idx);
        if !faction.domain.is_empty() {
            self.by_domain
                .entry(faction.domain.clone())
                .or_default()
                .push(idx);
        }
    }

    /// Number of registered factions.
    pub fn len(&self) -> usize {
        self.factions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    /// All descriptors in registration order.
    pub fn all(&self) -> Vec<&FactionDescriptor> {
        self.factions.iter().collect()
    }

    /// Looks a faction up by name.
    pub fn get_by_name(&self, name: &str) -> Option<&FactionDescriptor> {
        self.by_name.get(name).map(|&idx| &self.factions[idx])
    }

    /// Factions contributing terms for a symbol, in registration order.
    pub fn get_factions_for_symbol(&self, symbol: &str) -> Vec<&FactionDescriptor> {
        self.collect(self.by_symbol.get(symbol))
    }

    /// Factions carrying a tag, in registration order.
    pub fn get_by_tag(&self, tag: &str) -> Vec<&FactionDescriptor> {
        self.collect(self.by_tag.get(tag))
    }

    /// Factions in a ring, in registration order.
    pub fn get_by_ring(&self, ring: Ring) -> Vec<&FactionDescriptor> {
        self.collect(self.by_ring.get(&ring))
    }

    /// Factions in a domain, in registration order.
    pub fn get_by_domain(&self, domain: &str) -> Vec<&FactionDescriptor> {
        self.collect(self.by_domain.get(domain))
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&FactionDescriptor> {
        indices
            .map(|list| list.iter().map(|&idx| &self.factions[idx]).collect())
            .unwrap_or_default()
    }

    /// Defines (or replaces) a named preset as an ordered list of faction names.
    pub fn define_preset<I, S>(&mut self, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.presets
            .insert(name.into(), members.into_iter().map(Into::into).collect());
    }

    /// Names of every defined preset.
    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    /// Resolves a preset to descriptors, ordered by registration order.
    ///
    /// Unknown preset names and unknown member names are logged and yield
    /// an empty (or shorter) result rather than an error.
    pub fn get_preset(&self, name: &str) -> Vec<&FactionDescriptor> {
        let Some(members) = self.presets.get(name) else {
            warn!(preset = name, "unknown faction preset");
            return Vec::new();
        };
        let mut indices: Vec<usize> = Vec::with_capacity(members.len());
        for member in members {
            match self.by_name.get(member) {
                Some(&idx) if !indices.contains(&idx) => indices.push(idx),
                Some(_) => {}
                None => warn!(preset = name, faction = %member, "preset names unknown faction"),
            }
        }
        indices.sort_unstable();
        indices.into_iter().map(|idx| &self.factions[idx]).collect()
    }

    /// Maps every symbol to the names of the factions contributing to it.
    pub fn get_symbol_contestation(&self) -> BTreeMap<Symbol, Vec<String>> {
        self.by_symbol
            .iter()
            .map(|(symbol, list)| {
                let names = list
                    .iter()
                    .map(|&idx| self.factions[idx].name.clone())
                    .collect();
                (symbol.clone(), names)
            })
            .collect()
    }

    /// Every closure violation across the registry, in registration order.
    pub fn validation_report(&self) -> Vec<ClosureViolation> {
        self.factions.iter().flat_map(|f| f.validate()).collect()
    }

    /// Validates every descriptor, logging one diagnostic per violation.
    ///
    /// Returns `false` when any descriptor fails; nothing is removed.
    pub fn validate_all(&self) -> bool {
        let report = self.validation_report();
        for violation in &report {
            warn!(
                faction = %violation.faction,
                kind = ?violation.kind,
                symbol = %violation.symbol,
                endpoint = ?violation.endpoint.as_ref().map(Symbol::as_str),
                "signature closure violation"
            );
        }
        report.is_empty()
    }
}
