use std::collections::BTreeMap;

use qf_core::SchemaVersion;
use serde::{Deserialize, Serialize};

use crate::descriptor::FactionDescriptor;

/// Ordered, versioned collection of faction descriptors as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionLibrary {
    /// Schema the payload was written with.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Descriptors in library order.
    pub factions: Vec<FactionDescriptor>,
    /// Named faction subsets, registered alongside the descriptors.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, Vec<String>>,
}

impl FactionLibrary {
    /// Wraps descriptors under the current schema.
    pub fn new(factions: Vec<FactionDescriptor>) -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            factions,
            presets: BTreeMap::new(),
        }
    }

    /// Looks a descriptor up by name.
    pub fn get(&self, name: &str) -> Option<&FactionDescriptor> {
        self.factions.iter().find(|f| f.name == name)
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.factions.len()
    }

    /// Whether the library holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }
}

impl Default for FactionLibrary {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// What a merge did to one faction name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum MergeChange {
    /// Name was not present before.
    Added {
        /// Label of the incoming batch.
        source: String,
    },
    /// Name existed and was replaced.
    Updated {
        /// Label of the incoming batch.
        source: String,
    },
}

/// Merges `incoming` into `existing` by faction name.
///
/// Incoming descriptors replace existing ones with the same name; later
/// entries within `incoming` win over earlier ones and are logged as
/// updates. The result is sorted by name and keeps the existing schema
/// version and presets.
pub fn merge_libraries(
    existing: &FactionLibrary,
    incoming: &[FactionDescriptor],
    source: &str,
) -> (FactionLibrary, BTreeMap<String, MergeChange>) {
    let mut by_name: BTreeMap<String, FactionDescriptor> = existing
        .factions
        .iter()
        .map(|f| (f.name.clone(), f.clone()))
        .collect();
    let mut changes = BTreeMap::new();
    for faction in incoming {
        let change = if by_name.contains_key(&faction.name) {
            MergeChange::Updated {
                source: source.to_string(),
            }
        } else {
            MergeChange::Added {
                source: source.to_string(),
            }
        };
        changes.insert(faction.name.clone(), change);
        by_name.insert(faction.name.clone(), faction.clone());
    }
    let merged = FactionLibrary {
        schema_version: existing.schema_version,
        factions: by_name.into_values().collect(),
        presets: existing.presets.clone(),
    };
    (merged, changes)
}
