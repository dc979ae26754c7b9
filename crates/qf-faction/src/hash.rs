use qf_core::QfError;
use sha2::{Digest, Sha256};

use crate::descriptor::FactionDescriptor;
use crate::library::FactionLibrary;

/// SHA-256 of a descriptor's compact JSON form, hex encoded.
///
/// Every map in a descriptor is ordered, so equal descriptors hash equally
/// regardless of how they were built.
pub fn canonical_descriptor_hash(descriptor: &FactionDescriptor) -> Result<String, QfError> {
    let bytes = serde_json::to_vec(descriptor)
        .map_err(|err| QfError::serde("json-serialize", err.to_string()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Hash over every descriptor of a library, in library order.
pub fn canonical_library_hash(library: &FactionLibrary) -> Result<String, QfError> {
    let mut hasher = Sha256::new();
    hasher.update((library.factions.len() as u64).to_le_bytes());
    for faction in &library.factions {
        hasher.update(canonical_descriptor_hash(faction)?.as_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
