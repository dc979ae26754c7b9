#![deny(missing_docs)]
#![doc = "Faction descriptors: authored, immutable bundles of coupling terms scoped to a \
symbol signature, together with closure validation, the indexed registry and \
library persistence."]

/// Descriptor data model and builder helpers.
pub mod descriptor;
/// Canonical content hashes for descriptors and libraries.
pub mod hash;
/// Versioned descriptor libraries and name-keyed merging.
pub mod library;
/// Indexed registry with presets and contestation diagnostics.
pub mod registry;
/// JSON, binary and file round-trips.
pub mod serde;
/// Signature-closure checks.
pub mod validate;

pub use descriptor::{
    BellFeature, Decay, Driver, DriverKind, FactionDescriptor, GatedLindblad, Ring,
};
pub use hash::{canonical_descriptor_hash, canonical_library_hash};
pub use library::{merge_libraries, FactionLibrary, MergeChange};
pub use registry::FactionRegistry;
pub use serde::{from_bytes, from_json, load_library, save_library, to_bytes, to_json};
pub use validate::{ClosureViolation, ViolationKind, MAX_SIGNATURE, MIN_SIGNATURE};
