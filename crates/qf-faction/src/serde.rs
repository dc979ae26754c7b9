use std::fs;
use std::path::Path;

use qf_core::{ErrorInfo, QfError};

use crate::descriptor::FactionDescriptor;
use crate::library::FactionLibrary;

fn serde_error(code: &str, err: impl ToString) -> QfError {
    QfError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Serializes a descriptor to pretty JSON.
pub fn to_json(descriptor: &FactionDescriptor) -> Result<String, QfError> {
    serde_json::to_string_pretty(descriptor).map_err(|err| serde_error("json-serialize", err))
}

/// Restores a descriptor from JSON.
pub fn from_json(data: &str) -> Result<FactionDescriptor, QfError> {
    serde_json::from_str(data).map_err(|err| serde_error("json-deserialize", err))
}

/// Serializes a descriptor into a binary blob.
pub fn to_bytes(descriptor: &FactionDescriptor) -> Result<Vec<u8>, QfError> {
    let json = to_json(descriptor)?;
    bincode::serialize(&json).map_err(|err| serde_error("bincode-serialize", err))
}

/// Rehydrates a descriptor from a binary blob.
pub fn from_bytes(bytes: &[u8]) -> Result<FactionDescriptor, QfError> {
    let json: String =
        bincode::deserialize(bytes).map_err(|err| serde_error("bincode-deserialize", err))?;
    from_json(&json)
}

/// Serializes a library to pretty JSON.
pub fn library_to_json(library: &FactionLibrary) -> Result<String, QfError> {
    serde_json::to_string_pretty(library).map_err(|err| serde_error("json-serialize", err))
}

/// Restores a library from JSON, rejecting incompatible schema versions.
///
/// A bare JSON array of descriptors is accepted as a library under the
/// current schema.
pub fn library_from_json(data: &str) -> Result<FactionLibrary, QfError> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|err| serde_error("json-deserialize", err))?;
    let library = if value.is_array() {
        let factions: Vec<FactionDescriptor> =
            serde_json::from_value(value).map_err(|err| serde_error("json-deserialize", err))?;
        FactionLibrary::new(factions)
    } else {
        serde_json::from_value(value).map_err(|err| serde_error("json-deserialize", err))?
    };
    if !library.schema_version.is_compatible() {
        let version = library.schema_version;
        return Err(QfError::Serde(
            ErrorInfo::new("schema-mismatch", "library schema is not readable by this build")
                .with_context(
                    "found",
                    format!("{}.{}.{}", version.major, version.minor, version.patch),
                ),
        ));
    }
    Ok(library)
}

/// Serializes a library into a binary blob.
pub fn library_to_bytes(library: &FactionLibrary) -> Result<Vec<u8>, QfError> {
    let json = library_to_json(library)?;
    bincode::serialize(&json).map_err(|err| serde_error("bincode-serialize", err))
}

/// Rehydrates a library from a binary blob.
pub fn library_from_bytes(bytes: &[u8]) -> Result<FactionLibrary, QfError> {
    let json: String =
        bincode::deserialize(bytes).map_err(|err| serde_error("bincode-deserialize", err))?;
    library_from_json(&json)
}

fn is_binary(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("bin") | Some("bincode")
    )
}

/// Writes a library to disk; `.bin`/`.bincode` files use the binary form.
pub fn save_library(library: &FactionLibrary, path: &Path) -> Result<(), QfError> {
    let bytes = if is_binary(path) {
        library_to_bytes(library)?
    } else {
        library_to_json(library)?.into_bytes()
    };
    fs::write(path, bytes).map_err(|err| {
        QfError::Serde(
            ErrorInfo::new("io-write", err.to_string()).with_context("path", path.display()),
        )
    })
}

/// Reads a library written by [`save_library`].
pub fn load_library(path: &Path) -> Result<FactionLibrary, QfError> {
    let bytes = fs::read(path).map_err(|err| {
        QfError::Serde(
            ErrorInfo::new("io-read", err.to_string()).with_context("path", path.display()),
        )
    })?;
    if is_binary(path) {
        library_from_bytes(&bytes)
    } else {
        let text = String::from_utf8(bytes).map_err(|err| serde_error("utf8", err))?;
        library_from_json(&text)
    }
}
