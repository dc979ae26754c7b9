pub mod compose;
pub mod merge;
pub mod run;
pub mod validate;

use std::error::Error;
use std::path::Path;

use qf_faction::{load_library, FactionLibrary, FactionRegistry};

pub(crate) fn load_registry(path: &Path) -> Result<(FactionLibrary, FactionRegistry), Box<dyn Error>> {
    let library = load_library(path)?;
    let registry = FactionRegistry::from_library(&library)?;
    Ok((library, registry))
}
