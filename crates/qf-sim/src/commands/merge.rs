use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use qf_faction::{
    canonical_library_hash, load_library, merge_libraries, save_library, FactionDescriptor, FactionLibrary,
};
use serde_json::json;
use tracing::info;

use crate::emit_json;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Library to merge into; created when missing.
    #[arg(long)]
    pub existing: PathBuf,
    /// Libraries whose factions are merged in, in order.
    #[arg(long, required = true, num_args = 1..)]
    pub incoming: Vec<PathBuf>,
    /// Label recorded against every change; defaults to the incoming file name.
    #[arg(long)]
    pub source: Option<String>,
    /// Report the changes without writing the library.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: &MergeArgs) -> Result<(), Box<dyn Error>> {
    let mut library = if args.existing.exists() {
        load_library(&args.existing)?
    } else {
        FactionLibrary::default()
    };
    let mut changes = serde_json::Map::new();
    for path in &args.incoming {
        let incoming: Vec<FactionDescriptor> = load_library(path)?.factions;
        let source = args
            .source
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        let (merged, log) = merge_libraries(&library, &incoming, &source);
        for (name, change) in log {
            changes.insert(name, serde_json::to_value(change)?);
        }
        library = merged;
    }

    if !args.dry_run {
        save_library(&library, &args.existing)?;
        info!(path = %args.existing.display(), factions = library.len(), "library written");
    }
    let hash = canonical_library_hash(&library)?;
    emit_json(
        None,
        &json!({
            "dry_run": args.dry_run,
            "factions": library.len(),
            "hash": hash,
            "changes": changes,
        }),
    )
}
