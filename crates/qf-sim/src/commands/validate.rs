use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::Args;
use serde_json::json;
use tracing::info;

use super::load_registry;
use crate::emit_json;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Faction library (JSON, or bincode with a `.bin` extension).
    #[arg(long)]
    pub factions: PathBuf,
}

pub fn run(args: &ValidateArgs) -> Result<(), Box<dyn Error>> {
    let (_, registry) = load_registry(&args.factions)?;
    let violations = registry.validation_report();
    let valid = registry.validate_all();
    emit_json(
        None,
        &json!({
            "factions": registry.len(),
            "valid": valid,
            "violations": violations,
        }),
    )?;
    if !valid {
        process::exit(1);
    }
    info!(factions = registry.len(), "library is closed");
    Ok(())
}
