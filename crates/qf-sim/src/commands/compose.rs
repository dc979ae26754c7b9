use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use qf_icon::IconComposer;
use serde_json::json;

use super::load_registry;
use crate::emit_json;

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Faction library (JSON, or bincode with a `.bin` extension).
    #[arg(long)]
    pub factions: PathBuf,
    /// Compose only the members of this preset.
    #[arg(long)]
    pub preset: Option<String>,
    /// Write the icon set here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ComposeArgs) -> Result<(), Box<dyn Error>> {
    let (_, registry) = load_registry(&args.factions)?;
    let icons = match &args.preset {
        Some(preset) => IconComposer::compose_preset(&registry, preset),
        None => IconComposer::compose_registry(&registry),
    };
    let affiliation: Vec<_> = icons
        .iter()
        .map(|icon| json!({ "symbol": icon.symbol, "affiliation": icon.affiliation() }))
        .collect();
    let hash = icons.canonical_hash()?;
    let report = json!({
        "preset": args.preset,
        "hash": hash,
        "affiliation": affiliation,
        "icons": icons,
    });
    emit_json(args.out.as_deref(), &report)
}
