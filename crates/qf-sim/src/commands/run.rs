use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use qf_core::Pole;
use qf_engine::{BlochVector, InstanceSnapshot, QuantumInstance, RunConfig};
use qf_register::SkippedTerm;
use serde::Serialize;
use tracing::info;

use super::load_registry;
use crate::emit_json;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML (or `.json`) run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Faction library; overrides `factions` in the run file.
    #[arg(long)]
    pub factions: Option<PathBuf>,
    /// Override the number of ticks.
    #[arg(long)]
    pub ticks: Option<usize>,
    /// Override the instance seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Write the report here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    ticks: usize,
    dt: f64,
    entangled: usize,
    #[serde(flatten)]
    snapshot: InstanceSnapshot,
    mutual_information: Vec<(usize, usize, f64)>,
    bloch: BTreeMap<usize, BlochVector>,
    outcomes: BTreeMap<usize, Pole>,
    skipped: Vec<SkippedTerm>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut run = RunConfig::load(&args.config)?;
    if let Some(ticks) = args.ticks {
        run.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        run.instance.seed = seed;
    }
    let library_path = match &args.factions {
        Some(path) => path.clone(),
        None => run
            .factions
            .as_ref()
            .map(|path| resolve_relative(&args.config, path))
            .ok_or("no faction library: pass --factions or set `factions` in the run file")?,
    };
    let (_, registry) = load_registry(&library_path)?;

    let mut instance = QuantumInstance::from_registry(&registry, run.instance.clone())?;
    let entangled = instance.orchestrator_mut().batch_entangle(&run.entangle);
    instance.run(run.ticks, run.dt)?;

    let mut outcomes = BTreeMap::new();
    for &axis in &run.measure {
        if instance.state().is_measured(axis) {
            continue;
        }
        outcomes.extend(instance.orchestrator_mut().measure(axis));
    }
    info!(ticks = run.ticks, time = instance.time(), "run complete");

    let report = RunReport {
        ticks: run.ticks,
        dt: run.dt,
        entangled,
        snapshot: instance.snapshot(),
        mutual_information: instance.state().all_mutual_information(),
        bloch: instance.state().bloch_vectors(),
        outcomes,
        skipped: instance.last_report().skipped.clone(),
    };
    emit_json(args.out.as_deref(), &report)
}

fn resolve_relative(config: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    config
        .parent()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|| path.to_path_buf())
}
