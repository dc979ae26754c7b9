use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use clap::{Parser, Subcommand};
use commands::{
    compose::{self, ComposeArgs},
    merge::{self, MergeArgs},
    run::{self, RunArgs},
    validate::{self, ValidateArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "qf-sim", about = "Quantum faction engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every faction of a library for signature closure.
    Validate(ValidateArgs),
    /// Compose icons for a library or one of its presets.
    Compose(ComposeArgs),
    /// Tick a configured instance and report its final state.
    Run(RunArgs),
    /// Merge incoming faction files into an existing library.
    Merge(MergeArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate(args) => validate::run(&args),
        Command::Compose(args) => compose::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Merge(args) => merge::run(&args),
    }
}

/// Pretty JSON to a file, or to stdout when `path` is `None`.
fn emit_json<T: serde::Serialize>(path: Option<&Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
