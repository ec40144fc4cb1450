//! Offline runner for spatial lag and join aggregation jobs.
//!
//! Each subcommand reads one JSON job file and writes JSON to stdout, or to
//! `--output` when given.
mod jobs;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use jobs::{DeriveJob, JoinJob, LagJob, MedianLagJob};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "geoda", about = "Spatial lag and spatial-join aggregation over JSON job files")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Write the result here instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mean-style spatial lag: {values, weights, policy?}.
    Lag { job: PathBuf },
    /// Median of neighbor values: {values, weights}.
    MedianLag { job: PathBuf },
    /// Reduce spatial-join groups: {groups, originalValues?, operation}.
    Join { job: PathBuf },
    /// Summarise a weights file: {neighbors, weights?, kind?}.
    WeightsMeta { weights: PathBuf },
    /// Add lag and join columns to a table: {table, weights, lag?, joins?}.
    Derive { job: PathBuf },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("  -> {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let out = args.output.as_deref();

    match &args.command {
        Command::Lag { job } => {
            let job: LagJob = jobs::parse(&read(job)?, "lag")?;
            let result = jobs::run_lag(&job)?;
            report_non_finite(result.non_finite);
            emit(&result, out)
        }
        Command::MedianLag { job } => {
            let job: MedianLagJob = jobs::parse(&read(job)?, "median-lag")?;
            let result = jobs::run_median_lag(&job)?;
            report_non_finite(result.non_finite);
            emit(&result, out)
        }
        Command::Join { job } => {
            let job: JoinJob = jobs::parse(&read(job)?, "join")?;
            let result = jobs::run_join(&job);
            report_non_finite(result.non_finite);
            emit(&result, out)
        }
        Command::WeightsMeta { weights } => {
            let w = jobs::parse(&read(weights)?, "weights")?;
            emit(&jobs::run_weights_meta(&w), out)
        }
        Command::Derive { job } => {
            let job: DeriveJob = jobs::parse(&read(job)?, "derive")?;
            let table = jobs::run_derive(job)?;
            eprintln!("Derived table has {} columns.", table.columns().len());
            emit(&table, out)
        }
    }
}

fn report_non_finite(count: usize) {
    if count > 0 {
        eprintln!("Warning: {count} non-finite values (isolates or empty groups)");
    }
}
