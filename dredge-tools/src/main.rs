// SPDX-License-Identifier: AGPL-3.0-or-later
// Dredge - Adaptive Filter Search Platform
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Dredge CLI
//!
//! Validate filter specs and exercise the adaptive engine against a
//! simulated corpus:
//!
//! ```bash
//! # Validate a spec and show the dependency structure
//! dredge check --spec pipeline.fspec --print
//!
//! # Stream 5000 synthetic objects through the pipeline
//! dredge simulate --spec pipeline.fspec --objects 5000 \
//!     --profile costs.json --optimizer best_first --json
//! ```
//!
//! Exit codes: 0 success, 1 fatal spec error, 2 runtime filter failure,
//! 3 cancelled.

mod sim;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dredge_core::{parse_spec, DredgeError, EngineConfig, FilterTable, OptimizerKind};
use dredge_engine::{
    ChannelSink, ObjectRecord, QueueObjectStore, Search, SearchCollaborators,
};

use sim::{SimProfile, SimulatedRuntime};

/// Dredge - adaptive filter pipeline tools
#[derive(Parser)]
#[command(name = "dredge")]
#[command(about = "Validate filter specs and run simulated searches")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a filter spec
    Check {
        /// Spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Pretty-print the parsed table and partial order
        #[arg(short, long)]
        print: bool,
    },

    /// Run the engine over a synthetic object stream
    Simulate {
        /// Spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Number of synthetic objects
        #[arg(short, long, default_value = "1000")]
        objects: u64,

        /// Per-filter pass-rate/cost profile (JSON)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Permutation search strategy: hill_climb or best_first
        #[arg(long, default_value = "hill_climb")]
        optimizer: String,

        /// Simulation seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print final stats as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let code = match cli.command {
        Commands::Check { spec, print } => run_check(&spec, print),
        Commands::Simulate {
            spec,
            objects,
            profile,
            workers,
            optimizer,
            seed,
            json,
        } => run_simulate(&spec, objects, profile.as_deref(), workers, &optimizer, seed, json),
    };

    match code {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("dredge: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn load_table(path: &std::path::Path) -> anyhow::Result<Result<FilterTable, DredgeError>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading spec {}", path.display()))?;
    Ok(parse_spec(&text))
}

fn run_check(spec: &std::path::Path, print: bool) -> anyhow::Result<i32> {
    let table = match load_table(spec)? {
        Ok(table) => table,
        Err(err) => {
            eprintln!("dredge: {}", err);
            return Ok(err.exit_code());
        }
    };

    println!(
        "{}: {} filter(s){}",
        spec.display(),
        table.len(),
        match table.application() {
            Some(idx) => format!(", terminal filter '{}'", table.get(idx).name),
            None => String::new(),
        }
    );

    if print {
        print!("{}", table);
        match table.build_partial_order() {
            Ok(po) => {
                println!("partial order (row vs column):");
                print!("{}", po);
            }
            Err(err) => {
                eprintln!("dredge: {}", err);
                return Ok(err.exit_code());
            }
        }
    } else if let Err(err) = table.build_partial_order() {
        eprintln!("dredge: {}", err);
        return Ok(err.exit_code());
    }

    Ok(0)
}

fn run_simulate(
    spec: &std::path::Path,
    objects: u64,
    profile: Option<&std::path::Path>,
    workers: usize,
    optimizer: &str,
    seed: u64,
    json: bool,
) -> anyhow::Result<i32> {
    let table = match load_table(spec)? {
        Ok(table) => table,
        Err(err) => {
            eprintln!("dredge: {}", err);
            return Ok(err.exit_code());
        }
    };

    let optimizer = match optimizer {
        "hill_climb" => OptimizerKind::HillClimb,
        "best_first" => OptimizerKind::BestFirst,
        other => anyhow::bail!("unknown optimizer '{}'", other),
    };

    let profile: SimProfile = match profile {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing profile {}", path.display()))?
        }
        None => SimProfile::default(),
    };

    let config = EngineConfig {
        workers,
        optimizer,
        ..EngineConfig::default()
    };

    let store = QueueObjectStore::new(
        (0..objects).map(|i| ObjectRecord::new(format!("sim-{:08}", i))),
    );
    let (sink, results) = ChannelSink::new();

    let mut handle = match Search::start(
        table,
        SearchCollaborators {
            store: Arc::new(store),
            runtime: Arc::new(SimulatedRuntime::new(profile, seed)),
            sink: Arc::new(sink),
        },
        config,
    ) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("dredge: {}", err);
            return Ok(err.exit_code());
        }
    };

    // Drain results as they arrive so the channel never backs up.
    let drain = std::thread::spawn(move || results.iter().count());

    let outcome = handle.wait();
    let stats = handle.stats();
    let emitted = drain.join().unwrap_or(0);
    tracing::info!(emitted, "simulation finished");

    if json {
        println!(
            "{}",
            serde_json::json!({
                "stats": stats,
                "emitted": emitted,
                "exit_code": outcome.exit_code(),
            })
        );
    } else {
        println!(
            "processed {} object(s): {} passed, {} dropped ({} ms)",
            stats.objects_processed,
            stats.objects_passed,
            stats.objects_dropped,
            stats.elapsed_us / 1000
        );
        println!("final order: {}", stats.current_order.join(" -> "));
        for f in &stats.filters {
            println!(
                "  {:<24} seen {:>7}  pass {:>6.1}%  mean cost {:>9.1} us",
                f.name,
                f.objects_seen,
                f.selectivity * 100.0,
                f.mean_cost
            );
        }
        println!(
            "cache: {} entries, {} hits, {} misses, {} evictions",
            stats.cache.entries, stats.cache.hits, stats.cache.misses, stats.cache.evictions
        );
    }

    Ok(outcome.exit_code())
}
