//! # bftsim-cli::commands::run
//!
//! Implements the `run` subcommand: runs every trial in a configuration's
//! `numRuns`, printing each trial's line-oriented trace and final
//! per-validator snapshot to stdout (spec §6/§10.4).

use crate::config_io::load_config;
use anyhow::{Context, Result};
use bftsim_engine::sim::Simulation;
use std::path::PathBuf;

pub fn exec(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;

    for trial in 0..config.num_runs {
        let seed = config.seed_for_trial(trial);
        println!("=== trial {trial} (seed {seed}) ===");

        let mut sim = Simulation::new(&config, trial)
            .with_context(|| format!("building trial {trial}"))?;
        let outcome = sim.run().with_context(|| format!("running trial {trial}"))?;

        for line in &outcome.trace {
            println!("{line}");
        }

        println!("--- final snapshot (t={}) ---", outcome.final_time);
        for (node, snapshot) in &outcome.snapshots {
            println!(
                "validator {node}: state={} consensus_count={}",
                snapshot.current_state, snapshot.consensus_count
            );
            for (state, elapsed) in &snapshot.state_times {
                println!("  {state}: {elapsed:.6}");
            }
        }
    }

    Ok(())
}
