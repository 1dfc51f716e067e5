//! # bftsim-cli::commands::validate
//!
//! Implements the `validate` subcommand: load and validate a run
//! configuration without simulating it, for fast feedback in CI.

use crate::config_io::load_config;
use anyhow::Result;
use std::path::PathBuf;

pub fn exec(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;
    println!(
        "Config '{}' is valid: {} nodes, {} run(s), protocol {:?}, topology {:?}.",
        path.display(),
        config.num_nodes,
        config.num_runs,
        config.protocol,
        config.topology,
    );
    Ok(())
}
