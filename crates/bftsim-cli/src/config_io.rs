//! # bftsim-cli::config_io
//!
//! Loads and validates a run configuration JSON file (spec §6/§10.4), shared
//! by the `run` and `validate` subcommands.

use anyhow::{Context, Result};
use bftsim_types::config::{RawRunConfig, RunConfig};
use std::fs;
use std::path::Path;

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let raw: RawRunConfig = serde_json::from_str(&content)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    RunConfig::validate(raw).with_context(|| format!("validating config file {}", path.display()))
}
