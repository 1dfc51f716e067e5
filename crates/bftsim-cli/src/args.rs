//! # bftsim-cli::args
//!
//! Defines the command-line argument structure using `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every trial in a run configuration, printing each trial's trace
    /// and final per-validator snapshot.
    Run {
        #[arg(value_name = "CONFIG_PATH")]
        config: PathBuf,
    },
    /// Load and validate a run configuration without simulating.
    Validate {
        #[arg(value_name = "CONFIG_PATH")]
        config: PathBuf,
    },
    /// List the registered consensus protocols.
    ListProtocols,
}
