//! # bftsim-cli
//!
//! The main entry point for the BFTSim binary. It parses command-line arguments
//! and dispatches to the appropriate subcommand handler.

#![forbid(unsafe_code)]

use crate::args::{Cli, Command};
use anyhow::Result;
use clap::Parser;

mod args;
mod commands;
mod config_io;
mod registry;

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Cli::parse();
    match args.command {
        Command::Run { config } => commands::run::exec(config),
        Command::Validate { config } => commands::validate::exec(config),
        Command::ListProtocols => commands::list_protocols::exec(),
    }
}
