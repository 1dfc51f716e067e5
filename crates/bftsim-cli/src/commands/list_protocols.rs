//! # bftsim-cli::commands::list_protocols
//!
//! Implements the `list-protocols` subcommand.

use crate::registry::REGISTRY;
use anyhow::Result;

pub fn exec() -> Result<()> {
    println!("Available Protocols:");
    println!("{:<12} | {:<10}", "Name", "Tag");
    println!("{:-<12}-|-{:-<10}", "", "");
    for (name, tag) in REGISTRY {
        println!("{:<12} | {:<10?}", name, tag);
    }
    Ok(())
}
