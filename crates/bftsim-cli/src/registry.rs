//! # bftsim-cli::registry
//!
//! The registry of consensus protocols the CLI knows how to name; the tag a
//! run configuration's `protocol` field actually selects lives in
//! `bftsim_types::config::ProtocolKind` and is wired up by the engine
//! itself (`Simulation::new`). This registry exists for `list-protocols`.

use bftsim_types::config::ProtocolKind;

pub const REGISTRY: &[(&str, ProtocolKind)] = &[
    ("ibft", ProtocolKind::Ibft),
    ("hotstuff", ProtocolKind::HotStuff),
];
