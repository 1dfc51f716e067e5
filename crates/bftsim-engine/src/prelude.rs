//! # bftsim-engine::prelude
//!
//! A convenience module that re-exports the most commonly used types from the
//! engine and its dependencies. This simplifies imports for other crates in the
//! workspace that depend on the engine.

pub use crate::{
    events::{Event, Queued},
    net::Net,
    node::{Node, NodeKind},
    sim::{RunOutcome, Simulation},
    world::World,
};

pub use bftsim_types::{self, config::*, errors::*, id::*, metrics::*, payload::*, time::*, topology::*};

pub use bftsim_proto::{self, api::*, ctx_ext::*, Protocol, ProtocolDyn};
