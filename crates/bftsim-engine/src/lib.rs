//! # bftsim-engine
//!
//! The core of the BFTSim simulator: the event kernel, the network fabric
//! (topology construction, routing), the node runtime, and the RNG
//! discipline that drives it all deterministically.

pub mod events;
pub mod ids;
pub mod net;
pub mod node;
pub mod prelude;
pub mod rng;
pub mod sim;
pub mod world;
