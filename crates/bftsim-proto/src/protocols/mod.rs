//! # bftsim-proto::protocols
//!
//! The built-in consensus protocol implementations.

#[cfg(feature = "hotstuff")]
pub mod hotstuff;

#[cfg(feature = "ibft")]
pub mod ibft;
