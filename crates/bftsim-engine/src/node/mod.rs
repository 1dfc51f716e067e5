//! # bftsim-engine::node
//!
//! The `Node` runtime: the ingress FIFO / busy-flag machinery shared by
//! switches and validators (spec §3's abstract `Node`), plus the
//! kind-specific state each variant carries.

pub mod runtime;

pub use runtime::{Node, NodeKind};
