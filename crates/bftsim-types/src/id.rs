//! # bftsim-types::id
//!
//! Defines the core identifier types used throughout the simulation.
//! Using distinct types for different kinds of IDs helps prevent bugs where,
//! for example, a `NodeId` might be accidentally used as a `TimerId`.

/// A unique identifier for a node (switch or validator) in the simulation.
///
/// Nodes live in a flat arena: validators occupy `0..numNodes`, switches
/// occupy the ids above that range. A validator's `NodeId` therefore doubles
/// as its consensus-level integer id in `[0, N)`.
pub type NodeId = u32;

/// A unique identifier for a timer set by a protocol. Carries a version tag
/// so stale `TimerExpiry` events can be recognized and ignored (see
/// `RuntimeInvariantError` and the timer-tagging invariant in the spec).
pub type TimerId = u64;

/// A unique identifier for a scheduled event in the simulation's master queue.
pub type EventId = u64;
