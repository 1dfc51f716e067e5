//! # bftsim-types::errors
//!
//! Defines the fatal error kinds surfaced at the core boundary. All three are
//! terminal: the simulator does not attempt recovery from a `ConfigError`,
//! `TopologyError`, or `RuntimeInvariantError`. Protocol-level anomalies
//! (stale messages, duplicate votes) are not modeled as errors at all — they
//! are handled silently inside the consensus state machines.

use thiserror::Error;

/// Malformed or missing run-configuration fields.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("numNodes must be >= 4, got {0}")]
    TooFewNodes(u32),
    #[error("numRuns must be >= 1, got {0}")]
    TooFewRuns(u32),
    #[error("numConsensus must be >= 1, got {0}")]
    TooFewConsensus(u64),
    #[error("{field} must be > 0 or the -1 sentinel, got {value}")]
    InvalidRate { field: &'static str, value: f64 },
    #[error("baseTimeLimit must be > 0, got {0}")]
    InvalidTimeLimit(f64),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Invalid or unsatisfiable topology parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("expected {expected} network parameter(s), got {got}")]
    BadParameterCount { expected: usize, got: usize },
    #[error("invalid topology parameter: {message}")]
    InvalidParameter { message: String },
    #[error("side length {side} does not divide numNodes {num_nodes}")]
    SideDoesNotDivide { side: u32, num_nodes: u32 },
    #[error("no valid layer decomposition exists for k={k}, numNodes={num_nodes}")]
    NoValidDecomposition { k: u32, num_nodes: u32 },
    #[error("endpoint {0} is unreachable from switch {1} after routing-table construction")]
    UnreachableEndpoint(u32, u32),
}

/// A condition the simulator's own invariants guarantee cannot happen. Its
/// existence is a bug, not a user-facing failure mode.
#[derive(Error, Debug, Clone)]
pub enum RuntimeInvariantError {
    #[error("simulation time overflow: {base} + {offset} is not finite")]
    TimeOverflow { base: f64, offset: f64 },
    #[error("monotonic id counter overflowed")]
    IdOverflow,
    #[error("event dispatched for node {0}, which is not in the node registry")]
    UnknownNode(u32),
    #[error("routing table for switch {switch} has no entry for endpoint {endpoint}")]
    MissingRoute { switch: u32, endpoint: u32 },
}
