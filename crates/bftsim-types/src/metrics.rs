//! # bftsim-types::metrics
//!
//! Defines constants for metric names and labels emitted via the `metrics`
//! facade. Centralizing these prevents typos and keeps the engine and any
//! external consumer of the metrics stream in agreement.

// --- Metric Names ---
pub const MET_EVENTS_DISPATCHED: &str = "bftsim_events_dispatched_total";
pub const MET_PAYLOADS_DELIVERED: &str = "bftsim_payloads_delivered_total";
pub const MET_TIMER_FIRED: &str = "bftsim_timer_fired_total";
pub const MET_TIMER_STALE: &str = "bftsim_timer_stale_total";
pub const MET_CONSENSUS_DECIDED: &str = "bftsim_consensus_decided_total";
pub const MET_ROUND_CHANGE: &str = "bftsim_round_change_total";

// --- Label Keys ---
pub const LBL_NODE: &str = "node";
pub const LBL_PROTO: &str = "proto";
pub const LBL_STATE: &str = "state";
pub const LBL_EVENT: &str = "event";
