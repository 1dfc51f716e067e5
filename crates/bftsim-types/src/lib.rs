//! # bftsim-types
//!
//! This crate provides the foundational, shared data types used across the
//! entire BFTSim workspace. Its purpose is to break dependency cycles by
//! providing a stable, central location for types that `bftsim-engine`,
//! `bftsim-proto`, and `bftsim-cli` all need to agree upon.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod id;
pub mod metrics;
pub mod payload;
pub mod time;
pub mod topology;
