//! # bftsim-types::config
//!
//! Defines the strongly-typed `RunConfig`, the JSON-deserialized run
//! configuration consumed by the CLI and validated before a trial starts.

use crate::errors::ConfigError;
use crate::topology::{NetworkType, TopologySpec};
use serde::{Deserialize, Serialize};

/// The consensus protocol a run executes on every validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolKind {
    Ibft,
    HotStuff,
}

/// A node processing rate: either an exponential rate parameter, or the
/// `-1` sentinel meaning instantaneous (zero-duration) processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServiceRate {
    Instantaneous,
    Rate(f64),
}

impl ServiceRate {
    pub fn from_raw(field: &'static str, value: f64) -> Result<Self, ConfigError> {
        if value == -1.0 {
            Ok(ServiceRate::Instantaneous)
        } else if value > 0.0 {
            Ok(ServiceRate::Rate(value))
        } else {
            Err(ConfigError::InvalidRate { field, value })
        }
    }
}

/// The raw, JSON-deserialized shape of a run configuration, mirroring the
/// field table in the external-interfaces section verbatim. `RunConfig`
/// wraps this with validated, typed accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunConfig {
    #[serde(default = "default_num_runs")]
    pub num_runs: u32,
    pub num_consensus: u64,
    #[serde(default)]
    pub starting_seed: i64,
    #[serde(default = "default_seed_multiplier")]
    pub seed_multiplier: i64,
    pub num_nodes: u32,
    pub node_processing_rate: f64,
    pub switch_processing_rate: f64,
    pub base_time_limit: f64,
    pub network_type: NetworkType,
    #[serde(default)]
    pub network_parameters: Vec<i64>,
    pub protocol: ProtocolKind,
    /// Wall-clock budget in milliseconds for a single trial. Not part of the
    /// distilled external-interfaces table; it is the concrete mechanism
    /// behind a run-level wall-clock budget expiring.
    #[serde(default)]
    pub wall_clock_budget_ms: Option<u64>,
}

fn default_num_runs() -> u32 {
    1
}

fn default_seed_multiplier() -> i64 {
    1
}

/// A fully validated run configuration, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub num_runs: u32,
    pub num_consensus: u64,
    pub starting_seed: i64,
    pub seed_multiplier: i64,
    pub num_nodes: u32,
    pub node_processing_rate: ServiceRate,
    pub switch_processing_rate: ServiceRate,
    pub base_time_limit: f64,
    pub topology: TopologySpec,
    pub protocol: ProtocolKind,
    pub wall_clock_budget_ms: Option<u64>,
}

impl RunConfig {
    /// Validates a `RawRunConfig`, producing a `ConfigError`/`TopologyError`
    /// describing the first violation found.
    pub fn validate(raw: RawRunConfig) -> Result<Self, ConfigError> {
        if raw.num_nodes < 4 {
            return Err(ConfigError::TooFewNodes(raw.num_nodes));
        }
        if raw.num_runs < 1 {
            return Err(ConfigError::TooFewRuns(raw.num_runs));
        }
        if raw.num_consensus < 1 {
            return Err(ConfigError::TooFewConsensus(raw.num_consensus));
        }
        if raw.base_time_limit <= 0.0 {
            return Err(ConfigError::InvalidTimeLimit(raw.base_time_limit));
        }
        let node_processing_rate =
            ServiceRate::from_raw("nodeProcessingRate", raw.node_processing_rate)?;
        let switch_processing_rate =
            ServiceRate::from_raw("switchProcessingRate", raw.switch_processing_rate)?;
        let topology = TopologySpec::from_parameters(raw.network_type, &raw.network_parameters)?;

        Ok(RunConfig {
            num_runs: raw.num_runs,
            num_consensus: raw.num_consensus,
            starting_seed: raw.starting_seed,
            seed_multiplier: raw.seed_multiplier,
            num_nodes: raw.num_nodes,
            node_processing_rate,
            switch_processing_rate,
            base_time_limit: raw.base_time_limit,
            topology,
            protocol: raw.protocol,
            wall_clock_budget_ms: raw.wall_clock_budget_ms,
        })
    }

    /// The RNG seed for trial `k`, per `startingSeed + k * seedMultiplier`.
    pub fn seed_for_trial(&self, k: u32) -> u64 {
        self.starting_seed
            .wrapping_add((k as i64).wrapping_mul(self.seed_multiplier)) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_raw() -> RawRunConfig {
        RawRunConfig {
            num_runs: 1,
            num_consensus: 1,
            starting_seed: 0,
            seed_multiplier: 1,
            num_nodes: 4,
            node_processing_rate: -1.0,
            switch_processing_rate: -1.0,
            base_time_limit: 10_000.0,
            network_type: NetworkType::Clique,
            network_parameters: vec![],
            protocol: ProtocolKind::Ibft,
            wall_clock_budget_ms: None,
        }
    }

    #[test]
    fn rejects_too_few_nodes() {
        let mut raw = base_raw();
        raw.num_nodes = 3;
        assert!(matches!(
            RunConfig::validate(raw),
            Err(ConfigError::TooFewNodes(3))
        ));
    }

    #[test]
    fn accepts_instantaneous_rate_sentinel() {
        let cfg = RunConfig::validate(base_raw()).unwrap();
        assert_eq!(cfg.node_processing_rate, ServiceRate::Instantaneous);
    }

    #[test]
    fn seed_for_trial_applies_multiplier() {
        let mut raw = base_raw();
        raw.starting_seed = 10;
        raw.seed_multiplier = 3;
        let cfg = RunConfig::validate(raw).unwrap();
        assert_eq!(cfg.seed_for_trial(0), 10);
        assert_eq!(cfg.seed_for_trial(2), 16);
    }
}
