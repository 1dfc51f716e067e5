//! # bftsim-engine::net::topology
//!
//! The five topology builders named in the spec (§4.8). Each produces a
//! `FabricLayout`: the switch count, the directed switch-switch adjacency,
//! and which switches each endpoint is attached to. `net::routing` then
//! turns a `FabricLayout` into per-switch routing tables.

mod butterfly;
mod clique;
mod mesh;

use bftsim_types::errors::TopologyError;
use bftsim_types::id::NodeId;
use bftsim_types::topology::TopologySpec;
use fxhash::FxHashMap;

/// The wiring of a fabric, before routing tables are computed. Switch ids
/// occupy `[num_validators, num_validators + switch_adjacency.len())`.
pub struct FabricLayout {
    /// Directed successor list for every switch id.
    pub switch_adjacency: FxHashMap<NodeId, Vec<NodeId>>,
    /// For every validator id, the switch(es) it is directly attached to.
    pub endpoint_uplinks: Vec<Vec<NodeId>>,
}

impl FabricLayout {
    pub fn num_switches(&self) -> u32 {
        self.switch_adjacency.len() as u32
    }
}

/// Builds the fabric layout for `spec` over `num_validators` endpoints.
pub fn build(num_validators: u32, spec: &TopologySpec) -> Result<FabricLayout, TopologyError> {
    match *spec {
        TopologySpec::Clique => Ok(clique::build(num_validators)),
        TopologySpec::Mesh { side } => mesh::build(num_validators, side, false),
        TopologySpec::Torus { side } => mesh::build(num_validators, side, true),
        TopologySpec::Butterfly { k, mode, scheme } => {
            butterfly::build(num_validators, k, mode, scheme, false)
        }
        TopologySpec::FoldedClos { k, mode, scheme } => {
            butterfly::build(num_validators, k, mode, scheme, true)
        }
    }
}
