//! # bftsim-engine::world
//!
//! Defines the `World` struct, the top-level container for the simulation's
//! state: every node (switch or validator) and the fabric connecting them.

use crate::net::Net;
use crate::node::Node;
use bftsim_types::id::NodeId;

/// The entire state of the simulated distributed system.
pub struct World {
    pub nodes: Vec<Node>,
    pub net: Net,
    pub num_validators: u32,
}

impl World {
    pub fn new(nodes: Vec<Node>, net: Net, num_validators: u32) -> Self {
        Self {
            nodes,
            net,
            num_validators,
        }
    }

    /// Returns a reference to a node by its ID. Panics if the ID is invalid.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Returns a mutable reference to a node by its ID. Panics if the ID is invalid.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    pub fn validator_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.num_validators
    }
}
