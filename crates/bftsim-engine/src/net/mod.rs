//! # bftsim-engine::net
//!
//! The network fabric: switch topology construction and routing, per spec
//! §4.3/§4.8. `Net` is purely structural — the engine's `Switch` node
//! runtime is what actually forwards payloads, using `Net::route`.

pub mod routing;
pub mod topology;

use bftsim_types::errors::TopologyError;
use bftsim_types::id::NodeId;
use bftsim_types::topology::TopologySpec;
use routing::RoutingTables;
use topology::FabricLayout;

pub struct Net {
    pub layout: FabricLayout,
    pub routing_tables: RoutingTables,
}

impl Net {
    pub fn build(num_validators: u32, spec: &TopologySpec) -> Result<Self, TopologyError> {
        let layout = topology::build(num_validators, spec)?;
        let routing_tables = routing::build_routing_tables(num_validators, &layout)?;
        Ok(Net {
            layout,
            routing_tables,
        })
    }

    pub fn num_switches(&self) -> u32 {
        self.layout.num_switches()
    }

    pub fn uplinks_of(&self, endpoint: NodeId) -> &[NodeId] {
        &self.layout.endpoint_uplinks[endpoint as usize]
    }

    /// The next hop a `switch` should forward a payload bound for
    /// `destination` to.
    pub fn route(&self, switch: NodeId, destination: NodeId) -> Option<NodeId> {
        self.routing_tables.get(&switch)?.get(&destination).copied()
    }
}
