//! # bftsim-engine::net::routing
//!
//! Builds per-switch routing tables from a `FabricLayout` (spec §4.3):
//! for every switch and every endpoint, the next hop on a shortest path,
//! computed by multi-source BFS from each endpoint's attach switch(es) over
//! the *reverse* switch adjacency (so a switch discovered at distance `d+1`
//! records the distance-`d` switch that discovered it as its next hop).
//! Construction fails if any switch cannot reach some endpoint.

use super::topology::FabricLayout;
use bftsim_types::errors::TopologyError;
use bftsim_types::id::NodeId;
use fxhash::FxHashMap;
use std::collections::VecDeque;

/// `routing_table[switch][endpoint] = next_hop`.
pub type RoutingTables = FxHashMap<NodeId, FxHashMap<NodeId, NodeId>>;

pub fn build_routing_tables(
    num_validators: u32,
    layout: &FabricLayout,
) -> Result<RoutingTables, TopologyError> {
    let switch_ids: Vec<NodeId> = layout.switch_adjacency.keys().copied().collect();

    let mut reverse_adjacency: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for &s in &switch_ids {
        reverse_adjacency.entry(s).or_default();
    }
    for (&from, tos) in &layout.switch_adjacency {
        for &to in tos {
            reverse_adjacency.entry(to).or_default().push(from);
        }
    }
    for preds in reverse_adjacency.values_mut() {
        preds.sort_unstable();
    }

    let mut tables: RoutingTables = switch_ids
        .iter()
        .map(|&s| (s, FxHashMap::default()))
        .collect();

    for endpoint in 0..num_validators {
        let mut attach_switches = layout.endpoint_uplinks[endpoint as usize].clone();
        attach_switches.sort_unstable();

        let mut visited: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for &s in &attach_switches {
            visited.insert(s, endpoint);
            queue.push_back(s);
        }

        while let Some(w) = queue.pop_front() {
            if let Some(preds) = reverse_adjacency.get(&w) {
                for &u in preds {
                    if !visited.contains_key(&u) {
                        visited.insert(u, w);
                        queue.push_back(u);
                    }
                }
            }
        }

        for &s in &switch_ids {
            match visited.get(&s) {
                Some(&next_hop) => {
                    tables.get_mut(&s).unwrap().insert(endpoint, next_hop);
                }
                None => return Err(TopologyError::UnreachableEndpoint(endpoint, s)),
            }
        }
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::topology;
    use bftsim_types::topology::TopologySpec;

    #[test]
    fn mesh_corner_to_corner_is_four_hops() {
        let layout = topology::build(9, &TopologySpec::Mesh { side: 3 }).unwrap();
        let tables = build_routing_tables(9, &layout).unwrap();

        // Walk from switch attached to endpoint 0 (corner (0,0)) toward
        // endpoint 8 (corner (2,2)), counting switch-to-switch hops only;
        // the final switch-to-endpoint delivery isn't a "switch-hop".
        let start = layout.endpoint_uplinks[0][0];
        let dest = 8u32;
        let mut current = start;
        let mut hops = 0;
        loop {
            let next = tables[&current][&dest];
            if next == dest {
                break;
            }
            hops += 1;
            current = next;
        }
        assert_eq!(hops, 4);
    }

    #[test]
    fn torus_corner_to_corner_is_two_hops() {
        let layout = topology::build(9, &TopologySpec::Torus { side: 3 }).unwrap();
        let tables = build_routing_tables(9, &layout).unwrap();

        let start = layout.endpoint_uplinks[0][0];
        let dest = 8u32;
        let mut current = start;
        let mut hops = 0;
        loop {
            let next = tables[&current][&dest];
            if next == dest {
                break;
            }
            hops += 1;
            current = next;
        }
        assert_eq!(hops, 2);
    }

    #[test]
    fn folded_clos_routing_is_total() {
        let layout = topology::build(64, &TopologySpec::FoldedClos { k: 5, mode: 1, scheme: 0 }).unwrap();
        let tables = build_routing_tables(64, &layout).unwrap();
        for switch_table in tables.values() {
            assert_eq!(switch_table.len(), 64);
        }
    }
}
