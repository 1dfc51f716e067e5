//! One proxy switch per endpoint; every proxy is a neighbor of every other.

use super::FabricLayout;
use bftsim_types::id::NodeId;
use fxhash::FxHashMap;

pub fn build(num_validators: u32) -> FabricLayout {
    let base = num_validators;
    let mut switch_adjacency = FxHashMap::default();
    let mut endpoint_uplinks = Vec::with_capacity(num_validators as usize);

    for i in 0..num_validators {
        let switch_id = base + i;
        let neighbors: Vec<NodeId> = (0..num_validators)
            .filter(|&j| j != i)
            .map(|j| base + j)
            .collect();
        switch_adjacency.insert(switch_id, neighbors);
        endpoint_uplinks.push(vec![switch_id]);
    }

    FabricLayout {
        switch_adjacency,
        endpoint_uplinks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_proxy_per_endpoint_fully_connected() {
        let layout = build(4);
        assert_eq!(layout.num_switches(), 4);
        for i in 0..4u32 {
            assert_eq!(layout.endpoint_uplinks[i as usize], vec![4 + i]);
            assert_eq!(layout.switch_adjacency[&(4 + i)].len(), 3);
        }
    }
}
