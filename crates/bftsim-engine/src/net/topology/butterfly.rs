//! `k`-radix butterfly / folded-Clos fabric.
//!
//! Level 1 has `ceil(N/k)` switches, each serving up to `k` endpoints
//! (`mode` selects flushed-block vs round-robin assignment). Each higher
//! level merges the previous level's switches into groups, one switch per
//! group, bottoming out when a level has a single switch. The group size
//! used for that merge is chosen by `scheme` (spec §4.8): `scheme=1`
//! groups by `k`, the radix's maximum allowed group, which minimizes the
//! number of switches (and levels) needed to collapse to the top — "maximize
//! group size per layer". `scheme=0` instead always groups by 2, the
//! smallest group that still makes progress, producing as many switches
//! (and levels) as possible along the way — "maximize group count per
//! layer".
//!
//! Butterfly edges are directed: "up" between every adjacent level, "down"
//! (the pre-wired return path) between every adjacent level except the
//! topmost boundary, so the single top switch has no direct way back down.
//! Folded-Clos uses the same level hierarchy with every boundary
//! bidirectional.

use super::FabricLayout;
use bftsim_types::errors::TopologyError;
use bftsim_types::id::NodeId;
use fxhash::FxHashMap;

fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// The per-boundary merge-group size selected by `scheme` (capped at `k`,
/// the radix, since a switch can never serve more downlinks than its radix
/// allows even under the group-count-maximizing scheme).
fn group_size_for_scheme(k: u32, scheme: u8) -> u32 {
    match scheme {
        0 => 2.min(k),
        _ => k,
    }
}

/// Per-level switch counts, starting at level 1 (endpoint-facing) and
/// ending at the single top switch.
fn level_sizes(num_level1: u32, k: u32, scheme: u8) -> Vec<u32> {
    let group_size = group_size_for_scheme(k, scheme);
    let mut levels = vec![num_level1];
    while *levels.last().unwrap() > 1 {
        let prev = *levels.last().unwrap();
        levels.push(div_ceil(prev, group_size));
    }
    levels
}

pub fn build(
    num_validators: u32,
    k: u32,
    mode: u8,
    scheme: u8,
    bidirectional: bool,
) -> Result<FabricLayout, TopologyError> {
    if k == 0 {
        return Err(TopologyError::InvalidParameter {
            message: "butterfly/folded-clos radix k must be >= 1".to_string(),
        });
    }
    let num_level1 = div_ceil(num_validators, k);
    if num_level1 == 0 {
        return Err(TopologyError::NoValidDecomposition {
            k,
            num_nodes: num_validators,
        });
    }
    let levels = level_sizes(num_level1, k, scheme);
    let group_size = group_size_for_scheme(k, scheme);

    // Assign each level's switches a stable, globally unique id starting
    // right after the validators.
    let base = num_validators;
    let mut level_start = Vec::with_capacity(levels.len());
    let mut next_id = base;
    for &count in &levels {
        level_start.push(next_id);
        next_id += count;
    }
    let switch_id = |level: usize, group: u32| -> NodeId { level_start[level] + group };

    let mut switch_adjacency: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for (level, &count) in levels.iter().enumerate() {
        for g in 0..count {
            switch_adjacency.insert(switch_id(level, g), Vec::new());
        }
    }

    let num_boundaries = levels.len() - 1;
    for boundary in 0..num_boundaries {
        let lower_count = levels[boundary];
        for lower_group in 0..lower_count {
            let upper_group = lower_group / group_size;
            let lower_id = switch_id(boundary, lower_group);
            let upper_id = switch_id(boundary + 1, upper_group);

            switch_adjacency.get_mut(&lower_id).unwrap().push(upper_id);

            let has_down_edge = bidirectional || boundary < num_boundaries - 1;
            if has_down_edge {
                switch_adjacency.get_mut(&upper_id).unwrap().push(lower_id);
            }
        }
    }

    let mut endpoint_uplinks = vec![Vec::new(); num_validators as usize];
    for e in 0..num_validators {
        let group = match mode {
            0 => e / k,         // flushed: consecutive blocks of k
            1 => e % num_level1, // spread: round-robin
            _ => {
                return Err(TopologyError::InvalidParameter {
                    message: format!("mode {mode} must be 0 or 1"),
                })
            }
        };
        let switch = switch_id(0, group);
        endpoint_uplinks[e as usize] = vec![switch];
    }

    Ok(FabricLayout {
        switch_adjacency,
        endpoint_uplinks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_sizes_bottom_out_at_one() {
        // scheme=1 groups by k: maximum group size, fewest levels.
        assert_eq!(level_sizes(64, 4, 1), vec![64, 16, 4, 1]);
        assert_eq!(level_sizes(1, 4, 1), vec![1]);
    }

    #[test]
    fn scheme_zero_groups_by_two_producing_more_levels_than_scheme_one() {
        // scheme=0 always groups by 2 regardless of k, so it takes more
        // levels to collapse to a single top switch than scheme=1's
        // group-by-k for the same starting width.
        assert_eq!(level_sizes(13, 5, 0), vec![13, 7, 4, 2, 1]);
        assert_eq!(level_sizes(13, 5, 1), vec![13, 3, 1]);
    }

    #[test]
    fn folded_clos_64_nodes_builds_with_bidirectional_top() {
        let layout = build(64, 5, 1, 0, true).unwrap();
        // Top level has a single switch; its only neighbors are lower-level
        // switches, and each of those points back down to it (bidirectional).
        let top_id = *layout
            .switch_adjacency
            .keys()
            .max()
            .expect("non-empty fabric");
        assert!(!layout.switch_adjacency[&top_id].is_empty());
    }

    #[test]
    fn butterfly_top_boundary_has_no_down_edge() {
        let layout = build(25, 5, 0, 0, false).unwrap();
        // Regardless of how many levels `scheme` produces, the top switch is
        // only ever the "upper" end of the topmost boundary, which never
        // gets a down edge when `bidirectional` is false.
        let top_id = *layout
            .switch_adjacency
            .keys()
            .max()
            .expect("non-empty fabric");
        assert!(layout.switch_adjacency[&top_id].is_empty());
    }

    #[test]
    fn rejects_mode_outside_range() {
        assert!(build(16, 4, 2, 0, false).is_err());
    }
}
