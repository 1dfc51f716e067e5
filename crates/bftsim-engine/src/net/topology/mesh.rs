//! `side x (N/side)` grid, 4-neighborhood; `wraparound` selects mesh vs torus.

use super::FabricLayout;
use bftsim_types::errors::TopologyError;
use bftsim_types::id::NodeId;
use fxhash::FxHashMap;

pub fn build(num_validators: u32, side: u32, wraparound: bool) -> Result<FabricLayout, TopologyError> {
    if side == 0 || num_validators % side != 0 {
        return Err(TopologyError::SideDoesNotDivide {
            side,
            num_nodes: num_validators,
        });
    }
    let cols = num_validators / side;
    let base = num_validators;
    let idx = |row: u32, col: u32| -> u32 { row * cols + col };

    let mut switch_adjacency: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    let mut endpoint_uplinks = Vec::with_capacity(num_validators as usize);

    for row in 0..side {
        for col in 0..cols {
            let switch_id = base + idx(row, col);
            let mut neighbors = Vec::with_capacity(4);

            let mut push_row = |r: i64| {
                if wraparound {
                    let r = r.rem_euclid(side as i64) as u32;
                    neighbors.push(base + idx(r, col));
                } else if r >= 0 && (r as u32) < side {
                    neighbors.push(base + idx(r as u32, col));
                }
            };
            push_row(row as i64 - 1);
            push_row(row as i64 + 1);

            let mut push_col = |c: i64| {
                if wraparound {
                    let c = c.rem_euclid(cols as i64) as u32;
                    neighbors.push(base + idx(row, c));
                } else if c >= 0 && (c as u32) < cols {
                    neighbors.push(base + idx(row, c as u32));
                }
            };
            push_col(col as i64 - 1);
            push_col(col as i64 + 1);

            switch_adjacency.insert(switch_id, neighbors);
            endpoint_uplinks.push(vec![switch_id]);
        }
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
    fn rejects_non_dividing_side() {
        assert!(build(9, 4, false).is_err());
    }

    #[test]
    fn mesh_has_no_wraparound_neighbors() {
        let layout = build(9, 3, false).unwrap();
        // Corner switch (row 0, col 0) = switch id 9 has exactly 2 neighbors.
        assert_eq!(layout.switch_adjacency[&9].len(), 2);
    }

    #[test]
    fn torus_corner_has_four_neighbors() {
        let layout = build(9, 3, true).unwrap();
        assert_eq!(layout.switch_adjacency[&9].len(), 4);
    }
}
