//! Footprint geometry: extents and same-row collision tests

use std::collections::HashSet;

use super::config::LayoutConfig;
use super::subtree::Adjacency;
use super::types::{CollisionResult, Edge, Extent, Node, Point};

/// Nodes closer than this vertically are treated as sharing a row
pub const SAME_ROW_TOLERANCE: f64 = 150.0;

/// Test a prospective footprint at `position` against every node in the same
/// row, padding each node by `min_branch_gap` on both sides.
///
/// Reports the node needing the largest rightward shift to clear. Nodes more
/// than [`SAME_ROW_TOLERANCE`] away vertically never collide.
pub fn detect_collision(
    position: Point,
    width: f64,
    nodes: &[Node],
    exclude_id: Option<&str>,
    config: &LayoutConfig,
) -> CollisionResult {
    let mut result = CollisionResult::none();

    for node in nodes {
        if exclude_id == Some(node.id.as_str()) {
            continue;
        }
        if (node.position.y - position.y).abs() > SAME_ROW_TOLERANCE {
            continue;
        }

        let padded_left = node.position.x - config.min_branch_gap;
        let padded_right = node.position.x + config.node_width + config.min_branch_gap;
        if position.x < padded_right && position.x + width > padded_left {
            let shift = padded_right - position.x;
            if result.required_shift.map_or(true, |worst| shift > worst) {
                result = CollisionResult::hit(node.id.as_str(), shift);
            }
        }
    }

    result
}

/// Horizontal extent of everything reachable through one branch of a
/// conditional node, or `None` when the branch is empty.
pub fn branch_extent(
    conditional_id: &str,
    branch_id: &str,
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
) -> Option<Extent> {
    let adjacency = Adjacency::new(edges);
    let members = adjacency.branch_members(conditional_id, branch_id);
    extent_of(nodes, &members, config.node_width)
}

/// Union of the footprints of the nodes named in `ids`
pub(crate) fn extent_of(nodes: &[Node], ids: &HashSet<&str>, node_width: f64) -> Option<Extent> {
    nodes
        .iter()
        .filter(|node| ids.contains(node.id.as_str()))
        .map(|node| Extent::of_footprint(node.position.x, node_width))
        .reduce(|acc, extent| acc.union(&extent))
}

/// Whether two footprints of `width` starting at `a` and `b` overlap
pub(crate) fn footprints_overlap(a: f64, b: f64, width: f64) -> bool {
    a < b + width && b < a + width
}
