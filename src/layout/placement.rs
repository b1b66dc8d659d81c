//! Per-branch placement
//!
//! Where a branch's trunk sits horizontally and where the next node appended
//! to a branch goes.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::branches::{ConditionalKind, NodeCatalog, FALSE_BRANCH, TRUE_BRANCH};
use super::engine::BranchEngine;
use super::geometry::branch_extent;
use super::subtree::Adjacency;
use super::types::{BranchDescriptor, Edge, Node, Point, TreePosition};

/// Computed placement of one branch of a conditional node
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPlacement {
    /// Descriptor of the branch, `None` when the conditional has no such branch
    pub branch: Option<BranchDescriptor>,
    /// X coordinate of the branch trunk
    pub trunk_x: f64,
    /// Width of the branch's current extent (one footprint when empty)
    pub width: f64,
    /// Horizontal room the branch claims: its width, at least one lane
    pub lane_width: f64,
    /// Ids of the nodes already in the branch, shallowest first
    pub nodes: Vec<String>,
    /// Where a node appended to the branch goes
    pub next_position: TreePosition,
}

impl<C: NodeCatalog> BranchEngine<C> {
    /// Lateral distance of a branch trunk from its conditional node.
    ///
    /// For N-way nodes this is the signed index-based offset (zero for an
    /// unknown branch). For binary nodes it is a magnitude: at least
    /// `branch_offset`, and far enough that the trunk clears the opposite
    /// branch's extent by `min_branch_gap`. The caller applies the direction
    /// (`true` goes left). Unknown nodes and non-conditionals get
    /// `branch_offset`.
    pub fn safe_offset(
        &self,
        conditional_id: &str,
        branch_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> f64 {
        let config = self.config();
        let Some(conditional) = nodes.iter().find(|node| node.id == conditional_id) else {
            return config.branch_offset;
        };

        match self.conditional_kind(conditional) {
            None => config.branch_offset,
            Some(ConditionalKind::MultiWay) => self
                .multi_branch_offset(conditional, branch_id)
                .unwrap_or_else(|| {
                    warn!(node = conditional_id, branch = branch_id, "branch not found, centering on node");
                    0.0
                }),
            Some(ConditionalKind::Binary) => {
                let opposite = match branch_id {
                    TRUE_BRANCH => FALSE_BRANCH,
                    FALSE_BRANCH => TRUE_BRANCH,
                    _ => return config.branch_offset,
                };
                let Some(extent) = branch_extent(conditional_id, opposite, nodes, edges, config)
                else {
                    return config.branch_offset;
                };

                let x = conditional.position.x;
                let required = if branch_id == TRUE_BRANCH {
                    x + config.node_width + config.min_branch_gap - extent.min_x
                } else {
                    extent.max_x + config.min_branch_gap - x
                };
                config.branch_offset.max(required)
            }
        }
    }

    /// Width of a branch's extent, or a single footprint when it is empty
    pub fn branch_width(
        &self,
        conditional_id: &str,
        branch_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> f64 {
        let config = self.config();
        branch_extent(conditional_id, branch_id, nodes, edges, config)
            .map_or(config.node_width, |extent| extent.width())
    }

    /// Position for a node appended to a branch: on the branch trunk, one
    /// `vertical_spacing` below the deepest node of the branch, or below the
    /// conditional itself when the branch is empty.
    ///
    /// Returns `None` when `conditional_id` is not in `nodes`.
    pub fn next_node_position(
        &self,
        conditional_id: &str,
        branch_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> Option<TreePosition> {
        let conditional = nodes.iter().find(|node| node.id == conditional_id)?;
        let x = self.branch_x_position(conditional, branch_id, nodes, edges);

        let adjacency = Adjacency::new(edges);
        let members = adjacency.branch_members(conditional_id, branch_id);
        let deepest = nodes
            .iter()
            .filter(|node| members.contains(node.id.as_str()))
            .map(|node| node.position.y)
            .reduce(f64::max);

        let y = deepest.unwrap_or(conditional.position.y) + self.config().vertical_spacing;
        Some(Point::new(x, y))
    }

    /// Full placement of one branch: trunk, width, depth-ordered members and
    /// the slot for the next node.
    pub fn branch_layout(
        &self,
        conditional_id: &str,
        branch_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> Option<BranchPlacement> {
        let conditional = nodes.iter().find(|node| node.id == conditional_id)?;
        let next_position = self.next_node_position(conditional_id, branch_id, nodes, edges)?;

        let branch = self
            .multi_condition_branches(conditional)
            .into_iter()
            .find(|branch| branch.id == branch_id);

        let adjacency = Adjacency::new(edges);
        let roots = adjacency.branch_roots(conditional_id, branch_id);
        let ordered = sort_nodes_by_depth(&roots, nodes, edges)
            .into_iter()
            .filter(|(node, _)| node.id != conditional_id)
            .map(|(node, _)| node.id.clone())
            .collect();

        let width = self.branch_width(conditional_id, branch_id, nodes, edges);
        Some(BranchPlacement {
            branch,
            trunk_x: next_position.x,
            width,
            lane_width: width.max(self.config().horizontal_spacing),
            nodes: ordered,
            next_position,
        })
    }
}

/// Nodes reachable from `roots`, ordered by DFS depth (roots at depth 0).
///
/// Each node appears once, at the depth of its first visit. Nodes of equal
/// depth keep DFS order.
pub fn sort_nodes_by_depth<'n>(
    roots: &[&str],
    nodes: &'n [Node],
    edges: &[Edge],
) -> Vec<(&'n Node, usize)> {
    let adjacency = Adjacency::new(edges);
    let by_id: HashMap<&str, &'n Node> = nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack: Vec<(&str, usize)> = roots.iter().rev().map(|root| (*root, 0)).collect();
    while let Some((id, depth)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(node) = by_id.get(id) {
            ordered.push((*node, depth));
        }
        let children: Vec<&str> = adjacency.children(id).collect();
        for child in children.into_iter().rev() {
            if !visited.contains(child) {
                stack.push((child, depth + 1));
            }
        }
    }

    ordered.sort_by_key(|(_, depth)| *depth);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::config::LayoutConfig;
    use crate::layout::types::{ConditionConfig, ReturnType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> BranchEngine {
        BranchEngine::new(LayoutConfig::default())
    }

    fn binary_graph() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary()),
            Node::new("t1", -150.0, 350.0),
            Node::new("t2", -150.0, 700.0),
            Node::new("f1", 100.0, 350.0),
        ];
        let edges = vec![
            Edge::branch("if", "true", "t1"),
            Edge::new("t1", "t2"),
            Edge::branch("if", "false", "f1"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_safe_offset_unknown_conditional() {
        let (nodes, edges) = binary_graph();
        assert_eq!(engine().safe_offset("nope", "true", &nodes, &edges), 150.0);
        assert_eq!(engine().safe_offset("t1", "true", &nodes, &edges), 150.0);
    }

    #[test]
    fn test_safe_offset_clears_opposite_branch() {
        let (nodes, edges) = binary_graph();
        // false extent starts at 100: 0 + 200 + 100 - 100
        assert_eq!(engine().safe_offset("if", "true", &nodes, &edges), 200.0);
        // true extent ends at 50: 50 + 100 - 0
        assert_eq!(engine().safe_offset("if", "false", &nodes, &edges), 150.0);
    }

    #[test]
    fn test_safe_offset_empty_opposite() {
        let nodes = vec![Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary())];
        assert_eq!(engine().safe_offset("if", "false", &nodes, &[]), 150.0);
    }

    #[test]
    fn test_safe_offset_multi_way_is_signed() {
        let nodes = vec![Node::new("s", 0.0, 0.0)
            .with_condition(ConditionConfig::multi_way(ReturnType::String, json!(["a"])))];
        assert_eq!(engine().safe_offset("s", "a", &nodes, &[]), -110.0);
        assert_eq!(engine().safe_offset("s", "else", &nodes, &[]), 110.0);
        assert_eq!(engine().safe_offset("s", "zzz", &nodes, &[]), 0.0);
    }

    #[test]
    fn test_next_position_empty_branch() {
        let nodes = vec![Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary())];
        let position = engine().next_node_position("if", "true", &nodes, &[]);
        assert_eq!(position, Some(Point::new(-150.0, 350.0)));
    }

    #[test]
    fn test_next_position_below_deepest() {
        let (nodes, edges) = binary_graph();
        let position = engine()
            .next_node_position("if", "true", &nodes, &edges)
            .unwrap();
        assert_eq!(position, Point::new(-200.0, 1050.0));
    }

    #[test]
    fn test_next_position_unknown_conditional() {
        let (nodes, edges) = binary_graph();
        assert_eq!(engine().next_node_position("ghost", "true", &nodes, &edges), None);
    }

    #[test]
    fn test_branch_width() {
        let (nodes, edges) = binary_graph();
        assert_eq!(engine().branch_width("if", "true", &nodes, &edges), 200.0);
        assert_eq!(engine().branch_width("if", "else", &nodes, &edges), 200.0);
    }

    #[test]
    fn test_branch_layout() {
        let (nodes, edges) = binary_graph();
        let placement = engine().branch_layout("if", "true", &nodes, &edges).unwrap();
        assert_eq!(placement.branch.as_ref().map(|b| b.index), Some(0));
        assert_eq!(placement.trunk_x, -200.0);
        assert_eq!(placement.nodes, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(placement.lane_width, 250.0);
        assert_eq!(placement.next_position.y, 1050.0);
    }

    #[test]
    fn test_sort_nodes_by_depth() {
        let nodes = vec![
            Node::new("deep", 0.0, 0.0),
            Node::new("mid_b", 0.0, 0.0),
            Node::new("mid_a", 0.0, 0.0),
            Node::new("root", 0.0, 0.0),
        ];
        let edges = vec![
            Edge::new("root", "mid_a"),
            Edge::new("root", "mid_b"),
            Edge::new("mid_a", "deep"),
            Edge::new("deep", "root"),
        ];
        let sorted: Vec<(&str, usize)> = sort_nodes_by_depth(&["root"], &nodes, &edges)
            .into_iter()
            .map(|(node, depth)| (node.id.as_str(), depth))
            .collect();
        assert_eq!(
            sorted,
            vec![("root", 0), ("mid_a", 1), ("mid_b", 1), ("deep", 2)]
        );
    }
}
