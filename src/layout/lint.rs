//! Lint engine for detecting layout defects in flow graphs.
//!
//! Runs on a node snapshot, usually the resolver's output, and reports what
//! is still wrong: binary branches closer than `min_branch_gap`, unrelated
//! nodes overlapping in a row, and foreign nodes inside an N-way bracket.

use std::collections::HashSet;
use std::fmt;

use super::branches::{ConditionalKind, NodeCatalog, FALSE_BRANCH, TRUE_BRANCH};
use super::engine::BranchEngine;
use super::geometry::{extent_of, footprints_overlap, SAME_ROW_TOLERANCE};
use super::resolver::{bracket_padding, row_of, BRACKET_REACH, ROW_HEIGHT, TOLERANCE};
use super::subtree::Adjacency;
use super::types::{Edge, Node};

/// A lint warning about a layout defect
#[derive(Debug)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Branch,
    Overlap,
    Bracket,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Branch => write!(f, "branch"),
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Bracket => write!(f, "bracket"),
        }
    }
}

/// Run all lint checks on a node snapshot.
pub fn check<C: NodeCatalog>(
    nodes: &[Node],
    edges: &[Edge],
    engine: &BranchEngine<C>,
) -> Vec<LintWarning> {
    let adjacency = Adjacency::new(edges);
    let mut warnings = Vec::new();
    check_branches(nodes, &adjacency, engine, &mut warnings);
    check_overlaps(nodes, &adjacency, engine, &mut warnings);
    check_brackets(nodes, &adjacency, engine, &mut warnings);
    warnings
}

// ── Binary branch separation ──────────────────────────────────────

fn check_branches<C: NodeCatalog>(
    nodes: &[Node],
    adjacency: &Adjacency<'_>,
    engine: &BranchEngine<C>,
    warnings: &mut Vec<LintWarning>,
) {
    let config = engine.config();
    for node in nodes {
        if engine.conditional_kind(node) != Some(ConditionalKind::Binary) {
            continue;
        }
        let on_true = adjacency.branch_members(&node.id, TRUE_BRANCH);
        let on_false = adjacency.branch_members(&node.id, FALSE_BRANCH);
        let true_only: HashSet<&str> = on_true.difference(&on_false).copied().collect();
        let false_only: HashSet<&str> = on_false.difference(&on_true).copied().collect();

        let (Some(true_extent), Some(false_extent)) = (
            extent_of(nodes, &true_only, config.node_width),
            extent_of(nodes, &false_only, config.node_width),
        ) else {
            continue;
        };

        let distance = true_extent.distance_to(&false_extent);
        if distance < config.min_branch_gap - TOLERANCE {
            warnings.push(LintWarning {
                category: LintCategory::Branch,
                message: format!(
                    "branches true and false of \"{}\" are {} apart (need {})",
                    node.id, distance, config.min_branch_gap
                ),
            });
        } else if true_extent.min_x > false_extent.min_x {
            warnings.push(LintWarning {
                category: LintCategory::Branch,
                message: format!("branch true of \"{}\" sits right of branch false", node.id),
            });
        }
    }
}

// ── Row overlaps ──────────────────────────────────────────────────

fn check_overlaps<C: NodeCatalog>(
    nodes: &[Node],
    adjacency: &Adjacency<'_>,
    engine: &BranchEngine<C>,
    warnings: &mut Vec<LintWarning>,
) {
    let width = engine.config().node_width;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if row_of(a.position.y) != row_of(b.position.y) {
                continue;
            }
            if !footprints_overlap(a.position.x, b.position.x, width) {
                continue;
            }
            if adjacency.is_related(&a.id, &b.id) {
                continue;
            }
            let (left, right) = if a.position.x <= b.position.x {
                (a, b)
            } else {
                (b, a)
            };
            let overlap = left.position.x + width - right.position.x;
            warnings.push(LintWarning {
                category: LintCategory::Overlap,
                message: format!(
                    "\"{}\" and \"{}\" overlap by {} at y={}",
                    left.id,
                    right.id,
                    overlap,
                    row_of(left.position.y) as f64 * ROW_HEIGHT
                ),
            });
        }
    }
}

// ── N-way brackets ────────────────────────────────────────────────

fn check_brackets<C: NodeCatalog>(
    nodes: &[Node],
    adjacency: &Adjacency<'_>,
    engine: &BranchEngine<C>,
    warnings: &mut Vec<LintWarning>,
) {
    let config = engine.config();
    let pad = bracket_padding(config);
    let protected: HashSet<&str> = nodes
        .iter()
        .filter(|node| engine.conditional_kind(node) == Some(ConditionalKind::MultiWay))
        .flat_map(|node| adjacency.children(&node.id).collect::<Vec<_>>())
        .collect();

    for conditional in nodes {
        let Some(span) = engine.bracket_extent(conditional) else {
            continue;
        };
        let own = adjacency.reachable(&[conditional.id.as_str()]);
        let ancestors = adjacency.ancestors(&conditional.id);

        for node in nodes {
            let id = node.id.as_str();
            if own.contains(id) || ancestors.contains(id) || protected.contains(id) {
                continue;
            }
            let dy = node.position.y - conditional.position.y;
            if dy < -SAME_ROW_TOLERANCE || dy > BRACKET_REACH {
                continue;
            }
            let left = span.min_x - pad;
            let right = span.max_x + pad;
            if node.position.x < right - TOLERANCE
                && node.position.x + config.node_width > left + TOLERANCE
            {
                warnings.push(LintWarning {
                    category: LintCategory::Bracket,
                    message: format!(
                        "\"{}\" intrudes into the bracket of \"{}\" ({} to {})",
                        node.id, conditional.id, left, right
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::config::LayoutConfig;
    use crate::layout::types::{ConditionConfig, ReturnType};
    use serde_json::json;

    fn engine() -> BranchEngine {
        BranchEngine::new(LayoutConfig::default())
    }

    fn categories(warnings: &[LintWarning]) -> Vec<LintCategory> {
        warnings.iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_clean_layout_has_no_warnings() {
        let nodes = vec![
            Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary()),
            Node::new("t", -150.0, 350.0),
            Node::new("f", 150.0, 350.0),
        ];
        let edges = vec![
            Edge::branch("if", "true", "t"),
            Edge::branch("if", "false", "f"),
        ];
        assert!(check(&nodes, &edges, &engine()).is_empty());
    }

    #[test]
    fn test_branch_too_close() {
        let nodes = vec![
            Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary()),
            Node::new("t", -150.0, 350.0),
            Node::new("f", 100.0, 700.0),
        ];
        let edges = vec![
            Edge::branch("if", "true", "t"),
            Edge::branch("if", "false", "f"),
        ];
        let warnings = check(&nodes, &edges, &engine());
        assert_eq!(categories(&warnings), vec![LintCategory::Branch]);
        assert_eq!(
            warnings[0].to_string(),
            "[branch] branches true and false of \"if\" are 50 apart (need 100)"
        );
    }

    #[test]
    fn test_swapped_branches() {
        let nodes = vec![
            Node::new("if", 0.0, 0.0).with_condition(ConditionConfig::binary()),
            Node::new("t", 300.0, 350.0),
            Node::new("f", -300.0, 350.0),
        ];
        let edges = vec![
            Edge::branch("if", "true", "t"),
            Edge::branch("if", "false", "f"),
        ];
        let warnings = check(&nodes, &edges, &engine());
        assert_eq!(categories(&warnings), vec![LintCategory::Branch]);
        assert!(warnings[0].message.contains("right of branch false"));
    }

    #[test]
    fn test_related_nodes_may_overlap() {
        let nodes = vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 20.0)];
        let edges = vec![Edge::new("a", "b")];
        assert!(check(&nodes, &edges, &engine()).is_empty());
    }

    #[test]
    fn test_bracket_intrusion() {
        let nodes = vec![
            Node::new("s", 0.0, 0.0)
                .with_condition(ConditionConfig::multi_way(ReturnType::String, json!(["A"]))),
            Node::new("a", -110.0, 350.0),
            Node::new("x", 400.0, 350.0),
        ];
        let edges = vec![Edge::branch("s", "A", "a")];
        let warnings = check(&nodes, &edges, &engine());
        assert_eq!(categories(&warnings), vec![LintCategory::Bracket]);
        assert!(warnings[0].message.contains("\"x\""));
    }
}
