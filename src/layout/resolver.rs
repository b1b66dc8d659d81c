//! Iterative overlap resolver
//!
//! The resolver works on a private copy of the node collection. It repeats
//! two passes until a pass changes nothing or the iteration cap is hit, then
//! runs a single bracket pass:
//!
//! 1. **Binary branches**: the `true` and `false` extents of every two-way
//!    conditional are split apart symmetrically, keeping the conditional
//!    centered between them.
//! 2. **Sibling rows**: nodes are bucketed into rows; a node closer than
//!    `min_branch_gap` to an unrelated node on its left in the same row has
//!    its subtree pushed further right.
//! 3. **Brackets** (once, after the loop): foreign subtrees intruding into the
//!    footprint spanned by an N-way conditional's branches are pushed out,
//!    away from its center.
//!
//! Direct branch children of N-way conditionals are protected: they keep
//! their index-based trunk positions and are never moved by the generic
//! rules. Every move goes through the subtree shift primitive, so a node and
//! its whole subtree always move together.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::branches::{
    branch_index_offset, ConditionalKind, NodeCatalog, FALSE_BRANCH, TRUE_BRANCH,
};
use super::config::LayoutConfig;
use super::engine::BranchEngine;
use super::geometry::{extent_of, SAME_ROW_TOLERANCE};
use super::subtree::{shift_in_place, Adjacency};
use super::types::{Edge, Extent, Node};

/// Upper bound on resolver passes
pub const MAX_ITERATIONS: usize = 10;

/// Height of the row buckets used for sibling collisions
pub(crate) const ROW_HEIGHT: f64 = 100.0;

/// Extra distance added to every corrective shift so corrected gaps do not
/// sit exactly on the threshold
const SHIFT_EPSILON: f64 = 10.0;

/// Added to `min_branch_gap` to pad an N-way bracket on both sides
const BRACKET_PADDING: f64 = 80.0;

/// How far below an N-way conditional its bracket keeps foreign nodes out
pub(crate) const BRACKET_REACH: f64 = 500.0;

/// Slack for floating-point comparisons against exact thresholds
pub(crate) const TOLERANCE: f64 = 1e-6;

/// Why a subtree was moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftReason {
    BinaryBranch,
    SiblingRow,
    Bracket,
}

/// One application of the subtree shift primitive
#[derive(Debug, Clone, PartialEq)]
pub struct Shift {
    /// Root of the moved subtree, or the conditional whose branch moved
    pub origin: String,
    /// Branch of `origin` that moved, for binary branch corrections
    pub branch: Option<String>,
    pub dx: f64,
    pub reason: ShiftReason,
    /// Ids of every moved node, sorted
    pub moved: Vec<String>,
}

/// Result of a resolver run
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutReport {
    pub nodes: Vec<Node>,
    /// Number of passes run
    pub iterations: usize,
    /// Whether the binary and sibling passes settled before the cap
    pub converged: bool,
    pub shifts: Vec<Shift>,
}

/// Row bucket of a y coordinate
pub(crate) fn row_of(y: f64) -> i64 {
    (y / ROW_HEIGHT).floor() as i64
}

/// Padding kept clear on both sides of an N-way bracket
pub fn bracket_padding(config: &LayoutConfig) -> f64 {
    config.min_branch_gap + BRACKET_PADDING
}

fn sorted_ids(ids: &HashSet<&str>) -> Vec<String> {
    let mut sorted: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    sorted.sort();
    sorted
}

fn bracket_at(x: f64, branch_count: usize, node_width: f64) -> Extent {
    let last = branch_count.saturating_sub(1);
    Extent {
        min_x: x + branch_index_offset(0, branch_count),
        max_x: x + branch_index_offset(last, branch_count) + node_width,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRole {
    /// Direct branch child of an N-way conditional
    Protected,
    Generic,
}

struct ProtectedNodes<'e> {
    ids: HashSet<&'e str>,
}

impl<'e> ProtectedNodes<'e> {
    fn collect(multi_way: &[String], adjacency: &Adjacency<'e>) -> Self {
        let ids = multi_way
            .iter()
            .flat_map(|id| adjacency.children(id).collect::<Vec<_>>())
            .collect();
        Self { ids }
    }

    fn role(&self, id: &str) -> NodeRole {
        if self.ids.contains(id) {
            NodeRole::Protected
        } else {
            NodeRole::Generic
        }
    }
}

struct Bracket {
    conditional: String,
    branch_count: usize,
}

/// Per-run bookkeeping derived once from the input snapshot
struct Plan<'e> {
    binary: Vec<String>,
    brackets: Vec<Bracket>,
    protected: ProtectedNodes<'e>,
}

/// Working copy of the nodes plus the shift log
struct Workspace<'e> {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    adjacency: Adjacency<'e>,
    shifts: Vec<Shift>,
    node_width: f64,
    min_gap: f64,
}

impl<'e> Workspace<'e> {
    fn new(nodes: &[Node], edges: &'e [Edge], config: &LayoutConfig) -> Self {
        Self {
            nodes: nodes.to_vec(),
            index: nodes
                .iter()
                .enumerate()
                .map(|(i, node)| (node.id.clone(), i))
                .collect(),
            adjacency: Adjacency::new(edges),
            shifts: Vec::new(),
            node_width: config.node_width,
            min_gap: config.min_branch_gap,
        }
    }

    fn record(
        &mut self,
        origin: &str,
        branch: Option<&str>,
        dx: f64,
        reason: ShiftReason,
        moved: Vec<String>,
    ) {
        debug!(origin, branch, dx, ?reason, moved = moved.len(), "shifted subtree");
        self.shifts.push(Shift {
            origin: origin.to_string(),
            branch: branch.map(str::to_string),
            dx,
            reason,
            moved,
        });
    }

    fn shift_subtree(&mut self, root: &str, dx: f64, reason: ShiftReason) {
        let ids = self.adjacency.reachable(&[root]);
        let moved = sorted_ids(&ids);
        shift_in_place(&mut self.nodes, &ids, dx);
        self.record(root, None, dx, reason, moved);
    }

    /// Split overlapping `true`/`false` extents of binary conditionals
    fn separate_binary_branches(&mut self, plan: &Plan<'_>) -> bool {
        let mut changed = false;

        for conditional in &plan.binary {
            let roots: Vec<&str> = [TRUE_BRANCH, FALSE_BRANCH]
                .iter()
                .flat_map(|branch| self.adjacency.branch_roots(conditional, branch))
                .collect();
            if roots
                .iter()
                .any(|root| plan.protected.role(root) == NodeRole::Protected)
            {
                continue;
            }

            let on_true = self.adjacency.branch_members(conditional, TRUE_BRANCH);
            let on_false = self.adjacency.branch_members(conditional, FALSE_BRANCH);

            // Nodes reachable through both branches (joins) belong to neither
            let true_only: HashSet<&str> = on_true.difference(&on_false).copied().collect();
            let false_only: HashSet<&str> = on_false.difference(&on_true).copied().collect();
            let (Some(true_extent), Some(false_extent)) = (
                extent_of(&self.nodes, &true_only, self.node_width),
                extent_of(&self.nodes, &false_only, self.node_width),
            ) else {
                continue;
            };

            let gap = true_extent.max_x - false_extent.min_x + self.min_gap;
            if gap <= TOLERANCE {
                continue;
            }

            let dx = (gap / 2.0).ceil() + SHIFT_EPSILON;
            let (moved_true, moved_false) = (sorted_ids(&on_true), sorted_ids(&on_false));
            shift_in_place(&mut self.nodes, &on_true, -dx);
            shift_in_place(&mut self.nodes, &on_false, dx);

            let reason = ShiftReason::BinaryBranch;
            self.record(conditional, Some(TRUE_BRANCH), -dx, reason, moved_true);
            self.record(conditional, Some(FALSE_BRANCH), dx, reason, moved_false);
            changed = true;
        }

        changed
    }

    /// Push apart unrelated neighbours sharing a row
    fn resolve_sibling_rows(&mut self, plan: &Plan<'_>) -> bool {
        let mut rows: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if plan.protected.role(&node.id) == NodeRole::Generic {
                rows.entry(row_of(node.position.y)).or_default().push(i);
            }
        }

        let mut changed = false;
        for (_, mut row) in rows {
            row.sort_by(|a, b| {
                self.nodes[*a]
                    .position
                    .x
                    .total_cmp(&self.nodes[*b].position.x)
            });

            // Each node clears every unrelated node to its left, not only its
            // neighbour: a related neighbour must not hide an overlap behind it.
            for (j, &right_at) in row.iter().enumerate() {
                let right = &self.nodes[right_at];
                let mut dx: f64 = 0.0;
                for &left_at in &row[..j] {
                    let left = &self.nodes[left_at];
                    if left.position.x > right.position.x {
                        continue;
                    }
                    let gap = right.position.x - (left.position.x + self.node_width);
                    if gap >= self.min_gap - TOLERANCE {
                        continue;
                    }
                    if self.adjacency.is_related(&left.id, &right.id) {
                        continue;
                    }
                    dx = dx.max(self.min_gap - gap + SHIFT_EPSILON);
                }

                if dx > 0.0 {
                    let root = right.id.clone();
                    self.shift_subtree(&root, dx, ShiftReason::SiblingRow);
                    changed = true;
                }
            }
        }

        changed
    }

    /// Push foreign subtrees out of every N-way bracket
    fn clear_brackets(&mut self, plan: &Plan<'_>) -> bool {
        let mut changed = false;
        let pad = self.min_gap + BRACKET_PADDING;

        for bracket in &plan.brackets {
            let Some(&at) = self.index.get(&bracket.conditional) else {
                continue;
            };
            let origin = self.nodes[at].position;
            let span = bracket_at(origin.x, bracket.branch_count, self.node_width);
            let zone = Extent {
                min_x: span.min_x - pad,
                max_x: span.max_x + pad,
            };
            let center = origin.x + self.node_width / 2.0;

            let own = self.adjacency.reachable(&[bracket.conditional.as_str()]);
            let ancestors = self.adjacency.ancestors(&bracket.conditional);
            let foreign: Vec<usize> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    let id = node.id.as_str();
                    !own.contains(id)
                        && !ancestors.contains(id)
                        && plan.protected.role(id) == NodeRole::Generic
                })
                .map(|(i, _)| i)
                .collect();

            for i in foreign {
                let position = self.nodes[i].position;
                let dy = position.y - origin.y;
                if dy < -SAME_ROW_TOLERANCE || dy > BRACKET_REACH {
                    continue;
                }
                let intrudes = position.x < zone.max_x - TOLERANCE
                    && position.x + self.node_width > zone.min_x + TOLERANCE;
                if !intrudes {
                    continue;
                }

                let dx = if position.x + self.node_width / 2.0 < center {
                    zone.min_x - (position.x + self.node_width)
                } else {
                    zone.max_x - position.x
                };
                let root = self.nodes[i].id.clone();
                self.shift_subtree(&root, dx, ShiftReason::Bracket);
                changed = true;
            }
        }

        changed
    }
}

impl<C: NodeCatalog> BranchEngine<C> {
    fn plan<'e>(&self, nodes: &[Node], adjacency: &Adjacency<'e>) -> Plan<'e> {
        let multi_way = self.conditionals_of_kind(nodes, ConditionalKind::MultiWay);
        let brackets = nodes
            .iter()
            .filter(|node| multi_way.contains(&node.id))
            .map(|node| Bracket {
                conditional: node.id.clone(),
                branch_count: self.multi_condition_branches(node).len(),
            })
            .collect();
        Plan {
            binary: self.conditionals_of_kind(nodes, ConditionalKind::Binary),
            brackets,
            protected: ProtectedNodes::collect(&multi_way, adjacency),
        }
    }

    /// Horizontal span of an N-way conditional's branch trunks, footprints
    /// included. `None` for anything but an N-way conditional.
    pub fn bracket_extent(&self, node: &Node) -> Option<Extent> {
        if self.conditional_kind(node) != Some(ConditionalKind::MultiWay) {
            return None;
        }
        let count = self.multi_condition_branches(node).len();
        Some(bracket_at(node.position.x, count, self.config().node_width))
    }

    /// Move nodes until no branches, row siblings or brackets collide.
    ///
    /// Returns a new node collection; only positions differ from the input.
    /// Reaching the iteration cap is not an error, the best layout found so
    /// far is returned.
    pub fn expand_branches_to_prevent_overlap(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        self.expand_branches_with_report(nodes, edges).nodes
    }

    /// Like [`BranchEngine::expand_branches_to_prevent_overlap`], also
    /// reporting how the layout was reached.
    pub fn expand_branches_with_report(&self, nodes: &[Node], edges: &[Edge]) -> LayoutReport {
        let mut workspace = Workspace::new(nodes, edges, self.config());
        let plan = self.plan(nodes, &workspace.adjacency);

        let mut iterations = 0;
        let mut converged = false;
        while iterations < MAX_ITERATIONS {
            iterations += 1;
            let mut changed = workspace.separate_binary_branches(&plan);
            changed |= workspace.resolve_sibling_rows(&plan);
            debug!(iteration = iterations, changed, "overlap resolver pass");
            if !changed {
                converged = true;
                break;
            }
        }
        if !converged {
            debug!(iterations, "iteration cap reached, keeping best-effort layout");
        }

        let bracketed = workspace.clear_brackets(&plan);
        debug!(changed = bracketed, "bracket pass");

        LayoutReport {
            nodes: workspace.nodes,
            iterations,
            converged,
            shifts: workspace.shifts,
        }
    }

    /// Single bracket pass: push foreign subtrees out of every N-way
    /// conditional's padded bracket, away from its center.
    pub fn resolve_multi_condition_overlap(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        let mut workspace = Workspace::new(nodes, edges, self.config());
        let plan = self.plan(nodes, &workspace.adjacency);
        workspace.clear_brackets(&plan);
        workspace.nodes
    }
}
