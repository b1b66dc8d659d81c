//! Branch descriptor resolution
//!
//! A conditional node branches either two ways (`true`/`false`) or N ways,
//! one branch per declared case value followed by a synthetic `else`. The
//! descriptor order is the canonical left-to-right order of the branches on
//! screen.
//!
//! N-way branches sit at fixed, index-based offsets symmetric around their
//! conditional node:
//!
//! ```text
//! offset(i, n) = -((n - 1) * MULTI_BRANCH_SPACING) / 2 + i * MULTI_BRANCH_SPACING
//! ```

use std::borrow::Cow;
use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::engine::BranchEngine;
use super::types::{BranchDescriptor, ConditionConfig, Edge, Node};

pub const TRUE_BRANCH: &str = "true";
pub const FALSE_BRANCH: &str = "false";
pub const ELSE_BRANCH: &str = "else";

/// Horizontal distance between adjacent N-way branch trunks
pub const MULTI_BRANCH_SPACING: f64 = 220.0;

/// How a conditional node branches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKind {
    /// Two branches, `true` left of `false`
    Binary,
    /// One branch per case value plus `else`
    MultiWay,
}

/// Tells conditional nodes apart and exposes their branch configuration.
///
/// This is the seam to the editor's node catalog. Closures of the shape
/// `Fn(&Node) -> Option<ConditionConfig>` are catalogs too.
pub trait NodeCatalog {
    /// Branch configuration of `node`, `None` when it is not conditional
    fn condition<'n>(&self, node: &'n Node) -> Option<Cow<'n, ConditionConfig>>;
}

/// Catalog reading `data.condition` straight from the node payload
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCatalog;

impl NodeCatalog for PayloadCatalog {
    fn condition<'n>(&self, node: &'n Node) -> Option<Cow<'n, ConditionConfig>> {
        node.data.condition.as_ref().map(Cow::Borrowed)
    }
}

impl<F> NodeCatalog for F
where
    F: Fn(&Node) -> Option<ConditionConfig>,
{
    fn condition<'n>(&self, node: &'n Node) -> Option<Cow<'n, ConditionConfig>> {
        self(node).map(Cow::Owned)
    }
}

/// Offset of branch `index` out of `count` from the conditional's position
pub fn branch_index_offset(index: usize, count: usize) -> f64 {
    let span = count.saturating_sub(1) as f64 * MULTI_BRANCH_SPACING;
    -span / 2.0 + index as f64 * MULTI_BRANCH_SPACING
}

#[derive(Debug, Error)]
enum CaseError {
    #[error("cases are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a list of cases, found {0}")]
    NotAList(&'static str),
    #[error("case #{0} has no usable return value")]
    MissingValue(usize),
}

impl<C: NodeCatalog> BranchEngine<C> {
    /// Branches of a conditional node in canonical order.
    ///
    /// Binary nodes yield `[true, false]`. N-way nodes yield their case
    /// values, deduplicated in first-seen order, followed by `else`. A case
    /// list that cannot be parsed is logged and treated as empty, leaving only
    /// `else`. Non-conditional nodes have no branches.
    pub fn multi_condition_branches(&self, node: &Node) -> Vec<BranchDescriptor> {
        let Some(condition) = self.condition(node) else {
            return Vec::new();
        };

        if !condition.return_type.is_multi_way() {
            return vec![
                BranchDescriptor {
                    id: TRUE_BRANCH.to_string(),
                    label: "True".to_string(),
                    index: 0,
                },
                BranchDescriptor {
                    id: FALSE_BRANCH.to_string(),
                    label: "False".to_string(),
                    index: 1,
                },
            ];
        }

        let cases = parse_cases(&condition.cases).unwrap_or_else(|error| {
            warn!(node = %node.id, %error, "malformed case configuration, only else remains");
            Vec::new()
        });

        let mut branches: Vec<BranchDescriptor> = cases
            .into_iter()
            .enumerate()
            .map(|(index, value)| BranchDescriptor {
                label: value.clone(),
                id: value,
                index,
            })
            .collect();
        branches.push(BranchDescriptor {
            id: ELSE_BRANCH.to_string(),
            label: "Else".to_string(),
            index: branches.len(),
        });
        branches
    }

    /// Signed offset of an N-way branch from its conditional node, `None`
    /// when the node has no branch with that id.
    pub fn multi_branch_offset(&self, node: &Node, branch_id: &str) -> Option<f64> {
        let branches = self.multi_condition_branches(node);
        branches
            .iter()
            .position(|branch| branch.id == branch_id)
            .map(|index| branch_index_offset(index, branches.len()))
    }

    /// X coordinate for nodes on the trunk of one branch.
    ///
    /// All footprints share one width, so placing a branch node at the
    /// conditional's x plus an offset centers it at the conditional's center
    /// plus that offset. N-way branches use their index-based offset; binary
    /// branches go left (`true`) or right (`false`) by
    /// [`BranchEngine::safe_offset`]. An unknown branch centers on the
    /// conditional node.
    pub fn branch_x_position(
        &self,
        conditional: &Node,
        branch_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> f64 {
        let x = conditional.position.x;
        match self.conditional_kind(conditional) {
            Some(ConditionalKind::MultiWay) => {
                match self.multi_branch_offset(conditional, branch_id) {
                    Some(offset) => x + offset,
                    None => {
                        warn!(node = %conditional.id, branch = branch_id, "branch not found, centering on node");
                        x
                    }
                }
            }
            Some(ConditionalKind::Binary) => match branch_id {
                TRUE_BRANCH => x - self.safe_offset(&conditional.id, branch_id, nodes, edges),
                FALSE_BRANCH => x + self.safe_offset(&conditional.id, branch_id, nodes, edges),
                _ => {
                    warn!(node = %conditional.id, branch = branch_id, "branch not found, centering on node");
                    x
                }
            },
            None => x,
        }
    }
}

/// Case values of an N-way configuration, deduplicated in first-seen order.
///
/// Accepts a JSON list or a string holding one. Entries are scalars or objects
/// carrying `returnValue` (or `value`). A literal `else` case is dropped since
/// the synthetic `else` branch always exists.
fn parse_cases(raw: &Value) -> Result<Vec<String>, CaseError> {
    let parsed;
    let items = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text)?;
            match &parsed {
                Value::Array(items) => items,
                other => return Err(CaseError::NotAList(kind_name(other))),
            }
        }
        Value::Array(items) => items,
        other => return Err(CaseError::NotAList(kind_name(other))),
    };

    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for (position, item) in items.iter().enumerate() {
        let value = case_value(item).ok_or(CaseError::MissingValue(position + 1))?;
        if value == ELSE_BRANCH {
            continue;
        }
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }
    Ok(values)
}

fn case_value(item: &Value) -> Option<String> {
    match item {
        Value::Object(fields) => fields
            .get("returnValue")
            .or_else(|| fields.get("value"))
            .and_then(scalar_value),
        other => scalar_value(other),
    }
}

fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
