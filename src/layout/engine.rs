//! Stateless layout engine value
//!
//! [`BranchEngine`] bundles the immutable configuration with the node catalog
//! that tells conditional nodes apart. It holds no graph state: every
//! operation takes a snapshot of nodes and edges and returns fresh values.
//! The branch, placement and resolver operations live in their own modules
//! as further `impl` blocks on this type.

use std::borrow::Cow;

use super::branches::{ConditionalKind, NodeCatalog, PayloadCatalog};
use super::config::LayoutConfig;
use super::types::{ConditionConfig, Edge, Node};

/// Branching layout engine over a node catalog
#[derive(Debug, Clone)]
pub struct BranchEngine<C = PayloadCatalog> {
    config: LayoutConfig,
    catalog: C,
}

impl BranchEngine<PayloadCatalog> {
    /// Engine reading branch configuration from node payloads
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            catalog: PayloadCatalog,
        }
    }
}

impl Default for BranchEngine<PayloadCatalog> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<C: NodeCatalog> BranchEngine<C> {
    /// Engine with a custom node catalog
    pub fn with_catalog(config: LayoutConfig, catalog: C) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub(crate) fn condition<'n>(&self, node: &'n Node) -> Option<Cow<'n, ConditionConfig>> {
        self.catalog.condition(node)
    }

    /// Binary or N-way, `None` for ordinary nodes
    pub fn conditional_kind(&self, node: &Node) -> Option<ConditionalKind> {
        self.condition(node).map(|condition| {
            if condition.return_type.is_multi_way() {
                ConditionalKind::MultiWay
            } else {
                ConditionalKind::Binary
            }
        })
    }

    /// Ids of all conditional nodes of `kind`, in collection order
    pub(crate) fn conditionals_of_kind(
        &self,
        nodes: &[Node],
        kind: ConditionalKind,
    ) -> Vec<String> {
        nodes
            .iter()
            .filter(|node| self.conditional_kind(node) == Some(kind))
            .map(|node| node.id.clone())
            .collect()
    }
}

/// Resolve branch overlaps with node payloads as the catalog.
///
/// Convenience entry point equivalent to
/// `BranchEngine::new(config.clone()).expand_branches_to_prevent_overlap(nodes, edges)`.
pub fn expand_branches_to_prevent_overlap(
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
) -> Vec<Node> {
    BranchEngine::new(config.clone()).expand_branches_to_prevent_overlap(nodes, edges)
}
