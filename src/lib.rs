//! Branch Layout - overlap-free placement for branching flow graphs
//!
//! This library computes node positions for a node-graph editor so that the
//! branches of conditional nodes, and subtrees of unrelated parents, never
//! overlap. It is a pure function from (nodes, edges, config) to nodes: it
//! never creates, deletes or rewires anything, it only moves nodes.
//!
//! # Example
//!
//! ```rust
//! use branch_layout::layout_json;
//!
//! let output = layout_json(r#"{
//!     "nodes": [
//!         { "id": "a", "position": { "x": 0, "y": 0 } },
//!         { "id": "b", "position": { "x": 150, "y": 0 } }
//!     ],
//!     "edges": []
//! }"#).unwrap();
//! assert!(output.contains("310"));
//! ```

pub mod error;
pub mod layout;

pub use error::GraphError;
pub use layout::{
    expand_branches_to_prevent_overlap, BranchEngine, ConfigError, Edge, LayoutConfig,
    LayoutError, LayoutReport, Node, NodeCatalog, PayloadCatalog, Point,
};

use serde::{Deserialize, Serialize};

/// A complete graph snapshot as exchanged with the graph store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Parse a graph document from JSON
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        serde_json::from_str(source).map_err(GraphError::json)
    }

    /// Serialize to JSON, pretty-printed unless `compact`
    pub fn to_json(&self, compact: bool) -> Result<String, GraphError> {
        let result = if compact {
            serde_json::to_string(self)
        } else {
            serde_json::to_string_pretty(self)
        };
        result.map_err(GraphError::Serialize)
    }

    /// Same document with the given node collection
    pub fn with_nodes(&self, nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            edges: self.edges.clone(),
        }
    }
}

/// Run the overlap resolver on a document with payload-based branch detection
pub fn layout_document(doc: &GraphDocument, config: &LayoutConfig) -> LayoutReport {
    BranchEngine::new(config.clone()).expand_branches_with_report(&doc.nodes, &doc.edges)
}

/// Lay out a JSON graph document with default configuration
///
/// This is the simplest entry point: JSON in, JSON with updated positions out.
pub fn layout_json(source: &str) -> Result<String, GraphError> {
    layout_json_with_config(source, &LayoutConfig::default())
}

/// Lay out a JSON graph document with custom configuration
///
/// # Example
///
/// ```rust
/// use branch_layout::{layout_json_with_config, LayoutConfig};
///
/// let config = LayoutConfig::default().with_min_branch_gap(40.0);
/// let output = layout_json_with_config(r#"{ "nodes": [], "edges": [] }"#, &config).unwrap();
/// assert!(output.contains("nodes"));
/// ```
pub fn layout_json_with_config(source: &str, config: &LayoutConfig) -> Result<String, GraphError> {
    let doc = GraphDocument::from_json(source)?;
    let report = layout_document(&doc, config);
    doc.with_nodes(report.nodes).to_json(false)
}
