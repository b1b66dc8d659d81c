//! Branching layout engine
//!
//! This module takes a snapshot of a flow graph's nodes and edges and
//! repositions nodes so that the branches of conditional nodes, and subtrees
//! of unrelated parents, never overlap on screen.

pub mod branches;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod lint;
pub mod placement;
pub mod resolver;
pub mod subtree;
pub mod types;

pub use branches::{
    branch_index_offset, ConditionalKind, NodeCatalog, PayloadCatalog, ELSE_BRANCH, FALSE_BRANCH,
    MULTI_BRANCH_SPACING, TRUE_BRANCH,
};
pub use config::{ConfigError, LayoutConfig};
pub use engine::{expand_branches_to_prevent_overlap, BranchEngine};
pub use error::LayoutError;
pub use geometry::{branch_extent, detect_collision, SAME_ROW_TOLERANCE};
pub use lint::{LintCategory, LintWarning};
pub use placement::{sort_nodes_by_depth, BranchPlacement};
pub use resolver::{bracket_padding, LayoutReport, Shift, ShiftReason, MAX_ITERATIONS};
pub use subtree::{is_reachable, shift_subtree, subtree_nodes};
pub use types::*;
