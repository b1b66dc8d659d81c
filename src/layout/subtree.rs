//! Subtree extraction and translation
//!
//! A node's subtree is its forward-reachability closure through the edge set.
//! Traversals keep a visited set, so cyclic edge sets terminate.

use std::collections::{HashMap, HashSet};

use super::types::{Edge, Node};

/// Outgoing and incoming edge lists keyed by node id
#[derive(Debug, Default)]
pub(crate) struct Adjacency<'e> {
    outgoing: HashMap<&'e str, Vec<&'e Edge>>,
    incoming: HashMap<&'e str, Vec<&'e str>>,
}

impl<'e> Adjacency<'e> {
    pub(crate) fn new(edges: &'e [Edge]) -> Self {
        let mut adjacency = Self::default();
        for edge in edges {
            adjacency
                .outgoing
                .entry(edge.source.as_str())
                .or_default()
                .push(edge);
            adjacency
                .incoming
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }
        adjacency
    }

    /// Direct successors of `id`, in edge order
    pub(crate) fn children(&self, id: &str) -> impl Iterator<Item = &'e str> + '_ {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|edge| edge.target.as_str())
    }

    /// Targets of the edges leaving `id` through the branch `handle`
    pub(crate) fn branch_roots(&self, id: &str, handle: &str) -> Vec<&'e str> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter(|edge| edge.source_handle.as_deref() == Some(handle))
            .map(|edge| edge.target.as_str())
            .collect()
    }

    /// Every id reachable from `roots`, the roots included
    pub(crate) fn reachable<'a>(&'a self, roots: &[&'a str]) -> HashSet<&'a str>
    where
        'e: 'a,
    {
        self.reachable_avoiding(roots, None)
    }

    /// Like [`Adjacency::reachable`], but never enters `blocked`
    fn reachable_avoiding<'a>(
        &'a self,
        roots: &[&'a str],
        blocked: Option<&str>,
    ) -> HashSet<&'a str>
    where
        'e: 'a,
    {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<&'a str> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if Some(id) == blocked || !visited.insert(id) {
                continue;
            }
            for child in self.children(id) {
                if !visited.contains(child) {
                    stack.push(child);
                }
            }
        }
        visited
    }

    /// Every id from which `id` can be reached, `id` excluded
    pub(crate) fn ancestors<'a>(&'a self, id: &'a str) -> HashSet<&'a str>
    where
        'e: 'a,
    {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<&'a str> = self.incoming.get(id).cloned().unwrap_or_default();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(parents) = self.incoming.get(current) {
                stack.extend(parents.iter().copied().filter(|p| !visited.contains(*p)));
            }
        }
        visited.remove(id);
        visited
    }

    /// Ids reachable through one branch of `conditional_id`.
    ///
    /// The traversal stops at the conditional itself, so an edge looping back
    /// to it never pulls the sibling branches in.
    pub(crate) fn branch_members<'a>(
        &'a self,
        conditional_id: &str,
        handle: &str,
    ) -> HashSet<&'a str>
    where
        'e: 'a,
    {
        let roots = self.branch_roots(conditional_id, handle);
        self.reachable_avoiding(&roots, Some(conditional_id))
    }

    pub(crate) fn is_related(&self, a: &str, b: &str) -> bool {
        self.reachable(&[a]).contains(b) || self.reachable(&[b]).contains(a)
    }
}

/// Forward reachability closure of `root_id`, including the root itself.
///
/// Nodes are returned in collection order. Ids reachable through edges but
/// missing from `nodes` are skipped.
pub fn subtree_nodes<'n>(root_id: &str, edges: &[Edge], nodes: &'n [Node]) -> Vec<&'n Node> {
    let adjacency = Adjacency::new(edges);
    let ids = adjacency.reachable(&[root_id]);
    nodes
        .iter()
        .filter(|node| ids.contains(node.id.as_str()))
        .collect()
}

/// New node collection with the whole subtree of `root_id` moved by
/// `x_offset`. Every other node is returned unchanged.
pub fn shift_subtree(root_id: &str, x_offset: f64, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
    let adjacency = Adjacency::new(edges);
    let ids = adjacency.reachable(&[root_id]);
    let mut shifted = nodes.to_vec();
    shift_in_place(&mut shifted, &ids, x_offset);
    shifted
}

/// Move every node whose id is in `ids` by `dx`
pub(crate) fn shift_in_place(nodes: &mut [Node], ids: &HashSet<&str>, dx: f64) {
    for node in nodes.iter_mut() {
        if ids.contains(node.id.as_str()) {
            node.position = node.position.shifted_x(dx);
        }
    }
}

/// Whether `to` is in the subtree of `from`
pub fn is_reachable(from: &str, to: &str, edges: &[Edge]) -> bool {
    Adjacency::new(edges).reachable(&[from]).contains(to)
}
