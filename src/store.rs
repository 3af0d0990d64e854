//! The graph document store.
//!
//! [`GraphStore`] owns the canonical node and edge collections. Every
//! effective mutation bumps [`GraphStore::revision`] exactly once, which is the
//! "document changed" signal the editor session observes for history and
//! autosave. Bulk operations (history restore, cascading delete) replace both
//! collections in one step so observers never see a half-applied state.

use crate::error::GraphError;
use crate::types::*;
use log::{debug, warn};
use std::collections::{HashMap, HashSet, VecDeque};

/// How [`GraphStore::delete_node`] treats the deleted node's descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove only the node and re-link its parent to its children
    Only,
    /// Remove the node and everything reachable from it
    Chain,
}

/// Summary of a deletion, used for logging and by callers that need to fix up selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionReport {
    /// Every node that was removed
    pub removed_nodes: Vec<NodeId>,
    /// Number of edges that were removed
    pub removed_edges: usize,
    /// Edges created to bridge the gap left by a delete-only
    pub relinked: Vec<Edge>,
    /// Node that became the first node of the chain, if any
    pub promoted: Option<NodeId>,
}

/// Repairs applied while loading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Nodes dropped because an earlier node had the same id
    pub duplicate_nodes: usize,
    /// Edges dropped because an endpoint was missing
    pub dangling_edges: usize,
    /// Edges dropped because an earlier edge had the same id
    pub duplicate_edges: usize,
}

impl LoadReport {
    /// Returns true if the document was loaded without repairs.
    pub fn is_clean(&self) -> bool {
        self.duplicate_nodes == 0 && self.dangling_edges == 0 && self.duplicate_edges == 0
    }
}

/// Owner of the canonical workflow document.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    revision: u64,
}

impl GraphStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given document after validating it.
    pub fn from_document(document: Document) -> (Self, LoadReport) {
        let mut store = Self::new();
        let report = store.load(document);
        (store, report)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Monotonic counter bumped once per effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    /// Returns true if a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Edges that end at `id`.
    pub fn incoming<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == *id)
    }

    /// Edges that start at `id`, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == *id)
    }

    /// Nodes flagged as the first node of their chain.
    pub fn first_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_first_node())
    }

    /// Returns the edge leaving `source` through `handle`, if one exists.
    pub fn connection(&self, source: &NodeId, handle: Option<&str>) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source == *source && e.source_handle.as_deref() == handle)
    }

    /// Returns true if the output `(source, handle)` is already used.
    pub fn has_connection(&self, source: &NodeId, handle: Option<&str>) -> bool {
        self.connection(source, handle).is_some()
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> Document {
        Document {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Inserts a node.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateId`] if a node with the same id is already present.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateId { node_id: node.id });
        }
        debug!("Adding node {} ({:?})", node.id, node.kind);
        self.nodes.push(node);
        self.bump();
        Ok(())
    }

    /// Removes a node and every edge touching it. Descendants are left in place.
    ///
    /// # Returns
    ///
    /// The removed node, or `None` if no node had this id.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == *id)?;
        let node = self.nodes.remove(index);
        self.edges.retain(|e| !e.touches(id));
        self.bump();
        Some(node)
    }

    /// Connects `source` to `target` through `source_handle`.
    ///
    /// If the output `(source, source_handle)` is already used, nothing changes
    /// and the existing edge is returned; callers probe this case on purpose.
    ///
    /// # Errors
    ///
    /// [`GraphError::DanglingReference`] if either endpoint does not exist.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        source_handle: Option<&str>,
    ) -> Result<Edge, GraphError> {
        for endpoint in [source, target] {
            if !self.contains(endpoint) {
                return Err(GraphError::DanglingReference {
                    node_id: endpoint.clone(),
                });
            }
        }
        if let Some(existing) = self.connection(source, source_handle) {
            debug!(
                "Output {}:{} already connected to {}",
                source,
                source_handle.unwrap_or("default"),
                existing.target
            );
            return Ok(existing.clone());
        }

        let edge = Edge::new(
            source.clone(),
            target.clone(),
            source_handle.map(str::to_string),
        );
        self.edges.push(edge.clone());
        self.bump();
        Ok(edge)
    }

    /// Removes a single edge by id.
    pub fn disconnect(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == edge_id)?;
        let edge = self.edges.remove(index);
        self.bump();
        Some(edge)
    }

    /// Shallow-merges `patch` into the node's configuration.
    ///
    /// # Returns
    ///
    /// `true` if the node exists and something changed.
    pub fn update_node(&mut self, id: &NodeId, patch: ConfigPatch) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == *id) else {
            return false;
        };
        let changed = node.config.apply(patch);
        if changed {
            self.bump();
        }
        changed
    }

    /// Moves a single node.
    pub fn set_position(&mut self, id: &NodeId, position: Position) -> bool {
        self.apply_positions(&[(id.clone(), position)])
    }

    /// Writes several positions at once.
    ///
    /// The revision is bumped once, and only if at least one coordinate changes.
    pub fn apply_positions(&mut self, changes: &[(NodeId, Position)]) -> bool {
        let mut changed = false;
        for (id, position) in changes {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.id == *id) {
                if node.position != *position {
                    node.position = *position;
                    changed = true;
                }
            }
        }
        if changed {
            self.bump();
        }
        changed
    }

    /// Replaces every node wholesale.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.bump();
    }

    /// Replaces every edge wholesale.
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
        self.bump();
    }

    /// Replaces both collections as one mutation.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes;
        self.edges = edges;
        self.bump();
    }

    /// Replaces the document with `document` after repairing it.
    ///
    /// Drops nodes whose id repeats an earlier node, edges with a missing
    /// endpoint, and edges whose id repeats an earlier edge. Each repair is
    /// counted in the returned [`LoadReport`]. Nothing else is checked: two
    /// edges leaving the same output under different ids are kept, as a
    /// delete-only relink can legitimately produce them.
    pub fn load(&mut self, document: Document) -> LoadReport {
        let mut report = LoadReport::default();

        let mut seen_nodes = HashSet::new();
        let mut nodes = Vec::with_capacity(document.nodes.len());
        for node in document.nodes {
            if seen_nodes.insert(node.id.clone()) {
                nodes.push(node);
            } else {
                report.duplicate_nodes += 1;
            }
        }

        let mut seen_edges = HashSet::new();
        let mut edges = Vec::with_capacity(document.edges.len());
        for edge in document.edges {
            if !seen_nodes.contains(&edge.source) || !seen_nodes.contains(&edge.target) {
                report.dangling_edges += 1;
            } else if !seen_edges.insert(edge.id.clone()) {
                report.duplicate_edges += 1;
            } else {
                edges.push(edge);
            }
        }

        if !report.is_clean() {
            warn!("Repaired loaded document: {:?}", report);
        }
        self.replace(nodes, edges);
        report
    }

    /// Deletes a node according to `mode`.
    ///
    /// Both modes promote the first outgoing target to first node when the
    /// deleted node was the first node. The resulting nodes and edges are
    /// written back in a single [`GraphStore::replace`].
    ///
    /// # Returns
    ///
    /// A report of what changed, or `None` if no node had this id.
    pub fn delete_node(&mut self, id: &NodeId, mode: DeleteMode) -> Option<DeletionReport> {
        let node = self.node(id)?;
        let promoted = if node.is_first_node() {
            self.outgoing(id).next().map(|e| e.target.clone())
        } else {
            None
        };

        let report = match mode {
            DeleteMode::Only => self.delete_only(id, promoted),
            DeleteMode::Chain => self.delete_chain(id, promoted),
        };
        debug!(
            "Deleted {} node(s) and {} edge(s) starting at {} ({:?})",
            report.removed_nodes.len(),
            report.removed_edges,
            id,
            mode
        );
        Some(report)
    }

    fn delete_only(&mut self, id: &NodeId, promoted: Option<NodeId>) -> DeletionReport {
        // A self-loop is not a parent and has nothing to relink to.
        let incoming: Vec<&Edge> = self.incoming(id).filter(|e| e.source != *id).collect();
        let parent = match incoming.as_slice() {
            [single] => Some((*single).clone()),
            _ => None,
        };

        let mut edges: Vec<Edge> = self.edges.iter().filter(|e| !e.touches(id)).cloned().collect();
        let removed_edges = self.edges.len() - edges.len();

        let mut relinked = Vec::new();
        if let Some(parent) = parent {
            for out in self.outgoing(id).filter(|e| e.target != *id) {
                let mut edge = Edge::new(
                    parent.source.clone(),
                    out.target.clone(),
                    parent.source_handle.clone(),
                );
                edge.kind = parent.kind;
                if edges.iter().any(|e| e.id == edge.id) {
                    continue;
                }
                edges.push(edge.clone());
                relinked.push(edge);
            }
        }

        let nodes = self.retain_nodes(&HashSet::from([id.clone()]), promoted.as_ref());
        self.replace(nodes, edges);

        DeletionReport {
            removed_nodes: vec![id.clone()],
            removed_edges,
            relinked,
            promoted,
        }
    }

    fn delete_chain(&mut self, id: &NodeId, promoted: Option<NodeId>) -> DeletionReport {
        let doomed: Vec<NodeId> = reachable_from(&self.edges, id, promoted.as_ref());
        let doomed_set: HashSet<NodeId> = doomed.iter().cloned().collect();

        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| !doomed_set.contains(&e.source) && !doomed_set.contains(&e.target))
            .cloned()
            .collect();
        let removed_edges = self.edges.len() - edges.len();

        let nodes = self.retain_nodes(&doomed_set, promoted.as_ref());
        self.replace(nodes, edges);

        DeletionReport {
            removed_nodes: doomed,
            removed_edges,
            relinked: Vec::new(),
            promoted,
        }
    }

    /// Nodes surviving a deletion, with the promoted node flagged as first.
    fn retain_nodes(&self, removed: &HashSet<NodeId>, promoted: Option<&NodeId>) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|n| !removed.contains(&n.id))
            .cloned()
            .map(|mut n| {
                if promoted == Some(&n.id) {
                    n.config.is_first_node = true;
                }
                n
            })
            .collect()
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

/// Adjacency view of `edges` keyed by source, preserving edge order.
pub(crate) fn adjacency(edges: &[Edge]) -> HashMap<&NodeId, Vec<&NodeId>> {
    let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in edges {
        adjacency.entry(&edge.source).or_default().push(&edge.target);
    }
    adjacency
}

/// Breadth-first walk over outgoing edges starting at (and including) `start`.
///
/// `boundary`, if given, is neither returned nor traversed. Cycles are
/// tolerated through the visited set.
pub(crate) fn reachable_from(edges: &[Edge], start: &NodeId, boundary: Option<&NodeId>) -> Vec<NodeId> {
    let adjacency = adjacency(edges);
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(current) = queue.pop_front() {
        order.push(current.clone());
        for next in adjacency.get(current).into_iter().flatten() {
            if Some(*next) == boundary {
                continue;
            }
            if visited.insert(*next) {
                queue.push_back(*next);
            }
        }
    }
    order
}
