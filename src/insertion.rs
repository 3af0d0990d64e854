//! Node insertion and connection protocol.
//!
//! A palette click or a drag-drop becomes an [`InsertRequest`]: an optional
//! source node, an optional branch of that source and the plugin type to
//! create. [`insert_node`] validates the whole request before touching the
//! store, so a rejected request never leaves a node without its edge.

use crate::branches::{node_branches, placement_for, BranchShape};
use crate::config::LayoutConfig;
use crate::error::GraphError;
use crate::plugins::PluginCatalog;
use crate::store::GraphStore;
use crate::types::*;
use log::{debug, info};

/// A request to create a node, optionally attached below an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    /// Node the new node hangs off; `None` starts a new chain
    pub source: Option<NodeId>,
    /// Branch of a conditional source to attach to
    pub branch: Option<String>,
    /// Plugin type to instantiate
    pub type_ref: String,
    /// Canvas point the node was dropped on; only used without a source
    pub drop_position: Option<Position>,
}

impl InsertRequest {
    /// A new node that starts its own chain.
    pub fn root(type_ref: impl Into<String>) -> Self {
        Self {
            source: None,
            branch: None,
            type_ref: type_ref.into(),
            drop_position: None,
        }
    }

    /// A new node directly below `source`.
    pub fn below(source: impl Into<NodeId>, type_ref: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::root(type_ref)
        }
    }

    /// A new node on branch `branch` of the conditional `source`.
    pub fn on_branch(
        source: impl Into<NodeId>,
        branch: impl Into<String>,
        type_ref: impl Into<String>,
    ) -> Self {
        Self {
            branch: Some(branch.into()),
            ..Self::below(source, type_ref)
        }
    }

    /// Sets the drop point, builder style.
    pub fn at(mut self, position: Position) -> Self {
        self.drop_position = Some(position);
        self
    }
}

/// Result of a successful insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    /// Id of the created node
    pub node_id: NodeId,
    /// Edge connecting the source to the new node
    pub edge: Option<Edge>,
    /// Whether the node was attached to the `true`/`false` output of a binary
    /// decision, in which case sibling subtrees may need separating
    pub binary_branch: bool,
}

/// Creates a node from `request` and connects it to its source.
///
/// # Returns
///
/// `Ok(None)` when the request loses a user race: unknown plugin type, a
/// branch handle the source no longer has, or an output that is already
/// connected. Nothing is mutated in that case.
///
/// # Errors
///
/// [`GraphError::DanglingReference`] if the source node does not exist.
pub fn insert_node(
    store: &mut GraphStore,
    catalog: &dyn PluginCatalog,
    request: &InsertRequest,
    layout: &LayoutConfig,
) -> Result<Option<Insertion>, GraphError> {
    let Some(descriptor) = catalog.lookup_plugin(&request.type_ref) else {
        debug!("Ignoring insertion of unknown node type '{}'", request.type_ref);
        return Ok(None);
    };

    let source = match &request.source {
        Some(id) => Some(store.node(id).ok_or_else(|| GraphError::DanglingReference {
            node_id: id.clone(),
        })?),
        None => None,
    };

    // Only conditionals tag their outputs; everything else uses the default output.
    let handle = match (source, &request.branch) {
        (Some(src), Some(branch)) if src.kind.is_branching() => {
            if !node_branches(src).iter().any(|b| b.id == *branch) {
                debug!("Ignoring insertion on stale branch '{}' of {}", branch, src.id);
                return Ok(None);
            }
            Some(branch.clone())
        }
        _ => None,
    };

    if let Some(src) = source {
        if store.has_connection(&src.id, handle.as_deref()) {
            debug!(
                "Output {}:{} is already connected",
                src.id,
                handle.as_deref().unwrap_or("default")
            );
            return Ok(None);
        }
    }

    let position = match (source, handle.as_deref()) {
        (None, _) => request.drop_position.unwrap_or(layout.root_anchor),
        (Some(src), Some(branch)) => {
            match placement_for(src, branch, store.nodes(), store.edges(), layout) {
                Some(placement) => placement.slot_position(src, layout),
                None => below(src, layout),
            }
        }
        (Some(src), None) => below(src, layout),
    };

    let binary_branch = match (source, handle.as_deref()) {
        (Some(src), Some(TRUE_HANDLE | FALSE_HANDLE)) => src
            .config
            .conditional
            .as_ref()
            .map_or(true, |c| BranchShape::of(c) == BranchShape::Binary),
        _ => false,
    };

    let parent_loop_id = source.and_then(|src| {
        if src.kind.is_loop() {
            Some(src.id.clone())
        } else {
            src.config.parent_loop_id.clone()
        }
    });
    let source_id = source.map(|src| src.id.clone());

    let mut node = Node::new(NodeId::fresh(), descriptor.kind.into(), position)
        .with_label(descriptor.display_name.clone())
        .first(source_id.is_none());
    node.config.node_type_ref = descriptor.type_ref.clone();
    node.config.category = descriptor.category.clone();
    node.config.color = descriptor.color.clone();
    node.config.parent_loop_id = parent_loop_id;
    let node_id = node.id.clone();

    store.add_node(node)?;
    let edge = match &source_id {
        Some(src) => Some(store.connect(src, &node_id, handle.as_deref())?),
        None => None,
    };

    info!(
        "Inserted {} '{}' below {}",
        node_id,
        request.type_ref,
        source_id.as_ref().map_or("<canvas>", NodeId::as_str)
    );
    Ok(Some(Insertion {
        node_id,
        edge,
        binary_branch,
    }))
}

/// Slot directly below `source` in a straight vertical chain.
fn below(source: &Node, layout: &LayoutConfig) -> Position {
    Position::new(source.position.x, source.position.y + layout.vertical_offset)
}
