//! Core data types for the workflow editor.
//!
//! This module defines the persisted document model: nodes, edges, their
//! configuration payloads and the [`Document`] that wraps them for saving,
//! loading and snapshotting.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Branch handle of a binary conditional's positive output.
pub const TRUE_HANDLE: &str = "true";
/// Branch handle of a binary conditional's negative output.
pub const FALSE_HANDLE: &str = "false";
/// Branch handle of the trailing fallback output of a multi-condition node.
pub const ELSE_HANDLE: &str = "else";

/// Unique, opaque identifier for workflow nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates an id from an existing string (e.g. one read from a saved document).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id that will not collide with any other generated id.
    pub fn fresh() -> Self {
        Self(format!("node-{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Position of a node's top-left corner in canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Determines which layout and connection rules apply to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// A plain step with a single output
    Action,
    /// A decision node whose outputs are derived from its configuration
    Conditional,
    /// A loop over a condition
    Loop,
    /// A loop over each item of a collection
    ForEachLoop,
}

impl NodeKind {
    /// Returns true if edges leaving this node are tagged with a branch handle.
    pub fn is_branching(self) -> bool {
        matches!(self, NodeKind::Conditional)
    }

    /// Returns true for both loop flavours.
    pub fn is_loop(self) -> bool {
        matches!(self, NodeKind::Loop | NodeKind::ForEachLoop)
    }
}

/// Value type produced by a conditional node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// Two outputs, `true` and `false`
    #[default]
    Boolean,
    /// One output per distinct string return value, plus `else`
    String,
    /// One output per distinct integer return value, plus `else`
    Integer,
}

/// One case of a multi-condition decision node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Expression or literal the case matches against
    #[serde(default)]
    pub match_value: String,
    /// Output produced when the case matches; names the branch
    #[serde(default)]
    pub return_value: String,
}

impl Case {
    /// Creates a new case.
    pub fn new(match_value: impl Into<String>, return_value: impl Into<String>) -> Self {
        Self {
            match_value: match_value.into(),
            return_value: return_value.into(),
        }
    }
}

/// Decision-node specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionalConfig {
    /// Whether the node evaluates several cases instead of one boolean condition
    pub multiple_conditions: bool,
    /// Type of the values the cases return
    pub return_type: ReturnType,
    /// Ordered list of cases
    pub cases: Vec<Case>,
}

/// Semantic payload of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// User-visible label
    pub label: String,
    /// Plugin type key this node was created from
    pub node_type_ref: String,
    /// Plugin category
    pub category: String,
    /// Display color
    pub color: String,
    /// Whether the step is disabled
    pub disabled: bool,
    /// Marks the node that starts its chain; it has no incoming edge
    pub is_first_node: bool,
    /// Enclosing loop node, if any. Non-owning back-reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_loop_id: Option<NodeId>,
    /// Decision configuration; only present on conditional nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalConfig>,
}

/// Shallow, field-wise update of a [`NodeConfig`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    /// New label
    pub label: Option<String>,
    /// New plugin type key
    pub node_type_ref: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New color
    pub color: Option<String>,
    /// New disabled flag
    pub disabled: Option<bool>,
    /// New first-node flag
    pub is_first_node: Option<bool>,
    /// New loop membership; `Some(None)` clears it
    pub parent_loop_id: Option<Option<NodeId>>,
    /// Replacement decision configuration
    pub conditional: Option<ConditionalConfig>,
}

impl ConfigPatch {
    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}

impl NodeConfig {
    /// Merges `patch` into this configuration.
    ///
    /// # Returns
    ///
    /// `true` if any field actually changed.
    pub fn apply(&mut self, patch: ConfigPatch) -> bool {
        let before = self.clone();
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(node_type_ref) = patch.node_type_ref {
            self.node_type_ref = node_type_ref;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(disabled) = patch.disabled {
            self.disabled = disabled;
        }
        if let Some(is_first_node) = patch.is_first_node {
            self.is_first_node = is_first_node;
        }
        if let Some(parent_loop_id) = patch.parent_loop_id {
            self.parent_loop_id = parent_loop_id;
        }
        if let Some(conditional) = patch.conditional {
            self.conditional = Some(conditional);
        }
        *self != before
    }
}

/// A single step in the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Layout/connection rules that apply
    pub kind: NodeKind,
    /// Top-left corner on the canvas
    pub position: Position,
    /// Semantic payload
    #[serde(default)]
    pub config: NodeConfig,
}

impl Node {
    /// Creates a new node with an empty configuration.
    ///
    /// # Arguments
    ///
    /// * `id` - The node's identifier
    /// * `kind` - The node kind
    /// * `position` - Top-left corner on the canvas
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        let config = NodeConfig {
            conditional: (kind == NodeKind::Conditional).then(ConditionalConfig::default),
            ..NodeConfig::default()
        };
        Self {
            id: id.into(),
            kind,
            position,
            config,
        }
    }

    /// Sets the label, builder style.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Marks or unmarks the node as the first node of its chain, builder style.
    pub fn first(mut self, is_first_node: bool) -> Self {
        self.config.is_first_node = is_first_node;
        self
    }

    /// Replaces the decision configuration, builder style.
    pub fn with_conditional(mut self, conditional: ConditionalConfig) -> Self {
        self.config.conditional = Some(conditional);
        self
    }

    /// Returns true if this node starts its chain.
    pub fn is_first_node(&self) -> bool {
        self.config.is_first_node
    }

    /// Horizontal center of the node for the given node width.
    pub fn center_x(&self, node_width: f32) -> f32 {
        self.position.x + node_width / 2.0
    }
}

/// Rendering hint for an edge. Not semantically load-bearing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Straight line, used for vertical chains
    #[default]
    Straight,
    /// Orthogonal stepped path, used for branch outputs
    Step,
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Identifier derived from the endpoints and handle
    pub id: String,
    /// Source node id
    pub source: NodeId,
    /// Target node id
    pub target: NodeId,
    /// Output of the source this edge leaves from; absent for single-output nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Rendering hint
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Edge {
    /// Creates a new edge with a deterministic id.
    ///
    /// # Arguments
    ///
    /// * `source` - The source node id
    /// * `target` - The target node id
    /// * `source_handle` - The branch the edge leaves from, if any
    pub fn new(source: NodeId, target: NodeId, source_handle: Option<String>) -> Self {
        let kind = if source_handle.is_some() {
            EdgeKind::Step
        } else {
            EdgeKind::Straight
        };
        Self {
            id: Self::derive_id(&source, &target, source_handle.as_deref()),
            source,
            target,
            source_handle,
            kind,
        }
    }

    /// Derives the id an edge between the given endpoints receives.
    pub fn derive_id(source: &NodeId, target: &NodeId, source_handle: Option<&str>) -> String {
        match source_handle {
            Some(handle) => format!("e-{source}-{handle}-{target}"),
            None => format!("e-{source}-{target}"),
        }
    }

    /// Returns true if the edge touches the given node at either end.
    pub fn touches(&self, node_id: &NodeId) -> bool {
        self.source == *node_id || self.target == *node_id
    }
}

/// The unit that is persisted and snapshotted: all nodes and all edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// All nodes, in insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// All edges, in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the document to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_creation() {
        let node = Node::new("a", NodeKind::Action, Position::new(100.0, 200.0)).with_label("Fetch");

        assert_eq!(node.id.as_str(), "a");
        assert_eq!(node.position, Position::new(100.0, 200.0));
        assert_eq!(node.config.label, "Fetch");
        assert!(node.config.conditional.is_none());
        assert!(!node.is_first_node());
    }

    #[test]
    fn test_conditional_node_gets_default_decision_config() {
        let node = Node::new("c", NodeKind::Conditional, Position::default());
        let conditional = node.config.conditional.expect("conditional config");
        assert!(!conditional.multiple_conditions);
        assert_eq!(conditional.return_type, ReturnType::Boolean);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node-"));
    }

    #[test]
    fn test_edge_id_is_deterministic() {
        let edge = Edge::new("a".into(), "b".into(), Some(TRUE_HANDLE.to_string()));
        assert_eq!(edge.id, "e-a-true-b");
        assert_eq!(edge.kind, EdgeKind::Step);

        let plain = Edge::new("a".into(), "b".into(), None);
        assert_eq!(plain.id, "e-a-b");
        assert_eq!(plain.kind, EdgeKind::Straight);
    }

    #[test]
    fn test_config_patch_is_shallow_merge() {
        let mut config = NodeConfig {
            label: "Old".into(),
            color: "#fff".into(),
            ..NodeConfig::default()
        };
        let changed = config.apply(ConfigPatch {
            label: Some("New".into()),
            disabled: Some(true),
            ..ConfigPatch::default()
        });

        assert!(changed);
        assert_eq!(config.label, "New");
        assert_eq!(config.color, "#fff");
        assert!(config.disabled);
    }

    #[test]
    fn test_config_patch_without_changes_reports_false() {
        let mut config = NodeConfig {
            label: "Same".into(),
            ..NodeConfig::default()
        };
        assert!(!config.apply(ConfigPatch {
            label: Some("Same".into()),
            ..ConfigPatch::default()
        }));
        assert!(ConfigPatch::default().is_empty());
    }

    #[test]
    fn test_document_uses_camel_case_fields() {
        let mut doc = Document::new();
        doc.nodes.push(
            Node::new("c", NodeKind::Conditional, Position::new(1.0, 2.0)).first(true),
        );
        doc.nodes.push(Node::new("l", NodeKind::ForEachLoop, Position::new(1.0, 2.0)));
        doc.edges
            .push(Edge::new("c".into(), "l".into(), Some(FALSE_HANDLE.into())));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["nodes"][0]["config"]["isFirstNode"], json!(true));
        assert_eq!(
            value["nodes"][0]["config"]["conditional"]["returnType"],
            json!("boolean")
        );
        assert_eq!(value["nodes"][1]["kind"], json!("forEachLoop"));
        assert_eq!(value["edges"][0]["sourceHandle"], json!("false"));
    }

    #[test]
    fn test_document_deserialization_fills_defaults() {
        let doc = Document::from_json(
            r#"{
                "nodes": [
                    { "id": "a", "kind": "action", "position": { "x": 5.0, "y": 6.0 } },
                    { "id": "b", "kind": "conditional", "position": { "x": 0.0, "y": 0.0 },
                      "config": { "label": "Route", "conditional": {
                          "multipleConditions": true, "returnType": "string",
                          "cases": [ { "matchValue": "a == 1", "returnValue": "one" } ] } } }
                ],
                "edges": [ { "id": "e-a-b", "source": "a", "target": "b" } ]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].config, NodeConfig::default());
        let conditional = doc.nodes[1].config.conditional.as_ref().unwrap();
        assert_eq!(conditional.return_type, ReturnType::String);
        assert_eq!(conditional.cases[0].return_value, "one");
        assert_eq!(doc.edges[0].source_handle, None);
        assert_eq!(doc.edges[0].kind, EdgeKind::Straight);
    }

    #[test]
    fn test_document_roundtrip_serialization() {
        let mut original = Document::new();
        original
            .nodes
            .push(Node::new("a", NodeKind::Loop, Position::new(10.0, 20.0)).with_label("Repeat"));
        original
            .nodes
            .push(Node::new("b", NodeKind::Action, Position::new(10.0, 170.0)));
        original.edges.push(Edge::new("a".into(), "b".into(), None));

        let json = original.to_json().unwrap();
        let restored = Document::from_json(&json).unwrap();

        assert_eq!(restored, original);
        assert_eq!(restored.node(&"a".into()).unwrap().config.label, "Repeat");
    }
}
