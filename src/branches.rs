//! Branch derivation and layout for decision nodes.
//!
//! Branches are never stored: they are derived from a conditional node's
//! configuration on every read, so an edge's `sourceHandle` keeps resolving to
//! the same branch for as long as the cases that produced it are unchanged.
//!
//! Everything in this module is pure. It informs rendering (guide lines and
//! labels) and the insertion protocol, and never mutates the document.

use crate::config::LayoutConfig;
use crate::constants::{CASE_BRANCH_COLORS, ELSE_BRANCH_COLOR, FALSE_BRANCH_COLOR, TRUE_BRANCH_COLOR};
use crate::types::*;
use std::collections::HashSet;

/// The two output shapes a decision node can have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchShape {
    /// `true` and `false`
    Binary,
    /// One output per distinct return value, in first-seen order, followed by `else`.
    /// Values are kept verbatim, since they are written to edge handles.
    Cases(Vec<String>),
}

impl BranchShape {
    /// Derives the shape from a decision configuration.
    ///
    /// Boolean return types are always binary, even with several conditions.
    pub fn of(config: &ConditionalConfig) -> Self {
        if !config.multiple_conditions || config.return_type == ReturnType::Boolean {
            return BranchShape::Binary;
        }

        let mut seen = HashSet::new();
        let values = config
            .cases
            .iter()
            .map(|case| case.return_value.as_str())
            .filter(|value| !value.trim().is_empty() && value.trim() != ELSE_HANDLE)
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect();
        BranchShape::Cases(values)
    }

    /// Expands the shape into its ordered branch list.
    pub fn branches(&self) -> Vec<Branch> {
        match self {
            BranchShape::Binary => vec![
                Branch::new(TRUE_HANDLE, "True", TRUE_BRANCH_COLOR),
                Branch::new(FALSE_HANDLE, "False", FALSE_BRANCH_COLOR),
            ],
            BranchShape::Cases(values) => values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    Branch::new(value, value.trim(), CASE_BRANCH_COLORS[i % CASE_BRANCH_COLORS.len()])
                })
                .chain(std::iter::once(Branch::new(ELSE_HANDLE, "Else", ELSE_BRANCH_COLOR)))
                .collect(),
        }
    }
}

/// One logical output of a decision node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Handle written to `Edge::source_handle`
    pub id: String,
    /// Text shown next to the guide line
    pub label: String,
    /// Guide line color
    pub color: String,
}

impl Branch {
    fn new(id: &str, label: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Ordered branches of a decision configuration.
pub fn branches_of(config: &ConditionalConfig) -> Vec<Branch> {
    BranchShape::of(config).branches()
}

/// Ordered branches of a node; empty for anything that is not a conditional.
pub fn node_branches(node: &Node) -> Vec<Branch> {
    if node.kind != NodeKind::Conditional {
        return Vec::new();
    }
    match &node.config.conditional {
        Some(config) => branches_of(config),
        None => BranchShape::Binary.branches(),
    }
}

/// Evenly spread offset of branch `index` out of `count`, centered on the parent.
pub fn default_offset(index: usize, count: usize, spacing: f32) -> f32 {
    let total_width = count.saturating_sub(1) as f32 * spacing;
    -total_width / 2.0 + index as f32 * spacing
}

/// Where one branch of a decision node sits relative to the node.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPlacement {
    /// The branch being placed
    pub branch: Branch,
    /// Horizontal offset of the branch's center from the parent's center
    pub offset_x: f32,
    /// Gap between the parent's bottom edge and the branch's child
    pub drop_y: f32,
    /// Node currently attached to this branch
    pub child: Option<NodeId>,
}

impl BranchPlacement {
    /// Top-left position a node attached to this branch should take.
    pub fn slot_position(&self, parent: &Node, layout: &LayoutConfig) -> Position {
        Position::new(
            parent.position.x + self.offset_x,
            parent.position.y + layout.node_height + self.drop_y,
        )
    }
}

/// Computes the placement of every branch of `parent`.
///
/// Connected branches report the offset and gap of their actual child, so
/// manual drags are respected; disconnected branches use the default spread.
pub fn layout_branches(
    parent: &Node,
    nodes: &[Node],
    edges: &[Edge],
    layout: &LayoutConfig,
) -> Vec<BranchPlacement> {
    let branches = node_branches(parent);
    let count = branches.len();

    branches
        .into_iter()
        .enumerate()
        .map(|(index, branch)| {
            let child = edges
                .iter()
                .find(|e| e.source == parent.id && e.source_handle.as_deref() == Some(branch.id.as_str()))
                .and_then(|e| nodes.iter().find(|n| n.id == e.target));

            let (offset_x, drop_y) = match child {
                Some(child) => (
                    child.center_x(layout.node_width) - parent.center_x(layout.node_width),
                    (child.position.y - parent.position.y - layout.node_height)
                        .max(layout.min_vertical_gap),
                ),
                None => (
                    default_offset(index, count, layout.min_branch_spacing),
                    layout.default_branch_drop,
                ),
            };

            BranchPlacement {
                branch,
                offset_x,
                drop_y,
                child: child.map(|c| c.id.clone()),
            }
        })
        .collect()
}

/// Placement of a single branch, or `None` if `handle` is not a current branch of `parent`.
pub fn placement_for(
    parent: &Node,
    handle: &str,
    nodes: &[Node],
    edges: &[Edge],
    layout: &LayoutConfig,
) -> Option<BranchPlacement> {
    layout_branches(parent, nodes, edges, layout)
        .into_iter()
        .find(|p| p.branch.id == handle)
}

/// Edges leaving `node` whose handle no longer names one of its branches.
///
/// An edge without a handle is the plain output a decision gets when a node is
/// inserted below it without choosing a branch, and is never stale.
pub fn stale_branch_edges<'a>(node: &Node, edges: &'a [Edge]) -> Vec<&'a Edge> {
    if node.kind != NodeKind::Conditional {
        return Vec::new();
    }
    let current: HashSet<String> = node_branches(node).into_iter().map(|b| b.id).collect();
    edges
        .iter()
        .filter(|e| e.source == node.id)
        .filter(|e| {
            e.source_handle
                .as_ref()
                .is_some_and(|handle| !current.contains(handle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases(return_type: ReturnType, values: &[&str]) -> ConditionalConfig {
        ConditionalConfig {
            multiple_conditions: true,
            return_type,
            cases: values.iter().map(|v| Case::new(format!("x == {v}"), *v)).collect(),
        }
    }

    fn ids(branches: &[Branch]) -> Vec<&str> {
        branches.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_simple_mode_is_binary() {
        let config = ConditionalConfig::default();
        assert_eq!(ids(&branches_of(&config)), vec!["true", "false"]);
    }

    #[test]
    fn test_boolean_return_type_stays_binary_with_multiple_conditions() {
        let config = cases(ReturnType::Boolean, &["a", "b"]);
        assert_eq!(BranchShape::of(&config), BranchShape::Binary);
    }

    #[test]
    fn test_duplicate_case_values_collapse_and_else_is_last() {
        let config = cases(ReturnType::String, &["x", "y", "x"]);
        assert_eq!(ids(&branches_of(&config)), vec!["x", "y", "else"]);
    }

    #[test]
    fn test_blank_and_else_case_values_are_skipped() {
        let config = cases(ReturnType::Integer, &["1", " ", "else", " else ", "2", "1"]);
        assert_eq!(ids(&branches_of(&config)), vec!["1", "2", "else"]);
    }

    #[test]
    fn test_case_values_are_branch_ids_verbatim() {
        let config = cases(ReturnType::String, &[" x "]);
        let branches = branches_of(&config);

        assert_eq!(ids(&branches), vec![" x ", "else"]);
        assert_eq!(branches[0].label, "x");

        let parent = Node::new("c", NodeKind::Conditional, Position::default()).with_conditional(config);
        let edges = vec![Edge::new("c".into(), "t".into(), Some(" x ".into()))];
        assert!(stale_branch_edges(&parent, &edges).is_empty());
    }

    #[test]
    fn test_multi_condition_without_cases_has_only_else() {
        let config = cases(ReturnType::String, &[]);
        assert_eq!(ids(&branches_of(&config)), vec!["else"]);
    }

    #[test]
    fn test_branch_ids_are_stable() {
        let config = cases(ReturnType::String, &["a", "b"]);
        assert_eq!(branches_of(&config), branches_of(&config.clone()));
    }

    #[test]
    fn test_non_conditional_has_no_branches() {
        let node = Node::new("a", NodeKind::Action, Position::default());
        assert!(node_branches(&node).is_empty());
    }

    #[test]
    fn test_default_offsets_are_centered() {
        assert_eq!(default_offset(0, 2, 220.0), -110.0);
        assert_eq!(default_offset(1, 2, 220.0), 110.0);
        assert_eq!(default_offset(0, 3, 220.0), -220.0);
        assert_eq!(default_offset(1, 3, 220.0), 0.0);
        assert_eq!(default_offset(0, 1, 220.0), 0.0);
    }

    #[test]
    fn test_unconnected_branches_use_defaults() {
        let layout = LayoutConfig::default();
        let parent = Node::new("c", NodeKind::Conditional, Position::new(100.0, 100.0));

        let placements = layout_branches(&parent, &[parent.clone()], &[], &layout);

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].offset_x, -110.0);
        assert_eq!(placements[1].offset_x, 110.0);
        assert_eq!(placements[0].drop_y, layout.default_branch_drop);
        assert!(placements.iter().all(|p| p.child.is_none()));

        let slot = placements[0].slot_position(&parent, &layout);
        assert_eq!(slot, Position::new(-10.0, 100.0 + layout.node_height + layout.default_branch_drop));
    }

    #[test]
    fn test_connected_branch_tracks_actual_child() {
        let layout = LayoutConfig::default();
        let parent = Node::new("c", NodeKind::Conditional, Position::new(0.0, 0.0));
        let child = Node::new("t", NodeKind::Action, Position::new(-300.0, 400.0));
        let nodes = vec![parent.clone(), child];
        let edges = vec![Edge::new("c".into(), "t".into(), Some(TRUE_HANDLE.into()))];

        let placements = layout_branches(&parent, &nodes, &edges, &layout);

        assert_eq!(placements[0].child, Some(NodeId::new("t")));
        assert_eq!(placements[0].offset_x, -300.0);
        assert_eq!(placements[0].drop_y, 400.0 - layout.node_height);
        assert_eq!(placements[1].offset_x, 110.0);
    }

    #[test]
    fn test_connected_branch_gap_is_clamped() {
        let layout = LayoutConfig::default();
        let parent = Node::new("c", NodeKind::Conditional, Position::new(0.0, 200.0));
        let child = Node::new("f", NodeKind::Action, Position::new(50.0, 0.0));
        let nodes = vec![parent.clone(), child];
        let edges = vec![Edge::new("c".into(), "f".into(), Some(FALSE_HANDLE.into()))];

        let placement = placement_for(&parent, FALSE_HANDLE, &nodes, &edges, &layout).unwrap();

        assert_eq!(placement.drop_y, layout.min_vertical_gap);
        assert!(placement_for(&parent, "missing", &nodes, &edges, &layout).is_none());
    }

    #[test]
    fn test_stale_branch_edges() {
        let parent = Node::new("c", NodeKind::Conditional, Position::default())
            .with_conditional(cases(ReturnType::String, &["a"]));
        let edges = vec![
            Edge::new("c".into(), "x".into(), Some("a".into())),
            Edge::new("c".into(), "y".into(), Some("b".into())),
            Edge::new("c".into(), "z".into(), Some(ELSE_HANDLE.into())),
            Edge::new("c".into(), "below".into(), None),
        ];

        let stale = stale_branch_edges(&parent, &edges);

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].target, NodeId::new("y"));
    }
}
