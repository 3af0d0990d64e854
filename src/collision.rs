//! Overlap resolution between the `true` and `false` subtrees of binary decisions.
//!
//! Symmetric branch offsets stop being enough once one side of a decision
//! grows wide. The resolver measures the horizontal footprint of both subtrees
//! and, when they intersect, pushes the narrower one outward as a whole, so
//! relative offsets inside each subtree are preserved. A layout that is
//! already separated is left untouched.

use crate::branches::BranchShape;
use crate::config::LayoutConfig;
use crate::store::reachable_from;
use crate::types::*;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

/// A node that must move, with its new position.
pub type PositionChange = (NodeId, Position);

/// Horizontal span occupied by a set of nodes, including their width.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Footprint {
    min_x: f32,
    max_x: f32,
}

impl Footprint {
    fn measure(members: &[NodeId], positions: &HashMap<NodeId, Position>, width: f32) -> Option<Self> {
        members
            .iter()
            .filter_map(|id| positions.get(id))
            .fold(None, |acc: Option<Footprint>, pos| {
                let (min_x, max_x) = (pos.x, pos.x + width);
                Some(match acc {
                    Some(fp) => Footprint {
                        min_x: fp.min_x.min(min_x),
                        max_x: fp.max_x.max(max_x),
                    },
                    None => Footprint { min_x, max_x },
                })
            })
    }

    fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    fn center(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }
}

/// Separates the two subtrees of a single binary decision node.
///
/// # Returns
///
/// The position changes needed, empty if the subtrees do not overlap.
pub fn resolve_branch_overlap(
    decision: &NodeId,
    nodes: &[Node],
    edges: &[Edge],
    layout: &LayoutConfig,
) -> Vec<PositionChange> {
    let mut positions = positions_of(nodes);
    separate(decision, edges, &mut positions, layout);
    changes(nodes, &positions)
}

/// Separates the subtrees of every binary decision node, deepest first.
///
/// Inner decisions are resolved before the decisions that contain them, so
/// the outer pass measures footprints that already include the inner growth.
pub fn resolve_all(nodes: &[Node], edges: &[Edge], layout: &LayoutConfig) -> Vec<PositionChange> {
    let mut positions = positions_of(nodes);
    let depths = depths(nodes, edges);

    let mut decisions: Vec<&Node> = nodes.iter().filter(|n| is_binary_decision(n)).collect();
    decisions.sort_by_key(|n| std::cmp::Reverse(depths.get(&n.id).copied().unwrap_or(0)));

    for decision in decisions {
        separate(&decision.id, edges, &mut positions, layout);
    }
    changes(nodes, &positions)
}

fn is_binary_decision(node: &Node) -> bool {
    node.kind == NodeKind::Conditional
        && node
            .config
            .conditional
            .as_ref()
            .map_or(true, |c| BranchShape::of(c) == BranchShape::Binary)
}

fn positions_of(nodes: &[Node]) -> HashMap<NodeId, Position> {
    nodes.iter().map(|n| (n.id.clone(), n.position)).collect()
}

fn changes(nodes: &[Node], positions: &HashMap<NodeId, Position>) -> Vec<PositionChange> {
    nodes
        .iter()
        .filter_map(|n| {
            let moved = positions.get(&n.id)?;
            (*moved != n.position).then(|| (n.id.clone(), *moved))
        })
        .collect()
}

/// Distance of every node from the nearest node without incoming edges.
fn depths(nodes: &[Node], edges: &[Edge]) -> HashMap<NodeId, usize> {
    let targets: HashSet<&NodeId> = edges.iter().map(|e| &e.target).collect();
    let mut depths: HashMap<NodeId, usize> = HashMap::new();
    let mut queue: VecDeque<(&NodeId, usize)> = nodes
        .iter()
        .filter(|n| !targets.contains(&n.id))
        .map(|n| (&n.id, 0))
        .collect();

    while let Some((id, depth)) = queue.pop_front() {
        if depths.contains_key(id) {
            continue;
        }
        depths.insert(id.clone(), depth);
        for edge in edges.iter().filter(|e| e.source == *id) {
            if !depths.contains_key(&edge.target) {
                queue.push_back((&edge.target, depth + 1));
            }
        }
    }
    depths
}

/// Nodes that belong to the branch starting at `child`.
///
/// A node belongs to the branch only if every one of its parents does, so a
/// node where this branch rejoins another one is left out. Moving a branch
/// therefore always carries any decision inside it together with both of that
/// decision's sides, and never stretches a node some other branch also feeds.
fn owned_side(edges: &[Edge], decision: &NodeId, child: &NodeId) -> Vec<NodeId> {
    let candidates = reachable_from(edges, child, Some(decision));
    let mut members: HashSet<&NodeId> = HashSet::from([child]);
    let mut side = vec![child.clone()];

    loop {
        let before = side.len();
        for id in &candidates {
            if members.contains(id) {
                continue;
            }
            let owned = edges
                .iter()
                .filter(|e| e.target == *id && e.source != *id)
                .all(|e| members.contains(&e.source));
            if owned {
                members.insert(id);
                side.push(id.clone());
            }
        }
        if side.len() == before {
            return side;
        }
    }
}

/// Moves one side of `decision` if its subtrees overlap. Returns true if anything moved.
fn separate(
    decision: &NodeId,
    edges: &[Edge],
    positions: &mut HashMap<NodeId, Position>,
    layout: &LayoutConfig,
) -> bool {
    let child = |handle: &str| {
        edges
            .iter()
            .find(|e| e.source == *decision && e.source_handle.as_deref() == Some(handle))
            .map(|e| e.target.clone())
    };
    let (Some(true_child), Some(false_child)) = (child(TRUE_HANDLE), child(FALSE_HANDLE)) else {
        return false;
    };

    let mut true_side = owned_side(edges, decision, &true_child);
    let mut false_side = owned_side(edges, decision, &false_child);
    // Both handles pointing at the same node.
    let shared: HashSet<NodeId> = true_side
        .iter()
        .filter(|id| false_side.contains(id))
        .cloned()
        .collect();
    true_side.retain(|id| !shared.contains(id));
    false_side.retain(|id| !shared.contains(id));

    let width = layout.node_width;
    let (Some(true_fp), Some(false_fp)) = (
        Footprint::measure(&true_side, positions, width),
        Footprint::measure(&false_side, positions, width),
    ) else {
        return false;
    };

    let ((left, left_fp), (right, right_fp)) = if true_fp.center() <= false_fp.center() {
        ((&true_side, true_fp), (&false_side, false_fp))
    } else {
        ((&false_side, false_fp), (&true_side, true_fp))
    };

    let overlap = left_fp.max_x - right_fp.min_x;
    if overlap <= 0.0 {
        return false;
    }

    let shift = overlap + layout.collision_margin;
    let (moved, dx) = if left_fp.width() < right_fp.width() {
        (left, -shift)
    } else {
        (right, shift)
    };
    for id in moved {
        if let Some(pos) = positions.get_mut(id) {
            pos.x += dx;
        }
    }
    debug!(
        "Separated branches of {}: moved {} node(s) by {}",
        decision,
        moved.len(),
        dx
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind, x: f32, y: f32) -> Node {
        Node::new(id, kind, Position::new(x, y))
    }

    fn edge(source: &str, target: &str, handle: Option<&str>) -> Edge {
        Edge::new(source.into(), target.into(), handle.map(str::to_string))
    }

    fn apply(nodes: &mut [Node], changes: &[PositionChange]) {
        for (id, pos) in changes {
            if let Some(n) = nodes.iter_mut().find(|n| n.id == *id) {
                n.position = *pos;
            }
        }
    }

    /// C with a wide `true` side (nested decision t) and a narrow `false` chain.
    fn crowded() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Conditional, -110.0, 210.0),
            node("tt", NodeKind::Action, -220.0, 420.0),
            node("tf", NodeKind::Action, 0.0, 420.0),
            node("f", NodeKind::Action, 110.0, 210.0),
            node("after_f", NodeKind::Action, 110.0, 360.0),
        ];
        let edges = vec![
            edge("c", "t", Some(TRUE_HANDLE)),
            edge("c", "f", Some(FALSE_HANDLE)),
            edge("t", "tt", Some(TRUE_HANDLE)),
            edge("t", "tf", Some(FALSE_HANDLE)),
            edge("f", "after_f", None),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_separated_branches_are_untouched() {
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Action, -110.0, 210.0),
            node("f", NodeKind::Action, 110.0, 210.0),
        ];
        let edges = vec![edge("c", "t", Some(TRUE_HANDLE)), edge("c", "f", Some(FALSE_HANDLE))];

        let changes = resolve_branch_overlap(&"c".into(), &nodes, &edges, &LayoutConfig::default());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_narrower_subtree_is_pushed_out_whole() {
        let layout = LayoutConfig::default();
        let (nodes, edges) = crowded();

        let changes = resolve_branch_overlap(&"c".into(), &nodes, &edges, &layout);

        // true side spans [-220, 180], false side starts at 110: overlap 70.
        let expected_x = 110.0 + 70.0 + layout.collision_margin;
        assert_eq!(
            changes,
            vec![
                (NodeId::new("f"), Position::new(expected_x, 210.0)),
                (NodeId::new("after_f"), Position::new(expected_x, 360.0)),
            ]
        );
    }

    #[test]
    fn test_narrower_left_side_moves_left() {
        let layout = LayoutConfig::default();
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Action, -110.0, 210.0),
            node("f", NodeKind::Conditional, 110.0, 210.0),
            node("ft", NodeKind::Action, 0.0, 420.0),
            node("ff", NodeKind::Action, 220.0, 420.0),
        ];
        let edges = vec![
            edge("c", "t", Some(TRUE_HANDLE)),
            edge("c", "f", Some(FALSE_HANDLE)),
            edge("f", "ft", Some(TRUE_HANDLE)),
            edge("f", "ff", Some(FALSE_HANDLE)),
        ];

        let changes = resolve_branch_overlap(&"c".into(), &nodes, &edges, &layout);

        // t spans [-110, 70], false side starts at 0: overlap 70.
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, NodeId::new("t"));
        assert_eq!(changes[0].1.x, -110.0 - 70.0 - layout.collision_margin);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let layout = LayoutConfig::default();
        let (mut nodes, edges) = crowded();

        let first = resolve_all(&nodes, &edges, &layout);
        assert!(!first.is_empty());
        apply(&mut nodes, &first);

        let second = resolve_all(&nodes, &edges, &layout);
        assert!(second.is_empty());
    }

    #[test]
    fn test_single_branch_is_ignored() {
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Action, 0.0, 210.0),
        ];
        let edges = vec![edge("c", "t", Some(TRUE_HANDLE))];
        assert!(resolve_all(&nodes, &edges, &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn test_rejoining_nodes_are_not_moved() {
        let layout = LayoutConfig::default();
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Action, 0.0, 210.0),
            node("f", NodeKind::Action, 50.0, 210.0),
            node("join", NodeKind::Action, 0.0, 400.0),
        ];
        let edges = vec![
            edge("c", "t", Some(TRUE_HANDLE)),
            edge("c", "f", Some(FALSE_HANDLE)),
            edge("t", "join", None),
            edge("f", "join", None),
        ];

        let changes = resolve_branch_overlap(&"c".into(), &nodes, &edges, &layout);

        assert!(changes.iter().all(|(id, _)| id.as_str() != "join"));
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_rejoin_across_nested_decision_settles_in_one_pass() {
        // O -true-> A -> A2 -> J, O -false-> B, B -true-> B1 -> J, B -false-> B2
        let layout = LayoutConfig::default();
        let mut nodes = vec![
            node("o", NodeKind::Conditional, 0.0, 0.0),
            node("a", NodeKind::Action, -110.0, 210.0),
            node("a2", NodeKind::Action, -110.0, 360.0),
            node("b", NodeKind::Conditional, 110.0, 210.0),
            node("b1", NodeKind::Action, 0.0, 420.0),
            node("b2", NodeKind::Action, 220.0, 420.0),
            node("j", NodeKind::Action, -110.0, 570.0),
        ];
        let edges = vec![
            edge("o", "a", Some(TRUE_HANDLE)),
            edge("a", "a2", None),
            edge("a2", "j", None),
            edge("o", "b", Some(FALSE_HANDLE)),
            edge("b", "b1", Some(TRUE_HANDLE)),
            edge("b", "b2", Some(FALSE_HANDLE)),
            edge("b1", "j", None),
        ];

        let first = resolve_all(&nodes, &edges, &layout);

        // J is fed from both sides of O, so only the narrow a/a2 column moves.
        assert_eq!(
            first,
            vec![
                (NodeId::new("a"), Position::new(-220.0, 210.0)),
                (NodeId::new("a2"), Position::new(-220.0, 360.0)),
            ]
        );
        apply(&mut nodes, &first);
        assert!(resolve_all(&nodes, &edges, &layout).is_empty());
    }

    #[test]
    fn test_self_loop_does_not_disown_a_node() {
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0),
            node("t", NodeKind::Action, 0.0, 210.0),
            node("retry", NodeKind::Action, 0.0, 360.0),
            node("f", NodeKind::Action, 100.0, 210.0),
        ];
        let edges = vec![
            edge("c", "t", Some(TRUE_HANDLE)),
            edge("c", "f", Some(FALSE_HANDLE)),
            edge("t", "retry", None),
            edge("retry", "retry", Some("again")),
        ];

        let side = owned_side(&edges, &"c".into(), &"t".into());

        assert_eq!(side, vec![NodeId::new("t"), NodeId::new("retry")]);
    }

    #[test]
    fn test_multi_condition_decisions_are_skipped() {
        let multi = ConditionalConfig {
            multiple_conditions: true,
            return_type: ReturnType::String,
            cases: vec![Case::new("a", "true"), Case::new("b", "false")],
        };
        let nodes = vec![
            node("c", NodeKind::Conditional, 0.0, 0.0).with_conditional(multi),
            node("t", NodeKind::Action, 0.0, 210.0),
            node("f", NodeKind::Action, 0.0, 210.0),
        ];
        let edges = vec![edge("c", "t", Some(TRUE_HANDLE)), edge("c", "f", Some(FALSE_HANDLE))];

        assert!(resolve_all(&nodes, &edges, &LayoutConfig::default()).is_empty());
    }
}
