//! Shared editor-wide constants.
//! Centralizes tweakable values used by layout, insertion and history.

// Node dimensions
/// Default node width in canvas units.
pub const NODE_WIDTH: f32 = 180.0;
/// Default node height in canvas units.
pub const NODE_HEIGHT: f32 = 70.0;

// Vertical chains
/// Vertical distance between a node and the node inserted directly below it.
pub const VERTICAL_OFFSET: f32 = 150.0;
/// Position of the first node placed on an empty canvas.
pub const ROOT_ANCHOR: (f32, f32) = (250.0, 50.0);

// Branch layout
/// Horizontal distance between neighbouring branches of a decision node.
pub const MIN_BRANCH_SPACING: f32 = 220.0;
/// Gap between a decision node's bottom edge and an unconnected branch slot.
pub const DEFAULT_BRANCH_DROP: f32 = 140.0;
/// Smallest gap reported for a connected branch, even if its child was dragged above.
pub const MIN_VERTICAL_GAP: f32 = 40.0;

// Collision resolution
/// Extra horizontal clearance left between sibling subtrees after separating them.
pub const COLLISION_MARGIN: f32 = 40.0;

// Undo/redo
/// Maximum number of history snapshots to retain.
pub const MAX_HISTORY_DEPTH: usize = 50;

// Timers (milliseconds)
/// Quiet period after the last mutation before a history snapshot is taken.
pub const HISTORY_DEBOUNCE_MS: u64 = 100;
/// Quiet period after the last genuine edit before the document is autosaved.
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 1500;
/// Delay between a binary-branch insertion and the collision pass.
pub const COLLISION_DELAY_MS: u64 = 30;

// Branch palette
/// Color of the `true` branch guide.
pub const TRUE_BRANCH_COLOR: &str = "#22c55e";
/// Color of the `false` branch guide.
pub const FALSE_BRANCH_COLOR: &str = "#ef4444";
/// Color of the trailing `else` branch guide.
pub const ELSE_BRANCH_COLOR: &str = "#6b7280";
/// Colors cycled through for multi-condition case branches.
pub const CASE_BRANCH_COLORS: [&str; 6] = [
    "#3b82f6", "#a855f7", "#f59e0b", "#14b8a6", "#ec4899", "#84cc16",
];
