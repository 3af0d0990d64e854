//! Editor configuration.
//!
//! Every field has a default taken from [`crate::constants`], so a host can
//! deserialize a partial JSON object and only override what it cares about.

use crate::constants::*;
use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Geometry used by the branch layout engine, insertion protocol and collision resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Width of a node in canvas units
    pub node_width: f32,
    /// Height of a node in canvas units
    pub node_height: f32,
    /// Horizontal distance between neighbouring branch slots
    pub min_branch_spacing: f32,
    /// Gap below a decision node for branches that have no child yet
    pub default_branch_drop: f32,
    /// Lower bound for the gap reported for connected branches
    pub min_vertical_gap: f32,
    /// Vertical distance used when extending a straight chain
    pub vertical_offset: f32,
    /// Where a node without a source is placed when no drop point is given
    pub root_anchor: Position,
    /// Clearance left between sibling subtrees after collision resolution
    pub collision_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            min_branch_spacing: MIN_BRANCH_SPACING,
            default_branch_drop: DEFAULT_BRANCH_DROP,
            min_vertical_gap: MIN_VERTICAL_GAP,
            vertical_offset: VERTICAL_OFFSET,
            root_anchor: Position::new(ROOT_ANCHOR.0, ROOT_ANCHOR.1),
            collision_margin: COLLISION_MARGIN,
        }
    }
}

/// Top-level configuration for an [`crate::Editor`] session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Layout geometry
    pub layout: LayoutConfig,
    /// Maximum number of history snapshots kept
    pub history_depth: usize,
    /// Quiet period before a history snapshot is captured
    pub history_debounce_ms: u64,
    /// Quiet period before the document is handed to the persistence sink
    pub autosave_debounce_ms: u64,
    /// Delay between a binary-branch insertion and the collision pass
    pub collision_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            history_depth: MAX_HISTORY_DEPTH,
            history_debounce_ms: HISTORY_DEBOUNCE_MS,
            autosave_debounce_ms: AUTOSAVE_DEBOUNCE_MS,
            collision_delay_ms: COLLISION_DELAY_MS,
        }
    }
}

impl EditorConfig {
    /// Parses a configuration from JSON. Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// History debounce as a [`Duration`].
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    /// Autosave debounce as a [`Duration`].
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Collision pass delay as a [`Duration`].
    pub fn collision_delay(&self) -> Duration {
        Duration::from_millis(self.collision_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, MAX_HISTORY_DEPTH);
        assert_eq!(config.layout.min_branch_spacing, MIN_BRANCH_SPACING);
        assert_eq!(config.history_debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = EditorConfig::from_json(
            r#"{ "historyDepth": 10, "layout": { "minBranchSpacing": 300.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.history_depth, 10);
        assert_eq!(config.layout.min_branch_spacing, 300.0);
        assert_eq!(config.layout.node_height, NODE_HEIGHT);
        assert_eq!(config.autosave_debounce_ms, AUTOSAVE_DEBOUNCE_MS);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(EditorConfig::from_json("{ not json").is_err());
    }
}
