//! Structural errors raised by graph mutations.
//!
//! These indicate a logic bug in the caller rather than a user timing race;
//! races (double clicks, stale handles, unknown plugin types) resolve to
//! no-ops instead and never reach this type.

use crate::types::NodeId;
use thiserror::Error;

/// Errors that can occur while mutating the workflow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge endpoint or insertion source names a node that does not exist.
    #[error("Node '{node_id}' does not exist, but an edge or insertion refers to it")]
    DanglingReference {
        /// The missing node id
        node_id: NodeId,
    },

    /// A node with the same id is already present in the document.
    #[error("A node with id '{node_id}' already exists")]
    DuplicateId {
        /// The colliding node id
        node_id: NodeId,
    },
}
