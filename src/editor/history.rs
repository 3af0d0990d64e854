//! Undo/redo history of document snapshots.
//!
//! History is a bounded list of snapshots with a cursor. Entries up to the
//! cursor can be undone to; entries after it can be redone to. Recording a new
//! snapshot while the cursor is below the top discards the redo tail.

use crate::types::{Document, NodeId};
use log::debug;

/// A captured document plus the selection at that moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Nodes and edges
    pub document: Document,
    /// Selected node, restored together with the document
    pub selected_node_id: Option<NodeId>,
}

impl Snapshot {
    /// Creates a new snapshot.
    pub fn new(document: Document, selected_node_id: Option<NodeId>) -> Self {
        Self {
            document,
            selected_node_id,
        }
    }
}

/// Bounded undo/redo stack. Always holds at least one snapshot.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: usize,
    max_depth: usize,
}

impl History {
    /// Creates a history whose only entry is `initial`.
    pub fn new(initial: Snapshot, max_depth: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Drops every entry and starts over from `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }

    /// Records a snapshot after the cursor.
    ///
    /// # Returns
    ///
    /// `false` if the snapshot's document equals the one at the cursor and
    /// nothing was recorded.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.current().document == snapshot.document {
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);

        // Limit history size
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
        debug!("Recorded history entry {} of {}", self.cursor + 1, self.entries.len());
        true
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> &Snapshot {
        &self.entries[self.cursor]
    }

    /// Returns true if there is an older snapshot to go back to.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns true if there is a newer snapshot to go forward to.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Moves the cursor back one entry.
    ///
    /// # Returns
    ///
    /// The snapshot to restore, or `None` if already at the oldest entry.
    pub fn step_back(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Moves the cursor forward one entry.
    ///
    /// # Returns
    ///
    /// The snapshot to restore, or `None` if already at the newest entry.
    pub fn step_forward(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no snapshot is retained, which never happens after construction.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the snapshot the document currently corresponds to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
