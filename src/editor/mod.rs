//! Interactive editing session.
//!
//! [`Editor`] ties the document store to everything that reacts to it: the
//! selection, the undo/redo history, the deferred collision pass and the
//! autosave hand-off. All of them observe the same signal, the store's
//! revision counter. History restores and document loads run with that
//! signal suppressed, so neither is recorded as a new history entry nor
//! handed to the persistence sink as a user edit.

pub mod history;
pub mod scheduler;


pub use history::{History, Snapshot};
pub use scheduler::{Clock, Debounce, ManualClock, SystemClock};

use crate::branches::{layout_branches, BranchPlacement};
use crate::collision;
use crate::config::EditorConfig;
use crate::error::GraphError;
use crate::insertion::{insert_node, InsertRequest};
use crate::plugins::PluginCatalog;
use crate::store::{DeleteMode, DeletionReport, GraphStore, LoadReport};
use crate::types::*;
use log::{debug, info, warn};

/// Error type returned by persistence sinks.
pub type SaveError = Box<dyn std::error::Error + Send + Sync>;

/// External collaborator that stores documents, e.g. on disk or behind an API.
pub trait PersistenceSink {
    /// Persists `document`. Called only for genuine user edits.
    fn save(&mut self, document: &Document) -> Result<(), SaveError>;
}

/// What a call to [`Editor::tick`] or [`Editor::flush`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The collision pass ran and moved at least one node
    pub collisions_resolved: bool,
    /// A history snapshot was recorded
    pub snapshot_recorded: bool,
    /// The document was handed to the persistence sink successfully
    pub autosaved: bool,
}

/// A single local editing session over one workflow document.
pub struct Editor {
    store: GraphStore,
    catalog: Box<dyn PluginCatalog>,
    config: EditorConfig,
    history: History,
    selected: Option<NodeId>,
    clock: Box<dyn Clock>,
    persistence: Option<Box<dyn PersistenceSink>>,
    history_timer: Debounce,
    autosave_timer: Debounce,
    collision_timer: Debounce,
    observed_revision: u64,
    suppress: u32,
}

impl Editor {
    /// Creates a session over an empty document.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Lookup of the node types that can be inserted
    /// * `config` - Layout, history and timer settings
    pub fn new(catalog: impl PluginCatalog + 'static, config: EditorConfig) -> Self {
        let history = History::new(Snapshot::default(), config.history_depth);
        Self {
            store: GraphStore::new(),
            catalog: Box::new(catalog),
            history_timer: Debounce::new(config.history_debounce()),
            autosave_timer: Debounce::new(config.autosave_debounce()),
            collision_timer: Debounce::new(config.collision_delay()),
            config,
            history,
            selected: None,
            clock: Box::new(SystemClock),
            persistence: None,
            observed_revision: 0,
            suppress: 0,
        }
    }

    /// Replaces the clock, builder style.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attaches a persistence sink that receives debounced autosaves, builder style.
    pub fn with_persistence(mut self, sink: impl PersistenceSink + 'static) -> Self {
        self.persistence = Some(Box::new(sink));
        self
    }

    /// Read access to the document store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Snapshot of the current document, e.g. for an explicit save.
    pub fn document(&self) -> Document {
        self.store.document()
    }

    /// The session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The undo/redo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Currently selected node.
    pub fn selected_node_id(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Changes the selection. Selecting a node that does not exist is ignored.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        match id {
            Some(id) if !self.store.contains(&id) => false,
            id => {
                self.selected = id;
                true
            }
        }
    }

    /// True while a history snapshot is being written back into the store.
    pub fn is_restoring(&self) -> bool {
        self.suppress > 0
    }

    /// Replaces the document with a loaded one and starts a fresh history.
    ///
    /// Loading is not an edit: it neither autosaves nor becomes undoable.
    pub fn load_document(&mut self, document: Document) -> LoadReport {
        self.suppress += 1;
        self.history_timer.cancel();
        self.autosave_timer.cancel();
        self.collision_timer.cancel();

        let report = self.store.load(document);
        self.selected = None;
        self.history
            .reset(Snapshot::new(self.store.document(), None));
        self.observe();

        self.suppress -= 1;
        info!(
            "Loaded document with {} node(s) and {} edge(s)",
            self.store.nodes().len(),
            self.store.edges().len()
        );
        report
    }

    /// Inserts a node from a palette click or drag-drop and selects it.
    ///
    /// # Returns
    ///
    /// The new node's id, or `None` if the request lost a user race.
    ///
    /// # Errors
    ///
    /// [`GraphError::DanglingReference`] if the request names a missing source.
    pub fn insert(&mut self, request: InsertRequest) -> Result<Option<NodeId>, GraphError> {
        let outcome = insert_node(
            &mut self.store,
            self.catalog.as_ref(),
            &request,
            &self.config.layout,
        );
        self.observe();

        let Some(insertion) = outcome? else {
            return Ok(None);
        };
        if insertion.binary_branch {
            self.collision_timer
                .schedule(self.clock.now(), self.store.revision());
        }
        self.selected = Some(insertion.node_id.clone());
        Ok(Some(insertion.node_id))
    }

    /// Connects two existing nodes. See [`GraphStore::connect`].
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        source_handle: Option<&str>,
    ) -> Result<Edge, GraphError> {
        let edge = self.store.connect(source, target, source_handle);
        self.observe();
        edge
    }

    /// Removes a single edge by id.
    pub fn disconnect(&mut self, edge_id: &str) -> bool {
        let removed = self.store.disconnect(edge_id).is_some();
        self.observe();
        removed
    }

    /// Deletes a node, or a node and its chain, clearing the selection if it was removed.
    pub fn delete(&mut self, id: &NodeId, mode: DeleteMode) -> Option<DeletionReport> {
        let report = self.store.delete_node(id, mode)?;
        if self
            .selected
            .as_ref()
            .is_some_and(|s| report.removed_nodes.contains(s))
        {
            self.selected = None;
        }
        self.observe();
        Some(report)
    }

    /// Moves a node, e.g. at the end of a drag gesture.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> bool {
        let moved = self.store.set_position(id, position);
        self.observe();
        moved
    }

    /// Applies a property-panel edit to a node's configuration.
    pub fn update_config(&mut self, id: &NodeId, patch: ConfigPatch) -> bool {
        let changed = self.store.update_node(id, patch);
        self.observe();
        changed
    }

    /// Branch guides of a decision node, for rendering.
    pub fn branch_layout(&self, id: &NodeId) -> Vec<BranchPlacement> {
        match self.store.node(id) {
            Some(node) => layout_branches(
                node,
                self.store.nodes(),
                self.store.edges(),
                &self.config.layout,
            ),
            None => Vec::new(),
        }
    }

    /// Returns true if [`Editor::undo`] would change the document.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.has_unrecorded_changes()
    }

    /// Returns true if [`Editor::redo`] would change the document.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && !self.has_unrecorded_changes()
    }

    /// Steps back to the previous snapshot.
    ///
    /// An edit still waiting for its history debounce is recorded first so it
    /// can be redone.
    ///
    /// # Returns
    ///
    /// `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.collision_timer.cancel();
        self.record_pending_snapshot();

        let Some(snapshot) = self.history.step_back().cloned() else {
            debug!("Nothing to undo");
            return false;
        };
        self.restore(snapshot);
        info!("Undo to history entry {}", self.history.cursor() + 1);
        true
    }

    /// Steps forward to the next snapshot.
    ///
    /// # Returns
    ///
    /// `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.collision_timer.cancel();
        self.record_pending_snapshot();

        let Some(snapshot) = self.history.step_forward().cloned() else {
            debug!("Nothing to redo");
            return false;
        };
        self.restore(snapshot);
        info!("Redo to history entry {}", self.history.cursor() + 1);
        true
    }

    /// Fires every timer whose quiet period has elapsed.
    ///
    /// Runs the collision pass first, so the moves it makes are coalesced
    /// into the pending history snapshot and autosave.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();

        if self.collision_timer.poll(now).is_some() {
            report.collisions_resolved = self.resolve_collisions();
        }
        if let Some(generation) = self.history_timer.poll(now) {
            report.snapshot_recorded = self.record_snapshot(generation);
        }
        if let Some(generation) = self.autosave_timer.poll(now) {
            report.autosaved = self.autosave(generation);
        }
        report
    }

    /// Fires every pending timer immediately, e.g. before the host shuts down.
    pub fn flush(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if self.collision_timer.take().is_some() {
            report.collisions_resolved = self.resolve_collisions();
        }
        if let Some(generation) = self.history_timer.take() {
            report.snapshot_recorded = self.record_snapshot(generation);
        }
        if let Some(generation) = self.autosave_timer.take() {
            report.autosaved = self.autosave(generation);
        }
        report
    }

    /// Reacts to a store mutation, if there was one since the last call.
    fn observe(&mut self) {
        let revision = self.store.revision();
        if revision == self.observed_revision {
            return;
        }
        self.observed_revision = revision;

        if self.is_restoring() {
            debug!("Ignoring restore-induced change at revision {revision}");
            return;
        }
        let now = self.clock.now();
        self.history_timer.schedule(now, revision);
        if self.persistence.is_some() {
            self.autosave_timer.schedule(now, revision);
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.suppress += 1;

        let Snapshot {
            document,
            selected_node_id,
        } = snapshot;
        self.store.replace(document.nodes, document.edges);
        self.selected = selected_node_id.filter(|id| self.store.contains(id));
        self.observe();

        self.suppress -= 1;
    }

    fn has_unrecorded_changes(&self) -> bool {
        let current = &self.history.current().document;
        self.history_timer.is_pending()
            && (current.nodes != self.store.nodes() || current.edges != self.store.edges())
    }

    fn record_pending_snapshot(&mut self) {
        if let Some(generation) = self.history_timer.take() {
            self.record_snapshot(generation);
        }
    }

    fn record_snapshot(&mut self, generation: u64) -> bool {
        if self.is_restoring() {
            return false;
        }
        let snapshot = Snapshot::new(self.store.document(), self.selected.clone());
        let recorded = self.history.push(snapshot);
        if recorded {
            debug!("Captured snapshot of revision {generation}");
        }
        recorded
    }

    fn autosave(&mut self, generation: u64) -> bool {
        if self.is_restoring() {
            return false;
        }
        let Some(sink) = self.persistence.as_mut() else {
            return false;
        };
        match sink.save(&self.store.document()) {
            Ok(()) => {
                info!("Autosaved revision {generation}");
                true
            }
            Err(err) => {
                warn!("Autosave of revision {generation} failed: {err}");
                false
            }
        }
    }

    fn resolve_collisions(&mut self) -> bool {
        let changes =
            collision::resolve_all(self.store.nodes(), self.store.edges(), &self.config.layout);
        if changes.is_empty() {
            return false;
        }
        let moved = self.store.apply_positions(&changes);
        self.observe();
        moved
    }
}
