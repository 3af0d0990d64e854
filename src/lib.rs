//! # Workflow Canvas
//!
//! Editing core for a node-and-edge workflow canvas. A workflow is a directed
//! graph of steps; decision nodes fan out into labelled branches and every
//! output feeds at most one successor. The crate covers everything between a
//! user gesture and the document it produces:
//!
//! - **Store**: the nodes and edges, with relinking and chain deletion
//! - **Branches**: branch derivation and layout for decision nodes
//! - **Insertion**: palette clicks and drops turned into placed, connected nodes
//! - **Collision**: separating the two sides of a decision once one grows wide
//! - **Editor**: selection, debounced undo/redo history and autosave
//!
//! Rendering, persistence and plugin discovery live in the host; the crate
//! reaches them only through the [`PluginCatalog`], [`PersistenceSink`] and
//! [`Clock`] traits.
//!
//! ```
//! use workflow_canvas::{builtin_catalog, Editor, EditorConfig, InsertRequest};
//!
//! let mut editor = Editor::new(builtin_catalog(), EditorConfig::default());
//! let first = editor.insert(InsertRequest::root("log")).unwrap().unwrap();
//! editor.insert(InsertRequest::below(first, "send_email")).unwrap();
//! assert_eq!(editor.document().edges.len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod branches;
pub mod collision;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod insertion;
pub mod plugins;
pub mod store;
pub mod templates;
mod types;

// Re-export public types and functions
pub use branches::{layout_branches, node_branches, stale_branch_edges, Branch, BranchPlacement, BranchShape};
pub use config::{EditorConfig, LayoutConfig};
pub use editor::{Clock, Editor, ManualClock, PersistenceSink, SaveError, SystemClock, TickReport};
pub use error::GraphError;
pub use insertion::{insert_node, InsertRequest, Insertion};
pub use plugins::{PluginCatalog, PluginDescriptor, PluginKind, StaticCatalog};
pub use store::{DeleteMode, DeletionReport, GraphStore, LoadReport};
pub use templates::{all_templates, build_template, builtin_catalog, TemplateKind};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_uses_camel_case() {
        let document = build_template(TemplateKind::DecisionBranch);
        let json = document.to_json().unwrap();

        assert!(json.contains("\"isFirstNode\": true"));
        assert!(json.contains("\"sourceHandle\": \"true\""));
        assert!(json.contains("\"multipleConditions\": false"));
        assert!(json.contains("\"nodeTypeRef\": \"condition\""));
    }

    #[test]
    fn test_document_survives_json() {
        let document = build_template(TemplateKind::SwitchCases);
        let restored = Document::from_json(&document.to_json().unwrap()).unwrap();
        assert_eq!(restored, document);
    }
}
