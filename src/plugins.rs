//! Plugin descriptors and the read-only catalog the editor consults.
//!
//! The catalog is injected into the editor; the core never keeps a global
//! registry and never executes plugin behaviour. It only reads enough of a
//! descriptor to decide a node's kind and default look.

use crate::types::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structural role a plugin's nodes play in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginKind {
    /// Single-output step
    Action,
    /// Decision node with derived branches
    Conditional,
    /// Condition-driven loop
    Loop,
    /// Collection-driven loop
    ForEachLoop,
}

impl From<PluginKind> for NodeKind {
    fn from(kind: PluginKind) -> Self {
        match kind {
            PluginKind::Action => NodeKind::Action,
            PluginKind::Conditional => NodeKind::Conditional,
            PluginKind::Loop => NodeKind::Loop,
            PluginKind::ForEachLoop => NodeKind::ForEachLoop,
        }
    }
}

/// What the editor knows about an available node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// Type key stored in `NodeConfig::node_type_ref`
    pub type_ref: String,
    /// Default node label
    pub display_name: String,
    /// Grouping shown in the palette
    pub category: String,
    /// Default node color
    pub color: String,
    /// Opaque icon reference, passed through to the renderer
    #[serde(default)]
    pub icon: String,
    /// Structural role
    pub kind: PluginKind,
}

impl PluginDescriptor {
    /// Creates a descriptor with an empty icon.
    pub fn new(
        type_ref: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
        color: impl Into<String>,
        kind: PluginKind,
    ) -> Self {
        Self {
            type_ref: type_ref.into(),
            display_name: display_name.into(),
            category: category.into(),
            color: color.into(),
            icon: String::new(),
            kind,
        }
    }
}

/// Read-only lookup of plugin descriptors by type key.
pub trait PluginCatalog {
    /// Returns the descriptor for `type_ref`, or `None` if the type is unknown.
    fn lookup_plugin(&self, type_ref: &str) -> Option<&PluginDescriptor>;
}

/// A catalog backed by an in-memory map, filled once by the host.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    plugins: HashMap<String, PluginDescriptor>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous one with the same type key.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> &mut Self {
        self.plugins.insert(descriptor.type_ref.clone(), descriptor);
        self
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl FromIterator<PluginDescriptor> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = PluginDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.register(descriptor);
        }
        catalog
    }
}

impl PluginCatalog for StaticCatalog {
    fn lookup_plugin(&self, type_ref: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(type_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_registered_and_unknown() {
        let catalog: StaticCatalog = [
            PluginDescriptor::new("http", "HTTP Request", "network", "#0ea5e9", PluginKind::Action),
            PluginDescriptor::new("if", "Condition", "logic", "#f97316", PluginKind::Conditional),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup_plugin("if").unwrap().kind, PluginKind::Conditional);
        assert!(catalog.lookup_plugin("nope").is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut catalog = StaticCatalog::new();
        catalog
            .register(PluginDescriptor::new("a", "Old", "x", "#000", PluginKind::Action))
            .register(PluginDescriptor::new("a", "New", "x", "#000", PluginKind::Loop));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup_plugin("a").unwrap().display_name, "New");
    }

    #[test]
    fn test_plugin_kind_maps_to_node_kind() {
        assert_eq!(NodeKind::from(PluginKind::ForEachLoop), NodeKind::ForEachLoop);
        assert_eq!(NodeKind::from(PluginKind::Conditional), NodeKind::Conditional);
    }
}
