//! Built-in workflow templates that can be quickly loaded into an editor.
//!
//! Templates are assembled through the same insertion protocol a user goes
//! through, against a small sample catalog, so their layout is exactly what a
//! user would get by clicking the same nodes together.

use crate::collision;
use crate::config::LayoutConfig;
use crate::insertion::{insert_node, InsertRequest};
use crate::plugins::{PluginDescriptor, PluginKind, StaticCatalog};
use crate::store::GraphStore;
use crate::types::*;
use log::warn;

/// Kinds of built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Log -> HTTP request -> Send email
    LinearSteps,
    /// HTTP request followed by a true/false decision
    DecisionBranch,
    /// Multi-case decision routing on a status code
    SwitchCases,
    /// For-each loop with a two-step body
    ForEachLoop,
}

/// Metadata for a single template.
pub struct TemplateInfo {
    /// Stable identifier for the template
    pub kind: TemplateKind,
    /// Command-line / menu key
    pub key: &'static str,
    /// Human-friendly display name
    pub name: &'static str,
}

/// Returns all templates with their display names.
pub const fn all_templates() -> &'static [TemplateInfo] {
    const TEMPLATES: &[TemplateInfo] = &[
        TemplateInfo {
            kind: TemplateKind::LinearSteps,
            key: "linear",
            name: "Linear Steps",
        },
        TemplateInfo {
            kind: TemplateKind::DecisionBranch,
            key: "decision",
            name: "Decision Branch (True/False)",
        },
        TemplateInfo {
            kind: TemplateKind::SwitchCases,
            key: "switch",
            name: "Switch on Status Code",
        },
        TemplateInfo {
            kind: TemplateKind::ForEachLoop,
            key: "for-each",
            name: "For Each Item",
        },
    ];
    TEMPLATES
}

/// Looks up a template by its key.
pub fn template_by_key(key: &str) -> Option<TemplateKind> {
    all_templates()
        .iter()
        .find(|info| info.key == key)
        .map(|info| info.kind)
}

/// A small catalog of sample node types, enough to build every template.
pub fn builtin_catalog() -> StaticCatalog {
    [
        PluginDescriptor::new("log", "Log Message", "utility", "#64748b", PluginKind::Action),
        PluginDescriptor::new("delay", "Delay", "utility", "#a855f7", PluginKind::Action),
        PluginDescriptor::new("http_request", "HTTP Request", "network", "#0ea5e9", PluginKind::Action),
        PluginDescriptor::new("send_email", "Send Email", "messaging", "#f97316", PluginKind::Action),
        PluginDescriptor::new("condition", "Condition", "logic", "#eab308", PluginKind::Conditional),
        PluginDescriptor::new("switch", "Switch", "logic", "#eab308", PluginKind::Conditional),
        PluginDescriptor::new("loop", "Loop", "logic", "#14b8a6", PluginKind::Loop),
        PluginDescriptor::new("for_each", "For Each", "logic", "#14b8a6", PluginKind::ForEachLoop),
    ]
    .into_iter()
    .collect()
}

/// Builds a document for the given template kind.
pub fn build_template(kind: TemplateKind) -> Document {
    let mut builder = Builder::new(LayoutConfig::default());
    let complete = match kind {
        TemplateKind::LinearSteps => build_linear_steps(&mut builder),
        TemplateKind::DecisionBranch => build_decision_branch(&mut builder),
        TemplateKind::SwitchCases => build_switch_cases(&mut builder),
        TemplateKind::ForEachLoop => build_for_each_loop(&mut builder),
    };
    if complete.is_none() {
        warn!("Template {:?} was only partially built", kind);
    }
    builder.finish()
}

struct Builder {
    store: GraphStore,
    catalog: StaticCatalog,
    layout: LayoutConfig,
}

impl Builder {
    fn new(layout: LayoutConfig) -> Self {
        Self {
            store: GraphStore::new(),
            catalog: builtin_catalog(),
            layout,
        }
    }

    fn add(&mut self, request: InsertRequest) -> Option<NodeId> {
        match insert_node(&mut self.store, &self.catalog, &request, &self.layout) {
            Ok(Some(insertion)) => Some(insertion.node_id),
            Ok(None) => {
                warn!("Template step '{}' was rejected", request.type_ref);
                None
            }
            Err(err) => {
                warn!("Template step '{}' failed: {err}", request.type_ref);
                None
            }
        }
    }

    fn finish(mut self) -> Document {
        let changes =
            collision::resolve_all(self.store.nodes(), self.store.edges(), &self.layout);
        self.store.apply_positions(&changes);
        self.store.document()
    }
}

fn build_linear_steps(b: &mut Builder) -> Option<()> {
    let log = b.add(InsertRequest::root("log"))?;
    let request = b.add(InsertRequest::below(log, "http_request"))?;
    b.add(InsertRequest::below(request, "send_email"))?;
    Some(())
}

fn build_decision_branch(b: &mut Builder) -> Option<()> {
    let request = b.add(InsertRequest::root("http_request"))?;
    let check = b.add(InsertRequest::below(request, "condition"))?;
    b.store.update_node(
        &check,
        ConfigPatch {
            label: Some("Succeeded?".into()),
            ..ConfigPatch::default()
        },
    );

    let notify = b.add(InsertRequest::on_branch(check.clone(), TRUE_HANDLE, "send_email"))?;
    b.add(InsertRequest::below(notify, "log"))?;
    let wait = b.add(InsertRequest::on_branch(check, FALSE_HANDLE, "delay"))?;
    b.add(InsertRequest::below(wait, "http_request"))?;
    Some(())
}

fn build_switch_cases(b: &mut Builder) -> Option<()> {
    let request = b.add(InsertRequest::root("http_request"))?;
    let switch = b.add(InsertRequest::below(request, "switch"))?;
    b.store.update_node(
        &switch,
        ConfigPatch {
            label: Some("Status code".into()),
            conditional: Some(ConditionalConfig {
                multiple_conditions: true,
                return_type: ReturnType::String,
                cases: vec![
                    Case::new("status == 200", "ok"),
                    Case::new("status == 201", "ok"),
                    Case::new("status == 404", "missing"),
                ],
            }),
            ..ConfigPatch::default()
        },
    );

    b.add(InsertRequest::on_branch(switch.clone(), "ok", "log"))?;
    b.add(InsertRequest::on_branch(switch.clone(), "missing", "send_email"))?;
    b.add(InsertRequest::on_branch(switch, ELSE_HANDLE, "delay"))?;
    Some(())
}

fn build_for_each_loop(b: &mut Builder) -> Option<()> {
    let fetch = b.add(InsertRequest::root("http_request"))?;
    let each = b.add(InsertRequest::below(fetch, "for_each"))?;
    let body = b.add(InsertRequest::below(each, "log"))?;
    b.add(InsertRequest::below(body, "send_email"))?;
    Some(())
}
