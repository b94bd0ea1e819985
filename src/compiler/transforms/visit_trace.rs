use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::ast::{Dependency, Metadata, Name, Parameter, Service, Services, Stack, Target};
use crate::compiler::visitor::{Phase, Visitor};
use crate::diag::{Document, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
    Stack,
    Metadata,
    Target,
    Parameter,
    Dependency,
    Services,
    Service,
}

impl fmt::Display for VisitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VisitKind::Stack => "stack",
            VisitKind::Metadata => "metadata",
            VisitKind::Target => "target",
            VisitKind::Parameter => "parameter",
            VisitKind::Dependency => "dependency",
            VisitKind::Services => "services",
            VisitKind::Service => "service",
        };
        f.write_str(name)
    }
}

/// One visit call as seen by a [`VisitTrace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: VisitKind,
    /// Map key for keyed records, kind tag for metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl fmt::Display for VisitEvent {
    /// Renders as `[label:]kind[ public|private][ key]`, e.g. `pre:service public web`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}:", label)?;
        }
        write!(f, "{}", self.kind)?;
        match self.public {
            Some(true) => write!(f, " public")?,
            Some(false) => write!(f, " private")?,
            None => {}
        }
        if let Some(key) = &self.key {
            write!(f, " {}", key)?;
        }
        Ok(())
    }
}

/// Records every visit it receives, in call order.
///
/// Clones append to the same log, which lets a pre and a post observer share one
/// trace under different labels.
#[derive(Debug, Clone, Default)]
pub struct VisitTrace {
    label: Option<String>,
    events: Arc<Mutex<Vec<VisitEvent>>>,
}

impl VisitTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace whose events carry `label`.
    pub fn labelled(label: impl Into<String>) -> Self {
        VisitTrace { label: Some(label.into()), events: Arc::default() }
    }

    /// Another view onto this trace's log, tagging its events with `label`.
    pub fn sibling(&self, label: impl Into<String>) -> Self {
        VisitTrace { label: Some(label.into()), events: Arc::clone(&self.events) }
    }

    pub fn events(&self) -> Vec<VisitEvent> {
        self.events.lock().clone()
    }

    /// The log rendered one event per line via [`VisitEvent`]'s `Display`.
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, kind: VisitKind, key: Option<&str>, public: Option<bool>) {
        self.events.lock().push(VisitEvent {
            label: self.label.clone(),
            kind,
            key: key.map(str::to_string),
            public,
        });
    }
}

impl Phase for VisitTrace {
    fn diag(&self) -> Option<&dyn Sink> {
        None
    }
}

impl Visitor for VisitTrace {
    fn visit_metadata(&mut self, _doc: &Document, kind: &str, _meta: &mut Metadata) {
        self.record(VisitKind::Metadata, Some(kind), None);
    }

    fn visit_stack(&mut self, _doc: &Document, _stack: &mut Stack) {
        self.record(VisitKind::Stack, None, None);
    }

    fn visit_parameter(&mut self, _doc: &Document, name: &str, _param: &mut Parameter) {
        self.record(VisitKind::Parameter, Some(name), None);
    }

    fn visit_dependency(&mut self, _doc: &Document, name: &Name, _dep: &mut Dependency) {
        self.record(VisitKind::Dependency, Some(name.as_str()), None);
    }

    fn visit_services(&mut self, _doc: &Document, _svcs: &mut Services) {
        self.record(VisitKind::Services, None, None);
    }

    fn visit_service(&mut self, _doc: &Document, name: &Name, public: bool, _svc: &mut Service) {
        self.record(VisitKind::Service, Some(name.as_str()), Some(public));
    }

    fn visit_target(&mut self, _doc: &Document, name: &str, _target: &mut Target) {
        self.record(VisitKind::Target, Some(name), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siblings_share_one_log() {
        let doc = Document::new("Mu.json");
        let mut stack = Stack::default();
        let mut pre = VisitTrace::labelled("pre");
        let mut post = pre.sibling("post");

        pre.visit_stack(&doc, &mut stack);
        post.visit_service(&doc, &Name::from("web"), false, &mut Service::default());

        assert_eq!(pre.lines(), vec!["pre:stack", "post:service private web"]);
        assert_eq!(post.events().len(), 2);

        post.clear();
        assert!(pre.events().is_empty());
        post.visit_stack(&doc, &mut stack);
        assert_eq!(pre.lines(), vec!["post:stack"]);
    }

    #[test]
    fn test_event_serializes_without_empty_fields() {
        let event = VisitEvent { label: None, kind: VisitKind::Parameter, key: Some("port".into()), public: None };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"kind":"parameter","key":"port"}"#
        );
    }
}
