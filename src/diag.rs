//! Document identity and the diagnostics channel observers report through.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, warn};

/// Identifies the source artifact a stack was loaded from.
///
/// Traversal threads a shared reference to this through every visit so that
/// observers can attribute what they report; nothing ever mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file: String,
    pub body: Option<Arc<str>>,
}

impl Document {
    pub fn new(file: impl Into<String>) -> Self {
        Document { file: file.into(), body: None }
    }

    pub fn with_body(file: impl Into<String>, body: impl Into<Arc<str>>) -> Self {
        Document { file: file.into(), body: Some(body.into()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(doc: &Document, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Error, file: doc.file.clone(), message: message.into() }
    }

    pub fn warning(doc: &Document, message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, file: doc.file.clone(), message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.file, self.severity, self.message)
    }
}

/// A reporting channel for diagnostics.
///
/// Reporting takes `&self` so one sink can be shared by several passes.
pub trait Sink {
    fn report(&self, diagnostic: Diagnostic);
    fn errors(&self) -> usize;
    fn warnings(&self) -> usize;

    fn count(&self) -> usize {
        self.errors() + self.warnings()
    }

    /// True when nothing fatal has been reported.
    fn success(&self) -> bool {
        self.errors() == 0
    }
}

/// Keeps every reported diagnostic in arrival order. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    fn tally(&self, severity: Severity) -> usize {
        self.diagnostics.lock().iter().filter(|d| d.severity == severity).count()
    }
}

impl Sink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!(file = %diagnostic.file, "{}", diagnostic.message),
            Severity::Warning => warn!(file = %diagnostic.file, "{}", diagnostic.message),
        }
        self.diagnostics.lock().push(diagnostic);
    }

    fn errors(&self) -> usize {
        self.tally(Severity::Error)
    }

    fn warnings(&self) -> usize {
        self.tally(Severity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let doc = Document::new("Mu.json");
        let sink = CollectingSink::new();
        let shared = sink.clone();
        shared.report(Diagnostic::warning(&doc, "unused parameter 'x'"));
        sink.report(Diagnostic::error(&doc, "missing service type"));

        assert_eq!(sink.count(), 2);
        assert_eq!(shared.errors(), 1);
        assert_eq!(shared.warnings(), 1);
        assert!(!sink.success());
        assert_eq!(
            sink.diagnostics()[1].to_string(),
            "Mu.json: error: missing service type"
        );
    }
}
