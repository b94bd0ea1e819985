//! Reads stack documents from JSON.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::ast::{ServiceMap, Stack};
use crate::compiler::in_order::STACK_KIND;
use crate::diag::Document;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{file}: malformed stack document: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the stack document at `path`.
pub fn load_stack(path: &Path) -> Result<(Document, Stack), LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    parse_stack(&path.display().to_string(), &text)
}

/// Parses a stack document held in memory, attributing it to `file`.
///
/// Fields the document may leave implicit are derived from where they sit: the
/// metadata kind becomes `Stack`, and parameters, targets and services take their
/// names from their keys. A service's visibility always follows the section it is
/// listed under.
pub fn parse_stack(file: &str, text: &str) -> Result<(Document, Stack), LoadError> {
    let mut stack: Stack =
        serde_json::from_str(text).map_err(|source| LoadError::Json { file: file.to_string(), source })?;

    if stack.metadata.kind.is_empty() {
        stack.metadata.kind = STACK_KIND.to_string();
    }
    for (name, target) in stack.metadata.targets.iter_mut() {
        if target.name.is_empty() {
            target.name = name.clone();
        }
    }
    for (name, param) in stack.parameters.iter_mut() {
        if param.name.is_empty() {
            param.name = name.clone();
        }
    }
    name_services(&mut stack.services.public, true);
    name_services(&mut stack.services.private, false);

    debug!(
        file,
        stack = %stack.metadata.name,
        parameters = stack.parameters.len(),
        dependencies = stack.dependencies.len(),
        services = stack.services.len(),
        "Loaded stack"
    );
    Ok((Document::with_body(file, text), stack))
}

fn name_services(services: &mut ServiceMap, public: bool) {
    for (name, svc) in services.iter_mut() {
        if svc.name.is_empty() {
            svc.name = name.clone();
        }
        svc.public = public;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::clouds::Arch;
    use indoc::indoc;
    use std::io::Write;

    const STACK: &str = indoc! {r#"
        {
            "name": "acmecorp/web",
            "version": "0.1.0",
            "targets": { "prod": { "cloud": "aws", "default": true } },
            "parameters": { "port": { "type": "number", "default": 80 } },
            "dependencies": { "mu/aws": { "version": ">=1.0" } },
            "services": {
                "public": { "frontend": { "type": "mu/container" } },
                "private": { "db": { "name": "database", "type": "mu/aws/rds" } }
            }
        }
    "#};

    #[test]
    fn test_parse_fills_implicit_fields() {
        let (doc, stack) = parse_stack("Mu.json", STACK).unwrap();
        assert_eq!(doc.file, "Mu.json");
        assert!(doc.body.is_some());
        assert_eq!(stack.metadata.kind, "Stack");
        assert_eq!(stack.metadata.targets["prod"].name, "prod");
        assert_eq!(stack.metadata.targets["prod"].cloud, Arch::Aws);
        assert_eq!(stack.parameters["port"].name, "port");
        assert_eq!(stack.parameters["port"].ty, "number");
        assert_eq!(stack.dependencies["mu/aws"].version, ">=1.0");

        let frontend = &stack.services.public["frontend"];
        assert_eq!(frontend.name.as_str(), "frontend");
        assert!(frontend.public);
        let db = &stack.services.private["db"];
        assert_eq!(db.name.as_str(), "database");
        assert!(!db.public);
    }

    #[test]
    fn test_parse_reports_malformed_json() {
        let err = parse_stack("Mu.json", "{ \"parameters\": [] }").unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        assert!(err.to_string().starts_with("Mu.json: malformed stack document"));
    }

    #[test]
    fn test_parse_rejects_unknown_cloud() {
        let err = parse_stack("Mu.json", r#"{ "targets": { "x": { "cloud": "openstack" } } }"#).unwrap_err();
        assert!(err.to_string().contains("unknown cloud architecture 'openstack'"));
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STACK.as_bytes()).unwrap();
        let (doc, stack) = load_stack(file.path()).unwrap();
        assert_eq!(doc.file, file.path().display().to_string());
        assert_eq!(stack.metadata.name.as_str(), "acmecorp/web");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_stack(&dir.path().join("Mu.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
