//! Record types making up a stack document.
//!
//! These are plain data: the loader builds them, passes walk them through
//! [`crate::compiler::visitor::Visitor`], and callers serialize them back out.
//! Name-keyed collections are `HashMap`s and therefore carry no order of their
//! own; the traversal engine imposes one.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compiler::clouds::Arch;

/// A qualified identifier for stacks, services and service types (e.g. `mu/container`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name(name.to_string())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name(name)
    }
}

pub type Targets = HashMap<String, Target>;
pub type Parameters = HashMap<String, Parameter>;
pub type Dependencies = HashMap<Name, Dependency>;
pub type ServiceMap = HashMap<Name, Service>;

/// Descriptive header shared by stacks and other top-level kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Kind tag, e.g. `Stack`. Filled in by the loader when absent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub targets: Targets,
}

/// A named build/deploy target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this target is picked when none is requested explicitly.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub cloud: Arch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

/// The root deployable unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub services: Services,
}

/// A named configurable input to a stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub optional: bool,
}

/// A reference to another stack, by version range and optional source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default = "any_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn any_version() -> String {
    "*".to_string()
}

impl Default for Dependency {
    fn default() -> Self {
        Dependency { version: any_version(), source: None }
    }
}

/// Services of a stack, split by visibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub public: ServiceMap,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub private: ServiceMap,
}

impl Services {
    pub fn len(&self) -> usize {
        self.public.len() + self.private.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A deployable component within a stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Name::is_empty")]
    pub name: Name,
    /// Mirrors which half of [`Services`] owns this service.
    #[serde(skip)]
    pub public: bool,
    #[serde(rename = "type", default)]
    pub ty: Name,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_borrows_as_str() {
        let mut deps = Dependencies::new();
        deps.insert(Name::from("mu/aws"), Dependency::default());
        assert!(deps.contains_key("mu/aws"));
        assert_eq!(Name::from("mu/aws").to_string(), "mu/aws");
    }

    #[test]
    fn test_dependency_default_matches_empty_document() {
        let loaded: Dependency = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, Dependency::default());
        assert_eq!(Dependency::default().version, "*");
    }

    #[test]
    fn test_stack_metadata_is_flattened() {
        let stack: Stack = serde_json::from_str(r#"{
            "name": "web",
            "version": "1.0.0",
            "targets": { "prod": { "cloud": "aws" } },
            "dependencies": { "mu/aws": {} }
        }"#).unwrap();
        assert_eq!(stack.metadata.name.as_str(), "web");
        assert_eq!(stack.metadata.version.as_deref(), Some("1.0.0"));
        assert_eq!(stack.metadata.targets["prod"].cloud, Arch::Aws);
        assert_eq!(stack.dependencies["mu/aws"].version, "*");
        assert!(stack.services.is_empty());
    }
}
