//! Module for generating random stack documents for property-based testing.
//!
//! `StackDoc` describes a stack with every name-keyed collection populated from
//! generated, duplicate-free keys. It renders to the JSON accepted by the stack
//! loader, and can report the key order a deterministic walk must produce.
//!
//! Keys mix upper case, lower case, digits and punctuation so that byte-wise
//! ordering differs from case-insensitive or locale-aware ordering.

use std::collections::BTreeSet;

use quickcheck::{Arbitrary, Gen};
use serde_json::{json, Map, Value};

/// Upper bound on entries per generated collection.
const MAX_ENTRIES: usize = 8;

const CLOUDS: &[&str] = &["", "aws", "gcp", "azure", "vmware"];
const PARAM_TYPES: &[&str] = &["string", "number", "bool", "mu/container"];
const SERVICE_TYPES: &[&str] = &["mu/container", "mu/aws/rds", "mu/autoscaler", "acmecorp/cache"];

#[derive(Clone, Debug)]
pub struct TargetDoc {
    pub cloud: &'static str,
    pub default: bool,
}

#[derive(Clone, Debug)]
pub struct ParameterDoc {
    pub ty: &'static str,
    pub default: Option<i64>,
    pub optional: bool,
}

/// A randomly generated stack document.
#[derive(Clone, Debug)]
pub struct StackDoc {
    pub name: String,
    pub targets: Vec<(String, TargetDoc)>,
    pub parameters: Vec<(String, ParameterDoc)>,
    pub dependencies: Vec<(String, String)>,
    pub public: Vec<(String, &'static str)>,
    pub private: Vec<(String, &'static str)>,
}

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: usize, max: usize) -> usize {
    min + (usize::arbitrary(g) % (max - min + 1))
}

/// Generates a random key: a letter or underscore followed by letters, digits, `-` and `_`.
fn gen_key(g: &mut Gen) -> String {
    let starters: Vec<char> = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_".chars().collect();
    let continuers: Vec<char> = "abcdABCD0123456789-_".chars().collect();
    let len = gen_range(g, 1, 6);
    let mut key = String::new();
    key.push(*g.choose(&starters).unwrap());
    for _ in 1..len {
        key.push(*g.choose(&continuers).unwrap());
    }
    key
}

/// Generates up to `MAX_ENTRIES` distinct keys, in generation (not sorted) order.
fn gen_keys(g: &mut Gen, qualified: bool) -> Vec<String> {
    let max = g.size().min(MAX_ENTRIES);
    let count = gen_range(g, 0, max);
    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        let key = if qualified && bool::arbitrary(g) {
            format!("{}/{}", gen_key(g), gen_key(g))
        } else {
            gen_key(g)
        };
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    keys
}

/// Generates a semver-ish version constraint.
fn gen_version(g: &mut Gen) -> String {
    const OPS: &[&str] = &["", ">=", "^", "~"];
    format!(
        "{}{}.{}.{}",
        g.choose(OPS).unwrap(),
        u8::arbitrary(g) % 4,
        u8::arbitrary(g) % 10,
        u8::arbitrary(g) % 10
    )
}

impl Arbitrary for StackDoc {
    fn arbitrary(g: &mut Gen) -> Self {
        let targets = gen_keys(g, false)
            .into_iter()
            .map(|key| {
                let target = TargetDoc { cloud: *g.choose(CLOUDS).unwrap(), default: bool::arbitrary(g) };
                (key, target)
            })
            .collect();
        let parameters = gen_keys(g, false)
            .into_iter()
            .map(|key| {
                let param = ParameterDoc {
                    ty: *g.choose(PARAM_TYPES).unwrap(),
                    default: Option::<i64>::arbitrary(g).map(|v| v % 1000),
                    optional: bool::arbitrary(g),
                };
                (key, param)
            })
            .collect();
        let dependencies = gen_keys(g, true).into_iter().map(|key| (key, gen_version(g))).collect();
        let public = gen_keys(g, false).into_iter().map(|key| (key, *g.choose(SERVICE_TYPES).unwrap())).collect();
        let private = gen_keys(g, false).into_iter().map(|key| (key, *g.choose(SERVICE_TYPES).unwrap())).collect();

        StackDoc { name: format!("acmecorp/{}", gen_key(g)), targets, parameters, dependencies, public, private }
    }
}

fn sorted<T>(entries: &[(String, T)]) -> Vec<String> {
    let mut keys: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
    keys.sort();
    keys
}

impl StackDoc {
    /// Renders the document as stack JSON.
    pub fn to_json(&self) -> String {
        let targets: Map<String, Value> = self
            .targets
            .iter()
            .map(|(key, t)| (key.clone(), json!({ "cloud": t.cloud, "default": t.default })))
            .collect();
        let parameters: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(key, p)| {
                let mut param = json!({ "type": p.ty, "optional": p.optional });
                if let Some(default) = p.default {
                    param["default"] = json!(default);
                }
                (key.clone(), param)
            })
            .collect();
        let dependencies: Map<String, Value> = self
            .dependencies
            .iter()
            .map(|(key, version)| (key.clone(), json!({ "version": version })))
            .collect();
        let services = |entries: &[(String, &'static str)]| -> Map<String, Value> {
            entries.iter().map(|(key, ty)| (key.clone(), json!({ "type": ty }))).collect()
        };

        json!({
            "name": self.name,
            "version": "0.1.0",
            "targets": targets,
            "parameters": parameters,
            "dependencies": dependencies,
            "services": { "public": services(&self.public), "private": services(&self.private) },
        })
        .to_string()
    }

    /// Every `kind key` line a pre-order walk visits, in the order it must visit them.
    pub fn expected_visits(&self) -> Vec<String> {
        let mut visits = vec!["stack".to_string(), "metadata Stack".to_string()];
        visits.extend(sorted(&self.targets).into_iter().map(|k| format!("target {}", k)));
        visits.extend(sorted(&self.parameters).into_iter().map(|k| format!("parameter {}", k)));
        visits.extend(sorted(&self.dependencies).into_iter().map(|k| format!("dependency {}", k)));
        visits.push("services".to_string());
        visits.extend(sorted(&self.public).into_iter().map(|k| format!("service public {}", k)));
        visits.extend(sorted(&self.private).into_iter().map(|k| format!("service private {}", k)));
        visits
    }

    pub fn entry_count(&self) -> usize {
        self.targets.len() + self.parameters.len() + self.dependencies.len() + self.public.len() + self.private.len()
    }
}
