//! Deterministic traversal of a stack document.
//!
//! Name-keyed collections are `HashMap`s whose iteration order changes from run to
//! run. [`InOrderVisitor`] never iterates them directly: it materializes the keys,
//! sorts them byte-wise, and for each key takes the record out of its map, hands it
//! to the observers, and inserts it back under the same key before touching the
//! next one. Write-back is unconditional, whether or not an observer changed
//! anything.
//!
//! The order of a walk is:
//!
//! ```text
//! stack (pre)
//!   metadata "Stack" (pre)
//!     targets, sorted
//!   metadata (post)
//!   parameters, sorted
//!   dependencies, sorted
//!   services (pre)
//!     public services, sorted
//!     private services, sorted
//!   services (post)
//! stack (post)
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::ast::{Dependency, Metadata, Name, Parameter, Service, Services, Stack, Target};
use crate::diag::{Document, Sink};

use super::visitor::{Phase, Visitor};

/// Kind tag passed to [`Visitor::visit_metadata`] for a stack's header.
pub const STACK_KIND: &str = "Stack";

/// Walks a stack in a fixed order, deferring to an optional `pre` visitor before a
/// record's children are visited and an optional `post` visitor after.
///
/// Either side may be absent. The composite is itself a [`Visitor`], so the
/// observers never need to know about each other or about traversal order.
pub struct InOrderVisitor<'a> {
    pre: Option<&'a mut dyn Visitor>,
    post: Option<&'a mut dyn Visitor>,
}

impl<'a> InOrderVisitor<'a> {
    pub fn new(pre: Option<&'a mut dyn Visitor>, post: Option<&'a mut dyn Visitor>) -> Self {
        InOrderVisitor { pre, post }
    }

    /// A walk that only runs pre-order hooks.
    pub fn pre(visitor: &'a mut dyn Visitor) -> Self {
        Self::new(Some(visitor), None)
    }

    /// A walk that only runs post-order hooks.
    pub fn post(visitor: &'a mut dyn Visitor) -> Self {
        Self::new(None, Some(visitor))
    }

    fn before(&mut self) -> Option<&mut (dyn Visitor + 'a)> {
        self.pre.as_deref_mut()
    }

    fn after(&mut self) -> Option<&mut (dyn Visitor + 'a)> {
        self.post.as_deref_mut()
    }
}

impl Phase for InOrderVisitor<'_> {
    fn diag(&self) -> Option<&dyn Sink> {
        if let Some(pre) = self.pre.as_deref() {
            return pre.diag();
        }
        if let Some(post) = self.post.as_deref() {
            return post.diag();
        }
        None
    }
}

impl Visitor for InOrderVisitor<'_> {
    fn visit_metadata(&mut self, doc: &Document, kind: &str, meta: &mut Metadata) {
        if let Some(pre) = self.before() {
            pre.visit_metadata(doc, kind, meta);
        }

        visit_sorted(&mut meta.targets, |name, target| self.visit_target(doc, name, target));

        if let Some(post) = self.after() {
            post.visit_metadata(doc, kind, meta);
        }
    }

    fn visit_stack(&mut self, doc: &Document, stack: &mut Stack) {
        debug!(
            file = %doc.file,
            stack = %stack.metadata.name,
            parameters = stack.parameters.len(),
            dependencies = stack.dependencies.len(),
            services = stack.services.len(),
            "Visiting stack"
        );

        if let Some(pre) = self.before() {
            pre.visit_stack(doc, stack);
        }

        self.visit_metadata(doc, STACK_KIND, &mut stack.metadata);
        visit_sorted(&mut stack.parameters, |name, param| self.visit_parameter(doc, name, param));
        visit_sorted(&mut stack.dependencies, |name, dep| self.visit_dependency(doc, name, dep));
        self.visit_services(doc, &mut stack.services);

        if let Some(post) = self.after() {
            post.visit_stack(doc, stack);
        }
    }

    fn visit_parameter(&mut self, doc: &Document, name: &str, param: &mut Parameter) {
        trace!(name, "Visiting parameter");
        if let Some(pre) = self.before() {
            pre.visit_parameter(doc, name, param);
        }
        if let Some(post) = self.after() {
            post.visit_parameter(doc, name, param);
        }
    }

    fn visit_dependency(&mut self, doc: &Document, name: &Name, dep: &mut Dependency) {
        trace!(%name, "Visiting dependency");
        if let Some(pre) = self.before() {
            pre.visit_dependency(doc, name, dep);
        }
        if let Some(post) = self.after() {
            post.visit_dependency(doc, name, dep);
        }
    }

    fn visit_services(&mut self, doc: &Document, svcs: &mut Services) {
        if let Some(pre) = self.before() {
            pre.visit_services(doc, svcs);
        }

        // Every public service is written back before the first private one is visited.
        visit_sorted(&mut svcs.public, |name, svc| self.visit_service(doc, name, true, svc));
        visit_sorted(&mut svcs.private, |name, svc| self.visit_service(doc, name, false, svc));

        if let Some(post) = self.after() {
            post.visit_services(doc, svcs);
        }
    }

    fn visit_service(&mut self, doc: &Document, name: &Name, public: bool, svc: &mut Service) {
        trace!(%name, public, "Visiting service");
        if let Some(pre) = self.before() {
            pre.visit_service(doc, name, public, svc);
        }
        if let Some(post) = self.after() {
            post.visit_service(doc, name, public, svc);
        }
    }

    fn visit_target(&mut self, doc: &Document, name: &str, target: &mut Target) {
        trace!(name, "Visiting target");
        if let Some(pre) = self.before() {
            pre.visit_target(doc, name, target);
        }
        if let Some(post) = self.after() {
            post.visit_target(doc, name, target);
        }
    }
}

/// Visits every entry of `map` in ascending key order, storing each value back
/// under its key as soon as `visit` returns.
fn visit_sorted<K, V>(map: &mut HashMap<K, V>, mut visit: impl FnMut(&K, &mut V))
where
    K: Ord + Hash + Clone,
{
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort_unstable();
    for key in keys {
        if let Some(mut value) = map.remove(&key) {
            visit(&key, &mut value);
            map.insert(key, value);
        }
    }
}

/// Walks `stack` with a single observer, running its hooks in pre-order.
pub fn walk(doc: &Document, stack: &mut Stack, observer: &mut dyn Visitor) {
    InOrderVisitor::pre(observer).visit_stack(doc, stack);
}

/// Walks `stack` with an optional pre-order and an optional post-order observer.
pub fn walk_with<'a>(
    doc: &Document,
    stack: &mut Stack,
    pre: Option<&'a mut dyn Visitor>,
    post: Option<&'a mut dyn Visitor>,
) {
    InOrderVisitor::new(pre, post).visit_stack(doc, stack);
}
