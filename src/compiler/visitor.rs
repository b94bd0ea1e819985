use crate::ast::{Dependency, Metadata, Name, Parameter, Service, Services, Stack, Target};
use crate::diag::{Document, Sink};

/// A compiler phase: anything that reports through a diagnostics sink.
pub trait Phase {
    /// The sink this phase reports through, if it has one.
    fn diag(&self) -> Option<&dyn Sink>;
}

/// Provides a visitor pattern for observing and rewriting a stack document.
///
/// Every method receives the [`Document`] being walked and an exclusive borrow of
/// the record, which it may mutate. The borrow ends when the method returns; the
/// traversal engine in [`super::in_order`] stores the record back into its owner
/// before moving on. All methods default to doing nothing, so an implementor only
/// overrides the records it cares about.
///
/// Visit methods are not expected to recurse themselves. Descending into children
/// is the job of [`super::in_order::InOrderVisitor`].
pub trait Visitor: Phase {
    /// Visits the metadata header of a stack (or other kind).
    ///
    /// # Arguments
    /// * doc - The document the metadata was loaded from.
    /// * kind - Kind tag of the owning record, e.g. `Stack`.
    /// * meta - The metadata, including its targets.
    fn visit_metadata(&mut self, _doc: &Document, _kind: &str, _meta: &mut Metadata) {}

    /// Visits the root stack. This is the entry point of a traversal.
    fn visit_stack(&mut self, _doc: &Document, _stack: &mut Stack) {}

    /// Visits a single parameter, keyed by its name in the owning stack.
    fn visit_parameter(&mut self, _doc: &Document, _name: &str, _param: &mut Parameter) {}

    /// Visits a single dependency, keyed by the name of the stack depended on.
    fn visit_dependency(&mut self, _doc: &Document, _name: &Name, _dep: &mut Dependency) {}

    /// Visits the services container of a stack.
    fn visit_services(&mut self, _doc: &Document, _svcs: &mut Services) {}

    /// Visits a single service.
    ///
    /// # Arguments
    /// * doc - The document the service was loaded from.
    /// * name - The service's key in its owning map.
    /// * public - Whether the service lives in the public half of [`Services`].
    /// * svc - The service.
    fn visit_service(&mut self, _doc: &Document, _name: &Name, _public: bool, _svc: &mut Service) {}

    /// Visits a single target, keyed by its name in the owning metadata.
    fn visit_target(&mut self, _doc: &Document, _name: &str, _target: &mut Target) {}
}
