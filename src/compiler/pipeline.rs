use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Direction;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ast::Stack;
use crate::diag::Document;

use super::in_order::InOrderVisitor;
use super::visitor::{Phase, Visitor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("pass '{0}' is already registered")]
    DuplicatePass(String),
    #[error("pass '{pass}' depends on unknown pass '{dependency}'")]
    UnknownDependency { pass: String, dependency: String },
    #[error("pass '{0}' is part of a dependency cycle")]
    Cycle(String),
}

/// A single pass over the stack: an optional pre-order and an optional post-order
/// visitor, plus the ids of passes that must run first.
pub struct Pass<'a> {
    pub id: String,
    pub dependencies: Vec<String>,
    pub pre: Option<&'a mut dyn Visitor>,
    pub post: Option<&'a mut dyn Visitor>,
}

impl<'a> Pass<'a> {
    /// A pass running `visitor` in pre-order.
    pub fn new(id: impl Into<String>, visitor: &'a mut dyn Visitor) -> Self {
        Self::with_hooks(id, Some(visitor), None)
    }

    pub fn with_hooks(
        id: impl Into<String>,
        pre: Option<&'a mut dyn Visitor>,
        post: Option<&'a mut dyn Visitor>,
    ) -> Self {
        Pass { id: id.into(), dependencies: Vec::new(), pre, post }
    }

    /// Requires the pass `id` to run before this one.
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }
}

/// What [`Pipeline::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineReport {
    /// Ids of the passes that ran, in order.
    pub passes: Vec<String>,
    /// The pass whose sink reported errors, if the pipeline stopped early.
    pub halted_at: Option<String>,
}

impl PipelineReport {
    pub fn completed(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// Manages an ordered set of passes over a stack document.
///
/// Passes form a dependency graph and run in topological order; among passes with
/// no ordering constraint between them, registration order wins. Each pass is one
/// full walk of the stack through [`InOrderVisitor`]. A pass whose sink holds
/// errors once its walk finishes stops the pipeline; the engine itself never does.
#[derive(Default)]
pub struct Pipeline<'a> {
    graph: StableGraph<Pass<'a>, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Registration sequence per node. `StableGraph` reuses freed indices, so the
    /// index alone does not reflect registration order.
    sequence: HashMap<NodeIndex, u64>,
    next_seq: u64,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Pipeline { graph: StableGraph::new(), node_indices: HashMap::new(), sequence: HashMap::new(), next_seq: 0 }
    }

    /// Adds a pass. Dependencies are resolved when the pipeline is applied, so
    /// passes may be registered in any order.
    pub fn add_pass(&mut self, pass: Pass<'a>) -> Result<(), PipelineError> {
        if self.node_indices.contains_key(&pass.id) {
            return Err(PipelineError::DuplicatePass(pass.id));
        }
        let id = pass.id.clone();
        let node = self.graph.add_node(pass);
        self.node_indices.insert(id, node);
        self.sequence.insert(node, self.next_seq);
        self.next_seq += 1;
        Ok(())
    }

    /// Removes a pass by id, returning it if it was registered.
    pub fn remove_pass(&mut self, id: &str) -> Option<Pass<'a>> {
        let node = self.node_indices.remove(id)?;
        self.sequence.remove(&node);
        self.graph.remove_node(node)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The ids of all passes in the order [`Pipeline::apply`] would run them.
    pub fn order(&mut self) -> Result<Vec<String>, PipelineError> {
        let order = self.schedule()?;
        Ok(order.into_iter().map(|node| self.graph[node].id.clone()).collect())
    }

    /// Walks `stack` once per pass, in dependency order.
    pub fn apply(&mut self, doc: &Document, stack: &mut Stack) -> Result<PipelineReport, PipelineError> {
        let order = self.schedule()?;
        let mut report = PipelineReport::default();

        for node in order {
            let pass = &mut self.graph[node];
            debug!(pass = %pass.id, "Running pass");

            let mut visitor = InOrderVisitor::new(hook(&mut pass.pre), hook(&mut pass.post));
            visitor.visit_stack(doc, stack);
            report.passes.push(pass.id.clone());

            let errors = visitor.diag().map_or(0, |sink| sink.errors());
            if errors > 0 {
                warn!(pass = %pass.id, errors, "Pass reported errors, stopping pipeline");
                report.halted_at = Some(pass.id.clone());
                break;
            }
        }

        info!(passes = report.passes.len(), completed = report.completed(), "Pipeline finished");
        Ok(report)
    }

    /// Links every pass to its dependencies and returns a topological order that
    /// prefers the earliest registered pass whenever several are ready.
    fn schedule(&mut self) -> Result<Vec<NodeIndex>, PipelineError> {
        self.graph.clear_edges();
        let mut edges = Vec::new();
        for node in self.graph.node_indices() {
            let pass = &self.graph[node];
            for dependency in &pass.dependencies {
                let dep = self.node_indices.get(dependency).ok_or_else(|| {
                    PipelineError::UnknownDependency { pass: pass.id.clone(), dependency: dependency.clone() }
                })?;
                edges.push((*dep, node));
            }
        }
        for (from, to) in edges {
            self.graph.add_edge(from, to, ());
        }

        if let Err(cycle) = toposort(&self.graph, None) {
            return Err(PipelineError::Cycle(self.graph[cycle.node_id()].id.clone()));
        }

        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|node| (node, self.graph.neighbors_directed(node, Direction::Incoming).count()))
            .collect();
        let seq = |node: NodeIndex| self.sequence.get(&node).copied().unwrap_or(u64::MAX);
        let mut ready: BinaryHeap<Reverse<(u64, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| Reverse((seq(*node), *node)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, node))) = ready.pop() {
            order.push(node);
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((seq(next), next)));
                    }
                }
            }
        }
        Ok(order)
    }
}

fn hook<'s>(slot: &'s mut Option<&'_ mut dyn Visitor>) -> Option<&'s mut dyn Visitor> {
    match slot {
        Some(visitor) => Some(&mut **visitor),
        None => None,
    }
}
