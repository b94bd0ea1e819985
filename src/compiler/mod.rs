pub mod clouds;
pub mod in_order;
pub mod pipeline;
pub mod transforms;
pub mod visitor;

pub use in_order::{walk, walk_with, InOrderVisitor};
pub use pipeline::{Pass, Pipeline, PipelineError, PipelineReport};
pub use visitor::{Phase, Visitor};
