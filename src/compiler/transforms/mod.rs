pub mod target_defaults;
pub mod visit_trace;

pub use target_defaults::TargetDefaults;
pub use visit_trace::{VisitEvent, VisitKind, VisitTrace};
