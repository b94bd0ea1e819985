use tracing::debug;

use crate::ast::{Metadata, Target};
use crate::compiler::clouds::Arch;
use crate::compiler::visitor::{Phase, Visitor};
use crate::diag::{CollectingSink, Diagnostic, Document, Sink};

/// Fills in target settings a stack left implicit.
///
/// - A target without a cloud gets `arch`, or a warning when `arch` is [`Arch::None`].
/// - A target without a name takes its key.
/// - A stack with exactly one target makes it the default; more than one default
///   is an error.
#[derive(Debug, Clone)]
pub struct TargetDefaults {
    arch: Arch,
    sink: CollectingSink,
}

impl TargetDefaults {
    pub fn new(arch: Arch, sink: CollectingSink) -> Self {
        TargetDefaults { arch, sink }
    }
}

impl Phase for TargetDefaults {
    fn diag(&self) -> Option<&dyn Sink> {
        Some(&self.sink)
    }
}

impl Visitor for TargetDefaults {
    fn visit_metadata(&mut self, doc: &Document, kind: &str, meta: &mut Metadata) {
        let mut defaults: Vec<&str> = meta
            .targets
            .iter()
            .filter(|(_, target)| target.default)
            .map(|(name, _)| name.as_str())
            .collect();
        defaults.sort_unstable();

        if defaults.len() > 1 {
            self.sink.report(Diagnostic::error(
                doc,
                format!("{} '{}' has multiple default targets: {}", kind, meta.name, defaults.join(", ")),
            ));
        } else if defaults.is_empty() && meta.targets.len() == 1 {
            if let Some((name, target)) = meta.targets.iter_mut().next() {
                debug!(name = %name, "Marking sole target as default");
                target.default = true;
            }
        }
    }

    fn visit_target(&mut self, doc: &Document, name: &str, target: &mut Target) {
        if target.name.is_empty() {
            target.name = name.to_string();
        }
        if target.cloud.is_none() {
            if self.arch.is_none() {
                self.sink.report(Diagnostic::warning(
                    doc,
                    format!("target '{}' has no cloud architecture", name),
                ));
            } else {
                debug!(name, arch = %self.arch, "Defaulting target cloud");
                target.cloud = self.arch;
            }
        }
    }
}
