use indoc::indoc;
use stackwalk::compiler::clouds::Arch;
use stackwalk::compiler::transforms::{TargetDefaults, VisitTrace};
use stackwalk::compiler::{Pass, Pipeline, PipelineError};
use stackwalk::diag::{CollectingSink, Severity, Sink};
use stackwalk::loader::parse_stack;

const STACK: &str = indoc! {r#"
    {
        "name": "acmecorp/api",
        "targets": { "prod": {} },
        "parameters": { "replicas": { "type": "number", "default": 3 } },
        "services": { "public": { "api": { "type": "mu/container" } } }
    }
"#};

#[test]
fn test_defaults_then_trace() {
    let _ = stackwalk::logging::init_logger(true, Some("warn"), None);
    let (doc, mut stack) = parse_stack("Mu.json", STACK).unwrap();

    let sink = CollectingSink::new();
    let mut defaults = TargetDefaults::new(Arch::Aws, sink.clone());
    let pre = VisitTrace::labelled("pre");
    let mut pre_trace = pre.clone();
    let mut post_trace = pre.sibling("post");

    let mut pipeline = Pipeline::new();
    pipeline
        .add_pass(Pass::with_hooks("trace", Some(&mut pre_trace), Some(&mut post_trace)).after("defaults"))
        .unwrap();
    pipeline.add_pass(Pass::new("defaults", &mut defaults)).unwrap();

    let report = pipeline.apply(&doc, &mut stack).unwrap();
    drop(pipeline);

    assert!(report.completed());
    assert_eq!(report.passes, vec!["defaults", "trace"]);
    assert_eq!(sink.count(), 0);

    let prod = &stack.metadata.targets["prod"];
    assert_eq!(prod.cloud, Arch::Aws);
    assert!(prod.default);

    let lines = pre.lines();
    assert_eq!(lines.first().map(String::as_str), Some("pre:stack"));
    assert_eq!(lines.last().map(String::as_str), Some("post:stack"));
    assert!(lines.contains(&"post:service public api".to_string()));
}

#[test]
fn test_errors_stop_later_passes() {
    let (doc, mut stack) = parse_stack(
        "Mu.json",
        r#"{ "name": "x", "targets": { "a": { "default": true }, "b": { "default": true } } }"#,
    )
    .unwrap();

    let sink = CollectingSink::new();
    let mut defaults = TargetDefaults::new(Arch::Gcp, sink.clone());
    let mut trace = VisitTrace::new();

    let mut pipeline = Pipeline::new();
    pipeline.add_pass(Pass::new("defaults", &mut defaults)).unwrap();
    pipeline.add_pass(Pass::new("trace", &mut trace).after("defaults")).unwrap();
    let report = pipeline.apply(&doc, &mut stack).unwrap();
    drop(pipeline);

    assert_eq!(report.halted_at.as_deref(), Some("defaults"));
    assert!(trace.events().is_empty());

    // The failing pass still walked the whole stack before the pipeline stopped.
    assert!(stack.metadata.targets.values().all(|t| t.cloud == Arch::Gcp));
    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].file, "Mu.json");
}

#[test]
fn test_unknown_dependency_is_reported_before_walking() {
    let (doc, mut stack) = parse_stack("Mu.json", STACK).unwrap();
    let mut trace = VisitTrace::new();

    let mut pipeline = Pipeline::new();
    pipeline.add_pass(Pass::new("trace", &mut trace).after("bind")).unwrap();
    let err = pipeline.apply(&doc, &mut stack).unwrap_err();
    drop(pipeline);

    assert_eq!(
        err,
        PipelineError::UnknownDependency { pass: "trace".to_string(), dependency: "bind".to_string() }
    );
    assert_eq!(err.to_string(), "pass 'trace' depends on unknown pass 'bind'");
    assert!(trace.events().is_empty());
}
