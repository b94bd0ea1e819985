//! Benchmarks for ordered stack traversal
//!
//! Measures the cost of sorting keys and writing records back for stacks of
//! increasing width, with a no-op observer and with a pre/post pair.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use stackwalk::ast::{Dependency, Name, Parameter, Service, Stack, Target};
use stackwalk::compiler::transforms::VisitTrace;
use stackwalk::compiler::{walk, walk_with, Phase, Visitor};
use stackwalk::diag::{Document, Sink};

/// Observer that overrides nothing.
struct Noop;

impl Phase for Noop {
    fn diag(&self) -> Option<&dyn Sink> {
        None
    }
}

impl Visitor for Noop {}

/// A stack with `width` entries in every name-keyed collection.
fn wide_stack(width: usize) -> Stack {
    let mut stack = Stack::default();
    stack.metadata.name = Name::from("bench/wide");
    for i in 0..width {
        stack.metadata.targets.insert(format!("target-{:05}", i), Target::default());
        stack.parameters.insert(format!("param-{:05}", i), Parameter::default());
        stack.dependencies.insert(Name::new(format!("dep/{:05}", i)), Dependency::default());
        stack.services.public.insert(Name::new(format!("pub-{:05}", i)), Service::default());
        stack.services.private.insert(Name::new(format!("priv-{:05}", i)), Service::default());
    }
    stack
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");
    let doc = Document::new("bench.json");

    for width in [10, 100, 1_000] {
        let mut stack = wide_stack(width);

        group.bench_with_input(BenchmarkId::new("noop", width), &width, |b, _| {
            b.iter(|| walk(&doc, black_box(&mut stack), &mut Noop))
        });

        group.bench_with_input(BenchmarkId::new("pre_post_trace", width), &width, |b, _| {
            b.iter(|| {
                let mut pre = VisitTrace::labelled("pre");
                let mut post = pre.sibling("post");
                walk_with(&doc, black_box(&mut stack), Some(&mut pre), Some(&mut post));
                black_box(pre.events().len())
            })
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_walk
}

criterion_main!(benches);
