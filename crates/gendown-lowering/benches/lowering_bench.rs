//! Lowering Benchmark
//!
//! Measures how long it takes to drive, build and print generator bodies of
//! increasing size.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use gendown_lowering::{
    CodeGenerator, FunctionShape, GlobalNames, IRNode, IRPrinter, Locals, LoweringOptions,
    Operation, ScopeId,
};

fn nothing_bound(_: ScopeId, _: &str) -> bool {
    false
}

/// Drive a body of `loops` loops, each wrapping a try/finally around
/// `yields_per_loop` suspension points.
fn drive(generator: &mut CodeGenerator<'_>, loops: usize, yields_per_loop: usize) {
    for i in 0..loops {
        let head = generator.define_label().unwrap();
        generator.mark_label(head).unwrap();
        generator.begin_continue_block(head, vec![]).unwrap();

        generator.begin_exception_block().unwrap();
        for y in 0..yields_per_loop {
            generator
                .emit(Operation::Statement(IRNode::call(
                    IRNode::id(format!("step{y}")),
                    vec![IRNode::number(i.to_string())],
                )))
                .unwrap();
            generator
                .emit(Operation::Yield(Some(IRNode::id(format!("v{y}")))))
                .unwrap();
        }
        generator.begin_finally_block().unwrap();
        generator
            .emit(Operation::Statement(IRNode::call(IRNode::id("cleanup"), vec![])))
            .unwrap();
        generator.end_exception_block().unwrap();

        generator.emit(Operation::Break(head)).unwrap();
        generator.end_continue_block().unwrap();
    }
}

fn lower(loops: usize, yields_per_loop: usize) -> String {
    let locals = Locals::new(&nothing_bound, ScopeId(0), GlobalNames::new());
    let mut generator = CodeGenerator::generator_function(locals, LoweringOptions::default());
    drive(&mut generator, loops, yields_per_loop);
    let function = generator
        .build_function(FunctionShape::FunctionExpression, None)
        .unwrap();
    IRPrinter::emit_to_string(&function)
}

// =============================================================================
// Lowering Benchmarks
// =============================================================================

/// Benchmark: a single loop with a handful of yields
fn bench_lower_small(c: &mut Criterion) {
    c.bench_function("lower_small", |b| b.iter(|| black_box(lower(1, 4))));
}

/// Benchmark: lowering cost as the number of cases grows
fn bench_lower_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("lowering_scaling");
    for (loops, yields) in [(10, 5), (50, 5), (100, 10)] {
        let output_len = lower(loops, yields).len() as u64;
        group.throughput(Throughput::Bytes(output_len));
        group.bench_with_input(
            BenchmarkId::new("lower", format!("{loops}loops_{yields}yields")),
            &(loops, yields),
            |b, &(loops, yields)| b.iter(|| black_box(lower(loops, yields))),
        );
    }
    group.finish();
}

/// Benchmark: build only, with the operation stream recorded up front
fn bench_build_only(c: &mut Criterion) {
    c.bench_function("build_statements_100_loops", |b| {
        let locals = Locals::new(&nothing_bound, ScopeId(0), GlobalNames::new());
        let mut generator = CodeGenerator::generator_function(locals, LoweringOptions::default());
        drive(&mut generator, 100, 5);
        b.iter(|| black_box(generator.build_statements(true).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_lower_small,
    bench_lower_scaling,
    bench_build_only
);
criterion_main!(benches);
