//! Criterion micro-benchmarks for model compilation and grounding.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rddl_bench::scaled_rover;
use rddl_model::{cross_product, Model};
use rddl_test_utils::MARS_ROVER;

fn compile(file: &rddl_lang::SourceFile) -> Model {
    Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0]).unwrap()
}

/// Benchmark: Compile and ground the pics3 rover from a parsed file.
fn bench_compile_rover(c: &mut Criterion) {
    let file = rddl_lang::parse(MARS_ROVER).unwrap();
    c.bench_function("compile_rover_pics3", |b| {
        b.iter(|| black_box(compile(black_box(&file))));
    });
}

/// Benchmark: Compile rovers with growing numbers of picture points.
fn bench_compile_scaled(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_rover_scaled");
    for points in [10usize, 100, 1000] {
        let file = rddl_lang::parse(&scaled_rover(points)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(points), &file, |b, file| {
            b.iter(|| black_box(compile(file)));
        });
    }
    group.finish();
}

/// Benchmark: Enumerate all ordered pairs of 100 picture points.
fn bench_cross_product(c: &mut Criterion) {
    let model = compile(&rddl_lang::parse(&scaled_rover(100)).unwrap());
    let ty = model.registry().resolve_type("picture-point", Default::default()).unwrap();
    c.bench_function("cross_product_100x100", |b| {
        b.iter(|| black_box(cross_product(model.registry(), &[ty, ty])));
    });
}

criterion_group!(
    benches,
    bench_compile_rover,
    bench_compile_scaled,
    bench_cross_product
);
criterion_main!(benches);
