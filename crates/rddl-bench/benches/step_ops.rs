//! Criterion micro-benchmarks for evaluation and stepping.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rddl_bench::{rover_plan, scaled_rover};
use rddl_core::Value;
use rddl_engine::{Stepper, StepperConfig};
use rddl_eval::{ChaChaSource, Evaluator};
use rddl_model::Model;
use rddl_test_utils::{NoNoise, MARS_ROVER};

fn model(src: &str) -> Arc<Model> {
    let file = rddl_lang::parse(src).unwrap();
    Arc::new(Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0]).unwrap())
}

/// Benchmark: One full 40-epoch episode of the pics3 rover.
fn bench_rover_episode(c: &mut Criterion) {
    let model = model(MARS_ROVER);
    let plan = rover_plan(42, 40);
    let mut stepper =
        Stepper::from_model(model, StepperConfig::default(), ChaChaSource::seed_from_u64(42))
            .unwrap();
    c.bench_function("rover_episode_40", |b| {
        b.iter(|| {
            stepper.reset();
            for actions in &plan {
                black_box(stepper.step_named(actions).unwrap().reward);
            }
        });
    });
}

/// Benchmark: Single steps with growing numbers of picture points.
fn bench_step_scaled(c: &mut Criterion) {
    let mut group = c.benchmark_group("rover_step_scaled");
    for points in [10usize, 100, 1000] {
        let mut stepper = Stepper::from_model(
            model(&scaled_rover(points)),
            StepperConfig::default(),
            NoNoise::new(),
        )
        .unwrap();
        let snap = stepper.ground_id("snapPicture").unwrap();
        group.bench_function(BenchmarkId::from_parameter(points), |b| {
            b.iter(|| {
                if stepper.is_terminated() {
                    stepper.reset();
                }
                black_box(stepper.step(&[(snap, Value::Bool(true))]).unwrap().reward);
            });
        });
    }
    group.finish();
}

/// Benchmark: Evaluate the reward expression against the initial state.
fn bench_reward_eval(c: &mut Criterion) {
    let model = model(&scaled_rover(100));
    let mut env = model.initial_valuation().clone();
    for id in model.ids_of_class(rddl_core::FluentClass::ActionFluent) {
        env.set(id, model.default_of(id).unwrap());
    }
    let snap = model.ground("snapPicture", &[]).unwrap();
    env.set(snap, Value::Bool(true));
    let reward = model.reward().unwrap();
    let ev = Evaluator::new(&model);
    let mut rng = NoNoise::new();
    c.bench_function("reward_eval_100_points", |b| {
        b.iter(|| black_box(ev.evaluate_real(reward, &[], &env, &mut rng).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_rover_episode,
    bench_step_scaled,
    bench_reward_eval
);
criterion_main!(benches);
