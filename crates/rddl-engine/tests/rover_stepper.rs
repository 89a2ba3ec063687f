//! Integration test: stepping the rover instances end to end.

use std::sync::Arc;

use proptest::prelude::*;
use rddl_core::{EpochId, EvalError, RandomSource, Value};
use rddl_engine::{ActionError, ConfigError, Phase, StepError, Stepper, StepperConfig};
use rddl_eval::ChaChaSource;
use rddl_model::{ConstraintKind, Model};
use rddl_test_utils::{mars_rover_with_horizon, NoNoise, MARS_ROVER, MARS_ROVER_TRACKED};

fn model(src: &str) -> Arc<Model> {
    let file = rddl_lang::parse(src).unwrap();
    Arc::new(Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0]).unwrap())
}

fn stepper<R: RandomSource>(src: &str, rng: R) -> Stepper<R> {
    Stepper::from_model(model(src), StepperConfig::default(), rng).unwrap()
}

fn moves(dx: f64, dy: f64) -> [(&'static str, Value); 2] {
    [("xMove", Value::Real(dx)), ("yMove", Value::Real(dy))]
}

const SNAP: [(&str, Value); 1] = [("snapPicture", Value::Bool(true))];

#[test]
fn first_step_from_origin() {
    let file = rddl_lang::parse(MARS_ROVER).unwrap();
    let mut s = Stepper::new(
        &file.domains[0],
        &file.non_fluents[0],
        &file.instances[0],
        NoNoise::new(),
    )
    .unwrap();
    assert_eq!(s.phase(), Phase::Initialized);

    let r = s.step_named(&moves(1.0, -1.0)).unwrap();
    assert_eq!(r.reward, 0.0);
    assert_eq!(r.epoch, EpochId(1));
    assert!(!r.terminated);
    assert_eq!(r.state.real("time", &[]), Some(2.0));
    // Zero noise leaves exactly the mean of Normal(1.0, 0.1).
    assert_eq!(r.state.real("xPos", &[]), Some(1.0));
    assert_eq!(r.state.real("yPos", &[]), Some(-1.0));
    assert_eq!(s.phase(), Phase::Stepping);
}

#[test]
fn snapping_inside_a_box_pays_its_value() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    s.step_named(&moves(1.0, 1.0)).unwrap();
    let r = s.step_named(&SNAP).unwrap();
    assert_eq!(r.reward, 10.0);
    assert_eq!(r.state.real("time", &[]), Some(2.25));
    assert_eq!(r.state.real("xPos", &[]), Some(1.0));
    assert_eq!(s.cumulative_reward(), 10.0);
    assert_eq!(s.discounted_return(), 10.0);
}

#[test]
fn snapping_while_moving_is_rejected_without_side_effects() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    let before = s.state_hash();
    let err = s
        .step_named(&[
            ("snapPicture", Value::Bool(true)),
            ("xMove", Value::Real(1.0)),
        ])
        .unwrap_err();
    assert_eq!(
        err,
        StepError::InvalidAction(ActionError::ConstraintViolated {
            kind: ConstraintKind::StateAction,
            index: 0,
        })
    );
    assert_eq!(s.state_hash(), before);
    assert_eq!(s.epoch(), EpochId(0));
    assert_eq!(s.phase(), Phase::Initialized);

    // The stepper stays usable.
    assert!(s.step_named(&SNAP).is_ok());
}

#[test]
fn moves_out_of_bounds_are_rejected() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    let err = s.step_named(&moves(0.0, 5.5)).unwrap_err();
    assert_eq!(
        err,
        StepError::InvalidAction(ActionError::ConstraintViolated {
            kind: ConstraintKind::StateAction,
            index: 2,
        })
    );
}

#[test]
fn malformed_actions_are_rejected() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    assert!(matches!(
        s.step_named(&[("fly", Value::Bool(true))]),
        Err(StepError::InvalidAction(ActionError::UnknownAction { ref name })) if name == "fly"
    ));
    assert!(matches!(
        s.step_named(&[("xPos", Value::Real(3.0))]),
        Err(StepError::InvalidAction(ActionError::NotAnAction { .. }))
    ));
    assert!(matches!(
        s.step_named(&[("snapPicture", Value::Real(1.0))]),
        Err(StepError::InvalidAction(ActionError::WrongType { found: "real", .. }))
    ));
    assert_eq!(s.epoch(), EpochId(0));
}

#[test]
fn repeated_assignments_are_rejected() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    let before = s.state_hash();
    let err = s
        .step_named(&[
            ("snapPicture", Value::Bool(true)),
            ("xMove", Value::Real(1.0)),
            ("snapPicture", Value::Bool(false)),
        ])
        .unwrap_err();
    assert_eq!(
        err,
        StepError::InvalidAction(ActionError::DuplicateAction {
            name: "snapPicture".into()
        })
    );
    assert_eq!(s.epoch(), EpochId(0));
    assert_eq!(s.state_hash(), before);
    // Same value twice is still a repeat.
    assert!(matches!(
        s.step_named(&[("xMove", Value::Real(1.0)), ("xMove", Value::Real(1.0))]),
        Err(StepError::InvalidAction(ActionError::DuplicateAction { .. }))
    ));
}

#[test]
fn integer_actions_promote_to_real() {
    let mut s = stepper(MARS_ROVER, NoNoise::new());
    let r = s.step_named(&[("xMove", Value::Int(2))]).unwrap();
    assert_eq!(r.state.real("xPos", &[]), Some(2.0));
    assert_eq!(r.state.get("xPos", &[]), Some(Value::Real(2.0)));
}

#[test]
fn terminates_after_exactly_the_horizon() {
    let mut s = stepper(&mars_rover_with_horizon(3), NoNoise::new());
    assert_eq!(s.horizon(), 3);
    assert!(!s.step(&[]).unwrap().terminated);
    assert!(!s.step(&[]).unwrap().terminated);
    assert!(s.step(&[]).unwrap().terminated);
    assert!(s.is_terminated());
    assert_eq!(
        s.step(&[]).unwrap_err(),
        StepError::Terminated { epoch: EpochId(3) }
    );
}

#[test]
fn horizon_override() {
    let config = StepperConfig {
        horizon: Some(1),
        ..StepperConfig::default()
    };
    let mut s = Stepper::from_model(model(MARS_ROVER), config, NoNoise::new()).unwrap();
    assert!(s.step(&[]).unwrap().terminated);
}

#[test]
fn reset_restores_the_initial_state() {
    let mut s = stepper(MARS_ROVER, ChaChaSource::seed_from_u64(3));
    let initial = s.state_hash();
    s.step_named(&moves(2.0, 0.5)).unwrap();
    s.step_named(&moves(-1.0, 0.5)).unwrap();
    assert_ne!(s.state_hash(), initial);

    s.reset();
    assert_eq!(s.state_hash(), initial);
    assert_eq!(s.epoch(), EpochId(0));
    assert_eq!(s.phase(), Phase::Initialized);
    assert_eq!(s.cumulative_reward(), 0.0);
    assert_eq!(s.state().real("time", &[]), Some(0.0));
}

#[test]
fn evaluation_errors_terminate_the_stepper() {
    let src = MARS_ROVER.replace("default = 0.1", "default = -0.1");
    let mut s = stepper(&src, NoNoise::new());
    let before = s.state_hash();
    let err = s.step_named(&moves(1.0, 0.0)).unwrap_err();
    assert!(matches!(
        err,
        StepError::Eval(EvalError::DomainOutOfRange { ref operation, .. }) if operation == "Normal"
    ));
    assert!(s.is_terminated());
    assert_eq!(s.state_hash(), before);
    assert!(matches!(s.step(&[]), Err(StepError::Terminated { .. })));
}

#[test]
fn metrics_count_the_work_done() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    s.step_named(&moves(0.5, 0.0)).unwrap();
    let m = s.last_metrics();
    assert_eq!(m.transitions_evaluated, 7);
    assert_eq!(m.derived_evaluated, 4);
    assert_eq!(m.nondefault_actions, 1);
}

// ── Tracked rover ──────────────────────────────────────────────────

#[test]
fn pictures_pay_out_once() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    // Starts at (1, 1), inside p2's box.
    let r = s.step_named(&SNAP).unwrap();
    assert_eq!(r.reward, 10.0);
    assert_eq!(r.state.get("picTaken", &["p2"]), Some(Value::Bool(true)));
    assert_eq!(r.state.get("picTaken", &["p1"]), Some(Value::Bool(false)));

    let r = s.step_named(&SNAP).unwrap();
    assert_eq!(r.reward, 0.0);
    assert_eq!(s.cumulative_reward(), 10.0);
    assert_eq!(s.discounted_return(), 10.0);
}

#[test]
fn discount_weights_later_rewards() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    s.step_named(&moves(0.0, -2.0)).unwrap(); // to (1, -1): p1's box
    let r = s.step_named(&SNAP).unwrap();
    assert_eq!(r.reward, 5.0);
    assert!((s.discounted_return() - 0.9 * 5.0).abs() < 1e-12);
}

#[test]
fn enum_state_follows_the_action() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    let imaging = s.model().registry().object_by_name("@imaging").unwrap();
    let moving = s.model().registry().object_by_name("@moving").unwrap();
    let r = s.step_named(&SNAP).unwrap();
    assert_eq!(r.state.get("phase", &[]), Some(Value::Object(imaging)));
    let r = s.step_named(&moves(1.0, 0.0)).unwrap();
    assert_eq!(r.state.get("phase", &[]), Some(Value::Object(moving)));
}

#[test]
fn max_nondef_actions_is_enforced() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    let err = s
        .step_named(&[
            ("xMove", Value::Real(1.0)),
            ("yMove", Value::Real(1.0)),
            ("snapPicture", Value::Bool(true)),
        ])
        .unwrap_err();
    assert_eq!(
        err,
        StepError::InvalidAction(ActionError::TooManyActions { count: 3, max: 2 })
    );
    // Explicitly setting a default does not count.
    assert!(s
        .step_named(&[
            ("xMove", Value::Real(1.0)),
            ("yMove", Value::Real(1.0)),
            ("snapPicture", Value::Bool(false)),
        ])
        .is_ok());
}

#[test]
fn preconditions_are_checked() {
    let mut s = stepper(MARS_ROVER_TRACKED, NoNoise::new());
    let err = s
        .step_named(&[
            ("snapPicture", Value::Bool(true)),
            ("yMove", Value::Real(1.0)),
        ])
        .unwrap_err();
    assert_eq!(
        err,
        StepError::InvalidAction(ActionError::ConstraintViolated {
            kind: ConstraintKind::Precondition,
            index: 0,
        })
    );
}

#[test]
fn invariant_violations_are_fatal_and_uncommitted() {
    let src = MARS_ROVER_TRACKED.replace("then time + 0.25", "then time - 0.25");
    let mut s = stepper(&src, NoNoise::new());
    let err = s.step_named(&SNAP).unwrap_err();
    assert_eq!(err, StepError::InvariantViolated { index: 0 });
    assert!(s.is_terminated());
    assert_eq!(s.state().real("time", &[]), Some(0.0));
    assert_eq!(s.epoch(), EpochId(0));
}

#[test]
fn initial_state_must_satisfy_invariants() {
    let src = MARS_ROVER_TRACKED.replace("time >= 0.0;", "time >= 1.0;");
    let err = Stepper::from_model(model(&src), StepperConfig::default(), NoNoise::new())
        .err()
        .unwrap();
    assert_eq!(err, ConfigError::InitialInvariantViolated { index: 0 });

    let relaxed = StepperConfig {
        enforce_invariants: false,
        ..StepperConfig::default()
    };
    assert!(Stepper::from_model(model(&src), relaxed, NoNoise::new()).is_ok());
}

#[test]
fn compile_errors_surface_as_config_errors() {
    let src = MARS_ROVER.replace("horizon = 40;", "");
    let file = rddl_lang::parse(&src).unwrap();
    let err = Stepper::new(
        &file.domains[0],
        &file.non_fluents[0],
        &file.instances[0],
        NoNoise::new(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ConfigError::Model(_)));
}

// ── Determinism ────────────────────────────────────────────────────

fn rollout(seed: u64, plan: &[(f64, f64)]) -> Vec<u64> {
    let mut s = stepper(MARS_ROVER, ChaChaSource::seed_from_u64(seed));
    plan.iter()
        .map(|&(dx, dy)| {
            s.step_named(&moves(dx, dy)).unwrap();
            s.state_hash()
        })
        .collect()
}

#[test]
fn different_seeds_give_different_rollouts() {
    let plan = [(1.0, 1.0), (1.0, -1.0)];
    assert_ne!(rollout(1, &plan), rollout(2, &plan));
}

proptest! {
    #[test]
    fn same_seed_same_rollout(
        seed in any::<u64>(),
        plan in prop::collection::vec((-5.0f64..=5.0, -5.0f64..=5.0), 1..8),
    ) {
        prop_assert_eq!(rollout(seed, &plan), rollout(seed, &plan));
    }

    #[test]
    fn time_accumulates_manhattan_distance(
        plan in prop::collection::vec((-5.0f64..=5.0, -5.0f64..=5.0), 1..8),
    ) {
        let mut s = stepper(MARS_ROVER, ChaChaSource::seed_from_u64(0));
        let mut expected = 0.0;
        for &(dx, dy) in &plan {
            expected += dx.abs() + dy.abs();
            s.step_named(&moves(dx, dy)).unwrap();
        }
        let time = s.state().real("time", &[]).unwrap();
        prop_assert!((time - expected).abs() < 1e-9);
    }
}
