//! Integration test: compiling and grounding the rover fixtures.

use proptest::prelude::*;
use rddl_core::{FluentClass, ModelError, Value, ValueType};
use rddl_model::{ConstraintKind, Model};
use rddl_test_utils::{MARS_ROVER, MARS_ROVER_TRACKED};

fn compile(src: &str) -> Model {
    let file = rddl_lang::parse(src).unwrap();
    Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0])
        .unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn rover_grounds_every_variable() {
    let model = compile(MARS_ROVER);
    assert_eq!(model.domain_name(), "simple_mars_rover");
    assert_eq!(model.non_fluents_name(), "pics3");
    assert_eq!(model.grounding().len(), 20);
    assert_eq!(model.transitions().len(), 3);
    assert!(model.derived().is_empty());
    assert_eq!(model.constraints().len(), 3);
    assert!(model
        .constraints()
        .iter()
        .all(|c| c.kind == ConstraintKind::StateAction));
    assert_eq!(model.reward().map(|r| r.ty), Some(ValueType::Real));
    assert_eq!(model.config().horizon, 40);
    assert_eq!(model.config().discount, 1.0);
    assert_eq!(model.config().max_nondef_actions, None);
}

#[test]
fn rover_grounding_order_is_declaration_then_objects() {
    let model = compile(MARS_ROVER);
    let names: Vec<String> = model
        .grounding()
        .iter()
        .map(|(id, _)| model.ground_name(id))
        .collect();
    assert_eq!(
        &names[..5],
        &["MAX_TIME", "MOVE_VARIANCE_MULT", "PICT_XPOS(p1)", "PICT_XPOS(p2)", "PICT_XPOS(p3)"]
    );
    assert_eq!(names.last().map(String::as_str), Some("snapPicture"));
}

#[test]
fn rover_initial_valuation_applies_overrides_over_defaults() {
    let model = compile(MARS_ROVER);
    let init = model.initial_valuation();
    let value = |name: &str, args: &[&str]| init.get(model.ground(name, args).unwrap());

    assert_eq!(value("PICT_VALUE", &["p2"]), Some(Value::Real(10.0)));
    assert_eq!(value("PICT_ERROR_ALLOW", &["p1"]), Some(Value::Real(0.5)));
    assert_eq!(value("PICT_YPOS", &["p3"]), Some(Value::Real(-1.0)));
    assert_eq!(value("MAX_TIME", &[]), Some(Value::Real(12.0)));
    assert_eq!(value("xPos", &[]), Some(Value::Real(0.0)));
    // Actions are supplied per epoch, not stored in the initial state.
    assert_eq!(value("xMove", &[]), None);
    assert_eq!(
        model.default_of(model.ground("snapPicture", &[]).unwrap()),
        Some(Value::Bool(false))
    );
}

#[test]
fn tracked_rover_orders_derived_fluents() {
    let model = compile(MARS_ROVER_TRACKED);
    let derived: Vec<String> = model
        .derived()
        .iter()
        .map(|g| model.ground_name(g.target))
        .collect();
    assert_eq!(derived, vec!["inBox(p1)", "inBox(p2)", "inBox(p3)", "boxCount"]);
    assert_eq!(model.transitions().len(), 7);
    assert_eq!(model.constraints().len(), 1);
    assert_eq!(model.constraints()[0].kind, ConstraintKind::Precondition);
    assert_eq!(model.invariants().len(), 1);
    assert_eq!(model.config().max_nondef_actions, Some(2));
    assert_eq!(model.config().discount, 0.9);
}

#[test]
fn tracked_rover_init_state_and_enums() {
    let model = compile(MARS_ROVER_TRACKED);
    let init = model.initial_valuation();
    let x = model.ground("xPos", &[]).unwrap();
    assert_eq!(init.get(x), Some(Value::Real(1.0)));
    let taken = model.ground("picTaken", &["p1"]).unwrap();
    assert_eq!(init.get(taken), Some(Value::Bool(false)));
    let phase = model.ground("phase", &[]).unwrap();
    let idle = model.registry().object_by_name("@idle").unwrap();
    assert_eq!(init.get(phase), Some(Value::Object(idle)));
    assert_eq!(model.class_of(phase), Some(FluentClass::StateFluent));
}

#[test]
fn ground_cpf_bindings_match_their_targets() {
    let model = compile(MARS_ROVER_TRACKED);
    for g in model.derived().iter().chain(model.transitions()) {
        let inst = model.grounding().get(g.target).unwrap();
        assert_eq!(inst.args, g.bindings);
        assert_eq!(model.cpfs()[g.cpf].target, inst.var);
    }
}

#[test]
fn instance_objects_extend_the_non_fluents_objects() {
    let src = MARS_ROVER.replace(
        "init-state {",
        "objects { picture-point : {p4}; };\n    init-state {",
    );
    let model = compile(&src);
    assert!(model.ground("PICT_XPOS", &["p4"]).is_some());
    assert_eq!(model.grounding().len(), 24);
}

#[test]
fn errors_in_rover_variants_are_all_reported() {
    let src = MARS_ROVER
        .replace("PICT_VALUE(p2) = 10.0;", "PICT_VALUE(p9) = 10.0;")
        .replace("xPos' = Normal", "xPos' = Normal(xPos, true) + Normal");
    let file = rddl_lang::parse(&src).unwrap();
    let errs = Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0])
        .unwrap_err();
    assert_eq!(errs.len(), 2, "{errs}");
    assert!(matches!(errs.errors()[0], ModelError::TypeMismatch { .. }));
    assert!(matches!(errs.errors()[1], ModelError::UnknownObject { ref name, .. } if name == "p9"));
}

#[test]
fn invariants_may_not_read_actions_or_derived_fluents() {
    for (invariant, name, class) in [
        ("boxCount >= 0;", "boxCount", FluentClass::DerivedFluent),
        ("~snapPicture | (time >= 0.0);", "snapPicture", FluentClass::ActionFluent),
    ] {
        let src = MARS_ROVER_TRACKED.replace("time >= 0.0;", invariant);
        let file = rddl_lang::parse(&src).unwrap();
        let errs = Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0])
            .unwrap_err();
        assert_eq!(errs.len(), 1, "{errs}");
        match &errs.errors()[0] {
            ModelError::InvalidReference {
                name: found,
                class: found_class,
                context,
                ..
            } => {
                assert_eq!(found, name);
                assert_eq!(*found_class, class);
                assert_eq!(*context, "state-invariants");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

fn counting_model(points: usize, modes: usize) -> String {
    let objects: Vec<String> = (0..points).map(|i| format!("q{i}")).collect();
    let literals: Vec<String> = (0..modes).map(|i| format!("@m{i}")).collect();
    format!(
        "domain counting {{
            types {{ pt : object; mode : {{{literals}}}; }};
            pvariables {{
                seen(pt, mode) : {{ state-fluent, bool, default = false }};
                W(pt)          : {{ non-fluent, int, default = 1 }};
            }};
            cpfs {{ seen'(?p, ?m) = ~seen(?p, ?m); }};
            reward = sum_{{?p : pt}} W(?p);
        }}
        non-fluents nf {{ domain = counting; objects {{ pt : {{{objects}}}; }}; }}
        instance inst {{ domain = counting; non-fluents = nf; horizon = 2; }}",
        literals = literals.join(", "),
        objects = objects.join(", "),
    )
}

proptest! {
    #[test]
    fn grounding_covers_the_cross_product(points in 1usize..6, modes in 1usize..4) {
        let model = compile(&counting_model(points, modes));
        prop_assert_eq!(model.grounding().len(), points * modes + points);
        prop_assert_eq!(model.transitions().len(), points * modes);
    }

    #[test]
    fn compiling_twice_grounds_identically(points in 1usize..6, modes in 1usize..4) {
        let src = counting_model(points, modes);
        let a = compile(&src);
        let b = compile(&src);
        let names = |m: &Model| -> Vec<String> {
            m.grounding().iter().map(|(id, _)| m.ground_name(id)).collect()
        };
        prop_assert_eq!(names(&a), names(&b));
        prop_assert_eq!(a.initial_valuation(), b.initial_valuation());
    }
}

#[test]
fn standalone_expressions_resolve_against_the_model() {
    let model = compile(MARS_ROVER);
    let expr = rddl_lang::parse_expr("sum_{?p : picture-point} [PICT_VALUE(?p)]").unwrap();
    assert_eq!(model.resolve_expr(&expr).unwrap().ty, ValueType::Real);
    let bad = rddl_lang::parse_expr("PICT_VALUE(?p) + nothing").unwrap();
    assert_eq!(model.resolve_expr(&bad).unwrap_err().len(), 2);
}
