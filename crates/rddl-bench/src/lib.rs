//! Benchmark profiles for the RDDL simulator.
//!
//! - [`scaled_rover`]: the Mars rover domain with `n` picture points
//! - [`rover_plan`]: a deterministic, constraint-respecting action plan

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt::Write;

use rddl_core::Value;
use rddl_test_utils::MARS_ROVER;

/// The rover domain with `points` picture points laid out on a square
/// grid of unit spacing, values cycling 1..=10, and a 40-epoch instance.
pub fn scaled_rover(points: usize) -> String {
    let domain_end = MARS_ROVER
        .find("non-fluents pics3")
        .expect("fixture has a pics3 block");
    let mut src = MARS_ROVER[..domain_end].to_string();
    let side = (points as f64).sqrt().ceil().max(1.0) as usize;

    let names: Vec<String> = (0..points).map(|i| format!("p{i}")).collect();
    writeln!(src, "non-fluents grid {{").unwrap();
    writeln!(src, "    domain = simple_mars_rover;").unwrap();
    writeln!(src, "    objects {{ picture-point : {{{}}}; }};", names.join(", ")).unwrap();
    writeln!(src, "    non-fluents {{").unwrap();
    for (i, name) in names.iter().enumerate() {
        let x = (i % side) as f64;
        let y = (i / side) as f64;
        let value = (i % 10 + 1) as f64;
        writeln!(
            src,
            "        PICT_XPOS({name}) = {x:.1}; PICT_YPOS({name}) = {y:.1}; PICT_VALUE({name}) = {value:.1};"
        )
        .unwrap();
    }
    writeln!(src, "    }};").unwrap();
    writeln!(src, "}}").unwrap();
    writeln!(
        src,
        "instance grid_inst {{ domain = simple_mars_rover; non-fluents = grid; horizon = 40; }}"
    )
    .unwrap();
    src
}

/// A plan of `steps` epochs alternating unit moves with snapshots.
///
/// Every entry satisfies the rover's state-action constraints. The move
/// direction is drawn from a small LCG seeded with `seed`.
pub fn rover_plan(seed: u64, steps: usize) -> Vec<Vec<(&'static str, Value)>> {
    let mut state = seed;
    (0..steps)
        .map(|t| {
            if t % 2 == 1 {
                return vec![("snapPicture", Value::Bool(true))];
            }
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let dx = ((state >> 33) % 3) as f64 - 1.0;
            let dy = ((state >> 43) % 3) as f64 - 1.0;
            vec![("xMove", Value::Real(dx)), ("yMove", Value::Real(dy))]
        })
        .collect()
}
