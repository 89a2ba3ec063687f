//! Roll out the pics3 rover with a fixed plan and print each epoch.
//!
//! ```text
//! cargo run -p rddl-bench --example rover_rollout -- 7
//! ```
//! The optional argument is the random seed (default 42).

use rddl_bench::rover_plan;
use rddl_engine::{Stepper, StepperConfig};
use rddl_eval::ChaChaSource;
use rddl_model::Model;
use rddl_test_utils::MARS_ROVER;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed: u64 = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(42);

    let file = rddl_lang::parse(MARS_ROVER)?;
    let model = Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0])?;
    let mut stepper = Stepper::from_model(
        model.into(),
        StepperConfig::default(),
        ChaChaSource::seed_from_u64(seed),
    )?;

    for actions in rover_plan(seed, stepper.horizon() as usize) {
        let r = stepper.step_named(&actions)?;
        println!(
            "epoch {:>2}  reward {:>5.1}  x {:>6.3}  y {:>6.3}  time {:>6.2}",
            r.epoch,
            r.reward,
            r.state.real("xPos", &[]).unwrap_or(f64::NAN),
            r.state.real("yPos", &[]).unwrap_or(f64::NAN),
            r.state.real("time", &[]).unwrap_or(f64::NAN),
        );
        if r.terminated {
            break;
        }
    }
    println!(
        "return {:.2} (discounted {:.2}), state hash {:016x}",
        stepper.cumulative_reward(),
        stepper.discounted_return(),
        stepper.state_hash()
    );
    Ok(())
}
