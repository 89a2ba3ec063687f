//! The epoch stepper: a single-threaded state machine over a [`Model`].
//!
//! Each [`Stepper::step`] validates an action set, evaluates derived
//! fluents, checks constraints, evaluates the reward and every next-state
//! CPF against a frozen snapshot, then commits the new state with a
//! buffer swap. A rejected action set changes nothing.

use std::sync::Arc;
use std::time::Instant;

use rddl_core::{EpochId, EvalError, FluentClass, GroundId, RandomSource, Value, ValueType};
use rddl_eval::{ChaChaSource, Evaluator};
use rddl_lang::{Domain, Instance, NonFluents};
use rddl_model::{Model, Valuation};

use crate::config::{ConfigError, StepperConfig};
use crate::error::{ActionError, StepError};
use crate::metrics::StepMetrics;
use crate::state::{Layered, StateView};

// ── Phase ──────────────────────────────────────────────────────────

/// Lifecycle of a [`Stepper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// At the initial state, epoch 0.
    Initialized,
    /// At least one epoch committed, horizon not reached.
    Stepping,
    /// Horizon reached or a fatal error occurred.
    Terminated,
}

// ── StepResult ─────────────────────────────────────────────────────

/// Outcome of a committed epoch.
#[derive(Clone, Copy, Debug)]
pub struct StepResult<'s> {
    /// Reward for the epoch just completed.
    pub reward: f64,
    /// The state after the transition.
    pub state: StateView<'s>,
    /// Epoch count after the transition.
    pub epoch: EpochId,
    /// Whether the horizon has been reached.
    pub terminated: bool,
}

// ── Stepper ────────────────────────────────────────────────────────

/// Advances a compiled model one decision epoch at a time.
///
/// Owns the random source and two state buffers. The model is shared
/// behind an [`Arc`] so many steppers can run the same instance.
pub struct Stepper<R = ChaChaSource> {
    model: Arc<Model>,
    config: StepperConfig,
    rng: R,
    horizon: u32,
    discount: f64,
    max_actions: Option<u32>,
    action_ids: Vec<GroundId>,
    front: Valuation,
    back: Valuation,
    scratch: Valuation,
    epoch: EpochId,
    phase: Phase,
    cumulative: f64,
    discounted: f64,
    weight: f64,
    last_metrics: StepMetrics,
}

// Steppers move between threads with their random source.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<Stepper<ChaChaSource>>();
};

impl<R: RandomSource> Stepper<R> {
    /// Compile a domain, non-fluents block and instance and start a
    /// stepper at the instance's initial state with default settings.
    pub fn new(
        domain: &Domain,
        non_fluents: &NonFluents,
        instance: &Instance,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let model = Model::compile(domain, non_fluents, instance)?;
        Self::from_model(Arc::new(model), StepperConfig::default(), rng)
    }

    /// Start a stepper over an already compiled model.
    ///
    /// With `enforce_invariants`, the initial state must satisfy every
    /// state invariant.
    pub fn from_model(
        model: Arc<Model>,
        config: StepperConfig,
        mut rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let instance = model.config().clone();
        let horizon = config.resolved_horizon(&instance);
        let initial = model.initial_valuation().clone();

        if config.enforce_invariants {
            let ev = Evaluator::new(&model);
            for (index, inv) in model.invariants().iter().enumerate() {
                let holds = ev
                    .evaluate_bool(&inv.expr, &[], &initial, &mut rng)
                    .map_err(ConfigError::InitialInvariantFailed)?;
                if !holds {
                    return Err(ConfigError::InitialInvariantViolated { index });
                }
            }
        }

        let action_ids: Vec<GroundId> = model.ids_of_class(FluentClass::ActionFluent).collect();
        tracing::info!(
            domain = model.domain_name(),
            instance = model.instance_name(),
            grounded = model.grounding().len(),
            actions = action_ids.len(),
            horizon,
            "stepper ready"
        );

        Ok(Self {
            scratch: Valuation::new(initial.len()),
            back: initial.clone(),
            front: initial,
            config,
            rng,
            horizon,
            discount: instance.discount,
            max_actions: instance.max_nondef_actions,
            action_ids,
            model,
            epoch: EpochId(0),
            phase: Phase::Initialized,
            cumulative: 0.0,
            discounted: 0.0,
            weight: 1.0,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Advance one epoch with the given action assignments. Actions not
    /// listed take their declared defaults.
    ///
    /// # Errors
    ///
    /// - [`StepError::InvalidAction`]: the action set was rejected. State,
    ///   epoch and returns are unchanged, though derived-fluent sampling
    ///   may have advanced the random source.
    /// - [`StepError::Eval`] or [`StepError::InvariantViolated`]: fatal.
    ///   The stepper is terminated and the state is not committed.
    /// - [`StepError::Terminated`]: the stepper already stopped.
    pub fn step(&mut self, actions: &[(GroundId, Value)]) -> Result<StepResult<'_>, StepError> {
        if self.phase == Phase::Terminated {
            return Err(StepError::Terminated { epoch: self.epoch });
        }
        let start = Instant::now();
        let (reward, mut metrics) = match self.run_epoch(actions) {
            Ok(out) => out,
            Err(StepError::InvalidAction(e)) => {
                tracing::warn!(epoch = self.epoch.0, error = %e, "action set rejected");
                return Err(StepError::InvalidAction(e));
            }
            Err(e) => {
                tracing::warn!(epoch = self.epoch.0, error = %e, "stepper terminated by error");
                self.phase = Phase::Terminated;
                return Err(e);
            }
        };

        // Commit.
        std::mem::swap(&mut self.front, &mut self.back);
        self.epoch = EpochId(self.epoch.0 + 1);
        self.cumulative += reward;
        self.discounted += self.weight * reward;
        self.weight *= self.discount;
        let terminated = self.epoch.0 >= u64::from(self.horizon);
        self.phase = if terminated {
            Phase::Terminated
        } else {
            Phase::Stepping
        };
        metrics.total_us = start.elapsed().as_micros() as u64;
        self.last_metrics = metrics;

        tracing::debug!(epoch = self.epoch.0, reward, terminated, "epoch committed");
        Ok(StepResult {
            reward,
            state: StateView::new(&self.model, &self.front),
            epoch: self.epoch,
            terminated,
        })
    }

    /// [`step`](Self::step) with actions named like `xMove` or
    /// `move(p1, north)`.
    pub fn step_named(&mut self, actions: &[(&str, Value)]) -> Result<StepResult<'_>, StepError> {
        let mut resolved = Vec::with_capacity(actions.len());
        for &(name, value) in actions {
            match self.ground_id(name) {
                Some(id) => resolved.push((id, value)),
                None => {
                    let e = ActionError::UnknownAction {
                        name: name.to_string(),
                    };
                    tracing::warn!(epoch = self.epoch.0, error = %e, "action set rejected");
                    return Err(e.into());
                }
            }
        }
        self.step(&resolved)
    }

    /// Everything up to, but not including, the commit.
    fn run_epoch(&mut self, actions: &[(GroundId, Value)]) -> Result<(f64, StepMetrics), StepError> {
        let Self {
            model,
            config,
            rng,
            max_actions,
            action_ids,
            front,
            back,
            scratch,
            ..
        } = self;
        let model: &Model = model;
        let ev = Evaluator::new(model);
        let mut metrics = StepMetrics::default();

        metrics.nondefault_actions = stage_actions(model, scratch, action_ids, actions)?;
        if let Some(max) = *max_actions {
            if metrics.nondefault_actions > max {
                return Err(ActionError::TooManyActions {
                    count: metrics.nondefault_actions,
                    max,
                }
                .into());
            }
        }

        // Derived fluents, in dependency order.
        let t = Instant::now();
        for g in model.derived() {
            scratch.clear(g.target);
        }
        for g in model.derived() {
            let env = Layered {
                overlay: scratch,
                base: front,
            };
            let v = ev.evaluate(&model.cpfs()[g.cpf].expr, &g.bindings, &env, rng)?;
            let v = conform(model, g.target, v)?;
            scratch.set(g.target, v);
        }
        metrics.derived_evaluated = model.derived().len() as u32;
        metrics.derived_us = t.elapsed().as_micros() as u64;

        let env = Layered {
            overlay: scratch,
            base: front,
        };

        let t = Instant::now();
        for (index, c) in model.constraints().iter().enumerate() {
            if !ev.evaluate_bool(&c.expr, &[], &env, rng)? {
                return Err(ActionError::ConstraintViolated {
                    kind: c.kind,
                    index,
                }
                .into());
            }
        }
        metrics.constraint_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        let reward = match model.reward() {
            Some(expr) => ev.evaluate_real(expr, &[], &env, rng)?,
            None => 0.0,
        };
        metrics.reward_us = t.elapsed().as_micros() as u64;

        // Next state into the back buffer; non-fluents there never change.
        let t = Instant::now();
        for g in model.transitions() {
            let v = ev.evaluate(&model.cpfs()[g.cpf].expr, &g.bindings, &env, rng)?;
            back.set(g.target, conform(model, g.target, v)?);
        }
        metrics.transitions_evaluated = model.transitions().len() as u32;
        metrics.transition_us = t.elapsed().as_micros() as u64;

        if config.enforce_invariants {
            for (index, inv) in model.invariants().iter().enumerate() {
                if !ev.evaluate_bool(&inv.expr, &[], &*back, rng)? {
                    return Err(StepError::InvariantViolated { index });
                }
            }
        }
        Ok((reward, metrics))
    }

    /// Return to the initial state at epoch 0. The random source is left
    /// where it is.
    pub fn reset(&mut self) {
        let initial = self.model.initial_valuation();
        self.front.clone_from(initial);
        self.back.clone_from(initial);
        self.epoch = EpochId(0);
        self.phase = Phase::Initialized;
        self.cumulative = 0.0;
        self.discounted = 0.0;
        self.weight = 1.0;
        self.last_metrics = StepMetrics::default();
        tracing::debug!("stepper reset");
    }
}

impl<R> Stepper<R> {
    /// The model being simulated.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Settings this stepper was built with.
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// The current state.
    pub fn state(&self) -> StateView<'_> {
        StateView::new(&self.model, &self.front)
    }

    /// FNV-1a hash of the current state-fluent values.
    pub fn state_hash(&self) -> u64 {
        self.state().hash()
    }

    /// Epochs committed so far.
    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether further steps will fail with [`StepError::Terminated`].
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// Number of epochs before termination.
    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    /// Undiscounted sum of rewards so far.
    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative
    }

    /// `Σ discount^t · r_t` over the epochs so far.
    pub fn discounted_return(&self) -> f64 {
        self.discounted
    }

    /// Metrics from the most recent committed step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The random source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Grounded id for a name like `xMove` or `PICT_XPOS(p1)`.
    pub fn ground_id(&self, name: &str) -> Option<GroundId> {
        let (var, args) = split_ground_name(name)?;
        self.model.ground(var, &args)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Reset every action to its default, then apply `actions`. Returns the
/// number of actions left at a non-default value.
fn stage_actions(
    model: &Model,
    scratch: &mut Valuation,
    action_ids: &[GroundId],
    actions: &[(GroundId, Value)],
) -> Result<u32, ActionError> {
    for &id in action_ids {
        match model.default_of(id) {
            Some(d) => {
                scratch.set(id, d);
            }
            None => scratch.clear(id),
        }
    }
    for (i, &(id, value)) in actions.iter().enumerate() {
        let Some(decl) = model.decl_of(id) else {
            return Err(ActionError::UnknownAction {
                name: id.to_string(),
            });
        };
        if decl.class != FluentClass::ActionFluent {
            return Err(ActionError::NotAnAction {
                name: model.ground_name(id),
            });
        }
        if actions[..i].iter().any(|&(prev, _)| prev == id) {
            return Err(ActionError::DuplicateAction {
                name: model.ground_name(id),
            });
        }
        let member = match (value, decl.value_type) {
            (Value::Object(o), ValueType::Object(ty)) => {
                model.registry().object(o).is_some_and(|info| info.ty == ty)
            }
            _ => true,
        };
        let Some(v) = value.coerce(decl.value_type).filter(|_| member) else {
            return Err(ActionError::WrongType {
                name: model.ground_name(id),
                expected: model.registry().describe(decl.value_type),
                found: value.kind(),
            });
        };
        scratch.set(id, v);
    }
    let count = action_ids
        .iter()
        .filter(|&&id| scratch.get(id) != model.default_of(id))
        .count();
    Ok(count as u32)
}

/// Convert a CPF result to the target's declared type.
fn conform(model: &Model, target: GroundId, v: Value) -> Result<Value, EvalError> {
    let Some(decl) = model.decl_of(target) else {
        return Ok(v);
    };
    v.coerce(decl.value_type).ok_or_else(|| {
        EvalError::mismatch(
            &model.ground_name(target),
            &model.registry().describe(decl.value_type),
            v.kind(),
        )
    })
}

/// Split `name(a, b)` into `("name", ["a", "b"])`.
fn split_ground_name(s: &str) -> Option<(&str, Vec<&str>)> {
    let s = s.trim();
    let Some(open) = s.find('(') else {
        return Some((s, Vec::new()));
    };
    let inner = s[open + 1..].strip_suffix(')')?;
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Some((s[..open].trim(), args))
}
