//! Per-step timing metrics for the stepper.

/// Timing and work counters collected during a single [`step`].
///
/// All durations are in microseconds. The stepper overwrites these after
/// every successful step; rejected actions leave the previous values.
///
/// [`step`]: crate::Stepper::step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent evaluating derived fluents, in microseconds.
    pub derived_us: u64,
    /// Time spent checking constraints and preconditions, in microseconds.
    pub constraint_us: u64,
    /// Time spent evaluating the reward, in microseconds.
    pub reward_us: u64,
    /// Time spent evaluating next-state CPFs, in microseconds.
    pub transition_us: u64,
    /// Number of derived-fluent instances evaluated.
    pub derived_evaluated: u32,
    /// Number of next-state CPF instances evaluated.
    pub transitions_evaluated: u32,
    /// Action fluents set to a non-default value this step.
    pub nondefault_actions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.derived_us, 0);
        assert_eq!(m.constraint_us, 0);
        assert_eq!(m.reward_us, 0);
        assert_eq!(m.transition_us, 0);
        assert_eq!(m.derived_evaluated, 0);
        assert_eq!(m.transitions_evaluated, 0);
        assert_eq!(m.nondefault_actions, 0);
    }
}
