//! Test utilities for RDDL simulator development.
//!
//! Provides the Mars rover model sources used across the workspace's
//! tests and benches ([`fixtures`]) and deterministic implementations of
//! [`RandomSource`] whose draws are known in advance.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;

use rddl_core::RandomSource;

pub use fixtures::{mars_rover_with_horizon, MARS_ROVER, MARS_ROVER_TRACKED};

/// Random source whose normal draws are always exactly zero.
///
/// `Normal(m, v)` then evaluates to `m`, which makes stochastic CPFs
/// deterministic for exact assertions. Uniform draws return `uniform`.
#[derive(Clone, Debug)]
pub struct NoNoise {
    pub uniform: f64,
}

impl NoNoise {
    pub fn new() -> Self {
        Self { uniform: 0.5 }
    }
}

impl Default for NoNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for NoNoise {
    fn next_uniform(&mut self) -> f64 {
        self.uniform
    }

    fn next_standard_normal(&mut self) -> f64 {
        0.0
    }
}

/// Random source that replays scripted draws in order.
///
/// Standard-normal and uniform draws come from separate queues. Once a
/// queue is exhausted it keeps returning its fallback (0.0 for normals,
/// 0.5 for uniforms). Counts every draw for later assertions.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    normals: VecDeque<f64>,
    uniforms: VecDeque<f64>,
    pub normal_draws: usize,
    pub uniform_draws: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue standard-normal draws.
    pub fn with_normals(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.normals.extend(draws);
        self
    }

    /// Queue uniform draws.
    pub fn with_uniforms(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.uniforms.extend(draws);
        self
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        self.uniform_draws += 1;
        self.uniforms.pop_front().unwrap_or(0.5)
    }

    fn next_standard_normal(&mut self) -> f64 {
        self.normal_draws += 1;
        self.normals.pop_front().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_then_falls_back() {
        let mut src = ScriptedSource::new()
            .with_normals([1.5, -2.0])
            .with_uniforms([0.1]);
        assert_eq!(src.next_standard_normal(), 1.5);
        assert_eq!(src.next_standard_normal(), -2.0);
        assert_eq!(src.next_standard_normal(), 0.0);
        assert_eq!(src.next_uniform(), 0.1);
        assert_eq!(src.next_uniform(), 0.5);
        assert_eq!(src.normal_draws, 3);
        assert_eq!(src.uniform_draws, 2);
    }

    #[test]
    fn no_noise_normals_are_zero() {
        let mut src = NoNoise::new();
        assert_eq!(src.next_standard_normal(), 0.0);
        assert_eq!(src.next_uniform(), 0.5);
    }

    #[test]
    fn horizon_override_rewrites_instance() {
        let src = mars_rover_with_horizon(10);
        assert!(src.contains("horizon = 10;"));
        assert!(!src.contains("horizon = 40;"));
    }
}
