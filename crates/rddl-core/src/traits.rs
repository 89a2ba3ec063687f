//! Core abstraction traits for value lookup and random sampling.

use crate::id::GroundId;
use crate::value::Value;

/// Read-only access to grounded variable values.
///
/// Implemented by valuations and by the stepper's layered epoch view.
/// Returns `None` if the variable has no value in this environment,
/// which the evaluator reports as an unbound variable.
pub trait Environment {
    /// Current value of a grounded variable.
    fn value(&self, id: GroundId) -> Option<Value>;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn value(&self, id: GroundId) -> Option<Value> {
        (**self).value(id)
    }
}

/// Source of randomness for distribution nodes.
///
/// The evaluator never owns a generator; callers inject one per call so
/// that two evaluations never share hidden state and a fixed seed yields
/// a reproducible run.
pub trait RandomSource {
    /// A uniform sample in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// A standard normal sample `N(0, 1)`.
    ///
    /// The default draws two uniforms and applies the Box-Muller
    /// transform.
    fn next_standard_normal(&mut self) -> f64 {
        let u1 = self.next_uniform().max(1e-300); // avoid ln(0)
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }

    fn next_standard_normal(&mut self) -> f64 {
        (**self).next_standard_normal()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }

    fn next_standard_normal(&mut self) -> f64 {
        (**self).next_standard_normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_uniform(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn box_muller_is_finite_at_zero() {
        let mut src = Fixed(0.0);
        assert!(src.next_standard_normal().is_finite());
    }

    #[test]
    fn box_muller_known_point() {
        // u1 = e^-0.5 gives radius 1; u2 = 0 gives cos(0) = 1.
        struct Seq(Vec<f64>);
        impl RandomSource for Seq {
            fn next_uniform(&mut self) -> f64 {
                self.0.remove(0)
            }
        }
        let mut src = Seq(vec![(-0.5f64).exp(), 0.0]);
        assert!((src.next_standard_normal() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn forwarding_through_mut_ref() {
        fn draw<R: RandomSource>(mut r: R) -> f64 {
            r.next_uniform()
        }
        let mut src = Fixed(0.25);
        assert_eq!(draw(&mut src), 0.25);
        assert_eq!(draw(Box::new(Fixed(0.5))), 0.5);
    }
}
