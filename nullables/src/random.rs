//! Nullable random: deterministic uniform draws.

use statkit_types::UniformSource;
use std::sync::{Mutex, PoisonError};

/// A deterministic uniform source for testing.
///
/// Returns pre-configured values in order, cycling when exhausted.
pub struct NullRandom {
    draws: Vec<f64>,
    index: Mutex<usize>,
}

impl NullRandom {
    /// Create with a sequence of draws, each in `[0, 1)`.
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "NullRandom needs at least one draw");
        Self {
            draws,
            index: Mutex::new(0),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// A source under which `randomized_default` always returns the curve's
    /// baseline: the second draw of each pair is zero.
    pub fn baseline() -> Self {
        Self::new(vec![0.5, 0.0])
    }
}

impl UniformSource for NullRandom {
    fn next_unit(&self) -> f64 {
        let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        let value = self.draws[*index % self.draws.len()];
        *index += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_draws() {
        let random = NullRandom::new(vec![0.1, 0.2]);
        assert_eq!(random.next_unit(), 0.1);
        assert_eq!(random.next_unit(), 0.2);
        assert_eq!(random.next_unit(), 0.1);
    }

    #[test]
    fn baseline_yields_curve_default() {
        let curve = statkit_types::StatCurve::new(7, 5, 1, 2).unwrap();
        let random = NullRandom::baseline();
        assert_eq!(curve.randomized_default(&random), 7);
        assert_eq!(curve.randomized_default(&random), 7);
    }
}
