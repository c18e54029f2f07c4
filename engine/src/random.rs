//! Production uniform source.

use rand::Rng;
use statkit_types::UniformSource;

/// Uniform draws from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl UniformSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}
