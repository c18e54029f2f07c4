//! Uniform random source abstraction.

/// A source of uniform draws in `[0, 1)`.
///
/// Production code backs this with a thread-local RNG; tests swap in a
/// deterministic sequence so first-time default values are reproducible.
pub trait UniformSource: Send + Sync {
    /// Next uniform draw in `[0, 1)`.
    fn next_unit(&self) -> f64;
}
