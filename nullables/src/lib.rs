//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the engine (the host's player attribute
//! store, curve persistence, randomness) are abstracted behind traits. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (players going offline, failing writes)
//! - Record what was written so tests can assert on it
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod random;
pub mod store;

pub use random::NullRandom;
pub use store::{NullCurveStore, NullPlayerStore, WriteRecord};
