//! Fundamental types for statkit.
//!
//! This crate defines the pieces every other crate in the workspace shares:
//! overflow-safe integer arithmetic, the level curve that maps a stat value to
//! a level, stat-name rules, player identifiers, and the uniform random source
//! used to roll first-time default values.

pub mod curve;
pub mod error;
pub mod math;
pub mod name;
pub mod player;
pub mod random;

pub use curve::{CurveField, StatCurve};
pub use error::StatError;
pub use math::SaturatingMath;
pub use name::{listener_type_name, stat_from_listener_type, validate_stat_name};
pub use player::PlayerId;
pub use random::UniformSource;
