//! File-backed storage for statkit.
//!
//! Implements the storage traits from `statkit-store` on top of a data
//! directory:
//!
//! ```text
//! <root>/stats/<stat>/stat.toml  one level curve per stat
//! <root>/players/<uuid>.json     stat -> value map per player
//! ```

pub mod curve;
pub mod environment;
pub mod error;
pub mod player;

pub use curve::TomlCurveStore;
pub use environment::DataDir;
pub use error::FsError;
pub use player::JsonPlayerStore;
