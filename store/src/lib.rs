//! Abstract persistence traits for statkit.
//!
//! Every backend (files on disk, the host server's per-player attribute
//! store, in-memory for testing) implements these traits. The engine depends
//! only on the traits.

pub mod curve;
pub mod error;
pub mod player;

pub use curve::CurveStore;
pub use error::StoreError;
pub use player::PlayerDataStore;
