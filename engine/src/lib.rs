//! statkit engine: named player stats with levels, persistence and
//! event-driven listeners.
//!
//! A [`StatRegistry`] is the catalog of stat names. Each registered stat has a
//! [`StatCurve`](statkit_types::StatCurve) (held by the [`CurveManager`]) that
//! maps a raw value to a level, and optionally a listener (held by the
//! [`EventManager`]) that reacts to [`GameEvent`]s. Every connected player gets
//! a [`PlayerStats`] cache that lazily loads values from the player store,
//! memoizes levels, and writes values back on save.
//!
//! All operations are synchronous and may be called from many threads at
//! once. Lock order is `PlayerStats` → registry → curve manager; the registry
//! never holds its own lock while calling into a player cache or a listener.

pub mod curves;
pub mod error;
pub mod event;
pub mod events;
pub mod listener;
pub mod player;
pub mod random;
pub mod registry;

pub use curves::CurveManager;
pub use error::{EngineError, ListenerError};
pub use event::GameEvent;
pub use events::EventManager;
pub use listener::{
    ListenerContext, ListenerFactory, ListenerResolver, ListenerState, ListenerTable,
    StatEventListener,
};
pub use player::PlayerStats;
pub use random::ThreadRandom;
pub use registry::{RegistryDeps, StatRegistry};
