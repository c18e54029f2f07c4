//! Listener contract and resolution.
//!
//! Custom gameplay logic for a stat ("breaking a block increments strength")
//! lives in a [`StatEventListener`]. Listeners are not discovered by loading
//! code at runtime; a [`ListenerResolver`] hands out a factory per stat name,
//! and [`ListenerTable`] is the explicit factory table populated at startup.

use crate::error::{EngineError, ListenerError};
use crate::event::GameEvent;
use crate::player::PlayerStats;
use crate::registry::StatRegistry;
use rust_decimal::Decimal;
use statkit_types::{stat_from_listener_type, PlayerId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Event-driven logic attached to one stat.
pub trait StatEventListener: Send + Sync {
    /// Stat this listener drives.
    fn stat(&self) -> &str;

    /// React to an event delivered by the host. Errors are logged by the
    /// dispatcher and do not stop delivery to other listeners.
    fn handle(&self, event: &GameEvent) -> Result<(), EngineError>;
}

/// Builds the listener of a stat, given a handle back to the registry.
pub type ListenerFactory = Arc<
    dyn Fn(ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError> + Send + Sync,
>;

/// Source of listener factories, keyed by stat name.
pub trait ListenerResolver: Send + Sync {
    /// Factory for `stat`'s listener, or `None` if the stat has no custom logic.
    fn resolve(&self, stat: &str) -> Option<ListenerFactory>;
}

/// Outcome of attaching a listener while registering a stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerState {
    /// No factory is known for the stat.
    None,
    Attached,
    /// A factory exists but construction failed. The stat stays registered.
    Failed(ListenerError),
}

/// Explicit factory table, populated at startup.
#[derive(Default, Clone)]
pub struct ListenerTable {
    factories: HashMap<String, ListenerFactory>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` as the listener factory of `stat`.
    pub fn insert<F>(&mut self, stat: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(stat.into(), Arc::new(factory));
        self
    }

    /// Register `factory` under the stat named by a listener type name,
    /// e.g. `StrengthEventListener` for `strength`. Returns the stat name.
    pub fn insert_type<F>(&mut self, type_name: &str, factory: F) -> Result<String, ListenerError>
    where
        F: Fn(ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError>
            + Send
            + Sync
            + 'static,
    {
        let stat = stat_from_listener_type(type_name)
            .ok_or_else(|| ListenerError::InvalidTypeName(type_name.to_string()))?;
        self.insert(stat.clone(), factory);
        Ok(stat)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ListenerResolver for ListenerTable {
    fn resolve(&self, stat: &str) -> Option<ListenerFactory> {
        self.factories.get(stat).cloned()
    }
}

/// Handle a listener uses to read and change its own stat for a connected
/// player.
///
/// Holds the registry weakly; once the registry is gone every call fails
/// with [`EngineError::RegistryClosed`]. Calls for a player without a live
/// cache fail with [`EngineError::PlayerDisconnected`].
#[derive(Clone)]
pub struct ListenerContext {
    stat: String,
    registry: Weak<StatRegistry>,
}

impl ListenerContext {
    pub(crate) fn new(stat: &str, registry: Weak<StatRegistry>) -> Self {
        Self {
            stat: stat.to_string(),
            registry,
        }
    }

    pub fn stat(&self) -> &str {
        &self.stat
    }

    pub fn registry(&self) -> Result<Arc<StatRegistry>, EngineError> {
        self.registry.upgrade().ok_or(EngineError::RegistryClosed)
    }

    pub fn get(&self, player: &PlayerId) -> Result<i64, EngineError> {
        self.cache(player)?.get(&self.stat)
    }

    pub fn level(&self, player: &PlayerId) -> Result<i32, EngineError> {
        self.cache(player)?.level(&self.stat)
    }

    pub fn set(&self, player: &PlayerId, value: i64) -> Result<(), EngineError> {
        self.cache(player)?.set(&self.stat, value)
    }

    pub fn increment(
        &self,
        player: &PlayerId,
        delta: impl Into<Decimal>,
    ) -> Result<i64, EngineError> {
        self.cache(player)?.increment(&self.stat, delta)
    }

    pub fn decrement(
        &self,
        player: &PlayerId,
        delta: impl Into<Decimal>,
    ) -> Result<i64, EngineError> {
        self.cache(player)?.decrement(&self.stat, delta)
    }

    pub fn load(&self, player: &PlayerId) -> Result<i64, EngineError> {
        self.cache(player)?.load(&self.stat)
    }

    pub fn save(&self, player: &PlayerId) -> Result<(), EngineError> {
        self.cache(player)?.save(&self.stat)
    }

    /// Cache of a connected player. Listeners never bring a cache back to
    /// life: a player without one has not joined or has already quit.
    fn cache(&self, player: &PlayerId) -> Result<Arc<PlayerStats>, EngineError> {
        self.registry()?
            .cache(player)
            .ok_or(EngineError::PlayerDisconnected(*player))
    }
}
