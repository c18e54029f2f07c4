//! Event manager: attaches listeners to stats and dispatches events to them.

use crate::error::ListenerError;
use crate::event::GameEvent;
use crate::listener::{
    ListenerContext, ListenerFactory, ListenerResolver, ListenerState, StatEventListener,
};
use statkit_types::listener_type_name;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct EventState {
    /// Factories added at runtime, and factories already resolved for a stat.
    factories: HashMap<String, ListenerFactory>,
    /// Enabled listeners.
    listeners: HashMap<String, Arc<dyn StatEventListener>>,
}

pub struct EventManager {
    resolver: Box<dyn ListenerResolver>,
    state: Mutex<EventState>,
}

impl EventManager {
    pub fn new(resolver: Box<dyn ListenerResolver>) -> Self {
        Self {
            resolver,
            state: Mutex::new(EventState::default()),
        }
    }

    /// Add (or replace) the factory of `stat`, taking precedence over the resolver.
    pub fn add_factory(&self, stat: &str, factory: ListenerFactory) {
        self.lock().factories.insert(stat.to_string(), factory);
    }

    /// Resolve and attach the listener of a newly registered stat.
    pub fn register(&self, stat: &str, ctx: ListenerContext) -> ListenerState {
        match self.factory(stat) {
            Some(factory) => self.attach(stat, factory, ctx),
            None => ListenerState::None,
        }
    }

    /// Detach the listener of `stat` and forget its factory.
    pub fn unregister(&self, stat: &str) {
        let mut state = self.lock();
        state.factories.remove(stat);
        if state.listeners.remove(stat).is_some() {
            tracing::info!(stat, "detached listener");
        }
    }

    /// (Re)construct and attach the listener of `stat`.
    pub fn enable(&self, stat: &str, ctx: ListenerContext) -> Result<ListenerState, ListenerError> {
        if self.is_enabled(stat) {
            return Ok(ListenerState::Attached);
        }
        let factory = self
            .factory(stat)
            .ok_or_else(|| ListenerError::Missing(stat.to_string()))?;
        Ok(self.attach(stat, factory, ctx))
    }

    /// Detach the listener of `stat`, keeping its factory for a later
    /// [`enable`](Self::enable). Returns whether a listener was attached.
    pub fn disable(&self, stat: &str) -> bool {
        let removed = self.lock().listeners.remove(stat).is_some();
        if removed {
            tracing::info!(stat, "disabled listener");
        }
        removed
    }

    pub fn is_enabled(&self, stat: &str) -> bool {
        self.lock().listeners.contains_key(stat)
    }

    /// Stats that currently have an enabled listener, sorted.
    pub fn enabled(&self) -> Vec<String> {
        let mut stats: Vec<String> = self.lock().listeners.keys().cloned().collect();
        stats.sort();
        stats
    }

    /// Deliver `event` to every enabled listener.
    ///
    /// Listeners run outside the manager's lock, so a handler may freely call
    /// back into the registry. Handler errors are logged and skipped.
    pub fn dispatch(&self, event: &GameEvent) {
        let mut listeners: Vec<(String, Arc<dyn StatEventListener>)> = self
            .lock()
            .listeners
            .iter()
            .map(|(stat, listener)| (stat.clone(), Arc::clone(listener)))
            .collect();
        listeners.sort_by(|a, b| a.0.cmp(&b.0));

        for (stat, listener) in listeners {
            if let Err(e) = listener.handle(event) {
                tracing::warn!(stat = %stat, error = %e, ?event, "listener failed to handle event");
            }
        }
    }

    fn factory(&self, stat: &str) -> Option<ListenerFactory> {
        if let Some(factory) = self.lock().factories.get(stat) {
            return Some(Arc::clone(factory));
        }
        let factory = self.resolver.resolve(stat)?;
        self.lock()
            .factories
            .insert(stat.to_string(), Arc::clone(&factory));
        Some(factory)
    }

    /// Construct the listener outside the lock, then attach it.
    fn attach(&self, stat: &str, factory: ListenerFactory, ctx: ListenerContext) -> ListenerState {
        match factory(ctx) {
            Ok(listener) => {
                self.lock()
                    .listeners
                    .insert(stat.to_string(), Arc::from(listener));
                tracing::info!(stat, listener = %listener_type_name(stat), "attached listener");
                ListenerState::Attached
            }
            Err(e) => {
                tracing::warn!(stat, error = %e, "listener construction failed");
                ListenerState::Failed(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
