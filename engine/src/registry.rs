//! Stat registry: the catalog of stat names.
//!
//! Registering a stat loads its curve and attaches its listener; unregistering
//! flushes every live player cache, saves the curve and detaches the listener.
//! The registry also owns the per-player caches and reacts to the host's
//! lifecycle events.

use crate::curves::CurveManager;
use crate::error::{EngineError, ListenerError};
use crate::event::GameEvent;
use crate::events::EventManager;
use crate::listener::{
    ListenerContext, ListenerFactory, ListenerResolver, ListenerState, ListenerTable,
    StatEventListener,
};
use crate::player::PlayerStats;
use crate::random::ThreadRandom;
use statkit_store::{CurveStore, PlayerDataStore};
use statkit_types::{
    stat_from_listener_type, validate_stat_name, PlayerId, StatCurve, StatError, UniformSource,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Everything the registry needs from the outside world.
pub struct RegistryDeps {
    pub player_store: Arc<dyn PlayerDataStore>,
    pub curve_store: Arc<dyn CurveStore>,
    pub listeners: Box<dyn ListenerResolver>,
    pub random: Arc<dyn UniformSource>,
}

impl RegistryDeps {
    /// Stores only; no listeners and thread-local randomness.
    pub fn new(player_store: Arc<dyn PlayerDataStore>, curve_store: Arc<dyn CurveStore>) -> Self {
        Self {
            player_store,
            curve_store,
            listeners: Box::new(ListenerTable::new()),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_listeners(mut self, listeners: impl ListenerResolver + 'static) -> Self {
        self.listeners = Box::new(listeners);
        self
    }

    pub fn with_random(mut self, random: Arc<dyn UniformSource>) -> Self {
        self.random = random;
        self
    }
}

#[derive(Default)]
struct RegistryState {
    stats: BTreeSet<String>,
    /// Names being torn down by `unregister`. Still reserved until teardown ends.
    removing: HashSet<String>,
    players: HashMap<PlayerId, Arc<PlayerStats>>,
}

pub struct StatRegistry {
    this: Weak<StatRegistry>,
    state: Mutex<RegistryState>,
    curves: CurveManager,
    events: EventManager,
    player_store: Arc<dyn PlayerDataStore>,
    random: Arc<dyn UniformSource>,
}

impl StatRegistry {
    pub fn new(deps: RegistryDeps) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            state: Mutex::new(RegistryState::default()),
            curves: CurveManager::new(deps.curve_store),
            events: EventManager::new(deps.listeners),
            player_store: deps.player_store,
            random: deps.random,
        })
    }

    /// Registered stat names, sorted.
    pub fn stats(&self) -> Vec<String> {
        self.lock().stats.iter().cloned().collect()
    }

    pub fn is_registered(&self, stat: &str) -> bool {
        self.lock().stats.contains(stat)
    }

    pub fn curves(&self) -> &CurveManager {
        &self.curves
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Register `name`, loading its curve and attaching its listener if one
    /// is known.
    ///
    /// A listener that fails to construct is reported in the returned state;
    /// the stat stays registered.
    pub fn register(&self, name: &str) -> Result<ListenerState, EngineError> {
        self.register_inner(name, None)
    }

    /// Register `name` with an explicit listener factory.
    pub fn register_with_listener<F>(&self, name: &str, factory: F) -> Result<ListenerState, EngineError>
    where
        F: Fn(ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError>
            + Send
            + Sync
            + 'static,
    {
        self.register_inner(name, Some(Arc::new(factory)))
    }

    /// Register the stat named by a listener type name, e.g.
    /// `StrengthEventListener` registers `strength`.
    pub fn register_listener_type<F>(
        &self,
        type_name: &str,
        factory: F,
    ) -> Result<(String, ListenerState), EngineError>
    where
        F: Fn(ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError>
            + Send
            + Sync
            + 'static,
    {
        let stat = stat_from_listener_type(type_name)
            .ok_or_else(|| ListenerError::InvalidTypeName(type_name.to_string()))?;
        let state = self.register_inner(&stat, Some(Arc::new(factory)))?;
        Ok((stat, state))
    }

    fn register_inner(
        &self,
        name: &str,
        factory: Option<ListenerFactory>,
    ) -> Result<ListenerState, EngineError> {
        validate_stat_name(name)?;
        {
            let mut state = self.lock();
            if state.stats.contains(name) || state.removing.contains(name) {
                return Err(StatError::DuplicateStat(name.to_string()).into());
            }
            self.curves.load(name)?;
            state.stats.insert(name.to_string());
        }
        tracing::info!(stat = name, "registered stat");

        if let Some(factory) = factory {
            self.events.add_factory(name, factory);
        }
        Ok(self.events.register(name, self.context(name)))
    }

    /// Remove `name` from the catalog.
    ///
    /// Every live player cache flushes its value first, then the curve is
    /// saved and the listener detached. All steps run even if one fails; the
    /// first failure is returned. The name cannot be registered again until
    /// teardown has finished.
    pub fn unregister(&self, name: &str) -> Result<(), EngineError> {
        let players = {
            let mut state = self.lock();
            if !state.stats.remove(name) {
                return Err(StatError::UnknownStat(name.to_string()).into());
            }
            state.removing.insert(name.to_string());
            Self::player_snapshot(&state)
        };

        let mut first_err: Option<EngineError> = None;
        for cache in &players {
            if let Err(e) = cache.unregister(name) {
                first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self.curves.unregister(name) {
            tracing::warn!(stat = name, error = %e, "failed to save curve");
            first_err.get_or_insert(e.into());
        }
        self.events.unregister(name);
        self.lock().removing.remove(name);

        tracing::info!(stat = name, players = players.len(), "unregistered stat");
        first_err.map_or(Ok(()), Err)
    }

    /// Cache of `player`, created on first use.
    pub fn create_cache(&self, player: &PlayerId) -> Arc<PlayerStats> {
        let mut state = self.lock();
        let cache = state.players.entry(*player).or_insert_with(|| {
            Arc::new(PlayerStats::new(
                *player,
                self.this.clone(),
                Arc::clone(&self.player_store),
                Arc::clone(&self.random),
            ))
        });
        Arc::clone(cache)
    }

    pub fn cache(&self, player: &PlayerId) -> Option<Arc<PlayerStats>> {
        self.lock().players.get(player).cloned()
    }

    /// Players with a live cache, sorted.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.lock().players.keys().copied().collect();
        players.sort();
        players
    }

    pub fn curve(&self, name: &str) -> Result<Arc<StatCurve>, EngineError> {
        self.ensure_registered(name)?;
        Ok(self.curves.get(name)?)
    }

    /// Replace the curve of `name`. Memoized levels of every live player are
    /// dropped; the curve is persisted on the next save.
    pub fn set_curve(&self, name: &str, curve: StatCurve) -> Result<Arc<StatCurve>, EngineError> {
        let (curve, players) = {
            let state = self.lock();
            if !state.stats.contains(name) {
                return Err(StatError::UnknownStat(name.to_string()).into());
            }
            (self.curves.set(name, curve), Self::player_snapshot(&state))
        };
        for cache in players {
            cache.invalidate_level(name);
        }
        tracing::info!(stat = name, max = curve.max(), weight = curve.weight(), "replaced curve");
        Ok(curve)
    }

    /// Re-attach the listener of a registered stat.
    pub fn enable_listener(&self, name: &str) -> Result<ListenerState, EngineError> {
        self.ensure_registered(name)?;
        Ok(self.events.enable(name, self.context(name))?)
    }

    /// Detach the listener of `name`. Returns whether one was attached.
    pub fn disable_listener(&self, name: &str) -> bool {
        self.events.disable(name)
    }

    /// Register every stat that has a stored curve. Returns how many were added.
    pub fn load(&self) -> Result<usize, EngineError> {
        let mut added = 0;
        for stat in self.curves.stats_on_disk()? {
            if self.is_registered(&stat) {
                continue;
            }
            match self.register(&stat) {
                Ok(_) => added += 1,
                Err(EngineError::Stat(StatError::DuplicateStat(_))) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::info!(added, "loaded stored stats");
        Ok(added)
    }

    /// Flush every curve and every live player cache without evicting anything.
    pub fn save(&self) -> Result<(), EngineError> {
        let players = Self::player_snapshot(&self.lock());
        let mut first_err: Option<EngineError> = None;
        if let Err(e) = self.curves.save_all() {
            first_err.get_or_insert(e.into());
        }
        for cache in players {
            if let Err(e) = cache.save_all() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Deliver a host event.
    ///
    /// A joining player gets a cache with every stat loaded before listeners
    /// see the event. Quit and shutdown are delivered to listeners first and
    /// then flush state.
    pub fn dispatch(&self, event: &GameEvent) -> Result<(), EngineError> {
        match event {
            GameEvent::PlayerJoin { player } => {
                self.create_cache(player).load_all()?;
                self.events.dispatch(event);
                tracing::info!(player = %player, "player joined");
                Ok(())
            }
            GameEvent::PlayerQuit { player } => {
                self.events.dispatch(event);
                self.on_player_quit(player)
            }
            GameEvent::Shutdown => {
                self.events.dispatch(event);
                self.shutdown()
            }
            GameEvent::BlockBreak { .. } => {
                self.events.dispatch(event);
                Ok(())
            }
        }
    }

    /// Evict the cache of `player` and save its values.
    ///
    /// The evicted cache is closed, so a handle still held elsewhere can no
    /// longer change values that were already flushed.
    pub fn on_player_quit(&self, player: &PlayerId) -> Result<(), EngineError> {
        let removed = self.lock().players.remove(player);
        match removed {
            Some(cache) => {
                let result = cache.evict();
                tracing::info!(player = %player, ok = result.is_ok(), "player quit");
                result
            }
            None => Ok(()),
        }
    }

    /// Flush every curve and every connected player's values, evicting the
    /// player caches.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        let players: Vec<Arc<PlayerStats>> = {
            let mut state = self.lock();
            state.players.drain().map(|(_, cache)| cache).collect()
        };
        let mut first_err: Option<EngineError> = None;
        for cache in &players {
            if let Err(e) = cache.evict() {
                first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self.curves.save_all() {
            first_err.get_or_insert(e.into());
        }
        tracing::info!(
            players = players.len(),
            ok = first_err.is_none(),
            "stat registry shut down"
        );
        first_err.map_or(Ok(()), Err)
    }

    pub(crate) fn ensure_registered(&self, stat: &str) -> Result<(), StatError> {
        if self.is_registered(stat) {
            Ok(())
        } else {
            Err(StatError::UnknownStat(stat.to_string()))
        }
    }

    fn context(&self, stat: &str) -> ListenerContext {
        ListenerContext::new(stat, self.this.clone())
    }

    fn player_snapshot(state: &RegistryState) -> Vec<Arc<PlayerStats>> {
        let mut players: Vec<(&PlayerId, &Arc<PlayerStats>)> = state.players.iter().collect();
        players.sort_by_key(|(id, _)| **id);
        players.into_iter().map(|(_, cache)| Arc::clone(cache)).collect()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
