//! Per-player stat cache.
//!
//! One [`PlayerStats`] exists per connected player. It holds the player's
//! current value of every stat touched so far plus a memoized level per
//! stat. Values are loaded lazily from the player store (or rolled from the
//! curve's randomized default) and written back on save.
//!
//! Every public method runs under the cache's own lock, so a read-modify-write
//! such as [`increment`](PlayerStats::increment) is atomic with respect to
//! other callers on the same player. While holding that lock the cache may
//! consult the registry's catalog and curve manager; neither ever calls back
//! into a player cache.

use crate::error::EngineError;
use crate::registry::StatRegistry;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statkit_store::PlayerDataStore;
use statkit_types::{PlayerId, UniformSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Default)]
struct CacheState {
    values: HashMap<String, i64>,
    /// Memoized `curve.level(values[stat])`. Dropped whenever the value changes.
    levels: HashMap<String, i32>,
    /// Set once the player disconnects. A closed cache rejects every access.
    closed: bool,
}

pub struct PlayerStats {
    player: PlayerId,
    registry: Weak<StatRegistry>,
    store: Arc<dyn PlayerDataStore>,
    random: Arc<dyn UniformSource>,
    state: Mutex<CacheState>,
}

impl PlayerStats {
    pub(crate) fn new(
        player: PlayerId,
        registry: Weak<StatRegistry>,
        store: Arc<dyn PlayerDataStore>,
        random: Arc<dyn UniformSource>,
    ) -> Self {
        Self {
            player,
            registry,
            store,
            random,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    /// Current value of `stat`, loading it on a miss.
    pub fn get(&self, stat: &str) -> Result<i64, EngineError> {
        let (registry, mut state) = self.begin(stat)?;
        self.value_locked(&registry, &mut state, stat)
    }

    /// Current level of `stat`, memoized until the value changes.
    pub fn level(&self, stat: &str) -> Result<i32, EngineError> {
        let (registry, mut state) = self.begin(stat)?;
        if let Some(&level) = state.levels.get(stat) {
            return Ok(level);
        }
        let value = self.value_locked(&registry, &mut state, stat)?;
        let level = registry.curves().get(stat)?.level(value);
        state.levels.insert(stat.to_string(), level);
        Ok(level)
    }

    /// Overwrite the value of `stat`. The memoized level is dropped.
    pub fn set(&self, stat: &str, value: i64) -> Result<(), EngineError> {
        let (_registry, mut state) = self.begin(stat)?;
        state.values.insert(stat.to_string(), value);
        state.levels.remove(stat);
        Ok(())
    }

    /// Add `delta` to `stat` and return the new value.
    ///
    /// The sum is computed in exact decimal arithmetic, truncated toward zero
    /// and clamped to the `i64` range.
    pub fn increment(&self, stat: &str, delta: impl Into<Decimal>) -> Result<i64, EngineError> {
        self.apply(stat, delta.into())
    }

    /// Subtract `delta` from `stat` and return the new value.
    pub fn decrement(&self, stat: &str, delta: impl Into<Decimal>) -> Result<i64, EngineError> {
        let delta: Decimal = delta.into();
        self.apply(stat, -delta)
    }

    /// Read `stat` from the player store into the cache, replacing any cached
    /// value. Falls back to the curve's randomized default when nothing is
    /// stored (or the player is offline).
    pub fn load(&self, stat: &str) -> Result<i64, EngineError> {
        let (registry, mut state) = self.begin(stat)?;
        self.load_locked(&registry, &mut state, stat)
    }

    /// Load every registered stat that is not cached yet.
    pub fn load_all(&self) -> Result<(), EngineError> {
        let registry = self.registry()?;
        let stats = registry.stats();
        let mut state = self.lock();
        self.ensure_open(&state)?;
        for stat in stats {
            if state.values.contains_key(&stat) || !registry.is_registered(&stat) {
                continue;
            }
            self.load_locked(&registry, &mut state, &stat)?;
        }
        Ok(())
    }

    /// Write the value of `stat` to the player store, loading it first if it
    /// is not cached.
    pub fn save(&self, stat: &str) -> Result<(), EngineError> {
        let (registry, mut state) = self.begin(stat)?;
        let value = self.value_locked(&registry, &mut state, stat)?;
        self.write(stat, value)
    }

    /// Write every cached value to the player store.
    ///
    /// Only stats present in the cache are written; nothing is loaded just to
    /// save a default. Keeps going past failures and reports the first one.
    /// A closed cache was flushed when it closed and writes nothing.
    pub fn save_all(&self) -> Result<(), EngineError> {
        let state = self.lock();
        if state.closed {
            return Ok(());
        }
        self.write_all(&state)
    }

    /// Close the cache and flush every cached value. Called by the registry
    /// when the player disconnects; any later access fails with
    /// [`EngineError::PlayerDisconnected`].
    pub(crate) fn evict(&self) -> Result<(), EngineError> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        self.write_all(&state)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn write_all(&self, state: &CacheState) -> Result<(), EngineError> {
        let mut entries: Vec<(&String, &i64)> = state.values.iter().collect();
        entries.sort();

        let mut first_err = None;
        for (stat, &value) in entries {
            if let Err(e) = self.write(stat, value) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Flush and forget `stat`. Called by the registry when the stat is
    /// unregistered, so it does not require the stat to still be registered.
    ///
    /// The cached entries are dropped even if the save fails.
    pub fn unregister(&self, stat: &str) -> Result<(), EngineError> {
        let mut state = self.lock();
        state.levels.remove(stat);
        match state.values.remove(stat) {
            Some(value) => self.write(stat, value),
            None => Ok(()),
        }
    }

    /// Drop the memoized level of `stat`, e.g. after its curve was replaced.
    pub fn invalidate_level(&self, stat: &str) {
        self.lock().levels.remove(stat);
    }

    pub fn is_cached(&self, stat: &str) -> bool {
        self.lock().values.contains_key(stat)
    }

    /// Cached values, sorted by stat name.
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        let mut values: Vec<(String, i64)> = self
            .lock()
            .values
            .iter()
            .map(|(stat, value)| (stat.clone(), *value))
            .collect();
        values.sort();
        values
    }

    fn begin(
        &self,
        stat: &str,
    ) -> Result<(Arc<StatRegistry>, MutexGuard<'_, CacheState>), EngineError> {
        let registry = self.registry()?;
        let state = self.lock();
        self.ensure_open(&state)?;
        registry.ensure_registered(stat)?;
        Ok((registry, state))
    }

    fn ensure_open(&self, state: &CacheState) -> Result<(), EngineError> {
        if state.closed {
            Err(EngineError::PlayerDisconnected(self.player))
        } else {
            Ok(())
        }
    }

    fn apply(&self, stat: &str, delta: Decimal) -> Result<i64, EngineError> {
        let (registry, mut state) = self.begin(stat)?;
        let current = self.value_locked(&registry, &mut state, stat)?;
        let updated = add_decimal(current, delta);
        state.values.insert(stat.to_string(), updated);
        state.levels.remove(stat);
        tracing::trace!(player = %self.player, stat, current, updated, "applied delta");
        Ok(updated)
    }

    fn value_locked(
        &self,
        registry: &StatRegistry,
        state: &mut CacheState,
        stat: &str,
    ) -> Result<i64, EngineError> {
        match state.values.get(stat) {
            Some(&value) => Ok(value),
            None => self.load_locked(registry, state, stat),
        }
    }

    fn load_locked(
        &self,
        registry: &StatRegistry,
        state: &mut CacheState,
        stat: &str,
    ) -> Result<i64, EngineError> {
        let value = match self.store.read(&self.player, stat)? {
            Some(value) => {
                tracing::debug!(player = %self.player, stat, value, "loaded stored value");
                value
            }
            None => {
                let value = registry
                    .curves()
                    .get(stat)?
                    .randomized_default(self.random.as_ref());
                tracing::debug!(player = %self.player, stat, value, "rolled default value");
                value
            }
        };
        state.values.insert(stat.to_string(), value);
        state.levels.remove(stat);
        Ok(value)
    }

    fn write(&self, stat: &str, value: i64) -> Result<(), EngineError> {
        match self.store.write(&self.player, stat, value) {
            Ok(()) => {
                tracing::debug!(player = %self.player, stat, value, "saved value");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(player = %self.player, stat, error = %e, "failed to save value");
                Err(e.into())
            }
        }
    }

    fn registry(&self) -> Result<Arc<StatRegistry>, EngineError> {
        self.registry.upgrade().ok_or(EngineError::RegistryClosed)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `current + delta` in decimal, truncated toward zero and clamped to `i64`.
fn add_decimal(current: i64, delta: Decimal) -> i64 {
    let clamp = |negative: bool| if negative { i64::MIN } else { i64::MAX };
    match Decimal::from(current).checked_add(delta) {
        Some(sum) => sum
            .trunc()
            .to_i64()
            .unwrap_or_else(|| clamp(sum.is_sign_negative())),
        None => clamp(delta.is_sign_negative()),
    }
}
