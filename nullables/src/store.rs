//! Nullable stores: thread-safe in-memory storage for testing.

use statkit_store::{CurveStore, PlayerDataStore, StoreError};
use statkit_types::{PlayerId, StatCurve};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// One write that reached a [`NullPlayerStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub player: PlayerId,
    pub stat: String,
    pub value: i64,
}

/// An in-memory player attribute store for testing.
///
/// Players can be marked offline (reads return `None`, writes are dropped,
/// as the host server behaves) and writes can be made to fail. Every write
/// that lands is recorded.
pub struct NullPlayerStore {
    values: Mutex<HashMap<(PlayerId, String), i64>>,
    offline: Mutex<HashSet<PlayerId>>,
    writes: Mutex<Vec<WriteRecord>>,
    fail_writes: AtomicBool,
}

impl NullPlayerStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            offline: Mutex::new(HashSet::new()),
            writes: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Pre-populate a persisted value without recording a write.
    pub fn seed(&self, player: &PlayerId, stat: &str, value: i64) {
        lock(&self.values).insert((*player, stat.to_string()), value);
    }

    /// The persisted value, regardless of the player's online state.
    pub fn value(&self, player: &PlayerId, stat: &str) -> Option<i64> {
        lock(&self.values).get(&(*player, stat.to_string())).copied()
    }

    pub fn set_offline(&self, player: &PlayerId, offline: bool) {
        let mut set = lock(&self.offline);
        if offline {
            set.insert(*player);
        } else {
            set.remove(player);
        }
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every write recorded so far, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock(&self.writes).clone()
    }

    /// Number of writes recorded for one player/stat pair.
    pub fn write_count(&self, player: &PlayerId, stat: &str) -> usize {
        lock(&self.writes)
            .iter()
            .filter(|w| w.player == *player && w.stat == stat)
            .count()
    }

    fn is_offline(&self, player: &PlayerId) -> bool {
        lock(&self.offline).contains(player)
    }
}

impl Default for NullPlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerDataStore for NullPlayerStore {
    fn read(&self, player: &PlayerId, stat: &str) -> Result<Option<i64>, StoreError> {
        if self.is_offline(player) {
            return Ok(None);
        }
        Ok(self.value(player, stat))
    }

    fn write(&self, player: &PlayerId, stat: &str, value: i64) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "write of '{stat}' for {player} refused"
            )));
        }
        if self.is_offline(player) {
            return Ok(());
        }
        lock(&self.values).insert((*player, stat.to_string()), value);
        lock(&self.writes).push(WriteRecord {
            player: *player,
            stat: stat.to_string(),
            value,
        });
        Ok(())
    }
}

/// An in-memory curve store for testing.
pub struct NullCurveStore {
    curves: Mutex<HashMap<String, StatCurve>>,
    saves: Mutex<Vec<String>>,
}

impl NullCurveStore {
    pub fn new() -> Self {
        Self {
            curves: Mutex::new(HashMap::new()),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Pre-populate a persisted curve without recording a save.
    pub fn seed(&self, stat: &str, curve: StatCurve) {
        lock(&self.curves).insert(stat.to_string(), curve);
    }

    /// The persisted curve, if any.
    pub fn curve(&self, stat: &str) -> Option<StatCurve> {
        lock(&self.curves).get(stat).cloned()
    }

    /// Number of saves recorded for `stat`.
    pub fn save_count(&self, stat: &str) -> usize {
        lock(&self.saves).iter().filter(|s| *s == stat).count()
    }
}

impl Default for NullCurveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveStore for NullCurveStore {
    fn load_curve(&self, stat: &str) -> Result<Option<StatCurve>, StoreError> {
        Ok(self.curve(stat))
    }

    fn save_curve(&self, stat: &str, curve: &StatCurve) -> Result<(), StoreError> {
        lock(&self.curves).insert(stat.to_string(), curve.clone());
        lock(&self.saves).push(stat.to_string());
        Ok(())
    }

    fn list_stats(&self) -> Result<Vec<String>, StoreError> {
        let mut stats: Vec<String> = lock(&self.curves).keys().cloned().collect();
        stats.sort();
        Ok(stats)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
