//! JSON player files, one per player.

use crate::environment::{read_optional, write_atomic};
use crate::FsError;
use statkit_store::{PlayerDataStore, StoreError};
use statkit_types::PlayerId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Stores each player's values at `<root>/<uuid>.json` as a `stat -> value` map.
///
/// Writes are a read-modify-write of the whole file, serialized by a
/// store-wide lock.
pub struct JsonPlayerStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPlayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn player_path(&self, player: &PlayerId) -> PathBuf {
        self.root.join(format!("{player}.json"))
    }

    /// Every persisted value of `player`.
    pub fn read_all(&self, player: &PlayerId) -> Result<BTreeMap<String, i64>, StoreError> {
        let path = self.player_path(player);
        let Some(content) = read_optional(&path)? else {
            return Ok(BTreeMap::new());
        };
        let values = serde_json::from_str(&content).map_err(|e| FsError::Malformed {
            path,
            reason: e.to_string(),
        })?;
        Ok(values)
    }
}

impl PlayerDataStore for JsonPlayerStore {
    fn read(&self, player: &PlayerId, stat: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.read_all(player)?.get(stat).copied())
    }

    fn write(&self, player: &PlayerId, stat: &str, value: i64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all(player)?;
        values.insert(stat.to_string(), value);
        let content = serde_json::to_string_pretty(&values)
            .map_err(|e| FsError::Serialization(e.to_string()))?;
        write_atomic(&self.player_path(player), &content)?;
        tracing::trace!(%player, stat, value, "wrote player value");
        Ok(())
    }
}
