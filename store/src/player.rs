//! Per-player attribute storage trait.

use crate::StoreError;
use statkit_types::PlayerId;

/// Key-value attribute store attached to a player, keyed by stat name.
///
/// Implementations must tolerate a player who is not currently connected:
/// reads return `Ok(None)` and writes succeed without doing anything. Values
/// then stay unpersisted until the player is next available.
pub trait PlayerDataStore: Send + Sync {
    /// Persisted value of `stat` for `player`, if any.
    fn read(&self, player: &PlayerId, stat: &str) -> Result<Option<i64>, StoreError>;

    /// Persist `value` as the value of `stat` for `player`.
    fn write(&self, player: &PlayerId, stat: &str, value: i64) -> Result<(), StoreError>;
}
