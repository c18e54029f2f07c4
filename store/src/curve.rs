//! Level-curve storage trait.

use crate::StoreError;
use statkit_types::StatCurve;

/// Persistence for per-stat level curves, one record per stat.
pub trait CurveStore: Send + Sync {
    /// The stored curve for `stat`, or `None` if nothing has been saved yet.
    fn load_curve(&self, stat: &str) -> Result<Option<StatCurve>, StoreError>;

    /// Store `curve` as the curve for `stat`, replacing any previous record.
    fn save_curve(&self, stat: &str, curve: &StatCurve) -> Result<(), StoreError>;

    /// Names of every stat that has a stored curve.
    fn list_stats(&self) -> Result<Vec<String>, StoreError>;
}
