//! Curve manager: one cached level curve per registered stat.
//!
//! Wraps a [`CurveStore`] with an in-memory cache. A stat without a stored
//! curve gets [`StatCurve::default()`]; it reaches the store the first time the
//! stat is saved (on unregistration, shutdown or an explicit save).

use statkit_store::{CurveStore, StoreError};
use statkit_types::StatCurve;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct CurveManager {
    store: Arc<dyn CurveStore>,
    curves: Mutex<HashMap<String, Arc<StatCurve>>>,
}

impl CurveManager {
    pub fn new(store: Arc<dyn CurveStore>) -> Self {
        Self {
            store,
            curves: Mutex::new(HashMap::new()),
        }
    }

    /// Cached curve for `stat`, loading it on a miss.
    pub fn get(&self, stat: &str) -> Result<Arc<StatCurve>, StoreError> {
        let mut curves = self.lock();
        if let Some(curve) = curves.get(stat) {
            return Ok(Arc::clone(curve));
        }
        self.load_locked(&mut curves, stat)
    }

    /// Read `stat`'s curve from the store (or default it) and cache it,
    /// replacing any cached copy.
    pub fn load(&self, stat: &str) -> Result<Arc<StatCurve>, StoreError> {
        let mut curves = self.lock();
        self.load_locked(&mut curves, stat)
    }

    /// Replace the cached curve for `stat`. Not persisted until saved.
    pub fn set(&self, stat: &str, curve: StatCurve) -> Arc<StatCurve> {
        let curve = Arc::new(curve);
        self.lock().insert(stat.to_string(), Arc::clone(&curve));
        curve
    }

    pub fn is_cached(&self, stat: &str) -> bool {
        self.lock().contains_key(stat)
    }

    /// Persist the cached curve of `stat`. A stat that was never loaded has
    /// nothing to save.
    pub fn save(&self, stat: &str) -> Result<(), StoreError> {
        let curves = self.lock();
        match curves.get(stat) {
            Some(curve) => self.save_one(stat, curve),
            None => Ok(()),
        }
    }

    /// Persist every cached curve. Keeps going past failures and reports the
    /// first one.
    pub fn save_all(&self) -> Result<(), StoreError> {
        let curves = self.lock();
        let mut stats: Vec<&String> = curves.keys().collect();
        stats.sort();

        let mut first_err = None;
        for stat in stats {
            if let Err(e) = self.save_one(stat, &curves[stat]) {
                tracing::warn!(stat = %stat, error = %e, "failed to save curve");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Save and drop the cached curve of `stat`.
    ///
    /// The entry is dropped even if the save fails; the error is returned.
    pub fn unregister(&self, stat: &str) -> Result<(), StoreError> {
        let removed = self.lock().remove(stat);
        match removed {
            Some(curve) => self.save_one(stat, &curve),
            None => Ok(()),
        }
    }

    /// Stats with a curve in the backing store.
    pub fn stats_on_disk(&self) -> Result<Vec<String>, StoreError> {
        self.store.list_stats()
    }

    fn load_locked(
        &self,
        curves: &mut HashMap<String, Arc<StatCurve>>,
        stat: &str,
    ) -> Result<Arc<StatCurve>, StoreError> {
        let curve = match self.store.load_curve(stat)? {
            Some(curve) => {
                tracing::debug!(stat, max = curve.max(), weight = curve.weight(), "loaded curve");
                curve
            }
            None => {
                tracing::debug!(stat, "no stored curve, using default");
                StatCurve::default()
            }
        };
        let curve = Arc::new(curve);
        curves.insert(stat.to_string(), Arc::clone(&curve));
        Ok(curve)
    }

    fn save_one(&self, stat: &str, curve: &StatCurve) -> Result<(), StoreError> {
        self.store.save_curve(stat, curve)?;
        tracing::debug!(stat, "saved curve");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<StatCurve>>> {
        self.curves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
