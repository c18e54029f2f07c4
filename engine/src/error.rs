//! Engine errors.

use statkit_store::StoreError;
use statkit_types::{PlayerId, StatError};
use thiserror::Error;

/// Failure to attach a listener to a stat.
///
/// Only aborts the listener, never the stat registration it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("failed to construct listener for stat '{stat}': {reason}")]
    Construction { stat: String, reason: String },

    #[error("no listener is known for stat '{0}'")]
    Missing(String),

    #[error("'{0}' does not follow the <Stat>EventListener naming convention")]
    InvalidTypeName(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Stat(#[from] StatError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("stat registry has been dropped")]
    RegistryClosed,

    #[error("player {0} is not connected")]
    PlayerDisconnected(PlayerId),
}

impl EngineError {
    /// Whether this is a caller error (bad name, unknown stat, bad curve,
    /// listener construction) rather than a storage or lifecycle failure.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, EngineError::Stat(_) | EngineError::Listener(_))
    }
}
