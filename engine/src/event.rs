//! Events delivered by the host server.

use statkit_types::PlayerId;

/// A gameplay or lifecycle event forwarded from the host runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJoin { player: PlayerId },
    /// The player disconnected; their cache is flushed and evicted.
    PlayerQuit { player: PlayerId },
    BlockBreak { player: PlayerId, block: String },
    /// The host is shutting down; curves and every cache are flushed.
    Shutdown,
}

impl GameEvent {
    /// The player this event concerns, if any.
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            GameEvent::PlayerJoin { player }
            | GameEvent::PlayerQuit { player }
            | GameEvent::BlockBreak { player, .. } => Some(player),
            GameEvent::Shutdown => None,
        }
    }
}
