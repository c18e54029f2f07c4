//! Built-in stat listeners.

use statkit_engine::{
    EngineError, GameEvent, ListenerContext, ListenerError, ListenerTable, StatEventListener,
};

/// Breaking a block makes a player stronger.
pub struct StrengthEventListener {
    ctx: ListenerContext,
}

impl StrengthEventListener {
    pub const TYPE_NAME: &'static str = "StrengthEventListener";

    pub fn build(ctx: ListenerContext) -> Result<Box<dyn StatEventListener>, ListenerError> {
        Ok(Box::new(Self { ctx }))
    }
}

impl StatEventListener for StrengthEventListener {
    fn stat(&self) -> &str {
        self.ctx.stat()
    }

    fn handle(&self, event: &GameEvent) -> Result<(), EngineError> {
        if let GameEvent::BlockBreak { player, block } = event {
            let value = self.ctx.increment(player, 1)?;
            tracing::trace!(player = %player, block = %block, value, "block broken");
        }
        Ok(())
    }
}

/// Factory table for every built-in listener.
pub fn builtin() -> Result<ListenerTable, ListenerError> {
    let mut table = ListenerTable::new();
    table.insert_type(StrengthEventListener::TYPE_NAME, StrengthEventListener::build)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statkit_engine::{ListenerState, RegistryDeps, StatRegistry};
    use statkit_nullables::{NullCurveStore, NullPlayerStore, NullRandom};
    use statkit_types::PlayerId;
    use std::sync::Arc;

    #[test]
    fn block_break_increments_strength() {
        let registry = StatRegistry::new(
            RegistryDeps::new(
                Arc::new(NullPlayerStore::new()),
                Arc::new(NullCurveStore::new()),
            )
            .with_listeners(builtin().unwrap())
            .with_random(Arc::new(NullRandom::baseline())),
        );
        assert_eq!(registry.register("strength").unwrap(), ListenerState::Attached);

        let player = PlayerId::random();
        let block_break = GameEvent::BlockBreak {
            player,
            block: "stone".into(),
        };
        registry.dispatch(&GameEvent::PlayerJoin { player }).unwrap();
        registry.dispatch(&block_break).unwrap();
        registry.dispatch(&block_break).unwrap();
        assert_eq!(registry.cache(&player).unwrap().get("strength").unwrap(), 2);
    }

    #[test]
    fn block_break_after_quit_is_ignored() {
        let players = Arc::new(NullPlayerStore::new());
        let registry = StatRegistry::new(
            RegistryDeps::new(players.clone(), Arc::new(NullCurveStore::new()))
                .with_listeners(builtin().unwrap())
                .with_random(Arc::new(NullRandom::baseline())),
        );
        registry.register("strength").unwrap();

        let player = PlayerId::random();
        registry.dispatch(&GameEvent::PlayerJoin { player }).unwrap();
        registry.dispatch(&GameEvent::PlayerQuit { player }).unwrap();
        registry
            .dispatch(&GameEvent::BlockBreak {
                player,
                block: "stone".into(),
            })
            .unwrap();
        assert!(registry.players().is_empty());
        assert_eq!(players.value(&player, "strength"), Some(0));
    }
}
