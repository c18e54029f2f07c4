//! Scenario tests driving the registry the way a game host would:
//! stat registration → player join → listener-driven increments →
//! quit/unregister/shutdown flushing values back to the player store.
//!
//! Every external boundary is a nullable, so each assertion can check
//! exactly what reached storage.

use statkit_engine::{
    EngineError, GameEvent, ListenerContext, ListenerError, ListenerState, ListenerTable,
    RegistryDeps, StatEventListener, StatRegistry,
};
use statkit_nullables::{NullCurveStore, NullPlayerStore, NullRandom};
use statkit_types::{PlayerId, StatCurve, StatError};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    players: Arc<NullPlayerStore>,
    curves: Arc<NullCurveStore>,
    registry: Arc<StatRegistry>,
}

fn harness_with(listeners: ListenerTable) -> Harness {
    let players = Arc::new(NullPlayerStore::new());
    let curves = Arc::new(NullCurveStore::new());
    let registry = StatRegistry::new(
        RegistryDeps::new(players.clone(), curves.clone())
            .with_listeners(listeners)
            .with_random(Arc::new(NullRandom::baseline())),
    );
    Harness {
        players,
        curves,
        registry,
    }
}

fn harness() -> Harness {
    harness_with(ListenerTable::new())
}

/// Breaking any block increments the listener's stat by one.
struct BlockBreakListener {
    ctx: ListenerContext,
}

impl StatEventListener for BlockBreakListener {
    fn stat(&self) -> &str {
        self.ctx.stat()
    }

    fn handle(&self, event: &GameEvent) -> Result<(), EngineError> {
        if let GameEvent::BlockBreak { player, .. } = event {
            self.ctx.increment(player, 1)?;
        }
        Ok(())
    }
}

fn block_break_listener(
    ctx: ListenerContext,
) -> Result<Box<dyn StatEventListener>, ListenerError> {
    Ok(Box::new(BlockBreakListener { ctx }))
}

fn block_break(player: PlayerId) -> GameEvent {
    GameEvent::BlockBreak {
        player,
        block: "stone".into(),
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

#[test]
fn levels_follow_power_curve() {
    let h = harness();
    h.curves.seed("strength", StatCurve::new(0, 0, 3, 2).unwrap());
    h.registry.register("strength").unwrap();
    assert_eq!(h.registry.curve("strength").unwrap().levels(), &[1, 2, 4, 8]);

    let cache = h.registry.create_cache(&PlayerId::random());
    for (value, level) in [(0, 0), (1, 0), (2, 1), (3, 1), (4, 2), (100, 3)] {
        cache.set("strength", value).unwrap();
        assert_eq!(cache.level("strength").unwrap(), level, "value {value}");
    }
}

#[test]
fn level_tracks_increments() {
    let h = harness();
    h.curves.seed("strength", StatCurve::new(0, 0, 3, 2).unwrap());
    h.registry.register("strength").unwrap();
    let cache = h.registry.create_cache(&PlayerId::random());

    assert_eq!(cache.level("strength").unwrap(), 0);
    cache.increment("strength", 2).unwrap();
    assert_eq!(cache.level("strength").unwrap(), 1);
    cache.increment("strength", 2).unwrap();
    assert_eq!(cache.level("strength").unwrap(), 2);
    cache.decrement("strength", 4).unwrap();
    assert_eq!(cache.level("strength").unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn duplicate_registration_is_rejected() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let err = h.registry.register("strength").unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(matches!(
        err,
        EngineError::Stat(StatError::DuplicateStat(ref name)) if name == "strength"
    ));
    assert_eq!(h.registry.stats(), vec!["strength"]);
}

#[test]
fn unregister_saves_cached_value_exactly_once() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.registry.create_cache(&player).set("strength", 42).unwrap();

    h.registry.unregister("strength").unwrap();
    assert_eq!(h.players.write_count(&player, "strength"), 1);
    assert_eq!(h.players.value(&player, "strength"), Some(42));
    assert!(!h.registry.is_registered("strength"));
    assert!(!h.registry.create_cache(&player).is_cached("strength"));
    assert_eq!(h.curves.save_count("strength"), 1);

    // Nothing is cached any more, so shutdown writes nothing further.
    h.registry.shutdown().unwrap();
    assert_eq!(h.players.write_count(&player, "strength"), 1);
}

#[test]
fn unregister_skips_players_without_value() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.registry.create_cache(&player);
    h.registry.unregister("strength").unwrap();
    assert!(h.players.writes().is_empty());
}

#[test]
fn reregistered_stat_reads_saved_value() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.registry.create_cache(&player).set("strength", 9).unwrap();
    h.registry.unregister("strength").unwrap();

    h.registry.register("strength").unwrap();
    assert_eq!(h.registry.create_cache(&player).get("strength").unwrap(), 9);
}

#[test]
fn unregister_reports_save_failure_but_still_removes() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.registry.create_cache(&player).set("strength", 1).unwrap();

    h.players.fail_writes(true);
    assert!(matches!(
        h.registry.unregister("strength"),
        Err(EngineError::Store(_))
    ));
    assert!(!h.registry.is_registered("strength"));
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn set_then_get_round_trips() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let cache = h.registry.create_cache(&PlayerId::random());
    for value in [0, -1, 17, i64::MAX, i64::MIN] {
        cache.set("strength", value).unwrap();
        assert_eq!(cache.get("strength").unwrap(), value);
    }
}

#[test]
fn missing_value_uses_randomized_default() {
    let players = Arc::new(NullPlayerStore::new());
    let curves = Arc::new(NullCurveStore::new());
    curves.seed("strength", StatCurve::new(10, 4, 1, 2).unwrap());
    // u1 = 0.75, u2 = 0.5: 10 + trunc((0.75 * 8 - 4) * 0.5) = 11
    let registry = StatRegistry::new(
        RegistryDeps::new(players.clone(), curves.clone())
            .with_random(Arc::new(NullRandom::new(vec![0.75, 0.5]))),
    );
    registry.register("strength").unwrap();
    let player = PlayerId::random();
    assert_eq!(registry.create_cache(&player).get("strength").unwrap(), 11);
}

#[test]
fn stored_value_wins_over_default() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.players.seed(&player, "strength", 30);
    let cache = h.registry.create_cache(&player);
    assert_eq!(cache.get("strength").unwrap(), 30);

    cache.set("strength", 31).unwrap();
    h.players.seed(&player, "strength", 40);
    assert_eq!(cache.get("strength").unwrap(), 31);
    assert_eq!(cache.load("strength").unwrap(), 40);
}

#[test]
fn fractional_increments_truncate() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let cache = h.registry.create_cache(&PlayerId::random());
    cache.set("strength", 10).unwrap();

    let half = rust_decimal::Decimal::new(5, 1);
    assert_eq!(cache.increment("strength", half).unwrap(), 10);
    assert_eq!(cache.increment("strength", 2i32).unwrap(), 12);
    assert_eq!(cache.decrement("strength", 20i64).unwrap(), -8);

    cache.set("strength", i64::MAX).unwrap();
    assert_eq!(cache.increment("strength", 1).unwrap(), i64::MAX);
}

#[test]
fn save_twice_writes_same_value() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    let cache = h.registry.create_cache(&player);
    cache.set("strength", 5).unwrap();

    cache.save("strength").unwrap();
    cache.save("strength").unwrap();
    let writes = h.players.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|w| w.value == 5));
}

#[test]
fn save_of_uncached_stat_loads_first() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    let cache = h.registry.create_cache(&player);
    cache.save("strength").unwrap();
    assert!(cache.is_cached("strength"));
    assert_eq!(h.players.value(&player, "strength"), Some(0));
}

#[test]
fn offline_player_save_is_noop() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    h.players.set_offline(&player, true);
    let cache = h.registry.create_cache(&player);
    cache.set("strength", 3).unwrap();
    cache.save_all().unwrap();
    assert_eq!(h.players.write_count(&player, "strength"), 0);
    assert_eq!(h.players.value(&player, "strength"), None);
}

#[test]
fn unregistered_stat_is_rejected_by_cache() {
    let h = harness();
    let cache = h.registry.create_cache(&PlayerId::random());
    assert!(cache.set("luck", 1).unwrap_err().is_invalid_argument());
    assert!(cache.increment("luck", 1).unwrap_err().is_invalid_argument());
    assert!(cache.save("luck").unwrap_err().is_invalid_argument());
    assert!(cache.snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

#[test]
fn block_break_drives_listener() {
    let mut table = ListenerTable::new();
    table.insert("strength", block_break_listener);
    let h = harness_with(table);

    assert_eq!(
        h.registry.register("strength").unwrap(),
        ListenerState::Attached
    );
    let player = PlayerId::random();
    h.registry
        .dispatch(&GameEvent::PlayerJoin { player })
        .unwrap();
    for _ in 0..3 {
        h.registry.dispatch(&block_break(player)).unwrap();
    }
    assert_eq!(h.registry.create_cache(&player).get("strength").unwrap(), 3);
}

#[test]
fn register_with_listener_attaches() {
    let h = harness();
    let state = h
        .registry
        .register_with_listener("mining", block_break_listener)
        .unwrap();
    assert_eq!(state, ListenerState::Attached);
    assert_eq!(h.registry.events().enabled(), vec!["mining"]);
}

#[test]
fn register_listener_type_derives_stat() {
    let h = harness();
    let (stat, state) = h
        .registry
        .register_listener_type("StrengthEventListener", block_break_listener)
        .unwrap();
    assert_eq!(stat, "strength");
    assert_eq!(state, ListenerState::Attached);

    assert!(h
        .registry
        .register_listener_type("Strength", block_break_listener)
        .unwrap_err()
        .is_invalid_argument());
}

#[test]
fn listener_failure_keeps_stat_registered() {
    let mut table = ListenerTable::new();
    table.insert("strength", |ctx: ListenerContext| {
        Err(ListenerError::Construction {
            stat: ctx.stat().to_string(),
            reason: "no default constructor".into(),
        })
    });
    let h = harness_with(table);

    let state = h.registry.register("strength").unwrap();
    assert!(matches!(state, ListenerState::Failed(ListenerError::Construction { .. })));
    assert!(h.registry.is_registered("strength"));
    assert!(h.registry.events().enabled().is_empty());
}

#[test]
fn disabled_listener_ignores_events() {
    let h = harness();
    h.registry
        .register_with_listener("strength", block_break_listener)
        .unwrap();
    let player = PlayerId::random();
    h.registry.dispatch(&GameEvent::PlayerJoin { player }).unwrap();

    assert!(h.registry.disable_listener("strength"));
    h.registry.dispatch(&block_break(player)).unwrap();
    assert_eq!(h.registry.create_cache(&player).get("strength").unwrap(), 0);

    assert_eq!(
        h.registry.enable_listener("strength").unwrap(),
        ListenerState::Attached
    );
    h.registry.dispatch(&block_break(player)).unwrap();
    assert_eq!(h.registry.create_cache(&player).get("strength").unwrap(), 1);
}

#[test]
fn enable_without_factory_is_missing() {
    let h = harness();
    h.registry.register("strength").unwrap();
    assert!(matches!(
        h.registry.enable_listener("strength"),
        Err(EngineError::Listener(ListenerError::Missing(_)))
    ));
}

#[test]
fn unregister_detaches_listener() {
    let h = harness();
    h.registry
        .register_with_listener("strength", block_break_listener)
        .unwrap();
    h.registry.unregister("strength").unwrap();
    assert!(h.registry.events().enabled().is_empty());
    // The event reaches no listener; no cache is created for the player.
    let player = PlayerId::random();
    h.registry.dispatch(&block_break(player)).unwrap();
    assert!(h.registry.cache(&player).is_none());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn quit_evicts_and_saves() {
    let h = harness();
    h.registry.register("strength").unwrap();
    h.registry.register("agility").unwrap();
    let player = PlayerId::random();
    h.registry.dispatch(&GameEvent::PlayerJoin { player }).unwrap();
    h.registry.create_cache(&player).set("strength", 8).unwrap();

    h.registry.dispatch(&GameEvent::PlayerQuit { player }).unwrap();
    assert!(h.registry.cache(&player).is_none());
    assert_eq!(h.players.value(&player, "strength"), Some(8));
    assert_eq!(h.players.value(&player, "agility"), Some(0));
}

#[test]
fn event_after_quit_does_not_revive_cache() {
    let mut table = ListenerTable::new();
    table.insert("strength", block_break_listener);
    let h = harness_with(table);
    h.registry.register("strength").unwrap();

    let player = PlayerId::random();
    h.registry.dispatch(&GameEvent::PlayerJoin { player }).unwrap();
    h.registry.dispatch(&block_break(player)).unwrap();
    h.registry.dispatch(&GameEvent::PlayerQuit { player }).unwrap();
    h.registry.dispatch(&block_break(player)).unwrap();

    assert!(h.registry.players().is_empty());
    assert_eq!(h.players.value(&player, "strength"), Some(1));
    assert_eq!(h.players.write_count(&player, "strength"), 1);
}

#[test]
fn event_for_unjoined_player_creates_no_cache() {
    let h = harness();
    h.registry
        .register_with_listener("strength", block_break_listener)
        .unwrap();

    let player = PlayerId::random();
    h.registry.dispatch(&block_break(player)).unwrap();
    assert!(h.registry.cache(&player).is_none());
    assert!(h.players.writes().is_empty());
}

#[test]
fn evicted_cache_rejects_late_writes() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let player = PlayerId::random();
    let cache = h.registry.create_cache(&player);
    cache.set("strength", 5).unwrap();

    h.registry.on_player_quit(&player).unwrap();
    assert!(matches!(
        cache.increment("strength", 1),
        Err(EngineError::PlayerDisconnected(_))
    ));
    assert!(matches!(
        cache.get("strength"),
        Err(EngineError::PlayerDisconnected(_))
    ));
    assert_eq!(h.players.value(&player, "strength"), Some(5));
}

#[test]
fn quit_of_unknown_player_is_noop() {
    let h = harness();
    h.registry.on_player_quit(&PlayerId::random()).unwrap();
    assert!(h.players.writes().is_empty());
}

#[test]
fn shutdown_flushes_curves_and_players() {
    let h = harness();
    h.registry.register("strength").unwrap();
    let (a, b) = (PlayerId::random(), PlayerId::random());
    h.registry.create_cache(&a).set("strength", 1).unwrap();
    h.registry.create_cache(&b).set("strength", 2).unwrap();

    h.registry.dispatch(&GameEvent::Shutdown).unwrap();
    assert_eq!(h.players.value(&a, "strength"), Some(1));
    assert_eq!(h.players.value(&b, "strength"), Some(2));
    assert_eq!(h.curves.save_count("strength"), 1);
    assert!(h.registry.players().is_empty());
}

#[test]
fn replaced_curve_is_persisted_on_save() {
    let h = harness();
    h.registry.register("strength").unwrap();
    h.registry
        .set_curve(
            "strength",
            StatCurve::new(0, 0, 5, 3).unwrap().with_description("raw power"),
        )
        .unwrap();
    h.registry.save().unwrap();
    let stored = h.curves.curve("strength").unwrap();
    assert_eq!(stored.max(), 5);
    assert_eq!(stored.description(), "raw power");
}
