//! statkit daemon: inspect and drive a file-backed stat registry.

mod config;
mod listeners;

use anyhow::Context;
use clap::Parser;
use config::DaemonConfig;
use rust_decimal::Decimal;
use statkit_engine::{GameEvent, ListenerState, RegistryDeps, StatRegistry};
use statkit_store::PlayerDataStore;
use statkit_store_fs::{DataDir, JsonPlayerStore, TomlCurveStore};
use statkit_types::PlayerId;
use statkit_utils::{init_logging, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "statkit", about = "Player stat registry")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "STATKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding stat curves and player values.
    #[arg(long, env = "STATKIT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STATKIT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STATKIT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Manage registered stats.
    Stat {
        #[command(subcommand)]
        action: StatAction,
    },
    /// Read and change a player's values.
    Player {
        #[command(subcommand)]
        action: PlayerAction,
    },
    /// Run concurrent players breaking blocks through the strength listener.
    Simulate {
        #[arg(long, default_value_t = 4)]
        players: usize,

        /// Blocks broken per player.
        #[arg(long, default_value_t = 100)]
        breaks: usize,
    },
}

#[derive(clap::Subcommand)]
enum StatAction {
    /// List registered stats and their curves.
    List,
    /// Register a new stat.
    Register {
        name: String,
        #[arg(long)]
        default: Option<i64>,
        #[arg(long)]
        random: Option<i64>,
        #[arg(long)]
        max: Option<i32>,
        #[arg(long)]
        weight: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Unregister a stat, flushing every cached value first.
    Unregister { name: String },
    /// Print the level thresholds of a stat.
    Levels { name: String },
}

#[derive(clap::Subcommand)]
enum PlayerAction {
    /// Show every stat of a player.
    Show { player: PlayerId },
    /// Overwrite one value.
    Set {
        player: PlayerId,
        stat: String,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
    /// Add a (possibly fractional or negative) delta to one value.
    Add {
        player: PlayerId,
        stat: String,
        #[arg(allow_hyphen_values = true)]
        delta: Decimal,
    },
}

/// The opened data directory and the registry over it.
struct App {
    registry: Arc<StatRegistry>,
    players: Arc<JsonPlayerStore>,
}

impl App {
    fn open(config: &DaemonConfig) -> anyhow::Result<Self> {
        let data = DataDir::open(&config.data_dir)
            .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
        let players = Arc::new(JsonPlayerStore::new(data.players_dir()));
        let curves = Arc::new(TomlCurveStore::new(data.stats_dir()));

        let registry = StatRegistry::new(
            RegistryDeps::new(players.clone(), curves).with_listeners(listeners::builtin()?),
        );
        let loaded = registry.load().context("loading stored stats")?;
        tracing::info!(data_dir = %data.root().display(), loaded, "opened stat registry");

        Ok(Self { registry, players })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    init_logging(config.log_format, &config.log_level)?;

    let app = App::open(&config)?;
    let result = run(&app, &config, cli.command);
    let flushed = app.registry.shutdown().context("flushing stat registry");
    result?;
    flushed?;
    Ok(())
}

fn run(app: &App, config: &DaemonConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Stat { action } => run_stat(app, config, action),
        Command::Player { action } => run_player(app, action),
        Command::Simulate { players, breaks } => simulate(app, players, breaks),
    }
}

fn run_stat(app: &App, config: &DaemonConfig, action: StatAction) -> anyhow::Result<()> {
    let registry = &app.registry;
    match action {
        StatAction::List => {
            let stats = registry.stats();
            if stats.is_empty() {
                println!("no stats registered");
            }
            for stat in stats {
                let curve = registry.curve(&stat)?;
                let listener = if registry.events().is_enabled(&stat) {
                    " [listener]"
                } else {
                    ""
                };
                println!(
                    "{stat}: default={} random={} max={} weight={}{listener}",
                    curve.default_value(),
                    curve.random(),
                    curve.max(),
                    curve.weight(),
                );
                if !curve.description().is_empty() {
                    println!("    {}", curve.description());
                }
            }
        }
        StatAction::Register {
            name,
            default,
            random,
            max,
            weight,
            description,
        } => {
            let curve = config.curve(default, random, max, weight)?;
            let curve = match description {
                Some(description) => curve.with_description(description),
                None => curve,
            };
            let state = registry.register(&name)?;
            registry.set_curve(&name, curve)?;
            match state {
                ListenerState::None => println!("registered '{name}'"),
                ListenerState::Attached => println!("registered '{name}' with listener"),
                ListenerState::Failed(e) => println!("registered '{name}', listener failed: {e}"),
            }
        }
        StatAction::Unregister { name } => {
            registry.unregister(&name)?;
            println!("unregistered '{name}'");
        }
        StatAction::Levels { name } => {
            let curve = registry.curve(&name)?;
            println!("{:>6}  threshold", "level");
            for (level, threshold) in curve.levels().iter().enumerate() {
                println!("{level:>6}  {threshold}");
            }
        }
    }
    Ok(())
}

fn run_player(app: &App, action: PlayerAction) -> anyhow::Result<()> {
    let registry = &app.registry;
    match action {
        PlayerAction::Show { player } => {
            for line in describe_player(app, &player)? {
                println!("{line}");
            }
        }
        PlayerAction::Set {
            player,
            stat,
            value,
        } => {
            registry.create_cache(&player).set(&stat, value)?;
            registry.on_player_quit(&player)?;
            println!("{player} {stat} = {value}");
        }
        PlayerAction::Add {
            player,
            stat,
            delta,
        } => {
            let cache = registry.create_cache(&player);
            let value = cache.increment(&stat, delta)?;
            let level = cache.level(&stat)?;
            registry.on_player_quit(&player)?;
            println!("{player} {stat} = {value} (level {level})");
        }
    }
    Ok(())
}

/// One line per registered stat, read straight from storage. Inspecting a
/// player must not roll and persist defaults for stats it never had.
fn describe_player(app: &App, player: &PlayerId) -> anyhow::Result<Vec<String>> {
    let stored = app.players.read_all(player)?;
    let stats = app.registry.stats();
    if stats.is_empty() {
        return Ok(vec![format!("{player}: no stats")]);
    }
    let mut lines = Vec::with_capacity(stats.len());
    for stat in stats {
        let curve = app.registry.curve(&stat)?;
        let Some(&value) = stored.get(&stat) else {
            lines.push(format!("{stat}: unset (default {})", curve.default_value()));
            continue;
        };
        let level = curve.level(value);
        lines.push(match curve.next_threshold(value) {
            Some(next) => format!("{stat}: {value} (level {level}, next at {next})"),
            None => format!("{stat}: {value} (level {level}, max)"),
        });
    }
    Ok(lines)
}

const SIMULATED_STAT: &str = "strength";

fn simulate(app: &App, players: usize, breaks: usize) -> anyhow::Result<()> {
    let registry = &app.registry;
    if !registry.is_registered(SIMULATED_STAT) {
        registry.register(SIMULATED_STAT)?;
    }
    if !registry.events().is_enabled(SIMULATED_STAT) {
        registry.enable_listener(SIMULATED_STAT)?;
    }

    let ids: Vec<PlayerId> = (0..players).map(|_| PlayerId::random()).collect();
    let started = Instant::now();

    std::thread::scope(|s| -> anyhow::Result<()> {
        let handles: Vec<_> = ids
            .iter()
            .map(|&player| {
                s.spawn(move || {
                    registry.dispatch(&GameEvent::PlayerJoin { player })?;
                    for i in 0..breaks {
                        registry.dispatch(&GameEvent::BlockBreak {
                            player,
                            block: format!("block-{i}"),
                        })?;
                    }
                    registry.dispatch(&GameEvent::PlayerQuit { player })
                })
            })
            .collect();
        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("simulated player thread panicked"))??;
        }
        Ok(())
    })?;

    let elapsed = started.elapsed();
    for player in &ids {
        let value = app.players.read(player, SIMULATED_STAT)?.unwrap_or_default();
        println!("{player}: {SIMULATED_STAT} = {value}");
    }
    tracing::info!(
        players,
        breaks,
        elapsed_ms = elapsed.as_millis() as u64,
        "simulation finished"
    );
    Ok(())
}
