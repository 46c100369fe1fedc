//! Arena Runtime
//!
//! Runs a four-bot match, headless by default or paced in real time with
//! `ARENA_REALTIME=1`, then replays it to check the state hash.
//!
//! Environment:
//! - `ARENA_CONFIG`: path to a TOML config (defaults when unset)
//! - `ARENA_SEED`: overrides `match.seed`
//! - `ARENA_REALTIME`: `1` to run against the wall clock
//! - `RUST_LOG`: log filter (defaults to `info`)

use std::env;
use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use arena_runtime::{
    ArenaConfig, VERSION,
    game::{
        effects::{ResizeEffect, ScoreMultiplierEffect, SpeedBoostEffect},
        events::GameEventData,
        hub::{HubEvent, HubNotification},
        spawn::SpawnKind,
        state::{Arena, PlayerId},
        tick::{simulate, state_hash, MatchRun},
        world::ArenaWorld,
    },
    runtime::run_match,
};

/// Bots try a pickup this often (steps).
const BOT_REACH_INTERVAL: u32 = 45;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config() -> anyhow::Result<ArenaConfig> {
    let mut config = match env::var("ARENA_CONFIG") {
        Ok(path) => ArenaConfig::load(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => ArenaConfig::default(),
    };

    if let Some(seed) = env::var("ARENA_SEED").ok().and_then(|v| v.parse().ok()) {
        config.game.seed = seed;
    }

    config.validate().context("validating config")?;
    Ok(config)
}

/// Arena with one bot per team and the built-in effects registered.
fn setup(config: &ArenaConfig) -> anyhow::Result<(Arena, ArenaWorld)> {
    let mut arena = Arena::new(config);
    for team in 0..config.game.team_count {
        arena.join(PlayerId::new(team as u32), team)?;
    }

    let bus = arena.power_up_bus();
    bus.subscribe(ScoreMultiplierEffect);
    bus.subscribe(ResizeEffect::default());
    bus.subscribe(SpeedBoostEffect::default());

    let world = ArenaWorld::new(config.game.seed, &config.world_settings());
    Ok((arena, world))
}

/// Stand-in for the collision layer: bots take turns grabbing the oldest
/// pickup in the scene.
fn bot_script(arena: &mut Arena, world: &mut ArenaWorld) {
    if arena.tick % BOT_REACH_INTERVAL != 0 {
        return;
    }

    let players = arena.roster().ids();
    if players.is_empty() {
        return;
    }
    let player = players[(arena.tick / BOT_REACH_INTERVAL) as usize % players.len()];

    let target = world
        .pickups()
        .next()
        .map(|(id, kind)| (id, matches!(kind, SpawnKind::PowerUp(_))));

    match target {
        Some((entity, true)) => {
            arena.on_power_up_pickup(player, entity, world);
        }
        Some((entity, false)) => {
            arena.on_scoreable_pickup(player, entity, world);
        }
        None => {}
    }
}

#[derive(Serialize)]
struct MatchSummary {
    version: &'static str,
    seed: u64,
    steps: u32,
    finished: bool,
    level: u32,
    team_scores: Vec<i32>,
    power_ups_applied: usize,
    waves: usize,
    state_hash: String,
}

fn summarize(config: &ArenaConfig, arena: &Arena, world: &ArenaWorld, run: &MatchRun) -> MatchSummary {
    let count = |f: fn(&GameEventData) -> bool| run.events.iter().filter(|e| f(&e.data)).count();
    MatchSummary {
        version: VERSION,
        seed: config.game.seed,
        steps: run.steps,
        finished: run.finished,
        level: arena.hub().state().level_index(),
        team_scores: arena.hub().state().team_scores().to_vec(),
        power_ups_applied: count(|d| matches!(d, GameEventData::PowerUpApplied { .. })),
        waves: count(|d| matches!(d, GameEventData::WaveSpawned { .. })),
        state_hash: hex::encode(state_hash(arena, world)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = load_config()?;
    let realtime = matches!(env::var("ARENA_REALTIME").as_deref(), Ok("1"));

    info!("Arena Runtime v{}", VERSION);
    info!("Tick Rate: {} Hz", config.game.tick_rate);
    info!(
        "Match: {} teams, {} levels of {}s, seed {}",
        config.game.team_count, config.game.level_count, config.game.level_seconds, config.game.seed
    );

    let (mut arena, mut world) = setup(&config)?;

    // HUD stand-ins
    let hub = arena.hub_mut();
    hub.subscribe(HubEvent::ScoreChanged, |note, state| {
        if let HubNotification::ScoreChanged { team_id, points } = note {
            info!("Team {} +{} -> {:?}", team_id, points, state.team_scores());
        }
    });
    hub.subscribe(HubEvent::LevelChanged, |note, _| {
        if let HubNotification::LevelChanged { level } = note {
            info!("Level {}", level);
        }
    });
    hub.subscribe(HubEvent::TimeChanged, |note, _| {
        if let HubNotification::TimeChanged { remaining } = note {
            if remaining % 30 == 0 {
                info!("{}s remaining", remaining);
            }
        }
    });

    let run = if realtime {
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        run_match(&mut arena, &mut world, bot_script, shutdown).await
    } else {
        simulate(&mut arena, &mut world, u32::MAX, bot_script)
    };

    let summary = summarize(&config, &arena, &world, &run);

    info!("=== Match Results ===");
    for (team, score) in summary.team_scores.iter().enumerate() {
        info!("Team {}: {}", team, score);
    }
    info!("Final State Hash: {}", summary.state_hash);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !run.finished {
        warn!("Match stopped before time ran out; skipping replay");
        return Ok(());
    }

    // Replay headless with the same bots
    info!("=== Verifying Determinism ===");
    let (mut replay_arena, mut replay_world) = setup(&config)?;
    simulate(&mut replay_arena, &mut replay_world, u32::MAX, bot_script);
    let replay_hash = hex::encode(state_hash(&replay_arena, &replay_world));

    info!("Replay State Hash: {}", replay_hash);
    if replay_hash == summary.state_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else if realtime {
        // Wall-clock pacing can skip steps, so the step count differs
        warn!("Real-time run diverged from headless replay");
    } else {
        anyhow::bail!("DETERMINISM FAILURE: Hashes differ!");
    }

    Ok(())
}
