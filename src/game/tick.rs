//! Simulation Step
//!
//! One fixed step of the arena, plus a headless match loop and the state
//! hash used to check that two runs agree.
//!
//! Step order is fixed:
//! 1. advance the tick counter
//! 2. expire due power-ups (player id order)
//! 3. run the spawn scheduler (power-up, collectable, enemy wave)
//! 4. advance the world (despawns, melting)

use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::events::GameEvent;
use crate::game::state::Arena;
use crate::game::world::{ArenaWorld, Indicator, World};

/// Result of a step.
#[derive(Debug, Default)]
pub struct StepResult {
    /// Tick that was just simulated
    pub tick: u32,
    /// Events since the previous step, ordered by tick, priority and player
    pub events: Vec<GameEvent>,
}

/// Run one simulation step.
///
/// # Determinism
///
/// Given the same arena seed, the same world seed and the same pickup
/// reports between steps, every step produces identical state.
pub fn step<W: World + Indicator>(arena: &mut Arena, world: &mut W) -> StepResult {
    // 0. Advance tick counter
    arena.tick += 1;

    // 1. Power-ups whose deadline has passed
    arena.expire_power_ups(world);

    // 2. Spawns
    arena.run_spawns(world);

    // 3. World timers
    world.advance(arena.tick);

    let mut events = arena.take_events();
    events.sort();

    StepResult {
        tick: arena.tick,
        events,
    }
}

/// Hash of everything a replay must reproduce.
pub fn state_hash(arena: &Arena, world: &ArenaWorld) -> StateHash {
    compute_state_hash(arena.tick, arena.rng_seed, |hasher| {
        arena.hash_into(hasher);
        world.hash_into(hasher);
    })
}

/// Outcome of a headless run.
#[derive(Debug, Default)]
pub struct MatchRun {
    /// Steps simulated
    pub steps: u32,
    /// All events, in step order
    pub events: Vec<GameEvent>,
    /// Did match time run out?
    pub finished: bool,
}

/// Run a match without wall-clock pacing.
///
/// After each step `script` plays the collision layer and may report
/// pickups. The match clock ticks every `tick_rate` steps. Stops after
/// `max_steps` or when time runs out.
pub fn simulate<F>(arena: &mut Arena, world: &mut ArenaWorld, max_steps: u32, mut script: F) -> MatchRun
where
    F: FnMut(&mut Arena, &mut ArenaWorld),
{
    let mut run = MatchRun::default();
    let tick_rate = arena.tick_rate().max(1);

    for _ in 0..max_steps {
        let result = step(arena, world);
        run.events.extend(result.events);
        run.steps += 1;

        script(arena, world);

        if arena.tick % tick_rate == 0 && arena.tick_clock() {
            run.finished = true;
            break;
        }
    }

    // Pickups and clock events reported after the last step
    let mut tail = arena.take_events();
    tail.sort();
    run.events.extend(tail);

    run
}
