//! Real-Time Driver
//!
//! Paces the simulation against the wall clock: one step every
//! `1 / tick_rate` seconds and one match-clock second every second. The
//! two timers are independent, so a slow step never stretches the match.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::state::Arena;
use crate::game::tick::{step, MatchRun};
use crate::game::world::ArenaWorld;

/// Run a match in real time until the clock runs out or `shutdown` resolves.
///
/// After each step `script` plays the collision layer, exactly as in
/// [`crate::game::tick::simulate`].
pub async fn run_match<F, S>(
    arena: &mut Arena,
    world: &mut ArenaWorld,
    mut script: F,
    shutdown: S,
) -> MatchRun
where
    F: FnMut(&mut Arena, &mut ArenaWorld),
    S: Future<Output = ()>,
{
    let tick_rate = arena.tick_rate().max(1);
    let mut run = MatchRun::default();

    let step_duration = Duration::from_micros(1_000_000 / tick_rate as u64);
    let mut step_interval = interval(step_duration);
    step_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut clock_interval = interval(Duration::from_secs(1));
    clock_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    clock_interval.tick().await;

    tokio::pin!(shutdown);

    info!("Real-time match started at {} Hz", tick_rate);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Match stopped at tick {}", arena.tick);
                break;
            }

            _ = clock_interval.tick() => {
                if arena.tick_clock() {
                    run.finished = true;
                    break;
                }
                debug!("{}s remaining", arena.hub().state().remaining_time());
            }

            _ = step_interval.tick() => {
                let result = step(arena, world);
                run.events.extend(result.events);
                run.steps += 1;
                script(arena, world);
            }
        }
    }

    let mut tail = arena.take_events();
    tail.sort();
    run.events.extend(tail);

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::game::events::GameEventData;
    use crate::game::state::PlayerId;

    fn short_arena() -> (Arena, ArenaWorld) {
        let mut config = ArenaConfig::default();
        config.game.seed = 3;
        config.game.level_seconds = 1;
        config.game.level_count = 3;
        let mut arena = Arena::new(&config);
        arena.join(PlayerId::new(0), 0).unwrap();
        let world = ArenaWorld::new(config.game.seed, &config.world_settings());
        (arena, world)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_clock_expires() {
        let (mut arena, mut world) = short_arena();

        let run = run_match(&mut arena, &mut world, |_, _| {}, std::future::pending()).await;

        assert!(run.finished);
        assert!(arena.is_over());
        assert_eq!(arena.hub().state().remaining_time(), 0);
        // Three seconds at 60 Hz
        assert!((170..=190).contains(&run.steps), "steps: {}", run.steps);

        let seconds = run
            .events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::TimeChanged { .. }))
            .count();
        assert_eq!(seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_early() {
        let (mut arena, mut world) = short_arena();

        let shutdown = tokio::time::sleep(Duration::from_millis(500));
        let run = run_match(&mut arena, &mut world, |_, _| {}, shutdown).await;

        assert!(!run.finished);
        assert!(!arena.is_over());
        assert!(run.steps > 0 && run.steps < 60, "steps: {}", run.steps);
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_sees_every_step() {
        let (mut arena, mut world) = short_arena();
        let mut seen = Vec::new();

        run_match(&mut arena, &mut world, |a, _| seen.push(a.tick), std::future::pending()).await;

        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
