//! Spawn Scheduler
//!
//! Rate-based spawning of collectables and power-ups, plus escalating
//! enemy waves gated on the live-enemy count.
//!
//! Called once per simulation step. Each rate-driven kind rolls once per
//! step, so at most one of each spawns per step and missed steps are never
//! batched. Rolls happen in a fixed order (power-up, collectable, enemy
//! wave) so a seeded stream replays identically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::fixed::{
    Fixed, FIXED_ONE, fixed_mul,
    SPAWN_HALF_WIDTH, PLAY_AREA_RADIUS, TICK_DURATION,
};
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::FixedVec2;
use crate::game::events::GameEvent;
use crate::game::power_up::PowerUpDescriptor;
use crate::game::world::World;

// =============================================================================
// SPAWN KINDS
// =============================================================================

/// Coarse category of a spawned entity, used in events and config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpawnCategory {
    /// Scoreable pickup
    Collectable = 0,
    /// Power-up pickup
    PowerUp = 1,
    /// Wave enemy
    Enemy = 2,
}

/// What a spawned entity is.
///
/// Enemies carry their live-count ticket, so the count drops exactly once
/// when the world lets go of the entity.
#[derive(Debug)]
pub enum SpawnKind {
    /// Scoreable worth `value` base points
    Collectable {
        /// Base point value before the collector's multiplier
        value: i32,
    },
    /// Power-up pickup carrying one configured descriptor
    PowerUp(Arc<PowerUpDescriptor>),
    /// Wave enemy
    Enemy(EnemyTicket),
}

impl SpawnKind {
    /// Category of this kind.
    pub fn category(&self) -> SpawnCategory {
        match self {
            SpawnKind::Collectable { .. } => SpawnCategory::Collectable,
            SpawnKind::PowerUp(_) => SpawnCategory::PowerUp,
            SpawnKind::Enemy(_) => SpawnCategory::Enemy,
        }
    }

    /// Is this a pickup (collectable or power-up)?
    pub fn is_pickup(&self) -> bool {
        !matches!(self, SpawnKind::Enemy(_))
    }
}

// =============================================================================
// LIVE ENEMY COUNTER
// =============================================================================

/// Shared count of enemies currently alive.
///
/// Cloning shares the same counter. The only way to raise it is
/// [`EnemyCounter::mint`]; the only way to lower it is dropping the ticket.
#[derive(Clone, Debug, Default)]
pub struct EnemyCounter {
    live: Arc<AtomicU32>,
}

impl EnemyCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of enemies alive right now.
    #[inline]
    pub fn live(&self) -> u32 {
        self.live.load(Ordering::Acquire)
    }

    /// Count one more enemy and hand out its ticket.
    pub fn mint(&self) -> EnemyTicket {
        self.live.fetch_add(1, Ordering::AcqRel);
        EnemyTicket {
            live: Arc::clone(&self.live),
        }
    }
}

/// Proof that one enemy is counted as alive. Dropping it uncounts the enemy.
#[derive(Debug)]
pub struct EnemyTicket {
    live: Arc<AtomicU32>,
}

impl Drop for EnemyTicket {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

// =============================================================================
// WAVES
// =============================================================================

/// Enemy wave progression.
///
/// `current_wave_size` never decreases and never exceeds `max_wave_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveState {
    /// Enemies in the next wave
    pub current_wave_size: u32,
    /// Cap on wave size
    pub max_wave_size: u32,
}

impl WaveState {
    /// Create wave state.
    ///
    /// # Panics
    /// Panics if `max_wave_size` is zero (waves would stall forever) or if
    /// the initial size is above the cap.
    pub fn new(initial_wave_size: u32, max_wave_size: u32) -> Self {
        assert!(max_wave_size >= 1, "max wave size must be at least 1");
        assert!(
            initial_wave_size <= max_wave_size,
            "initial wave size {} exceeds max wave size {}",
            initial_wave_size,
            max_wave_size
        );
        Self {
            current_wave_size: initial_wave_size,
            max_wave_size,
        }
    }

    /// Grow the next wave by one, up to the cap.
    fn escalate(&mut self) {
        if self.current_wave_size < self.max_wave_size {
            self.current_wave_size += 1;
        }
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Configuration for the scheduler.
#[derive(Clone, Debug)]
pub struct SpawnSettings {
    /// Collectables per minute
    pub collectable_rate: Fixed,
    /// Power-ups per minute
    pub power_up_rate: Fixed,
    /// Base value of every spawned collectable
    pub collectable_value: i32,
    /// Duration of one simulation step
    pub step_duration: Fixed,
    /// Half-width of the sampling square
    pub half_width: Fixed,
    /// Radius of the playable disc
    pub play_radius: Fixed,
    /// Rotation given to every spawned entity
    pub rotation: Fixed,
    /// Size of the first wave
    pub initial_wave_size: u32,
    /// Cap on wave size
    pub max_wave_size: u32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            collectable_rate: 30 * FIXED_ONE,
            power_up_rate: 6 * FIXED_ONE,
            collectable_value: 10,
            step_duration: TICK_DURATION,
            half_width: SPAWN_HALF_WIDTH,
            play_radius: PLAY_AREA_RADIUS,
            rotation: 0,
            initial_wave_size: 0,
            max_wave_size: 5,
        }
    }
}

/// Per-step spawn probability for a rate given per minute.
///
/// `p = rate * step / 60`. At 60 Hz, 30 per minute gives 546 (~0.00833).
#[inline]
pub fn spawn_chance(rate_per_minute: Fixed, step_duration: Fixed) -> Fixed {
    fixed_mul(rate_per_minute, step_duration) / 60
}

/// Decides each step what to create and where.
#[derive(Debug)]
pub struct SpawnScheduler {
    collectable_chance: Fixed,
    power_up_chance: Fixed,
    collectable_value: i32,
    half_width: Fixed,
    play_radius: Fixed,
    rotation: Fixed,
    power_ups: Vec<Arc<PowerUpDescriptor>>,
    wave: WaveState,
    enemies: EnemyCounter,
}

impl SpawnScheduler {
    /// Create a scheduler drawing power-ups from `power_ups`.
    ///
    /// # Panics
    /// Panics on an invalid wave configuration (see [`WaveState::new`]).
    pub fn new(settings: &SpawnSettings, power_ups: Vec<Arc<PowerUpDescriptor>>) -> Self {
        Self {
            collectable_chance: spawn_chance(settings.collectable_rate, settings.step_duration),
            power_up_chance: spawn_chance(settings.power_up_rate, settings.step_duration),
            collectable_value: settings.collectable_value,
            half_width: settings.half_width,
            play_radius: settings.play_radius,
            rotation: settings.rotation,
            power_ups,
            wave: WaveState::new(settings.initial_wave_size, settings.max_wave_size),
            enemies: EnemyCounter::new(),
        }
    }

    /// Current wave progression.
    pub fn wave(&self) -> WaveState {
        self.wave
    }

    /// Enemies currently alive.
    pub fn live_enemies(&self) -> u32 {
        self.enemies.live()
    }

    /// Handle on the live-enemy counter.
    pub fn enemy_counter(&self) -> EnemyCounter {
        self.enemies.clone()
    }

    /// Per-step collectable probability.
    pub fn collectable_chance(&self) -> Fixed {
        self.collectable_chance
    }

    /// Per-step power-up probability.
    pub fn power_up_chance(&self) -> Fixed {
        self.power_up_chance
    }

    /// Configured power-up variants.
    pub fn power_ups(&self) -> &[Arc<PowerUpDescriptor>] {
        &self.power_ups
    }

    /// Run one step of spawn decisions.
    pub fn step<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        rng: &mut DeterministicRng,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) {
        self.maybe_spawn_power_up(world, rng, tick, events);
        self.maybe_spawn_collectable(world, rng, tick, events);
        self.maybe_spawn_wave(world, rng, tick, events);
    }

    fn maybe_spawn_power_up<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        rng: &mut DeterministicRng,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) {
        if self.power_ups.is_empty() || !rng.next_bool(self.power_up_chance) {
            return;
        }

        let descriptor = match rng.choose(&self.power_ups) {
            Some(descriptor) => Arc::clone(descriptor),
            None => return,
        };
        debug!("Spawning power-up {:?} at tick {}", descriptor.name(), tick);

        let position = self.sample_position(rng);
        self.spawn(world, SpawnKind::PowerUp(descriptor), position, tick, events);
    }

    fn maybe_spawn_collectable<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        rng: &mut DeterministicRng,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) {
        if !rng.next_bool(self.collectable_chance) {
            return;
        }

        let position = self.sample_position(rng);
        let kind = SpawnKind::Collectable { value: self.collectable_value };
        self.spawn(world, kind, position, tick, events);
    }

    /// Release a wave if no enemies are alive.
    ///
    /// Checked every step. A wave of size 0 spawns nothing but still
    /// escalates, so a match that starts at 0 releases 1 enemy on the
    /// following step.
    fn maybe_spawn_wave<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        rng: &mut DeterministicRng,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) {
        if self.enemies.live() != 0 {
            return;
        }

        let size = self.wave.current_wave_size;
        for _ in 0..size {
            let position = self.sample_position(rng);
            let ticket = self.enemies.mint();
            self.spawn(world, SpawnKind::Enemy(ticket), position, tick, events);
        }

        self.wave.escalate();

        if size > 0 {
            info!(
                "Wave of {} enemies at tick {} (next wave {})",
                size, tick, self.wave.current_wave_size
            );
        }
        events.push(GameEvent::wave_spawned(tick, size, self.wave.current_wave_size));
    }

    fn spawn<W: World + ?Sized>(
        &self,
        world: &mut W,
        kind: SpawnKind,
        position: FixedVec2,
        tick: u32,
        events: &mut Vec<GameEvent>,
    ) {
        let category = kind.category();
        let entity = world.create_entity(kind, position, self.rotation);
        debug!("Spawned {:?} {:?} at {}", category, entity, position);
        events.push(GameEvent::entity_spawned(tick, entity, category, position));
    }

    /// Pick a spawn point inside the playable disc.
    ///
    /// Falls back to a fixed point on the +x axis if the sampler gives up.
    fn sample_position(&self, rng: &mut DeterministicRng) -> FixedVec2 {
        match rng.random_position_in_disc(self.half_width, self.play_radius) {
            Some(position) => position,
            None => {
                let fallback = self.fallback_position();
                warn!("Spawn sampler exhausted its retries, using {}", fallback);
                fallback
            }
        }
    }

    /// A point known to satisfy `0 < |p| <= radius` and lie in the square.
    pub fn fallback_position(&self) -> FixedVec2 {
        let reach = FIXED_ONE.min(self.play_radius).min(self.half_width).max(1);
        FixedVec2::new(reach, 0)
    }

    /// Hash scheduler state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.wave.current_wave_size);
        hasher.update_u32(self.wave.max_wave_size);
        hasher.update_u32(self.enemies.live());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{fixed_mul, to_fixed};
    use crate::game::power_up::{EffectPayload, Rgb};
    use crate::game::world::ArenaWorld;

    fn no_rates() -> SpawnSettings {
        SpawnSettings {
            collectable_rate: 0,
            power_up_rate: 0,
            ..SpawnSettings::default()
        }
    }

    fn descriptor(name: &str) -> Arc<PowerUpDescriptor> {
        Arc::new(PowerUpDescriptor::new(
            name,
            to_fixed(5.0),
            Rgb::new(255, 0, 0),
            EffectPayload::Marker,
        ))
    }

    #[test]
    fn test_spawn_chance_at_60hz() {
        assert_eq!(spawn_chance(30 * FIXED_ONE, TICK_DURATION), 546);
        assert_eq!(spawn_chance(0, TICK_DURATION), 0);
    }

    #[test]
    fn test_statistical_spawn_rate() {
        // 30 per minute over 60 s of steps, averaged over several seeds.
        let settings = SpawnSettings {
            power_up_rate: 0,
            max_wave_size: 1,
            ..SpawnSettings::default()
        };

        let seeds = 20u64;
        let mut total = 0usize;
        for seed in 0..seeds {
            let mut scheduler = SpawnScheduler::new(&settings, Vec::new());
            let mut world = ArenaWorld::with_seed(seed);
            let mut rng = DeterministicRng::new(seed);
            let mut events = Vec::new();

            for tick in 1..=3600 {
                scheduler.step(&mut world, &mut rng, tick, &mut events);
            }

            total += events
                .iter()
                .filter(|e| matches!(
                    e.data,
                    crate::game::events::GameEventData::EntitySpawned {
                        category: SpawnCategory::Collectable,
                        ..
                    }
                ))
                .count();
        }

        let mean = total as f64 / seeds as f64;
        assert!((25.0..=35.0).contains(&mean), "mean spawns per minute was {}", mean);
    }

    #[test]
    fn test_wave_scenario() {
        let settings = SpawnSettings {
            initial_wave_size: 2,
            max_wave_size: 5,
            ..no_rates()
        };
        let mut scheduler = SpawnScheduler::new(&settings, Vec::new());
        let mut world = ArenaWorld::with_seed(1);
        let mut rng = DeterministicRng::new(1);
        let mut events = Vec::new();

        assert_eq!(scheduler.live_enemies(), 0);
        scheduler.step(&mut world, &mut rng, 1, &mut events);

        assert_eq!(scheduler.live_enemies(), 2);
        assert_eq!(world.enemy_count(), 2);
        assert_eq!(scheduler.wave().current_wave_size, 3);
    }

    #[test]
    fn test_no_wave_while_enemies_alive() {
        let settings = SpawnSettings {
            initial_wave_size: 1,
            max_wave_size: 5,
            ..no_rates()
        };
        let mut scheduler = SpawnScheduler::new(&settings, Vec::new());
        let mut world = ArenaWorld::with_seed(1);
        let mut rng = DeterministicRng::new(1);
        let mut events = Vec::new();

        scheduler.step(&mut world, &mut rng, 1, &mut events);
        let wave_after_first = scheduler.wave();
        for tick in 2..10 {
            scheduler.step(&mut world, &mut rng, tick, &mut events);
        }

        assert_eq!(scheduler.wave(), wave_after_first);
        assert_eq!(scheduler.live_enemies(), 1);
    }

    #[test]
    fn test_wave_sizes_non_decreasing_and_capped() {
        let settings = SpawnSettings {
            initial_wave_size: 0,
            max_wave_size: 3,
            ..no_rates()
        };
        let mut scheduler = SpawnScheduler::new(&settings, Vec::new());
        let mut world = ArenaWorld::with_seed(9);
        let mut rng = DeterministicRng::new(9);

        let mut sizes = Vec::new();
        for tick in 1..=8 {
            let mut events = Vec::new();
            let live_before = scheduler.live_enemies();
            scheduler.step(&mut world, &mut rng, tick, &mut events);

            let wave = events.iter().find_map(|e| match e.data {
                crate::game::events::GameEventData::WaveSpawned { size, .. } => Some(size),
                _ => None,
            });
            // A wave fires iff nothing was alive before the check
            assert_eq!(wave.is_some(), live_before == 0);
            if let Some(size) = wave {
                sizes.push(size);
            }

            // Clear the arena so the next step releases a wave
            world.clear_enemies();
        }

        assert_eq!(sizes, vec![0, 1, 2, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_ticket_drop_decrements_once() {
        let counter = EnemyCounter::new();
        let a = counter.mint();
        let b = counter.mint();
        assert_eq!(counter.live(), 2);

        drop(a);
        assert_eq!(counter.live(), 1);
        drop(b);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn test_power_up_spawn_uses_configured_variants() {
        let settings = SpawnSettings {
            power_up_rate: 30 * FIXED_ONE,
            collectable_rate: 0,
            step_duration: FIXED_ONE * 2,
            ..SpawnSettings::default()
        };
        // 30/min over 2 s steps is p = 1.0, every step spawns one
        let mut scheduler = SpawnScheduler::new(&settings, vec![descriptor("A"), descriptor("B")]);
        assert_eq!(scheduler.power_up_chance(), FIXED_ONE);

        let mut world = ArenaWorld::with_seed(3);
        let mut rng = DeterministicRng::new(3);
        let mut events = Vec::new();
        for tick in 1..=5 {
            scheduler.step(&mut world, &mut rng, tick, &mut events);
        }

        assert_eq!(world.pickups().count(), 5);
        for (_, kind) in world.pickups() {
            match kind {
                SpawnKind::PowerUp(d) => assert!(d.name() == "A" || d.name() == "B"),
                other => panic!("unexpected pickup {:?}", other),
            }
        }
    }

    #[test]
    fn test_fallback_position_is_valid() {
        let scheduler = SpawnScheduler::new(&SpawnSettings::default(), Vec::new());
        let pos = scheduler.fallback_position();
        let radius_sq = fixed_mul(PLAY_AREA_RADIUS, PLAY_AREA_RADIUS);

        assert!(pos.length_squared() > 0);
        assert!(pos.length_squared() <= radius_sq);
        assert!(pos.within_square(SPAWN_HALF_WIDTH));
    }

    #[test]
    fn test_degenerate_rng_falls_back() {
        let settings = SpawnSettings {
            initial_wave_size: 1,
            max_wave_size: 1,
            ..no_rates()
        };
        let mut scheduler = SpawnScheduler::new(&settings, Vec::new());
        let mut world = ArenaWorld::with_seed(1);
        let mut rng = DeterministicRng::new(1);
        rng.set_state([0, 0]);
        let mut events = Vec::new();

        scheduler.step(&mut world, &mut rng, 1, &mut events);

        let position = events.iter().find_map(|e| match e.data {
            crate::game::events::GameEventData::EntitySpawned { position, .. } => Some(position),
            _ => None,
        });
        assert_eq!(position, Some(scheduler.fallback_position()));
    }

    #[test]
    #[should_panic(expected = "max wave size")]
    fn test_zero_max_wave_rejected() {
        let _ = WaveState::new(0, 0);
    }

    #[test]
    #[should_panic(expected = "exceeds max wave size")]
    fn test_initial_wave_above_max_rejected() {
        let _ = WaveState::new(4, 3);
    }
}
