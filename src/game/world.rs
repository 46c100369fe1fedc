//! Arena World
//!
//! The entity store the scheduler spawns into, plus the visual indicator
//! seam used by power-ups.
//!
//! [`World`] and [`Indicator`] are what the coordination layer calls.
//! [`ArenaWorld`] is the in-crate implementation: it despawns pickups after
//! their time in scene and melts enemies down until they dissolve.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_mul, seconds_to_ticks, FALL_THRESHOLD};
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::FixedVec2;
use crate::game::power_up::Rgb;
use crate::game::spawn::SpawnKind;
use crate::game::state::{EntityId, PlayerId};

/// Entity store the scheduler creates into.
pub trait World {
    /// Create an entity and return its handle.
    fn create_entity(&mut self, kind: SpawnKind, position: FixedVec2, rotation: Fixed) -> EntityId;

    /// What an entity is, or `None` if it no longer exists.
    fn kind(&self, entity: EntityId) -> Option<&SpawnKind>;

    /// Remove an entity. Returns false (and does nothing) if it is already gone.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Called once at the end of every simulation step.
    fn advance(&mut self, _now: u32) {}
}

/// Per-player visual indicator (a light on the player in the arena).
pub trait Indicator {
    /// Show `color` at `intensity` on a player.
    fn set_indicator(&mut self, player: PlayerId, color: Rgb, intensity: Fixed);

    /// Turn a player's indicator off.
    fn clear_indicator(&mut self, player: PlayerId);
}

// =============================================================================
// ENEMY MELTING
// =============================================================================

/// Smallest random size factor given to an enemy at spawn: 0.4
pub const ENEMY_MIN_SCALE: Fixed = 26214;

/// Upper bound (exclusive) of the spawn size factor: 0.75
pub const ENEMY_MAX_SCALE: Fixed = 49152;

/// Scale multiplier per melt: 0.985
pub const MELT_FACTOR: Fixed = 64553;

/// Delay before the first melt: 1.0 s
pub const MELT_DELAY: Fixed = FIXED_ONE;

/// Time between melts: 0.5 s
pub const MELT_INTERVAL: Fixed = FIXED_ONE / 2;

/// 4/3 * pi = 4.18879
const SPHERE_VOLUME_FACTOR: Fixed = 274517;

/// Enemies below this volume dissolve: 0.15
pub const MIN_ENEMY_VOLUME: Fixed = 9830;

/// Default pickup time in scene: 10 s
pub const DEFAULT_PICKUP_LIFETIME: Fixed = 10 * FIXED_ONE;

/// Label for the world's own RNG stream.
const WORLD_STREAM: u64 = 0x574F_524C_44;

/// Volume of a sphere with radius `scale`.
#[inline]
pub fn enemy_volume(scale: Fixed) -> Fixed {
    let cube = fixed_mul(scale, fixed_mul(scale, scale));
    fixed_mul(SPHERE_VOLUME_FACTOR, cube)
}

// =============================================================================
// ENTITIES
// =============================================================================

/// An entity living in the arena.
#[derive(Debug)]
pub struct Entity {
    /// What it is
    pub kind: SpawnKind,
    /// Ground-plane position
    pub position: FixedVec2,
    /// Rotation at spawn
    pub rotation: Fixed,
    /// Step the entity was created in
    pub spawned_at: u32,
    /// Uniform scale (enemies shrink over time)
    pub scale: Fixed,
    /// Pickups: step at which it leaves the scene
    pub despawn_at: Option<u32>,
    /// Enemies: step of the next melt
    pub next_melt_at: Option<u32>,
}

/// Current indicator on a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorState {
    /// Light color
    pub color: Rgb,
    /// Light intensity
    pub intensity: Fixed,
}

/// Timings for the concrete world.
#[derive(Clone, Debug)]
pub struct WorldSettings {
    /// Simulation steps per second
    pub tick_rate: u32,
    /// Collectable time in scene (seconds)
    pub collectable_lifetime: Fixed,
    /// Power-up time in scene (seconds)
    pub power_up_lifetime: Fixed,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            collectable_lifetime: DEFAULT_PICKUP_LIFETIME,
            power_up_lifetime: DEFAULT_PICKUP_LIFETIME,
        }
    }
}

/// In-crate [`World`] and [`Indicator`].
///
/// Entities created before `advance(now)` belong to the step in progress,
/// which is one past the last step the world advanced to.
#[derive(Debug)]
pub struct ArenaWorld {
    entities: BTreeMap<EntityId, Entity>,
    indicators: BTreeMap<PlayerId, IndicatorState>,
    next_entity_id: u32,
    clock: u32,
    rng: DeterministicRng,
    collectable_lifetime_ticks: u32,
    power_up_lifetime_ticks: u32,
    melt_delay_ticks: u32,
    melt_interval_ticks: u32,
}

impl ArenaWorld {
    /// Create a world. `seed` feeds a stream separate from the spawn stream.
    pub fn new(seed: u64, settings: &WorldSettings) -> Self {
        Self {
            entities: BTreeMap::new(),
            indicators: BTreeMap::new(),
            next_entity_id: 1,
            clock: 0,
            rng: DeterministicRng::derived(seed, WORLD_STREAM),
            collectable_lifetime_ticks: seconds_to_ticks(settings.collectable_lifetime, settings.tick_rate),
            power_up_lifetime_ticks: seconds_to_ticks(settings.power_up_lifetime, settings.tick_rate),
            melt_delay_ticks: seconds_to_ticks(MELT_DELAY, settings.tick_rate),
            melt_interval_ticks: seconds_to_ticks(MELT_INTERVAL, settings.tick_rate),
        }
    }

    /// World with default timings.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, &WorldSettings::default())
    }

    /// Look up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Number of live entities of any kind.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live enemies.
    pub fn enemy_count(&self) -> usize {
        self.entities.values().filter(|e| !e.kind.is_pickup()).count()
    }

    /// Live pickups in id order.
    pub fn pickups(&self) -> impl Iterator<Item = (EntityId, &SpawnKind)> + '_ {
        self.entities
            .iter()
            .filter(|(_, e)| e.kind.is_pickup())
            .map(|(id, e)| (*id, &e.kind))
    }

    /// Live enemy ids in id order.
    pub fn enemies(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|(_, e)| !e.kind.is_pickup())
            .map(|(id, _)| *id)
    }

    /// Current indicator on a player, if lit.
    pub fn indicator(&self, player: PlayerId) -> Option<IndicatorState> {
        self.indicators.get(&player).copied()
    }

    /// Physics reports that an enemy fell off the arena.
    ///
    /// Returns true if an enemy was destroyed.
    pub fn report_fall(&mut self, entity: EntityId) -> bool {
        let is_enemy = self
            .entities
            .get(&entity)
            .is_some_and(|e| !e.kind.is_pickup());
        if !is_enemy {
            return false;
        }

        debug!("Enemy {:?} fell out of the arena", entity);
        self.remove_entity(entity)
    }

    /// Physics reports an enemy's height. Below the fall threshold it is destroyed.
    pub fn report_height(&mut self, entity: EntityId, height: Fixed) -> bool {
        height < FALL_THRESHOLD && self.report_fall(entity)
    }

    /// Hash all entity and indicator state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.entities.len() as u32);
        for (id, entity) in &self.entities {
            hasher.update_u32(id.0);
            hasher.update_u8(entity.kind.category() as u8);
            match &entity.kind {
                SpawnKind::Collectable { value } => hasher.update_i32(*value),
                SpawnKind::PowerUp(descriptor) => hasher.update_str(descriptor.name()),
                SpawnKind::Enemy(_) => {}
            }
            hasher.update_vec2(entity.position);
            hasher.update_fixed(entity.rotation);
            hasher.update_u32(entity.spawned_at);
            hasher.update_fixed(entity.scale);
            hasher.update_u32(entity.despawn_at.unwrap_or(0));
            hasher.update_u32(entity.next_melt_at.unwrap_or(0));
        }

        hasher.update_u32(self.indicators.len() as u32);
        for (player, indicator) in &self.indicators {
            hasher.update_u32(player.0);
            hasher.update_u8(indicator.color.0);
            hasher.update_u8(indicator.color.1);
            hasher.update_u8(indicator.color.2);
            hasher.update_fixed(indicator.intensity);
        }
    }

    #[cfg(test)]
    pub(crate) fn clear_enemies(&mut self) {
        let enemies: Vec<EntityId> = self.enemies().collect();
        for id in enemies {
            self.remove_entity(id);
        }
    }
}

impl World for ArenaWorld {
    fn create_entity(&mut self, kind: SpawnKind, position: FixedVec2, rotation: Fixed) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        let spawned_at = self.clock + 1;
        let (scale, despawn_at, next_melt_at) = match &kind {
            SpawnKind::Collectable { .. } => {
                (FIXED_ONE, Some(spawned_at + self.collectable_lifetime_ticks), None)
            }
            SpawnKind::PowerUp(_) => {
                (FIXED_ONE, Some(spawned_at + self.power_up_lifetime_ticks), None)
            }
            SpawnKind::Enemy(_) => {
                let scale = self.rng.next_fixed_range(ENEMY_MIN_SCALE, ENEMY_MAX_SCALE);
                (scale, None, Some(spawned_at + self.melt_delay_ticks))
            }
        };

        self.entities.insert(id, Entity {
            kind,
            position,
            rotation,
            spawned_at,
            scale,
            despawn_at,
            next_melt_at,
        });

        id
    }

    fn kind(&self, entity: EntityId) -> Option<&SpawnKind> {
        self.entities.get(&entity).map(|e| &e.kind)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        // Dropping an enemy releases its live-count ticket
        self.entities.remove(&entity).is_some()
    }

    fn advance(&mut self, now: u32) {
        self.clock = now;

        let mut expired = Vec::new();
        let mut dissolved = Vec::new();

        for (id, entity) in self.entities.iter_mut() {
            if entity.despawn_at.is_some_and(|at| at <= now) {
                expired.push(*id);
                continue;
            }

            if entity.next_melt_at.is_some_and(|at| at <= now) {
                entity.scale = fixed_mul(entity.scale, MELT_FACTOR);
                entity.next_melt_at = Some(now + self.melt_interval_ticks);

                if enemy_volume(entity.scale) < MIN_ENEMY_VOLUME {
                    dissolved.push(*id);
                }
            }
        }

        for id in expired {
            debug!("Pickup {:?} left the scene at tick {}", id, now);
            self.entities.remove(&id);
        }
        for id in dissolved {
            debug!("Enemy {:?} melted away at tick {}", id, now);
            self.entities.remove(&id);
        }
    }
}

impl Indicator for ArenaWorld {
    fn set_indicator(&mut self, player: PlayerId, color: Rgb, intensity: Fixed) {
        self.indicators.insert(player, IndicatorState { color, intensity });
    }

    fn clear_indicator(&mut self, player: PlayerId) {
        self.indicators.remove(&player);
    }
}

// =============================================================================
// TESTS
// =============================================================================
