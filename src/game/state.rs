//! Arena State
//!
//! The owner of everything a match coordinates: the hub, the scheduler,
//! the roster, the power-up bus and the spawn RNG.
//!
//! The collision layer reports pickups through
//! [`Arena::on_scoreable_pickup`] and [`Arena::on_power_up_pickup`]. These
//! are the only entry points into scoring and power-ups. Stale reports
//! (unknown player, entity already gone, wrong kind) are ignored.

use std::fmt;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::config::ArenaConfig;
use crate::core::fixed::Fixed;
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::game::events::GameEvent;
use crate::game::hub::EventHub;
use crate::game::power_up::{EffectTarget, PowerUpBus, PowerUpContext, PowerUpDescriptor};
use crate::game::roster::{PlayerSlot, Roster, RosterError};
use crate::game::spawn::{SpawnKind, SpawnScheduler};
use crate::game::world::{Indicator, World};

// =============================================================================
// IDS
// =============================================================================

/// Player identifier.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create from a raw id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Handle of an entity in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// What a reported pickup did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupOutcome {
    /// Points went to the player's team
    Scored {
        /// Points after the multiplier
        points: i32,
    },
    /// A power-up started
    Applied {
        /// Tick at which it ends
        expires_at: u32,
    },
    /// A power-up was already running; the pickup was removed unused
    Discarded,
    /// Stale or mismatched report; nothing changed
    Ignored,
}

// =============================================================================
// ARENA
// =============================================================================

/// A running match.
pub struct Arena {
    /// Last completed simulation step
    pub tick: u32,

    /// Seed the spawn stream was created from
    pub rng_seed: u64,

    /// Spawn stream
    pub rng: DeterministicRng,

    hub: EventHub,
    scheduler: SpawnScheduler,
    roster: Roster,
    bus: PowerUpBus,

    tick_rate: u32,
    level_seconds: u32,
    indicator_intensity: Fixed,
    elapsed_seconds: u32,

    /// Events since the last `take_events`
    events: Vec<GameEvent>,
}

impl Arena {
    /// Build a match from a validated config.
    ///
    /// # Panics
    /// Panics on contract violations the config validator also rejects
    /// (zero teams, zero max wave size, non-positive power-up duration).
    pub fn new(config: &ArenaConfig) -> Self {
        let power_ups: Vec<Arc<PowerUpDescriptor>> = config
            .power_up_descriptors()
            .into_iter()
            .map(Arc::new)
            .collect();

        Self {
            tick: 0,
            rng_seed: config.game.seed,
            rng: DeterministicRng::new(config.game.seed),
            hub: EventHub::new(config.game.team_count, config.match_seconds()),
            scheduler: SpawnScheduler::new(&config.spawn_settings(), power_ups),
            roster: Roster::new(config.game.team_count, config.game.max_players_per_team),
            bus: PowerUpBus::new(),
            tick_rate: config.game.tick_rate,
            level_seconds: config.game.level_seconds,
            indicator_intensity: config.indicator_intensity(),
            elapsed_seconds: 0,
            events: Vec::new(),
        }
    }

    /// Last completed simulation step.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Simulation steps per second.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Match counters and score/time/level subscriptions.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Mutable hub, for subscribing.
    pub fn hub_mut(&mut self) -> &mut EventHub {
        &mut self.hub
    }

    /// Power-up listeners, for subscribing.
    pub fn power_up_bus(&mut self) -> &mut PowerUpBus {
        &mut self.bus
    }

    /// Spawn scheduler.
    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    /// Joined players.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Has match time run out?
    pub fn is_over(&self) -> bool {
        self.hub.state().remaining_time() <= 0
    }

    // =========================================================================
    // Players
    // =========================================================================

    /// Add a player to a team.
    pub fn join(&mut self, player: PlayerId, team_id: usize) -> Result<(), RosterError> {
        self.roster.join(player, team_id)
    }

    /// Remove a player.
    ///
    /// A running power-up is expired first, so listeners see exactly one
    /// expired notification and never keep state for a departed player.
    pub fn leave<I: Indicator>(&mut self, player: PlayerId, indicator: &mut I) -> bool {
        let Some(slot) = self.roster.get_mut(player) else {
            return false;
        };

        let mut ctx = PowerUpContext {
            now: self.tick,
            tick_rate: self.tick_rate,
            intensity: self.indicator_intensity,
            bus: &mut self.bus,
            indicator,
        };
        let PlayerSlot { score, stats, power_up } = slot;
        let mut target = EffectTarget { player, score, stats };

        if let Some(descriptor) = power_up.force_expire(&mut ctx, &mut target) {
            self.events.push(GameEvent::power_up_expired(self.tick, player, descriptor.name()));
        }

        self.roster.remove(player).is_some()
    }

    // =========================================================================
    // Pickups
    // =========================================================================

    /// The collision layer saw `player` touch a scoreable.
    pub fn on_scoreable_pickup<W: World + ?Sized>(
        &mut self,
        player: PlayerId,
        entity: EntityId,
        world: &mut W,
    ) -> PickupOutcome {
        let Some(slot) = self.roster.get(player) else {
            warn!("Scoreable {} reported for unknown player {}", entity, player);
            return PickupOutcome::Ignored;
        };

        let base_value = match world.kind(entity) {
            Some(SpawnKind::Collectable { value }) => *value,
            _ => {
                debug!("Stale scoreable pickup {} by {}", entity, player);
                return PickupOutcome::Ignored;
            }
        };

        let points = slot.score.collect(base_value, &mut self.hub);
        world.remove_entity(entity);

        self.events.push(GameEvent::score_awarded(
            self.tick,
            player,
            slot.team_id(),
            base_value,
            points,
        ));
        PickupOutcome::Scored { points }
    }

    /// The collision layer saw `player` touch a power-up.
    ///
    /// The pickup leaves the world whether or not it takes effect.
    pub fn on_power_up_pickup<W: World + Indicator>(
        &mut self,
        player: PlayerId,
        entity: EntityId,
        world: &mut W,
    ) -> PickupOutcome {
        let Some(slot) = self.roster.get_mut(player) else {
            warn!("Power-up {} reported for unknown player {}", entity, player);
            return PickupOutcome::Ignored;
        };

        let descriptor = match world.kind(entity) {
            Some(SpawnKind::PowerUp(descriptor)) => Arc::clone(descriptor),
            _ => {
                debug!("Stale power-up pickup {} by {}", entity, player);
                return PickupOutcome::Ignored;
            }
        };

        let applied = {
            let mut ctx = PowerUpContext {
                now: self.tick,
                tick_rate: self.tick_rate,
                intensity: self.indicator_intensity,
                bus: &mut self.bus,
                indicator: &mut *world,
            };
            let PlayerSlot { score, stats, power_up } = slot;
            let mut target = EffectTarget { player, score, stats };
            power_up.try_apply(Arc::clone(&descriptor), &mut ctx, &mut target)
        };

        world.remove_entity(entity);

        match applied {
            Some(expires_at) => {
                self.events.push(GameEvent::power_up_applied(
                    self.tick,
                    player,
                    descriptor.name(),
                    expires_at,
                ));
                PickupOutcome::Applied { expires_at }
            }
            None => {
                self.events.push(GameEvent::power_up_discarded(self.tick, player, entity));
                PickupOutcome::Discarded
            }
        }
    }

    // =========================================================================
    // Step phases
    // =========================================================================

    /// Expire every power-up whose deadline has passed, in player order.
    pub fn expire_power_ups<I: Indicator>(&mut self, indicator: &mut I) {
        let now = self.tick;
        let mut ctx = PowerUpContext {
            now,
            tick_rate: self.tick_rate,
            intensity: self.indicator_intensity,
            bus: &mut self.bus,
            indicator,
        };

        for (player, slot) in self.roster.iter_mut() {
            let PlayerSlot { score, stats, power_up } = slot;
            let mut target = EffectTarget { player, score, stats };
            if let Some(descriptor) = power_up.poll_expiry(&mut ctx, &mut target) {
                self.events.push(GameEvent::power_up_expired(now, player, descriptor.name()));
            }
        }
    }

    /// Run the scheduler for the current step.
    pub fn run_spawns<W: World + ?Sized>(&mut self, world: &mut W) {
        self.scheduler.step(world, &mut self.rng, self.tick, &mut self.events);
    }

    /// Count one second off the match clock.
    ///
    /// Every `level_seconds` of elapsed time the level advances, except on
    /// the final second. Returns true once time has run out.
    pub fn tick_clock(&mut self) -> bool {
        if self.is_over() {
            return true;
        }

        let remaining = self.hub.tick_time();
        self.elapsed_seconds += 1;
        self.events.push(GameEvent::time_changed(self.tick, remaining));

        if remaining > 0
            && self.level_seconds > 0
            && self.elapsed_seconds % self.level_seconds == 0
        {
            let level = self.hub.advance_level();
            self.events.push(GameEvent::level_changed(self.tick, level));
        }

        if remaining <= 0 {
            let scores = self.hub.state().team_scores().to_vec();
            info!("Match over at tick {}, team scores {:?}", self.tick, scores);
            self.events.push(GameEvent::match_ended(self.tick, scores));
            return true;
        }

        false
    }

    // =========================================================================
    // Events and hashing
    // =========================================================================

    /// Take accumulated events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add an event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hash all deterministic arena state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        let rng_state = self.rng.state();
        hasher.update_u64(rng_state[0]);
        hasher.update_u64(rng_state[1]);

        let state = self.hub.state();
        for score in state.team_scores() {
            hasher.update_i32(*score);
        }
        hasher.update_i32(state.remaining_time());
        hasher.update_u32(state.level_index());

        self.scheduler.hash_into(hasher);

        hasher.update_u32(self.roster.len() as u32);
        for (player, slot) in self.roster.iter() {
            hasher.update_u32(player.0);
            slot.hash_into(hasher);
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("tick", &self.tick)
            .field("rng_seed", &self.rng_seed)
            .field("hub", &self.hub)
            .field("scheduler", &self.scheduler)
            .field("roster", &self.roster)
            .field("bus", &self.bus)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
