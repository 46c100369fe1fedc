//! Game Events
//!
//! Per-step event log for logging and replay verification. These are a
//! record of what happened, separate from the synchronous notifications
//! delivered by the hub and the power-up bus.

use serde::{Serialize, Deserialize};
use crate::core::vec2::FixedVec2;
use crate::game::spawn::SpawnCategory;
use crate::game::state::{EntityId, PlayerId};

/// Priority for event ordering within a tick.
///
/// Lower value = earlier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Power-up expiries run before anything else in a step
    PowerUpExpiry = 0,
    /// Then pickups reported by the collision layer
    Pickup = 1,
    /// Then spawns
    Spawn = 2,
    /// Clock and level changes
    Clock = 3,
    /// Lowest priority
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEventData {
    /// An entity was created in the world
    EntitySpawned {
        /// Handle returned by the world
        entity: EntityId,
        /// Collectable, power-up or enemy
        category: SpawnCategory,
        /// Spawn point on the ground plane
        position: FixedVec2,
    },

    /// An enemy wave was released
    WaveSpawned {
        /// Enemies in this wave
        size: u32,
        /// Size of the wave after this one
        next_size: u32,
    },

    /// A scoreable was collected
    ScoreAwarded {
        /// Collector
        player_id: PlayerId,
        /// Team credited
        team_id: usize,
        /// Pickup value before the multiplier
        base_value: i32,
        /// Points added to the team
        points: i32,
    },

    /// A power-up effect started
    PowerUpApplied {
        /// Player now under the effect
        player_id: PlayerId,
        /// Descriptor name
        name: String,
        /// Tick at which it expires
        expires_at: u32,
    },

    /// A power-up effect ended
    PowerUpExpired {
        /// Player whose effect ended
        player_id: PlayerId,
        /// Descriptor name
        name: String,
    },

    /// A power-up was picked up while another was active and wasted
    PowerUpDiscarded {
        /// Player who touched it
        player_id: PlayerId,
        /// The removed pickup
        entity: EntityId,
    },

    /// One second of match time elapsed
    TimeChanged {
        /// Seconds left
        remaining: i32,
    },

    /// The level index advanced
    LevelChanged {
        /// New level index
        level: u32,
    },

    /// Match time ran out
    MatchEnded {
        /// Final score per team
        team_scores: Vec<i32>,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Ordering priority
    pub priority: EventPriority,

    /// Player involved (for tie-breaking)
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::ScoreAwarded { player_id, .. } => Some(*player_id),
            GameEventData::PowerUpApplied { player_id, .. } => Some(*player_id),
            GameEventData::PowerUpExpired { player_id, .. } => Some(*player_id),
            GameEventData::PowerUpDiscarded { player_id, .. } => Some(*player_id),
            _ => None,
        };

        Self {
            tick,
            priority,
            player_id,
            data,
        }
    }

    /// Create entity spawned event.
    pub fn entity_spawned(tick: u32, entity: EntityId, category: SpawnCategory, position: FixedVec2) -> Self {
        Self::new(
            tick,
            EventPriority::Spawn,
            GameEventData::EntitySpawned { entity, category, position },
        )
    }

    /// Create wave spawned event.
    pub fn wave_spawned(tick: u32, size: u32, next_size: u32) -> Self {
        Self::new(tick, EventPriority::Spawn, GameEventData::WaveSpawned { size, next_size })
    }

    /// Create score awarded event.
    pub fn score_awarded(tick: u32, player_id: PlayerId, team_id: usize, base_value: i32, points: i32) -> Self {
        Self::new(
            tick,
            EventPriority::Pickup,
            GameEventData::ScoreAwarded { player_id, team_id, base_value, points },
        )
    }

    /// Create power-up applied event.
    pub fn power_up_applied(tick: u32, player_id: PlayerId, name: &str, expires_at: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Pickup,
            GameEventData::PowerUpApplied {
                player_id,
                name: name.to_string(),
                expires_at,
            },
        )
    }

    /// Create power-up expired event.
    pub fn power_up_expired(tick: u32, player_id: PlayerId, name: &str) -> Self {
        Self::new(
            tick,
            EventPriority::PowerUpExpiry,
            GameEventData::PowerUpExpired { player_id, name: name.to_string() },
        )
    }

    /// Create power-up discarded event.
    pub fn power_up_discarded(tick: u32, player_id: PlayerId, entity: EntityId) -> Self {
        Self::new(
            tick,
            EventPriority::Pickup,
            GameEventData::PowerUpDiscarded { player_id, entity },
        )
    }

    /// Create time changed event.
    pub fn time_changed(tick: u32, remaining: i32) -> Self {
        Self::new(tick, EventPriority::Clock, GameEventData::TimeChanged { remaining })
    }

    /// Create level changed event.
    pub fn level_changed(tick: u32, level: u32) -> Self {
        Self::new(tick, EventPriority::Clock, GameEventData::LevelChanged { level })
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, team_scores: Vec<i32>) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::MatchEnded { team_scores })
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.player_id == other.player_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then player_id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.player_id.cmp(&other.player_id))
    }
}
