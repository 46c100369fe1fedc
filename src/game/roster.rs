//! Player Roster
//!
//! Who is in the match and which team they play for. Each joined player
//! owns a scorer, a power-up lifecycle and the stats effects may change.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

use crate::core::fixed::{Fixed, FIXED_ONE};
use crate::core::hash::StateHasher;
use crate::game::power_up::{PowerUpLifecycle, PowerUpPhase};
use crate::game::score::ScoreCollector;
use crate::game::state::PlayerId;

/// Default move magnitude: 250.0
pub const DEFAULT_MOVE_MAGNITUDE: Fixed = 250 * FIXED_ONE;

/// Player attributes that power-up effects modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Uniform scale
    pub scale: Fixed,
    /// Movement force
    pub move_magnitude: Fixed,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            scale: FIXED_ONE,
            move_magnitude: DEFAULT_MOVE_MAGNITUDE,
        }
    }
}

/// Everything the arena tracks for one player.
#[derive(Debug)]
pub struct PlayerSlot {
    /// Scorer, carries the team id
    pub score: ScoreCollector,
    /// Effect-modifiable stats
    pub stats: PlayerStats,
    /// Power-up state machine
    pub power_up: PowerUpLifecycle,
}

impl PlayerSlot {
    fn new(team_id: usize) -> Self {
        Self {
            score: ScoreCollector::new(team_id),
            stats: PlayerStats::default(),
            power_up: PowerUpLifecycle::new(),
        }
    }

    /// Team this player plays for.
    pub fn team_id(&self) -> usize {
        self.score.team_id()
    }

    /// Hash slot state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.team_id() as u64);
        hasher.update_fixed(self.score.multiplier());
        hasher.update_fixed(self.stats.scale);
        hasher.update_fixed(self.stats.move_magnitude);
        match self.power_up.phase() {
            PowerUpPhase::Idle => hasher.update_bool(false),
            PowerUpPhase::Active { descriptor, expires_at } => {
                hasher.update_bool(true);
                hasher.update_str(descriptor.name());
                hasher.update_u32(*expires_at);
            }
        }
    }
}

/// Join errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// No such team.
    #[error("Team {team_id} does not exist ({team_count} teams)")]
    TeamOutOfRange {
        /// Requested team
        team_id: usize,
        /// Teams in the match
        team_count: usize,
    },

    /// Team has no free slot.
    #[error("Team {team_id} is full")]
    TeamFull {
        /// Requested team
        team_id: usize,
    },

    /// Player is already in the match.
    #[error("Player {0} already joined")]
    AlreadyJoined(PlayerId),
}

/// Joined players, ordered by id.
#[derive(Debug)]
pub struct Roster {
    players: BTreeMap<PlayerId, PlayerSlot>,
    team_count: usize,
    max_players_per_team: usize,
}

impl Roster {
    /// Create an empty roster.
    pub fn new(team_count: usize, max_players_per_team: usize) -> Self {
        Self {
            players: BTreeMap::new(),
            team_count,
            max_players_per_team,
        }
    }

    /// Add a player to a team. The team id cannot change afterwards.
    pub fn join(&mut self, player: PlayerId, team_id: usize) -> Result<(), RosterError> {
        if team_id >= self.team_count {
            return Err(RosterError::TeamOutOfRange {
                team_id,
                team_count: self.team_count,
            });
        }

        if self.players.contains_key(&player) {
            return Err(RosterError::AlreadyJoined(player));
        }

        if self.team_size(team_id) >= self.max_players_per_team {
            return Err(RosterError::TeamFull { team_id });
        }

        self.players.insert(player, PlayerSlot::new(team_id));
        info!("{} joined team {}", player, team_id);
        Ok(())
    }

    /// Remove a player, freeing their team slot.
    ///
    /// Does not touch the power-up; callers that need the expired
    /// notification must force-expire first.
    pub fn remove(&mut self, player: PlayerId) -> Option<PlayerSlot> {
        let slot = self.players.remove(&player);
        if slot.is_some() {
            info!("{} left the match", player);
        }
        slot
    }

    /// Look up a player.
    pub fn get(&self, player: PlayerId) -> Option<&PlayerSlot> {
        self.players.get(&player)
    }

    /// Look up a player for mutation.
    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut PlayerSlot> {
        self.players.get_mut(&player)
    }

    /// Is this player in the match?
    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    /// Players on a team.
    pub fn team_size(&self, team_id: usize) -> usize {
        self.players.values().filter(|s| s.team_id() == team_id).count()
    }

    /// Number of joined players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// No players joined?
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerSlot)> + '_ {
        self.players.iter().map(|(id, slot)| (*id, slot))
    }

    /// Players in id order, mutable.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut PlayerSlot)> + '_ {
        self.players.iter_mut().map(|(id, slot)| (*id, slot))
    }

    /// Player ids in order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_player_per_team_by_default() {
        let mut roster = Roster::new(4, 1);
        assert_eq!(roster.join(PlayerId::new(1), 0), Ok(()));
        assert_eq!(
            roster.join(PlayerId::new(2), 0),
            Err(RosterError::TeamFull { team_id: 0 })
        );
        assert_eq!(roster.join(PlayerId::new(2), 1), Ok(()));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_join_errors() {
        let mut roster = Roster::new(4, 2);
        assert_eq!(
            roster.join(PlayerId::new(1), 4),
            Err(RosterError::TeamOutOfRange { team_id: 4, team_count: 4 })
        );

        roster.join(PlayerId::new(1), 0).unwrap();
        assert_eq!(
            roster.join(PlayerId::new(1), 1),
            Err(RosterError::AlreadyJoined(PlayerId::new(1)))
        );
        assert_eq!(roster.get(PlayerId::new(1)).map(|s| s.team_id()), Some(0));
    }

    #[test]
    fn test_remove_frees_slot() {
        let mut roster = Roster::new(2, 1);
        roster.join(PlayerId::new(1), 1).unwrap();

        assert!(roster.remove(PlayerId::new(1)).is_some());
        assert!(roster.remove(PlayerId::new(1)).is_none());
        assert_eq!(roster.join(PlayerId::new(2), 1), Ok(()));
    }

    #[test]
    fn test_new_slot_defaults() {
        let mut roster = Roster::new(4, 1);
        roster.join(PlayerId::new(9), 3).unwrap();
        let slot = roster.get(PlayerId::new(9)).unwrap();

        assert_eq!(slot.score.multiplier(), FIXED_ONE);
        assert_eq!(slot.stats, PlayerStats::default());
        assert!(!slot.power_up.is_active());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RosterError::TeamFull { team_id: 2 }.to_string(),
            "Team 2 is full"
        );
        assert_eq!(
            RosterError::AlreadyJoined(PlayerId::new(5)).to_string(),
            "Player P5 already joined"
        );
    }
}
