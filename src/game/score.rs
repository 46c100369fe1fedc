//! Score Collector
//!
//! Per-player scoring. Applies the live multiplier to a pickup's base
//! value and reports the result to the hub.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, mul_int_trunc};
use crate::game::hub::EventHub;

/// A player's scorer.
///
/// The team id is fixed at join time. The multiplier is changed only by
/// power-up effects and is read at the moment of each collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCollector {
    team_id: usize,
    multiplier: Fixed,
}

impl ScoreCollector {
    /// Create a scorer for `team_id` with a multiplier of 1.
    pub fn new(team_id: usize) -> Self {
        Self {
            team_id,
            multiplier: FIXED_ONE,
        }
    }

    /// Team this player scores for.
    pub fn team_id(&self) -> usize {
        self.team_id
    }

    /// Current multiplier.
    pub fn multiplier(&self) -> Fixed {
        self.multiplier
    }

    /// Replace the multiplier.
    pub fn set_multiplier(&mut self, multiplier: Fixed) {
        self.multiplier = multiplier;
    }

    /// Back to 1.
    pub fn reset_multiplier(&mut self) {
        self.multiplier = FIXED_ONE;
    }

    /// Points a pickup of `base_value` is worth right now.
    ///
    /// Multiplies first and truncates toward zero after, so 7 at 2.5x is 17.
    #[inline]
    pub fn final_points(&self, base_value: i32) -> i32 {
        mul_int_trunc(base_value, self.multiplier)
    }

    /// Score a pickup for this player's team. Returns the points awarded.
    pub fn collect(&self, base_value: i32, hub: &mut EventHub) -> i32 {
        let points = self.final_points(base_value);
        debug!(
            "Team {} scores {} (base {}, multiplier {})",
            self.team_id,
            points,
            base_value,
            crate::core::fixed::to_float(self.multiplier)
        );
        hub.add_score(self.team_id, points);
        points
    }
}
