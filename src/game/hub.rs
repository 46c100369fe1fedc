//! Event Hub
//!
//! Single source of truth for match-wide counters (team scores, remaining
//! time, level index) and the only place their changes are broadcast.
//!
//! The hub is an ordinary owned value. Whoever owns the [`Arena`] owns the
//! hub, and components reach it through that owner rather than a global.
//!
//! Delivery is synchronous: every subscriber of an event has run, and has
//! seen the updated counters, before the mutating call returns.
//!
//! [`Arena`]: crate::game::state::Arena

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

/// Team count of the observed arena.
pub const DEFAULT_TEAM_COUNT: usize = 4;

/// Total match time in seconds (5 levels of 90 seconds).
pub const DEFAULT_MATCH_SECONDS: i32 = 450;

/// Match-wide counters.
///
/// Only [`EventHub`] mutates this. Scores are not clamped; a negative point
/// value drives a team below zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    team_scores: Vec<i32>,
    remaining_time: i32,
    level_index: u32,
}

impl MatchState {
    /// Score per team, indexed by team id.
    pub fn team_scores(&self) -> &[i32] {
        &self.team_scores
    }

    /// Score of a single team, if the id is valid.
    pub fn team_score(&self, team_id: usize) -> Option<i32> {
        self.team_scores.get(team_id).copied()
    }

    /// Remaining match time in seconds.
    pub fn remaining_time(&self) -> i32 {
        self.remaining_time
    }

    /// Current level (scene) index.
    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    /// Number of teams.
    pub fn team_count(&self) -> usize {
        self.team_scores.len()
    }
}

/// Event names subscribers can register for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HubEvent {
    /// A team's score changed
    ScoreChanged,
    /// Remaining time ticked down
    TimeChanged,
    /// Level index advanced
    LevelChanged,
}

/// Typed payload delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubNotification {
    /// `points` were added to `team_id`
    ScoreChanged { team_id: usize, points: i32 },
    /// New remaining time in seconds
    TimeChanged { remaining: i32 },
    /// New level index
    LevelChanged { level: u32 },
}

impl HubNotification {
    /// The event name this payload is published under.
    pub fn event(&self) -> HubEvent {
        match self {
            HubNotification::ScoreChanged { .. } => HubEvent::ScoreChanged,
            HubNotification::TimeChanged { .. } => HubEvent::TimeChanged,
            HubNotification::LevelChanged { .. } => HubEvent::LevelChanged,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Subscriber callback. Receives the payload and the already-updated state.
pub type HubHandler = Box<dyn FnMut(&HubNotification, &MatchState) + Send>;

/// Match counters plus a publish/subscribe registry.
pub struct EventHub {
    state: MatchState,
    /// Handlers per event, in registration order
    subscribers: BTreeMap<HubEvent, Vec<(SubscriptionId, HubHandler)>>,
    next_subscription: u64,
}

impl EventHub {
    /// Create a hub for `team_count` teams and `match_seconds` of play.
    ///
    /// # Panics
    /// Panics if `team_count` is zero.
    pub fn new(team_count: usize, match_seconds: i32) -> Self {
        assert!(team_count > 0, "an arena needs at least one team");

        Self {
            state: MatchState {
                team_scores: vec![0; team_count],
                remaining_time: match_seconds,
                level_index: 0,
            },
            subscribers: BTreeMap::new(),
            next_subscription: 0,
        }
    }

    /// Read-only view of the counters.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Register a handler for one event. Handlers run in registration order.
    pub fn subscribe<F>(&mut self, event: HubEvent, handler: F) -> SubscriptionId
    where
        F: FnMut(&HubNotification, &MatchState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        self.subscribers
            .entry(event)
            .or_default()
            .push((id, Box::new(handler)));

        debug!("Hub subscription {:?} registered for {:?}", id, event);
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.subscribers.values_mut() {
            if let Some(index) = handlers.iter().position(|(sid, _)| *sid == id) {
                handlers.remove(index);
                debug!("Hub subscription {:?} removed", id);
                return true;
            }
        }
        false
    }

    /// Number of handlers registered for an event.
    pub fn subscriber_count(&self, event: HubEvent) -> usize {
        self.subscribers.get(&event).map_or(0, Vec::len)
    }

    /// Add `points` to a team and publish `ScoreChanged`.
    ///
    /// # Panics
    /// Panics if `team_id` is not a valid team index. Team ids are assigned
    /// at join time, so an invalid one is a wiring bug.
    pub fn add_score(&mut self, team_id: usize, points: i32) {
        let team_count = self.state.team_scores.len();
        assert!(
            team_id < team_count,
            "team id {} out of range (team count {})",
            team_id,
            team_count
        );

        let score = &mut self.state.team_scores[team_id];
        *score = score.wrapping_add(points);

        self.publish(HubNotification::ScoreChanged { team_id, points });
    }

    /// Count one second off the match clock and publish `TimeChanged`.
    ///
    /// Returns the new remaining time.
    pub fn tick_time(&mut self) -> i32 {
        self.state.remaining_time -= 1;
        let remaining = self.state.remaining_time;

        self.publish(HubNotification::TimeChanged { remaining });
        remaining
    }

    /// Advance the level index and publish `LevelChanged`.
    ///
    /// Returns the new level index.
    pub fn advance_level(&mut self) -> u32 {
        self.state.level_index += 1;
        let level = self.state.level_index;

        info!("Advanced to level {}", level);
        self.publish(HubNotification::LevelChanged { level });
        level
    }

    fn publish(&mut self, notification: HubNotification) {
        let state = &self.state;
        if let Some(handlers) = self.subscribers.get_mut(&notification.event()) {
            for (_, handler) in handlers.iter_mut() {
                handler(&notification, state);
            }
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_TEAM_COUNT, DEFAULT_MATCH_SECONDS)
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<HubEvent, usize> = self
            .subscribers
            .iter()
            .map(|(event, handlers)| (*event, handlers.len()))
            .collect();
        f.debug_struct("EventHub")
            .field("state", &self.state)
            .field("subscribers", &counts)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
