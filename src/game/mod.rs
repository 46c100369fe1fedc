//! Game Logic Module
//!
//! The arena simulation. Deterministic given a seed and the sequence of
//! pickup reports.
//!
//! ## Module Structure
//!
//! - `hub`: Team scores, match clock and level, with subscriptions
//! - `spawn`: Collectable, power-up and enemy wave scheduling
//! - `power_up`: Per-player power-up lifecycle and listener bus
//! - `effects`: Built-in power-up effects
//! - `score`: Per-player score collection
//! - `roster`: Joined players and their teams
//! - `world`: Entity store and scene collaborator traits
//! - `state`: The arena, tying the above together
//! - `tick`: Fixed step, headless match loop, state hash
//! - `events`: Game events for replay/verification

pub mod hub;
pub mod spawn;
pub mod power_up;
pub mod effects;
pub mod score;
pub mod roster;
pub mod world;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use hub::{EventHub, HubEvent, HubNotification, MatchState};
pub use spawn::{SpawnKind, SpawnScheduler, SpawnSettings};
pub use power_up::{PowerUpDescriptor, PowerUpLifecycle, PowerUpListener};
pub use score::ScoreCollector;
pub use world::{ArenaWorld, Indicator, World};
pub use state::{Arena, EntityId, PickupOutcome, PlayerId};
pub use tick::{MatchRun, StepResult};
pub use events::GameEvent;
