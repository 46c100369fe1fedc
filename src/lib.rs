//! # Arena Runtime
//!
//! Coordination layer for a local multiplayer arena: spawning, scoring,
//! power-ups and the match clock.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ARENA RUNTIME                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── hub.rs      - Scores, clock, level, subscriptions       │
//! │  ├── spawn.rs    - Spawn scheduler and enemy waves           │
//! │  ├── power_up.rs - Power-up lifecycle and listener bus       │
//! │  ├── score.rs    - Per-player score collection               │
//! │  ├── world.rs    - Entity store and scene traits             │
//! │  ├── state.rs    - The arena                                 │
//! │  └── tick.rs     - Fixed step and headless loop              │
//! │                                                              │
//! │  config.rs       - TOML configuration                        │
//! │  runtime.rs      - Real-time driver (non-deterministic)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No floating-point arithmetic in game logic (config converts once)
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and the same pickup reports at the same ticks, a
//! headless run produces the same state hash every time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod runtime;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use core::rng::DeterministicRng;
pub use config::{ArenaConfig, ConfigError};
pub use game::state::{Arena, PlayerId, EntityId};
pub use game::world::ArenaWorld;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
