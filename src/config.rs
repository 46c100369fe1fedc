//! Arena Configuration
//!
//! Loaded once from TOML. Every field has a default, so an empty file (or
//! no file) gives the standard four-team arena. Real-valued settings are
//! converted to fixed point here and nowhere else.
//!
//! ```toml
//! [match]
//! seed = 42
//! level_seconds = 90
//!
//! [spawn]
//! collectable_rate = 20
//! power_up_rate = 6
//!
//! [[power_ups]]
//! name = "Double Points"
//! duration = 5.0
//! color = [255, 215, 0]
//! effect = { type = "score_multiplier", factor = 2.0 }
//! ```

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::{Fixed, to_fixed, step_duration};
use crate::game::hub::DEFAULT_TEAM_COUNT;
use crate::game::power_up::{EffectPayload, PowerUpDescriptor, Rgb};
use crate::game::spawn::SpawnSettings;
use crate::game::world::WorldSettings;

/// Slowest allowed spawn rate (per minute)
pub const MIN_SPAWN_RATE: f64 = 3.0;

/// Fastest allowed spawn rate (per minute)
pub const MAX_SPAWN_RATE: f64 = 30.0;

/// Shortest allowed pickup time in scene (seconds)
pub const MIN_PICKUP_LIFETIME: f64 = 3.0;

/// Longest allowed pickup time in scene (seconds)
pub const MAX_PICKUP_LIFETIME: f64 = 30.0;

/// Sampling square half-width must stay below this. Beyond it the squared
/// distance of a corner point no longer fits in Q16.16.
pub const MAX_HALF_WIDTH: f64 = 128.0;

/// Play radius must stay below this, for the same reason.
pub const MAX_PLAY_RADIUS: f64 = 181.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Match setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSection {
    /// Spawn RNG seed
    pub seed: u64,
    /// Number of teams
    pub team_count: usize,
    /// Players allowed per team
    pub max_players_per_team: usize,
    /// Simulation steps per second
    pub tick_rate: u32,
    /// Seconds per level
    pub level_seconds: u32,
    /// Levels per match
    pub level_count: u32,
}

impl Default for MatchSection {
    fn default() -> Self {
        Self {
            seed: 0,
            team_count: DEFAULT_TEAM_COUNT,
            max_players_per_team: 1,
            tick_rate: crate::TICK_RATE,
            level_seconds: 90,
            level_count: 5,
        }
    }
}

/// Spawner tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSection {
    /// Collectables per minute (3 to 30)
    pub collectable_rate: f64,
    /// Power-ups per minute (3 to 30)
    pub power_up_rate: f64,
    /// Cap on enemy wave size (at least 1)
    pub max_wave_size: u32,
    /// Size of the first wave
    pub initial_wave_size: u32,
    /// Half-width of the sampling square
    pub half_width: f64,
    /// Radius of the playable disc
    pub play_radius: f64,
    /// Rotation given to spawned entities
    pub rotation: f64,
}

impl Default for SpawnSection {
    fn default() -> Self {
        Self {
            collectable_rate: 30.0,
            power_up_rate: 6.0,
            max_wave_size: 5,
            initial_wave_size: 0,
            half_width: 11.0,
            play_radius: 12.3,
            rotation: 0.0,
        }
    }
}

/// Pickup tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupSection {
    /// Base points per collectable
    pub collectable_value: i32,
    /// Collectable time in scene (seconds)
    pub collectable_lifetime: f64,
    /// Power-up time in scene (seconds)
    pub power_up_lifetime: f64,
    /// Indicator intensity while a power-up runs
    pub indicator_intensity: f64,
}

impl Default for PickupSection {
    fn default() -> Self {
        Self {
            collectable_value: 10,
            collectable_lifetime: 10.0,
            power_up_lifetime: 10.0,
            indicator_intensity: 8.0,
        }
    }
}

/// Effect as written in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSection {
    /// Multiply collected points
    ScoreMultiplier {
        /// Multiplier while active
        factor: f64,
    },
    /// Set the player's scale
    Resize {
        /// Scale while active
        scale: f64,
    },
    /// Multiply move magnitude
    SpeedBoost {
        /// Multiplier while active
        factor: f64,
    },
    /// No built-in effect
    Marker,
}

impl EffectSection {
    fn to_payload(&self) -> EffectPayload {
        match self {
            EffectSection::ScoreMultiplier { factor } => EffectPayload::ScoreMultiplier { factor: to_fixed(*factor) },
            EffectSection::Resize { scale } => EffectPayload::Resize { scale: to_fixed(*scale) },
            EffectSection::SpeedBoost { factor } => EffectPayload::SpeedBoost { factor: to_fixed(*factor) },
            EffectSection::Marker => EffectPayload::Marker,
        }
    }
}

/// One configured power-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpSection {
    /// Identifier
    pub name: String,
    /// Effect duration in seconds
    pub duration: f64,
    /// Indicator color
    pub color: [u8; 3],
    /// Effect parameters
    pub effect: EffectSection,
}

/// Full arena configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// `[match]`
    #[serde(rename = "match")]
    pub game: MatchSection,
    /// `[spawn]`
    pub spawn: SpawnSection,
    /// `[pickups]`
    pub pickups: PickupSection,
    /// `[[power_ups]]`
    pub power_ups: Vec<PowerUpSection>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            game: MatchSection::default(),
            spawn: SpawnSection::default(),
            pickups: PickupSection::default(),
            power_ups: vec![
                PowerUpSection {
                    name: "Double Points".to_string(),
                    duration: 5.0,
                    color: [255, 215, 0],
                    effect: EffectSection::ScoreMultiplier { factor: 2.0 },
                },
                PowerUpSection {
                    name: "Noodle".to_string(),
                    duration: 5.0,
                    color: [255, 0, 255],
                    effect: EffectSection::Resize { scale: 0.75 },
                },
                PowerUpSection {
                    name: "Speed Boost".to_string(),
                    duration: 4.0,
                    color: [0, 200, 255],
                    effect: EffectSection::SpeedBoost { factor: 1.5 },
                },
            ],
        }
    }
}

impl ArenaConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check every value the arena would otherwise assert on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.team_count == 0 {
            return invalid("match.team_count must be at least 1");
        }
        if game.max_players_per_team == 0 {
            return invalid("match.max_players_per_team must be at least 1");
        }
        if game.tick_rate == 0 {
            return invalid("match.tick_rate must be at least 1");
        }
        if game.level_seconds == 0 || game.level_count == 0 {
            return invalid("match.level_seconds and match.level_count must be at least 1");
        }
        if i32::try_from(u64::from(game.level_seconds) * u64::from(game.level_count)).is_err() {
            return invalid("match length does not fit in the match clock");
        }

        let spawn = &self.spawn;
        for (name, rate) in [("collectable_rate", spawn.collectable_rate), ("power_up_rate", spawn.power_up_rate)] {
            if !(MIN_SPAWN_RATE..=MAX_SPAWN_RATE).contains(&rate) {
                return invalid(format!(
                    "spawn.{} must be between {} and {} per minute, got {}",
                    name, MIN_SPAWN_RATE, MAX_SPAWN_RATE, rate
                ));
            }
        }
        if spawn.max_wave_size == 0 {
            return invalid("spawn.max_wave_size must be at least 1");
        }
        if spawn.initial_wave_size > spawn.max_wave_size {
            return invalid(format!(
                "spawn.initial_wave_size ({}) exceeds spawn.max_wave_size ({})",
                spawn.initial_wave_size, spawn.max_wave_size
            ));
        }
        if !(to_fixed(spawn.half_width) > 0 && spawn.half_width < MAX_HALF_WIDTH) {
            return invalid(format!(
                "spawn.half_width must be positive and below {}, got {}",
                MAX_HALF_WIDTH, spawn.half_width
            ));
        }
        if !(to_fixed(spawn.play_radius) > 0 && spawn.play_radius < MAX_PLAY_RADIUS) {
            return invalid(format!(
                "spawn.play_radius must be positive and below {}, got {}",
                MAX_PLAY_RADIUS, spawn.play_radius
            ));
        }

        let pickups = &self.pickups;
        for (name, lifetime) in [
            ("collectable_lifetime", pickups.collectable_lifetime),
            ("power_up_lifetime", pickups.power_up_lifetime),
        ] {
            if !(MIN_PICKUP_LIFETIME..=MAX_PICKUP_LIFETIME).contains(&lifetime) {
                return invalid(format!(
                    "pickups.{} must be between {} and {} seconds, got {}",
                    name, MIN_PICKUP_LIFETIME, MAX_PICKUP_LIFETIME, lifetime
                ));
            }
        }
        if !(0.0..1000.0).contains(&pickups.indicator_intensity) {
            return invalid("pickups.indicator_intensity must be between 0 and 1000");
        }

        for power_up in &self.power_ups {
            if power_up.name.trim().is_empty() {
                return invalid("power_ups.name must not be empty");
            }
            // Must survive conversion to fixed point
            if !(to_fixed(power_up.duration) > 0 && power_up.duration < 1000.0) {
                return invalid(format!(
                    "power-up {:?} needs a duration between 0 and 1000 seconds",
                    power_up.name
                ));
            }
        }

        Ok(())
    }

    /// Total match time in seconds.
    pub fn match_seconds(&self) -> i32 {
        (self.game.level_seconds * self.game.level_count) as i32
    }

    /// Indicator intensity in fixed point.
    pub fn indicator_intensity(&self) -> Fixed {
        to_fixed(self.pickups.indicator_intensity)
    }

    /// Scheduler settings in fixed point.
    pub fn spawn_settings(&self) -> SpawnSettings {
        SpawnSettings {
            collectable_rate: to_fixed(self.spawn.collectable_rate),
            power_up_rate: to_fixed(self.spawn.power_up_rate),
            collectable_value: self.pickups.collectable_value,
            step_duration: step_duration(self.game.tick_rate),
            half_width: to_fixed(self.spawn.half_width),
            play_radius: to_fixed(self.spawn.play_radius),
            rotation: to_fixed(self.spawn.rotation),
            initial_wave_size: self.spawn.initial_wave_size,
            max_wave_size: self.spawn.max_wave_size,
        }
    }

    /// World timings in fixed point.
    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            tick_rate: self.game.tick_rate,
            collectable_lifetime: to_fixed(self.pickups.collectable_lifetime),
            power_up_lifetime: to_fixed(self.pickups.power_up_lifetime),
        }
    }

    /// Power-up descriptors in config order.
    pub fn power_up_descriptors(&self) -> Vec<PowerUpDescriptor> {
        self.power_ups
            .iter()
            .map(|p| {
                let [r, g, b] = p.color;
                PowerUpDescriptor::new(
                    p.name.clone(),
                    to_fixed(p.duration),
                    Rgb::new(r, g, b),
                    p.effect.to_payload(),
                )
            })
            .collect()
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{FIXED_ONE, PLAY_AREA_RADIUS, SPAWN_HALF_WIDTH, TICK_DURATION, INDICATOR_INTENSITY};

    #[test]
    fn test_defaults_are_valid() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.match_seconds(), 450);
        assert_eq!(config.indicator_intensity(), INDICATOR_INTENSITY);

        let spawn = config.spawn_settings();
        assert_eq!(spawn.step_duration, TICK_DURATION);
        assert_eq!(spawn.half_width, SPAWN_HALF_WIDTH);
        assert_eq!(spawn.play_radius, PLAY_AREA_RADIUS);
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ArenaConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArenaConfig::default());
    }

    #[test]
    fn test_parse_full_document() {
        let text = r#"
            [match]
            seed = 42
            team_count = 2
            level_seconds = 30
            level_count = 2

            [spawn]
            collectable_rate = 12
            power_up_rate = 3
            max_wave_size = 3

            [pickups]
            collectable_value = 7

            [[power_ups]]
            name = "Triple"
            duration = 2.5
            color = [10, 20, 30]
            effect = { type = "score_multiplier", factor = 3.0 }

            [[power_ups]]
            name = "Glow"
            duration = 1.0
            color = [0, 0, 0]
            effect = { type = "marker" }
        "#;

        let config = ArenaConfig::from_toml_str(text).unwrap();
        assert_eq!(config.game.seed, 42);
        assert_eq!(config.game.team_count, 2);
        assert_eq!(config.game.tick_rate, 60);
        assert_eq!(config.match_seconds(), 60);
        assert_eq!(config.pickups.collectable_value, 7);

        let descriptors = config.power_up_descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name(), "Triple");
        assert_eq!(descriptors[0].duration(), to_fixed(2.5));
        assert_eq!(descriptors[0].color(), Rgb::new(10, 20, 30));
        assert_eq!(descriptors[0].effect(), &EffectPayload::ScoreMultiplier { factor: 3 * FIXED_ONE });
        assert_eq!(descriptors[1].effect(), &EffectPayload::Marker);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let cases = [
            "[spawn]\ncollectable_rate = 31",
            "[spawn]\npower_up_rate = 2",
            "[spawn]\nmax_wave_size = 0",
            "[spawn]\ninitial_wave_size = 9",
            "[spawn]\nplay_radius = 0",
            "[spawn]\nplay_radius = 500",
            "[spawn]\nhalf_width = 128",
            "[spawn]\nhalf_width = 0.000001",
            "[match]\nteam_count = 0",
            "[pickups]\npower_up_lifetime = 45",
            "[[power_ups]]\nname = \"Zero\"\nduration = 0\ncolor = [0, 0, 0]\neffect = { type = \"marker\" }",
            "[[power_ups]]\nname = \"Blink\"\nduration = 0.00001\ncolor = [0, 0, 0]\neffect = { type = \"marker\" }",
            "[[power_ups]]\nname = \" \"\nduration = 1\ncolor = [0, 0, 0]\neffect = { type = \"marker\" }",
        ];

        for text in cases {
            match ArenaConfig::from_toml_str(text) {
                Err(ConfigError::Invalid(_)) => {}
                other => panic!("{:?} should be invalid, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_error_reported() {
        let result = ArenaConfig::from_toml_str("[match]\nseed = \"not a number\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ArenaConfig::load("/nonexistent/arena.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
