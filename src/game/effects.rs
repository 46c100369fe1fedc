//! Built-in Power-Up Effects
//!
//! Listeners that turn a power-up's payload into a change on the player.
//! Each one reacts only to its own payload variant and remembers what it
//! overwrote per player, so two players can run the same effect at once.

use std::collections::BTreeMap;
use tracing::debug;

use crate::core::fixed::{Fixed, fixed_mul};
use crate::game::power_up::{EffectPayload, EffectTarget, PowerUpDescriptor, PowerUpListener};
use crate::game::state::PlayerId;

/// Sets the score multiplier while active.
#[derive(Debug, Default)]
pub struct ScoreMultiplierEffect;

impl PowerUpListener for ScoreMultiplierEffect {
    fn on_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::ScoreMultiplier { factor } = *descriptor.effect() {
            debug!("{:?} scoring multiplier set by {:?}", target.player, descriptor.name());
            target.score.set_multiplier(factor);
        }
    }

    fn on_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::ScoreMultiplier { .. } = *descriptor.effect() {
            target.score.reset_multiplier();
        }
    }
}

/// Resizes the player while active, then puts the old scale back.
#[derive(Debug, Default)]
pub struct ResizeEffect {
    original: BTreeMap<PlayerId, Fixed>,
}

impl PowerUpListener for ResizeEffect {
    fn on_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::Resize { scale } = *descriptor.effect() {
            self.original.insert(target.player, target.stats.scale);
            target.stats.scale = scale;
            debug!("{:?} resized by {:?}", target.player, descriptor.name());
        }
    }

    fn on_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::Resize { .. } = *descriptor.effect() {
            if let Some(scale) = self.original.remove(&target.player) {
                target.stats.scale = scale;
            }
        }
    }
}

/// Multiplies move magnitude while active.
#[derive(Debug, Default)]
pub struct SpeedBoostEffect {
    original: BTreeMap<PlayerId, Fixed>,
}

impl PowerUpListener for SpeedBoostEffect {
    fn on_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::SpeedBoost { factor } = *descriptor.effect() {
            let base = target.stats.move_magnitude;
            self.original.insert(target.player, base);
            target.stats.move_magnitude = fixed_mul(base, factor);
        }
    }

    fn on_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        if let EffectPayload::SpeedBoost { .. } = *descriptor.effect() {
            if let Some(base) = self.original.remove(&target.player) {
                target.stats.move_magnitude = base;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE};
    use crate::game::power_up::Rgb;
    use crate::game::roster::PlayerStats;
    use crate::game::score::ScoreCollector;

    fn descriptor(effect: EffectPayload) -> PowerUpDescriptor {
        PowerUpDescriptor::new("Test", FIXED_ONE, Rgb::new(1, 2, 3), effect)
    }

    #[test]
    fn test_multiplier_applied_and_restored() {
        let mut effect = ScoreMultiplierEffect;
        let mut score = ScoreCollector::new(0);
        let mut stats = PlayerStats::default();
        let d = descriptor(EffectPayload::ScoreMultiplier { factor: to_fixed(2.5) });

        let mut target = EffectTarget { player: PlayerId::new(1), score: &mut score, stats: &mut stats };
        effect.on_applied(&d, &mut target);
        assert_eq!(target.score.multiplier(), to_fixed(2.5));

        effect.on_expired(&d, &mut target);
        assert_eq!(target.score.multiplier(), FIXED_ONE);
    }

    #[test]
    fn test_effects_ignore_other_payloads() {
        let mut resize = ResizeEffect::default();
        let mut speed = SpeedBoostEffect::default();
        let mut multiplier = ScoreMultiplierEffect;
        let mut score = ScoreCollector::new(0);
        let mut stats = PlayerStats::default();
        let d = descriptor(EffectPayload::Marker);

        let mut target = EffectTarget { player: PlayerId::new(1), score: &mut score, stats: &mut stats };
        resize.on_applied(&d, &mut target);
        speed.on_applied(&d, &mut target);
        multiplier.on_applied(&d, &mut target);

        assert_eq!(*target.stats, PlayerStats::default());
        assert_eq!(target.score.multiplier(), FIXED_ONE);
    }

    #[test]
    fn test_resize_is_per_player() {
        let mut effect = ResizeEffect::default();
        let d = descriptor(EffectPayload::Resize { scale: to_fixed(0.75) });

        let mut score_a = ScoreCollector::new(0);
        let mut stats_a = PlayerStats { scale: to_fixed(2.0), ..PlayerStats::default() };
        let mut score_b = ScoreCollector::new(1);
        let mut stats_b = PlayerStats::default();

        let mut a = EffectTarget { player: PlayerId::new(1), score: &mut score_a, stats: &mut stats_a };
        let mut b = EffectTarget { player: PlayerId::new(2), score: &mut score_b, stats: &mut stats_b };

        effect.on_applied(&d, &mut a);
        effect.on_applied(&d, &mut b);
        assert_eq!(a.stats.scale, to_fixed(0.75));
        assert_eq!(b.stats.scale, to_fixed(0.75));

        effect.on_expired(&d, &mut b);
        effect.on_expired(&d, &mut a);
        assert_eq!(a.stats.scale, to_fixed(2.0));
        assert_eq!(b.stats.scale, FIXED_ONE);
    }

    #[test]
    fn test_speed_boost_restores_original() {
        let mut effect = SpeedBoostEffect::default();
        let mut score = ScoreCollector::new(0);
        let mut stats = PlayerStats::default();
        let base = stats.move_magnitude;
        let d = descriptor(EffectPayload::SpeedBoost { factor: to_fixed(1.5) });

        let mut target = EffectTarget { player: PlayerId::new(4), score: &mut score, stats: &mut stats };
        effect.on_applied(&d, &mut target);
        assert_eq!(target.stats.move_magnitude, fixed_mul(base, to_fixed(1.5)));

        effect.on_expired(&d, &mut target);
        assert_eq!(target.stats.move_magnitude, base);
    }
}
