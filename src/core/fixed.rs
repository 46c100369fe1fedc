//! Q16.16 Fixed-Point Arithmetic
//!
//! This module provides deterministic fixed-point math for the arena simulation.
//! All operations use integer arithmetic only - no floats in gameplay logic.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Spawn rolls, pickup scoring and power-up deadlines all go through these
//! helpers, so a fixed RNG seed replays a match bit-for-bit.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// ARENA CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Tick duration: 1/60 second = round(65536/60) = 1092
pub const TICK_DURATION: Fixed = 1092;

/// Spawn square half-width: 11.0 = 11 * 65536 = 720896
pub const SPAWN_HALF_WIDTH: Fixed = 720896;

/// Playable disc radius: 12.3 * 65536 = 806092.8, rounded to 806093
pub const PLAY_AREA_RADIUS: Fixed = 806093;

/// Height of the ground plane. Spawned entities sit here.
pub const GROUND_LEVEL: Fixed = 0;

/// Below this height an entity has fallen off the arena: -10.0
pub const FALL_THRESHOLD: Fixed = -655360;

/// Indicator light intensity while a power-up is active: 8.0
pub const INDICATOR_INTENSITY: Fixed = 524288;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a float to fixed-point, rounding to the nearest step.
///
/// # Warning
/// Only use at compile-time or configuration load. NEVER in tick loop.
///
/// # Example
/// ```
/// use arena_runtime::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    let scaled = f * (FIXED_ONE as f64);
    if scaled < 0.0 {
        (scaled - 0.5) as Fixed
    } else {
        (scaled + 0.5) as Fixed
    }
}

/// Convert fixed-point to float for display/logging.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Multiply two fixed-point numbers.
///
/// Uses i64 intermediate to prevent overflow, then shifts back.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Duration of one simulation step at `tick_rate` Hz.
#[inline]
pub fn step_duration(tick_rate: u32) -> Fixed {
    if tick_rate == 0 {
        return 0;
    }
    // Round to nearest so 60 Hz lands on TICK_DURATION.
    ((FIXED_ONE as i64 + tick_rate as i64 / 2) / tick_rate as i64) as Fixed
}

/// Convert a duration in seconds to whole ticks, rounding up.
///
/// Any positive duration lasts at least one tick.
#[inline]
pub fn seconds_to_ticks(seconds: Fixed, tick_rate: u32) -> u32 {
    if seconds <= 0 {
        return 0;
    }
    let wide = seconds as i64 * tick_rate as i64;
    let ticks = (wide + FIXED_ONE as i64 - 1) >> FIXED_SCALE;
    ticks.max(1) as u32
}

/// Multiply an integer by a fixed-point factor, truncating toward zero.
///
/// The product is formed before the fractional part is dropped, so
/// `7 * 2.5` is 17 and `-7 * 2.5` is -17.
#[inline]
pub fn mul_int_trunc(value: i32, factor: Fixed) -> i32 {
    let wide = value as i64 * factor as i64;
    (wide / FIXED_ONE as i64) as i32
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(FIXED_SCALE, 16);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(2.0), FIXED_ONE * 2);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
    }

    #[test]
    fn test_to_fixed_rounds_to_nearest() {
        // 1.2 * 65536 = 78643.2, 0.985 * 65536 = 64552.96
        assert_eq!(to_fixed(1.2), 78643);
        assert_eq!(to_fixed(0.985), 64553);
        assert_eq!(to_fixed(-0.985), -64553);
        assert_eq!(mul_int_trunc(10, to_fixed(1.2)), 12);
        assert_eq!(mul_int_trunc(10, to_fixed(1.1)), 11);
        assert_eq!(mul_int_trunc(10, to_fixed(0.6)), 6);
    }

    #[test]
    fn test_fixed_mul() {
        let result = fixed_mul(to_fixed(2.0), to_fixed(3.0));
        assert_eq!(result, to_fixed(6.0));

        let result2 = fixed_mul(FIXED_HALF, FIXED_HALF);
        assert_eq!(result2, to_fixed(0.25));

        let result3 = fixed_mul(to_fixed(-2.0), to_fixed(3.0));
        assert_eq!(result3, to_fixed(-6.0));
    }

    #[test]
    fn test_arena_constants() {
        assert_eq!(TICK_DURATION, 1092);
        assert_eq!(SPAWN_HALF_WIDTH, 11 * FIXED_ONE);
        assert_eq!(PLAY_AREA_RADIUS, to_fixed(12.3));
        assert_eq!(FALL_THRESHOLD, -10 * FIXED_ONE);
        assert_eq!(INDICATOR_INTENSITY, 8 * FIXED_ONE);
    }

    #[test]
    fn test_step_duration() {
        assert_eq!(step_duration(60), TICK_DURATION);
        assert_eq!(step_duration(1), FIXED_ONE);
        assert_eq!(step_duration(0), 0);
    }

    #[test]
    fn test_seconds_to_ticks_rounds_up() {
        assert_eq!(seconds_to_ticks(to_fixed(5.0), 60), 300);
        assert_eq!(seconds_to_ticks(to_fixed(0.5), 60), 30);
        // 0.001 s is shorter than a tick but still lasts one
        assert_eq!(seconds_to_ticks(to_fixed(0.001), 60), 1);
        assert_eq!(seconds_to_ticks(0, 60), 0);
    }

    #[test]
    fn test_mul_int_trunc_order() {
        // floor(7 * 2.5) = 17, not 7 * 2 = 14
        assert_eq!(mul_int_trunc(7, to_fixed(2.5)), 17);
        // Truncation toward zero for negative products
        assert_eq!(mul_int_trunc(-7, to_fixed(2.5)), -17);
        assert_eq!(mul_int_trunc(10, FIXED_ONE), 10);
        assert_eq!(mul_int_trunc(10, 0), 0);
    }
}
