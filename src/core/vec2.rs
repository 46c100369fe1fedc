//! Fixed-Point Ground-Plane Vector
//!
//! Deterministic 2D vector for positions on the arena floor.
//! `x` is the world X axis and `y` carries the world Z axis; height is
//! implicit (see [`GROUND_LEVEL`](super::fixed::GROUND_LEVEL)).

use std::fmt;
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_ONE, FIXED_SCALE, fixed_abs, fixed_mul};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Z component on the ground plane (Q16.16 fixed-point)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x)
            .wrapping_add(fixed_mul(self.y, self.y))
    }

    /// True if both components lie in `[-half_width, half_width]`.
    #[inline]
    pub fn within_square(self, half_width: Fixed) -> bool {
        fixed_abs(self.x) <= half_width && fixed_abs(self.y) <= half_width
    }

    /// Convert to float tuple for logging.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (
            self.x as f32 / FIXED_ONE as f32,
            self.y as f32 / FIXED_ONE as f32,
        )
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fz) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fz)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fz) = self.to_floats();
        write!(f, "({:.3}, {:.3})", fx, fz)
    }
}

// =============================================================================
// TESTS
// =============================================================================
