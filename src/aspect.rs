// aspect.rs — The axis-selection scaling law.
//
// The engine's projection is authored for 4:3. At any other ratio one axis of
// the view window has to absorb the difference: wide windows widen X, narrow
// or tall windows shrink Y. `aspect_ratio_limit` decides which.
//
// Forward and inverse use the same factor (multiply / divide) so a round trip
// hands the engine back its own value.

use crate::error::Result;
use crate::math::Vec2;
use crate::window::ClientSize;

/// The ratio the engine's field of view was authored for.
pub const ORIGINAL_ASPECT_RATIO: f32 = 4.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One resolved correction: which axis moves and by what factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    pub axis: Axis,
    pub factor: f32,
}

impl Correction {
    /// Stretch the view window for the current window shape.
    pub fn apply(self, v: Vec2) -> Vec2 {
        match self.axis {
            Axis::X => Vec2 { x: v.x * self.factor, ..v },
            Axis::Y => Vec2 { y: v.y * self.factor, ..v },
        }
    }

    /// Exact algebraic undo of `apply`.
    pub fn unapply(self, v: Vec2) -> Vec2 {
        match self.axis {
            Axis::X => Vec2 { x: v.x / self.factor, ..v },
            Axis::Y => Vec2 { y: v.y / self.factor, ..v },
        }
    }

    /// Forward correction for the reciprocal view window. The field already
    /// holds 1/viewWindow, so the forward direction is a division.
    pub fn apply_reciprocal(self, v: Vec2) -> Vec2 {
        self.unapply(v)
    }

    pub fn is_identity(self) -> bool {
        self.factor == 1.0
    }
}

/// Holds the configured limit; everything else is computed per call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectCorrector {
    limit: f32,
}

impl AspectCorrector {
    pub fn new(aspect_ratio_limit: f32) -> Self {
        Self { limit: aspect_ratio_limit }
    }

    /// Pick the axis and factor for a live aspect ratio.
    pub fn correction(&self, current_aspect_ratio: f32) -> Correction {
        let scale = current_aspect_ratio / ORIGINAL_ASPECT_RATIO;
        if current_aspect_ratio >= self.limit {
            Correction { axis: Axis::X, factor: scale }
        } else {
            Correction { axis: Axis::Y, factor: 1.0 / scale }
        }
    }

    /// Same as `correction`, from a client area. Fails on a minimised or
    /// zero-sized window instead of dividing by zero.
    pub fn correction_for(&self, size: ClientSize) -> Result<Correction> {
        Ok(self.correction(size.aspect_ratio()?))
    }
}
