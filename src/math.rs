// math.rs — 2D vector type matching RenderWare's RwV2d.

/// A 2-component vector (x, y) matching the engine's `RwV2d` layout.
/// Used for the camera's view window and reciprocal view window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both components are finite (no NaN/inf from a half-initialised camera).
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
