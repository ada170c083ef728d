// camera.rs — Typed access to the two RwCamera fields the mod perturbs.
//
// The struct itself is never mirrored in Rust: only the offsets from
// `CameraLayout` are used, so a layout change is a table edit.

use crate::error::{Error, Result};
use crate::layout::CameraLayout;
use crate::math::Vec2;
use crate::memory::Memory;
use std::ffi::c_void;

/// Borrowed view of an engine-owned `RwCamera`. All access goes through
/// `Memory`, so a stale or garbage pointer is an error, not a fault.
#[derive(Clone, Copy)]
pub struct CameraRef<'a> {
    base: usize,
    layout: CameraLayout,
    memory: &'a dyn Memory,
}

impl<'a> CameraRef<'a> {
    /// Fails for a null camera and for one whose view window fields are not
    /// readable.
    pub fn new(camera: *mut c_void, layout: CameraLayout, memory: &'a dyn Memory) -> Result<Self> {
        if camera.is_null() {
            return Err(Error::NullCamera);
        }
        let cam = Self { base: camera as usize, layout, memory };
        cam.view_window()?;
        cam.recip_view_window()?;
        Ok(cam)
    }

    pub fn view_window(&self) -> Result<Vec2> {
        self.memory.read_vec2(self.base + self.layout.view_window)
    }

    pub fn set_view_window(&self, v: Vec2) -> Result<()> {
        self.memory.write_vec2(self.base + self.layout.view_window, v)
    }

    pub fn recip_view_window(&self) -> Result<Vec2> {
        self.memory.read_vec2(self.base + self.layout.recip_view_window)
    }

    pub fn set_recip_view_window(&self, v: Vec2) -> Result<()> {
        self.memory.write_vec2(self.base + self.layout.recip_view_window, v)
    }
}

/// Reject a view window a half-built camera could hold.
pub fn check_finite(v: Vec2) -> Result<Vec2> {
    if v.is_finite() { Ok(v) } else { Err(Error::NonFiniteViewWindow { x: v.x, y: v.y }) }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeCamera;
    use super::*;
    use crate::layout::GameLayout;
    use crate::memory::fake::{FakeMemory, LocalMemory};

    #[test]
    fn reads_and_writes_at_layout_offsets() {
        let mut cam = FakeCamera::new(Vec2::new(0.5, 0.375), Vec2::new(2.0, 2.0 / 0.375));
        let r = CameraRef::new(cam.ptr(), GameLayout::SONIC_HEROES.camera, &LocalMemory).unwrap();

        assert_eq!(r.view_window().unwrap(), Vec2::new(0.5, 0.375));
        r.set_recip_view_window(Vec2::new(1.0, 1.0)).unwrap();
        assert_eq!(cam.recip(), Vec2::new(1.0, 1.0));
        assert_eq!(cam.view(), Vec2::new(0.5, 0.375));
    }

    #[test]
    fn null_camera_is_an_error() {
        let r = CameraRef::new(std::ptr::null_mut(), GameLayout::SONIC_HEROES.camera, &LocalMemory);
        assert!(matches!(r, Err(Error::NullCamera)));
    }

    #[test]
    fn unmapped_camera_is_an_error() {
        let layout = GameLayout::SONIC_HEROES.camera;
        let mem = FakeMemory::default();
        let r = CameraRef::new(0x10 as *mut c_void, layout, &mem);
        assert!(matches!(r, Err(Error::Unmapped { address, .. }) if address == 0x10 + layout.view_window));

        // Only the view window mapped: still rejected.
        mem.map(0x10 + layout.view_window, 8);
        assert!(CameraRef::new(0x10 as *mut c_void, layout, &mem).is_err());
        mem.map(0x10 + layout.recip_view_window, 8);
        assert!(CameraRef::new(0x10 as *mut c_void, layout, &mem).is_ok());
    }

    #[test]
    fn nan_view_window_is_rejected() {
        assert!(check_finite(Vec2::new(f32::NAN, 1.0)).is_err());
        assert!(check_finite(Vec2::new(1.0, f32::INFINITY)).is_err());
        assert!(check_finite(Vec2::new(1.0, 0.75)).is_ok());
    }
}
