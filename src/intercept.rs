// intercept.rs — Bodies of the two camera hooks.
//
// RwCameraSetViewWindow:
//   original(camera, view) -> engine derives recipViewWindow from the 4:3 base
//   -> divide one axis of recipViewWindow by the correction factor
//
// CameraBuildPerspClipPlanes:
//   stretch viewWindow -> original(camera) builds the frustum from it
//   -> undo the stretch -> return the original's result
//
// The engine never sees a corrected viewWindow outside the clip plane build.
// If the correction cannot be computed (no window, minimised, null or garbage
// camera) the original runs exactly once with untouched state.

use crate::aspect::{AspectCorrector, Correction};
use crate::camera::{check_finite, CameraRef};
use crate::error::Result;
use crate::layout::CameraLayout;
use crate::math::Vec2;
use crate::memory::Memory;
use crate::window::GameWindow;
use std::ffi::{c_char, c_void};

/// `RwCamera* RwCameraSetViewWindow(RwCamera*, const RwV2d*)`
pub type SetViewWindowFn = unsafe extern "C" fn(*mut c_void, *const Vec2) -> *mut c_void;

/// `RwBool CameraBuildPerspClipPlanes(RwCamera*)`
pub type BuildPerspClipPlanesFn = unsafe extern "C" fn(*mut c_void) -> i32;

/// `int ReadConfigFromIni(const char* path)`
pub type ReadConfigFromIniFn = unsafe extern "C" fn(*const c_char) -> i32;

pub struct CameraInterceptor {
    corrector: AspectCorrector,
    layout: CameraLayout,
}

impl CameraInterceptor {
    pub fn new(corrector: AspectCorrector, layout: CameraLayout) -> Self {
        Self { corrector, layout }
    }

    /// Everything that can fail before the camera is touched.
    fn prepare<'m>(
        &self,
        window: &dyn GameWindow,
        memory: &'m dyn Memory,
        camera: *mut c_void,
    ) -> Result<(CameraRef<'m>, Correction)> {
        let cam = CameraRef::new(camera, self.layout, memory)?;
        let correction = self.corrector.correction_for(window.client_size()?)?;
        Ok((cam, correction))
    }

    /// Replacement for RwCameraSetViewWindow.
    ///
    /// # Safety
    /// Must only be called with the arguments the engine passed to the hook.
    pub unsafe fn set_view_window(
        &self,
        window: &dyn GameWindow,
        memory: &dyn Memory,
        camera: *mut c_void,
        view: *const Vec2,
        original: SetViewWindowFn,
    ) -> *mut c_void {
        let result = original(camera, view);

        let corrected = self.prepare(window, memory, camera).and_then(|(cam, correction)| {
            let recip = check_finite(cam.recip_view_window()?)?;
            cam.set_recip_view_window(correction.apply_reciprocal(recip))
        });
        if let Err(e) = corrected {
            log::debug!("set view window: correction skipped: {}", e);
        }
        result
    }

    /// Replacement for CameraBuildPerspClipPlanes.
    ///
    /// # Safety
    /// Must only be called with the arguments the engine passed to the hook.
    pub unsafe fn build_clip_planes(
        &self,
        window: &dyn GameWindow,
        memory: &dyn Memory,
        camera: *mut c_void,
        original: BuildPerspClipPlanesFn,
    ) -> i32 {
        let applied = self.prepare(window, memory, camera).and_then(|(cam, correction)| {
            let view = check_finite(cam.view_window()?)?;
            cam.set_view_window(correction.apply(view))?;
            Ok((cam, correction))
        });

        match applied {
            Ok((cam, correction)) => {
                let result = original(camera);
                let restored = cam
                    .view_window()
                    .and_then(|v| cam.set_view_window(correction.unapply(v)));
                if let Err(e) = restored {
                    log::warn!("build clip planes: view window not restored: {}", e);
                }
                result
            }
            Err(e) => {
                log::debug!("build clip planes: correction skipped: {}", e);
                original(camera)
            }
        }
    }
}
