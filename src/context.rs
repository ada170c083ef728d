// context.rs — The one owned context every detour reads from.
//
// Built and published exactly once during init, before any hook is switched
// on, and only read afterwards. The engine calls the hooked routines from its
// render thread only; nothing here is designed for concurrent detour calls.
//
// Flow:
//   install()  -> patches -> create hooks -> publish context -> activate hooks
//   detours    -> CONTEXT.get() -> CameraInterceptor / ResizeBridge
//   shutdown() -> stop resize events -> disable + free all hooks

use crate::aspect::AspectCorrector;
use crate::config::GraphicsSettings;
use crate::error::{Error, Result};
use crate::hook::{FunctionHook, HookBackend, HookState, HookTable};
use crate::intercept::{BuildPerspClipPlanesFn, CameraInterceptor, ReadConfigFromIniFn, SetViewWindowFn};
use crate::layout::GameLayout;
use crate::math::Vec2;
use crate::memory::Memory;
use crate::patches;
use crate::resize::{ResizeBridge, WindowEvent};
use crate::window::GameWindow;
use once_cell::sync::OnceCell;
use std::ffi::{c_char, c_void};
use std::sync::{Mutex, MutexGuard};

static CONTEXT: OnceCell<ModContext> = OnceCell::new();

type Table = HookTable<Box<dyn HookBackend>>;

/// The published context, once `install` has run.
pub fn get() -> Option<&'static ModContext> {
    CONTEXT.get()
}

/// OS-facing pieces the context is built from.
pub struct Platform {
    pub backend: Box<dyn HookBackend>,
    pub window: Box<dyn GameWindow>,
    pub memory: Box<dyn Memory>,
}

struct Hooks {
    set_view_window: FunctionHook<SetViewWindowFn>,
    build_clip_planes: FunctionHook<BuildPerspClipPlanesFn>,
    read_config: FunctionHook<ReadConfigFromIniFn>,
}

pub struct ModContext {
    settings: GraphicsSettings,
    layout: GameLayout,
    camera: CameraInterceptor,
    resize: ResizeBridge,
    window: Box<dyn GameWindow>,
    memory: Box<dyn Memory>,
    hooks: Hooks,
    table: Mutex<Table>,
}

impl ModContext {
    pub fn memory(&self) -> &dyn Memory {
        &*self.memory
    }

    pub fn hook_state(&self, address: usize) -> Option<HookState> {
        self.table().state(address)
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    unsafe fn set_view_window(&self, camera: *mut c_void, view: *const Vec2) -> *mut c_void {
        self.resize.ensure_installed(&*self.window);
        self.camera.set_view_window(&*self.window, &*self.memory, camera, view, self.hooks.set_view_window.original())
    }

    unsafe fn build_clip_planes(&self, camera: *mut c_void) -> i32 {
        self.camera.build_clip_planes(&*self.window, &*self.memory, camera, self.hooks.build_clip_planes.original())
    }

    /// Let the engine read its ini, then force our fullscreen preference.
    unsafe fn read_config(&self, path: *const c_char) -> i32 {
        let result = (self.hooks.read_config.original())(path);
        let fullscreen = self.settings.fullscreen as i32;
        if let Err(e) = self.memory.write_i32(self.layout.config_fullscreen, fullscreen) {
            log::warn!("fullscreen override failed: {}", e);
        }
        result
    }

    /// Entry point for OS window events.
    pub fn on_window_event(&self, event: WindowEvent) {
        if let Err(e) = self.resize.on_event(event, &*self.window, &*self.memory) {
            log::debug!("resize event dropped: {}", e);
        }
    }
}

// ============================================================
// Detours
// ============================================================
// Hooks are only activated after the context is published, so the `None`
// arms never run in practice.

unsafe extern "C" fn set_view_window_detour(camera: *mut c_void, view: *const Vec2) -> *mut c_void {
    match CONTEXT.get() {
        Some(ctx) => ctx.set_view_window(camera, view),
        None => camera,
    }
}

unsafe extern "C" fn build_clip_planes_detour(camera: *mut c_void) -> i32 {
    match CONTEXT.get() {
        Some(ctx) => ctx.build_clip_planes(camera),
        None => 1, // pretend success
    }
}

unsafe extern "C" fn read_config_detour(path: *const c_char) -> i32 {
    match CONTEXT.get() {
        Some(ctx) => ctx.read_config(path),
        None => 0,
    }
}

// ============================================================
// Lifecycle
// ============================================================

unsafe fn create_hooks(table: &mut Table, layout: &GameLayout) -> Result<Hooks> {
    Ok(Hooks {
        set_view_window: table
            .create(layout.camera_set_view_window, set_view_window_detour as SetViewWindowFn)?,
        build_clip_planes: table
            .create(layout.camera_build_persp_clip_planes, build_clip_planes_detour as BuildPerspClipPlanesFn)?,
        read_config: table
            .create(layout.read_config_from_ini, read_config_detour as ReadConfigFromIniFn)?,
    })
}

/// All three or none.
unsafe fn activate_all(table: &mut Table, hooks: &Hooks) -> Result<()> {
    let result = (|| -> Result<()> {
        table.activate(&hooks.set_view_window)?;
        table.activate(&hooks.build_clip_planes)?;
        table.activate(&hooks.read_config)?;
        Ok(())
    })();
    if result.is_err() {
        table.deactivate_all();
    }
    result
}

/// Apply the init-time patches, install the hooks and publish the context.
///
/// # Safety
/// `layout` must describe the executable this DLL is loaded into.
pub unsafe fn install(settings: GraphicsSettings, layout: GameLayout, platform: Platform) -> Result<&'static ModContext> {
    if CONTEXT.get().is_some() {
        return Err(Error::AlreadyInitialised);
    }
    settings.validate()?;

    let Platform { backend, window, memory } = platform;
    let mut table: Table = HookTable::new(backend);

    let hooks = match patches::apply_all(&*memory, &layout, &settings)
        .and_then(|()| create_hooks(&mut table, &layout))
    {
        Ok(h) => h,
        Err(e) => {
            table.release_all();
            return Err(e);
        }
    };

    let ctx = ModContext {
        camera: CameraInterceptor::new(
            AspectCorrector::new(settings.aspect_ratio_limit as f32),
            layout.camera,
        ),
        resize: ResizeBridge::new(layout.resolution_x, layout.resolution_y),
        settings,
        layout,
        window,
        memory,
        hooks,
        table: Mutex::new(table),
    };
    if let Err(ctx) = CONTEXT.set(ctx) {
        ctx.table().release_all();
        return Err(Error::AlreadyInitialised);
    }
    let ctx = CONTEXT.get().ok_or(Error::AlreadyInitialised)?;

    activate_all(&mut ctx.table(), &ctx.hooks)?;
    for (name, address) in ctx.layout.hook_targets() {
        log::info!("{} hooked at {:08X}", name, address);
    }
    Ok(ctx)
}

/// Undo everything `install` switched on. Safe to call if install failed or
/// never ran.
pub unsafe fn shutdown() {
    if let Some(ctx) = CONTEXT.get() {
        ctx.window.unwatch_location_changes();
        ctx.table().release_all();
        log::info!("hooks removed");
    }
}
