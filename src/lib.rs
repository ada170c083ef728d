// lib.rs — DLL entry point for the Sonic Heroes widescreen fix.
//
// The game's RenderWare camera is hard-wired for 4:3. When this DLL is loaded
// into Tsonic_win.exe, DllMain fires with DLL_PROCESS_ATTACH and:
//   1. Opens the log and loads heroes_widescreen.toml (both next to the DLL)
//   2. Patches the resolution presets and window style
//   3. Hooks RwCameraSetViewWindow, CameraBuildPerspClipPlanes and the ini
//      reader, so every frame's projection is corrected for the live window
// DLL_PROCESS_DETACH removes the hooks again.
//
// Must be compiled as a 32-bit cdylib (i686-pc-windows-msvc). The platform
// independent parts also build on other targets so they can be tested.

#![allow(non_snake_case)]

// Compile-time guard: the hooked addresses only exist in the 32-bit executable
#[cfg(all(windows, not(target_arch = "x86")))]
compile_error!("Build with i686-pc-windows-msvc (32-bit x86).");

pub mod aspect;   // Axis-selection scaling law
pub mod camera;   // RwCamera field access
pub mod config;   // GraphicsSettings (TOML)
pub mod context;  // Owned mod state + detours + install/shutdown
pub mod error;    // Error type
pub mod hook;     // Function hook lifecycle (MinHook)
pub mod intercept; // Camera hook bodies
pub mod layout;   // Addresses and offsets for the supported executable
pub mod logging;  // File logger
pub mod math;     // Vec2
pub mod memory;   // Protection-aware memory writes
pub mod patches;  // One-shot init patches
pub mod resize;   // Window resize -> engine resolution cells
pub mod window;   // Live client area of the game window

pub use error::{Error, Result};

#[cfg(windows)]
mod dll {
    use crate::config::{self, GraphicsSettings};
    use crate::context::{self, Platform};
    use crate::hook::MinHook;
    use crate::layout::GameLayout;
    use crate::memory::ProcessMemory;
    use crate::window::Win32Window;
    use crate::{logging, Result};
    use std::path::{Path, PathBuf};
    use winapi::shared::minwindef::{BOOL, DWORD, HINSTANCE, LPVOID, TRUE};
    use winapi::um::libloaderapi::{DisableThreadLibraryCalls, GetModuleFileNameA};
    use winapi::um::winnt::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};

    /// Directory containing this DLL (settings and log live there).
    unsafe fn dll_dir(hinst: HINSTANCE) -> PathBuf {
        let mut buf = [0u8; 512];
        let len = GetModuleFileNameA(hinst, buf.as_mut_ptr() as _, buf.len() as u32) as usize;
        if len > 0 {
            if let Ok(s) = std::str::from_utf8(&buf[..len]) {
                if let Some(dir) = Path::new(s).parent() {
                    return dir.to_path_buf();
                }
            }
        }
        PathBuf::from(".")
    }

    unsafe fn init(dir: &Path) -> Result<()> {
        let settings = GraphicsSettings::load_or_create(&dir.join(config::FILE_NAME))?;
        log::info!("settings: {:?}", settings);

        let platform = Platform {
            backend: Box::new(MinHook::new()?),
            window: Box::new(Win32Window::new()),
            memory: Box::new(ProcessMemory),
        };
        context::install(settings, GameLayout::SONIC_HEROES, platform)?;
        Ok(())
    }

    /// DLL entry point — called by Windows when the DLL is loaded/unloaded.
    #[no_mangle]
    pub unsafe extern "system" fn DllMain(
        hinst: HINSTANCE,
        reason: DWORD,
        _reserved: LPVOID,
    ) -> BOOL {
        match reason {
            DLL_PROCESS_ATTACH => {
                // Prevent DLL_THREAD_ATTACH/DETACH notifications (we don't need them)
                DisableThreadLibraryCalls(hinst);

                // Hooks go in synchronously: the engine reads its ini and
                // builds its first camera right after the loader returns.
                let dir = dll_dir(hinst);
                logging::init(&dir);
                log::info!("DLL attached");
                match init(&dir) {
                    Ok(()) => log::info!("widescreen fix active"),
                    Err(e) => {
                        log::error!("init failed, running unmodified: {}", e);
                        context::shutdown();
                    }
                }
            }
            DLL_PROCESS_DETACH => {
                context::shutdown();
                log::logger().flush();
            }
            _ => {}
        }
        TRUE
    }
}
