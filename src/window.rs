// window.rs — Live window geometry.
//
// The aspect ratio is read from the game window's client area on every
// interception; nothing about the window is cached except its handle.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Client-area size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientSize {
    pub width: i32,
    pub height: i32,
}

impl ClientSize {
    /// width / height. A minimised window reports a zero-height client area;
    /// that is an error rather than an infinite ratio.
    pub fn aspect_ratio(self) -> Result<f32> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::DegenerateWindow { width: self.width, height: self.height });
        }
        Ok(self.width as f32 / self.height as f32)
    }
}

/// The game's top-level window, as seen by the interception code.
pub trait GameWindow: Send + Sync {
    /// Current client-area size.
    fn client_size(&self) -> Result<ClientSize>;

    /// Whether a raw window handle from an OS event is the game window.
    fn is_game_window(&self, hwnd: usize) -> bool;

    /// Start delivering location/shape change events to the resize bridge.
    fn watch_location_changes(&self) -> Result<()>;

    /// Stop delivering events. Called once at shutdown.
    fn unwatch_location_changes(&self) {}
}

/// The game window's handle, remembered once found and dropped again when
/// the OS stops recognising it.
pub struct HandleCache(AtomicUsize);

impl HandleCache {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn get_or_find(&self, find: impl FnOnce() -> Option<usize>) -> Result<usize> {
        let cached = self.0.load(Ordering::Acquire);
        if cached != 0 {
            return Ok(cached);
        }
        let found = find().filter(|&h| h != 0).ok_or(Error::WindowNotFound)?;
        self.0.store(found, Ordering::Release);
        log::info!("game window found: {:08X}", found);
        Ok(found)
    }

    /// Forget `hwnd` if it is still the cached handle.
    pub fn forget(&self, hwnd: usize) {
        if hwnd != 0 && self.0.compare_exchange(hwnd, 0, Ordering::AcqRel, Ordering::Acquire).is_ok() {
            log::info!("game window {:08X} is gone, searching again", hwnd);
        }
    }

    pub fn matches(&self, hwnd: usize) -> bool {
        hwnd != 0 && hwnd == self.0.load(Ordering::Acquire)
    }
}

#[cfg(windows)]
pub use self::win32::Win32Window;

#[cfg(windows)]
mod win32 {
    use super::{ClientSize, GameWindow, HandleCache};
    use crate::error::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPARAM, TRUE};
    use winapi::shared::windef::{HWND, RECT};
    use winapi::um::processthreadsapi::GetCurrentProcessId;
    use winapi::um::winuser::{
        EnumWindows, GetClientRect, GetWindow, GetWindowThreadProcessId, IsWindowVisible,
        SetWinEventHook, UnhookWinEvent, EVENT_OBJECT_LOCATIONCHANGE, GW_OWNER,
        WINEVENT_OUTOFCONTEXT,
    };

    /// The current process's main window, found lazily and then remembered.
    pub struct Win32Window {
        hwnd: HandleCache,
        event_hook: AtomicUsize,
    }

    impl Win32Window {
        pub const fn new() -> Self {
            Self { hwnd: HandleCache::new(), event_hook: AtomicUsize::new(0) }
        }

        fn handle(&self) -> Result<HWND> {
            let hwnd = self.hwnd.get_or_find(|| unsafe { find_main_window() }.map(|h| h as usize))?;
            Ok(hwnd as HWND)
        }
    }

    impl GameWindow for Win32Window {
        fn client_size(&self) -> Result<ClientSize> {
            let hwnd = self.handle()?;
            let mut rc: RECT = unsafe { std::mem::zeroed() };
            if unsafe { GetClientRect(hwnd, &mut rc) } == 0 {
                // Window was destroyed or recreated
                self.hwnd.forget(hwnd as usize);
                return Err(Error::WindowNotFound);
            }
            Ok(ClientSize { width: rc.right - rc.left, height: rc.bottom - rc.top })
        }

        fn is_game_window(&self, hwnd: usize) -> bool {
            self.hwnd.matches(hwnd)
        }

        fn watch_location_changes(&self) -> Result<()> {
            // Resolve the handle now so events can be matched against it.
            self.handle()?;
            let hook = unsafe {
                SetWinEventHook(
                    EVENT_OBJECT_LOCATIONCHANGE, // Minimum event code
                    EVENT_OBJECT_LOCATIONCHANGE, // Maximum event code
                    std::ptr::null_mut(),        // No DLL: out-of-context callback
                    Some(crate::resize::on_win_event),
                    0, // All processes
                    0, // All threads
                    WINEVENT_OUTOFCONTEXT,
                )
            };
            if hook.is_null() {
                return Err(Error::WinEventHook);
            }
            self.event_hook.store(hook as usize, Ordering::Release);
            Ok(())
        }

        fn unwatch_location_changes(&self) {
            let hook = self.event_hook.swap(0, Ordering::AcqRel);
            if hook != 0 {
                unsafe { UnhookWinEvent(hook as _) };
            }
        }
    }

    struct Search {
        pid: DWORD,
        found: HWND,
    }

    unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = &mut *(lparam as *mut Search);
        let mut pid: DWORD = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);
        if pid != search.pid || IsWindowVisible(hwnd) == 0 || !GetWindow(hwnd, GW_OWNER).is_null() {
            return TRUE; // Keep enumerating
        }
        search.found = hwnd;
        FALSE
    }

    /// First visible, unowned top-level window of this process.
    unsafe fn find_main_window() -> Option<HWND> {
        let mut search = Search { pid: GetCurrentProcessId(), found: std::ptr::null_mut() };
        EnumWindows(Some(enum_proc), &mut search as *mut Search as LPARAM);
        if search.found.is_null() { None } else { Some(search.found) }
    }
}
