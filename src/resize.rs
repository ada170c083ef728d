// resize.rs — Keeps the engine's "current resolution" cells in step with the
// real client area after the window is resized.
//
// The engine reads its resolution from two fixed i32 cells once at startup.
// When the window style patch makes the window resizable, nothing updates
// those cells, so the bridge listens for location/shape changes of the game
// window and writes the new client size into them.
//
// The listener is registered lazily from the first RwCameraSetViewWindow call:
// the window does not exist yet when the DLL is initialised.

use crate::error::Result;
use crate::memory::Memory;
use crate::window::{ClientSize, GameWindow};
use std::sync::atomic::{AtomicBool, Ordering};

pub const EVENT_OBJECT_LOCATIONCHANGE: u32 = 0x800B;
pub const OBJID_WINDOW: i32 = 0;
pub const CHILDID_SELF: i32 = 0;

/// One WinEvent notification, stripped to the fields the bridge looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowEvent {
    pub event: u32,
    pub hwnd: usize,
    pub id_object: i32,
    pub id_child: i32,
}

impl WindowEvent {
    /// A change to the window itself, not to a control inside it.
    pub fn is_top_level_location_change(&self) -> bool {
        self.event == EVENT_OBJECT_LOCATIONCHANGE
            && self.id_object == OBJID_WINDOW
            && self.id_child == CHILDID_SELF
    }
}

pub struct ResizeBridge {
    installed: AtomicBool,
    resolution_x: usize,
    resolution_y: usize,
}

impl ResizeBridge {
    pub const fn new(resolution_x: usize, resolution_y: usize) -> Self {
        Self { installed: AtomicBool::new(false), resolution_x, resolution_y }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Register the listener on the first call only. A failed registration is
    /// logged and not retried; the mod keeps correcting with the launch size.
    pub fn ensure_installed(&self, window: &dyn GameWindow) -> bool {
        if self.installed.swap(true, Ordering::AcqRel) {
            return false;
        }
        match window.watch_location_changes() {
            Ok(()) => log::info!("resize listener installed"),
            Err(e) => log::warn!("resize listener not installed: {}", e),
        }
        true
    }

    /// Handle one event. Returns the size written, if any.
    pub fn on_event(
        &self,
        event: WindowEvent,
        window: &dyn GameWindow,
        memory: &dyn Memory,
    ) -> Result<Option<ClientSize>> {
        if !event.is_top_level_location_change() || !window.is_game_window(event.hwnd) {
            return Ok(None);
        }

        let size = window.client_size()?;
        // Minimised: keep the last real resolution.
        if size.width <= 0 || size.height <= 0 {
            return Ok(None);
        }

        memory.write_i32(self.resolution_x, size.width)?;
        memory.write_i32(self.resolution_y, size.height)?;
        log::debug!("resolution now {}x{}", size.width, size.height);
        Ok(Some(size))
    }
}

/// WinEvent callback registered by `Win32Window::watch_location_changes`.
#[cfg(windows)]
pub unsafe extern "system" fn on_win_event(
    _hook: winapi::shared::windef::HWINEVENTHOOK,
    event: u32,
    hwnd: winapi::shared::windef::HWND,
    id_object: i32,
    id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if let Some(ctx) = crate::context::get() {
        ctx.on_window_event(WindowEvent { event, hwnd: hwnd as usize, id_object, id_child });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::memory::fake::FakeMemory;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    const HWND: usize = 0x1234;
    const RES_X: usize = 0x00A7_793C;
    const RES_Y: usize = 0x00A7_7940;

    struct ResizableWindow {
        size: Mutex<ClientSize>,
        watches: AtomicU32,
        fail_watch: bool,
    }

    impl ResizableWindow {
        fn new(width: i32, height: i32) -> Self {
            Self {
                size: Mutex::new(ClientSize { width, height }),
                watches: AtomicU32::new(0),
                fail_watch: false,
            }
        }

        fn resize(&self, width: i32, height: i32) {
            *self.size.lock().unwrap() = ClientSize { width, height };
        }
    }

    impl GameWindow for ResizableWindow {
        fn client_size(&self) -> Result<ClientSize> {
            Ok(*self.size.lock().unwrap())
        }
        fn is_game_window(&self, hwnd: usize) -> bool {
            hwnd == HWND
        }
        fn watch_location_changes(&self) -> Result<()> {
            self.watches.fetch_add(1, Ordering::SeqCst);
            if self.fail_watch { Err(Error::WinEventHook) } else { Ok(()) }
        }
    }

    fn location_change(hwnd: usize) -> WindowEvent {
        WindowEvent { event: EVENT_OBJECT_LOCATIONCHANGE, hwnd, id_object: OBJID_WINDOW, id_child: CHILDID_SELF }
    }

    fn resolution(mem: &FakeMemory) -> (i32, i32) {
        (mem.read_i32(RES_X).unwrap(), mem.read_i32(RES_Y).unwrap())
    }

    #[test]
    fn resize_is_published_to_resolution_cells() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let window = ResizableWindow::new(1024, 768);
        let mem = FakeMemory::default();

        window.resize(1920, 1080);
        let written = bridge.on_event(location_change(HWND), &window, &mem).unwrap();

        assert_eq!(written, Some(ClientSize { width: 1920, height: 1080 }));
        assert_eq!(resolution(&mem), (1920, 1080));
        let ratio = ClientSize { width: resolution(&mem).0, height: resolution(&mem).1 }
            .aspect_ratio()
            .unwrap();
        assert!((ratio - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn child_object_events_are_ignored() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let window = ResizableWindow::new(1920, 1080);
        let mem = FakeMemory::default();

        let mut ev = location_change(HWND);
        ev.id_object = -4; // OBJID_CLIENT
        assert_eq!(bridge.on_event(ev, &window, &mem).unwrap(), None);

        let mut ev = location_change(HWND);
        ev.id_child = 3;
        assert_eq!(bridge.on_event(ev, &window, &mem).unwrap(), None);

        let mut ev = location_change(HWND);
        ev.event = 0x800C; // EVENT_OBJECT_NAMECHANGE
        assert_eq!(bridge.on_event(ev, &window, &mem).unwrap(), None);

        assert!(mem.read_i32(RES_X).is_err());
    }

    #[test]
    fn other_windows_are_ignored() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let window = ResizableWindow::new(1920, 1080);
        let mem = FakeMemory::default();

        assert_eq!(bridge.on_event(location_change(0x9999), &window, &mem).unwrap(), None);
        assert!(mem.read_i32(RES_X).is_err());
    }

    #[test]
    fn minimised_window_keeps_last_resolution() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let window = ResizableWindow::new(1600, 900);
        let mem = FakeMemory::default();

        bridge.on_event(location_change(HWND), &window, &mem).unwrap();
        window.resize(0, 0);
        assert_eq!(bridge.on_event(location_change(HWND), &window, &mem).unwrap(), None);
        assert_eq!(resolution(&mem), (1600, 900));
    }

    #[test]
    fn listener_is_installed_at_most_once() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let window = ResizableWindow::new(1280, 720);

        assert!(!bridge.is_installed());
        assert!(bridge.ensure_installed(&window));
        assert!(!bridge.ensure_installed(&window));
        assert!(!bridge.ensure_installed(&window));
        assert!(bridge.is_installed());
        assert_eq!(window.watches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_registration_is_not_retried() {
        let bridge = ResizeBridge::new(RES_X, RES_Y);
        let mut window = ResizableWindow::new(1280, 720);
        window.fail_watch = true;

        assert!(bridge.ensure_installed(&window));
        assert!(!bridge.ensure_installed(&window));
        assert_eq!(window.watches.load(Ordering::SeqCst), 1);
    }
}
