// error.rs — Crate-wide error type.
//
// Init-time failures (hooks, patches, config) are propagated with `?` up to
// `init()`. Per-call faults inside the camera detours use the same type but
// never leave the detour: the detour falls back to the original routine.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MinHook initialisation failed (status {0})")]
    HookInit(i32),

    #[error("failed to create hook at {address:#010X} (status {status})")]
    HookCreate { address: usize, status: i32 },

    #[error("failed to enable hook at {address:#010X} (status {status})")]
    HookEnable { address: usize, status: i32 },

    #[error("failed to disable hook at {address:#010X} (status {status})")]
    HookDisable { address: usize, status: i32 },

    #[error("failed to remove hook at {address:#010X} (status {status})")]
    HookRemove { address: usize, status: i32 },

    #[error("a hook already exists at {0:#010X}")]
    DuplicateHook(usize),

    #[error("hook at {address:#010X} is {actual:?}, expected {expected:?}")]
    HookState {
        address: usize,
        expected: crate::hook::HookState,
        actual: crate::hook::HookState,
    },

    #[error("detour for {0:#010X} is not a plain function pointer")]
    NotAFunctionPointer(usize),

    #[error("could not change protection of {len} bytes at {address:#010X}")]
    Protect { address: usize, len: usize },

    #[error("no mapped memory at {address:#010X} ({len} bytes)")]
    Unmapped { address: usize, len: usize },

    #[error("client area is degenerate ({width}x{height})")]
    DegenerateWindow { width: i32, height: i32 },

    #[error("game window not found")]
    WindowNotFound,

    #[error("camera pointer is null")]
    NullCamera,

    #[error("camera view window is not finite ({x}, {y})")]
    NonFiniteViewWindow { x: f32, y: f32 },

    #[error("could not register window event hook")]
    WinEventHook,

    #[error("mod context is already initialised")]
    AlreadyInitialised,

    #[error("io error on {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialise settings: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_failures_name_the_step() {
        let disable = Error::HookDisable { address: 0x0064AC80, status: 5 }.to_string();
        let remove = Error::HookRemove { address: 0x0064AC80, status: 5 }.to_string();
        assert_eq!(disable, "failed to disable hook at 0x0064AC80 (status 5)");
        assert_eq!(remove, "failed to remove hook at 0x0064AC80 (status 5)");
    }
}
