// patches.rs — One-shot memory writes applied before any hook is installed.

use crate::config::GraphicsSettings;
use crate::error::Result;
use crate::layout::{GameLayout, PresetTable};
use crate::memory::Memory;

/// Style the executable creates its window with (WS_CAPTION | WS_SYSMENU).
pub const STOCK_WINDOW_STYLE: u32 = 0x00C8_0000;

const WS_POPUP:       u32 = 0x8000_0000;
const WS_CAPTION:     u32 = 0x00C0_0000;
const WS_SYSMENU:     u32 = 0x0008_0000;
const WS_THICKFRAME:  u32 = 0x0004_0000;
const WS_MAXIMIZEBOX: u32 = 0x0001_0000;

/// Title card duration large enough that the intro is over on the first frame.
const SKIP_INTRO_TIMER: f64 = 9_999_999_999.0;

pub fn set_borderless(style: u32) -> u32 {
    (style & !(WS_CAPTION | WS_SYSMENU)) | WS_POPUP
}

pub fn set_resizable(style: u32) -> u32 {
    style | WS_THICKFRAME | WS_MAXIMIZEBOX
}

pub fn window_style(settings: &GraphicsSettings) -> u32 {
    let mut style = STOCK_WINDOW_STYLE;
    if settings.borderless {
        style = set_borderless(style);
    }
    if settings.resizable {
        style = set_resizable(style);
    }
    style
}

/// Overwrite every built-in resolution preset with the configured one, so
/// whatever the game picks matches the corrected aspect ratio.
pub fn patch_resolution_presets(memory: &dyn Memory, presets: PresetTable, width: i32, height: i32) -> Result<()> {
    for i in 0..presets.count {
        let entry = presets.address + i * presets.stride;
        memory.write_i32(entry, width)?;
        memory.write_i32(entry + 4, height)?;
    }
    Ok(())
}

pub fn patch_window_style(memory: &dyn Memory, layout: &GameLayout, style: u32) -> Result<()> {
    memory.write_u32(layout.window_style_a, style)?;
    memory.write_u32(layout.window_style_b, style)
}

pub fn skip_intro(memory: &dyn Memory, layout: &GameLayout) -> Result<()> {
    memory.write_f64(layout.intro_timer, SKIP_INTRO_TIMER)
}

pub fn apply_all(memory: &dyn Memory, layout: &GameLayout, settings: &GraphicsSettings) -> Result<()> {
    // validate() keeps both dimensions within i32.
    patch_resolution_presets(memory, layout.resolution_presets, settings.width as i32, settings.height as i32)?;

    let style = window_style(settings);
    patch_window_style(memory, layout, style)?;
    log::info!(
        "patched {} resolution presets to {}x{}, window style {:08X}",
        layout.resolution_presets.count, settings.width, settings.height, style
    );

    if settings.skip_intro {
        skip_intro(memory, layout)?;
        log::info!("intro skipped");
    }
    Ok(())
}
