// layout.rs — Every absolute address and struct offset the mod touches.
//
// All of these belong to one exact build of the game executable. Keeping them
// in a single table means pointing the mod at another build is a data change.

/// Byte offsets into RenderWare's `RwCamera` (32-bit layout).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraLayout {
    /// `RwCamera::viewWindow` (RwV2d).
    pub view_window: usize,
    /// `RwCamera::recipViewWindow` (RwV2d).
    pub recip_view_window: usize,
}

/// The built-in resolution list the engine offers in its launcher/options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresetTable {
    pub address: usize,
    pub count: usize,
    /// Size of one {width, height} record.
    pub stride: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameLayout {
    // Hooked routines.
    pub camera_set_view_window: usize,     // RwCameraSetViewWindow
    pub camera_build_persp_clip_planes: usize, // CameraBuildPerspClipPlanes
    pub read_config_from_ini: usize,

    // Data cells.
    pub config_fullscreen: usize,  // i32, written after the ini is read
    pub resolution_x: usize,       // i32, "current" width the engine reads
    pub resolution_y: usize,       // i32, "current" height the engine reads
    pub window_style_a: usize,     // u32 immediate in CreateWindow setup
    pub window_style_b: usize,     // u32 immediate in the window reset path
    pub intro_timer: usize,        // f64, title card duration

    pub resolution_presets: PresetTable,
    pub camera: CameraLayout,
}

impl GameLayout {
    /// Sonic Heroes (PC, US 1.0 executable).
    pub const SONIC_HEROES: GameLayout = GameLayout {
        camera_set_view_window: 0x0064_AC80,
        camera_build_persp_clip_planes: 0x0064_AF80,
        read_config_from_ini: 0x0062_9CE0,

        config_fullscreen: 0x008C_AEDC,
        resolution_x: 0x00A7_793C,
        resolution_y: 0x00A7_7940,
        window_style_a: 0x0044_6D88,
        window_style_b: 0x0044_6DBE,
        intro_timer: 0x0078_A578,

        resolution_presets: PresetTable { address: 0x007C_9290, count: 8, stride: 8 },
        camera: CameraLayout { view_window: 0x68, recip_view_window: 0x70 },
    };

    /// The three routines that get hooked, paired with a name for logging.
    pub fn hook_targets(&self) -> [(&'static str, usize); 3] {
        [
            ("RwCameraSetViewWindow", self.camera_set_view_window),
            ("CameraBuildPerspClipPlanes", self.camera_build_persp_clip_planes),
            ("ReadConfigFromIni", self.read_config_from_ini),
        ]
    }
}
