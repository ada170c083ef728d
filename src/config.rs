// config.rs — User graphics settings, stored as TOML next to the DLL.
//
// Read once during init and never touched again; the camera hooks only see
// the aspect ratio limit through `AspectCorrector`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const FILE_NAME: &str = "heroes_widescreen.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    /// Resolution written over every built-in preset.
    pub width: u32,
    pub height: u32,
    /// At or above this ratio the horizontal axis is widened; below it the
    /// vertical axis is narrowed.
    pub aspect_ratio_limit: f64,
    pub fullscreen: bool,
    pub borderless: bool,
    pub resizable: bool,
    /// Make the title card elapse immediately.
    pub skip_intro: bool,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            aspect_ratio_limit: 1.6,
            fullscreen: false,
            borderless: false,
            resizable: true,
            skip_intro: false,
        }
    }
}

impl GraphicsSettings {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidSettings(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(Error::InvalidSettings("resolution out of range".into()));
        }
        if !self.aspect_ratio_limit.is_finite() || self.aspect_ratio_limit <= 0.0 {
            return Err(Error::InvalidSettings(format!(
                "aspect_ratio_limit must be a positive number, got {}",
                self.aspect_ratio_limit
            )));
        }
        Ok(())
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let settings: Self = toml::from_str(text)
            .map_err(|source| Error::ConfigParse { path: path.to_path_buf(), source })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .map_err(|source| Error::ConfigIo { path: path.to_path_buf(), source })
    }

    /// Load the settings file, creating it with defaults if it is missing.
    /// An existing file is written back so newly added keys show up in it.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let settings = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no settings at {}, writing defaults", path.display());
                Self::default()
            }
            Err(source) => return Err(Error::ConfigIo { path: path.to_path_buf(), source }),
        };

        if let Err(e) = settings.save(path) {
            log::warn!("{}", e);
        }
        Ok(settings)
    }
}
