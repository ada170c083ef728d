// logging.rs — File logger next to the DLL.
//
// The game has no console, so everything goes to heroes_widescreen.log in
// the mod's directory. The file is truncated on every launch.

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "heroes_widescreen.log";

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(FILE_NAME)
}

/// Install the global logger. Later calls (and a file that cannot be created)
/// leave logging as it was.
pub fn init(dir: &Path) {
    let Ok(file) = File::create(log_path(dir)) else { return };

    let level = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = WriteLogger::init(level, config, file);
}
