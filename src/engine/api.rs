// =============================================================================
// API.RS — screen modes, device ids and launch checks
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::fs::{File, Filesystem, OpenMode};
use crate::graphics::PixelFormat;
use crate::types::Size;

// ── Screen modes ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenMode {
    #[default]
    Lores,
    Hires,
    HiresPalette,
}

impl ScreenMode {
    pub fn size(self) -> Size {
        match self {
            ScreenMode::Lores => Size::new(160, 120),
            ScreenMode::Hires | ScreenMode::HiresPalette => Size::new(320, 240),
        }
    }

    pub fn format(self) -> PixelFormat {
        match self {
            ScreenMode::Lores | ScreenMode::Hires => PixelFormat::Rgb,
            ScreenMode::HiresPalette => PixelFormat::P,
        }
    }
}

// ── Devices ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BlitDevice {
    Stm32H7_32BlitOld = 0,
    Stm32H7_32Blit = 1,
    Rp2040 = 2,
    Rp2350 = 3,
    Host = 0xff,
}

// ── Launch checks ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanLaunchResult {
    Success,
    /// No handler for this file type.
    UnknownType,
    /// Missing or unreadable file.
    InvalidFile,
    /// A game, but built for another device.
    IncompatibleBlit,
}

pub const BLIT_MAGIC: u32 = 0x5449_4C42;
pub const BLIT_HEADER_LEN: usize = 28;
const DEVICE_ID_OFFSET: usize = 20;

/// File extensions (lower case, no dot) that some launcher can open.
#[derive(Clone, Debug, Default)]
pub struct TypeHandlers {
    extensions: Vec<String>,
}

impl TypeHandlers {
    pub fn register_type_handler(&mut self, extension: &str) {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
    }

    pub fn handles(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }
}

fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, e)| e).unwrap_or("")
}

/// Whether `path` could be launched on `device`.
pub fn can_launch(fs: &Filesystem, path: &str, device: BlitDevice, handlers: &TypeHandlers) -> CanLaunchResult {
    let ext = extension_of(path);

    if ext.eq_ignore_ascii_case("blit") {
        let Ok(file) = File::open(fs, path, OpenMode::READ) else {
            return CanLaunchResult::InvalidFile;
        };
        let mut header = [0u8; BLIT_HEADER_LEN];
        match file.read(0, &mut header) {
            Ok(n) if n == BLIT_HEADER_LEN => {}
            _ => return CanLaunchResult::InvalidFile,
        }

        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != BLIT_MAGIC || header[DEVICE_ID_OFFSET] != device as u8 {
            return CanLaunchResult::IncompatibleBlit;
        }
        return CanLaunchResult::Success;
    }

    if handlers.handles(ext) {
        return if fs.file_exists(path) { CanLaunchResult::Success } else { CanLaunchResult::InvalidFile };
    }

    CanLaunchResult::UnknownType
}
