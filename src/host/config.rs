// =============================================================================
// CONFIG.RS — host settings
// =============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::HostError;
use crate::engine::ScreenMode;

// ── WindowMode ────────────────────────────────────────────────────────────────

/// Controls how the OS window is presented.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Decorated window at `scale` times the screen size.
    #[default]
    Windowed,
    /// Exclusive fullscreen at the closest video mode.
    Fullscreen,
    /// Borderless window covering the current monitor.
    Borderless,
}

// ── WindowConfig ──────────────────────────────────────────────────────────────

/// Physical window size versus the logical screen surface it shows.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub physical_width: u32,
    pub physical_height: u32,
    /// Screen surface width.
    pub logical_width: u32,
    pub logical_height: u32,
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            physical_width: 640,
            physical_height: 480,
            logical_width: 160,
            logical_height: 120,
            mode: WindowMode::Windowed,
        }
    }
}

impl WindowConfig {
    /// Returns `0.0` when `logical_height` is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.logical_height == 0 {
            return 0.0;
        }
        self.logical_width as f32 / self.logical_height as f32
    }
}

// ── HostConfig ────────────────────────────────────────────────────────────────

/// Everything the desktop host reads at startup. Loads from JSON; missing
/// fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub title: String,
    /// Integer window scale over the screen size.
    pub scale: u32,
    pub screen_mode: ScreenMode,
    pub scanlines: bool,
    pub window_mode: WindowMode,
    /// Base directory of the virtual filesystem.
    pub data_dir: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    /// Master volume, 0..=0xffff.
    pub volume: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "blitkit".into(),
            scale: 4,
            screen_mode: ScreenMode::Lores,
            scanlines: false,
            window_mode: WindowMode::Windowed,
            data_dir: None,
            save_dir: None,
            volume: 0xffff,
        }
    }
}

impl HostConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Window size for the configured screen mode and scale. Hires modes
    /// halve the scale so both modes open at the same size.
    pub fn window_config(&self) -> WindowConfig {
        let size = self.screen_mode.size();
        let scale = match self.screen_mode {
            ScreenMode::Lores => self.scale.max(1),
            _ => (self.scale / 2).max(1),
        };
        WindowConfig {
            physical_width: size.w as u32 * scale,
            physical_height: size.h as u32 * scale,
            logical_width: size.w as u32,
            logical_height: size.h as u32,
            mode: self.window_mode,
        }
    }
}
