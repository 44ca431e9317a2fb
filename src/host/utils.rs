// ── Letterbox viewport math ───────────────────────────────────────────────────
//
// Largest uniformly scaled rectangle of the logical screen that fits inside
// the physical window, centred on both axes.

use super::config::WindowConfig;

/// Rectangle in physical pixels, ready for a GPU viewport call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };
}

/// ```text
/// scale = min(physical_width / logical_width, physical_height / logical_height)
/// x     = (physical_width  - logical_width  * scale) / 2
/// y     = (physical_height - logical_height * scale) / 2
/// ```
///
/// With `integer` the scale is floored to a whole number (at least 1 when the
/// window is big enough) so every screen pixel covers the same block.
pub fn letterbox_viewport(config: &WindowConfig, integer: bool) -> Viewport {
    if config.logical_width == 0 || config.logical_height == 0 {
        return Viewport::ZERO;
    }

    let pw = config.physical_width as f32;
    let ph = config.physical_height as f32;
    let lw = config.logical_width as f32;
    let lh = config.logical_height as f32;

    let mut scale = (pw / lw).min(ph / lh);
    if integer && scale >= 1.0 {
        scale = scale.floor();
    }

    let width = lw * scale;
    let height = lh * scale;
    Viewport { x: (pw - width) / 2.0, y: (ph - height) / 2.0, width, height }
}

/// Map a window position to screen-surface coordinates, or `None` when it is
/// in the bars.
pub fn window_to_screen(config: &WindowConfig, viewport: &Viewport, x: f32, y: f32) -> Option<(f32, f32)> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }
    let u = (x - viewport.x) / viewport.width;
    let v = (y - viewport.y) / viewport.height;
    if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
        return None;
    }
    Some((u * config.logical_width as f32, v * config.logical_height as f32))
}
