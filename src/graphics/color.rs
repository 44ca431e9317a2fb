// ── Pen ───────────────────────────────────────────────────────────────────────

/// Drawing colour.
///
/// On paletted (`P`) surfaces the palette index travels in `a`, so a pen made
/// with [`Pen::index`] draws that palette entry.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pen {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pen {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Palette index pen for `P` surfaces (and mask value for `M` surfaces).
    pub const fn index(i: u8) -> Self {
        Self { r: 0, g: 0, b: 0, a: i }
    }

    /// Build from unit floats, as used by the HSV conversion.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
            a: (a * 255.0) as u8,
        }
    }

    /// Colour from hue, saturation and value, each in `0.0..=1.0`.
    pub fn hsv(h: f32, s: f32, v: f32) -> Self {
        hsv_to_rgba(h, s, v)
    }
}

/// Convert HSV (all components `0.0..=1.0`) to an opaque pen.
pub fn hsv_to_rgba(h: f32, s: f32, v: f32) -> Pen {
    let i = (h * 6.0) as i32;
    let f = h * 6.0 - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match i.rem_euclid(6) {
        0 => Pen::from_f32(v, t, p, 1.0),
        1 => Pen::from_f32(q, v, p, 1.0),
        2 => Pen::from_f32(p, v, t, 1.0),
        3 => Pen::from_f32(p, q, v, 1.0),
        4 => Pen::from_f32(t, p, v, 1.0),
        _ => Pen::from_f32(v, p, q, 1.0),
    }
}

// ── PixelFormat ───────────────────────────────────────────────────────────────

/// In-memory layout of a surface's pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum PixelFormat {
    /// 8-bit red, green, blue.
    Rgb = 0,
    /// 8-bit red, green, blue, alpha.
    Rgba = 1,
    /// 8-bit index into an attached palette.
    P = 2,
    /// 8-bit single channel mask.
    M = 3,
    /// 16-bit packed 5:6:5.
    Rgb565 = 4,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const fn stride(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
            PixelFormat::P | PixelFormat::M => 1,
            PixelFormat::Rgb565 => 2,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(PixelFormat::Rgb),
            1 => Some(PixelFormat::Rgba),
            2 => Some(PixelFormat::P),
            3 => Some(PixelFormat::M),
            4 => Some(PixelFormat::Rgb565),
            _ => None,
        }
    }
}

// ── RGB565 packing ────────────────────────────────────────────────────────────

/// Red in the low five bits, blue in the high five.
#[inline]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (r as u16 >> 3) | ((g as u16 >> 2) << 5) | ((b as u16 >> 3) << 11)
}

/// Inverse of [`pack_rgb565`]; low bits are filled by replicating the high bits
/// so full intensity maps back to 255.
#[inline]
pub fn unpack_rgb565(c: u16) -> (u8, u8, u8) {
    let r = (c & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = ((c >> 11) & 0x1f) as u8;
    ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgba(0.0, 1.0, 1.0), Pen::rgb(255, 0, 0));
        assert_eq!(hsv_to_rgba(1.0 / 3.0, 1.0, 1.0).g, 255);
        assert_eq!(hsv_to_rgba(2.0 / 3.0, 1.0, 1.0).b, 255);
        // Zero saturation is grey regardless of hue.
        let grey = hsv_to_rgba(0.4, 0.0, 0.5);
        assert_eq!(grey.r, grey.g);
        assert_eq!(grey.g, grey.b);
    }

    #[test]
    fn rgb565_extremes_round_trip() {
        assert_eq!(unpack_rgb565(pack_rgb565(255, 255, 255)), (255, 255, 255));
        assert_eq!(unpack_rgb565(pack_rgb565(0, 0, 0)), (0, 0, 0));
        assert_eq!(pack_rgb565(255, 0, 0), 0x001f);
        assert_eq!(pack_rgb565(0, 0, 255), 0xf800);
    }

    #[test]
    fn strides() {
        assert_eq!(PixelFormat::Rgb.stride(), 3);
        assert_eq!(PixelFormat::Rgba.stride(), 4);
        assert_eq!(PixelFormat::Rgb565.stride(), 2);
        assert_eq!(PixelFormat::from_u8(5), None);
    }
}
