use std::fmt;
use std::sync::Arc;

use super::blend::{BlitBlendFn, PenBlendFn, blend_functions};
use super::color::{Pen, PixelFormat};
use crate::types::{Point, Rect, Size};

/// 256-entry colour table attached to paletted surfaces.
pub type Palette = [Pen; 256];

/// Build a palette from a slice, padding the remainder with transparent black.
pub fn palette_from_slice(colours: &[Pen]) -> Box<Palette> {
    let mut palette = Box::new([Pen::TRANSPARENT; 256]);
    for (dst, src) in palette.iter_mut().zip(colours) {
        *dst = *src;
    }
    palette
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// A block of pixels plus the state used to draw into it.
///
/// All drawing is clipped to `clip`, which is always contained in `bounds`.
#[derive(Clone)]
pub struct Surface {
    pub data: Vec<u8>,
    pub bounds: Size,
    pub clip: Rect,
    /// Global alpha applied to every drawing operation.
    pub alpha: u8,
    pub pen: Pen,
    pub format: PixelFormat,
    pub pixel_stride: usize,
    pub row_stride: usize,
    /// Optional per-pixel `M` surface, same size as this one.
    pub mask: Option<Box<Surface>>,
    pub palette: Option<Box<Palette>>,
    /// Palette index that blits and pens skip.
    pub transparent_index: Option<u8>,
    /// Active spritesheet for the `sprite` helpers.
    pub sprites: Option<Arc<Surface>>,
    /// Spritesheet size in 8×8 cells.
    pub rows: i32,
    pub cols: i32,
    pub pbf: PenBlendFn,
    pub bbf: BlitBlendFn,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("format", &self.format)
            .field("bounds", &self.bounds)
            .field("clip", &self.clip)
            .field("alpha", &self.alpha)
            .field("pen", &self.pen)
            .field("has_mask", &self.mask.is_some())
            .field("has_palette", &self.palette.is_some())
            .finish()
    }
}

impl Surface {
    /// Zero-filled surface.
    pub fn new(format: PixelFormat, bounds: Size) -> Self {
        let len = bounds.w.max(0) as usize * bounds.h.max(0) as usize * format.stride();
        Self::with_data(vec![0; len], format, bounds)
    }

    /// Wrap an existing pixel buffer. Returns `None` when its length does not
    /// match `bounds` and `format`.
    pub fn from_data(data: Vec<u8>, format: PixelFormat, bounds: Size) -> Option<Self> {
        let expected = bounds.w.max(0) as usize * bounds.h.max(0) as usize * format.stride();
        (data.len() == expected).then(|| Self::with_data(data, format, bounds))
    }

    fn with_data(data: Vec<u8>, format: PixelFormat, bounds: Size) -> Self {
        let (pbf, bbf) = blend_functions(format);
        let pixel_stride = format.stride();
        Self {
            data,
            bounds,
            clip: Rect::from(bounds),
            alpha: 255,
            pen: Pen::default(),
            format,
            pixel_stride,
            row_stride: pixel_stride * bounds.w.max(0) as usize,
            mask: None,
            palette: None,
            transparent_index: None,
            sprites: None,
            rows: bounds.h / 8,
            cols: bounds.w / 8,
            pbf,
            bbf,
        }
    }

    // ── Drawing state ─────────────────────────────────────────────────────────

    pub fn set_pen(&mut self, pen: Pen) {
        self.pen = pen;
    }

    /// Restrict drawing to `r`, clamped to the surface bounds.
    pub fn set_clip(&mut self, r: Rect) {
        self.clip = r.intersection(&Rect::from(self.bounds));
    }

    pub fn reset_clip(&mut self) {
        self.clip = Rect::from(self.bounds);
    }

    pub fn set_palette(&mut self, colours: &[Pen]) {
        self.palette = Some(palette_from_slice(colours));
    }

    /// Attach a mask; ignored unless it is an `M` surface of the same size.
    pub fn set_mask(&mut self, mask: Option<Surface>) -> bool {
        match mask {
            Some(m) if m.format == PixelFormat::M && m.bounds == self.bounds => {
                self.mask = Some(Box::new(m));
                true
            }
            Some(_) => false,
            None => {
                self.mask = None;
                true
            }
        }
    }

    pub fn set_sprites(&mut self, sprites: Arc<Surface>) {
        self.sprites = Some(sprites);
    }

    // ── Addressing ────────────────────────────────────────────────────────────

    /// Pixel offset (not byte offset) of `(x, y)`.
    #[inline(always)]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        (x + y * self.bounds.w) as usize
    }

    #[inline(always)]
    pub fn offset_of(&self, p: Point) -> usize {
        self.offset(p.x, p.y)
    }

    /// Colour stored at a pixel offset, resolved through the palette.
    pub fn pen_at_offset(&self, off: usize) -> Pen {
        let i = off * self.pixel_stride;
        match self.format {
            PixelFormat::Rgba => {
                let d = &self.data[i..i + 4];
                Pen::rgba(d[0], d[1], d[2], d[3])
            }
            PixelFormat::Rgb => {
                let d = &self.data[i..i + 3];
                Pen::rgb(d[0], d[1], d[2])
            }
            PixelFormat::Rgb565 => {
                let (r, g, b) = super::color::unpack_rgb565(u16::from_le_bytes([
                    self.data[i],
                    self.data[i + 1],
                ]));
                Pen::rgb(r, g, b)
            }
            PixelFormat::P => {
                let idx = self.data[i];
                match &self.palette {
                    Some(palette) if self.transparent_index == Some(idx) => {
                        Pen { a: 0, ..palette[idx as usize] }
                    }
                    Some(palette) => palette[idx as usize],
                    None => Pen::rgb(idx, idx, idx),
                }
            }
            PixelFormat::M => {
                let v = self.data[i];
                Pen::rgba(v, v, v, v)
            }
        }
    }

    /// Colour at `p`, or transparent black outside the bounds.
    pub fn get_pixel(&self, p: Point) -> Pen {
        if !self.bounds.contains(p) {
            return Pen::TRANSPARENT;
        }
        self.pen_at_offset(self.offset_of(p))
    }

    /// Raw palette index at `p` for `P` surfaces.
    pub fn get_index(&self, p: Point) -> Option<u8> {
        (self.format == PixelFormat::P && self.bounds.contains(p))
            .then(|| self.data[self.offset_of(p)])
    }

    /// Run the pen blend function over `count` pixels at `off`.
    #[inline(always)]
    pub(crate) fn pen_span(&mut self, off: usize, count: usize) {
        if count == 0 {
            return;
        }
        let pbf = self.pbf;
        let pen = self.pen;
        pbf(&pen, self, off, count);
    }

    // ── Mipmaps ───────────────────────────────────────────────────────────────

    /// Successively halved RGBA copies of this surface, `depth` levels deep.
    /// Each level averages 2×2 blocks of the previous one.
    pub fn generate_mipmaps(&self, depth: u8) -> Vec<Surface> {
        let mut levels: Vec<Surface> = Vec::with_capacity(depth as usize);
        for _ in 0..depth {
            let src = levels.last().unwrap_or(self);
            let size = src.bounds / 2;
            if size.empty() {
                break;
            }
            let mut dest = Surface::new(PixelFormat::Rgba, size);
            for y in 0..size.h {
                for x in 0..size.w {
                    let samples = [
                        src.get_pixel(Point::new(x * 2, y * 2)),
                        src.get_pixel(Point::new(x * 2 + 1, y * 2)),
                        src.get_pixel(Point::new(x * 2 + 1, y * 2 + 1)),
                        src.get_pixel(Point::new(x * 2, y * 2 + 1)),
                    ];
                    let avg = |f: fn(&Pen) -> u8| {
                        (samples.iter().map(|p| f(p) as u32).sum::<u32>() / 4) as u8
                    };
                    dest.pen = Pen::rgb(avg(|p| p.r), avg(|p| p.g), avg(|p| p.b));
                    dest.pixel(Point::new(x, y));
                }
            }
            levels.push(dest);
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_has_full_clip() {
        let s = Surface::new(PixelFormat::Rgb, Size::new(16, 8));
        assert_eq!(s.data.len(), 16 * 8 * 3);
        assert_eq!(s.clip, Rect::new(0, 0, 16, 8));
        assert_eq!((s.cols, s.rows), (2, 1));
    }

    #[test]
    fn from_data_rejects_wrong_length() {
        assert!(Surface::from_data(vec![0; 10], PixelFormat::Rgba, Size::new(2, 2)).is_none());
        assert!(Surface::from_data(vec![0; 16], PixelFormat::Rgba, Size::new(2, 2)).is_some());
    }

    #[test]
    fn clip_is_clamped_to_bounds() {
        let mut s = Surface::new(PixelFormat::Rgba, Size::new(10, 10));
        s.set_clip(Rect::new(-5, 5, 100, 100));
        assert_eq!(s.clip, Rect::new(0, 5, 10, 5));
    }

    #[test]
    fn mipmaps_halve_each_level() {
        let mut s = Surface::new(PixelFormat::Rgba, Size::new(8, 8));
        s.pen = Pen::rgb(200, 100, 50);
        s.clear();
        let levels = s.generate_mipmaps(3);
        let sizes: Vec<Size> = levels.iter().map(|l| l.bounds).collect();
        assert_eq!(sizes, vec![Size::new(4, 4), Size::new(2, 2), Size::new(1, 1)]);
        assert_eq!(levels[2].get_pixel(Point::ZERO), Pen::rgb(200, 100, 50));
    }
}
