// =============================================================================
// BLIT.RS — copying pixels between surfaces
// =============================================================================

use std::ops::{BitAnd, BitOr};

use super::color::{Pen, PixelFormat};
use super::surface::Surface;
use crate::types::{Point, Rect, Size};

// ── SpriteTransform ───────────────────────────────────────────────────────────

/// Flip/rotate flags for blits. Flips apply in destination space, then
/// `XYSWAP` transposes, so `R90` (horizontal flip + swap) rotates clockwise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpriteTransform(pub u8);

impl SpriteTransform {
    pub const NONE: Self = Self(0b000);
    pub const HORIZONTAL: Self = Self(0b001);
    pub const VERTICAL: Self = Self(0b010);
    pub const XYSWAP: Self = Self(0b100);
    pub const R90: Self = Self(0b101);
    pub const R180: Self = Self(0b011);
    pub const R270: Self = Self(0b110);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SpriteTransform {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitAnd for SpriteTransform {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self { Self(self.0 & rhs.0) }
}

/// Map a destination-local pixel onto the source rect.
#[inline]
fn source_coord(t: SpriteTransform, dx: i32, dy: i32, dest_w: i32, dest_h: i32) -> (i32, i32) {
    let x = if t.contains(SpriteTransform::HORIZONTAL) { dest_w - 1 - dx } else { dx };
    let y = if t.contains(SpriteTransform::VERTICAL) { dest_h - 1 - dy } else { dy };
    if t.contains(SpriteTransform::XYSWAP) { (y, x) } else { (x, y) }
}

// ── Blits ─────────────────────────────────────────────────────────────────────

impl Surface {
    /// Copy `src_rect` of `src` to `dest` (top-left) with an optional
    /// flip/rotate. The source rect is clamped to the source bounds.
    pub fn blit(&mut self, src: &Surface, src_rect: Rect, dest: Point, t: SpriteTransform) {
        let sr = src_rect.intersection(&Rect::from(src.bounds));
        if sr.empty() {
            return;
        }
        // destination extent swaps with XYSWAP
        let (dw, dh) = if t.contains(SpriteTransform::XYSWAP) { (sr.h, sr.w) } else { (sr.w, sr.h) };
        let dr = self.clip.intersection(&Rect::new(dest.x, dest.y, dw, dh));
        if dr.empty() {
            return;
        }

        let left = dr.x - dest.x;
        let top = dr.y - dest.y;

        // source step per destination x: ±1 column, or ±1 row when swapped
        let (ux0, uy0) = source_coord(t, left, top, dw, dh);
        let (ux1, uy1) = source_coord(t, left + 1, top, dw, dh);
        let src_step = (ux1 - ux0) as isize + (uy1 - uy0) as isize * src.bounds.w as isize;

        let bbf = self.bbf;
        for row in 0..dr.h {
            let (u, v) = source_coord(t, left, top + row, dw, dh);
            let soff = src.offset(sr.x + u, sr.y + v);
            let doff = self.offset(dr.x, dr.y + row);
            bbf(src, soff, self, doff, dr.w as usize, src_step);
        }
    }

    /// Scale `src_rect` of `src` to fill `dest_rect`, nearest neighbour.
    pub fn stretch_blit(&mut self, src: &Surface, src_rect: Rect, dest_rect: Rect, t: SpriteTransform) {
        if dest_rect.empty() || src_rect.empty() {
            return;
        }
        let cdr = self.clip.intersection(&dest_rect);
        if cdr.empty() {
            return;
        }

        let swap = t.contains(SpriteTransform::XYSWAP);
        let (sw, sh) = if swap { (src_rect.h, src_rect.w) } else { (src_rect.w, src_rect.h) };

        // 16.16 fixed point steps through the (pre-swap) source extent
        let step_x = ((sw as i64) << 16) / dest_rect.w as i64;
        let step_y = ((sh as i64) << 16) / dest_rect.h as i64;

        let bbf = self.bbf;
        for y in cdr.y..cdr.y + cdr.h {
            let sy = (((y - dest_rect.y) as i64 * step_y) >> 16) as i32;
            for x in cdr.x..cdr.x + cdr.w {
                let sx = (((x - dest_rect.x) as i64 * step_x) >> 16) as i32;
                let (u, v) = source_coord(t, sx, sy, sw, sh);
                let (px, py) = (src_rect.x + u, src_rect.y + v);
                if !src.bounds.contains(Point::new(px, py)) {
                    continue;
                }
                let soff = src.offset(px, py);
                let doff = self.offset(x, y);
                bbf(src, soff, self, doff, 1, 1);
            }
        }
    }

    /// Draw one vertical textured span: `src_count` source pixels starting at
    /// `uv` (moving down) are stretched over `dest_count` pixels from `p`.
    pub fn stretch_blit_vspan(&mut self, src: &Surface, uv: Point, src_count: u16, mut p: Point, mut dest_count: i32) {
        if dest_count <= 0 || p.x < self.clip.x || p.x >= self.clip.x + self.clip.w {
            return;
        }
        let vs = src_count as f32 / dest_count as f32;
        let mut v = uv.y as f32;

        if p.y < self.clip.y {
            let skip = self.clip.y - p.y;
            dest_count -= skip;
            v += vs * skip as f32;
            p.y = self.clip.y;
        }
        if dest_count <= 0 {
            return;
        }

        let max_y = (p.y + dest_count).min(self.clip.y + self.clip.h);
        let bbf = self.bbf;
        while p.y < max_y {
            let sp = Point::new(uv.x, v as i32);
            if src.bounds.contains(sp) {
                let soff = src.offset_of(sp);
                let doff = self.offset_of(p);
                bbf(src, soff, self, doff, 1, 1);
            }
            v += vs;
            p.y += 1;
        }
    }

    /// Hand each clipped row of `src` and the matching destination row to `f`
    /// as raw bytes. Only for non-paletted colour formats.
    pub fn custom_blend<F>(&mut self, src: &Surface, src_rect: Rect, dest: Point, mut f: F)
    where
        F: FnMut(&[u8], &mut [u8], usize),
    {
        if !is_direct_colour(self.format) || !is_direct_colour(src.format) {
            return;
        }
        let dr = self.clip.intersection(&Rect::new(dest.x, dest.y, src_rect.w, src_rect.h));
        if dr.empty() {
            return;
        }
        let sx = src_rect.x + (dr.x - dest.x);
        let sy = src_rect.y + (dr.y - dest.y);
        let count = dr.w as usize;

        for row in 0..dr.h {
            if !src.bounds.contains(Point::new(sx, sy + row))
                || !src.bounds.contains(Point::new(sx + dr.w - 1, sy + row))
            {
                continue;
            }
            let s0 = src.offset(sx, sy + row) * src.pixel_stride;
            let d0 = self.offset(dr.x, dr.y + row) * self.pixel_stride;
            let srow = &src.data[s0..s0 + count * src.pixel_stride];
            let drow = &mut self.data[d0..d0 + count * self.pixel_stride];
            f(srow, drow, count);
        }
    }

    /// Hand each clipped row of `r` to `f` as raw bytes for in-place edits.
    pub fn custom_modify<F>(&mut self, r: Rect, mut f: F)
    where
        F: FnMut(&mut [u8], usize),
    {
        if !is_direct_colour(self.format) {
            return;
        }
        let dr = self.clip.intersection(&r);
        if dr.empty() {
            return;
        }
        let count = dr.w as usize;
        for row in 0..dr.h {
            let d0 = self.offset(dr.x, dr.y + row) * self.pixel_stride;
            f(&mut self.data[d0..d0 + count * self.pixel_stride], count);
        }
    }

    /// Small badge in the bottom-right corner, doubled on hi-res surfaces.
    pub fn watermark(&mut self) {
        const LOGO: [u8; 13 * 13] = [
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 2, 0,
            0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 2, 0,
            0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 2, 0,
            0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0,
            0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 1, 0, 0, 0, 0, 1, 0, 2, 0, 1, 0, 0,
            0, 1, 1, 1, 1, 0, 1, 0, 0, 0, 1, 1, 0,
            0, 2, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0,
            0, 2, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0,
            0, 2, 1, 1, 1, 0, 1, 0, 1, 0, 1, 1, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let pens = [Pen::rgb(39, 39, 56), Pen::rgb(255, 255, 255), Pen::rgb(0, 255, 0)];

        let scale = (self.bounds.w / 160).max(1);
        let saved = self.pen;
        let origin = Point::new(self.bounds.w - 15 * scale, self.bounds.h - 15 * scale);
        for y in 0..13 {
            for x in 0..13 {
                self.pen = pens[LOGO[(x + y * 13) as usize] as usize];
                self.rectangle(Rect::new(origin.x + x * scale, origin.y + y * scale, scale, scale));
            }
        }
        self.pen = saved;
    }

    /// Copy of this surface converted to tightly packed RGBA8, resolving the
    /// palette and expanding RGB565. Used by the host presenter and `save`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let count = (self.bounds.w.max(0) * self.bounds.h.max(0)) as usize;
        let mut out = Vec::with_capacity(count * 4);
        match self.format {
            PixelFormat::Rgba => out.extend_from_slice(&self.data[..count * 4]),
            _ => {
                for off in 0..count {
                    let p = self.pen_at_offset(off);
                    let a = if self.format == PixelFormat::P { p.a } else { 255 };
                    out.extend_from_slice(&[p.r, p.g, p.b, a]);
                }
            }
        }
        out
    }

    /// Nominal size after applying `t` to a `w × h` source.
    pub fn transformed_size(size: Size, t: SpriteTransform) -> Size {
        if t.contains(SpriteTransform::XYSWAP) { Size::new(size.h, size.w) } else { size }
    }
}

fn is_direct_colour(format: PixelFormat) -> bool {
    matches!(format, PixelFormat::Rgba | PixelFormat::Rgb | PixelFormat::Rgb565)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2×3 RGBA source with a distinct red value per pixel: r = 10 * (x + y * 2).
    fn numbered() -> Surface {
        let mut s = Surface::new(PixelFormat::Rgba, Size::new(2, 3));
        for y in 0..3 {
            for x in 0..2 {
                s.pen = Pen::rgb((10 * (x + y * 2)) as u8, 0, 0);
                s.pixel(Point::new(x, y));
            }
        }
        s
    }

    #[test]
    fn plain_blit_copies_rect() {
        let src = numbered();
        let mut dest = Surface::new(PixelFormat::Rgb, Size::new(8, 8));
        dest.blit(&src, Rect::new(0, 0, 2, 3), Point::new(1, 1), SpriteTransform::NONE);
        assert_eq!(dest.get_pixel(Point::new(1, 1)).r, 0);
        assert_eq!(dest.get_pixel(Point::new(2, 1)).r, 10);
        assert_eq!(dest.get_pixel(Point::new(2, 3)).r, 50);
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let src = numbered();
        let mut dest = Surface::new(PixelFormat::Rgba, Size::new(4, 4));
        dest.blit(&src, Rect::new(0, 0, 2, 3), Point::ZERO, SpriteTransform::HORIZONTAL);
        assert_eq!(dest.get_pixel(Point::new(0, 0)).r, 10);
        assert_eq!(dest.get_pixel(Point::new(1, 0)).r, 0);
    }

    #[test]
    fn r90_rotates_clockwise() {
        let src = numbered();
        let mut dest = Surface::new(PixelFormat::Rgba, Size::new(4, 4));
        dest.blit(&src, Rect::new(0, 0, 2, 3), Point::ZERO, SpriteTransform::R90);
        // 3 wide, 2 tall; the source's bottom-left ends up top-left
        assert_eq!(dest.get_pixel(Point::new(0, 0)).r, 40);
        assert_eq!(dest.get_pixel(Point::new(2, 0)).r, 0);
        assert_eq!(dest.get_pixel(Point::new(2, 1)).r, 10);
    }

    #[test]
    fn blit_is_clipped() {
        let src = numbered();
        let mut dest = Surface::new(PixelFormat::Rgba, Size::new(4, 4));
        dest.blit(&src, Rect::new(0, 0, 2, 3), Point::new(-1, -1), SpriteTransform::NONE);
        assert_eq!(dest.get_pixel(Point::new(0, 0)).r, 30);
    }

    #[test]
    fn stretch_doubles_pixels() {
        let src = numbered();
        let mut dest = Surface::new(PixelFormat::Rgba, Size::new(8, 8));
        dest.stretch_blit(&src, Rect::new(0, 0, 2, 3), Rect::new(0, 0, 4, 6), SpriteTransform::NONE);
        assert_eq!(dest.get_pixel(Point::new(1, 1)).r, 0);
        assert_eq!(dest.get_pixel(Point::new(2, 1)).r, 10);
        assert_eq!(dest.get_pixel(Point::new(3, 5)).r, 50);
    }

    #[test]
    fn custom_modify_inverts() {
        let mut s = Surface::new(PixelFormat::Rgb, Size::new(2, 2));
        s.custom_modify(Rect::new(0, 0, 1, 2), |row, _| row.iter_mut().for_each(|b| *b = 255 - *b));
        assert_eq!(s.get_pixel(Point::new(0, 1)), Pen::rgb(255, 255, 255));
        assert_eq!(s.get_pixel(Point::new(1, 1)), Pen::rgb(0, 0, 0));
    }
}
