// =============================================================================
// BLEND.RS — per-format pixel writers
//
// Pen blend functions fill `count` pixels starting at a pixel offset with the
// pen colour. Blit blend functions copy `count` pixels from a source surface,
// stepping the source offset by `src_step` pixels each time (±1 for rows, ±width
// for columns).
//
// None of these clip or bounds-check against the clip rect; callers have
// already done that.
// =============================================================================

use super::color::{Pen, PixelFormat, pack_rgb565, unpack_rgb565};
use super::surface::Surface;

pub type PenBlendFn = fn(pen: &Pen, dest: &mut Surface, off: usize, count: usize);
pub type BlitBlendFn =
    fn(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize);

// ── Arithmetic ────────────────────────────────────────────────────────────────

/// Combine two 8-bit alphas. 255 × 255 yields 256 so a fully opaque result can
/// take the copy path.
#[inline(always)]
pub fn alpha(a1: u32, a2: u32) -> u32 {
    ((a1 + 1) * (a2 + 1)) >> 8
}

#[inline(always)]
pub fn alpha3(a1: u32, a2: u32, a3: u32) -> u32 {
    ((a1 + 1) * (a2 + 1) * (a3 + 1)) >> 16
}

/// Blend source channel `s` over destination `d` by `a` (0..=255).
#[inline(always)]
pub fn blend(s: u8, d: u8, a: u32) -> u8 {
    let (s, d, a) = (s as i32, d as i32, a as i32);
    (d + ((a * (s - d) + 127) >> 8)) as u8
}

// ── Single pixel writers ──────────────────────────────────────────────────────

#[inline(always)]
fn put_rgba(d: &mut [u8], p: &Pen, a: u32) {
    if a >= 255 {
        d[0] = p.r;
        d[1] = p.g;
        d[2] = p.b;
        d[3] = 255;
    } else if a > 0 {
        d[0] = blend(p.r, d[0], a);
        d[1] = blend(p.g, d[1], a);
        d[2] = blend(p.b, d[2], a);
        d[3] = blend(255, d[3], a);
    }
}

#[inline(always)]
fn put_rgb(d: &mut [u8], p: &Pen, a: u32) {
    if a >= 255 {
        d[0] = p.r;
        d[1] = p.g;
        d[2] = p.b;
    } else if a > 0 {
        d[0] = blend(p.r, d[0], a);
        d[1] = blend(p.g, d[1], a);
        d[2] = blend(p.b, d[2], a);
    }
}

#[inline(always)]
fn put_rgb565(d: &mut [u8], p: &Pen, a: u32) {
    let packed = if a >= 255 {
        pack_rgb565(p.r, p.g, p.b)
    } else if a > 0 {
        let (r, g, b) = unpack_rgb565(u16::from_le_bytes([d[0], d[1]]));
        pack_rgb565(blend(p.r, r, a), blend(p.g, g, a), blend(p.b, b, a))
    } else {
        return;
    };
    d.copy_from_slice(&packed.to_le_bytes());
}

// ── Pen blend functions ───────────────────────────────────────────────────────

fn pen_blend_with(
    pen: &Pen,
    dest: &mut Surface,
    off: usize,
    count: usize,
    put: fn(&mut [u8], &Pen, u32),
) {
    if pen.a == 0 {
        return;
    }
    let stride = dest.format.stride();
    let a1 = alpha(pen.a as u32, dest.alpha as u32);
    let mask = dest.mask.as_deref().map(|m| &m.data);
    for i in off..off + count {
        let a = match mask {
            Some(m) => alpha(a1, m[i] as u32),
            None => a1,
        };
        put(&mut dest.data[i * stride..(i + 1) * stride], pen, a);
    }
}

pub fn pen_rgba_rgba(pen: &Pen, dest: &mut Surface, off: usize, count: usize) {
    pen_blend_with(pen, dest, off, count, put_rgba);
}

pub fn pen_rgba_rgb(pen: &Pen, dest: &mut Surface, off: usize, count: usize) {
    pen_blend_with(pen, dest, off, count, put_rgb);
}

pub fn pen_rgba_rgb565(pen: &Pen, dest: &mut Surface, off: usize, count: usize) {
    pen_blend_with(pen, dest, off, count, put_rgb565);
}

/// Paletted destination: the pen's `a` is the palette index.
pub fn pen_p_p(pen: &Pen, dest: &mut Surface, off: usize, count: usize) {
    if dest.transparent_index == Some(pen.a) {
        return;
    }
    dest.data[off..off + count].fill(pen.a);
}

/// Mask destination: the pen's `a` is blended in using the surface alpha.
pub fn pen_m_m(pen: &Pen, dest: &mut Surface, off: usize, count: usize) {
    let a = dest.alpha as u32;
    for d in &mut dest.data[off..off + count] {
        *d = if a >= 255 { pen.a } else { blend(pen.a, *d, a) };
    }
}

// ── Blit blend functions ──────────────────────────────────────────────────────

fn blit_blend_with(
    src: &Surface,
    soff: usize,
    dest: &mut Surface,
    doff: usize,
    count: usize,
    src_step: isize,
    put: fn(&mut [u8], &Pen, u32),
) {
    let stride = dest.format.stride();
    let opaque_src = src.format == PixelFormat::Rgb || src.format == PixelFormat::Rgb565;
    let dest_alpha = dest.alpha as u32;
    let mask = dest.mask.as_deref().map(|m| &m.data);
    let mut s = soff as isize;

    for i in doff..doff + count {
        let pen = src.pen_at_offset(s as usize);
        let pa = if opaque_src { 255 } else { pen.a as u32 };
        let a = match mask {
            Some(m) => alpha3(pa, m[i] as u32, dest_alpha),
            None => alpha(pa, dest_alpha),
        };
        if a > 1 {
            put(&mut dest.data[i * stride..(i + 1) * stride], &pen, a);
        }
        s += src_step;
    }
}

pub fn blit_rgba_rgba(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize) {
    blit_blend_with(src, soff, dest, doff, count, src_step, put_rgba);
}

pub fn blit_rgba_rgb(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize) {
    blit_blend_with(src, soff, dest, doff, count, src_step, put_rgb);
}

pub fn blit_rgba_rgb565(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize) {
    blit_blend_with(src, soff, dest, doff, count, src_step, put_rgb565);
}

/// Index copy between paletted surfaces, skipping the source's transparent
/// index.
pub fn blit_p_p(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize) {
    let transparent = src.transparent_index;
    let mut s = soff as isize;
    for d in &mut dest.data[doff..doff + count] {
        let idx = src.data[s as usize];
        if transparent != Some(idx) {
            *d = idx;
        }
        s += src_step;
    }
}

pub fn blit_m_m(src: &Surface, soff: usize, dest: &mut Surface, doff: usize, count: usize, src_step: isize) {
    let a = dest.alpha as u32;
    let mut s = soff as isize;
    for d in &mut dest.data[doff..doff + count] {
        let v = src.data[s as usize * src.format.stride()];
        *d = if a >= 255 { v } else { blend(v, *d, a) };
        s += src_step;
    }
}

/// Blend function pair for a destination format.
pub fn blend_functions(format: PixelFormat) -> (PenBlendFn, BlitBlendFn) {
    match format {
        PixelFormat::Rgba => (pen_rgba_rgba, blit_rgba_rgba),
        PixelFormat::Rgb => (pen_rgba_rgb, blit_rgba_rgb),
        PixelFormat::Rgb565 => (pen_rgba_rgb565, blit_rgba_rgb565),
        PixelFormat::P => (pen_p_p, blit_p_p),
        PixelFormat::M => (pen_m_m, blit_m_m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_of_opaque_pair_reaches_copy_threshold() {
        assert!(alpha(255, 255) >= 255);
        assert_eq!(alpha(0, 255), 1);
        assert_eq!(alpha3(255, 255, 255), 256);
    }

    #[test]
    fn blend_halfway() {
        let v = blend(200, 100, 128);
        assert!((149..=151).contains(&v), "got {v}");
        assert_eq!(blend(10, 10, 77), 10);
        assert_eq!(blend(255, 0, 0), 0);
    }
}
