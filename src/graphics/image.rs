// =============================================================================
// IMAGE.RS — loading and saving surfaces
//
// Packed images start with an 18-byte header:
//
//   type[8]  "SPRITEPK" (bit-packed palette indices)
//            "SPRITERL" (run-length encoded palette indices)
//            "SPRITERW" (raw pixels)
//   u32      byte_count (whole file)
//   u16 u16  width, height
//   u8       pixel format
//   u8       palette entry count (0 = 256)
//
// followed by RGBA palette entries (for paletted or packed images) and the
// pixel data. BMP and PNG are also accepted.
// =============================================================================

use std::path::Path;

use log::debug;
use thiserror::Error;

use super::color::{Pen, PixelFormat};
use super::surface::{Surface, palette_from_slice};
use crate::types::Size;

pub const PACKED_HEADER_LEN: usize = 18;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unrecognised image type")]
    UnknownType,
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(u8),
    #[error("image data is truncated")]
    Truncated,
    #[error("unsupported bmp: {0}")]
    UnsupportedBmp(&'static str),
    #[error("cannot save to '{0}': expected a .bmp or .blim extension")]
    UnknownExtension(String),
    #[error("png decode failed: {0}")]
    Png(#[from] ::image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ── Little helpers ────────────────────────────────────────────────────────────

fn read_u16(b: &[u8], at: usize) -> Result<u16, ImageError> {
    b.get(at..at + 2)
        .map(|s| u16::from_le_bytes([s[0], s[1]]))
        .ok_or(ImageError::Truncated)
}

fn read_u32(b: &[u8], at: usize) -> Result<u32, ImageError> {
    b.get(at..at + 4)
        .map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
        .ok_or(ImageError::Truncated)
}

fn read_i32(b: &[u8], at: usize) -> Result<i32, ImageError> {
    read_u32(b, at).map(|v| v as i32)
}

/// MSB-first bit reader over a byte slice.
struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read(&mut self, bits: u8) -> Option<u8> {
        let mut v = 0u8;
        for _ in 0..bits {
            let byte = *self.bytes.get(self.pos / 8)?;
            let bit = (byte >> (7 - (self.pos % 8))) & 1;
            v = (v << 1) | bit;
            self.pos += 1;
        }
        Some(v)
    }
}

/// Bytes a `w`×`h` image needs at `stride` bytes per pixel, if that fits
/// in memory at all.
fn image_len(w: u64, h: u64, stride: usize) -> Option<usize> {
    w.checked_mul(h)?.checked_mul(stride as u64)?.try_into().ok()
}

/// Bits per packed palette index for a palette of `count` entries.
pub fn packed_bit_depth(count: usize) -> u8 {
    let n = count.saturating_sub(1).max(1) as u32;
    (u32::BITS - n.leading_zeros()) as u8
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl Surface {
    /// Load a packed image or a BMP, detected from the leading bytes.
    /// Paletted images stay paletted.
    pub fn load(bytes: &[u8]) -> Result<Surface, ImageError> {
        if bytes.starts_with(b"BM") {
            return Surface::load_bmp(bytes);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            return Surface::load_png(bytes);
        }
        load_packed(bytes)
    }

    /// Like [`Surface::load`] but paletted images are expanded to RGBA.
    pub fn load_as_rgba(bytes: &[u8]) -> Result<Surface, ImageError> {
        let s = Surface::load(bytes)?;
        if s.format != PixelFormat::P {
            return Ok(s);
        }
        let data = s.to_rgba8();
        Surface::from_data(data, PixelFormat::Rgba, s.bounds).ok_or(ImageError::Truncated)
    }

    /// Decode a PNG into an RGBA surface.
    pub fn load_png(bytes: &[u8]) -> Result<Surface, ImageError> {
        let img = ::image::load_from_memory(bytes)?.to_rgba8();
        let (w, h) = img.dimensions();
        debug!("[image] png {w}x{h}");
        Surface::from_data(img.into_raw(), PixelFormat::Rgba, Size::new(w as i32, h as i32))
            .ok_or(ImageError::Truncated)
    }

    /// Decode an 8, 24 or 32-bit uncompressed BMP.
    pub fn load_bmp(bytes: &[u8]) -> Result<Surface, ImageError> {
        if !bytes.starts_with(b"BM") {
            return Err(ImageError::UnknownType);
        }
        let data_offset = read_u32(bytes, 10)? as usize;
        let info_size = read_u32(bytes, 14)? as usize;
        let w = read_i32(bytes, 18)?;
        let h = read_i32(bytes, 22)?;
        let bpp = read_u16(bytes, 28)?;
        let compression = read_u32(bytes, 30)?;
        let palette_cols = read_u32(bytes, 46)? as usize;

        let format = match bpp {
            8 => PixelFormat::P,
            24 => PixelFormat::Rgb,
            32 => PixelFormat::Rgba,
            _ => return Err(ImageError::UnsupportedBmp("bit depth")),
        };

        match compression {
            0 => {}
            // bitfields; only plain BGRA masks are accepted
            3 => {
                let masks = [
                    read_u32(bytes, 54)?,
                    read_u32(bytes, 58)?,
                    read_u32(bytes, 62)?,
                    read_u32(bytes, 66)?,
                ];
                if bpp != 32 || masks != [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000] {
                    return Err(ImageError::UnsupportedBmp("bitfield masks"));
                }
            }
            _ => return Err(ImageError::UnsupportedBmp("compression")),
        }

        let height = h.unsigned_abs();
        if w <= 0 || height == 0 || height > i32::MAX as u32 {
            return Err(ImageError::UnsupportedBmp("dimensions"));
        }
        let top_down = h < 0;

        // every row must be present before the surface is allocated
        let row_stride = image_len(w as u64, 1, format.stride()).ok_or(ImageError::Truncated)?;
        let bmp_stride = row_stride.checked_add(3).ok_or(ImageError::Truncated)? & !3;
        let end = (height as usize)
            .checked_mul(bmp_stride)
            .and_then(|n| n.checked_add(data_offset))
            .ok_or(ImageError::Truncated)?;
        if end > bytes.len() {
            return Err(ImageError::Truncated);
        }

        let bounds = Size::new(w, height as i32);
        let mut surface = Surface::new(format, bounds);
        for y in 0..bounds.h as usize {
            let src = data_offset + y * bmp_stride;
            let row = bytes.get(src..src + row_stride).ok_or(ImageError::Truncated)?;
            let dst_y = if top_down { y } else { bounds.h as usize - 1 - y };
            surface.data[dst_y * row_stride..(dst_y + 1) * row_stride].copy_from_slice(row);
        }

        if format == PixelFormat::P {
            let count = if palette_cols == 0 { 256 } else { palette_cols.min(256) };
            let start = 14 + info_size;
            let raw = bytes.get(start..start + count * 4).ok_or(ImageError::Truncated)?;
            let colours: Vec<Pen> = raw.chunks_exact(4).map(|c| Pen::rgba(c[2], c[1], c[0], 255)).collect();
            surface.palette = Some(palette_from_slice(&colours));
        } else {
            for px in surface.data.chunks_exact_mut(surface.pixel_stride) {
                px.swap(0, 2);
            }
        }

        debug!("[image] bmp {}x{} {:?}", bounds.w, bounds.h, format);
        Ok(surface)
    }
}

fn load_packed(bytes: &[u8]) -> Result<Surface, ImageError> {
    let kind = bytes.get(0..8).ok_or(ImageError::Truncated)?;
    let (raw, rle) = match kind {
        b"SPRITERW" => (true, false),
        b"SPRITERL" => (false, true),
        b"SPRITEPK" => (false, false),
        _ => return Err(ImageError::UnknownType),
    };

    let byte_count = (read_u32(bytes, 8)? as usize).min(bytes.len());
    let bounds = Size::new(read_u16(bytes, 12)? as i32, read_u16(bytes, 14)? as i32);
    let format_byte = *bytes.get(16).ok_or(ImageError::Truncated)?;
    let format = PixelFormat::from_u8(format_byte).ok_or(ImageError::UnsupportedFormat(format_byte))?;
    let mut palette_count = *bytes.get(17).ok_or(ImageError::Truncated)? as usize;
    if palette_count == 0 && (format == PixelFormat::P || !raw) {
        palette_count = 256;
    }

    let mut offset = PACKED_HEADER_LEN;

    let mut palette: Vec<Pen> = Vec::new();
    if format == PixelFormat::P || !raw {
        let table = bytes.get(offset..offset + palette_count * 4).ok_or(ImageError::Truncated)?;
        palette = table.chunks_exact(4).map(|c| Pen::rgba(c[0], c[1], c[2], c[3])).collect();
        offset += palette_count * 4;
    }

    let body = bytes.get(offset..byte_count.max(offset)).ok_or(ImageError::Truncated)?;

    if raw {
        let needed = image_len(bounds.w as u64, bounds.h as u64, format.stride()).ok_or(ImageError::Truncated)?;
        let src = body.get(..needed).ok_or(ImageError::Truncated)?;
        let mut surface = Surface::new(format, bounds);
        surface.data.copy_from_slice(src);
        if format == PixelFormat::P {
            surface.palette = Some(palette_from_slice(&palette));
        }
        return Ok(surface);
    }

    let depth = packed_bit_depth(palette_count);
    let pixels = image_len(bounds.w as u64, bounds.h as u64, 1).ok_or(ImageError::Truncated)?;
    // a run of up to 256 pixels costs at least 9 bits
    let reachable = if rle { body.len() * 8 / (9 + depth as usize) * 256 + body.len() } else { body.len() * 8 };
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.min(reachable));
    let mut bits = BitReader::new(body);

    if rle {
        while indices.len() < pixels {
            let Some(flag) = bits.read(1) else { break };
            let count = if flag == 1 {
                match bits.read(8) {
                    Some(c) => c as usize,
                    None => break,
                }
            } else {
                0
            };
            let Some(col) = bits.read(depth) else { break };
            let run = (count + 1).min(pixels - indices.len());
            indices.extend(std::iter::repeat(col).take(run));
        }
    } else {
        while indices.len() < pixels {
            let Some(col) = bits.read(depth) else { break };
            indices.push(col);
        }
    }

    if indices.len() < pixels {
        return Err(ImageError::Truncated);
    }

    let mut surface = Surface::new(format, bounds);

    if format == PixelFormat::P {
        surface.data.copy_from_slice(&indices);
        surface.palette = Some(palette_from_slice(&palette));
    } else {
        // expand through the palette into the stored format
        let lookup = palette_from_slice(&palette);
        for (off, idx) in indices.iter().enumerate() {
            surface.pen = lookup[*idx as usize];
            let (pbf, pen) = (surface.pbf, surface.pen);
            write_pixel_raw(&mut surface, off, pen, pbf);
        }
        surface.pen = Pen::default();
    }

    debug!("[image] packed {}x{} {:?} rle={rle}", bounds.w, bounds.h, format);
    Ok(surface)
}

/// Store `pen` at `off` without blending.
fn write_pixel_raw(s: &mut Surface, off: usize, pen: Pen, pbf: super::blend::PenBlendFn) {
    let stride = s.pixel_stride;
    let d = &mut s.data[off * stride..(off + 1) * stride];
    match s.format {
        PixelFormat::Rgba => d.copy_from_slice(&[pen.r, pen.g, pen.b, pen.a]),
        PixelFormat::Rgb => d.copy_from_slice(&[pen.r, pen.g, pen.b]),
        _ => pbf(&pen, s, off, 1),
    }
}

// ── Saving ────────────────────────────────────────────────────────────────────

impl Surface {
    /// Encode as a top-down BMP (paletted, 24-bit or 32-bit).
    pub fn encode_bmp(&self) -> Vec<u8> {
        let (bpp, stride) = match self.format {
            PixelFormat::P | PixelFormat::M => (8u16, 1usize),
            PixelFormat::Rgb | PixelFormat::Rgb565 => (24, 3),
            PixelFormat::Rgba => (32, 4),
        };
        let w = self.bounds.w.max(0) as usize;
        let h = self.bounds.h.max(0) as usize;
        let row = (w * stride + 3) & !3;
        let palette_size = if bpp == 8 { 256 * 4 } else { 0 };
        let data_offset = 54 + palette_size;
        let image_size = row * h;

        let mut out = Vec::with_capacity(data_offset + image_size);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&((data_offset + image_size) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(data_offset as u32).to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(w as i32).to_le_bytes());
        out.extend_from_slice(&(-(h as i32)).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bpp.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(image_size as u32).to_le_bytes());
        out.extend_from_slice(&[0; 16]);

        if bpp == 8 {
            for i in 0..256 {
                let p = match (&self.palette, self.format) {
                    (Some(pal), _) => pal[i],
                    _ => Pen::rgb(i as u8, i as u8, i as u8),
                };
                out.extend_from_slice(&[p.b, p.g, p.r, p.a]);
            }
        }

        for y in 0..h {
            let start = out.len();
            for x in 0..w {
                let off = y * w + x;
                if bpp == 8 {
                    out.push(self.data[off]);
                } else {
                    let p = self.pen_at_offset(off);
                    out.extend_from_slice(&[p.b, p.g, p.r]);
                    if bpp == 32 {
                        out.push(p.a);
                    }
                }
            }
            out.resize(start + row, 0);
        }
        out
    }

    /// Encode as a raw `SPRITERW` packed image.
    pub fn encode_blim(&self) -> Vec<u8> {
        let palette_bytes = if self.format == PixelFormat::P { 256 * 4 } else { 0 };
        let total = PACKED_HEADER_LEN + palette_bytes + self.data.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"SPRITERW");
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(self.bounds.w as u16).to_le_bytes());
        out.extend_from_slice(&(self.bounds.h as u16).to_le_bytes());
        out.push(self.format as u8);
        out.push(0);
        if self.format == PixelFormat::P {
            for i in 0..256 {
                let p = self.palette.as_ref().map(|pal| pal[i]).unwrap_or_default();
                out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
            }
        }
        out.extend_from_slice(&self.data);
        out
    }

    /// Write to `path`, choosing BMP or packed by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let path = path.as_ref();
        let bytes = match path.extension().and_then(|e| e.to_str()) {
            Some("bmp") => self.encode_bmp(),
            Some("blim") => self.encode_blim(),
            _ => return Err(ImageError::UnknownExtension(path.display().to_string())),
        };
        std::fs::write(path, bytes)?;
        debug!("[image] saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depth_for_palette_sizes() {
        assert_eq!(packed_bit_depth(1), 1);
        assert_eq!(packed_bit_depth(2), 1);
        assert_eq!(packed_bit_depth(3), 2);
        assert_eq!(packed_bit_depth(4), 2);
        assert_eq!(packed_bit_depth(5), 3);
        assert_eq!(packed_bit_depth(16), 4);
        assert_eq!(packed_bit_depth(256), 8);
    }

    #[test]
    fn bit_reader_is_msb_first() {
        let mut r = BitReader::new(&[0b1011_0010]);
        assert_eq!(r.read(1), Some(1));
        assert_eq!(r.read(3), Some(0b011));
        assert_eq!(r.read(4), Some(0b0010));
        assert_eq!(r.read(1), None);
    }

    #[test]
    fn unknown_magic_is_rejected() {
        assert!(matches!(Surface::load(b"NOTANIMAGE--------"), Err(ImageError::UnknownType)));
    }
}
