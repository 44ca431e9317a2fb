/// Software renderer behaviour checked through the public `Surface` API.
///
/// All surfaces are small and in memory; nothing touches a window or GPU.
use blitkit::graphics::*;
use blitkit::types::{Point, Rect, Size};

const RED: Pen = Pen::rgb(255, 0, 0);
const GREEN: Pen = Pen::rgb(0, 255, 0);

fn rgb(w: i32, h: i32) -> Surface {
    Surface::new(PixelFormat::Rgb, Size::new(w, h))
}

fn lit(s: &Surface) -> Vec<Point> {
    let mut out = Vec::new();
    for y in 0..s.bounds.h {
        for x in 0..s.bounds.w {
            let p = Point::new(x, y);
            if s.get_pixel(p) != Pen::BLACK {
                out.push(p);
            }
        }
    }
    out
}

// ── Primitives ────────────────────────────────────────────────────────────────

#[test]
fn rectangle_respects_clip() {
    let mut s = rgb(8, 8);
    s.set_clip(Rect::new(2, 2, 4, 4));
    s.set_pen(RED);
    s.rectangle(Rect::new(0, 0, 8, 8));

    assert_eq!(lit(&s).len(), 16);
    assert_eq!(s.get_pixel(Point::new(1, 1)), Pen::BLACK);
    assert_eq!(s.get_pixel(Point::new(2, 2)), RED);
    assert_eq!(s.get_pixel(Point::new(5, 5)), RED);
    assert_eq!(s.get_pixel(Point::new(6, 6)), Pen::BLACK);
}

/// A clip rect larger than the surface is clamped to the bounds.
#[test]
fn clip_is_clamped_to_bounds() {
    let mut s = rgb(4, 4);
    s.set_clip(Rect::new(-10, -10, 100, 100));
    assert_eq!(s.clip, Rect::new(0, 0, 4, 4));
}

#[test]
fn line_includes_both_endpoints() {
    let mut s = rgb(8, 8);
    s.set_pen(RED);
    s.line(Point::new(1, 1), Point::new(6, 4));
    assert_eq!(s.get_pixel(Point::new(1, 1)), RED);
    assert_eq!(s.get_pixel(Point::new(6, 4)), RED);
    assert_eq!(lit(&s).len(), 6);
}

#[test]
fn circle_is_symmetric() {
    let mut s = rgb(21, 21);
    s.set_pen(RED);
    s.circle(Point::new(10, 10), 6);
    // spans cover c.x - x .. c.x + x - 1, so columns mirror about x = 9.5
    for p in lit(&s) {
        assert_eq!(s.get_pixel(Point::new(p.x, 20 - p.y)), RED, "{p:?} has no vertical mirror");
        assert_eq!(s.get_pixel(Point::new(19 - p.x, p.y)), RED, "{p:?} has no horizontal mirror");
    }
    assert_eq!(s.get_pixel(Point::new(10, 10)), RED);
    assert_eq!(s.get_pixel(Point::new(10, 17)), Pen::BLACK);
}

/// Two triangles sharing a diagonal never write the same pixel.
#[test]
fn triangles_sharing_an_edge_do_not_overlap() {
    let mut a = rgb(10, 10);
    let mut b = rgb(10, 10);
    a.set_pen(RED);
    b.set_pen(RED);
    a.triangle(Point::new(0, 0), Point::new(8, 0), Point::new(8, 8));
    b.triangle(Point::new(0, 0), Point::new(8, 8), Point::new(0, 8));

    let pa = lit(&a);
    let pb = lit(&b);
    assert!(!pa.is_empty() && !pb.is_empty());
    for p in &pa {
        assert!(!pb.contains(p), "{p:?} drawn by both triangles");
    }
}

#[test]
fn polygon_fills_a_square() {
    let mut s = rgb(10, 10);
    s.set_pen(RED);
    s.polygon(&[Point::new(2, 2), Point::new(6, 2), Point::new(6, 6), Point::new(2, 6)]);
    assert_eq!(s.get_pixel(Point::new(4, 4)), RED);
    assert_eq!(s.get_pixel(Point::new(8, 8)), Pen::BLACK);
}

// ── Blending ──────────────────────────────────────────────────────────────────

#[test]
fn translucent_pen_blends_halfway() {
    let mut s = rgb(1, 1);
    s.set_pen(Pen::rgba(255, 255, 255, 128));
    s.pixel(Point::new(0, 0));
    assert_eq!(s.get_pixel(Point::new(0, 0)), Pen::rgb(128, 128, 128));
}

#[test]
fn transparent_pen_draws_nothing() {
    let mut s = rgb(4, 4);
    s.set_pen(Pen::TRANSPARENT);
    s.clear();
    assert!(lit(&s).is_empty());
}

#[test]
fn surface_alpha_scales_the_pen() {
    let mut s = rgb(1, 1);
    s.alpha = 127;
    s.set_pen(Pen::WHITE);
    s.pixel(Point::new(0, 0));
    let p = s.get_pixel(Point::new(0, 0));
    assert!((126..=129).contains(&p.r), "got {p:?}");
}

#[test]
fn mask_limits_drawing() {
    let mut s = rgb(4, 1);
    let mut mask = Surface::new(PixelFormat::M, Size::new(4, 1));
    mask.set_pen(Pen::index(255));
    mask.rectangle(Rect::new(0, 0, 2, 1));
    assert!(s.set_mask(Some(mask)));

    s.set_pen(RED);
    s.clear();
    assert_eq!(s.get_pixel(Point::new(0, 0)), RED);
    // a zero mask still rounds up to the faintest blend
    assert!(s.get_pixel(Point::new(3, 0)).r <= 1);
}

#[test]
fn mismatched_mask_is_refused() {
    let mut s = rgb(4, 4);
    assert!(!s.set_mask(Some(Surface::new(PixelFormat::M, Size::new(2, 2)))));
    assert!(!s.set_mask(Some(Surface::new(PixelFormat::Rgb, Size::new(4, 4)))));
    assert!(s.mask.is_none());
}

#[test]
fn rgb565_keeps_full_intensity() {
    let mut s = Surface::new(PixelFormat::Rgb565, Size::new(1, 1));
    s.set_pen(Pen::WHITE);
    s.pixel(Point::new(0, 0));
    assert_eq!(s.get_pixel(Point::new(0, 0)), Pen::WHITE);
}

// ── Palettes ──────────────────────────────────────────────────────────────────

#[test]
fn paletted_surface_resolves_through_palette() {
    let mut s = Surface::new(PixelFormat::P, Size::new(2, 1));
    s.set_palette(&[Pen::BLACK, RED]);
    s.set_pen(Pen::index(1));
    s.pixel(Point::new(1, 0));

    assert_eq!(s.get_index(Point::new(1, 0)), Some(1));
    assert_eq!(s.get_pixel(Point::new(1, 0)), RED);
    assert_eq!(s.to_rgba8(), vec![0, 0, 0, 255, 255, 0, 0, 255]);
}

#[test]
fn transparent_index_is_skipped_by_pens() {
    let mut s = Surface::new(PixelFormat::P, Size::new(1, 1));
    s.transparent_index = Some(3);
    s.set_pen(Pen::index(3));
    s.pixel(Point::new(0, 0));
    assert_eq!(s.get_index(Point::new(0, 0)), Some(0));
}

// ── Images and sprites ────────────────────────────────────────────────────────

#[test]
fn bmp_encode_then_load_keeps_pixels() {
    let mut s = rgb(3, 2);
    s.set_pen(GREEN);
    s.pixel(Point::new(2, 1));
    let loaded = Surface::load(&s.encode_bmp()).unwrap();
    assert_eq!(loaded.format, PixelFormat::Rgb);
    assert_eq!(loaded.bounds, Size::new(3, 2));
    assert_eq!(loaded.get_pixel(Point::new(2, 1)), GREEN);
    assert_eq!(loaded.get_pixel(Point::new(0, 0)), Pen::BLACK);
}

/// 2×2 bit-packed image with a two-colour palette: one bit per pixel.
#[test]
fn loads_bit_packed_image() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"SPRITEPK");
    bytes.extend_from_slice(&27u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.push(PixelFormat::P as u8);
    bytes.push(2);
    bytes.extend_from_slice(&[0, 0, 0, 255, 255, 0, 0, 255]);
    bytes.push(0b0110_0000);

    let s = Surface::load(&bytes).unwrap();
    assert_eq!(s.format, PixelFormat::P);
    assert_eq!(s.get_index(Point::new(0, 0)), Some(0));
    assert_eq!(s.get_index(Point::new(1, 0)), Some(1));
    assert_eq!(s.get_index(Point::new(0, 1)), Some(1));
    assert_eq!(s.get_pixel(Point::new(1, 1)), Pen::BLACK);

    let rgba = Surface::load_as_rgba(&bytes).unwrap();
    assert_eq!(rgba.format, PixelFormat::Rgba);
    assert_eq!(rgba.get_pixel(Point::new(1, 0)), RED);
}

#[test]
fn truncated_packed_image_is_an_error() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"SPRITERW");
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.push(PixelFormat::Rgb as u8);
    bytes.push(0);
    assert!(matches!(Surface::load(&bytes), Err(ImageError::Truncated)));
}

fn packed_header(kind: &[u8; 8], byte_count: u32, w: u16, h: u16, format: PixelFormat, palette: u8) -> Vec<u8> {
    let mut bytes = kind.to_vec();
    bytes.extend_from_slice(&byte_count.to_le_bytes());
    bytes.extend_from_slice(&w.to_le_bytes());
    bytes.extend_from_slice(&h.to_le_bytes());
    bytes.push(format as u8);
    bytes.push(palette);
    bytes
}

/// 4×2 run-length image, one bit per index:
/// single 1, run of 3 × 0, single 1, then a run of 10 × 1 cut to the last 3.
#[test]
fn loads_run_length_image() {
    let mut bytes = packed_header(b"SPRITERL", 29, 4, 2, PixelFormat::P, 2);
    bytes.extend_from_slice(&[0, 0, 0, 255, 255, 0, 0, 255]);
    bytes.extend_from_slice(&[0b0110_0000, 0b0100_0110, 0b0001_0011]);

    let s = Surface::load(&bytes).unwrap();
    let indices: Vec<u8> = (0..2)
        .flat_map(|y| (0..4).map(move |x| Point::new(x, y)))
        .map(|p| s.get_index(p).unwrap())
        .collect();
    assert_eq!(indices, [1, 0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(s.get_pixel(Point::new(0, 0)), RED);
}

#[test]
fn run_length_image_short_of_pixels_is_an_error() {
    let mut bytes = packed_header(b"SPRITERL", 28, 4, 2, PixelFormat::P, 2);
    bytes.extend_from_slice(&[0, 0, 0, 255, 255, 0, 0, 255]);
    // a run of 3 and two single pixels: 5 of the 8
    bytes.push(0b1000_0001);
    bytes.push(0b0000_0000);
    assert!(matches!(Surface::load(&bytes), Err(ImageError::Truncated)));
}

/// Huge declared sizes are rejected from the header alone.
#[test]
fn oversized_packed_images_fail_without_allocating() {
    let raw = packed_header(b"SPRITERW", 20, u16::MAX, u16::MAX, PixelFormat::Rgb, 0);
    assert!(matches!(Surface::load(&raw), Err(ImageError::Truncated)));

    let mut packed = packed_header(b"SPRITEPK", 30, u16::MAX, u16::MAX, PixelFormat::P, 2);
    packed.extend_from_slice(&[0, 0, 0, 255, 255, 255, 255, 255, 0xff, 0xff, 0xff, 0xff]);
    assert!(matches!(Surface::load(&packed), Err(ImageError::Truncated)));

    let mut rle = packed_header(b"SPRITERL", 30, u16::MAX, u16::MAX, PixelFormat::Rgba, 2);
    rle.extend_from_slice(&[0, 0, 0, 255, 255, 255, 255, 255, 0xff, 0xff, 0xff, 0xff]);
    assert!(matches!(Surface::load(&rle), Err(ImageError::Truncated)));
}

fn bmp_header(w: i32, h: i32) -> Vec<u8> {
    let mut bytes = vec![0u8; 54];
    bytes[0..2].copy_from_slice(b"BM");
    bytes[10..14].copy_from_slice(&54u32.to_le_bytes());
    bytes[14..18].copy_from_slice(&40u32.to_le_bytes());
    bytes[18..22].copy_from_slice(&w.to_le_bytes());
    bytes[22..26].copy_from_slice(&h.to_le_bytes());
    bytes[28..30].copy_from_slice(&24u16.to_le_bytes());
    bytes
}

#[test]
fn oversized_bmp_fails_without_allocating() {
    assert!(matches!(Surface::load(&bmp_header(65535, 65535)), Err(ImageError::Truncated)));
    assert!(matches!(Surface::load(&bmp_header(i32::MAX, -i32::MAX)), Err(ImageError::Truncated)));
    assert!(matches!(Surface::load(&bmp_header(4, i32::MIN)), Err(ImageError::UnsupportedBmp(_))));

    // a header that does describe its single row still loads
    let mut one = bmp_header(1, 1);
    one.extend_from_slice(&[0, 0, 255, 0]);
    assert_eq!(Surface::load(&one).unwrap().get_pixel(Point::ZERO), RED);
}

#[test]
fn sprites_load_from_packed_sheet() {
    let mut sheet = rgb(16, 8);
    sheet.set_pen(GREEN);
    sheet.rectangle(Rect::new(8, 0, 8, 8));

    let mut screen = rgb(16, 16);
    screen.load_sprites(&sheet.encode_blim()).unwrap();
    screen.sprite_at(1u16, Point::new(4, 4));

    assert_eq!(screen.get_pixel(Point::new(4, 4)), GREEN);
    assert_eq!(screen.get_pixel(Point::new(11, 11)), GREEN);
    assert_eq!(screen.get_pixel(Point::new(12, 12)), Pen::BLACK);
}

#[test]
fn sprite_transform_r180_flips_both_axes() {
    let mut sheet = rgb(8, 8);
    sheet.set_pen(RED);
    sheet.pixel(Point::new(0, 0));
    let mut screen = rgb(8, 8);
    screen.blit(&sheet, Rect::new(0, 0, 8, 8), Point::ZERO, SpriteTransform::R180);
    assert_eq!(screen.get_pixel(Point::new(7, 7)), RED);
    assert_eq!(screen.get_pixel(Point::new(0, 0)), Pen::BLACK);
}

// ── Text ──────────────────────────────────────────────────────────────────────

#[test]
fn text_draws_glyph_columns() {
    let mut s = rgb(16, 8);
    s.set_pen(Pen::WHITE);
    s.text_at("HI", &MINIMAL_FONT, Point::ZERO);

    // 'H' starts with a full-height column
    for y in 0..7 {
        assert_eq!(s.get_pixel(Point::new(0, y)), Pen::WHITE);
    }
    assert_eq!(s.get_pixel(Point::new(0, 7)), Pen::BLACK);
    // one column gap, then the trimmed 'I'
    assert_eq!(s.get_pixel(Point::new(5, 0)), Pen::BLACK);
    assert_eq!(s.get_pixel(Point::new(6, 0)), Pen::WHITE);
    assert_eq!(s.get_pixel(Point::new(6, 1)), Pen::BLACK);
    assert_eq!(s.get_pixel(Point::new(7, 3)), Pen::WHITE);
}

#[test]
fn tall_glyphs_draw_only_their_stored_rows() {
    // two solid byte columns per glyph, declared 20 rows high
    let font = Font::new(vec![0xffu8; 95 * 2], 2, 20, 0);
    let mut s = rgb(8, 24);
    s.set_pen(Pen::WHITE);
    s.text_at("A", &font, Point::ZERO);

    for y in 0..8 {
        assert_eq!(s.get_pixel(Point::new(1, y)), Pen::WHITE);
    }
    assert!(lit(&s).iter().all(|p| p.x < 2 && p.y < 8));
}

#[test]
fn clipped_text_stays_in_rect() {
    let mut s = rgb(32, 16);
    s.set_pen(Pen::WHITE);
    s.text("HELLO", &MINIMAL_FONT, Rect::new(0, 0, 8, 8), true, TextAlign::TOP_LEFT, true);
    assert!(lit(&s).iter().all(|p| p.x < 8 && p.y < 8));
    assert_eq!(s.clip, Rect::new(0, 0, 32, 16));
}

#[test]
fn right_aligned_text_ends_at_rect_edge() {
    let mut s = rgb(40, 10);
    s.set_pen(Pen::WHITE);
    s.text("H", &MINIMAL_FONT, Rect::new(0, 0, 40, 10), true, TextAlign::TOP_RIGHT, false);
    let xs: Vec<i32> = lit(&s).iter().map(|p| p.x).collect();
    assert_eq!(xs.iter().max(), Some(&39));
    assert_eq!(xs.iter().min(), Some(&35));
}
