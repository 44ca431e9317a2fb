// =============================================================================
// TEXT.RS — drawing, measuring and wrapping bitmap text
// =============================================================================

use std::ops::BitOr;

use super::font::Font;
use super::surface::Surface;
use crate::types::{Point, Rect, Size};

/// Alignment of a text block inside its rect. Horizontal and vertical flags
/// combine with `|`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextAlign(pub u8);

impl TextAlign {
    pub const LEFT: Self = Self(0b0000);
    pub const CENTER_H: Self = Self(0b0100);
    pub const RIGHT: Self = Self(0b1000);
    pub const TOP: Self = Self(0b0000);
    pub const CENTER_V: Self = Self(0b0001);
    pub const BOTTOM: Self = Self(0b0010);

    pub const TOP_LEFT: Self = Self(0b0000);
    pub const TOP_CENTER: Self = Self(0b0100);
    pub const TOP_RIGHT: Self = Self(0b1000);
    pub const CENTER_LEFT: Self = Self(0b0001);
    pub const CENTER_CENTER: Self = Self(0b0101);
    pub const CENTER_RIGHT: Self = Self(0b1001);
    pub const BOTTOM_LEFT: Self = Self(0b0010);
    pub const BOTTOM_CENTER: Self = Self(0b0110);
    pub const BOTTOM_RIGHT: Self = Self(0b1010);

    fn has(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }
}

impl BitOr for TextAlign {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

fn line_width(line: &str, font: &Font, variable: bool) -> i32 {
    let w: i32 = line.chars().map(|c| font.advance(c, variable)).sum();
    // no trailing gap after the last glyph
    (w - 1).max(0)
}

/// Pixel size of `message` once laid out.
pub fn measure_text(message: &str, font: &Font, variable: bool) -> Size {
    if message.is_empty() {
        return Size::new(0, 0);
    }
    let lines: Vec<&str> = message.split('\n').collect();
    let w = lines.iter().map(|l| line_width(l, font, variable)).max().unwrap_or(0);
    let h = lines.len() as i32 * font.line_height() - font.spacing_y as i32;
    Size::new(w, h)
}

/// Insert line breaks so no line exceeds `width` pixels. With `words` the
/// breaks go at spaces where possible; otherwise anywhere.
pub fn wrap_text(message: &str, width: i32, font: &Font, variable: bool, words: bool) -> String {
    let mut out = String::with_capacity(message.len() + 8);

    for (n, para) in message.split('\n').enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let mut line = String::new();

        if words {
            for word in para.split(' ') {
                let candidate = if line.is_empty() { word.to_string() } else { format!("{line} {word}") };
                if !line.is_empty() && line_width(&candidate, font, variable) > width {
                    out.push_str(&line);
                    out.push('\n');
                    line = word.to_string();
                } else {
                    line = candidate;
                }
            }
        } else {
            for c in para.chars() {
                line.push(c);
                if line.chars().count() > 1 && line_width(&line, font, variable) > width {
                    line.pop();
                    out.push_str(&line);
                    out.push('\n');
                    line.clear();
                    line.push(c);
                }
            }
        }
        out.push_str(&line);
    }
    out
}

impl Surface {
    /// Draw `message` aligned inside `rect` with the current pen. A zero-size
    /// rect aligns around its top-left point. With `clip` the text is also
    /// clipped to `rect`.
    pub fn text(&mut self, message: &str, font: &Font, rect: Rect, variable: bool, align: TextAlign, clip: bool) {
        let saved_clip = self.clip;
        if clip {
            self.set_clip(saved_clip.intersection(&rect));
        }

        let block = measure_text(message, font, variable);
        let mut y = rect.y;
        if align.has(TextAlign::CENTER_V) {
            y += (rect.h - block.h) / 2;
        } else if align.has(TextAlign::BOTTOM) {
            y += rect.h - block.h;
        }

        for line in message.split('\n') {
            let lw = line_width(line, font, variable);
            let mut x = rect.x;
            if align.has(TextAlign::CENTER_H) {
                x += (rect.w - lw) / 2;
            } else if align.has(TextAlign::RIGHT) {
                x += rect.w - lw;
            }

            for c in line.chars() {
                let cols = font.glyph_columns(c, variable);
                // columns hold at most 16 rows
                for (cx, bits) in cols.iter().enumerate() {
                    for cy in 0..font.glyph_height().min(16) {
                        if bits & (1u16 << cy) != 0 {
                            self.pixel(Point::new(x + cx as i32, y + cy));
                        }
                    }
                }
                x += cols.len() as i32 + 1;
            }
            y += font.line_height();
        }

        self.clip = saved_clip;
    }

    /// Left-aligned text with its top-left at `p`.
    pub fn text_at(&mut self, message: &str, font: &Font, p: Point) {
        self.text(message, font, Rect::new(p.x, p.y, 0, 0), true, TextAlign::TOP_LEFT, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::font::MINIMAL_FONT;

    #[test]
    fn measure_counts_lines() {
        let one = measure_text("HI", &MINIMAL_FONT, false);
        assert_eq!(one, Size::new(11, 7));
        let two = measure_text("HI\nHI", &MINIMAL_FONT, false);
        assert_eq!(two.h, 7 * 2 + 2);
    }

    #[test]
    fn wrap_breaks_at_spaces() {
        let wrapped = wrap_text("aa bb cc", 30, &MINIMAL_FONT, false, true);
        assert_eq!(wrapped, "aa bb\ncc");
    }

    #[test]
    fn wrap_without_words_breaks_anywhere() {
        let wrapped = wrap_text("abcdef", 17, &MINIMAL_FONT, false, false);
        assert_eq!(wrapped, "abc\ndef");
    }

    #[test]
    fn align_flags_combine() {
        assert_eq!(TextAlign::BOTTOM | TextAlign::RIGHT, TextAlign::BOTTOM_RIGHT);
        assert_eq!(TextAlign::CENTER_V | TextAlign::CENTER_H, TextAlign::CENTER_CENTER);
    }
}
