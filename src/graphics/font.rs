// =============================================================================
// FONT.RS — 1bpp bitmap fonts
//
// Glyphs are stored column-major: `char_w` bytes per character, one byte per
// column, bit 0 at the top. The table covers ASCII 32..=126; anything else is
// drawn as '?'.
// =============================================================================

use std::borrow::Cow;

pub const FIRST_CHAR: u8 = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Plain,
    /// Hollow glyphs: the one-pixel ring around each plain glyph.
    Outline,
}

#[derive(Clone, Debug)]
pub struct Font {
    pub data: Cow<'static, [u8]>,
    /// Columns stored per glyph.
    pub char_w: u8,
    pub char_h: u8,
    /// Extra pixels between lines.
    pub spacing_y: u8,
    /// Whether variable-width layout trims empty columns.
    pub char_w_variable: bool,
    pub style: FontStyle,
}

impl Font {
    /// Custom font from column data covering ASCII 32..=126.
    pub fn new(data: impl Into<Cow<'static, [u8]>>, char_w: u8, char_h: u8, spacing_y: u8) -> Self {
        Self {
            data: data.into(),
            char_w,
            char_h,
            spacing_y,
            char_w_variable: true,
            style: FontStyle::Plain,
        }
    }

    pub fn line_height(&self) -> i32 {
        self.glyph_height() + self.spacing_y as i32
    }

    pub fn glyph_height(&self) -> i32 {
        match self.style {
            FontStyle::Plain => self.char_h as i32,
            FontStyle::Outline => self.char_h as i32 + 2,
        }
    }

    fn raw_columns(&self, c: char) -> &[u8] {
        let code = match c {
            ' '..='~' => c as u8,
            _ => b'?',
        };
        let w = self.char_w as usize;
        let start = (code - FIRST_CHAR) as usize * w;
        self.data.get(start..start + w).unwrap_or(&[])
    }

    /// Columns to draw for `c`, bit 0 at the top. Variable layout drops the
    /// empty columns either side of the glyph.
    pub fn glyph_columns(&self, c: char, variable: bool) -> Vec<u16> {
        let mut cols: Vec<u16> = self.raw_columns(c).iter().map(|b| *b as u16).collect();

        if variable && self.char_w_variable {
            if c == ' ' {
                cols.truncate(3);
            } else {
                while cols.last() == Some(&0) {
                    cols.pop();
                }
                let lead = cols.iter().take_while(|b| **b == 0).count();
                cols.drain(..lead);
            }
        }

        match self.style {
            FontStyle::Plain => cols,
            FontStyle::Outline => outline(&cols),
        }
    }

    /// Horizontal advance for `c`, including the one-column gap.
    pub fn advance(&self, c: char, variable: bool) -> i32 {
        self.glyph_columns(c, variable).len() as i32 + 1
    }
}

/// Ring of pixels around `cols`, shifted one down and one right.
fn outline(cols: &[u16]) -> Vec<u16> {
    let shifted: Vec<u16> = cols.iter().map(|c| c << 1).collect();
    let n = shifted.len() + 2;
    let at = |i: isize| -> u16 {
        if i < 1 || i as usize > shifted.len() { 0 } else { shifted[i as usize - 1] }
    };
    (0..n as isize)
        .map(|i| {
            let mut grown = 0u16;
            for j in i - 1..=i + 1 {
                let c = at(j);
                grown |= c | (c << 1) | (c >> 1);
            }
            grown & !at(i)
        })
        .collect()
}

#[rustfmt::skip]
const GLYPHS_5X7: [u8; 95 * 5] = [
    0x00, 0x00, 0x00, 0x00, 0x00, // ' '
    0x00, 0x00, 0x5F, 0x00, 0x00, // !
    0x00, 0x07, 0x00, 0x07, 0x00, // "
    0x14, 0x7F, 0x14, 0x7F, 0x14, // #
    0x24, 0x2A, 0x7F, 0x2A, 0x12, // $
    0x23, 0x13, 0x08, 0x64, 0x62, // %
    0x36, 0x49, 0x55, 0x22, 0x50, // &
    0x00, 0x05, 0x03, 0x00, 0x00, // '
    0x00, 0x1C, 0x22, 0x41, 0x00, // (
    0x00, 0x41, 0x22, 0x1C, 0x00, // )
    0x08, 0x2A, 0x1C, 0x2A, 0x08, // *
    0x08, 0x08, 0x3E, 0x08, 0x08, // +
    0x00, 0x50, 0x30, 0x00, 0x00, // ,
    0x08, 0x08, 0x08, 0x08, 0x08, // -
    0x00, 0x60, 0x60, 0x00, 0x00, // .
    0x20, 0x10, 0x08, 0x04, 0x02, // /
    0x3E, 0x51, 0x49, 0x45, 0x3E, // 0
    0x00, 0x42, 0x7F, 0x40, 0x00, // 1
    0x42, 0x61, 0x51, 0x49, 0x46, // 2
    0x21, 0x41, 0x45, 0x4B, 0x31, // 3
    0x18, 0x14, 0x12, 0x7F, 0x10, // 4
    0x27, 0x45, 0x45, 0x45, 0x39, // 5
    0x3C, 0x4A, 0x49, 0x49, 0x30, // 6
    0x01, 0x71, 0x09, 0x05, 0x03, // 7
    0x36, 0x49, 0x49, 0x49, 0x36, // 8
    0x06, 0x49, 0x49, 0x29, 0x1E, // 9
    0x00, 0x36, 0x36, 0x00, 0x00, // :
    0x00, 0x56, 0x36, 0x00, 0x00, // ;
    0x00, 0x08, 0x14, 0x22, 0x41, // <
    0x14, 0x14, 0x14, 0x14, 0x14, // =
    0x41, 0x22, 0x14, 0x08, 0x00, // >
    0x02, 0x01, 0x51, 0x09, 0x06, // ?
    0x32, 0x49, 0x79, 0x41, 0x3E, // @
    0x7E, 0x11, 0x11, 0x11, 0x7E, // A
    0x7F, 0x49, 0x49, 0x49, 0x36, // B
    0x3E, 0x41, 0x41, 0x41, 0x22, // C
    0x7F, 0x41, 0x41, 0x22, 0x1C, // D
    0x7F, 0x49, 0x49, 0x49, 0x41, // E
    0x7F, 0x09, 0x09, 0x01, 0x01, // F
    0x3E, 0x41, 0x41, 0x51, 0x32, // G
    0x7F, 0x08, 0x08, 0x08, 0x7F, // H
    0x00, 0x41, 0x7F, 0x41, 0x00, // I
    0x20, 0x40, 0x41, 0x3F, 0x01, // J
    0x7F, 0x08, 0x14, 0x22, 0x41, // K
    0x7F, 0x40, 0x40, 0x40, 0x40, // L
    0x7F, 0x02, 0x04, 0x02, 0x7F, // M
    0x7F, 0x04, 0x08, 0x10, 0x7F, // N
    0x3E, 0x41, 0x41, 0x41, 0x3E, // O
    0x7F, 0x09, 0x09, 0x09, 0x06, // P
    0x3E, 0x41, 0x51, 0x21, 0x5E, // Q
    0x7F, 0x09, 0x19, 0x29, 0x46, // R
    0x46, 0x49, 0x49, 0x49, 0x31, // S
    0x01, 0x01, 0x7F, 0x01, 0x01, // T
    0x3F, 0x40, 0x40, 0x40, 0x3F, // U
    0x1F, 0x20, 0x40, 0x20, 0x1F, // V
    0x7F, 0x20, 0x18, 0x20, 0x7F, // W
    0x63, 0x14, 0x08, 0x14, 0x63, // X
    0x03, 0x04, 0x78, 0x04, 0x03, // Y
    0x61, 0x51, 0x49, 0x45, 0x43, // Z
    0x00, 0x00, 0x7F, 0x41, 0x41, // [
    0x02, 0x04, 0x08, 0x10, 0x20, // backslash
    0x41, 0x41, 0x7F, 0x00, 0x00, // ]
    0x04, 0x02, 0x01, 0x02, 0x04, // ^
    0x40, 0x40, 0x40, 0x40, 0x40, // _
    0x00, 0x01, 0x02, 0x04, 0x00, // `
    0x20, 0x54, 0x54, 0x54, 0x78, // a
    0x7F, 0x48, 0x44, 0x44, 0x38, // b
    0x38, 0x44, 0x44, 0x44, 0x20, // c
    0x38, 0x44, 0x44, 0x48, 0x7F, // d
    0x38, 0x54, 0x54, 0x54, 0x18, // e
    0x08, 0x7E, 0x09, 0x01, 0x02, // f
    0x08, 0x14, 0x54, 0x54, 0x3C, // g
    0x7F, 0x08, 0x04, 0x04, 0x78, // h
    0x00, 0x44, 0x7D, 0x40, 0x00, // i
    0x20, 0x40, 0x44, 0x3D, 0x00, // j
    0x00, 0x7F, 0x10, 0x28, 0x44, // k
    0x00, 0x41, 0x7F, 0x40, 0x00, // l
    0x7C, 0x04, 0x18, 0x04, 0x78, // m
    0x7C, 0x08, 0x04, 0x04, 0x78, // n
    0x38, 0x44, 0x44, 0x44, 0x38, // o
    0x7C, 0x14, 0x14, 0x14, 0x08, // p
    0x08, 0x14, 0x14, 0x18, 0x7C, // q
    0x7C, 0x08, 0x04, 0x04, 0x08, // r
    0x48, 0x54, 0x54, 0x54, 0x20, // s
    0x04, 0x3F, 0x44, 0x40, 0x20, // t
    0x3C, 0x40, 0x40, 0x20, 0x7C, // u
    0x1C, 0x20, 0x40, 0x20, 0x1C, // v
    0x3C, 0x40, 0x30, 0x40, 0x3C, // w
    0x44, 0x28, 0x10, 0x28, 0x44, // x
    0x0C, 0x50, 0x50, 0x50, 0x3C, // y
    0x44, 0x64, 0x54, 0x4C, 0x44, // z
    0x00, 0x08, 0x36, 0x41, 0x00, // {
    0x00, 0x00, 0x7F, 0x00, 0x00, // |
    0x00, 0x41, 0x36, 0x08, 0x00, // }
    0x08, 0x04, 0x08, 0x10, 0x08, // ~
];

pub const MINIMAL_FONT: Font = Font {
    data: Cow::Borrowed(&GLYPHS_5X7),
    char_w: 5,
    char_h: 7,
    spacing_y: 2,
    char_w_variable: true,
    style: FontStyle::Plain,
};

/// Hollow version of the minimal font, monospaced.
pub const OUTLINE_FONT: Font = Font {
    data: Cow::Borrowed(&GLYPHS_5X7),
    char_w: 5,
    char_h: 7,
    spacing_y: 1,
    char_w_variable: false,
    style: FontStyle::Outline,
};
