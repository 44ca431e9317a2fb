// =============================================================================
// SPRITE.RS — drawing cells from the attached spritesheet
//
// A spritesheet is an ordinary surface divided into 8×8 cells, numbered
// left-to-right then top-to-bottom.
// =============================================================================

use std::sync::Arc;

use super::blit::SpriteTransform;
use super::image::ImageError;
use super::surface::Surface;
use crate::types::{Point, Rect, Size, Vec2};

pub const SPRITE_SIZE: i32 = 8;

/// What to draw from the sheet: a cell index, the cell at a cell
/// coordinate, or a block of cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteRef {
    Index(u16),
    Cell(Point),
    Block(Rect),
}

impl From<u16> for SpriteRef {
    fn from(i: u16) -> Self { SpriteRef::Index(i) }
}

impl From<Point> for SpriteRef {
    fn from(p: Point) -> Self { SpriteRef::Cell(p) }
}

impl From<Rect> for SpriteRef {
    fn from(r: Rect) -> Self { SpriteRef::Block(r) }
}

impl Surface {
    /// Attach a spritesheet decoded from packed image bytes.
    pub fn load_sprites(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        let sheet = Surface::load(bytes)?;
        self.set_sprites(Arc::new(sheet));
        Ok(())
    }

    /// Pixel rect of sprite `index` on the active sheet.
    pub fn sprite_bounds(&self, index: u16) -> Rect {
        let cols = self.sheet_cols();
        let i = index as i32;
        Rect::new((i % cols) * SPRITE_SIZE, (i / cols) * SPRITE_SIZE, SPRITE_SIZE, SPRITE_SIZE)
    }

    /// Pixel rect of a block of cells.
    pub fn sprite_bounds_rect(&self, cells: Rect) -> Rect {
        Rect::new(
            cells.x * SPRITE_SIZE,
            cells.y * SPRITE_SIZE,
            cells.w * SPRITE_SIZE,
            cells.h * SPRITE_SIZE,
        )
    }

    fn sheet_cols(&self) -> i32 {
        self.sprites.as_ref().map(|s| s.cols).unwrap_or(self.cols).max(1)
    }

    fn sprite_rect(&self, sprite: SpriteRef) -> Rect {
        match sprite {
            SpriteRef::Index(i) => self.sprite_bounds(i),
            SpriteRef::Cell(p) => Rect::new(p.x * SPRITE_SIZE, p.y * SPRITE_SIZE, SPRITE_SIZE, SPRITE_SIZE),
            SpriteRef::Block(r) => self.sprite_bounds_rect(r),
        }
    }

    /// Draw a sprite at `pos`. `origin` is in unscaled sprite pixels and is
    /// subtracted after scaling.
    pub fn sprite(
        &mut self,
        sprite: impl Into<SpriteRef>,
        pos: Point,
        origin: Point,
        scale: Vec2,
        t: SpriteTransform,
    ) {
        let Some(sheet) = self.sprites.clone() else {
            return;
        };
        let src = self.sprite_rect(sprite.into());

        if scale == Vec2::ONE {
            self.blit(&sheet, src, pos - origin, t);
            return;
        }

        let size = Surface::transformed_size(src.size(), t);
        let scaled = Size::new(
            (size.w as f32 * scale.x).round() as i32,
            (size.h as f32 * scale.y).round() as i32,
        );
        let o = Point::new(
            (origin.x as f32 * scale.x).round() as i32,
            (origin.y as f32 * scale.y).round() as i32,
        );
        let dest = Rect::from_point_size(pos - o, scaled);
        self.stretch_blit(&sheet, src, dest, t);
    }

    /// Unscaled, untransformed sprite with its top-left at `pos`.
    pub fn sprite_at(&mut self, sprite: impl Into<SpriteRef>, pos: Point) {
        self.sprite(sprite, pos, Point::ZERO, Vec2::ONE, SpriteTransform::NONE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Pen, PixelFormat};

    fn sheet() -> Arc<Surface> {
        let mut s = Surface::new(PixelFormat::Rgba, Size::new(32, 16));
        // sprite 1 is solid red, sprite 5 solid green
        s.pen = Pen::rgb(255, 0, 0);
        s.rectangle(Rect::new(8, 0, 8, 8));
        s.pen = Pen::rgb(0, 255, 0);
        s.rectangle(Rect::new(8, 8, 8, 8));
        Arc::new(s)
    }

    #[test]
    fn bounds_follow_sheet_columns() {
        let mut screen = Surface::new(PixelFormat::Rgb, Size::new(64, 64));
        screen.set_sprites(sheet());
        assert_eq!(screen.sprite_bounds(5), Rect::new(8, 8, 8, 8));
        assert_eq!(screen.sprite_bounds_rect(Rect::new(1, 0, 2, 2)), Rect::new(8, 0, 16, 16));
    }

    #[test]
    fn draws_indexed_sprite() {
        let mut screen = Surface::new(PixelFormat::Rgb, Size::new(64, 64));
        screen.set_sprites(sheet());
        screen.sprite_at(5u16, Point::new(10, 10));
        assert_eq!(screen.get_pixel(Point::new(10, 10)), Pen::rgb(0, 255, 0));
        assert_eq!(screen.get_pixel(Point::new(17, 17)), Pen::rgb(0, 255, 0));
        assert_eq!(screen.get_pixel(Point::new(18, 18)), Pen::rgb(0, 0, 0));
    }

    #[test]
    fn scaled_sprite_uses_scaled_origin() {
        let mut screen = Surface::new(PixelFormat::Rgb, Size::new(64, 64));
        screen.set_sprites(sheet());
        screen.sprite(1u16, Point::new(20, 20), Point::new(4, 4), Vec2::splat(2.0), SpriteTransform::NONE);
        // 16×16 red block centred on (20, 20)
        assert_eq!(screen.get_pixel(Point::new(12, 12)), Pen::rgb(255, 0, 0));
        assert_eq!(screen.get_pixel(Point::new(27, 27)), Pen::rgb(255, 0, 0));
        assert_eq!(screen.get_pixel(Point::new(28, 28)), Pen::rgb(0, 0, 0));
    }

    #[test]
    fn fractional_scale_rounds_size_and_origin() {
        let mut screen = Surface::new(PixelFormat::Rgb, Size::new(64, 64));
        screen.set_sprites(sheet());
        // 8 * 0.95 = 7.6 wide, origin 3 * 0.95 = 2.85
        screen.sprite(1u16, Point::new(20, 20), Point::new(3, 3), Vec2::splat(0.95), SpriteTransform::NONE);
        assert_eq!(screen.get_pixel(Point::new(17, 17)), Pen::rgb(255, 0, 0));
        assert_eq!(screen.get_pixel(Point::new(24, 24)), Pen::rgb(255, 0, 0));
        assert_eq!(screen.get_pixel(Point::new(16, 16)), Pen::rgb(0, 0, 0));
        assert_eq!(screen.get_pixel(Point::new(25, 25)), Pen::rgb(0, 0, 0));
    }

    #[test]
    fn no_sheet_draws_nothing() {
        let mut screen = Surface::new(PixelFormat::Rgb, Size::new(8, 8));
        screen.sprite_at(0u16, Point::ZERO);
        assert!(screen.data.iter().all(|b| *b == 0));
    }
}
