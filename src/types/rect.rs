use std::ops::Mul;

use super::point::{Point, Size};

/// Axis-aligned integer rectangle. `contains` is half-open: the right and
/// bottom edges (`x + w`, `y + h`) lie outside.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_point_size(tl: Point, s: Size) -> Self {
        Self::new(tl.x, tl.y, s.w, s.h)
    }

    /// Rectangle spanning `tl` (inclusive) to `br` (exclusive).
    pub fn from_corners(tl: Point, br: Point) -> Self {
        Self::new(tl.x, tl.y, br.x - tl.x, br.y - tl.y)
    }

    pub fn size(&self) -> Size { Size::new(self.w, self.h) }
    pub fn area(&self) -> i32 { self.w * self.h }

    pub fn empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.w && p.y < self.y + self.h
    }

    /// True when `r` lies entirely inside `self`.
    pub fn contains_rect(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y
            && r.x + r.w <= self.x + self.w
            && r.y + r.h <= self.y + self.h
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.x + r.w || self.x + self.w <= r.x
            || self.y >= r.y + r.h || self.y + self.h <= r.y)
    }

    /// Overlapping area. Disjoint rectangles produce an empty rect with a
    /// zero width or height.
    pub fn intersection(&self, r: &Rect) -> Rect {
        let x = self.x.max(r.x);
        let y = self.y.max(r.y);
        let w = ((self.x + self.w).min(r.x + r.w) - x).max(0);
        let h = ((self.y + self.h).min(r.y + r.h) - y).max(0);
        Rect::new(x, y, w, h)
    }

    pub fn inflate(&mut self, v: i32) {
        self.x -= v;
        self.y -= v;
        self.w += 2 * v;
        self.h += 2 * v;
    }

    pub fn deflate(&mut self, v: i32) {
        self.inflate(-v);
    }

    /// Copy of `self` moved by `p`.
    pub fn offset(&self, p: Point) -> Rect {
        Rect::new(self.x + p.x, self.y + p.y, self.w, self.h)
    }

    /// Clamp `p` into the rectangle, edges inclusive.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.x, self.x + self.w.max(0)),
            p.y.clamp(self.y, self.y + self.h.max(0)),
        )
    }

    pub fn tl(&self) -> Point { Point::new(self.x, self.y) }
    pub fn tr(&self) -> Point { Point::new(self.x + self.w, self.y) }
    pub fn bl(&self) -> Point { Point::new(self.x, self.y + self.h) }
    pub fn br(&self) -> Point { Point::new(self.x + self.w, self.y + self.h) }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }
}

impl Mul<f32> for Rect {
    type Output = Rect;
    fn mul(self, a: f32) -> Rect {
        Rect::new(
            (self.x as f32 * a) as i32,
            (self.y as f32 * a) as i32,
            (self.w as f32 * a) as i32,
            (self.h as f32 * a) as i32,
        )
    }
}

impl From<Size> for Rect {
    fn from(s: Size) -> Self { Rect::new(0, 0, s.w, s.h) }
}
