use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use glam::Vec2;

// ── Point ─────────────────────────────────────────────────────────────────────

/// Integer pixel coordinate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> i32 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) { self.x += rhs.x; self.y += rhs.y; }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) { self.x -= rhs.x; self.y -= rhs.y; }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point { Point::new(-self.x, -self.y) }
}

impl Mul<i32> for Point {
    type Output = Point;
    fn mul(self, rhs: i32) -> Point { Point::new(self.x * rhs, self.y * rhs) }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new((self.x as f32 * rhs) as i32, (self.y as f32 * rhs) as i32)
    }
}

impl Mul<Point> for Point {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point { Point::new(self.x * rhs.x, self.y * rhs.y) }
}

impl Div<i32> for Point {
    type Output = Point;
    fn div(self, rhs: i32) -> Point { Point::new(self.x / rhs, self.y / rhs) }
}

/// Truncates toward zero.
impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self { Point::new(v.x as i32, v.y as i32) }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self { Vec2::new(p.x as f32, p.y as f32) }
}

// ── Size ──────────────────────────────────────────────────────────────────────

/// Integer width/height pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub const fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> i32 {
        self.w * self.h
    }

    /// True when either dimension is zero or negative.
    pub fn empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// True when `p` lies inside `[0, w) × [0, h)`.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.w && p.y < self.h
    }
}

impl Mul<f32> for Size {
    type Output = Size;
    fn mul(self, rhs: f32) -> Size {
        Size::new((self.w as f32 * rhs) as i32, (self.h as f32 * rhs) as i32)
    }
}

impl Mul<i32> for Size {
    type Output = Size;
    fn mul(self, rhs: i32) -> Size { Size::new(self.w * rhs, self.h * rhs) }
}

impl Div<i32> for Size {
    type Output = Size;
    fn div(self, rhs: i32) -> Size { Size::new(self.w / rhs, self.h / rhs) }
}
