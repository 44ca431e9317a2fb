// =============================================================================
// PRIMITIVE.RS — filled shapes and lines drawn with the current pen
// =============================================================================

use super::surface::Surface;
use crate::types::{Point, Rect};

/// Twice the signed area of the triangle `p1 p2 p3`; positive when the points
/// wind clockwise on a y-down screen.
#[inline]
pub fn orient2d(p1: Point, p2: Point, p3: Point) -> i32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// Top or left edge test for the fill rule.
#[inline]
fn is_top_left(p1: Point, p2: Point) -> bool {
    (p1.y == p2.y && p1.x > p2.x) || p1.y < p2.y
}

impl Surface {
    /// Fill the clip rectangle with the pen.
    pub fn clear(&mut self) {
        let clip = self.clip;
        self.rectangle(clip);
    }

    pub fn rectangle(&mut self, r: Rect) {
        let cr = self.clip.intersection(&r);
        if cr.empty() {
            return;
        }
        let mut o = self.offset(cr.x, cr.y);
        for _ in 0..cr.h {
            self.pen_span(o, cr.w as usize);
            o += self.bounds.w as usize;
        }
    }

    pub fn pixel(&mut self, p: Point) {
        if !self.clip.contains(p) {
            return;
        }
        let o = self.offset_of(p);
        self.pen_span(o, 1);
    }

    /// Horizontal run of `count` pixels starting at `p`.
    pub fn h_span(&mut self, mut p: Point, mut count: i32) {
        let clip = self.clip;
        if p.y < clip.y || p.y >= clip.y + clip.h {
            return;
        }
        if p.x < clip.x {
            count -= clip.x - p.x;
            p.x = clip.x;
        }
        if p.x + count > clip.x + clip.w {
            count = clip.x + clip.w - p.x;
        }
        if count > 0 {
            let o = self.offset_of(p);
            self.pen_span(o, count as usize);
        }
    }

    /// Vertical run of `count` pixels starting at `p`.
    pub fn v_span(&mut self, mut p: Point, mut count: i32) {
        let clip = self.clip;
        if p.x < clip.x || p.x >= clip.x + clip.w {
            return;
        }
        if p.y < clip.y {
            count -= clip.y - p.y;
            p.y = clip.y;
        }
        if p.y + count > clip.y + clip.h {
            count = clip.y + clip.h - p.y;
        }
        for _ in 0..count.max(0) {
            let o = self.offset_of(p);
            self.pen_span(o, 1);
            p.y += 1;
        }
    }

    /// Filled circle (midpoint algorithm, one span per row).
    pub fn circle(&mut self, c: Point, r: i32) {
        if r < 0 || !self.clip.intersects(&Rect::new(c.x - r, c.y - r, r * 2 + 1, r * 2 + 1)) {
            return;
        }

        let (mut x, mut y, mut err) = (r, 0, -r);
        while x >= y {
            let last_y = y;

            err += y;
            y += 1;
            err += y;

            self.h_span(Point::new(c.x - x, c.y + last_y), x * 2);
            if last_y != 0 {
                self.h_span(Point::new(c.x - x, c.y - last_y), x * 2);
            }

            if err >= 0 && x != last_y {
                self.h_span(Point::new(c.x - last_y, c.y + x), last_y * 2);
                if x != 0 {
                    self.h_span(Point::new(c.x - last_y, c.y - x), last_y * 2);
                }
                err -= x;
                x -= 1;
                err -= x;
            }
        }
    }

    /// Filled axis-aligned ellipse with radii `rx`, `ry`.
    pub fn ellipse(&mut self, c: Point, rx: i32, ry: i32) {
        if rx < 0 || ry < 0 {
            return;
        }
        if ry == 0 {
            self.h_span(Point::new(c.x - rx, c.y), rx * 2 + 1);
            return;
        }
        let ry2 = (ry * ry) as f32;
        for dy in -ry..=ry {
            let half = (rx as f32 * (1.0 - (dy * dy) as f32 / ry2).max(0.0).sqrt()).round() as i32;
            self.h_span(Point::new(c.x - half, c.y + dy), half * 2 + 1);
        }
    }

    /// Bresenham line, both endpoints included.
    pub fn line(&mut self, p1: Point, p2: Point) {
        let dx = (p2.x - p1.x).abs();
        let dy = -(p2.y - p1.y).abs();
        let sx = if p1.x < p2.x { 1 } else { -1 };
        let sy = if p1.y < p2.y { 1 } else { -1 };
        let mut err = dx + dy;
        let mut p = p1;

        loop {
            self.pixel(p);
            if p == p2 {
                break;
            }
            let e2 = err * 2;
            if e2 >= dy {
                err += dy;
                p.x += sx;
            }
            if e2 <= dx {
                err += dx;
                p.y += sy;
            }
        }
    }

    /// Filled triangle using edge functions with a top-left fill rule, so
    /// triangles sharing an edge never overdraw.
    pub fn triangle(&mut self, mut p1: Point, p2: Point, mut p3: Point) {
        let tl = Point::new(p1.x.min(p2.x).min(p3.x), p1.y.min(p2.y).min(p3.y));
        let br = Point::new(p1.x.max(p2.x).max(p3.x), p1.y.max(p2.y).max(p3.y));

        let mut mclip = self.clip;
        mclip.w -= 1;
        mclip.h -= 1;
        let b = mclip.intersection(&Rect::from_corners(tl, br));
        if b.empty() {
            return;
        }

        if orient2d(p1, p2, p3) < 0 {
            std::mem::swap(&mut p1, &mut p3);
        }

        let bias0 = if is_top_left(p2, p3) { 0 } else { -1 };
        let bias1 = if is_top_left(p3, p1) { 0 } else { -1 };
        let bias2 = if is_top_left(p1, p2) { 0 } else { -1 };

        let (a01, b01) = (p1.y - p2.y, p2.x - p1.x);
        let (a12, b12) = (p2.y - p3.y, p3.x - p2.x);
        let (a20, b20) = (p3.y - p1.y, p1.x - p3.x);

        let origin = Point::new(b.x, b.y);
        let mut w0row = orient2d(p2, p3, origin) + bias0;
        let mut w1row = orient2d(p3, p1, origin) + bias1;
        let mut w2row = orient2d(p1, p2, origin) + bias2;

        for y in b.y..=b.y + b.h {
            let (mut w0, mut w1, mut w2) = (w0row, w1row, w2row);
            for x in b.x..=b.x + b.w {
                if (w0 | w1 | w2) >= 0 {
                    let o = self.offset(x, y);
                    self.pen_span(o, 1);
                }
                w0 += a12;
                w1 += a20;
                w2 += a01;
            }
            w0row += b12;
            w1row += b20;
            w2row += b01;
        }
    }

    /// Filled polygon (even-odd scanline fill).
    pub fn polygon(&mut self, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let clip = self.clip;
        let miny = points.iter().map(|p| p.y).min().unwrap_or(0);
        let maxy = points.iter().map(|p| p.y).max().unwrap_or(0);

        let (left, right) = (clip.x, clip.x + clip.w - 1);
        let mut nodes: Vec<i32> = Vec::with_capacity(points.len());
        for y in miny.max(clip.y)..=maxy.min(clip.y + clip.h - 1) {
            nodes.clear();
            for (i, s) in points.iter().enumerate() {
                let e = points[(i + 1) % points.len()];
                if (s.y < y && e.y >= y) || (e.y < y && s.y >= y) {
                    let px = s.x as f32 + (y - s.y) as f32 / (e.y - s.y) as f32 * (e.x - s.x) as f32;
                    nodes.push(px as i32);
                }
            }
            nodes.sort_unstable();
            for pair in nodes.chunks_exact(2) {
                // spans wholly outside the clip would clamp onto its edge column
                if pair[1] < left || pair[0] > right {
                    continue;
                }
                let (x0, x1) = (pair[0].max(left), pair[1].min(right));
                self.h_span(Point::new(x0, y), x1 - x0 + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Pen, PixelFormat};
    use crate::types::Size;

    fn canvas() -> Surface {
        let mut s = Surface::new(PixelFormat::Rgb, Size::new(32, 32));
        s.pen = Pen::rgb(255, 255, 255);
        s
    }

    fn lit(s: &Surface) -> usize {
        (0..s.bounds.h)
            .flat_map(|y| (0..s.bounds.w).map(move |x| Point::new(x, y)))
            .filter(|p| s.get_pixel(*p).r == 255)
            .count()
    }

    #[test]
    fn orient2d_sign_follows_winding() {
        let (a, b, c) = (Point::new(0, 0), Point::new(10, 0), Point::new(0, 10));
        assert!(orient2d(a, b, c) > 0);
        assert!(orient2d(a, c, b) < 0);
    }

    #[test]
    fn h_span_clamps_to_clip() {
        let mut s = canvas();
        s.set_clip(Rect::new(4, 0, 8, 32));
        s.h_span(Point::new(-10, 3), 100);
        assert_eq!(lit(&s), 8);
    }

    #[test]
    fn line_includes_both_endpoints() {
        let mut s = canvas();
        s.line(Point::new(2, 2), Point::new(9, 5));
        assert_eq!(s.get_pixel(Point::new(2, 2)).r, 255);
        assert_eq!(s.get_pixel(Point::new(9, 5)).r, 255);
        assert_eq!(lit(&s), 8);
    }

    #[test]
    fn adjacent_triangles_do_not_overlap() {
        let mut a = canvas();
        a.triangle(Point::new(0, 0), Point::new(20, 0), Point::new(0, 20));
        let first = lit(&a);
        a.triangle(Point::new(20, 0), Point::new(20, 20), Point::new(0, 20));
        let both = lit(&a);

        let mut b = canvas();
        b.triangle(Point::new(20, 0), Point::new(20, 20), Point::new(0, 20));
        assert_eq!(first + lit(&b), both);
    }

    #[test]
    fn polygon_square_fills_rows() {
        let mut s = canvas();
        s.polygon(&[Point::new(4, 4), Point::new(12, 4), Point::new(12, 12), Point::new(4, 12)]);
        assert_eq!(s.get_pixel(Point::new(8, 8)).r, 255);
        assert_eq!(s.get_pixel(Point::new(2, 8)).r, 0);
    }

    #[test]
    fn polygon_outside_the_clip_draws_nothing() {
        let mut s = canvas();
        s.set_clip(Rect::new(10, 0, 10, 32));
        let square = |x: i32| [Point::new(x, 4), Point::new(x + 6, 4), Point::new(x + 6, 12), Point::new(x, 12)];
        s.polygon(&square(0));
        s.polygon(&square(22));
        assert_eq!(lit(&s), 0);

        // straddling the left edge fills from the edge inwards
        s.polygon(&square(6));
        assert_eq!(s.get_pixel(Point::new(10, 8)).r, 255);
        assert_eq!(s.get_pixel(Point::new(9, 8)).r, 0);
    }
}
