// =============================================================================
// MODE7.RS — perspective floor rendering
//
// The camera sits at `pos` looking along `angle` (0 = world up, -y). Each
// screen row below the top of the viewport maps to a line across the floor
// at distance `(far - near) / (row - viewport.y) + near`, spanning the field
// of view from left to right.
// =============================================================================

use super::surface::Surface;
use super::tilemap::TileLayer;
use crate::math::{lerp, lerp_vec2};
use crate::types::{Point, Rect, Vec2, mat3_rotation};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mode7Camera {
    /// Horizontal field of view in radians.
    pub fov: f32,
    pub angle: f32,
    pub pos: Vec2,
    pub near: f32,
    pub far: f32,
    pub viewport: Rect,
}

impl Mode7Camera {
    fn forward(&self) -> Vec2 {
        mat3_rotation(self.angle).transform_vector2(Vec2::new(0.0, -1.0))
    }

    fn edges(&self) -> (Vec2, Vec2) {
        let f = self.forward();
        let half = self.fov / 2.0;
        (
            mat3_rotation(half).transform_vector2(f),
            mat3_rotation(-half).transform_vector2(f),
        )
    }

    /// Floor distance along the edge rays for a screen row.
    fn row_distance(&self, y: f32) -> f32 {
        (self.far - self.near) / (y - self.viewport.y as f32) + self.near
    }

    /// World point seen at screen position `s`.
    pub fn screen_to_world(&self, s: Vec2) -> Vec2 {
        let (left, right) = self.edges();
        let d = self.row_distance(s.y);
        let swc = self.pos + left * d;
        let ewc = self.pos + right * d;
        let vp = self.viewport;
        lerp_vec2(lerp(s.x, vp.x as f32, (vp.x + vp.w) as f32), swc, ewc)
    }

    fn edge_distance(&self, w: Vec2) -> f32 {
        (w - self.pos).dot(self.forward()) / (self.fov / 2.0).cos()
    }

    /// Screen position of world point `w`.
    pub fn world_to_screen(&self, w: Vec2) -> Vec2 {
        let (left, right) = self.edges();
        let d = self.edge_distance(w);
        let side = (right - left).normalize_or_zero();
        let half = d * (self.fov / 2.0).sin();
        let lateral = (w - self.pos).dot(side);
        let t = (lateral + half) / (2.0 * half);

        let vp = self.viewport;
        Vec2::new(
            vp.x as f32 + t * vp.w as f32,
            (self.far - self.near) / (d - self.near) + vp.y as f32,
        )
    }

    /// Screen pixels per world unit at `w`.
    pub fn world_to_screen_scale(&self, w: Vec2) -> f32 {
        let d = self.edge_distance(w);
        self.viewport.w as f32 / (2.0 * d * (self.fov / 2.0).sin())
    }
}

/// Draw `layer` as a floor seen through `camera`. The first row of the
/// viewport is the horizon and stays untouched.
pub fn mode7(dest: &mut Surface, layer: &TileLayer, camera: &Mode7Camera) {
    let vp = camera.viewport;
    let area = dest.clip.intersection(&vp);
    if area.empty() {
        return;
    }
    for y in area.y.max(vp.y + 1)..area.y + area.h {
        let swc = camera.screen_to_world(Vec2::new(area.x as f32, y as f32));
        let ewc = camera.screen_to_world(Vec2::new((area.x + area.w) as f32, y as f32));
        layer.texture_span(dest, Point::new(area.x, y), area.w as u32, swc, ewc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Mode7Camera {
        Mode7Camera {
            fov: std::f32::consts::FRAC_PI_2,
            angle: 0.3,
            pos: Vec2::new(100.0, 200.0),
            near: 10.0,
            far: 200.0,
            viewport: Rect::new(0, 0, 160, 120),
        }
    }

    #[test]
    fn screen_world_round_trip() {
        let cam = camera();
        for s in [Vec2::new(80.0, 60.0), Vec2::new(10.0, 5.0), Vec2::new(150.0, 119.0)] {
            let back = cam.world_to_screen(cam.screen_to_world(s));
            assert!((back - s).length() < 0.01, "{s} came back as {back}");
        }
    }

    #[test]
    fn scale_shrinks_with_distance() {
        let cam = camera();
        let near = cam.screen_to_world(Vec2::new(80.0, 110.0));
        let far = cam.screen_to_world(Vec2::new(80.0, 5.0));
        assert!(cam.world_to_screen_scale(near) > cam.world_to_screen_scale(far));
    }
}
