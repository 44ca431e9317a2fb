// =============================================================================
// TYPES — integer geometry plus the glam vector/matrix types
//
// Screen-space code works in whole pixels (`Point`, `Size`, `Rect`); anything
// that needs sub-pixel precision or affine transforms uses glam.
// =============================================================================

mod point;
mod rect;

pub use glam::{Mat3, Mat4, Vec2, Vec3};
pub use point::{Point, Size};
pub use rect::Rect;

// ── Mat3 helpers ──────────────────────────────────────────────────────────────

/// Rotation by `radians` about the origin.
///
/// Screen space is y-down, so a positive angle turns clockwise on screen.
pub fn mat3_rotation(radians: f32) -> Mat3 {
    Mat3::from_angle(radians)
}

/// Translation by `v`.
pub fn mat3_translation(v: Vec2) -> Mat3 {
    Mat3::from_translation(v)
}

/// Non-uniform scale by `v`.
pub fn mat3_scale(v: Vec2) -> Mat3 {
    Mat3::from_scale(v)
}

/// Apply a 2D affine transform to a point.
#[inline]
pub fn transform_point(m: &Mat3, p: Vec2) -> Vec2 {
    m.transform_point2(p)
}

/// Translation component of a 2D affine transform.
#[inline]
pub fn mat3_translation_of(m: &Mat3) -> Vec2 {
    Vec2::new(m.z_axis.x, m.z_axis.y)
}
