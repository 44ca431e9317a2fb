// =============================================================================
// MATH.RS — scalar and vector interpolation helpers
// =============================================================================

use glam::Vec2;

/// Normalised position of `value` between `start` and `end` (unclamped).
#[inline]
pub fn lerp(value: f32, start: f32, end: f32) -> f32 {
    (value - start) / (end - start)
}

/// Map `value` from `[start, end]` onto `[min, max]`.
///
/// `value` is clamped to the input range first.
#[inline]
pub fn lerp_range(value: f32, start: f32, end: f32, min: f32, max: f32) -> f32 {
    let value = value.clamp(start.min(end), start.max(end));
    (value / (end - start)) * (max - min) + min
}

/// Vector form of [`lerp_range`].
#[inline]
pub fn lerp_range_vec2(value: f32, start: f32, end: f32, min: Vec2, max: Vec2) -> Vec2 {
    let value = value.clamp(start.min(end), start.max(end));
    (max - min) * (value / (end - start)) + min
}

/// Linear blend from `start` to `end` by `t`.
#[inline]
pub fn lerp_vec2(t: f32, start: Vec2, end: Vec2) -> Vec2 {
    (end - start) * t + start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_normalises() {
        assert!((lerp(5.0, 0.0, 10.0) - 0.5).abs() < 1e-6);
        assert!((lerp(15.0, 10.0, 20.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lerp_range_clamps_input() {
        assert!((lerp_range(20.0, 0.0, 10.0, 0.0, 100.0) - 100.0).abs() < 1e-4);
        assert!((lerp_range(-5.0, 0.0, 10.0, 0.0, 100.0)).abs() < 1e-4);
        assert!((lerp_range(2.5, 0.0, 10.0, 0.0, 100.0) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn vec2_lerp_midpoint() {
        let v = lerp_vec2(0.5, Vec2::ZERO, Vec2::new(4.0, -2.0));
        assert_eq!(v, Vec2::new(2.0, -1.0));
    }
}
