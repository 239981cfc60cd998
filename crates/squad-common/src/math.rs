//! 2D vector helpers.
//!
//! Arithmetic (add/sub/scale/length/normalize) comes straight from
//! [`glam::Vec2`]; this module adds the handful of helpers the simulation
//! uses repeatedly.

pub use glam::Vec2;

/// Threshold below which a vector is treated as zero.
pub const EPSILON: f32 = 1e-6;

/// Distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit vector pointing from `from` to `to`, or zero when they coincide.
#[must_use]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Unit vector for an angle in radians (0 = +X, counter-clockwise in math space).
#[must_use]
pub fn unit_from_angle(radians: f32) -> Vec2 {
    Vec2::new(radians.cos(), radians.sin())
}

/// Point at `radius` from `center` along `radians`.
#[must_use]
pub fn point_on_circle(center: Vec2, radians: f32, radius: f32) -> Vec2 {
    center + unit_from_angle(radians) * radius
}

/// Cosine of half a field-of-view angle given in degrees.
///
/// Comparing a dot product against this value replaces an `acos` call.
#[must_use]
pub fn half_angle_cos(fov_degrees: f32) -> f32 {
    (fov_degrees.to_radians() * 0.5).cos()
}

/// True when the L1 norm of `v` is at most `epsilon`.
#[must_use]
pub fn is_near_zero(v: Vec2, epsilon: f32) -> bool {
    v.x.abs() + v.y.abs() <= epsilon
}

/// Moves `current` toward `target` by `rate * dt` of the remaining gap.
///
/// The blend factor saturates at 1, so a long frame snaps to the target
/// instead of overshooting it.
#[must_use]
pub fn approach(current: Vec2, target: Vec2, rate: f32, dt: f32) -> Vec2 {
    let t = (rate * dt).clamp(0.0, 1.0);
    current + (target - current) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direction_zero_when_coincident() {
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(direction(p, p), Vec2::ZERO);
    }

    #[test]
    fn test_direction_is_unit() {
        let d = direction(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert!((d.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_half_angle_cos() {
        assert!((half_angle_cos(90.0) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((half_angle_cos(360.0) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_on_circle() {
        let p = point_on_circle(Vec2::new(10.0, 10.0), 0.0, 5.0);
        assert!((p - Vec2::new(15.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_is_near_zero() {
        assert!(is_near_zero(Vec2::new(0.004, -0.005), 0.01));
        assert!(!is_near_zero(Vec2::new(0.02, 0.0), 0.01));
    }

    #[test]
    fn test_approach_saturates() {
        let v = approach(Vec2::ZERO, Vec2::new(10.0, 0.0), 6.0, 1.0);
        assert_eq!(v, Vec2::new(10.0, 0.0));
        let half = approach(Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0, 0.1);
        assert!((half.x - 5.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_direction_unit_or_zero(ax in -1e3f32..1e3, ay in -1e3f32..1e3, bx in -1e3f32..1e3, by in -1e3f32..1e3) {
            let d = direction(Vec2::new(ax, ay), Vec2::new(bx, by));
            let len = d.length();
            prop_assert!(len == 0.0 || (len - 1.0).abs() < 1e-4);
        }
    }
}
