//! Motion primitives for Orbfield
//! Spring/friction presets, easing curves and the coordinate helpers shared
//! by every shape generator.

use std::f32::consts::{PI, TAU};

// ============================================================================
// Spring / friction presets
// ============================================================================
// Spring is the per-frame pull toward the target, friction the per-frame
// velocity multiplier. Generators may raise spring or lower friction for
// audio emphasis but never below these floors.

pub const SPRING_SOFT: f32 = 0.018;
pub const SPRING_GENTLE: f32 = 0.032;
pub const SPRING_MEDIUM: f32 = 0.055;
pub const SPRING_SNAPPY: f32 = 0.095;
pub const SPRING_STIFF: f32 = 0.14;

pub const FRICTION_DRIFT: f32 = 0.955;
pub const FRICTION_LOOSE: f32 = 0.92;
pub const FRICTION_STANDARD: f32 = 0.88;
pub const FRICTION_TIGHT: f32 = 0.84;

/// Golden angle in radians, used for even spiral coverage on discs and
/// spheres without pole clustering.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

// ============================================================================
// Scalar helpers
// ============================================================================

pub fn clamp01(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-in-out over [0, 1]. Outside the range the curve is clamped.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Deterministic per-index noise in [0, 1). Generators are pure functions so
/// they cannot own an RNG; this is the usual fract(sin(n)) construction.
pub fn hash01(index: usize, salt: u32) -> f32 {
    let n = index as f32 * 127.1 + salt as f32 * 311.7;
    let s = (n.sin() * 43_758.547).abs();
    s - s.floor()
}

/// Signed variant of [`hash01`], in [-1, 1).
pub fn hash_signed(index: usize, salt: u32) -> f32 {
    hash01(index, salt) * 2.0 - 1.0
}

// ============================================================================
// Coordinate helpers
// ============================================================================

pub fn surface_center(width: f32, height: f32) -> (f32, f32) {
    (width / 2.0, height / 2.0)
}

/// Unit-sphere point for particle `index` of `total` on a golden-angle
/// spiral. Returns (x, y, z) with y as the vertical axis; coverage is even
/// across the sphere with no clustering at the poles.
pub fn sphere_point(index: usize, total: usize) -> (f32, f32, f32) {
    let n = total.max(1) as f32;
    let y = 1.0 - 2.0 * (index as f32 + 0.5) / n;
    let ring = (1.0 - y * y).max(0.0).sqrt();
    let theta = GOLDEN_ANGLE * index as f32;
    (theta.cos() * ring, y, theta.sin() * ring)
}

/// Spherical coordinates (latitude, longitude) in radians for the same
/// golden-angle point. Latitude is in [-PI/2, PI/2], longitude in [0, TAU).
pub fn sphere_lat_lon(index: usize, total: usize) -> (f32, f32) {
    let (x, y, z) = sphere_point(index, total);
    let lat = y.asin();
    let lon = z.atan2(x).rem_euclid(TAU);
    (lat, lon)
}

/// Project a unit-sphere point rotated by `spin` radians around the vertical
/// axis onto the screen. Returns (sx, sy, depth) where depth is in [0, 1]
/// (0 = farthest, 1 = nearest).
pub fn project_sphere(
    x: f32,
    y: f32,
    z: f32,
    spin: f32,
    cx: f32,
    cy: f32,
    radius: f32,
) -> (f32, f32, f32) {
    let (rx, rz) = (
        x * spin.cos() - z * spin.sin(),
        x * spin.sin() + z * spin.cos(),
    );
    // Slight forward tilt so both poles stay visible.
    let tilt = 0.35_f32;
    let (ty, tz) = (
        y * tilt.cos() - rz * tilt.sin(),
        y * tilt.sin() + rz * tilt.cos(),
    );
    let depth = (tz + 1.0) / 2.0;
    (cx + rx * radius, cy - ty * radius, depth)
}

/// Point `t` in [0, 1] along the great-circle arc between two (lat, lon)
/// pairs, via normalized-vector slerp. Degenerate (antipodal or identical)
/// inputs fall back to linear interpolation.
pub fn great_arc_point(from: (f32, f32), to: (f32, f32), t: f32) -> (f32, f32, f32) {
    let a = lat_lon_to_unit(from.0, from.1);
    let b = lat_lon_to_unit(to.0, to.1);
    let dot = (a.0 * b.0 + a.1 * b.1 + a.2 * b.2).clamp(-1.0, 1.0);
    let omega = dot.acos();
    if omega < 1e-4 || (PI - omega) < 1e-4 {
        let x = lerp(a.0, b.0, t);
        let y = lerp(a.1, b.1, t);
        let z = lerp(a.2, b.2, t);
        let len = (x * x + y * y + z * z).sqrt().max(1e-6);
        return (x / len, y / len, z / len);
    }
    let sin_omega = omega.sin();
    let wa = ((1.0 - t) * omega).sin() / sin_omega;
    let wb = (t * omega).sin() / sin_omega;
    (
        a.0 * wa + b.0 * wb,
        a.1 * wa + b.1 * wb,
        a.2 * wa + b.2 * wb,
    )
}

pub fn lat_lon_to_unit(lat: f32, lon: f32) -> (f32, f32, f32) {
    (
        lat.cos() * lon.cos(),
        lat.sin(),
        lat.cos() * lon.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_hits_boundaries_exactly() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease_in_out_cubic(i as f32 / 100.0);
            assert!(v >= prev, "easing decreased at step {}", i);
            prev = v;
        }
    }

    #[test]
    fn hash_is_deterministic_and_bounded() {
        for i in 0..500 {
            let a = hash01(i, 7);
            let b = hash01(i, 7);
            assert_eq!(a, b);
            assert!((0.0..1.0).contains(&a), "hash01 out of range: {}", a);
        }
    }

    #[test]
    fn sphere_points_sit_on_unit_sphere() {
        for i in 0..256 {
            let (x, y, z) = sphere_point(i, 256);
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 1.0).abs() < 1e-4, "radius {} at index {}", r, i);
        }
    }

    #[test]
    fn great_arc_endpoints_match_inputs() {
        let from = (0.3_f32, 1.2_f32);
        let to = (-0.7_f32, 4.0_f32);
        let start = great_arc_point(from, to, 0.0);
        let expect = lat_lon_to_unit(from.0, from.1);
        assert!((start.0 - expect.0).abs() < 1e-4);
        assert!((start.1 - expect.1).abs() < 1e-4);
        let end = great_arc_point(from, to, 1.0);
        let expect = lat_lon_to_unit(to.0, to.1);
        assert!((end.2 - expect.2).abs() < 1e-4);
    }

    #[test]
    fn clamp01_swallows_nan() {
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(7.5), 1.0);
    }
}
