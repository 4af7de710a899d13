//! Spinning globe: particles on a golden-angle sphere, classified land or
//! ocean by a fixed low-resolution equirectangular bitmask. Each particle's
//! spherical anchor never changes, so its classification is stable; only the
//! projection rotates with time.

use std::f32::consts::{PI, TAU};

use crate::motion::{
    great_arc_point, hash01, project_sphere, sphere_lat_lon, sphere_point, FRICTION_STANDARD,
    SPRING_MEDIUM, SPRING_SNAPPY,
};
use crate::shapes::{ShapeContext, ShapeResult};

/// Radians per second of eastward spin.
const GLOBE_SPIN: f32 = 0.18;
/// Fraction of the batch lent to the route arc when one is set.
const ROUTE_FRAC: f32 = 0.12;

const MASK_COLS: usize = 32;
const MASK_ROWS: usize = 16;

/// 32x16 equirectangular landmask, one u32 per latitude band from 90N down
/// to 90S. The leftmost bit is longitude -180. Coarse, but it reads as Earth
/// once a few thousand particles light it up.
static LANDMASK: [u32; MASK_ROWS] = [
    0b00000001_11001000_00001111_00000000, // arctic islands
    0b00000111_11111100_11111111_11111000, // Canada, Greenland, Siberia
    0b11101111_11100011_11111111_11111000, // Alaska through Russia
    0b00011111_11000011_11111111_11111000, // US-Canada border, Europe, steppe
    0b00001111_10000011_11111111_11111000, // US, Mediterranean, east Asia
    0b00000111_00000111_11111111_11100000, // Mexico, Sahara, India, China
    0b00000011_10000111_11110110_11100000, // Central America, Sahel, SE Asia
    0b00000000_11100111_11100000_11111000, // Amazon, Congo, Indonesia
    0b00000000_11110011_11100000_01111100, // Brazil, southern Africa, Papua
    0b00000000_11110011_11000000_00011100, // Andes, Namibia, north Australia
    0b00000000_01100001_10000000_00111110, // Chile, Cape, Australia
    0b00000000_01100000_00000000_00000001, // Patagonia, New Zealand
    0b00000000_01000000_00000000_00000000, // Tierra del Fuego
    0b00000000_00000000_00000000_00000000, // southern ocean
    0b11111111_11111111_11111111_11111111, // Antarctic coast
    0b11111111_11111111_11111111_11111111, // Antarctica
];

/// Sample the mask at spherical coordinates. `lat` in [-PI/2, PI/2], `lon`
/// in [0, TAU) with 0 at the mask's left edge.
pub fn land_at(lat: f32, lon: f32) -> bool {
    let row = ((PI / 2.0 - lat) / PI * MASK_ROWS as f32) as usize;
    let row = row.min(MASK_ROWS - 1);
    let col = (lon.rem_euclid(TAU) / TAU * MASK_COLS as f32) as usize;
    let col = col.min(MASK_COLS - 1);
    (LANDMASK[row] >> (MASK_COLS - 1 - col)) & 1 == 1
}

/// Degree-based lookup used for route endpoints and tests.
pub fn land_at_degrees(lat_deg: f32, lon_deg: f32) -> bool {
    land_at(
        lat_deg.to_radians(),
        ((lon_deg + 180.0) / 360.0 * TAU).rem_euclid(TAU),
    )
}

/// Classification of a sphere particle, independent of time.
pub fn is_land(index: usize, total: usize) -> bool {
    let (lat, lon) = sphere_lat_lon(index, total);
    land_at(lat, lon)
}

fn degrees_to_sphere(lat_deg: f32, lon_deg: f32) -> (f32, f32) {
    // Route longitudes are degrees east; line them up with the mask frame.
    (
        lat_deg.to_radians(),
        ((lon_deg + 180.0) / 360.0 * TAU).rem_euclid(TAU),
    )
}

pub fn globe(ctx: &ShapeContext) -> ShapeResult {
    let drive = ctx.drive();
    let (cx, cy) = ctx.center();
    let radius = ctx.min_dim() * 0.33 * (1.0 + drive * 0.06);
    let spin = ctx.time * GLOBE_SPIN;

    let route_n = if ctx.state.route.is_some() {
        (ctx.total as f32 * ROUTE_FRAC) as usize
    } else {
        0
    };
    let sphere_n = ctx.total.saturating_sub(route_n).max(1);

    if ctx.index >= sphere_n {
        // Route arc over the surface, with a pulse running along it.
        let route = ctx.state.route.as_ref().unwrap();
        let i = ctx.index - sphere_n;
        let u = (i as f32 + 0.5) / route_n.max(1) as f32;
        let from = degrees_to_sphere(route.from_lat, route.from_lon);
        let to = degrees_to_sphere(route.to_lat, route.to_lon);
        // The arc vector shares the sphere frame: y up, longitude 0 at +x.
        let (x, y, z) = great_arc_point(from, to, u);
        let (px, py, depth) = project_sphere(x, y, z, spin, cx, cy, radius * 1.04);

        let pulse_pos = (ctx.time * 0.25) % 1.0;
        let glow = (1.0 - ((u - pulse_pos).abs() * 12.0).min(1.0)).powi(2);
        let front = front_visibility(depth);

        return ShapeResult::new(px, py, SPRING_SNAPPY, FRICTION_STANDARD, 0.05)
            .with_alpha((0.5 + glow * 0.5) * front)
            .with_depth(0.9 + glow * 0.9);
    }

    let (x, y, z) = sphere_point(ctx.index, sphere_n);
    let land = is_land(ctx.index, sphere_n);
    let (px, py, depth) = project_sphere(x, y, z, spin, cx, cy, radius);
    let front = front_visibility(depth);

    let alpha = if land {
        (0.78 + drive * 0.2) * front
    } else {
        0.28 * front
    };
    let size = if land { 1.15 } else { 0.8 };
    // Far-side specks shrink a little further so the near face dominates.
    let back_shrink = if depth < 0.25 { 0.7 } else { 1.0 };

    ShapeResult::new(
        px,
        py,
        SPRING_MEDIUM + drive * 0.02,
        FRICTION_STANDARD,
        0.05,
    )
    .with_alpha(alpha)
    .with_depth(size * (0.55 + 0.65 * depth) * back_shrink)
}

/// Back-hemisphere particles fade almost out instead of vanishing, which
/// keeps the silhouette readable while the globe turns.
fn front_visibility(depth: f32) -> f32 {
    0.08 + 0.92 * depth.powf(1.6)
}
