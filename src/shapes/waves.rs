//! Flowing formations: traveling wave, layered ocean, spirals, the vortex
//! shear and concentric rings.

use std::f32::consts::TAU;

use crate::motion::{
    hash01, FRICTION_LOOSE, FRICTION_STANDARD, SPRING_GENTLE, SPRING_MEDIUM, SPRING_SNAPPY,
};
use crate::shapes::{ShapeContext, ShapeResult};

const OCEAN_LAYERS: usize = 3;
const RING_COUNT: usize = 4;
const SPIRAL_TURNS: f32 = 3.6;

/// Single sine ribbon across the full width. Amplitude rides the audio.
pub fn wave(ctx: &ShapeContext) -> ShapeResult {
    let drive = ctx.drive();
    let u = ctx.unit();
    let x = ctx.width * u;
    let k = TAU * 2.2 / ctx.width.max(1.0);
    let amp = ctx.height * 0.14 * (1.0 + drive * 0.9);
    let y = ctx.height / 2.0 + (x * k + ctx.time * 2.1).sin() * amp
        + (x * k * 2.7 - ctx.time * 1.3).sin() * amp * 0.22;

    ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.2 + drive * 0.6)
        .with_alpha(0.55 + drive * 0.4)
}

/// Three stacked wave layers with their own speed, phase and brightness.
/// Back layers sit lower, move slower and fade out.
pub fn ocean(ctx: &ShapeContext) -> ShapeResult {
    let drive = ctx.drive();
    let layer = ctx.index % OCEAN_LAYERS;
    let per_layer = (ctx.total / OCEAN_LAYERS).max(1);
    let u = ((ctx.index / OCEAN_LAYERS) as f32 + 0.5) / per_layer as f32;

    let lf = layer as f32;
    let x = ctx.width * u;
    let k = TAU * (1.6 + lf * 0.5) / ctx.width.max(1.0);
    let speed = 1.5 - lf * 0.4;
    let amp = ctx.height * (0.1 - lf * 0.02) * (1.0 + drive * 0.7);
    let base_y = ctx.height * (0.42 + lf * 0.12);
    let y = base_y
        + (x * k + ctx.time * speed + lf * 1.9).sin() * amp
        + (x * k * 2.3 - ctx.time * speed * 0.6).cos() * amp * 0.3;

    ShapeResult::new(x, y, SPRING_GENTLE + drive * 0.02, FRICTION_STANDARD, 0.25)
        .with_alpha(0.62 - lf * 0.18 + drive * 0.25)
        .with_depth(1.15 - lf * 0.2)
}

/// Archimedean spiral winding out from the center.
pub fn spiral(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let u = ctx.unit();
    let angle = u * SPIRAL_TURNS * TAU + ctx.time * (0.4 + drive * 0.5);
    let r = ctx.min_dim() * 0.42 * u;

    ShapeResult::new(
        cx + angle.cos() * r,
        cy + angle.sin() * r,
        SPRING_MEDIUM,
        FRICTION_STANDARD,
        0.3 + drive * 0.7,
    )
    .with_alpha(0.35 + 0.55 * u + drive * 0.1)
    .with_depth(0.7 + 0.5 * u)
}

/// Sheared spiral: inner radii rotate much faster than outer ones, so the
/// field reads as a whirlpool without any modular wrap.
pub fn vortex(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let u = ctx.unit();
    let r_norm = 0.12 + 0.88 * u;
    let r = ctx.min_dim() * 0.44 * r_norm;
    let shear = (1.6 + drive * 1.2) / r_norm;
    let angle = hash01(ctx.index, 71) * TAU + ctx.time * shear * 0.35;
    // Slight inward pull on the target keeps the funnel taut.
    let dip = 1.0 - 0.1 * (ctx.time * 2.0 + u * TAU).sin().max(0.0);

    ShapeResult::new(
        cx + angle.cos() * r * dip,
        cy + angle.sin() * r * dip * 0.92,
        SPRING_MEDIUM + drive * 0.03,
        FRICTION_LOOSE,
        0.5 + drive * 1.0,
    )
    .with_alpha(0.4 + 0.5 * (1.0 - r_norm) + drive * 0.1)
    .with_depth(0.65 + 0.6 * (1.0 - r_norm))
}

/// Concentric breathing rings, alternating spin direction per ring.
pub fn rings(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let ring = ctx.index % RING_COUNT;
    let per_ring = (ctx.total / RING_COUNT).max(1);
    let u = ((ctx.index / RING_COUNT) as f32 + 0.5) / per_ring as f32;

    let rf = ring as f32;
    let dir = if ring % 2 == 0 { 1.0 } else { -1.0 };
    let angle = u * TAU + ctx.time * (0.25 + rf * 0.1) * dir;
    let breath = (ctx.time * 1.1 + rf * 0.9).sin() * 0.04;
    let r = ctx.min_dim() * (0.12 + rf * 0.09) * (1.0 + breath + drive * 0.2);

    ShapeResult::new(
        cx + angle.cos() * r,
        cy + angle.sin() * r,
        SPRING_MEDIUM,
        FRICTION_STANDARD,
        0.2 + drive * 0.5,
    )
    .with_alpha(0.7 - rf * 0.12 + drive * 0.25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::ShapeContext;

    fn ctx<'a>(state: &'a VisualState, index: usize) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 600,
            width: 1000.0,
            height: 600.0,
            time: 5.0,
            audio_raw: 0.3,
            audio_smooth: 0.3,
            prev_x: 0.0,
            prev_y: 0.0,
            prev_alpha: 0.0,
            state,
            clock_text: None,
            landmarks: None,
        }
    }

    #[test]
    fn wave_spans_the_width() {
        let state = VisualState::default();
        let left = wave(&ctx(&state, 0));
        let right = wave(&ctx(&state, 599));
        assert!(left.tx < 50.0);
        assert!(right.tx > 950.0);
    }

    #[test]
    fn ocean_back_layers_are_dimmer_and_lower() {
        let state = VisualState::default();
        let front = ocean(&ctx(&state, 0));
        let back = ocean(&ctx(&state, 2));
        assert!(front.target_alpha.unwrap() > back.target_alpha.unwrap());
        assert!(front.depth_scale.unwrap() > back.depth_scale.unwrap());
    }

    #[test]
    fn spiral_radius_grows_with_index() {
        let state = VisualState::default();
        let (cx, cy) = (500.0, 300.0);
        let inner = spiral(&ctx(&state, 10));
        let outer = spiral(&ctx(&state, 590));
        let d_in = ((inner.tx - cx).powi(2) + (inner.ty - cy).powi(2)).sqrt();
        let d_out = ((outer.tx - cx).powi(2) + (outer.ty - cy).powi(2)).sqrt();
        assert!(d_out > d_in * 3.0);
    }

    #[test]
    fn rings_assign_every_fourth_particle_to_the_same_ring() {
        let state = VisualState::default();
        let (cx, cy) = (500.0, 300.0);
        let a = rings(&ctx(&state, 0));
        let b = rings(&ctx(&state, 4));
        let ra = ((a.tx - cx).powi(2) + (a.ty - cy).powi(2)).sqrt();
        let rb = ((b.tx - cx).powi(2) + (b.ty - cy).powi(2)).sqrt();
        assert!((ra - rb).abs() < ra * 0.12, "same ring, same radius band");
    }
}
