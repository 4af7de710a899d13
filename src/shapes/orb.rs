//! Core presence shapes: the breathing orb, the ambient idle drift and the
//! halo ring. These are on screen most of the time, so their motion is tuned
//! first and everything else matches their feel.

use std::f32::consts::TAU;

use crate::config::Mode;
use crate::motion::{
    hash01, hash_signed, FRICTION_DRIFT, FRICTION_STANDARD, GOLDEN_ANGLE, SPRING_MEDIUM,
    SPRING_SOFT,
};
use crate::shapes::{ShapeContext, ShapeResult};

const ORB_RADIUS_FRAC: f32 = 0.22;
const ORB_BREATH_RATE: f32 = 1.3;
const ORB_AUDIO_SWELL: f32 = 0.35;
const HALO_RING_FRAC: f32 = 0.72;

/// Breathing disc packed on a golden-angle spiral. Audio swells both the
/// radius and the per-particle size; thinking mode speeds the swirl up.
pub fn orb(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let breath = (ctx.time * ORB_BREATH_RATE).sin() * 0.04;
    let radius = ctx.min_dim() * ORB_RADIUS_FRAC * (1.0 + breath + drive * ORB_AUDIO_SWELL);

    let swirl = match ctx.state.mode {
        Mode::Thinking => 0.55,
        _ => 0.15,
    };
    let u = (ctx.index as f32 + 0.5) / ctx.total.max(1) as f32;
    let ring = u.sqrt();
    let angle = GOLDEN_ANGLE * ctx.index as f32 + ctx.time * swirl;

    // Treat the disc as the front face of a sphere for size falloff.
    let z = (1.0 - ring * ring).max(0.0).sqrt();
    let depth = (0.72 + 0.5 * z) * (1.0 + drive * 0.5);
    let alpha = (0.5 + drive * 0.45) * (0.72 + 0.28 * z);

    ShapeResult::new(
        cx + angle.cos() * ring * radius,
        cy + angle.sin() * ring * radius,
        SPRING_MEDIUM + drive * 0.055,
        FRICTION_STANDARD,
        0.25 + drive * 1.1,
    )
    .with_alpha(alpha)
    .with_depth(depth)
}

/// Ambient drift shown when nothing demands attention. Particles wander on
/// large per-index Lissajous loops around the center at low alpha.
pub fn idle(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let spread = ctx.min_dim() * 0.34;
    let i = ctx.index;
    let base = ctx.unit() * TAU;
    let p1 = hash01(i, 11) * TAU;
    let p2 = hash01(i, 23) * TAU;
    let r = spread * (0.45 + 0.55 * hash01(i, 37));

    let x = cx + (base + ctx.time * 0.07).cos() * r + (ctx.time * 0.21 + p1).sin() * spread * 0.18;
    let y = cy + (base + ctx.time * 0.07).sin() * r * 0.78
        + (ctx.time * 0.17 + p2).cos() * spread * 0.18;

    let twinkle = 0.06 * (ctx.time * 0.9 + p1 * 3.0).sin();
    ShapeResult::new(x, y, SPRING_SOFT, FRICTION_DRIFT, 0.18)
        .with_alpha(0.2 + twinkle.max(-0.1))
        .with_depth(0.8 + 0.3 * hash01(i, 41))
}

/// Ring of light with a sparkle core. The ring carries most of the batch;
/// the rest shimmers inside it.
pub fn halo(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let base_r = ctx.min_dim() * 0.3;
    let ring_count = (ctx.total as f32 * HALO_RING_FRAC) as usize;

    if ctx.index < ring_count {
        let u = ctx.index as f32 / ring_count.max(1) as f32;
        let angle = u * TAU + ctx.time * 0.3;
        // Low-order harmonic wobble keeps the ring alive without breaking it.
        let wobble = (angle * 3.0 + ctx.time * 1.7).sin() * 0.035
            + (angle * 5.0 - ctx.time * 1.1).sin() * 0.02;
        let r = base_r * (1.0 + wobble + drive * 0.22);
        ShapeResult::new(
            cx + angle.cos() * r,
            cy + angle.sin() * r,
            SPRING_MEDIUM + drive * 0.04,
            FRICTION_STANDARD,
            0.2 + drive * 0.7,
        )
        .with_alpha(0.68 + drive * 0.32)
        .with_depth(1.0 + drive * 0.3)
    } else {
        let i = ctx.index - ring_count;
        let inner = ctx.total - ring_count;
        let u = (i as f32 + 0.5) / inner.max(1) as f32;
        let angle = GOLDEN_ANGLE * i as f32 - ctx.time * 0.12;
        let r = base_r * 0.62 * u.sqrt() * (0.55 + drive * 0.45);
        let sparkle = (ctx.time * 2.3 + hash01(i, 53) * TAU).sin() * 0.5 + 0.5;
        ShapeResult::new(
            cx + angle.cos() * r + hash_signed(i, 61) * 4.0,
            cy + angle.sin() * r + hash_signed(i, 67) * 4.0,
            SPRING_SOFT + drive * 0.03,
            FRICTION_DRIFT,
            0.4 + drive * 0.9,
        )
        .with_alpha(0.16 + 0.38 * sparkle)
        .with_depth(0.7 + 0.4 * sparkle)
    }
}
