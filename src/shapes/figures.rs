//! Figurative formations: helix, grid, night sky, bursts, the parametric
//! heart and infinity curves, the hourglass and the two loose particle toys
//! (fireflies, fountain).

use std::f32::consts::{PI, TAU};

use crate::motion::{
    hash01, hash_signed, lerp, FRICTION_DRIFT, FRICTION_LOOSE, FRICTION_STANDARD, SPRING_GENTLE,
    SPRING_MEDIUM, SPRING_SNAPPY, SPRING_SOFT,
};
use crate::shapes::{ShapeContext, ShapeResult, Teleport};

const DNA_TWISTS: f32 = 2.5;
const DNA_RUNG_EVERY: usize = 12;
const STARBURST_RAYS: usize = 12;
const FOUNTAIN_CYCLE_SECS: f32 = 2.2;

/// Double helix across the width. Strands alternate by index parity; every
/// twelfth pair is pulled off its strand to form a crossbar rung.
pub fn dna(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let strand = ctx.index % 2;
    let pair = ctx.index / 2;
    let pairs = (ctx.total / 2).max(1);
    let u = (pair as f32 + 0.5) / pairs as f32;

    let span = ctx.width * 0.72;
    let x = cx - span / 2.0 + span * u;
    let phase = u * DNA_TWISTS * TAU + ctx.time * (0.8 + drive * 0.6);
    let helix_r = ctx.height * 0.13;

    let y0 = cy + phase.sin() * helix_r;
    let y1 = cy + (phase + PI).sin() * helix_r;
    let (y, z) = if pair % DNA_RUNG_EVERY == 0 {
        // Rung particle: slide between the strands.
        let frac = if strand == 0 { 0.3 } else { 0.7 };
        (lerp(y0, y1, frac), phase.cos() * 0.5)
    } else if strand == 0 {
        (y0, phase.cos())
    } else {
        (y1, (phase + PI).cos())
    };

    ShapeResult::new(x, y, SPRING_MEDIUM, FRICTION_STANDARD, 0.2 + drive * 0.4)
        .with_alpha(0.45 + 0.35 * (z * 0.5 + 0.5) + drive * 0.15)
        .with_depth(0.75 + 0.45 * (z * 0.5 + 0.5))
}

/// Aspect-fitted lattice of cells breathing gently around the center.
pub fn grid(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let aspect = (ctx.width / ctx.height.max(1.0)).max(0.1);
    let cols = ((ctx.total as f32 * aspect).sqrt().ceil() as usize).max(1);
    let rows = (ctx.total + cols - 1) / cols;

    let col = ctx.index % cols;
    let row = ctx.index / cols;
    let span_x = ctx.width * 0.78;
    let span_y = ctx.height * 0.78;
    let fx = (col as f32 + 0.5) / cols as f32 - 0.5;
    let fy = (row as f32 + 0.5) / rows.max(1) as f32 - 0.5;

    let scale = 1.0 + 0.03 * (ctx.time * 1.2).sin() + drive * 0.05;
    let shimmer = (ctx.time * 1.6 + (col + row) as f32 * 0.45).sin() * 0.5 + 0.5;

    ShapeResult::new(
        cx + fx * span_x * scale,
        cy + fy * span_y * scale,
        SPRING_SNAPPY,
        FRICTION_STANDARD,
        0.08 + drive * 0.25,
    )
    .with_alpha(0.4 + 0.35 * shimmer + drive * 0.2)
}

/// Static star field with per-star twinkle phases. A small bright cohort
/// reads as first-magnitude stars.
pub fn constellation(ctx: &ShapeContext) -> ShapeResult {
    let i = ctx.index;
    let margin = 0.08;
    let x = ctx.width * (margin + (1.0 - 2.0 * margin) * hash01(i, 211));
    let y = ctx.height * (margin + (1.0 - 2.0 * margin) * hash01(i, 227));
    // Slow parallax drift so the sky never looks frozen.
    let dx = (ctx.time * 0.11 + hash01(i, 229) * TAU).sin() * 2.5;
    let dy = (ctx.time * 0.09 + hash01(i, 233) * TAU).cos() * 2.5;

    let bright = hash01(i, 239) < 0.12;
    let twinkle = (ctx.time * (0.8 + hash01(i, 241) * 1.6) + hash01(i, 251) * TAU).sin() * 0.5 + 0.5;
    let alpha = if bright {
        0.55 + 0.45 * twinkle
    } else {
        0.12 + 0.38 * twinkle
    };

    ShapeResult::new(x + dx, y + dy, SPRING_GENTLE, FRICTION_DRIFT, 0.05)
        .with_alpha(alpha)
        .with_depth(if bright { 1.9 } else { 0.7 + 0.4 * twinkle })
}

/// Twelve rays pulsing out from the center.
pub fn starburst(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let ray = ctx.index % STARBURST_RAYS;
    let per_ray = (ctx.total / STARBURST_RAYS).max(1);
    let u = ((ctx.index / STARBURST_RAYS) as f32 + 0.5) / per_ray as f32;

    let angle = ray as f32 / STARBURST_RAYS as f32 * TAU + ctx.time * 0.1;
    let pulse = 0.68 + 0.32 * (ctx.time * 1.9 + ray as f32 * 0.5).sin();
    let len = ctx.min_dim() * 0.42 * pulse * (1.0 + drive * 0.45);
    let r = u * len;
    // Shimmer runs outward along each ray.
    let run = ((u * 4.0 - ctx.time * 1.4).sin() * 0.5 + 0.5) * 0.4;

    ShapeResult::new(
        cx + angle.cos() * r,
        cy + angle.sin() * r,
        SPRING_SNAPPY,
        FRICTION_STANDARD,
        0.25 + drive * 0.8,
    )
    .with_alpha(0.3 + run + drive * 0.25)
    .with_depth(0.7 + 0.6 * u)
}

/// Classic parametric heart with a two-phase beat.
pub fn heart(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let theta = ctx.unit() * TAU;
    let s = ctx.min_dim() * 0.019;
    let beat =
        1.0 + 0.055 * (ctx.time * 2.6).sin() + 0.028 * (ctx.time * 5.2 + 0.7).sin() + drive * 0.14;

    let hx = 16.0 * theta.sin().powi(3);
    let hy = 13.0 * theta.cos()
        - 5.0 * (2.0 * theta).cos()
        - 2.0 * (3.0 * theta).cos()
        - (4.0 * theta).cos();

    ShapeResult::new(
        cx + hx * s * beat,
        cy - hy * s * beat,
        SPRING_MEDIUM,
        FRICTION_STANDARD,
        0.15 + drive * 0.5,
    )
    .with_alpha(0.6 + drive * 0.35)
}

/// Lemniscate of Bernoulli with particles flowing along the figure.
pub fn infinity(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let theta = ctx.unit() * TAU + ctx.time * (0.45 + drive * 0.4);
    let a = ctx.min_dim() * 0.32;
    let denom = 1.0 + theta.sin().powi(2);

    ShapeResult::new(
        cx + a * theta.cos() / denom,
        cy + a * theta.sin() * theta.cos() / denom,
        SPRING_MEDIUM,
        FRICTION_STANDARD,
        0.18 + drive * 0.5,
    )
    .with_alpha(0.6 + drive * 0.3)
}

/// Hourglass: a six-edge frame plus sand. The sand stream loops through the
/// neck by teleport so the fall never springs back upward.
pub fn hourglass(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let w = ctx.min_dim() * 0.26;
    let h = ctx.min_dim() * 0.3;
    let role = hash01(ctx.index, 307);

    if role < 0.55 {
        // Frame: TL,TR top edge; TR->neck; neck->TL; then the mirrored
        // bottom triangle.
        let u = ctx.unit() * 6.0;
        let seg = (u as usize).min(5);
        let v = u - seg as f32;
        let (ax, ay, bx, by) = match seg {
            0 => (cx - w, cy - h, cx + w, cy - h),
            1 => (cx + w, cy - h, cx, cy),
            2 => (cx, cy, cx - w, cy - h),
            3 => (cx - w, cy + h, cx + w, cy + h),
            4 => (cx + w, cy + h, cx, cy),
            _ => (cx, cy, cx - w, cy + h),
        };
        ShapeResult::new(
            lerp(ax, bx, v),
            lerp(ay, by, v),
            SPRING_SNAPPY,
            FRICTION_STANDARD,
            0.08,
        )
        .with_alpha(0.65 + drive * 0.2)
    } else if role < 0.85 {
        // Sand stream through the neck.
        let fall_span = h * 1.1;
        let phase = (hash01(ctx.index, 311) + ctx.time / 1.6) % 1.0;
        let x = cx + hash_signed(ctx.index, 313) * 2.0;
        let y = cy - h * 0.12 + phase * fall_span;
        let vy = fall_span / 1.6 / 60.0;
        ShapeResult::new(x, y, 0.0, FRICTION_LOOSE, 0.0)
            .with_teleport(Teleport { x, y, vx: 0.0, vy })
            .with_alpha(0.85 - phase * 0.3)
            .with_depth(0.8)
    } else if role < 0.92 {
        // Remaining sand heaped above the neck.
        let hx = hash_signed(ctx.index, 317) * w * 0.3;
        let hy = -h * 0.22 - hash01(ctx.index, 331) * h * 0.12;
        ShapeResult::new(cx + hx, cy + hy, SPRING_MEDIUM, FRICTION_STANDARD, 0.05)
            .with_alpha(0.7)
    } else {
        // Pile growing in the bottom bulb.
        let spread = hash01(ctx.index, 337);
        let hx = hash_signed(ctx.index, 347) * w * (0.25 + 0.45 * spread);
        let hy = h * (0.96 - 0.28 * spread * hash01(ctx.index, 349));
        ShapeResult::new(cx + hx, cy + hy, SPRING_MEDIUM, FRICTION_STANDARD, 0.05)
            .with_alpha(0.75)
    }
}

/// Wandering flicker points. High noise, soft springs and gated alpha give
/// the stop-start glow of real fireflies.
pub fn fireflies(ctx: &ShapeContext) -> ShapeResult {
    let drive = ctx.drive();
    let i = ctx.index;
    let ax = ctx.width * (0.12 + 0.76 * hash01(i, 401));
    let ay = ctx.height * (0.12 + 0.76 * hash01(i, 409));
    let r = ctx.min_dim() * (0.04 + 0.1 * hash01(i, 419));
    let x = ax
        + (ctx.time * (0.3 + hash01(i, 421) * 0.5) + hash01(i, 431) * TAU).sin() * r
        + (ctx.time * 0.9 + hash01(i, 433) * TAU).cos() * r * 0.4;
    let y = ay
        + (ctx.time * (0.26 + hash01(i, 439) * 0.5) + hash01(i, 443) * TAU).cos() * r
        + (ctx.time * 0.8 + hash01(i, 449) * TAU).sin() * r * 0.4;

    // Each firefly glows on its own duty cycle.
    let gate = (ctx.time * (0.7 + hash01(i, 457) * 0.9) + hash01(i, 461) * TAU).sin();
    let lit = ((gate - 0.25) * 4.0).clamp(0.0, 1.0);

    ShapeResult::new(x, y, SPRING_SOFT, FRICTION_DRIFT, 1.6 + drive * 1.4)
        .with_alpha(0.08 + 0.8 * lit)
        .with_depth(0.7 + 0.9 * lit)
}

/// Parabolic jets launched from the bottom center. Fully prescribed by
/// teleport each frame; respawn at the base is a loop, not a spring snap.
pub fn fountain(ctx: &ShapeContext) -> ShapeResult {
    let (cx, _) = ctx.center();
    let drive = ctx.drive();
    let i = ctx.index;
    let phase = (hash01(i, 503) + ctx.time / FOUNTAIN_CYCLE_SECS) % 1.0;
    let apex = ctx.height * (0.42 + 0.18 * hash01(i, 509) + drive * 0.12);
    let dx = hash_signed(i, 521) * ctx.width * 0.22;

    let base_y = ctx.height * 0.88;
    let x = cx + dx * phase;
    let y = base_y - 4.0 * apex * phase * (1.0 - phase);
    // Analytic velocity of the arc, in px per frame at nominal 60 fps.
    let vx = dx / FOUNTAIN_CYCLE_SECS / 60.0;
    let vy = -4.0 * apex * (1.0 - 2.0 * phase) / FOUNTAIN_CYCLE_SECS / 60.0;

    ShapeResult::new(x, y, 0.0, FRICTION_LOOSE, 0.0)
        .with_teleport(Teleport { x, y, vx, vy })
        .with_alpha((0.9 - phase * 0.55).max(0.1))
        .with_depth(0.8 + 0.5 * (1.0 - phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::ShapeContext;

    const W: f32 = 1000.0;
    const H: f32 = 750.0;

    fn ctx<'a>(state: &'a VisualState, index: usize, time: f32) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 720,
            width: W,
            height: H,
            time,
            audio_raw: 0.2,
            audio_smooth: 0.2,
            prev_x: W / 2.0,
            prev_y: H / 2.0,
            prev_alpha: 0.5,
            state,
            clock_text: None,
            landmarks: None,
        }
    }

    #[test]
    fn dna_strands_mirror_around_the_axis() {
        let state = VisualState::default();
        // Pick a pair away from the rung cadence.
        let a = dna(&ctx(&state, 6, 1.0));
        let b = dna(&ctx(&state, 7, 1.0));
        let cy = H / 2.0;
        assert!((a.tx - b.tx).abs() < 1.0, "pair shares an x column");
        assert!(
            ((a.ty - cy) + (b.ty - cy)).abs() < 1.0,
            "strands should mirror: {} vs {}",
            a.ty,
            b.ty
        );
    }

    #[test]
    fn grid_cells_do_not_collapse() {
        let state = VisualState::default();
        let a = grid(&ctx(&state, 0, 2.0));
        let b = grid(&ctx(&state, 1, 2.0));
        let dist = ((a.tx - b.tx).powi(2) + (a.ty - b.ty).powi(2)).sqrt();
        assert!(dist > 5.0, "adjacent cells must be separated");
    }

    #[test]
    fn heart_is_left_right_symmetric() {
        let state = VisualState::default();
        let total = 720;
        let i = 90;
        let mirror = total - i;
        let a = heart(&ctx(&state, i, 3.0));
        let b = heart(&ctx(&state, mirror, 3.0));
        let cx = W / 2.0;
        assert!(
            ((a.tx - cx) + (b.tx - cx)).abs() < 2.0,
            "mirrored along x: {} vs {}",
            a.tx,
            b.tx
        );
        assert!((a.ty - b.ty).abs() < 2.0);
    }

    #[test]
    fn hourglass_sand_teleports_within_the_glass() {
        let state = VisualState::default();
        let cy = H / 2.0;
        let h = W.min(H) * 0.3;
        let mut saw_sand = false;
        for i in 0..720 {
            for t in [0.0, 0.5, 1.3, 2.9] {
                let r = hourglass(&ctx(&state, i, t));
                if let Some(tp) = r.teleport {
                    saw_sand = true;
                    assert!(tp.y >= cy - h * 0.2, "sand above the neck at t={}", t);
                    assert!(tp.y <= cy + h * 1.05, "sand below the glass at t={}", t);
                    assert!(tp.vy > 0.0, "sand falls downward");
                }
            }
        }
        assert!(saw_sand, "some particles must be in the stream");
    }

    #[test]
    fn fountain_loops_without_leaving_the_surface() {
        let state = VisualState::default();
        for i in (0..720).step_by(17) {
            for step in 0..40 {
                let r = fountain(&ctx(&state, i, step as f32 * 0.21));
                let tp = r.teleport.expect("fountain always teleports");
                assert!(tp.y <= H * 0.89, "never below the launch base");
                assert!(tp.y >= 0.0);
                assert!(tp.x >= -W * 0.25 && tp.x <= W * 1.25);
            }
        }
    }

    #[test]
    fn fireflies_flicker_between_dim_and_lit() {
        let state = VisualState::default();
        let mut lows = 0;
        let mut highs = 0;
        for i in 0..120 {
            for t in 0..20 {
                let r = fireflies(&ctx(&state, i, t as f32 * 0.5));
                let a = r.target_alpha.unwrap();
                if a < 0.15 {
                    lows += 1;
                }
                if a > 0.6 {
                    highs += 1;
                }
            }
        }
        assert!(lows > 0 && highs > 0, "duty cycle never changed state");
    }

    #[test]
    fn starburst_rays_are_evenly_spaced() {
        let state = VisualState::default();
        let cx = W / 2.0;
        let cy = H / 2.0;
        let a = starburst(&ctx(&state, 0, 1.0));
        let b = starburst(&ctx(&state, 1, 1.0));
        let ang_a = (a.ty - cy).atan2(a.tx - cx);
        let ang_b = (b.ty - cy).atan2(b.tx - cx);
        let sep = (ang_b - ang_a).rem_euclid(TAU);
        let expected = TAU / STARBURST_RAYS as f32;
        assert!(
            (sep - expected).abs() < 0.05 || (sep - TAU + expected).abs() < 0.05,
            "ray separation {} expected {}",
            sep,
            expected
        );
    }
}
