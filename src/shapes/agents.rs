//! Agentic formations: the audio-driven neural rings, the three-cluster
//! swarm, electron-style orbitals and the rotating 3D lattice.

use std::f32::consts::TAU;

use crate::motion::{
    hash01, FRICTION_LOOSE, FRICTION_STANDARD, SPRING_GENTLE, SPRING_MEDIUM, SPRING_SNAPPY,
};
use crate::shapes::{ShapeContext, ShapeResult};

const NEURAL_RINGS: usize = 5;
const SWARM_CLUSTERS: usize = 3;
const ORBITAL_BASE_SHELLS: usize = 3;
const ORBITAL_MAX_SHELLS: usize = 6;

/// Concentric node rings that pulse outward with the audio level and fire
/// individual nodes on hashed timers. No payload: audio is the whole input.
pub fn neural(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let ring = ctx.index % NEURAL_RINGS;
    let per_ring = (ctx.total / NEURAL_RINGS).max(1);
    let u = ((ctx.index / NEURAL_RINGS) as f32 + 0.5) / per_ring as f32;

    let rf = ring as f32;
    // Pulse travels outward ring by ring.
    let pulse = ((ctx.time * 3.0 - rf * 0.8).sin() * 0.5 + 0.5) * drive;
    let r = ctx.min_dim() * (0.075 + rf * 0.065) * (1.0 + pulse * 0.35);
    let angle = u * TAU + ctx.time * (0.12 + rf * 0.04) * if ring % 2 == 0 { 1.0 } else { -1.0 };

    let fire_t = (ctx.time * 1.3 + hash01(ctx.index, 601)) % 1.0;
    let firing = if fire_t < 0.12 { 1.0 - fire_t / 0.12 } else { 0.0 };

    ShapeResult::new(
        cx + angle.cos() * r,
        cy + angle.sin() * r,
        SPRING_MEDIUM + drive * 0.04,
        FRICTION_STANDARD,
        0.15 + drive * 0.9,
    )
    .with_alpha((0.3 + pulse * 0.4 + firing * 0.5).min(1.0))
    .with_depth(0.8 + firing * 0.9)
}

/// Three flocking clusters orbiting the center. Research mode breaks the
/// orbit into a side-by-side scanning sweep.
pub fn swarm(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let cluster = ctx.index % SWARM_CLUSTERS;
    let cf = cluster as f32;
    let i = ctx.index;

    let (ax, ay, spread) = if ctx.state.research_active {
        // Columns sweeping vertically, like beams over a document.
        let x = ctx.width * (0.25 + 0.25 * cf);
        let y = cy + (ctx.time * 0.9 + cf * 1.3).sin() * ctx.height * 0.26;
        (x, y, ctx.min_dim() * 0.06)
    } else {
        let angle = ctx.time * 0.4 + cf * TAU / SWARM_CLUSTERS as f32;
        let orbit = ctx.min_dim() * 0.22;
        (
            cx + angle.cos() * orbit,
            cy + angle.sin() * orbit * 0.85,
            ctx.min_dim() * (0.08 + drive * 0.04),
        )
    };

    let mx = (ctx.time * (0.9 + hash01(i, 613) * 0.8) + hash01(i, 617) * TAU).sin() * spread;
    let my = (ctx.time * (0.8 + hash01(i, 619) * 0.8) + hash01(i, 631) * TAU).cos() * spread;

    ShapeResult::new(
        ax + mx,
        ay + my,
        SPRING_GENTLE + drive * 0.03,
        FRICTION_LOOSE,
        0.8 + drive * 1.2,
    )
    .with_alpha(0.5 + drive * 0.3)
    .with_depth(0.75 + 0.5 * hash01(i, 641))
}

/// Electron shells around a nucleus. Reasoning depth adds shells, each on
/// its own tilted plane with speed falling off outward.
pub fn orbitals(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let extra = (ctx.state.reasoning_depth.clamp(0.0, 1.0)
        * (ORBITAL_MAX_SHELLS - ORBITAL_BASE_SHELLS) as f32)
        .round() as usize;
    let shells = ORBITAL_BASE_SHELLS + extra;

    let shell = ctx.index % shells;
    let per_shell = (ctx.total / shells).max(1);
    let u = ((ctx.index / shells) as f32 + 0.5) / per_shell as f32;

    if shell == 0 {
        // Nucleus: tight breathing cluster.
        let angle = u * TAU * 7.0 + ctx.time * 0.6;
        let r = ctx.min_dim() * 0.045 * (0.4 + 0.6 * hash01(ctx.index, 653)) * (1.0 + drive * 0.3);
        return ShapeResult::new(
            cx + angle.cos() * r,
            cy + angle.sin() * r,
            SPRING_MEDIUM,
            FRICTION_STANDARD,
            0.3 + drive * 0.6,
        )
        .with_alpha(0.8)
        .with_depth(1.3);
    }

    let sf = shell as f32;
    let radius = ctx.min_dim() * (0.09 + sf * 0.055);
    let speed = 1.5 / (1.0 + sf * 0.55) * (1.0 + drive * 0.4);
    let angle = u * TAU + ctx.time * speed;
    let plane = sf * TAU / (2.0 * shells as f32) + ctx.time * 0.05;

    // Orbit in the plane, then rotate the plane around the view axis.
    let ox = angle.cos() * radius;
    let oy = angle.sin() * radius * 0.38;
    let x = ox * plane.cos() - oy * plane.sin();
    let y = ox * plane.sin() + oy * plane.cos();
    let z = angle.sin() * 0.5 + 0.5;

    ShapeResult::new(
        cx + x,
        cy + y,
        SPRING_SNAPPY,
        FRICTION_STANDARD,
        0.1 + drive * 0.4,
    )
    .with_alpha(0.35 + 0.4 * z + drive * 0.2)
    .with_depth(0.6 + 0.7 * z)
}

/// Cube of grid points tumbling slowly in 3D with a perspective divide.
pub fn lattice(ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let n = (ctx.total as f32).cbrt().ceil() as usize;
    let n = n.max(2);
    let gx = ctx.index % n;
    let gy = (ctx.index / n) % n;
    let gz = ctx.index / (n * n);

    let half = (n - 1) as f32 / 2.0;
    let px = (gx as f32 - half) / half.max(0.5);
    let py = (gy as f32 - half) / half.max(0.5);
    let pz = (gz as f32 - half) / half.max(0.5);

    let ry = ctx.time * 0.3;
    let rx = ctx.time * 0.17;
    // Rotate around Y, then X.
    let (x1, z1) = (px * ry.cos() - pz * ry.sin(), px * ry.sin() + pz * ry.cos());
    let (y2, z2) = (py * rx.cos() - z1 * rx.sin(), py * rx.sin() + z1 * rx.cos());

    let persp = 1.8 / (1.8 - z2 * 0.55);
    let scale = ctx.min_dim() * 0.24 * (1.0 + drive * 0.08);
    let near = (z2 * 0.5 + 0.5).clamp(0.0, 1.0);

    ShapeResult::new(
        cx + x1 * scale * persp,
        cy + y2 * scale * persp,
        SPRING_SNAPPY,
        FRICTION_STANDARD,
        0.06 + drive * 0.2,
    )
    .with_alpha(0.25 + 0.55 * near)
    .with_depth(persp * (0.6 + 0.5 * near))
}
