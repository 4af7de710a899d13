//! Shape morphing: a timed crossfade between two generators. Both endpoint
//! shapes are evaluated each frame and every result field is interpolated on
//! an eased curve; at the exact boundaries the endpoint result passes
//! through untouched so a completed morph is indistinguishable from the
//! target shape itself.

use serde::{Deserialize, Serialize};

use crate::config::MorphConfig;
use crate::motion::{clamp01, ease_in_out_cubic, lerp};
use crate::shapes::{generate, ShapeContext, ShapeKind, ShapeResult, Teleport};

/// Pacing presets. Style never changes the curve, only how long it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphStyle {
    Plain,
    Flow,
    Spiral,
}

impl MorphStyle {
    pub fn all() -> [MorphStyle; 3] {
        [MorphStyle::Plain, MorphStyle::Flow, MorphStyle::Spiral]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MorphStyle::Plain => "plain",
            MorphStyle::Flow => "flow",
            MorphStyle::Spiral => "spiral",
        }
    }

    pub fn duration(&self, cfg: &MorphConfig) -> f32 {
        let secs = match self {
            MorphStyle::Plain => cfg.plain_secs,
            MorphStyle::Flow => cfg.flow_secs,
            MorphStyle::Spiral => cfg.spiral_secs,
        };
        secs.max(0.05)
    }
}

#[derive(Debug, Clone)]
pub struct ShapeMorpher {
    from: ShapeKind,
    to: ShapeKind,
    style: MorphStyle,
    started_at: f32,
    duration: f32,
    progress: f32,
    active: bool,
}

impl ShapeMorpher {
    pub fn new() -> Self {
        Self {
            from: ShapeKind::Orb,
            to: ShapeKind::Orb,
            style: MorphStyle::Plain,
            started_at: 0.0,
            duration: 1.0,
            progress: 1.0,
            active: false,
        }
    }

    /// Start a transition at `now`. Retargeting mid-morph restarts from
    /// whichever endpoint currently dominates the blend, so the field never
    /// jumps. A no-op transition completes immediately.
    pub fn begin(
        &mut self,
        from: ShapeKind,
        to: ShapeKind,
        style: MorphStyle,
        now: f32,
        cfg: &MorphConfig,
    ) {
        let origin = if self.active {
            if ease_in_out_cubic(self.progress) >= 0.5 {
                self.to
            } else {
                self.from
            }
        } else {
            from
        };
        if origin == to {
            self.from = origin;
            self.to = to;
            self.progress = 1.0;
            self.active = false;
            return;
        }
        self.from = origin;
        self.to = to;
        self.style = style;
        self.started_at = now;
        self.duration = style.duration(cfg);
        self.progress = 0.0;
        self.active = true;
    }

    /// Advance to `now`. Completion clamps progress to exactly 1.
    pub fn tick(&mut self, now: f32) {
        if !self.active {
            return;
        }
        let p = (now - self.started_at) / self.duration;
        if p >= 1.0 {
            self.progress = 1.0;
            self.active = false;
        } else {
            self.progress = clamp01(p);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Raw (unshaped) progress in [0, 1].
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> ShapeKind {
        self.to
    }

    /// Per-particle result for the current blend point.
    pub fn sample(&self, ctx: &ShapeContext) -> ShapeResult {
        if !self.active || self.progress >= 1.0 {
            return generate(self.to, ctx);
        }
        if self.progress <= 0.0 {
            return generate(self.from, ctx);
        }

        let t = ease_in_out_cubic(self.progress);
        let a = generate(self.from, ctx);
        let b = generate(self.to, ctx);

        let mut out = ShapeResult::new(
            lerp(a.tx, b.tx, t),
            lerp(a.ty, b.ty, t),
            lerp(a.spring, b.spring, t),
            lerp(a.friction, b.friction, t),
            lerp(a.noise, b.noise, t),
        );

        // Optional fields blend with None standing in for the neutral 1.0.
        out.target_alpha = blend_opt(a.target_alpha, b.target_alpha, t);
        out.depth_scale = blend_opt(a.depth_scale, b.depth_scale, t);

        // A teleport requested by the dominant endpoint must stay a hard
        // reposition; the landing point is the blended target.
        let dominant = if t < 0.5 { &a } else { &b };
        if let Some(tp) = dominant.teleport {
            out.teleport = Some(Teleport {
                x: out.tx,
                y: out.ty,
                vx: tp.vx,
                vy: tp.vy,
            });
        }
        out
    }
}

impl Default for ShapeMorpher {
    fn default() -> Self {
        Self::new()
    }
}

fn blend_opt(a: Option<f32>, b: Option<f32>, t: f32) -> Option<f32> {
    match (a, b) {
        (None, None) => None,
        _ => Some(lerp(a.unwrap_or(1.0), b.unwrap_or(1.0), t)),
    }
}
