//! Shape generator registry for Orbfield
//! Every formation the field can assemble into is a pure function from
//! (particle index, context) to a per-frame motion target. Generators never
//! touch particle state directly; the engine integrates their results.

pub mod agents;
pub mod chart;
pub mod clock;
pub mod face;
pub mod figures;
pub mod globe;
pub mod map;
pub mod orb;
pub mod text;
pub mod waves;
pub mod weather;

use serde::{Deserialize, Serialize};

use crate::config::VisualState;
use crate::motion::{clamp01, surface_center, FRICTION_TIGHT};

pub use face::LandmarkSnapshot;

// ============================================================================
// Shape catalog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Orb,
    Idle,
    Halo,
    Wave,
    Ocean,
    Spiral,
    Vortex,
    Rings,
    Dna,
    Grid,
    Constellation,
    Starburst,
    Heart,
    Infinity,
    Hourglass,
    Fireflies,
    Fountain,
    Text,
    Clock,
    Weather,
    Chart,
    Map,
    Globe,
    Face,
    Neural,
    Swarm,
    Orbitals,
    Lattice,
}

impl ShapeKind {
    pub fn all() -> [ShapeKind; 28] {
        use ShapeKind::*;
        [
            Orb,
            Idle,
            Halo,
            Wave,
            Ocean,
            Spiral,
            Vortex,
            Rings,
            Dna,
            Grid,
            Constellation,
            Starburst,
            Heart,
            Infinity,
            Hourglass,
            Fireflies,
            Fountain,
            Text,
            Clock,
            Weather,
            Chart,
            Map,
            Globe,
            Face,
            Neural,
            Swarm,
            Orbitals,
            Lattice,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Orb => "orb",
            ShapeKind::Idle => "idle",
            ShapeKind::Halo => "halo",
            ShapeKind::Wave => "wave",
            ShapeKind::Ocean => "ocean",
            ShapeKind::Spiral => "spiral",
            ShapeKind::Vortex => "vortex",
            ShapeKind::Rings => "rings",
            ShapeKind::Dna => "dna",
            ShapeKind::Grid => "grid",
            ShapeKind::Constellation => "constellation",
            ShapeKind::Starburst => "starburst",
            ShapeKind::Heart => "heart",
            ShapeKind::Infinity => "infinity",
            ShapeKind::Hourglass => "hourglass",
            ShapeKind::Fireflies => "fireflies",
            ShapeKind::Fountain => "fountain",
            ShapeKind::Text => "text",
            ShapeKind::Clock => "clock",
            ShapeKind::Weather => "weather",
            ShapeKind::Chart => "chart",
            ShapeKind::Map => "map",
            ShapeKind::Globe => "globe",
            ShapeKind::Face => "face",
            ShapeKind::Neural => "neural",
            ShapeKind::Swarm => "swarm",
            ShapeKind::Orbitals => "orbitals",
            ShapeKind::Lattice => "lattice",
        }
    }

    /// Case-insensitive lookup; unknown names fall back to the orb.
    pub fn from_name(name: &str) -> ShapeKind {
        let lower = name.trim().to_ascii_lowercase();
        ShapeKind::all()
            .into_iter()
            .find(|k| k.name() == lower)
            .unwrap_or(ShapeKind::Orb)
    }

    /// Shapes that react to the pointer. Structured formations keep their
    /// layout; only the loose ones scatter.
    pub fn pointer_repulsion(&self) -> bool {
        matches!(
            self,
            ShapeKind::Orb
                | ShapeKind::Idle
                | ShapeKind::Halo
                | ShapeKind::Fireflies
                | ShapeKind::Constellation
                | ShapeKind::Swarm
        )
    }
}

// ============================================================================
// Generator I/O
// ============================================================================

/// Hard reposition with injected velocity. Looping effects (rain, snow,
/// falling sand, fountains) use this so wrap-around never spring-interpolates
/// across the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teleport {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

/// One particle's motion target for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeResult {
    pub tx: f32,
    pub ty: f32,
    pub spring: f32,
    pub friction: f32,
    pub noise: f32,
    /// None keeps the particle's current alpha target.
    pub target_alpha: Option<f32>,
    /// Pseudo-3D size multiplier; None means 1.0.
    pub depth_scale: Option<f32>,
    pub teleport: Option<Teleport>,
}

impl ShapeResult {
    pub fn new(tx: f32, ty: f32, spring: f32, friction: f32, noise: f32) -> Self {
        Self {
            tx,
            ty,
            spring,
            friction,
            noise,
            target_alpha: None,
            depth_scale: None,
            teleport: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.target_alpha = Some(clamp01(alpha));
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth_scale = Some(depth.max(0.0));
        self
    }

    pub fn with_teleport(mut self, teleport: Teleport) -> Self {
        self.teleport = Some(teleport);
        self
    }

    /// Fully transparent, non-moving result for particles a generator has no
    /// work for (index past a text budget, off glyph cells and the like).
    pub fn hidden(ctx: &ShapeContext) -> Self {
        ShapeResult::new(ctx.prev_x, ctx.prev_y, 0.0, FRICTION_TIGHT, 0.0).with_alpha(0.0)
    }
}

/// Everything a generator may read. Built once per particle per frame by the
/// engine; generators treat it as read-only.
pub struct ShapeContext<'a> {
    pub index: usize,
    pub total: usize,
    pub width: f32,
    pub height: f32,
    pub time: f32,
    /// Instantaneous audio level for the active mode (0.0-1.0).
    pub audio_raw: f32,
    /// Smoothed audio level for the active mode (0.0-1.0).
    pub audio_smooth: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub prev_alpha: f32,
    pub state: &'a VisualState,
    /// Preformatted wall-clock string for the clock shape ("09:41").
    pub clock_text: Option<&'a str>,
    /// Latest fresh face landmark frame, if any.
    pub landmarks: Option<&'a LandmarkSnapshot>,
}

impl<'a> ShapeContext<'a> {
    pub fn center(&self) -> (f32, f32) {
        surface_center(self.width, self.height)
    }

    pub fn min_dim(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Unit position of this particle within the batch.
    pub fn unit(&self) -> f32 {
        self.index as f32 / self.total.max(1) as f32
    }

    /// Audio drive for the active mode: speaking reacts to the raw level so
    /// the field snaps with speech; everything else rides the smoothed one.
    /// Never negative.
    pub fn drive(&self) -> f32 {
        let level = match self.state.mode {
            crate::config::Mode::Speaking => self.audio_raw,
            _ => self.audio_smooth,
        };
        clamp01(level)
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Resolves the shape actually generated for the given state. The orb stands
/// down to the ambient idle drift while the assistant is inactive.
pub fn effective_kind(kind: ShapeKind, state: &VisualState) -> ShapeKind {
    if kind == ShapeKind::Orb && !state.is_active {
        ShapeKind::Idle
    } else {
        kind
    }
}

/// Single dispatch point for every shape. Exhaustive on purpose; adding a
/// variant without a generator arm fails to compile.
pub fn generate(kind: ShapeKind, ctx: &ShapeContext) -> ShapeResult {
    let result = match effective_kind(kind, ctx.state) {
        ShapeKind::Orb => orb::orb(ctx),
        ShapeKind::Idle => orb::idle(ctx),
        ShapeKind::Halo => orb::halo(ctx),
        ShapeKind::Wave => waves::wave(ctx),
        ShapeKind::Ocean => waves::ocean(ctx),
        ShapeKind::Spiral => waves::spiral(ctx),
        ShapeKind::Vortex => waves::vortex(ctx),
        ShapeKind::Rings => waves::rings(ctx),
        ShapeKind::Dna => figures::dna(ctx),
        ShapeKind::Grid => figures::grid(ctx),
        ShapeKind::Constellation => figures::constellation(ctx),
        ShapeKind::Starburst => figures::starburst(ctx),
        ShapeKind::Heart => figures::heart(ctx),
        ShapeKind::Infinity => figures::infinity(ctx),
        ShapeKind::Hourglass => figures::hourglass(ctx),
        ShapeKind::Fireflies => figures::fireflies(ctx),
        ShapeKind::Fountain => figures::fountain(ctx),
        ShapeKind::Text => text::text(ctx),
        ShapeKind::Clock => clock::clock(ctx),
        ShapeKind::Weather => weather::weather(ctx),
        ShapeKind::Chart => chart::chart(ctx),
        ShapeKind::Map => map::map(ctx),
        ShapeKind::Globe => globe::globe(ctx),
        ShapeKind::Face => face::face(ctx),
        ShapeKind::Neural => agents::neural(ctx),
        ShapeKind::Swarm => agents::swarm(ctx),
        ShapeKind::Orbitals => agents::orbitals(ctx),
        ShapeKind::Lattice => agents::lattice(ctx),
    };
    sanitize(result, ctx)
}

/// Last line of defense: a generator that produces a non-finite coordinate
/// (degenerate surface, bad payload) must not poison the integrator.
fn sanitize(mut result: ShapeResult, ctx: &ShapeContext) -> ShapeResult {
    let (cx, cy) = ctx.center();
    if !result.tx.is_finite() {
        result.tx = cx;
    }
    if !result.ty.is_finite() {
        result.ty = cy;
    }
    if !result.spring.is_finite() || result.spring < 0.0 {
        result.spring = 0.0;
    }
    if !result.friction.is_finite() {
        result.friction = FRICTION_TIGHT;
    }
    result.friction = result.friction.clamp(0.0, 1.0);
    if !result.noise.is_finite() || result.noise < 0.0 {
        result.noise = 0.0;
    }
    if let Some(t) = result.teleport {
        if !(t.x.is_finite() && t.y.is_finite() && t.vx.is_finite() && t.vy.is_finite()) {
            result.teleport = None;
        }
    }
    result
}
