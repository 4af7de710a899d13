//! Particle field engine: population control, per-frame shape dispatch,
//! spring integration, pointer repulsion and frame-rate tiering.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::audio::{AudioLevels, LevelFeed, LevelSender};
use crate::config::{EngineConfig, VisualState};
use crate::morph::{MorphStyle, ShapeMorpher};
use crate::shapes::face::LandmarkStore;
use crate::shapes::{generate, ShapeContext, ShapeKind};

/// One particle of the field. Positions are surface px, velocities px per
/// nominal 60 fps frame.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Drawn opacity, chased toward the generator's target.
    pub alpha: f32,
    /// Drawn radius after depth and audio scaling.
    pub radius: f32,
    /// Smoothed depth multiplier; 1.0 when the shape reports none.
    pub depth: f32,
    /// Set on frames where the generator hard-repositioned the particle.
    /// Trail buffers must break at these frames.
    pub teleported: bool,
    base_radius: f32,
}

impl Particle {
    fn spawn(rng: &mut StdRng, width: f32, height: f32, config: &EngineConfig) -> Self {
        Self {
            x: rng.gen::<f32>() * width,
            y: rng.gen::<f32>() * height,
            vx: 0.0,
            vy: 0.0,
            alpha: 0.0,
            radius: config.base_radius,
            depth: 1.0,
            teleported: false,
            base_radius: config.base_radius + rng.gen::<f32>() * config.radius_jitter,
        }
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Frame-rate tier from the rolling estimate. Lower tiers shrink the
/// population so slow hosts keep their frame budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Full,
    Degraded,
    Critical,
}

impl PerformanceTier {
    pub fn population_factor(&self) -> f32 {
        match self {
            PerformanceTier::Full => 1.0,
            PerformanceTier::Degraded => 0.75,
            PerformanceTier::Critical => 0.5,
        }
    }
}

pub struct ParticleField {
    config: EngineConfig,
    state: VisualState,
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    time: f32,

    // Inbound feeds
    audio: AudioLevels,
    feed: LevelFeed,
    landmarks: LandmarkStore,
    pointer: Option<(f32, f32)>,
    clock_text: Option<String>,

    morpher: ShapeMorpher,
    /// Last `morphing_to` request seen; a change is what arms the morpher.
    morph_request: Option<ShapeKind>,

    rng: StdRng,
    frame_times: VecDeque<f32>,
    tier: PerformanceTier,
}

impl ParticleField {
    pub fn new(config: EngineConfig, width: f32, height: f32) -> Self {
        let mut field = Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            state: VisualState::default(),
            particles: Vec::new(),
            width: width.max(1.0),
            height: height.max(1.0),
            time: 0.0,
            audio: AudioLevels::default(),
            feed: LevelFeed::new(),
            landmarks: LandmarkStore::new(),
            pointer: None,
            clock_text: None,
            morpher: ShapeMorpher::new(),
            morph_request: None,
            frame_times: VecDeque::new(),
            tier: PerformanceTier::Full,
        };
        field.repopulate(field.desired_population());
        field
    }

    // ========================================================
    // Host-facing wiring
    // ========================================================

    /// Handle for the host's audio callback. Cheap to clone, send-safe.
    pub fn level_sender(&self) -> LevelSender {
        self.feed.sender()
    }

    pub fn landmark_store(&self) -> &LandmarkStore {
        &self.landmarks
    }

    /// Replace the authoritative state snapshot for the next frame.
    pub fn set_state(&mut self, state: VisualState) {
        self.state = state;
    }

    pub fn state(&self) -> &VisualState {
        &self.state
    }

    pub fn set_pointer(&mut self, pointer: Option<(f32, f32)>) {
        self.pointer = pointer;
    }

    /// Preformatted wall-clock string consumed by the clock shape.
    pub fn set_clock_text(&mut self, text: Option<String>) {
        self.clock_text = text;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tier(&self) -> PerformanceTier {
        self.tier
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Surface change. Particles are clamped back into view; the batch is
    /// rebuilt only when the new area moves the target population past the
    /// reallocation tolerance.
    pub fn handle_resize(&mut self, width: f32, height: f32) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        if (width - self.width).abs() < 0.5 && (height - self.height).abs() < 0.5 {
            return;
        }
        self.width = width;
        self.height = height;
        for p in &mut self.particles {
            p.x = p.x.clamp(0.0, width);
            p.y = p.y.clamp(0.0, height);
        }
        self.reconcile_population();
    }

    // ========================================================
    // Population control
    // ========================================================

    fn desired_population(&self) -> usize {
        let area_factor = (self.width * self.height / self.config.reference_area).clamp(0.5, 2.0);
        let citation_boost = 1.0 + self.state.source_count.min(12) as f32 * 0.04;
        let n = self.config.baseline_count as f32
            * area_factor
            * citation_boost
            * self.tier.population_factor();
        (n as usize).clamp(64, self.config.max_count)
    }

    fn reconcile_population(&mut self) {
        let desired = self.desired_population();
        let current = self.particles.len().max(1);
        let drift = (desired as f32 - current as f32).abs() / current as f32;
        if drift > self.config.realloc_tolerance {
            self.repopulate(desired);
        }
    }

    fn repopulate(&mut self, count: usize) {
        let from = self.particles.len();
        self.particles = (0..count)
            .map(|_| Particle::spawn(&mut self.rng, self.width, self.height, &self.config))
            .collect();
        debug!(from, to = count, "particle batch reallocated");
    }

    // ========================================================
    // Frame advance
    // ========================================================

    pub fn advance(&mut self, dt: f32) {
        // A dragged window or a debugger pause must not explode the springs.
        let dt = dt.clamp(1e-4, 0.1);
        self.time += dt;
        self.note_frame(dt);

        // -- AUDIO: drain the feed, then smooth --
        if let Some(sample) = self.feed.drain_latest() {
            self.audio.apply_sample(sample);
        }
        self.audio.update_smoothing(dt);
        self.state.audio_level = self.audio.smooth_for(self.state.mode);

        // -- MORPH: arm on request change, advance, mirror progress --
        self.sync_morph();
        self.morpher.tick(self.time);
        self.state.morph_progress = self.morpher.progress();

        self.reconcile_population();

        // Per-frame shared inputs, resolved once for the whole batch.
        let snapshot = self.landmarks.snapshot();
        let clock = self.clock_text.as_deref();
        let audio_raw = self.audio.raw_for(self.state.mode);
        let audio_smooth = self.audio.smooth_for(self.state.mode);
        let morph_live = self.state.morphing_to.is_some();
        let display_kind = self.state.morphing_to.unwrap_or(self.state.shape);
        let repulse = match self.pointer {
            Some(p) if display_kind.pointer_repulsion() => Some(p),
            _ => None,
        };

        // Seeded noise kicks, drawn sequentially so the parallel pass stays
        // free of shared mutable state.
        let total = self.particles.len();
        let kicks: Vec<(f32, f32)> = (0..total)
            .map(|_| {
                (
                    self.rng.gen::<f32>() - 0.5,
                    self.rng.gen::<f32>() - 0.5,
                )
            })
            .collect();

        let state = &self.state;
        let config = &self.config;
        let morpher = &self.morpher;
        let width = self.width;
        let height = self.height;
        let time = self.time;
        let step = dt * 60.0;
        let friction_exp = |f: f32| f.powf(step);
        let (cx, cy) = (width * 0.5, height * 0.5);
        let cull_radius = width.max(height) * config.cull_factor;

        self.particles
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, p)| {
                let ctx = ShapeContext {
                    index,
                    total,
                    width,
                    height,
                    time,
                    audio_raw,
                    audio_smooth,
                    prev_x: p.x,
                    prev_y: p.y,
                    prev_alpha: p.alpha,
                    state,
                    clock_text: clock,
                    landmarks: snapshot.as_ref(),
                };
                let result = if morph_live {
                    morpher.sample(&ctx)
                } else {
                    generate(state.shape, &ctx)
                };

                if let Some(tp) = result.teleport {
                    // -- TELEPORT: hard reposition, inject velocity --
                    p.x = tp.x;
                    p.y = tp.y;
                    p.vx = tp.vx;
                    p.vy = tp.vy;
                    p.teleported = true;
                } else {
                    p.teleported = false;

                    // -- SPRING --
                    p.vx += (result.tx - p.x) * result.spring * step;
                    p.vy += (result.ty - p.y) * result.spring * step;

                    // -- NOISE --
                    let kick = kicks[index];
                    let amp = result.noise * config.noise_scale * step;
                    p.vx += kick.0 * amp;
                    p.vy += kick.1 * amp;

                    // -- POINTER REPULSION --
                    if let Some((px, py)) = repulse {
                        let dx = p.x - px;
                        let dy = p.y - py;
                        let d2 = dx * dx + dy * dy;
                        let r = config.repulsion_radius;
                        if d2 < r * r && d2 > 0.01 {
                            let d = d2.sqrt();
                            let f = (1.0 - d / r) * config.repulsion_strength * step;
                            p.vx += dx / d * f;
                            p.vy += dy / d * f;
                        }
                    }

                    // -- MOVE + FRICTION --
                    p.x += p.vx * step;
                    p.y += p.vy * step;
                    let damping = friction_exp(result.friction.clamp(0.0, 1.0));
                    p.vx *= damping;
                    p.vy *= damping;
                }

                // -- BLENDS: alpha, depth, radius chase separately --
                let target_alpha = result.target_alpha.unwrap_or(1.0);
                p.alpha += (target_alpha - p.alpha) * (config.alpha_blend * step).min(1.0);
                let target_depth = result.depth_scale.unwrap_or(1.0);
                p.depth += (target_depth - p.depth) * (config.depth_blend * step).min(1.0);
                let target_radius = p.base_radius * p.depth.max(0.0);
                p.radius += (target_radius - p.radius) * (config.radius_blend * step).min(1.0);

                // -- EDGE CULL: far outside the surface, fade instead of pop --
                let dx = p.x - cx;
                let dy = p.y - cy;
                if dx * dx + dy * dy > cull_radius * cull_radius {
                    p.alpha *= friction_exp(0.85);
                }
                p.alpha = p.alpha.clamp(0.0, 1.0);
            });
    }

    fn sync_morph(&mut self) {
        match self.state.morphing_to {
            Some(to) if self.morph_request != Some(to) => {
                self.morph_request = Some(to);
                let style = style_for(to);
                debug!(
                    from = self.state.shape.name(),
                    to = to.name(),
                    style = style.name(),
                    "morph armed"
                );
                self.morpher
                    .begin(self.state.shape, to, style, self.time, &self.config.morph);
            }
            None => self.morph_request = None,
            _ => {}
        }
    }

    // ========================================================
    // Frame pacing
    // ========================================================

    fn note_frame(&mut self, dt: f32) {
        self.frame_times.push_back(dt);
        while self.frame_times.len() > self.config.fps_window {
            self.frame_times.pop_front();
        }
        self.tier = self.tier_for(self.fps());
    }

    /// Rolling estimate; optimistic until the window has data.
    pub fn fps(&self) -> f32 {
        if self.frame_times.len() < 8 {
            return 60.0;
        }
        let sum: f32 = self.frame_times.iter().sum();
        if sum <= f32::EPSILON {
            return 60.0;
        }
        self.frame_times.len() as f32 / sum
    }

    fn tier_for(&self, fps: f32) -> PerformanceTier {
        if fps < self.config.fps_critical {
            PerformanceTier::Critical
        } else if fps < self.config.fps_degraded {
            PerformanceTier::Degraded
        } else {
            PerformanceTier::Full
        }
    }
}

/// Morph choreography per destination: swirl-heavy shapes take the long
/// spiral route, fluid ones flow, the rest cut straight across.
fn style_for(to: ShapeKind) -> MorphStyle {
    match to {
        ShapeKind::Spiral | ShapeKind::Vortex | ShapeKind::Globe | ShapeKind::Orbitals => {
            MorphStyle::Spiral
        }
        ShapeKind::Wave | ShapeKind::Ocean | ShapeKind::Fountain | ShapeKind::Swarm => {
            MorphStyle::Flow
        }
        _ => MorphStyle::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    const DT: f32 = 1.0 / 60.0;

    fn field() -> ParticleField {
        ParticleField::new(EngineConfig::default(), 1280.0, 720.0)
    }

    fn run(field: &mut ParticleField, frames: usize) {
        for _ in 0..frames {
            field.advance(DT);
        }
    }

    fn mean_radius(field: &ParticleField) -> f32 {
        let sum: f32 = field.particles().iter().map(|p| p.radius).sum();
        sum / field.particles().len() as f32
    }

    #[test]
    fn baseline_population_at_reference_surface() {
        let f = field();
        assert_eq!(f.particles().len(), 1800);
    }

    #[test]
    fn cited_sources_grow_the_batch() {
        let mut f = field();
        run(&mut f, 3);
        let before = f.particles().len();
        let mut state = VisualState::default();
        state.source_count = 10;
        f.set_state(state);
        run(&mut f, 1);
        assert!(
            f.particles().len() > before,
            "{} should exceed {}",
            f.particles().len(),
            before
        );
    }

    #[test]
    fn speech_swells_the_mean_radius() {
        let mut f = field();
        let mut state = VisualState::default();
        state.mode = Mode::Speaking;
        f.set_state(state);
        run(&mut f, 40);
        let quiet = mean_radius(&f);

        let sender = f.level_sender();
        for _ in 0..40 {
            sender.publish(0.0, 0.9);
            f.advance(DT);
        }
        let loud = mean_radius(&f);
        assert!(
            loud > quiet * 1.1,
            "radius should swell with speech: quiet {quiet} loud {loud}"
        );

        for _ in 0..240 {
            sender.publish(0.0, 0.0);
            f.advance(DT);
        }
        let settled = mean_radius(&f);
        assert!(
            settled < loud,
            "radius should relax after speech: loud {loud} settled {settled}"
        );
    }

    #[test]
    fn morph_progress_reaches_one_and_waits_for_the_host() {
        let mut f = field();
        let mut state = VisualState::default();
        state.morphing_to = Some(ShapeKind::Wave);
        f.set_state(state.clone());
        // Plain style runs 0.9s; give it 1.5s.
        run(&mut f, 90);
        assert!((f.state().morph_progress - 1.0).abs() < f32::EPSILON);

        // Host acknowledges: clears the request, commits the shape.
        state.morphing_to = None;
        state.shape = ShapeKind::Wave;
        f.set_state(state);
        run(&mut f, 5);
        assert_eq!(f.state().morph_progress, 1.0);
    }

    #[test]
    fn rerequesting_a_finished_target_morphs_again() {
        let mut f = field();
        let mut state = VisualState::default();
        state.morphing_to = Some(ShapeKind::Wave);
        f.set_state(state.clone());
        run(&mut f, 120);

        state.morphing_to = None;
        state.shape = ShapeKind::Orb;
        f.set_state(state.clone());
        run(&mut f, 5);

        state.morphing_to = Some(ShapeKind::Wave);
        f.set_state(state);
        run(&mut f, 2);
        assert!(
            f.state().morph_progress < 1.0,
            "a fresh request should restart the blend"
        );
    }

    #[test]
    fn small_resize_keeps_the_batch() {
        let mut f = field();
        let before = f.particles().len();
        f.handle_resize(1300.0, 720.0);
        assert_eq!(f.particles().len(), before);
        let (w, h) = f.size();
        assert!(f
            .particles()
            .iter()
            .all(|p| p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h));
    }

    #[test]
    fn halving_the_surface_reallocates() {
        let mut f = field();
        let before = f.particles().len();
        f.handle_resize(640.0, 360.0);
        assert!(f.particles().len() < before);
    }

    #[test]
    fn slow_frames_drop_the_tier_and_shrink_the_batch() {
        let mut f = field();
        let before = f.particles().len();
        for _ in 0..60 {
            f.advance(0.05); // 20 fps
        }
        assert_eq!(f.tier(), PerformanceTier::Critical);
        assert!(f.particles().len() < before);
    }

    #[test]
    fn looping_shapes_mark_teleports() {
        let mut f = field();
        let mut state = VisualState::default();
        state.shape = ShapeKind::Fountain;
        f.set_state(state);
        run(&mut f, 3);
        assert!(
            f.particles().iter().any(|p| p.teleported),
            "fountain streams reposition every frame"
        );
    }

    #[test]
    fn stranded_particles_fade_out() {
        let mut f = field();
        run(&mut f, 1);
        f.particles[0].x = -2000.0;
        f.particles[0].y = -2000.0;
        f.particles[0].alpha = 1.0;
        f.advance(DT);
        assert!(f.particles[0].alpha < 0.95);
    }
}
