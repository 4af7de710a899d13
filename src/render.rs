//! Painter-path renderer: background, per-particle trail polylines, glow
//! particles and velocity streaks against an egui `Painter`.

use egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::field::{Particle, ParticleField, PerformanceTier};
use crate::motion::hash01;
use crate::theme::{Theme, TrailSettings};

/// Speed (px per nominal frame) above which a particle gets a motion streak.
pub const STREAK_SPEED: f32 = 3.5;
/// How far behind the particle the streak reaches, in velocity frames.
pub const STREAK_REACH: f32 = 2.2;
/// Trail points age out over roughly ten frames at 60 fps.
const TRAIL_AGE_RATE: f32 = 6.0;

#[derive(Clone, Copy)]
struct TrailPoint {
    x: f32,
    y: f32,
    age: f32,
}

/// Per-particle polyline history. Cleared on teleports so looping shapes
/// (rain, fountain) do not draw seams across the surface.
pub struct TrailBuffer {
    trails: Vec<Vec<TrailPoint>>,
}

impl TrailBuffer {
    pub fn new() -> Self {
        Self { trails: Vec::new() }
    }

    pub fn update(&mut self, particles: &[Particle], settings: &TrailSettings, dt: f32) {
        if self.trails.len() != particles.len() {
            // Population realloc: old histories no longer refer to the same
            // particles.
            self.trails = vec![Vec::with_capacity(settings.length); particles.len()];
        }
        for (trail, p) in self.trails.iter_mut().zip(particles) {
            for point in trail.iter_mut() {
                point.age += dt * TRAIL_AGE_RATE;
            }
            trail.retain(|point| point.age < 1.0);

            if p.teleported || p.alpha < 0.05 {
                trail.clear();
                continue;
            }
            while trail.len() >= settings.length.max(2) {
                trail.remove(0);
            }
            trail.push(TrailPoint {
                x: p.x,
                y: p.y,
                age: 0.0,
            });
        }
    }

    pub fn clear(&mut self) {
        for trail in &mut self.trails {
            trail.clear();
        }
    }

    fn render(&self, painter: &Painter, rect: Rect, particles: &[Particle], theme: &Theme) {
        let [r, g, b] = theme.palette.secondary;
        for (trail, p) in self.trails.iter().zip(particles) {
            if trail.len() < 2 {
                continue;
            }
            for w in trail.windows(2) {
                let (p0, p1) = (w[0], w[1]);
                let fade = 1.0 - (p0.age + p1.age) * 0.5;
                let alpha = (fade * p.alpha * 110.0) as u8;
                if alpha < 2 {
                    continue;
                }
                let a = rect.min + Vec2::new(p0.x, p0.y);
                let b2 = rect.min + Vec2::new(p1.x, p1.y);
                let thickness = (p.radius * 0.6 * fade).max(0.5);
                painter.line_segment(
                    [a, b2],
                    Stroke::new(thickness, Color32::from_rgba_unmultiplied(r, g, b, alpha)),
                );
            }
        }
    }
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a particle's base color from the theme. A per-shape style can
/// force the accent; otherwise most of the batch carries the primary with a
/// secondary minority for depth.
pub fn particle_color(theme: &Theme, field: &ParticleField, index: usize) -> [u8; 3] {
    let shape = field.state().shape;
    if let Some(style) = theme.style_for(shape) {
        if style.use_accent {
            return theme.palette.accent;
        }
    }
    if hash01(index, 7901) < 0.7 {
        theme.palette.primary
    } else {
        theme.palette.secondary
    }
}

/// Per-shape alpha boost from the theme, 1.0 when unstyled.
pub fn alpha_boost(theme: &Theme, field: &ParticleField) -> f32 {
    theme
        .style_for(field.state().shape)
        .map(|s| s.alpha_boost)
        .unwrap_or(1.0)
}

pub struct FieldRenderer {
    trails: TrailBuffer,
}

impl FieldRenderer {
    pub fn new() -> Self {
        Self {
            trails: TrailBuffer::new(),
        }
    }

    pub fn render(
        &mut self,
        painter: &Painter,
        rect: Rect,
        field: &ParticleField,
        theme: &Theme,
        dt: f32,
    ) {
        let state = field.state();
        let trails_on = state.trails_enabled.unwrap_or(theme.trails.enabled);

        // -- BACKGROUND --
        let [br, bg, bb] = theme.palette.background;
        painter.rect_filled(rect, 0.0, Color32::from_rgb(br, bg, bb));

        // -- TRAILS --
        if trails_on {
            self.trails.update(field.particles(), &theme.trails, dt);
            self.trails.render(painter, rect, field.particles(), theme);
        } else {
            self.trails.clear();
        }

        // -- PARTICLES --
        let boost = alpha_boost(theme, field);
        let tier = field.tier();
        let stride = if tier == PerformanceTier::Critical { 2 } else { 1 };
        let glow_pass = tier == PerformanceTier::Full;

        for (i, p) in field.particles().iter().enumerate() {
            if stride > 1 && i % stride != 0 {
                continue;
            }
            let alpha = (p.alpha * boost * 255.0).min(255.0) as u8;
            if alpha < 3 {
                continue;
            }
            let [r, g, b] = particle_color(theme, field, i);
            let pos = rect.min + Vec2::new(p.x, p.y);

            if glow_pass {
                let glow = Color32::from_rgba_unmultiplied(r, g, b, (alpha / 4).max(4));
                painter.circle_filled(pos, p.radius * 2.4, glow);
            }
            painter.circle_filled(
                pos,
                p.radius.max(0.4),
                Color32::from_rgba_unmultiplied(r, g, b, alpha),
            );

            // -- STREAKS: fast movers leave a short velocity tail --
            let speed = p.speed();
            if speed > STREAK_SPEED {
                let tail = Pos2::new(pos.x - p.vx * STREAK_REACH, pos.y - p.vy * STREAK_REACH);
                let streak = Color32::from_rgba_unmultiplied(r, g, b, (alpha / 2).max(2));
                painter.line_segment([tail, pos], Stroke::new((p.radius * 0.5).max(0.4), streak));
            }
        }
    }
}

impl Default for FieldRenderer {
    fn default() -> Self {
        Self::new()
    }
}
