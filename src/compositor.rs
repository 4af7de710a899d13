//! Offscreen compositor: rasterizes the particle field into an RGB image
//! buffer and runs the post pass over the snapshot. The windowed demo
//! paints through egui instead; this path serves headless rendering and
//! the end-to-end tests.

use anyhow::Context as _;
use image::ImageBuffer;
use std::path::Path;

use crate::field::ParticleField;
use crate::postprocess::{apply_bloom, fade_fill, FrameBuffer};
use crate::render::{alpha_boost, particle_color, STREAK_REACH, STREAK_SPEED};
use crate::theme::Theme;

pub struct Compositor {
    width: u32,
    height: u32,
    buffer: FrameBuffer,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            buffer: ImageBuffer::new(width, height),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.buffer = ImageBuffer::new(width, height);
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Compose one frame: decay or clear the history, stamp every particle
    /// additively, then bloom. State toggles override the theme's defaults.
    pub fn render_frame(&mut self, field: &ParticleField, theme: &Theme) {
        let state = field.state();
        let bg = theme.palette.background;

        // -- HISTORY: fade into trails, or hard clear --
        let trails_on = state.trails_enabled.unwrap_or(theme.trails.enabled);
        let keep = if trails_on { theme.trails.fade } else { 0.0 };
        fade_fill(&mut self.buffer, bg, keep);

        // -- PARTICLES --
        let boost = alpha_boost(theme, field);
        for (i, p) in field.particles().iter().enumerate() {
            let alpha = (p.alpha * boost).clamp(0.0, 1.0);
            if alpha < 0.02 {
                continue;
            }
            let color = particle_color(theme, field, i);
            self.stamp(p.x, p.y, p.radius, color, alpha);

            // Fast movers get a fading tail stamped along the velocity.
            if p.speed() > STREAK_SPEED {
                for s in 1..=3 {
                    let f = s as f32 / 3.0;
                    self.stamp(
                        p.x - p.vx * STREAK_REACH * f,
                        p.y - p.vy * STREAK_REACH * f,
                        p.radius * (1.0 - f * 0.5),
                        color,
                        alpha * (1.0 - f) * 0.5,
                    );
                }
            }
        }

        // -- POST --
        let mut bloom = theme.bloom.clone();
        if let Some(on) = state.bloom_enabled {
            bloom.enabled = on;
        }
        apply_bloom(&mut self.buffer, &bloom);
    }

    /// Additive soft-edged disc.
    fn stamp(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 3], alpha: f32) {
        if !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let r = radius.max(0.6);
        let reach = r.ceil() as i32;
        let x0 = cx.round() as i32;
        let y0 = cy.round() as i32;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let d2 = (dx * dx + dy * dy) as f32;
                if d2 > r * r {
                    continue;
                }
                let px = x0 + dx;
                let py = y0 + dy;
                if px < 0 || py < 0 || px >= self.width as i32 || py >= self.height as i32 {
                    continue;
                }
                let edge = (1.0 - d2.sqrt() / r).max(0.0) * alpha;
                let pixel = self.buffer.get_pixel_mut(px as u32, py as u32);
                pixel[0] = (pixel[0] as f32 + color[0] as f32 * edge).min(255.0) as u8;
                pixel[1] = (pixel[1] as f32 + color[1] as f32 * edge).min(255.0) as u8;
                pixel[2] = (pixel[2] as f32 + color[2] as f32 * edge).min(255.0) as u8;
            }
        }
    }

    /// Write the current buffer as a PNG snapshot.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.buffer
            .save(path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::postprocess::mean_luminance;

    fn small_field() -> ParticleField {
        let config = EngineConfig {
            baseline_count: 300,
            ..EngineConfig::default()
        };
        let mut field = ParticleField::new(config, 320.0, 240.0);
        for _ in 0..90 {
            field.advance(1.0 / 60.0);
        }
        field
    }

    fn region_luminance(buffer: &FrameBuffer, x0: u32, y0: u32, x1: u32, y1: u32) -> f32 {
        let mut sum = 0.0f64;
        let mut n = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = buffer.get_pixel(x, y);
                sum += (p[0] as f64 + p[1] as f64 + p[2] as f64) / (3.0 * 255.0);
                n += 1;
            }
        }
        (sum / n.max(1) as f64) as f32
    }

    #[test]
    fn orb_light_gathers_at_the_center() {
        let field = small_field();
        let theme = Theme::midnight();
        let mut compositor = Compositor::new(320, 240);
        compositor.render_frame(&field, &theme);

        let center = region_luminance(compositor.buffer(), 110, 70, 210, 170);
        let corner = region_luminance(compositor.buffer(), 0, 0, 50, 50);
        assert!(
            center > corner,
            "orb should light the middle: center {center} corner {corner}"
        );
    }

    #[test]
    fn bloom_brightens_the_frame() {
        let field = small_field();
        let theme = Theme::midnight();

        let mut with_bloom = Compositor::new(320, 240);
        with_bloom.render_frame(&field, &theme);

        let mut without = Compositor::new(320, 240);
        let mut dark_theme = Theme::midnight();
        dark_theme.bloom.enabled = false;
        without.render_frame(&field, &dark_theme);

        assert!(mean_luminance(with_bloom.buffer()) > mean_luminance(without.buffer()));
    }

    #[test]
    fn resize_rebuilds_the_buffer() {
        let mut compositor = Compositor::new(100, 100);
        compositor.resize(200, 150);
        assert_eq!(compositor.size(), (200, 150));
        assert_eq!(compositor.buffer().width(), 200);
        assert_eq!(compositor.buffer().height(), 150);
    }
}
