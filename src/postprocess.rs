//! CPU post-processing over the offscreen frame buffer: the fading fill
//! that turns frame history into motion trails, and the bloom pass.

use image::{ImageBuffer, Rgb};

use crate::theme::BloomSettings;

pub type FrameBuffer = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Bloom runs on a quarter-resolution copy; radii in [`BloomSettings`] are
/// full-resolution pixels.
const BLOOM_DOWNSCALE: u32 = 4;

/// Blend every pixel toward the background, keeping `keep` of its distance.
/// Run before drawing a frame so the previous frame decays into trails
/// instead of being cleared.
pub fn fade_fill(buffer: &mut FrameBuffer, background: [u8; 3], keep: f32) {
    let keep = keep.clamp(0.0, 1.0);
    for pixel in buffer.pixels_mut() {
        for c in 0..3 {
            pixel[c] = step_toward(pixel[c], background[c], keep);
        }
    }
}

/// One decay step; rounds toward the target so repeated steps converge
/// exactly instead of parking a few counts away.
fn step_toward(value: u8, target: u8, keep: f32) -> u8 {
    let v = value as f32;
    let t = target as f32;
    let next = t + (v - t) * keep;
    let next = if v > t { next.floor() } else { next.ceil() };
    next.clamp(0.0, 255.0) as u8
}

pub fn apply_bloom(buffer: &mut FrameBuffer, settings: &BloomSettings) {
    if !settings.enabled || settings.intensity <= 0.0 {
        return;
    }
    let width = buffer.width();
    let height = buffer.height();
    if width < BLOOM_DOWNSCALE || height < BLOOM_DOWNSCALE {
        return;
    }
    let small_w = width / BLOOM_DOWNSCALE;
    let small_h = height / BLOOM_DOWNSCALE;

    // -- THRESHOLD + DOWNSCALE --
    let threshold = settings.threshold.clamp(0.0, 1.0);
    let mut bright = vec![[0.0f32; 3]; (small_w * small_h) as usize];
    for sy in 0..small_h {
        for sx in 0..small_w {
            let p = buffer.get_pixel(sx * BLOOM_DOWNSCALE, sy * BLOOM_DOWNSCALE);
            let lum = (p[0] as f32 + p[1] as f32 + p[2] as f32) / (3.0 * 255.0);
            if lum > threshold {
                let gain = (lum - threshold) / (1.0 - threshold + 1e-3);
                bright[(sy * small_w + sx) as usize] = [
                    p[0] as f32 * gain,
                    p[1] as f32 * gain,
                    p[2] as f32 * gain,
                ];
            }
        }
    }

    // -- SEPARABLE GAUSSIAN --
    let sigma = (settings.radius as f32 / BLOOM_DOWNSCALE as f32).max(1.0);
    let taps = (((sigma * 3.0) as usize) * 2 + 1).min(15);
    let kernel = gaussian_kernel(taps, sigma);
    let mut temp = bright.clone();
    blur_horizontal(&bright, &mut temp, small_w, small_h, &kernel);
    blur_vertical(&temp, &mut bright, small_w, small_h, &kernel);

    // -- ADDITIVE UPSCALE --
    for y in 0..height {
        for x in 0..width {
            let sx = (x / BLOOM_DOWNSCALE).min(small_w - 1);
            let sy = (y / BLOOM_DOWNSCALE).min(small_h - 1);
            let [br, bg, bb] = bright[(sy * small_w + sx) as usize];
            let p = buffer.get_pixel_mut(x, y);
            p[0] = (p[0] as f32 + br * settings.intensity).min(255.0) as u8;
            p[1] = (p[1] as f32 + bg * settings.intensity).min(255.0) as u8;
            p[2] = (p[2] as f32 + bb * settings.intensity).min(255.0) as u8;
        }
    }
}

/// Mean luminance of the buffer in [0, 1].
pub fn mean_luminance(buffer: &FrameBuffer) -> f32 {
    let mut sum = 0.0f64;
    for p in buffer.pixels() {
        sum += (p[0] as f64 + p[1] as f64 + p[2] as f64) / (3.0 * 255.0);
    }
    let count = (buffer.width() as f64 * buffer.height() as f64).max(1.0);
    (sum / count) as f32
}

fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = vec![0.0f32; size];
    let center = size as f32 / 2.0;
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - center;
        *k = (-x * x / (2.0 * sigma * sigma)).exp();
        sum += *k;
    }
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

fn blur_horizontal(src: &[[f32; 3]], dst: &mut [[f32; 3]], width: u32, height: u32, kernel: &[f32]) {
    let half = kernel.len() / 2;
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as i32 + ki as i32 - half as i32).clamp(0, width as i32 - 1) as u32;
                let s = src[(y * width + sx) as usize];
                acc[0] += s[0] * kv;
                acc[1] += s[1] * kv;
                acc[2] += s[2] * kv;
            }
            dst[(y * width + x) as usize] = acc;
        }
    }
}

fn blur_vertical(src: &[[f32; 3]], dst: &mut [[f32; 3]], width: u32, height: u32, kernel: &[f32]) {
    let half = kernel.len() / 2;
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as i32 + ki as i32 - half as i32).clamp(0, height as i32 - 1) as u32;
                let s = src[(sy * width + x) as usize];
                acc[0] += s[0] * kv;
                acc[1] += s[1] * kv;
                acc[2] += s[2] * kv;
            }
            dst[(y * width + x) as usize] = acc;
        }
    }
}
