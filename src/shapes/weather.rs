//! Weather effects: sun, cloud layers, looping rain, storm cells with
//! lightning and drifting snow. Rain, storm rain and snow are teleport loops
//! along the vertical axis so drops never spring back up the screen.

use std::f32::consts::TAU;

use crate::config::WeatherKind;
use crate::motion::{
    hash01, hash_signed, FRICTION_DRIFT, FRICTION_LOOSE, FRICTION_STANDARD, GOLDEN_ANGLE,
    SPRING_GENTLE, SPRING_MEDIUM, SPRING_SNAPPY,
};
use crate::shapes::text::{
    advance_units, glyph_for, offset_units, slot_for, CellSlot, GLYPH_BUDGET, GLYPH_ROWS,
};
use crate::shapes::{ShapeContext, ShapeResult, Teleport};

const SUN_CORE_FRAC: f32 = 0.2;
const SUN_RAY_FRAC: f32 = 0.35;
const SUN_RAYS: usize = 12;
const CLOUD_PUFFS: usize = 5;
const RAIN_FALL_SECS: f32 = 0.9;
const SNOW_FALL_SECS: f32 = 6.5;
const SNOW_CLASSES: usize = 3;

pub fn weather(ctx: &ShapeContext) -> ShapeResult {
    let kind = ctx.state.weather.unwrap_or(WeatherKind::Sunny);

    // The tail of the batch spells the temperature readout when one is set.
    let temp_chars = temperature_chars(ctx);
    let temp_budget = temp_chars.len() * GLYPH_BUDGET;
    let effect_total = ctx.total.saturating_sub(temp_budget).max(1);
    if temp_budget > 0 && ctx.index >= effect_total {
        return temperature_cell(ctx, &temp_chars, ctx.index - effect_total);
    }

    match kind {
        WeatherKind::Sunny => sunny(ctx, ctx.index, effect_total),
        WeatherKind::Cloudy => cloudy(ctx, ctx.index, 1.0),
        WeatherKind::Rainy => rainy(ctx, ctx.index, effect_total),
        WeatherKind::Stormy => stormy(ctx, ctx.index, effect_total),
        WeatherKind::Snowy => snowy(ctx, ctx.index),
    }
}

fn temperature_chars(ctx: &ShapeContext) -> Vec<char> {
    match ctx.state.temperature {
        Some(t) if t.is_finite() => {
            let mut s = format!("{}", t.round() as i32);
            s.push('\u{00B0}');
            s.chars().collect()
        }
        _ => Vec::new(),
    }
}

/// Small lettering in the upper right corner, reusing the glyph table with a
/// corner-anchored layout.
fn temperature_cell(ctx: &ShapeContext, chars: &[char], local: usize) -> ShapeResult {
    match slot_for(chars, local) {
        CellSlot::On {
            char_idx,
            row,
            col,
        } => {
            let cell = (ctx.min_dim() * 0.022).max(1.0);
            let units = advance_units(chars);
            let origin_x = ctx.width * 0.82 - units * cell / 2.0;
            let origin_y = ctx.height * 0.14 - GLYPH_ROWS as f32 * cell / 2.0;
            let x = origin_x + (offset_units(chars, char_idx) + col as f32 + 0.5) * cell;
            let y = origin_y + (row as f32 + 0.5) * cell;
            ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.03).with_alpha(0.8)
        }
        _ => ShapeResult::hidden(ctx),
    }
}

// ============================================================================
// Conditions
// ============================================================================

fn sunny(ctx: &ShapeContext, idx: usize, n: usize) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let drive = ctx.drive();
    let core_n = (n as f32 * SUN_CORE_FRAC) as usize;
    let ray_n = (n as f32 * SUN_RAY_FRAC) as usize;
    let sun_r = ctx.min_dim() * 0.13;

    if idx < core_n {
        // Disc on a golden spiral.
        let u = (idx as f32 + 0.5) / core_n.max(1) as f32;
        let angle = GOLDEN_ANGLE * idx as f32 + ctx.time * 0.1;
        let r = sun_r * u.sqrt() * (1.0 + 0.03 * (ctx.time * 1.5).sin());
        ShapeResult::new(
            cx + angle.cos() * r,
            cy + angle.sin() * r,
            SPRING_MEDIUM,
            FRICTION_STANDARD,
            0.1,
        )
        .with_alpha(0.9)
        .with_depth(1.2)
    } else if idx < core_n + ray_n {
        let i = idx - core_n;
        let ray = i % SUN_RAYS;
        let per = (ray_n / SUN_RAYS).max(1);
        let u = ((i / SUN_RAYS) as f32 + 0.5) / per as f32;
        let angle = ray as f32 / SUN_RAYS as f32 * TAU + ctx.time * 0.05;
        let pulse = 0.8 + 0.2 * (ctx.time * 2.0 + ray as f32).sin();
        let r = sun_r * 1.25 + u * sun_r * 1.6 * pulse * (1.0 + drive * 0.3);
        ShapeResult::new(
            cx + angle.cos() * r,
            cy + angle.sin() * r,
            SPRING_MEDIUM,
            FRICTION_STANDARD,
            0.12,
        )
        .with_alpha(0.55 * (1.0 - u * 0.6))
    } else {
        // Sky sparkle.
        let i = idx - core_n - ray_n;
        let x = ctx.width * hash01(i, 811);
        let y = ctx.height * hash01(i, 821);
        let tw = (ctx.time * (0.9 + hash01(i, 823)) + hash01(i, 827) * TAU).sin() * 0.5 + 0.5;
        ShapeResult::new(x, y, SPRING_GENTLE, FRICTION_DRIFT, 0.1)
            .with_alpha(0.05 + 0.25 * tw)
            .with_depth(0.6)
    }
}

/// `gloom` darkens the deck for storm cells reusing the same puffs.
fn cloudy(ctx: &ShapeContext, idx: usize, gloom: f32) -> ShapeResult {
    let (cx, _) = ctx.center();
    let puff = idx % CLOUD_PUFFS;
    let pf = puff as f32;
    let deck_y = ctx.height * 0.3;

    let anchor_x = cx + (pf - (CLOUD_PUFFS as f32 - 1.0) / 2.0) * ctx.width * 0.14
        + (ctx.time * 0.15 + pf * 1.7).sin() * ctx.width * 0.04;
    let anchor_y = deck_y + (pf * 2.3).sin() * ctx.height * 0.04;

    let i = idx / CLOUD_PUFFS;
    let spread_a = hash01(i + puff * 977, 829) * TAU;
    let spread_r = hash01(i + puff * 977, 839).powf(0.6);
    let puff_r = ctx.min_dim() * 0.085;
    let x = anchor_x + spread_a.cos() * spread_r * puff_r * 2.1;
    let y = anchor_y + spread_a.sin() * spread_r * puff_r * 0.85;

    ShapeResult::new(x, y, SPRING_GENTLE, FRICTION_DRIFT, 0.22)
        .with_alpha((0.5 - spread_r * 0.3) * gloom.clamp(0.3, 1.0))
        .with_depth(0.9 + 0.3 * (1.0 - spread_r))
}

fn rainy(ctx: &ShapeContext, idx: usize, n: usize) -> ShapeResult {
    let cloud_n = (n as f32 * 0.22) as usize;
    if idx < cloud_n {
        return cloudy(ctx, idx, 0.8);
    }
    rain_streak(ctx, idx - cloud_n, 1.0, 0.06)
}

fn stormy(ctx: &ShapeContext, idx: usize, n: usize) -> ShapeResult {
    let cloud_n = (n as f32 * 0.28) as usize;
    let bolt_n = (n as f32 * 0.08) as usize;
    if idx < cloud_n {
        return cloudy(ctx, idx, 0.45);
    }
    if idx < cloud_n + bolt_n {
        return lightning(ctx, idx - cloud_n, bolt_n);
    }
    // Storm rain falls harder and more slanted.
    rain_streak(ctx, idx - cloud_n - bolt_n, 1.45, 0.16)
}

/// Vertical modular loop: position fully prescribed each frame, velocity
/// tracks the fall and the sway so streak rendering has something to stretch
/// along.
fn rain_streak(ctx: &ShapeContext, i: usize, speed: f32, slant: f32) -> ShapeResult {
    let margin = ctx.height * 0.08;
    let span = ctx.height + 2.0 * margin;
    let rate = (0.85 + 0.3 * hash01(i, 853)) * speed / RAIN_FALL_SECS;
    let phase = (hash01(i, 857) + ctx.time * rate) % 1.0;

    let y = phase * span - margin;
    // Wind: one sine sway per fall, scattered in phase across the drops.
    let sway = phase * TAU + hash01(i, 947) * TAU;
    let drift = sway.sin() * slant * ctx.height;
    let x = (ctx.width * hash01(i, 859) + drift).rem_euclid(ctx.width.max(1.0));
    let vy = span * rate / 60.0;
    let vx = sway.cos() * slant * ctx.height * TAU * rate / 60.0;

    ShapeResult::new(x, y, 0.0, FRICTION_LOOSE, 0.0)
        .with_teleport(Teleport { x, y, vx, vy })
        .with_alpha(0.35 + 0.3 * hash01(i, 863))
        .with_depth(0.5 + 0.6 * hash01(i, 877))
}

/// Jagged bolts below the deck, visible only during their flash window.
fn lightning(ctx: &ShapeContext, i: usize, n: usize) -> ShapeResult {
    let bolt = i % 2;
    let u = ((i / 2) as f32 + 0.5) / (n / 2).max(1) as f32;
    let seed = bolt * 4099;

    let flash_phase = (ctx.time * 0.45 + hash01(seed, 881)) % 1.0;
    let visible = flash_phase < 0.09;
    let flicker = if visible {
        (1.0 - flash_phase / 0.09) * (0.6 + 0.4 * (ctx.time * 40.0).sin().abs())
    } else {
        0.0
    };

    let top = ctx.height * 0.34;
    let bottom = ctx.height * 0.78;
    let base_x = ctx.width * (0.3 + 0.4 * hash01(seed, 883));
    // Cumulative per-segment kinks give the jag.
    let mut x_off = 0.0;
    let seg = (u * 7.0) as usize;
    for s in 0..=seg {
        x_off += hash_signed(s + seed, 887) * ctx.width * 0.03;
    }
    let x = base_x + x_off;
    let y = top + u * (bottom - top);

    ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.0)
        .with_alpha(flicker)
        .with_depth(1.4)
}

fn snowy(ctx: &ShapeContext, idx: usize) -> ShapeResult {
    let class = idx % SNOW_CLASSES;
    let cf = class as f32;
    let i = idx;

    let size = 0.8 + cf * 0.7;
    let fall = (0.8 + cf * 0.25 + 0.15 * hash01(i, 907)) / SNOW_FALL_SECS;
    let margin = ctx.height * 0.06;
    let span = ctx.height + 2.0 * margin;
    let phase = (hash01(i, 911) + ctx.time * fall) % 1.0;

    let sway_amp = ctx.width * (0.012 + cf * 0.012);
    let sway = (ctx.time * (0.4 + cf * 0.15) + hash01(i, 919) * TAU).sin() * sway_amp;

    // Slow tumble around the drift line, direction hashed per flake.
    let dir = if hash01(i, 937) < 0.5 { 1.0 } else { -1.0 };
    let rot = (ctx.time * (0.5 - cf * 0.12) + hash01(i, 941) * TAU) * dir;
    let twirl = 1.5 + cf * 1.2;

    let x = (ctx.width * hash01(i, 929) + sway + rot.cos() * twirl)
        .rem_euclid(ctx.width.max(1.0));
    let y = phase * span - margin + rot.sin() * twirl;
    let vy = span * fall / 60.0;

    ShapeResult::new(x, y, 0.0, FRICTION_LOOSE, 0.0)
        .with_teleport(Teleport {
            x,
            y,
            vx: 0.0,
            vy,
        })
        .with_alpha(0.35 + cf * 0.2)
        .with_depth(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VisualState, WeatherKind};
    use crate::shapes::ShapeContext;

    const W: f32 = 1100.0;
    const H: f32 = 750.0;

    fn ctx<'a>(state: &'a VisualState, index: usize, time: f32) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 1500,
            width: W,
            height: H,
            time,
            audio_raw: 0.1,
            audio_smooth: 0.1,
            prev_x: W / 2.0,
            prev_y: H / 2.0,
            prev_alpha: 0.4,
            state,
            clock_text: None,
            landmarks: None,
        }
    }

    fn state_with(kind: WeatherKind) -> VisualState {
        let mut state = VisualState::default();
        state.weather = Some(kind);
        state
    }

    #[test]
    fn rain_teleports_inside_the_vertical_loop() {
        let state = state_with(WeatherKind::Rainy);
        for i in (400..1500).step_by(37) {
            for t in 0..30 {
                let r = weather(&ctx(&state, i, t as f32 * 0.33));
                if let Some(tp) = r.teleport {
                    assert!(tp.y >= -H * 0.1 && tp.y <= H * 1.1, "drop left the loop");
                    assert!(tp.x >= 0.0 && tp.x < W);
                    assert!(tp.vy > 0.0, "rain falls down");
                }
            }
        }
    }

    #[test]
    fn snow_falls_slower_than_rain() {
        let rain_state = state_with(WeatherKind::Rainy);
        let snow_state = state_with(WeatherKind::Snowy);
        let rain = weather(&ctx(&rain_state, 1200, 1.0)).teleport.unwrap();
        let snow = weather(&ctx(&snow_state, 1200, 1.0)).teleport.unwrap();
        assert!(rain.vy > snow.vy * 2.0, "rain {} vs snow {}", rain.vy, snow.vy);
    }

    #[test]
    fn wind_sways_drops_both_ways_within_a_fall() {
        let state = state_with(WeatherKind::Rainy);
        // Indexes past the 22% cloud deck are streaks.
        for &i in &[520_usize, 701, 1133] {
            let mut left = false;
            let mut right = false;
            let mut prev: Option<(f32, f32)> = None;
            for step in 0..90 {
                let r = weather(&ctx(&state, i, step as f32 / 60.0));
                let tp = r.teleport.expect("streaks are prescribed every frame");
                if let Some((px, py)) = prev {
                    let falling = tp.y > py;
                    let wrapped = (tp.x - px).abs() > W * 0.5;
                    if falling && !wrapped {
                        left |= tp.x < px - 1e-3;
                        right |= tp.x > px + 1e-3;
                    }
                }
                prev = Some((tp.x, tp.y));
            }
            assert!(left, "drop {i} never swayed left");
            assert!(right, "drop {i} never swayed right");
        }
    }

    #[test]
    fn lightning_is_dark_outside_its_flash_window() {
        let state = state_with(WeatherKind::Stormy);
        let cloud_n = (1500.0 * 0.28) as usize;
        let mut dark_frames = 0;
        let mut lit_frames = 0;
        for t in 0..80 {
            let r = weather(&ctx(&state, cloud_n + 4, t as f32 * 0.1));
            if r.target_alpha.unwrap() == 0.0 {
                dark_frames += 1;
            } else {
                lit_frames += 1;
            }
        }
        assert!(dark_frames > lit_frames, "bolts flash briefly");
        assert!(lit_frames > 0, "bolts must flash at some point");
    }

    #[test]
    fn temperature_tail_spells_the_readout() {
        let mut state = state_with(WeatherKind::Sunny);
        state.temperature = Some(23.4);
        // "23°" consumes the last 3 * 25 slots.
        let tail_start = 1500 - 3 * GLYPH_BUDGET;
        let mut lit = 0;
        for i in tail_start..1500 {
            let r = weather(&ctx(&state, i, 0.5));
            if r.target_alpha.unwrap_or(0.0) > 0.5 {
                assert!(r.tx > W * 0.6, "readout sits in the upper right");
                assert!(r.ty < H * 0.3);
                lit += 1;
            }
        }
        let expected: usize = "23\u{00B0}".chars().map(|c| glyph_for(c).lit_cells()).sum();
        assert_eq!(lit, expected);
    }

    #[test]
    fn cloud_puffs_hug_the_deck() {
        let state = state_with(WeatherKind::Cloudy);
        for i in (0..600).step_by(11) {
            let r = weather(&ctx(&state, i, 2.0));
            assert!(r.ty < H * 0.55, "clouds stay in the upper half: {}", r.ty);
            assert!(r.teleport.is_none(), "clouds drift on springs");
        }
    }
}
