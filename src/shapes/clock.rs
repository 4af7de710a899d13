//! Clock face: the wall-clock string in particle lettering with a seconds
//! progress ring around it. The host preformats the time; "HH:MM" is spelled
//! out and an optional ":SS" suffix drives the ring.

use std::f32::consts::{PI, TAU};

use crate::motion::{FRICTION_STANDARD, SPRING_GENTLE, SPRING_SNAPPY};
use crate::shapes::text::{cell_position, slot_for, CellSlot, GLYPH_BUDGET};
use crate::shapes::{ShapeContext, ShapeResult};

const DISPLAY_CHARS: usize = 5; // "09:41"

pub fn clock(ctx: &ShapeContext) -> ShapeResult {
    let raw = match ctx.clock_text {
        Some(t) if t.len() >= DISPLAY_CHARS => t,
        _ => return dial_only(ctx, 0.0),
    };
    let chars: Vec<char> = raw.chars().take(DISPLAY_CHARS).collect();
    let seconds_progress = parse_seconds(raw);

    match slot_for(&chars, ctx.index) {
        CellSlot::On {
            char_idx,
            row,
            col,
        } => {
            let (x, y) = cell_position(
                &chars, char_idx, row, col, ctx.index, ctx.width, ctx.height, ctx.time,
            );
            ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.04)
                .with_alpha(0.9)
                .with_depth(1.1)
        }
        CellSlot::Off => ShapeResult::hidden(ctx),
        CellSlot::Overflow => seconds_ring(ctx, chars.len() * GLYPH_BUDGET, seconds_progress),
    }
}

/// ":SS" suffix after "HH:MM", if the host included one.
fn parse_seconds(raw: &str) -> f32 {
    let bytes = raw.as_bytes();
    if bytes.len() >= 8 && bytes[5] == b':' {
        if let Some(s) = raw.get(6..8).and_then(|t| t.parse::<u32>().ok()) {
            return (s.min(59) as f32) / 60.0;
        }
    }
    0.0
}

/// Ring of minute ticks around the lettering; ticks up to the current
/// seconds progress glow, the rest stay a faint track.
fn seconds_ring(ctx: &ShapeContext, first_index: usize, progress: f32) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let spare = ctx.total.saturating_sub(first_index).max(1);
    let u = (ctx.index - first_index.min(ctx.index)) as f32 / spare as f32;
    let angle = -PI / 2.0 + u * TAU;
    let r = ctx.min_dim() * 0.36;

    let lit = u <= progress;
    let head = progress > 0.0 && (u - progress).abs() < 0.01;
    let alpha = if head {
        0.9
    } else if lit {
        0.45
    } else {
        0.07
    };

    ShapeResult::new(
        cx + angle.cos() * r,
        cy + angle.sin() * r,
        SPRING_GENTLE,
        FRICTION_STANDARD,
        0.05,
    )
    .with_alpha(alpha)
    .with_depth(if head { 1.6 } else { 0.8 })
}

fn dial_only(ctx: &ShapeContext, progress: f32) -> ShapeResult {
    seconds_ring(ctx, 0, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::text::glyph_for;
    use crate::shapes::ShapeContext;

    fn ctx_with_clock<'a>(
        state: &'a VisualState,
        clock: Option<&'a str>,
        index: usize,
    ) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 1200,
            width: 1000.0,
            height: 700.0,
            time: 0.0,
            audio_raw: 0.0,
            audio_smooth: 0.0,
            prev_x: 500.0,
            prev_y: 350.0,
            prev_alpha: 0.3,
            state,
            clock_text: clock,
            landmarks: None,
        }
    }

    #[test]
    fn nine_forty_one_lights_exactly_the_glyph_cells() {
        let state = VisualState::default();
        let chars: Vec<char> = "09:41".chars().collect();
        let budget = chars.len() * GLYPH_BUDGET;
        let mut lit = 0;
        for i in 0..budget {
            let r = clock(&ctx_with_clock(&state, Some("09:41"), i));
            let alpha = r.target_alpha.unwrap();
            match slot_for(&chars, i) {
                CellSlot::On { .. } => {
                    assert!(alpha > 0.5, "lit cell {} must be visible", i);
                    lit += 1;
                }
                CellSlot::Off => assert_eq!(alpha, 0.0, "dark cell {} must hide", i),
                CellSlot::Overflow => unreachable!(),
            }
        }
        let expected: usize = chars.iter().map(|&c| glyph_for(c).lit_cells()).sum();
        assert_eq!(lit, expected, "lit particle count must match the face");
    }

    #[test]
    fn seconds_suffix_drives_the_ring() {
        let state = VisualState::default();
        let budget = DISPLAY_CHARS * GLYPH_BUDGET;
        // At :30, ticks in the first half of the dial glow.
        let early = clock(&ctx_with_clock(&state, Some("09:41:30"), budget + 10));
        let late = clock(&ctx_with_clock(&state, Some("09:41:30"), 1199));
        assert!(early.target_alpha.unwrap() > 0.3);
        assert!(late.target_alpha.unwrap() < 0.1);
    }

    #[test]
    fn missing_clock_string_degrades_to_the_dial() {
        let state = VisualState::default();
        let r = clock(&ctx_with_clock(&state, None, 7));
        assert!(r.tx.is_finite() && r.ty.is_finite());
        assert!(r.target_alpha.unwrap() <= 0.1, "dial track stays faint");
    }
}
