//! Particle text: a fixed bitmap font where every lit cell is one particle.
//! Glyphs are 5 rows tall and 1 to 5 columns wide; each character consumes a
//! fixed budget of 25 particles regardless of width, so strings map onto the
//! batch by plain integer division.

use std::f32::consts::TAU;

use crate::motion::{hash_signed, FRICTION_STANDARD, SPRING_GENTLE, SPRING_SNAPPY};
use crate::shapes::{ShapeContext, ShapeResult};

pub const GLYPH_ROWS: usize = 5;
pub const GLYPH_MAX_COLS: usize = 5;
/// Particles reserved per character, lit or not.
pub const GLYPH_BUDGET: usize = GLYPH_ROWS * GLYPH_MAX_COLS;
/// Column units of air between characters.
pub const GLYPH_SPACING: f32 = 1.0;
/// Longest string the field will attempt to spell.
pub const MAX_TEXT_CHARS: usize = 24;

/// Row bits are MSB-leftmost within `width` bits, so literals read like the
/// glyph itself.
pub struct Glyph {
    pub width: u8,
    pub rows: [u8; GLYPH_ROWS],
}

impl Glyph {
    pub fn cell(&self, row: usize, col: usize) -> bool {
        if row >= GLYPH_ROWS || col >= self.width as usize {
            return false;
        }
        (self.rows[row] >> (self.width as usize - 1 - col)) & 1 == 1
    }

    pub fn lit_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.count_ones() as usize)
            .sum()
    }
}

macro_rules! glyph {
    ($w:expr, $r0:expr, $r1:expr, $r2:expr, $r3:expr, $r4:expr) => {
        Glyph {
            width: $w,
            rows: [$r0, $r1, $r2, $r3, $r4],
        }
    };
}

static GLYPH_0: Glyph = glyph!(3, 0b111, 0b101, 0b101, 0b101, 0b111);
static GLYPH_1: Glyph = glyph!(3, 0b010, 0b110, 0b010, 0b010, 0b111);
static GLYPH_2: Glyph = glyph!(3, 0b111, 0b001, 0b111, 0b100, 0b111);
static GLYPH_3: Glyph = glyph!(3, 0b111, 0b001, 0b111, 0b001, 0b111);
static GLYPH_4: Glyph = glyph!(3, 0b101, 0b101, 0b111, 0b001, 0b001);
static GLYPH_5: Glyph = glyph!(3, 0b111, 0b100, 0b111, 0b001, 0b111);
static GLYPH_6: Glyph = glyph!(3, 0b111, 0b100, 0b111, 0b101, 0b111);
static GLYPH_7: Glyph = glyph!(3, 0b111, 0b001, 0b001, 0b010, 0b010);
static GLYPH_8: Glyph = glyph!(3, 0b111, 0b101, 0b111, 0b101, 0b111);
static GLYPH_9: Glyph = glyph!(3, 0b111, 0b101, 0b111, 0b001, 0b111);

static GLYPH_A: Glyph = glyph!(3, 0b010, 0b101, 0b111, 0b101, 0b101);
static GLYPH_B: Glyph = glyph!(3, 0b110, 0b101, 0b110, 0b101, 0b110);
static GLYPH_C: Glyph = glyph!(3, 0b011, 0b100, 0b100, 0b100, 0b011);
static GLYPH_D: Glyph = glyph!(3, 0b110, 0b101, 0b101, 0b101, 0b110);
static GLYPH_E: Glyph = glyph!(3, 0b111, 0b100, 0b111, 0b100, 0b111);
static GLYPH_F: Glyph = glyph!(3, 0b111, 0b100, 0b111, 0b100, 0b100);
static GLYPH_G: Glyph = glyph!(3, 0b011, 0b100, 0b101, 0b101, 0b011);
static GLYPH_H: Glyph = glyph!(3, 0b101, 0b101, 0b111, 0b101, 0b101);
static GLYPH_I: Glyph = glyph!(3, 0b111, 0b010, 0b010, 0b010, 0b111);
static GLYPH_J: Glyph = glyph!(3, 0b011, 0b001, 0b001, 0b101, 0b010);
static GLYPH_K: Glyph = glyph!(3, 0b101, 0b101, 0b110, 0b101, 0b101);
static GLYPH_L: Glyph = glyph!(3, 0b100, 0b100, 0b100, 0b100, 0b111);
static GLYPH_M: Glyph = glyph!(5, 0b10001, 0b11011, 0b10101, 0b10001, 0b10001);
static GLYPH_N: Glyph = glyph!(3, 0b110, 0b101, 0b101, 0b101, 0b101);
static GLYPH_O: Glyph = glyph!(3, 0b010, 0b101, 0b101, 0b101, 0b010);
static GLYPH_P: Glyph = glyph!(3, 0b110, 0b101, 0b110, 0b100, 0b100);
static GLYPH_Q: Glyph = glyph!(3, 0b010, 0b101, 0b101, 0b110, 0b001);
static GLYPH_R: Glyph = glyph!(3, 0b110, 0b101, 0b110, 0b101, 0b101);
static GLYPH_S: Glyph = glyph!(3, 0b011, 0b100, 0b010, 0b001, 0b110);
static GLYPH_T: Glyph = glyph!(3, 0b111, 0b010, 0b010, 0b010, 0b010);
static GLYPH_U: Glyph = glyph!(3, 0b101, 0b101, 0b101, 0b101, 0b111);
static GLYPH_V: Glyph = glyph!(3, 0b101, 0b101, 0b101, 0b101, 0b010);
static GLYPH_W: Glyph = glyph!(5, 0b10001, 0b10001, 0b10101, 0b11011, 0b10001);
static GLYPH_X: Glyph = glyph!(3, 0b101, 0b101, 0b010, 0b101, 0b101);
static GLYPH_Y: Glyph = glyph!(3, 0b101, 0b101, 0b010, 0b010, 0b010);
static GLYPH_Z: Glyph = glyph!(3, 0b111, 0b001, 0b010, 0b100, 0b111);

static GLYPH_SPACE: Glyph = glyph!(2, 0b00, 0b00, 0b00, 0b00, 0b00);
static GLYPH_COLON: Glyph = glyph!(1, 0b0, 0b1, 0b0, 0b1, 0b0);
static GLYPH_PERIOD: Glyph = glyph!(1, 0b0, 0b0, 0b0, 0b0, 0b1);
static GLYPH_COMMA: Glyph = glyph!(1, 0b0, 0b0, 0b0, 0b1, 0b1);
static GLYPH_MINUS: Glyph = glyph!(3, 0b000, 0b000, 0b111, 0b000, 0b000);
static GLYPH_PLUS: Glyph = glyph!(3, 0b000, 0b010, 0b111, 0b010, 0b000);
static GLYPH_BANG: Glyph = glyph!(1, 0b1, 0b1, 0b1, 0b0, 0b1);
static GLYPH_QUESTION: Glyph = glyph!(3, 0b111, 0b001, 0b011, 0b000, 0b010);
static GLYPH_DEGREE: Glyph = glyph!(2, 0b11, 0b11, 0b00, 0b00, 0b00);
static GLYPH_PERCENT: Glyph = glyph!(3, 0b101, 0b001, 0b010, 0b100, 0b101);
static GLYPH_APOS: Glyph = glyph!(1, 0b1, 0b1, 0b0, 0b0, 0b0);
static GLYPH_SLASH: Glyph = glyph!(3, 0b001, 0b001, 0b010, 0b100, 0b100);
static GLYPH_UNKNOWN: Glyph = glyph!(3, 0b111, 0b111, 0b111, 0b111, 0b111);

pub fn glyph_for(c: char) -> &'static Glyph {
    match c.to_ascii_uppercase() {
        '0' => &GLYPH_0,
        '1' => &GLYPH_1,
        '2' => &GLYPH_2,
        '3' => &GLYPH_3,
        '4' => &GLYPH_4,
        '5' => &GLYPH_5,
        '6' => &GLYPH_6,
        '7' => &GLYPH_7,
        '8' => &GLYPH_8,
        '9' => &GLYPH_9,
        'A' => &GLYPH_A,
        'B' => &GLYPH_B,
        'C' => &GLYPH_C,
        'D' => &GLYPH_D,
        'E' => &GLYPH_E,
        'F' => &GLYPH_F,
        'G' => &GLYPH_G,
        'H' => &GLYPH_H,
        'I' => &GLYPH_I,
        'J' => &GLYPH_J,
        'K' => &GLYPH_K,
        'L' => &GLYPH_L,
        'M' => &GLYPH_M,
        'N' => &GLYPH_N,
        'O' => &GLYPH_O,
        'P' => &GLYPH_P,
        'Q' => &GLYPH_Q,
        'R' => &GLYPH_R,
        'S' => &GLYPH_S,
        'T' => &GLYPH_T,
        'U' => &GLYPH_U,
        'V' => &GLYPH_V,
        'W' => &GLYPH_W,
        'X' => &GLYPH_X,
        'Y' => &GLYPH_Y,
        'Z' => &GLYPH_Z,
        ' ' => &GLYPH_SPACE,
        ':' => &GLYPH_COLON,
        '.' => &GLYPH_PERIOD,
        ',' => &GLYPH_COMMA,
        '-' => &GLYPH_MINUS,
        '+' => &GLYPH_PLUS,
        '!' => &GLYPH_BANG,
        '?' => &GLYPH_QUESTION,
        '\u{00B0}' => &GLYPH_DEGREE,
        '%' => &GLYPH_PERCENT,
        '\'' => &GLYPH_APOS,
        '/' => &GLYPH_SLASH,
        _ => &GLYPH_UNKNOWN,
    }
}

// ============================================================================
// Batch-to-cell mapping
// ============================================================================

/// Where a particle lands in a string's cell grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSlot {
    /// A lit cell of `char_idx`'s glyph.
    On {
        char_idx: usize,
        row: usize,
        col: usize,
    },
    /// Inside a character's budget but on a dark cell: render transparent.
    Off,
    /// Past the end of the string's total budget.
    Overflow,
}

pub fn slot_for(chars: &[char], index: usize) -> CellSlot {
    let char_idx = index / GLYPH_BUDGET;
    if char_idx >= chars.len() {
        return CellSlot::Overflow;
    }
    let cell = index % GLYPH_BUDGET;
    let col = cell % GLYPH_MAX_COLS;
    let row = cell / GLYPH_MAX_COLS;
    if glyph_for(chars[char_idx]).cell(row, col) {
        CellSlot::On {
            char_idx,
            row,
            col,
        }
    } else {
        CellSlot::Off
    }
}

/// Total width of the string in column units, spacing included.
pub fn advance_units(chars: &[char]) -> f32 {
    if chars.is_empty() {
        return 0.0;
    }
    let cols: f32 = chars
        .iter()
        .map(|&c| glyph_for(c).width as f32)
        .sum();
    cols + GLYPH_SPACING * (chars.len() - 1) as f32
}

/// Left edge of `char_idx` in column units.
pub fn offset_units(chars: &[char], char_idx: usize) -> f32 {
    chars[..char_idx]
        .iter()
        .map(|&c| glyph_for(c).width as f32 + GLYPH_SPACING)
        .sum()
}

/// Pixel size of one cell for a string laid out on the given surface.
pub fn cell_px(chars: &[char], width: f32, height: f32) -> f32 {
    let units = advance_units(chars).max(1.0);
    let by_width = width * 0.86 / units;
    let by_height = height * 0.4 / GLYPH_ROWS as f32;
    by_width.min(by_height).max(1.0)
}

/// Screen-space center of a lit cell, plus the deterministic jitter that
/// keeps the lettering from looking stamped.
pub fn cell_position(
    chars: &[char],
    char_idx: usize,
    row: usize,
    col: usize,
    index: usize,
    width: f32,
    height: f32,
    time: f32,
) -> (f32, f32) {
    let cell = cell_px(chars, width, height);
    let units = advance_units(chars);
    let origin_x = width / 2.0 - units * cell / 2.0;
    let origin_y = height / 2.0 - GLYPH_ROWS as f32 * cell / 2.0;
    let x = origin_x
        + (offset_units(chars, char_idx) + col as f32 + 0.5) * cell
        + hash_signed(index, 701) * cell * 0.12;
    let y = origin_y
        + (row as f32 + 0.5) * cell
        + hash_signed(index, 709) * cell * 0.12
        + (time * 1.4 + char_idx as f32 * 0.6).sin() * cell * 0.08;
    (x, y)
}

fn prepared_chars(text: &str) -> Vec<char> {
    text.trim()
        .chars()
        .take(MAX_TEXT_CHARS)
        .collect()
}

// ============================================================================
// Generators
// ============================================================================

/// Spells `state.text` in particle lettering. Off cells go transparent in
/// place; particles past the string's budget fall back to a faint orbit ring
/// around the lettering.
pub fn text(ctx: &ShapeContext) -> ShapeResult {
    let chars = match ctx.state.text.as_deref() {
        Some(t) if !t.trim().is_empty() => prepared_chars(t),
        _ => return ring_fallback(ctx, 0),
    };

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
                .with_alpha(0.88)
                .with_depth(1.05)
        }
        CellSlot::Off => ShapeResult::hidden(ctx),
        CellSlot::Overflow => {
            let used = chars.len() * GLYPH_BUDGET;
            ring_fallback(ctx, used)
        }
    }
}

/// Faint ellipse circling the lettering, used for overflow particles and for
/// the empty-string case.
pub fn ring_fallback(ctx: &ShapeContext, first_index: usize) -> ShapeResult {
    let (cx, cy) = ctx.center();
    let spare = ctx.total.saturating_sub(first_index).max(1);
    let u = (ctx.index - first_index.min(ctx.index)) as f32 / spare as f32;
    let angle = u * TAU + ctx.time * 0.2;
    let rx = ctx.width * 0.38;
    let ry = ctx.height * 0.3;
    ShapeResult::new(
        cx + angle.cos() * rx,
        cy + angle.sin() * ry,
        SPRING_GENTLE,
        FRICTION_STANDARD,
        0.15,
    )
    .with_alpha(0.08)
    .with_depth(0.6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::ShapeContext;

    fn ctx_with_text<'a>(state: &'a VisualState, index: usize) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 2000,
            width: 1200.0,
            height: 700.0,
            time: 1.0,
            audio_raw: 0.0,
            audio_smooth: 0.0,
            prev_x: 600.0,
            prev_y: 350.0,
            prev_alpha: 0.4,
            state,
            clock_text: None,
            landmarks: None,
        }
    }

    #[test]
    fn every_glyph_fits_its_declared_width() {
        for c in "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ :.,-+!?%'/".chars() {
            let g = glyph_for(c);
            assert!(g.width >= 1 && g.width <= GLYPH_MAX_COLS as u8);
            let mask = if g.width == 8 { 0xFF } else { (1u8 << g.width) - 1 };
            for (row, bits) in g.rows.iter().enumerate() {
                assert_eq!(
                    bits & !mask,
                    0,
                    "glyph '{}' row {} has bits outside its width",
                    c,
                    row
                );
            }
        }
    }

    #[test]
    fn slot_mapping_matches_glyph_cells() {
        let chars: Vec<char> = "HI".chars().collect();
        let mut lit = 0;
        for i in 0..chars.len() * GLYPH_BUDGET {
            match slot_for(&chars, i) {
                CellSlot::On {
                    char_idx,
                    row,
                    col,
                } => {
                    assert!(glyph_for(chars[char_idx]).cell(row, col));
                    lit += 1;
                }
                CellSlot::Off => {}
                CellSlot::Overflow => panic!("index {} inside budget marked overflow", i),
            }
        }
        let expected: usize = chars.iter().map(|&c| glyph_for(c).lit_cells()).sum();
        assert_eq!(lit, expected);
        assert_eq!(
            slot_for(&chars, chars.len() * GLYPH_BUDGET),
            CellSlot::Overflow
        );
    }

    #[test]
    fn character_offsets_accumulate_widths_and_spacing() {
        let chars: Vec<char> = "WAS".chars().collect();
        assert_eq!(offset_units(&chars, 0), 0.0);
        // W is 5 wide.
        assert_eq!(offset_units(&chars, 1), 5.0 + GLYPH_SPACING);
        assert_eq!(offset_units(&chars, 2), 5.0 + 3.0 + 2.0 * GLYPH_SPACING);
        assert_eq!(
            advance_units(&chars),
            5.0 + 3.0 + 3.0 + 2.0 * GLYPH_SPACING
        );
    }

    #[test]
    fn off_cells_are_transparent_and_anchored_in_place() {
        let mut state = VisualState::default();
        state.text = Some("T".into());
        // 'T' row 1 col 0 is dark; cell index = row * 5 + col = 5.
        let ctx = ctx_with_text(&state, 5);
        let r = text(&ctx);
        assert_eq!(r.target_alpha, Some(0.0));
        assert_eq!(r.tx, ctx.prev_x);
        assert_eq!(r.ty, ctx.prev_y);
    }

    #[test]
    fn lit_cells_form_the_glyph_in_reading_order() {
        let mut state = VisualState::default();
        state.text = Some("11".into());
        let first = text(&ctx_with_text(&state, 1)); // '1' row 0 col 1 is lit
        let second = text(&ctx_with_text(&state, GLYPH_BUDGET + 1));
        assert!(first.target_alpha.unwrap() > 0.5);
        assert!(
            second.tx > first.tx,
            "second character must sit to the right"
        );
    }

    #[test]
    fn overflow_particles_fall_back_to_the_ring() {
        let mut state = VisualState::default();
        state.text = Some("OK".into());
        let i = 2 * GLYPH_BUDGET + 40;
        let r = text(&ctx_with_text(&state, i));
        assert!(r.target_alpha.unwrap() < 0.15, "ring should be faint");
        assert!(r.spring > 0.0, "ring particles keep moving");
    }

    #[test]
    fn empty_text_shows_only_the_ring() {
        let mut state = VisualState::default();
        state.text = Some("   ".into());
        let r = text(&ctx_with_text(&state, 3));
        assert!(r.target_alpha.unwrap() < 0.15);
    }
}
