//! Trend chart: an axis frame, a synthesized data polyline with a traveling
//! highlight pulse, and ambient sparkle around the reading.

use crate::config::ChartTrend;
use crate::motion::{
    hash01, hash_signed, lerp, FRICTION_DRIFT, FRICTION_STANDARD, SPRING_GENTLE, SPRING_SNAPPY,
};
use crate::shapes::{ShapeContext, ShapeResult};

const AXIS_FRAC: f32 = 0.15;
const LINE_FRAC: f32 = 0.55;

/// Normalized series value at `u` for the requested trend. Wobble keeps the
/// line organic without hiding the direction.
fn series_value(trend: ChartTrend, u: f32) -> f32 {
    let wobble = (u * 9.3).sin() * 0.055 + (u * 23.1 + 1.3).sin() * 0.028;
    let base = match trend {
        ChartTrend::Rising => 0.22 + 0.58 * u,
        ChartTrend::Falling => 0.8 - 0.58 * u,
        ChartTrend::Flat => 0.5,
    };
    (base + wobble).clamp(0.05, 0.95)
}

pub fn chart(ctx: &ShapeContext) -> ShapeResult {
    let trend = ctx.state.chart_trend.unwrap_or(ChartTrend::Flat);
    let drive = ctx.drive();

    // Plot rectangle with margins for the axes.
    let x0 = ctx.width * 0.16;
    let x1 = ctx.width * 0.88;
    let y0 = ctx.height * 0.2;
    let y1 = ctx.height * 0.8;

    let axis_n = (ctx.total as f32 * AXIS_FRAC) as usize;
    let line_n = (ctx.total as f32 * LINE_FRAC) as usize;

    if ctx.index < axis_n {
        // L-frame: first half climbs the value axis, second runs the base.
        let u = (ctx.index as f32 + 0.5) / axis_n.max(1) as f32;
        let (x, y) = if u < 0.5 {
            (x0, lerp(y1, y0, u * 2.0))
        } else {
            (lerp(x0, x1, (u - 0.5) * 2.0), y1)
        };
        ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.03).with_alpha(0.55)
    } else if ctx.index < axis_n + line_n {
        let i = ctx.index - axis_n;
        let u = (i as f32 + 0.5) / line_n.max(1) as f32;
        let v = series_value(trend, u);
        let x = lerp(x0, x1, u);
        let y = y1 - v * (y1 - y0);

        // Highlight pulse sweeping from origin to the latest reading.
        let pulse_pos = (ctx.time * 0.3) % 1.0;
        let near = ((u - pulse_pos).abs() * 18.0).min(1.0);
        let glow = 1.0 - near;

        ShapeResult::new(x, y, SPRING_SNAPPY, FRICTION_STANDARD, 0.05 + drive * 0.2)
            .with_alpha(0.6 + glow * 0.4)
            .with_depth(1.0 + glow * 0.8)
    } else {
        // Sparkle scattered around the line's neighborhood.
        let i = ctx.index - axis_n - line_n;
        let u = hash01(i, 1009);
        let v = series_value(trend, u);
        let x = lerp(x0, x1, u) + hash_signed(i, 1013) * ctx.width * 0.02;
        let band = ctx.height * 0.1;
        let y = y1 - v * (y1 - y0) + hash_signed(i, 1019) * band
            + (ctx.time * 0.6 + hash01(i, 1021) * 6.28).sin() * 4.0;
        let tw = (ctx.time * 1.3 + hash01(i, 1031) * 6.28).sin() * 0.5 + 0.5;

        ShapeResult::new(x, y, SPRING_GENTLE, FRICTION_DRIFT, 0.3)
            .with_alpha(0.06 + 0.22 * tw)
            .with_depth(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::ShapeContext;

    const W: f32 = 1000.0;
    const H: f32 = 700.0;

    fn ctx<'a>(state: &'a VisualState, index: usize) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 1000,
            width: W,
            height: H,
            time: 2.0,
            audio_raw: 0.0,
            audio_smooth: 0.0,
            prev_x: 0.0,
            prev_y: 0.0,
            prev_alpha: 0.0,
            state,
            clock_text: None,
            landmarks: None,
        }
    }

    #[test]
    fn rising_trend_climbs_left_to_right() {
        let mut state = VisualState::default();
        state.chart_trend = Some(ChartTrend::Rising);
        let axis_n = 150;
        let early = chart(&ctx(&state, axis_n + 20));
        let late = chart(&ctx(&state, axis_n + 520));
        assert!(late.tx > early.tx);
        assert!(late.ty < early.ty, "screen y decreases as the value climbs");
    }

    #[test]
    fn falling_trend_descends() {
        let mut state = VisualState::default();
        state.chart_trend = Some(ChartTrend::Falling);
        let axis_n = 150;
        let early = chart(&ctx(&state, axis_n + 20));
        let late = chart(&ctx(&state, axis_n + 520));
        assert!(late.ty > early.ty);
    }

    #[test]
    fn axis_forms_an_l_frame() {
        let state = VisualState::default();
        let vertical = chart(&ctx(&state, 10));
        let horizontal = chart(&ctx(&state, 140));
        assert!((vertical.tx - W * 0.16).abs() < 1.0, "value axis is a column");
        assert!((horizontal.ty - H * 0.8).abs() < 1.0, "base axis is a row");
    }

    #[test]
    fn series_stays_inside_the_plot() {
        for trend in [ChartTrend::Rising, ChartTrend::Falling, ChartTrend::Flat] {
            for i in 0..=60 {
                let v = series_value(trend, i as f32 / 60.0);
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
