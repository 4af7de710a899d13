//! Flat travel map: a city-light backdrop, two endpoint pins and a curved
//! route between them with a pulse running along the arc.

use std::f32::consts::TAU;

use crate::config::MapRoute;
use crate::motion::{
    hash01, hash_signed, FRICTION_DRIFT, FRICTION_STANDARD, SPRING_GENTLE, SPRING_MEDIUM,
    SPRING_SNAPPY,
};
use crate::shapes::{ShapeContext, ShapeResult};

const ROUTE_FRAC: f32 = 0.45;
const PIN_FRAC: f32 = 0.15;

/// Window the route into the view: equirectangular degrees mapped onto the
/// padded bounding box of the two endpoints.
struct RouteFrame {
    ax: f32,
    ay: f32,
    bx: f32,
    by: f32,
}

impl RouteFrame {
    fn fit(route: &MapRoute, width: f32, height: f32) -> Self {
        let (lat0, lat1) = (
            route.from_lat.min(route.to_lat),
            route.from_lat.max(route.to_lat),
        );
        let (lon0, lon1) = (
            route.from_lon.min(route.to_lon),
            route.from_lon.max(route.to_lon),
        );
        let pad_lat = ((lat1 - lat0) * 0.35).max(4.0);
        let pad_lon = ((lon1 - lon0) * 0.35).max(4.0);
        let project = move |lat: f32, lon: f32| {
            let u = (lon - (lon0 - pad_lon)) / ((lon1 - lon0) + 2.0 * pad_lon);
            let v = 1.0 - (lat - (lat0 - pad_lat)) / ((lat1 - lat0) + 2.0 * pad_lat);
            (width * (0.08 + 0.84 * u), height * (0.1 + 0.8 * v))
        };
        let (ax, ay) = project(route.from_lat, route.from_lon);
        let (bx, by) = project(route.to_lat, route.to_lon);
        Self { ax, ay, bx, by }
    }

    /// Quadratic bezier lifted perpendicular to the chord.
    fn arc_point(&self, t: f32) -> (f32, f32) {
        let mx = (self.ax + self.bx) / 2.0;
        let my = (self.ay + self.by) / 2.0;
        let dx = self.bx - self.ax;
        let dy = self.by - self.ay;
        let len = (dx * dx + dy * dy).sqrt().max(1e-3);
        let lift = len * 0.22;
        let cx = mx - dy / len * lift;
        let cy = my + dx / len * lift;

        let s = 1.0 - t;
        (
            s * s * self.ax + 2.0 * s * t * cx + t * t * self.bx,
            s * s * self.ay + 2.0 * s * t * cy + t * t * self.by,
        )
    }
}

pub fn map(ctx: &ShapeContext) -> ShapeResult {
    let route = match ctx.state.route.as_ref() {
        Some(r) => r,
        None => return backdrop(ctx, ctx.index, ctx.total),
    };
    let frame = RouteFrame::fit(route, ctx.width, ctx.height);

    let route_n = (ctx.total as f32 * ROUTE_FRAC) as usize;
    let pin_n = (ctx.total as f32 * PIN_FRAC) as usize;

    if ctx.index < route_n {
        let u = (ctx.index as f32 + 0.5) / route_n.max(1) as f32;
        let (x, y) = frame.arc_point(u);

        let pulse_pos = (ctx.time * 0.22) % 1.0;
        let glow = (1.0 - ((u - pulse_pos).abs() * 14.0).min(1.0)).powi(2);

        ShapeResult::new(x, y, SPRING_MEDIUM, FRICTION_STANDARD, 0.08)
            .with_alpha(0.4 + glow * 0.6)
            .with_depth(0.9 + glow * 1.0)
    } else if ctx.index < route_n + pin_n {
        let i = ctx.index - route_n;
        let dest_side = i % 2 == 1;
        let u = ((i / 2) as f32 + 0.5) / (pin_n / 2).max(1) as f32;
        let (px, py) = if dest_side {
            (frame.bx, frame.by)
        } else {
            (frame.ax, frame.ay)
        };
        let angle = u * TAU + ctx.time * 0.6;
        // Destination ring breathes; origin ring holds steady.
        let breathe = if dest_side {
            1.0 + 0.3 * (ctx.time * 2.5).sin()
        } else {
            1.0
        };
        let r = ctx.min_dim() * 0.028 * breathe;
        ShapeResult::new(
            px + angle.cos() * r,
            py + angle.sin() * r,
            SPRING_SNAPPY,
            FRICTION_STANDARD,
            0.06,
        )
        .with_alpha(if dest_side { 0.85 } else { 0.6 })
        .with_depth(if dest_side { 1.3 } else { 1.0 })
    } else {
        backdrop(ctx, ctx.index - route_n - pin_n, ctx.total - route_n - pin_n)
    }
}

/// City lights: jittered grid cells with individual twinkle. Doubles as the
/// whole shape when no route is set.
fn backdrop(ctx: &ShapeContext, i: usize, n: usize) -> ShapeResult {
    let cols = ((n as f32).sqrt() * 1.3) as usize;
    let cols = cols.max(4);
    let col = i % cols;
    let row = i / cols;
    let rows = (n + cols - 1) / cols;

    let x = ctx.width * (0.04 + 0.92 * (col as f32 + 0.5) / cols as f32)
        + hash_signed(i, 1103) * ctx.width * 0.03;
    let y = ctx.height * (0.05 + 0.9 * (row as f32 + 0.5) / rows.max(1) as f32)
        + hash_signed(i, 1109) * ctx.height * 0.03;

    // Sparse lighting: many cells stay dark, like night terrain.
    let lit = hash01(i, 1117) < 0.55;
    let tw = (ctx.time * (0.5 + hash01(i, 1123)) + hash01(i, 1129) * TAU).sin() * 0.5 + 0.5;
    let alpha = if lit { 0.08 + 0.2 * tw } else { 0.02 };

    ShapeResult::new(x, y, SPRING_GENTLE, FRICTION_DRIFT, 0.04)
        .with_alpha(alpha)
        .with_depth(0.55)
}
