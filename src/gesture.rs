//! Pointer gesture recognition: circle, zigzag, swipe and double tap over a
//! buffered pointer trace. Matchers run in a fixed order on release; taps
//! are handled before the travel gate so a double tap never needs to move.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    Circle,
    Zigzag,
    Swipe(SwipeDirection),
    DoubleTap,
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Circle => "circle",
            Gesture::Zigzag => "zigzag",
            Gesture::Swipe(SwipeDirection::Left) => "swipe-left",
            Gesture::Swipe(SwipeDirection::Right) => "swipe-right",
            Gesture::Swipe(SwipeDirection::Up) => "swipe-up",
            Gesture::Swipe(SwipeDirection::Down) => "swipe-down",
            Gesture::DoubleTap => "double-tap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub x: f32,
    pub y: f32,
    /// Seconds on the engine clock.
    pub t: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Path length below which a stroke is ignored (taps excepted).
    pub min_travel: f32,
    /// Path length under which a release counts as a tap.
    pub tap_max_travel: f32,
    /// Traces longer than this are discarded, not classified.
    pub max_duration: f32,
    /// Seconds allowed between the two taps.
    pub double_tap_window: f32,
    /// Pixels allowed between the two tap points.
    pub double_tap_slop: f32,
    /// Max radial deviation (stddev over mean) for a circle.
    pub circle_roundness_max: f32,
    /// Radians of winding a circle must accumulate.
    pub circle_min_rotation: f32,
    /// Sharp direction reversals a zigzag needs.
    pub zigzag_min_reversals: u32,
    /// Degrees a heading change must exceed to count as a reversal.
    pub zigzag_turn_min_deg: f32,
    /// Net displacement over path length for a swipe.
    pub swipe_straightness_min: f32,
    /// Resample step in px; denoises jittery input devices.
    pub resample_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_travel: 110.0,
            tap_max_travel: 18.0,
            max_duration: 2.5,
            double_tap_window: 0.35,
            double_tap_slop: 40.0,
            circle_roundness_max: 0.3,
            circle_min_rotation: 4.2,
            zigzag_min_reversals: 3,
            zigzag_turn_min_deg: 60.0,
            swipe_straightness_min: 0.82,
            resample_px: 8.0,
        }
    }
}

pub struct GestureTracker {
    config: GestureConfig,
    points: Vec<TracePoint>,
    pressed: bool,
    last_tap: Option<TracePoint>,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            points: Vec::with_capacity(256),
            pressed: false,
            last_tap: None,
        }
    }

    pub fn is_tracing(&self) -> bool {
        self.pressed
    }

    pub fn press(&mut self, x: f32, y: f32, t: f32) {
        self.points.clear();
        self.points.push(TracePoint { x, y, t });
        self.pressed = true;
    }

    pub fn drag(&mut self, x: f32, y: f32, t: f32) {
        if !self.pressed {
            return;
        }
        // Overlong traces are abandoned mid-flight.
        if let Some(first) = self.points.first() {
            if t - first.t > self.config.max_duration {
                self.cancel();
                return;
            }
        }
        self.points.push(TracePoint { x, y, t });
    }

    pub fn cancel(&mut self) {
        self.points.clear();
        self.pressed = false;
    }

    /// Classify the finished trace. Returns the first matcher that accepts
    /// it, in the fixed order circle, zigzag, swipe; taps are routed to the
    /// double-tap detector before any travel gating.
    pub fn release(&mut self, x: f32, y: f32, t: f32) -> Option<Gesture> {
        if !self.pressed {
            return None;
        }
        self.pressed = false;
        self.points.push(TracePoint { x, y, t });
        let trace = std::mem::take(&mut self.points);

        let first = *trace.first()?;
        if t - first.t > self.config.max_duration {
            return None;
        }

        let travel = path_length(&trace);
        if travel <= self.config.tap_max_travel {
            return self.register_tap(TracePoint { x, y, t });
        }
        if travel < self.config.min_travel {
            return None;
        }

        let pts = resample(&trace, self.config.resample_px);
        if pts.len() < 4 {
            return None;
        }

        let matched = match_circle(&pts, &self.config)
            .or_else(|| match_zigzag(&pts, &self.config))
            .or_else(|| match_swipe(&pts, &self.config));
        if let Some(g) = matched {
            debug!(gesture = g.name(), travel, "gesture recognized");
        }
        matched
    }

    fn register_tap(&mut self, tap: TracePoint) -> Option<Gesture> {
        if let Some(prev) = self.last_tap {
            let close_in_time = tap.t - prev.t <= self.config.double_tap_window;
            let close_in_space = dist(prev.x, prev.y, tap.x, tap.y) <= self.config.double_tap_slop;
            if close_in_time && close_in_space {
                self.last_tap = None;
                debug!("gesture recognized: double tap");
                return Some(Gesture::DoubleTap);
            }
        }
        self.last_tap = Some(tap);
        None
    }
}

// ============================================================================
// Matchers
// ============================================================================

fn dist(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

fn path_length(pts: &[TracePoint]) -> f32 {
    pts.windows(2)
        .map(|w| dist(w[0].x, w[0].y, w[1].x, w[1].y))
        .sum()
}

/// Drop points closer than `step` to their kept predecessor. The final
/// point always survives so endpoints stay exact.
fn resample(pts: &[TracePoint], step: f32) -> Vec<TracePoint> {
    let mut out: Vec<TracePoint> = Vec::with_capacity(pts.len());
    for &p in pts {
        match out.last() {
            Some(last) if dist(last.x, last.y, p.x, p.y) < step => {}
            _ => out.push(p),
        }
    }
    if let (Some(&last_in), Some(last_out)) = (pts.last(), out.last_mut()) {
        *last_out = last_in;
    }
    out
}

fn match_circle(pts: &[TracePoint], cfg: &GestureConfig) -> Option<Gesture> {
    let n = pts.len() as f32;
    let cx = pts.iter().map(|p| p.x).sum::<f32>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f32>() / n;

    let radii: Vec<f32> = pts.iter().map(|p| dist(cx, cy, p.x, p.y)).collect();
    let mean_r = radii.iter().sum::<f32>() / n;
    if mean_r < 1.0 {
        return None;
    }
    let var = radii.iter().map(|r| (r - mean_r).powi(2)).sum::<f32>() / n;
    if var.sqrt() / mean_r > cfg.circle_roundness_max {
        return None;
    }

    // Total signed winding around the centroid.
    let mut winding = 0.0;
    for w in pts.windows(2) {
        let a0 = (w[0].y - cy).atan2(w[0].x - cx);
        let a1 = (w[1].y - cy).atan2(w[1].x - cx);
        let mut d = a1 - a0;
        while d > std::f32::consts::PI {
            d -= std::f32::consts::TAU;
        }
        while d < -std::f32::consts::PI {
            d += std::f32::consts::TAU;
        }
        winding += d;
    }
    if winding.abs() < cfg.circle_min_rotation {
        return None;
    }
    Some(Gesture::Circle)
}

fn match_zigzag(pts: &[TracePoint], cfg: &GestureConfig) -> Option<Gesture> {
    let turn_cos = cfg.zigzag_turn_min_deg.to_radians().cos();
    let mut reversals = 0u32;
    let mut prev_dir: Option<(f32, f32)> = None;
    for w in pts.windows(2) {
        let dx = w[1].x - w[0].x;
        let dy = w[1].y - w[0].y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-3 {
            continue;
        }
        let dir = (dx / len, dy / len);
        if let Some(pd) = prev_dir {
            // Dot under cos(threshold) means the heading turned past it.
            if pd.0 * dir.0 + pd.1 * dir.1 < turn_cos {
                reversals += 1;
            }
        }
        prev_dir = Some(dir);
    }
    if reversals >= cfg.zigzag_min_reversals {
        Some(Gesture::Zigzag)
    } else {
        None
    }
}

fn match_swipe(pts: &[TracePoint], cfg: &GestureConfig) -> Option<Gesture> {
    let first = pts.first()?;
    let last = pts.last()?;
    let net = dist(first.x, first.y, last.x, last.y);
    let travel = path_length(pts);
    if travel < 1.0 || net / travel < cfg.swipe_straightness_min {
        return None;
    }
    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let dir = if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    } else if dy > 0.0 {
        SwipeDirection::Down
    } else {
        SwipeDirection::Up
    };
    Some(Gesture::Swipe(dir))
}
