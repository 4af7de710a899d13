//! Face mirror: particles snap onto face-mesh landmarks streamed by the
//! host. The store keeps the latest frame behind a mutex and declares it
//! stale after about a second, at which point the shape falls back to the
//! audio-driven neural rings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::Mode;
use crate::motion::{hash01, FRICTION_STANDARD, SPRING_MEDIUM, SPRING_STIFF};
use crate::shapes::{agents, ShapeContext, ShapeResult};

/// Frames older than this no longer steer the field.
pub const STALE_AFTER: Duration = Duration::from_millis(1100);

/// One face-mesh landmark in normalized image coordinates: x,y in [0,1]
/// with the origin top-left, z negative toward the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Immutable view of the freshest landmark frame.
#[derive(Debug, Clone)]
pub struct LandmarkSnapshot {
    pub points: Arc<Vec<FacePoint>>,
    /// Source frame height over width; corrects y offsets for non-square
    /// camera frames.
    pub aspect: f32,
}

struct StoreInner {
    points: Arc<Vec<FacePoint>>,
    aspect: f32,
    updated: Option<Instant>,
}

/// Shared between the host's vision thread (publish) and the frame loop
/// (snapshot). Lock scope is a pointer swap either way.
pub struct LandmarkStore {
    inner: Mutex<StoreInner>,
    stale_after: Duration,
    stale_logged: AtomicBool,
}

impl LandmarkStore {
    pub fn new() -> Self {
        Self::with_staleness(STALE_AFTER)
    }

    pub fn with_staleness(stale_after: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                points: Arc::new(Vec::new()),
                aspect: 1.0,
                updated: None,
            }),
            stale_after,
            stale_logged: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, points: Vec<FacePoint>, aspect: f32) {
        let count = points.len();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.points = Arc::new(points);
        inner.aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        inner.updated = Some(Instant::now());
        drop(inner);
        self.stale_logged.store(false, Ordering::Relaxed);
        debug!(count, "landmark frame published");
    }

    /// Latest frame if it is still fresh. Logs one warning per fresh-to-
    /// stale transition, not per frame.
    pub fn snapshot(&self) -> Option<LandmarkSnapshot> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let updated = inner.updated?;
        if updated.elapsed() > self.stale_after {
            if !self.stale_logged.swap(true, Ordering::Relaxed) {
                warn!(
                    age_ms = updated.elapsed().as_millis() as u64,
                    "landmark feed went stale, falling back to neural"
                );
            }
            return None;
        }
        if inner.points.is_empty() {
            return None;
        }
        Some(LandmarkSnapshot {
            points: Arc::clone(&inner.points),
            aspect: inner.aspect,
        })
    }
}

impl Default for LandmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Landmark regions
// ============================================================================

/// Face-mesh index groups for the expressive regions. Anything else is
/// treated as contour.
const MOUTH: &[usize] = &[
    0, 13, 14, 17, 61, 78, 80, 81, 82, 87, 88, 95, 178, 191, 267, 269, 270, 291, 308, 310, 311,
    312, 317, 318, 324, 402, 405, 409, 415,
];
const LEFT_EYE: &[usize] = &[
    7, 33, 133, 144, 145, 153, 154, 155, 157, 158, 159, 160, 161, 163, 173, 246,
];
const RIGHT_EYE: &[usize] = &[
    249, 263, 362, 373, 374, 380, 381, 382, 384, 385, 386, 387, 388, 390, 398, 466,
];
const IRIS_START: usize = 468;
const IRIS_END: usize = 478;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceRegion {
    Mouth,
    Eye,
    Iris,
    Contour,
}

fn region_of(idx: usize) -> FaceRegion {
    if MOUTH.contains(&idx) {
        FaceRegion::Mouth
    } else if LEFT_EYE.contains(&idx) || RIGHT_EYE.contains(&idx) {
        FaceRegion::Eye
    } else if (IRIS_START..IRIS_END).contains(&idx) {
        FaceRegion::Iris
    } else {
        FaceRegion::Contour
    }
}

// ============================================================================
// Generator
// ============================================================================

pub fn face(ctx: &ShapeContext) -> ShapeResult {
    let snapshot = match ctx.landmarks {
        Some(s) if !s.points.is_empty() => s,
        _ => return agents::neural(ctx),
    };
    let points = &snapshot.points;
    let n = points.len();
    let drive = ctx.drive();

    // Base assignment cycles the mesh; while speaking, a drive-weighted
    // slice of the batch re-targets mouth and eye landmarks so speech reads
    // on the face.
    let mut landmark_idx = ctx.index % n;
    if ctx.state.mode == Mode::Speaking && hash01(ctx.index, 1201) < drive * 0.45 {
        let pool_pick = hash01(ctx.index, 1213);
        let candidate = if pool_pick < 0.6 {
            MOUTH[(ctx.index / 3) % MOUTH.len()]
        } else if pool_pick < 0.8 {
            LEFT_EYE[(ctx.index / 3) % LEFT_EYE.len()]
        } else {
            RIGHT_EYE[(ctx.index / 3) % RIGHT_EYE.len()]
        };
        if candidate < n {
            landmark_idx = candidate;
        }
    }

    let p = points[landmark_idx];
    let (cx, cy) = ctx.center();
    let face_w = ctx.min_dim() * 0.58;

    // Mirror horizontally so the reflection behaves like a mirror, and
    // stretch y by the source aspect so the face is not squashed.
    let x = cx + (0.5 - p.x) * face_w;
    let y = cy + (p.y - 0.5) * face_w * snapshot.aspect;

    let region = region_of(landmark_idx);
    let (spring, alpha) = match region {
        FaceRegion::Mouth => (SPRING_STIFF, 0.92),
        FaceRegion::Eye => (SPRING_STIFF, 0.88),
        FaceRegion::Iris => (SPRING_STIFF, 0.95),
        FaceRegion::Contour => (SPRING_MEDIUM, 0.5),
    };
    let depth = (1.0 - p.z * 2.0).clamp(0.5, 1.8);

    ShapeResult::new(x, y, spring, FRICTION_STANDARD, 0.08 + drive * 0.2)
        .with_alpha(alpha)
        .with_depth(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualState;
    use crate::shapes::ShapeContext;

    fn mesh(n: usize) -> Vec<FacePoint> {
        (0..n)
            .map(|i| FacePoint {
                x: (i % 40) as f32 / 40.0,
                y: (i / 40) as f32 / 12.0,
                z: -0.02,
            })
            .collect()
    }

    fn ctx_with<'a>(
        state: &'a VisualState,
        snapshot: Option<&'a LandmarkSnapshot>,
        index: usize,
    ) -> ShapeContext<'a> {
        ShapeContext {
            index,
            total: 1000,
            width: 800.0,
            height: 800.0,
            time: 1.0,
            audio_raw: 0.8,
            audio_smooth: 0.6,
            prev_x: 400.0,
            prev_y: 400.0,
            prev_alpha: 0.4,
            state,
            clock_text: None,
            landmarks: snapshot,
        }
    }

    #[test]
    fn fresh_snapshot_is_returned_and_stale_is_not() {
        let store = LandmarkStore::with_staleness(Duration::from_secs(60));
        assert!(store.snapshot().is_none(), "empty store has no frame");
        store.publish(mesh(478), 0.75);
        let snap = store.snapshot().expect("fresh frame");
        assert_eq!(snap.points.len(), 478);
        assert!((snap.aspect - 0.75).abs() < 1e-6);

        let stale = LandmarkStore::with_staleness(Duration::ZERO);
        stale.publish(mesh(478), 1.0);
        assert!(stale.snapshot().is_none(), "zero tolerance means stale");
    }

    #[test]
    fn bad_aspect_is_replaced_with_square() {
        let store = LandmarkStore::with_staleness(Duration::from_secs(60));
        store.publish(mesh(10), f32::NAN);
        assert_eq!(store.snapshot().unwrap().aspect, 1.0);
        store.publish(mesh(10), -2.0);
        assert_eq!(store.snapshot().unwrap().aspect, 1.0);
    }

    #[test]
    fn missing_landmarks_fall_back_to_neural() {
        let state = VisualState::default();
        let with_face = {
            let snap = LandmarkSnapshot {
                points: Arc::new(mesh(478)),
                aspect: 1.0,
            };
            let ctx = ctx_with(&state, Some(&snap), 42);
            face(&ctx)
        };
        let without = face(&ctx_with(&state, None, 42));
        let neural = agents::neural(&ctx_with(&state, None, 42));
        assert_eq!(without, neural, "no snapshot must equal the fallback");
        assert_ne!(with_face, without);
    }

    #[test]
    fn aspect_scales_vertical_offsets_only() {
        let state = VisualState::default();
        let square = LandmarkSnapshot {
            points: Arc::new(mesh(478)),
            aspect: 1.0,
        };
        let tall = LandmarkSnapshot {
            points: Arc::new(mesh(478)),
            aspect: 2.0,
        };
        // Pick an index mapping to a landmark away from the frame center.
        let i = 5;
        let a = face(&ctx_with(&state, Some(&square), i));
        let b = face(&ctx_with(&state, Some(&tall), i));
        assert!((a.tx - b.tx).abs() < 1e-3, "x untouched by aspect");
        let cy = 400.0;
        assert!(
            ((b.ty - cy) - 2.0 * (a.ty - cy)).abs() < 1e-2,
            "y offset must double with aspect"
        );
    }

    #[test]
    fn mirror_flips_horizontal_motion() {
        let state = VisualState::default();
        let mut pts = mesh(478);
        pts[3] = FacePoint {
            x: 0.9,
            y: 0.5,
            z: 0.0,
        };
        let snap = LandmarkSnapshot {
            points: Arc::new(pts),
            aspect: 1.0,
        };
        let r = face(&ctx_with(&state, Some(&snap), 3));
        assert!(
            r.tx < 400.0,
            "a landmark on the image right must appear on the screen left"
        );
    }

    #[test]
    fn speaking_biases_particles_toward_the_mouth() {
        let mut speaking = VisualState::default();
        speaking.mode = Mode::Speaking;
        let idle = VisualState::default();
        let snap = LandmarkSnapshot {
            points: Arc::new(mesh(478)),
            aspect: 1.0,
        };
        let mut moved = 0;
        for i in 0..300 {
            let a = face(&ctx_with(&idle, Some(&snap), i));
            let b = face(&ctx_with(&speaking, Some(&snap), i));
            if (a.tx - b.tx).abs() > 1e-3 || (a.ty - b.ty).abs() > 1e-3 {
                moved += 1;
            }
        }
        assert!(moved > 10, "speech must re-target a visible share: {}", moved);
    }
}
