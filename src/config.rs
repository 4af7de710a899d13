//! Configuration and host-owned visual state for Orbfield

use serde::{Deserialize, Serialize};

use crate::shapes::ShapeKind;

// ============================================================================
// Conversation mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl Mode {
    pub fn all() -> [Mode; 4] {
        [Mode::Idle, Mode::Listening, Mode::Thinking, Mode::Speaking]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Listening => "listening",
            Mode::Thinking => "thinking",
            Mode::Speaking => "speaking",
        }
    }
}

// ============================================================================
// Shape payloads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
}

impl WeatherKind {
    pub fn all() -> [WeatherKind; 5] {
        [
            WeatherKind::Sunny,
            WeatherKind::Cloudy,
            WeatherKind::Rainy,
            WeatherKind::Stormy,
            WeatherKind::Snowy,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeatherKind::Sunny => "sunny",
            WeatherKind::Cloudy => "cloudy",
            WeatherKind::Rainy => "rainy",
            WeatherKind::Stormy => "stormy",
            WeatherKind::Snowy => "snowy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartTrend {
    Rising,
    Falling,
    Flat,
}

/// Route carried by the map and globe shapes. Coordinates are degrees,
/// positive north / positive east.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRoute {
    pub from_lat: f32,
    pub from_lon: f32,
    pub to_lat: f32,
    pub to_lon: f32,
    pub label: String,
}

// ============================================================================
// Host-owned visual state
// ============================================================================

/// Snapshot the host hands to the engine every frame. The engine never
/// mutates it; morph completion is reported back through
/// [`crate::field::ParticleField::morph_progress`] and the host clears
/// `morphing_to` itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualState {
    pub is_active: bool,
    /// Host-side mirror of the current audio level (0.0-1.0).
    pub audio_level: f32,
    pub mode: Mode,
    pub shape: ShapeKind,
    /// Morph target; must be cleared by the host once progress reaches 1.
    #[serde(default)]
    pub morphing_to: Option<ShapeKind>,
    /// Engine-written mirror of the active morph (0.0-1.0).
    #[serde(default)]
    pub morph_progress: f32,
    /// Theme override by name; unset picks by user profile.
    #[serde(default)]
    pub theme: Option<String>,
    /// Override the active theme's bloom toggle.
    #[serde(default)]
    pub bloom_enabled: Option<bool>,
    /// Override the active theme's trail toggle.
    #[serde(default)]
    pub trails_enabled: Option<bool>,
    /// Text rendered by the text shape.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub weather: Option<WeatherKind>,
    /// Degrees, shown next to the weather effect when present.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub chart_trend: Option<ChartTrend>,
    #[serde(default)]
    pub route: Option<MapRoute>,
    /// Number of cited sources backing the current answer; scales the
    /// particle population up slightly.
    #[serde(default)]
    pub source_count: usize,
    /// Reasoning complexity score (0.0-1.0); adds orbital shells.
    #[serde(default)]
    pub reasoning_depth: f32,
    /// Research mode spreads the swarm clusters into a scanning pattern.
    #[serde(default)]
    pub research_active: bool,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            is_active: true,
            audio_level: 0.0,
            mode: Mode::Idle,
            shape: ShapeKind::Orb,
            morphing_to: None,
            morph_progress: 0.0,
            theme: None,
            bloom_enabled: None,
            trails_enabled: None,
            text: None,
            weather: None,
            temperature: None,
            chart_trend: None,
            route: None,
            source_count: 0,
            reasoning_depth: 0.0,
            research_active: false,
        }
    }
}

// ============================================================================
// Engine tuning
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Particle count at the reference surface area before multipliers.
    pub baseline_count: usize,
    /// Hard ceiling after all multipliers.
    pub max_count: usize,
    /// Surface area (px^2) at which baseline_count applies unscaled.
    pub reference_area: f32,
    /// Relative population drift tolerated before a wholesale reallocation.
    pub realloc_tolerance: f32,
    /// Base particle radius in px before jitter and depth scaling.
    pub base_radius: f32,
    /// Random radius jitter added on spawn (0.0-base_radius).
    pub radius_jitter: f32,
    /// Per-frame blend toward target alpha (0.0-1.0).
    pub alpha_blend: f32,
    /// Per-frame blend toward target radius, slower than position.
    pub radius_blend: f32,
    /// Per-frame blend toward target depth scale.
    pub depth_blend: f32,
    /// Scales every generator's noise term.
    pub noise_scale: f32,
    /// Pointer repulsion falloff radius in px.
    pub repulsion_radius: f32,
    /// Pointer repulsion impulse strength.
    pub repulsion_strength: f32,
    /// Fraction of max(width, height) beyond which particles fade out.
    pub cull_factor: f32,
    /// Below this fps the population multiplier drops to 0.75.
    pub fps_degraded: f32,
    /// Below this fps the population multiplier drops to 0.5.
    pub fps_critical: f32,
    /// Frames averaged for the fps estimate.
    pub fps_window: usize,
    pub morph: MorphConfig,
    /// Seed for spawn placement; fixed so runs are reproducible.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_count: 1800,
            max_count: 6000,
            reference_area: 1280.0 * 720.0,
            realloc_tolerance: 0.15,
            base_radius: 2.2,
            radius_jitter: 1.4,
            alpha_blend: 0.12,
            radius_blend: 0.08,
            depth_blend: 0.06,
            noise_scale: 0.35,
            repulsion_radius: 90.0,
            repulsion_strength: 0.55,
            cull_factor: 0.78,
            fps_degraded: 45.0,
            fps_critical: 28.0,
            fps_window: 48,
            morph: MorphConfig::default(),
            seed: 0x0FB1_D5EE,
        }
    }
}

/// Durations for the three morph styles, in seconds. Style changes pacing
/// only; the interpolation curve is shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphConfig {
    pub plain_secs: f32,
    pub flow_secs: f32,
    pub spiral_secs: f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            plain_secs: 0.9,
            flow_secs: 1.4,
            spiral_secs: 2.0,
        }
    }
}
