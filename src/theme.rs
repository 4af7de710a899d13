//! Theme selection for Orbfield
//! Five built-in palettes with bloom and trail settings, picked once per
//! session by a deterministic keyword heuristic over the user profile.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shapes::ShapeKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub primary: [u8; 3],
    pub secondary: [u8; 3],
    pub accent: [u8; 3],
    pub background: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Additive strength of the blurred pass (0.0-2.0).
    pub intensity: f32,
    /// Luminance floor below which pixels do not bloom (0.0-1.0).
    pub threshold: f32,
    /// Blur radius in buffer pixels.
    pub radius: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailSettings {
    pub enabled: bool,
    /// Points kept per particle.
    pub length: usize,
    /// Per-frame alpha retained by the fading fill (0.0-1.0); higher keeps
    /// longer streaks.
    pub fade: f32,
}

/// Per-shape tweak a theme may carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub alpha_boost: f32,
    pub use_accent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub palette: Palette,
    pub bloom: BloomSettings,
    pub trails: TrailSettings,
    pub shape_styles: Vec<(ShapeKind, ShapeStyle)>,
}

impl Theme {
    pub fn midnight() -> Self {
        Self {
            name: "midnight".to_string(),
            palette: Palette {
                primary: [96, 165, 250],
                secondary: [129, 140, 248],
                accent: [240, 171, 252],
                background: [5, 8, 22],
            },
            bloom: BloomSettings {
                enabled: true,
                intensity: 0.85,
                threshold: 0.45,
                radius: 6,
            },
            trails: TrailSettings {
                enabled: true,
                length: 10,
                fade: 0.86,
            },
            shape_styles: Vec::new(),
        }
    }

    pub fn ember() -> Self {
        Self {
            name: "ember".to_string(),
            palette: Palette {
                primary: [251, 146, 60],
                secondary: [248, 113, 113],
                accent: [253, 224, 71],
                background: [16, 6, 4],
            },
            bloom: BloomSettings {
                enabled: true,
                intensity: 1.2,
                threshold: 0.35,
                radius: 8,
            },
            trails: TrailSettings {
                enabled: true,
                length: 14,
                fade: 0.9,
            },
            shape_styles: vec![
                (
                    ShapeKind::Weather,
                    ShapeStyle {
                        alpha_boost: 1.15,
                        use_accent: false,
                    },
                ),
                (
                    ShapeKind::Starburst,
                    ShapeStyle {
                        alpha_boost: 1.2,
                        use_accent: true,
                    },
                ),
            ],
        }
    }

    pub fn verdant() -> Self {
        Self {
            name: "verdant".to_string(),
            palette: Palette {
                primary: [74, 222, 128],
                secondary: [45, 212, 191],
                accent: [190, 242, 100],
                background: [3, 12, 8],
            },
            bloom: BloomSettings {
                enabled: true,
                intensity: 0.7,
                threshold: 0.5,
                radius: 5,
            },
            trails: TrailSettings {
                enabled: true,
                length: 8,
                fade: 0.82,
            },
            shape_styles: vec![(
                ShapeKind::Dna,
                ShapeStyle {
                    alpha_boost: 1.1,
                    use_accent: true,
                },
            )],
        }
    }

    pub fn glacier() -> Self {
        Self {
            name: "glacier".to_string(),
            palette: Palette {
                primary: [165, 243, 252],
                secondary: [125, 211, 252],
                accent: [255, 255, 255],
                background: [4, 10, 18],
            },
            bloom: BloomSettings {
                enabled: true,
                intensity: 0.95,
                threshold: 0.4,
                radius: 7,
            },
            trails: TrailSettings {
                enabled: false,
                length: 6,
                fade: 0.78,
            },
            shape_styles: vec![(
                ShapeKind::Globe,
                ShapeStyle {
                    alpha_boost: 1.1,
                    use_accent: true,
                },
            )],
        }
    }

    pub fn scholar() -> Self {
        Self {
            name: "scholar".to_string(),
            palette: Palette {
                primary: [253, 230, 138],
                secondary: [252, 211, 77],
                accent: [254, 243, 199],
                background: [12, 10, 4],
            },
            bloom: BloomSettings {
                enabled: false,
                intensity: 0.6,
                threshold: 0.55,
                radius: 4,
            },
            trails: TrailSettings {
                enabled: true,
                length: 6,
                fade: 0.8,
            },
            shape_styles: vec![
                (
                    ShapeKind::Text,
                    ShapeStyle {
                        alpha_boost: 1.15,
                        use_accent: false,
                    },
                ),
                (
                    ShapeKind::Chart,
                    ShapeStyle {
                        alpha_boost: 1.1,
                        use_accent: true,
                    },
                ),
            ],
        }
    }

    pub fn all_themes() -> Vec<Theme> {
        vec![
            Theme::midnight(),
            Theme::ember(),
            Theme::verdant(),
            Theme::glacier(),
            Theme::scholar(),
        ]
    }

    pub fn by_name(name: &str) -> Option<Theme> {
        Theme::all_themes()
            .into_iter()
            .find(|t| t.name == name.to_ascii_lowercase())
    }

    pub fn style_for(&self, shape: ShapeKind) -> Option<&ShapeStyle> {
        self.shape_styles
            .iter()
            .find(|(k, _)| *k == shape)
            .map(|(_, s)| s)
    }
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Owns the active theme for the lifetime of the process. Selection runs
/// once at startup; switching later is an explicit host call.
pub struct ThemeManager {
    active: Theme,
}

impl ThemeManager {
    pub fn select_for(profile: &UserProfile) -> Self {
        let theme = pick_theme(profile);
        info!(theme = %theme.name, "theme selected");
        Self { active: theme }
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self { active: theme }
    }

    pub fn active(&self) -> &Theme {
        &self.active
    }

    pub fn set_by_name(&mut self, name: &str) -> bool {
        match Theme::by_name(name) {
            Some(t) => {
                info!(theme = %t.name, "theme switched");
                self.active = t;
                true
            }
            None => false,
        }
    }
}

/// Keyword heuristic over name and email. Checks run in a fixed order so
/// the same profile always lands on the same theme; profiles matching
/// nothing split between midnight and glacier on a stable hash.
fn pick_theme(profile: &UserProfile) -> Theme {
    let haystack = format!(
        "{} {}",
        profile.display_name.as_deref().unwrap_or(""),
        profile.email.as_deref().unwrap_or("")
    )
    .to_ascii_lowercase();

    let domain_is_edu = profile
        .email
        .as_deref()
        .map(|e| e.rsplit('@').next().is_some_and(|d| d.ends_with(".edu")))
        .unwrap_or(false);

    if domain_is_edu || contains_any(&haystack, &["prof", "phd", "research", "university"]) {
        return Theme::scholar();
    }
    if contains_any(&haystack, &["art", "design", "studio", "creative"]) {
        return Theme::ember();
    }
    if contains_any(&haystack, &["green", "bio", "garden", "eco", "nature"]) {
        return Theme::verdant();
    }
    if contains_any(&haystack, &["ice", "winter", "north", "polar"]) {
        return Theme::glacier();
    }

    let sum: u32 = haystack.bytes().map(u32::from).sum();
    if sum % 2 == 0 {
        Theme::midnight()
    } else {
        Theme::glacier()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
