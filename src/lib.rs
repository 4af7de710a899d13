//! Live particle field that assembles into named shapes.
//!
//! A few thousand particles share one simulation and continuously re-form
//! into whatever the host asks for: an idle orb, scrolling text, a spinning
//! globe, weather scenes, charts, a face. Every frame each particle gets a
//! target from the active shape generator and spring-integrates toward it,
//! so shape changes read as the swarm flowing from one figure to the next.
//!
//! The field reacts to three live inputs:
//! * audio levels published through [`audio::LevelSender`], smoothed with
//!   fast attack and slow release,
//! * the conversation [`config::Mode`] (idle, listening, thinking, speaking),
//! * structured payloads on [`config::VisualState`] (weather, routes, text).
//!
//! Rendering is split: [`render::FieldRenderer`] paints into an egui painter
//! for the interactive window, [`compositor::Compositor`] rasterizes the same
//! field into an offscreen buffer with additive blending, trails and bloom.

pub mod audio;
pub mod compositor;
pub mod config;
pub mod field;
pub mod gesture;
pub mod morph;
pub mod motion;
pub mod postprocess;
pub mod render;
pub mod shapes;
pub mod theme;

pub use audio::{AudioLevels, LevelSender};
pub use compositor::Compositor;
pub use config::{EngineConfig, Mode, VisualState};
pub use field::{Particle, ParticleField, PerformanceTier};
pub use gesture::{Gesture, GestureTracker};
pub use shapes::ShapeKind;
pub use theme::{Theme, ThemeManager, UserProfile};
