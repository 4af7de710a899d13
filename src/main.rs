//! Interactive window around the particle field. The keyboard drives the
//! demo payloads, the mouse feeds the gesture recognizer, and one key saves
//! a PNG snapshot through the offscreen compositor.

use std::f32::consts::TAU;
use std::fs;
use std::time::Instant;

use chrono::Local;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orbfield::audio::LevelSender;
use orbfield::compositor::Compositor;
use orbfield::config::{ChartTrend, EngineConfig, MapRoute, Mode, VisualState, WeatherKind};
use orbfield::field::ParticleField;
use orbfield::gesture::{Gesture, GestureConfig, GestureTracker, SwipeDirection};
use orbfield::render::FieldRenderer;
use orbfield::shapes::face::FacePoint;
use orbfield::shapes::ShapeKind;
use orbfield::theme::{Theme, ThemeManager, UserProfile};

const STATE_FILE: &str = "orbfield.json";
const ENGINE_FILE: &str = "orbfield.engine.json";

const HELP: &str = "\
left/right   cycle the shape catalog
space        toggle active
m            conversation mode
t            theme
b / v        bloom / trails override
w            weather scenes
x            text banner
c            clock
g / p        globe / map route
h            chart trends
f            face mesh
r            research sweep
d            reasoning depth
+ / -        cited sources
s            save a png snapshot
drag         circle=orb  zigzag=wave  swipes=navigate
double tap   toggle active";

struct OrbfieldApp {
    field: ParticleField,
    renderer: FieldRenderer,
    themes: ThemeManager,
    state: VisualState,
    gestures: GestureTracker,
    levels: LevelSender,
    started: Instant,
    last_update: Instant,
    last_pointer: Option<(f32, f32)>,
    shape_index: usize,
    snapshot_serial: u32,
    show_help: bool,
}

impl OrbfieldApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_unmultiplied(8, 10, 24, 245);
        visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(10, 13, 30, 240);
        cc.egui_ctx.set_visuals(visuals);

        let state = load_state();
        let profile = UserProfile {
            display_name: std::env::var("ORBFIELD_USER").ok(),
            email: std::env::var("ORBFIELD_EMAIL").ok(),
        };
        let mut themes = ThemeManager::select_for(&profile);
        if let Some(name) = state.theme.as_deref() {
            if !themes.set_by_name(name) {
                warn!(theme = name, "unknown theme in saved state, keeping profile pick");
            }
        }
        info!(
            theme = themes.active().name.as_str(),
            shape = state.shape.name(),
            "host ready"
        );

        let field = ParticleField::new(load_engine_config(), 1280.0, 720.0);
        let levels = field.level_sender();
        let shape_index = ShapeKind::all()
            .iter()
            .position(|k| *k == state.shape)
            .unwrap_or(0);

        Self {
            field,
            renderer: FieldRenderer::new(),
            themes,
            state,
            gestures: GestureTracker::new(GestureConfig::default()),
            levels,
            started: Instant::now(),
            last_update: Instant::now(),
            last_pointer: None,
            shape_index,
            snapshot_serial: 0,
            show_help: false,
        }
    }

    /// Layered sines stand in for a microphone and a TTS stream so the demo
    /// breathes without an audio backend.
    fn fake_levels(&self, t: f32) -> (f32, f32) {
        let slow = (t * 0.6).sin() * 0.5 + 0.5;
        let fast = (t * 3.7).sin() * 0.5 + 0.5;
        let burst = ((t * 1.3).sin() * (t * 0.23).cos()).max(0.0);
        let voice = (slow * 0.4 + fast * 0.35 + burst * 0.45).min(1.0);
        match self.state.mode {
            Mode::Speaking => (0.05, voice),
            Mode::Listening => (voice * 0.8, 0.02),
            Mode::Thinking => (0.03, 0.04),
            Mode::Idle => (0.02, 0.02),
        }
    }

    fn request_shape(&mut self, kind: ShapeKind) {
        if self.state.shape == kind && self.state.morphing_to.is_none() {
            return;
        }
        self.state.morphing_to = Some(kind);
        if let Some(i) = ShapeKind::all().iter().position(|k| *k == kind) {
            self.shape_index = i;
        }
    }

    fn cycle_shape(&mut self, dir: isize) {
        let catalog = ShapeKind::all();
        let len = catalog.len() as isize;
        self.shape_index = (self.shape_index as isize + dir).rem_euclid(len) as usize;
        self.state.morphing_to = Some(catalog[self.shape_index]);
    }

    fn cycle_mode(&mut self) {
        let modes = Mode::all();
        let i = modes.iter().position(|m| *m == self.state.mode).unwrap_or(0);
        self.state.mode = modes[(i + 1) % modes.len()];
        info!(mode = self.state.mode.name(), "mode switched");
    }

    fn cycle_theme(&mut self) {
        let all = Theme::all_themes();
        let current = self.themes.active().name.clone();
        let i = all.iter().position(|t| t.name == current).unwrap_or(0);
        let next = all[(i + 1) % all.len()].name.clone();
        self.themes.set_by_name(&next);
        self.state.theme = Some(next.clone());
        info!(theme = next.as_str(), "theme switched");
    }

    /// Steps sunny through snowy, then back to no weather at all.
    fn cycle_weather(&mut self) {
        let next = match self.state.weather {
            None => Some(WeatherKind::Sunny),
            Some(w) => {
                let all = WeatherKind::all();
                let i = all.iter().position(|k| *k == w).unwrap_or(0);
                if i + 1 < all.len() {
                    Some(all[i + 1])
                } else {
                    None
                }
            }
        };
        self.state.temperature = next.map(|w| match w {
            WeatherKind::Sunny => 27.0,
            WeatherKind::Cloudy => 18.0,
            WeatherKind::Rainy => 13.0,
            WeatherKind::Stormy => 11.0,
            WeatherKind::Snowy => -3.0,
        });
        self.state.weather = next;
        match next {
            Some(_) => self.request_shape(ShapeKind::Weather),
            None => self.request_shape(ShapeKind::Orb),
        }
    }

    fn cycle_trend(&mut self) {
        self.state.chart_trend = Some(match self.state.chart_trend {
            None | Some(ChartTrend::Flat) => ChartTrend::Rising,
            Some(ChartTrend::Rising) => ChartTrend::Falling,
            Some(ChartTrend::Falling) => ChartTrend::Flat,
        });
        self.request_shape(ShapeKind::Chart);
    }

    fn apply_gesture(&mut self, gesture: Gesture) {
        info!(gesture = gesture.name(), "gesture recognized");
        match gesture {
            Gesture::Circle => self.request_shape(ShapeKind::Orb),
            Gesture::Zigzag => self.request_shape(ShapeKind::Wave),
            Gesture::Swipe(SwipeDirection::Left) => self.cycle_shape(-1),
            Gesture::Swipe(SwipeDirection::Right) => self.cycle_shape(1),
            Gesture::Swipe(SwipeDirection::Up) => self.request_shape(ShapeKind::Starburst),
            Gesture::Swipe(SwipeDirection::Down) => self.request_shape(ShapeKind::Ocean),
            Gesture::DoubleTap => self.state.is_active = !self.state.is_active,
        }
    }

    fn snapshot(&mut self) {
        let (w, h) = self.field.size();
        let mut compositor = Compositor::new(w as u32, h as u32);
        compositor.render_frame(&self.field, self.themes.active());
        let path = format!("orbfield-{:03}.png", self.snapshot_serial);
        match compositor.save_png(&path) {
            Ok(()) => {
                info!(path = path.as_str(), "snapshot saved");
                self.snapshot_serial += 1;
            }
            Err(e) => warn!(error = %e, "snapshot failed"),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        use egui::Key;
        ctx.input(|i| {
            if i.key_pressed(Key::ArrowRight) {
                self.cycle_shape(1);
            }
            if i.key_pressed(Key::ArrowLeft) {
                self.cycle_shape(-1);
            }
            if i.key_pressed(Key::Space) {
                self.state.is_active = !self.state.is_active;
            }
            if i.key_pressed(Key::M) {
                self.cycle_mode();
            }
            if i.key_pressed(Key::T) {
                self.cycle_theme();
            }
            if i.key_pressed(Key::B) {
                let on = self
                    .state
                    .bloom_enabled
                    .unwrap_or(self.themes.active().bloom.enabled);
                self.state.bloom_enabled = Some(!on);
            }
            if i.key_pressed(Key::V) {
                let on = self
                    .state
                    .trails_enabled
                    .unwrap_or(self.themes.active().trails.enabled);
                self.state.trails_enabled = Some(!on);
            }
            if i.key_pressed(Key::W) {
                self.cycle_weather();
            }
            if i.key_pressed(Key::X) {
                self.state.text = Some("ORBFIELD".to_string());
                self.request_shape(ShapeKind::Text);
            }
            if i.key_pressed(Key::C) {
                self.request_shape(ShapeKind::Clock);
            }
            if i.key_pressed(Key::G) {
                self.state.route = Some(demo_route());
                self.request_shape(ShapeKind::Globe);
            }
            if i.key_pressed(Key::P) {
                self.state.route = Some(demo_route());
                self.request_shape(ShapeKind::Map);
            }
            if i.key_pressed(Key::H) {
                self.cycle_trend();
            }
            if i.key_pressed(Key::F) {
                self.request_shape(ShapeKind::Face);
            }
            if i.key_pressed(Key::R) {
                self.state.research_active = !self.state.research_active;
                self.request_shape(ShapeKind::Swarm);
            }
            if i.key_pressed(Key::D) {
                self.state.reasoning_depth = match self.state.reasoning_depth {
                    d if d < 0.25 => 0.5,
                    d if d < 0.75 => 1.0,
                    _ => 0.0,
                };
                self.request_shape(ShapeKind::Orbitals);
            }
            if i.key_pressed(Key::Plus) || i.key_pressed(Key::Equals) {
                self.state.source_count += 1;
            }
            if i.key_pressed(Key::Minus) {
                self.state.source_count = self.state.source_count.saturating_sub(1);
            }
            if i.key_pressed(Key::S) {
                self.snapshot();
            }
            if i.key_pressed(Key::F1) {
                self.show_help = !self.show_help;
            }
        });
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Orbfield");
                ui.separator();
                ui.label(format!("shape: {}", self.state.shape.name()));
                if let Some(to) = self.state.morphing_to {
                    ui.label(format!(
                        "-> {} {:.0}%",
                        to.name(),
                        self.state.morph_progress * 100.0
                    ));
                }
                ui.separator();
                ui.label(format!("mode: {}", self.state.mode.name()));
                ui.separator();
                ui.label(format!("theme: {}", self.themes.active().name));
                ui.separator();
                ui.label(format!("{} particles", self.field.particles().len()));
                ui.separator();
                ui.label(format!("{:.0} fps", self.field.fps()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label("F1 keys");
                });
            });
        });
    }

    fn render_help(&mut self, ctx: &egui::Context) {
        egui::Window::new("keys")
            .open(&mut self.show_help)
            .resizable(false)
            .show(ctx, |ui| {
                ui.monospace(HELP);
            });
    }

    fn render_canvas(&mut self, ctx: &egui::Context, dt: f32) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

            let (fw, fh) = self.field.size();
            if (rect.width() - fw).abs() > 0.5 || (rect.height() - fh).abs() > 0.5 {
                self.field.handle_resize(rect.width(), rect.height());
            }

            // Pointer drives both the repulsion force and the gesture tracker.
            let t = self.started.elapsed().as_secs_f32();
            self.field.set_pointer(
                response
                    .hover_pos()
                    .map(|p| (p.x - rect.min.x, p.y - rect.min.y)),
            );
            if let Some(pos) = response.interact_pointer_pos() {
                let (lx, ly) = (pos.x - rect.min.x, pos.y - rect.min.y);
                if self.gestures.is_tracing() {
                    self.gestures.drag(lx, ly, t);
                } else {
                    self.gestures.press(lx, ly, t);
                }
                self.last_pointer = Some((lx, ly));
            } else if self.gestures.is_tracing() {
                if let Some((lx, ly)) = self.last_pointer.take() {
                    if let Some(gesture) = self.gestures.release(lx, ly, t) {
                        self.apply_gesture(gesture);
                    }
                } else {
                    self.gestures.cancel();
                }
            }

            self.field.set_state(self.state.clone());
            self.field.advance(dt);

            // Morph handshake: commit the target once the engine reports 1.0.
            self.state.audio_level = self.field.state().audio_level;
            self.state.morph_progress = self.field.state().morph_progress;
            if let Some(target) = self.state.morphing_to {
                if self.state.morph_progress >= 1.0 {
                    self.state.shape = target;
                    self.state.morphing_to = None;
                    info!(shape = target.name(), "morph committed");
                }
            }

            let painter = ui.painter_at(rect);
            self.renderer
                .render(&painter, rect, &self.field, self.themes.active(), dt);
        });
    }
}

impl eframe::App for OrbfieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;
        let t = self.started.elapsed().as_secs_f32();

        self.handle_keys(ctx);

        let (input, output) = self.fake_levels(t);
        self.levels.publish(input, output);

        let display = self.state.morphing_to.unwrap_or(self.state.shape);
        if display == ShapeKind::Clock {
            self.field
                .set_clock_text(Some(Local::now().format("%H:%M:%S").to_string()));
        } else {
            self.field.set_clock_text(None);
        }
        if display == ShapeKind::Face {
            self.field
                .landmark_store()
                .publish(synth_face(t, self.state.audio_level), 0.75);
        }

        self.render_top_bar(ctx);
        self.render_help(ctx);
        self.render_canvas(ctx, dt);

        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        match serde_json::to_string_pretty(&self.state) {
            Ok(json) => {
                if let Err(e) = fs::write(STATE_FILE, json) {
                    warn!(error = %e, "could not persist visual state");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize visual state"),
        }
    }
}

fn load_state() -> VisualState {
    match fs::read_to_string(STATE_FILE) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(state) => {
                info!(file = STATE_FILE, "restored visual state");
                state
            }
            Err(e) => {
                warn!(file = STATE_FILE, error = %e, "state file unreadable, starting fresh");
                VisualState::default()
            }
        },
        Err(_) => VisualState::default(),
    }
}

/// Tuning overrides live beside the binary; absence means stock constants.
fn load_engine_config() -> EngineConfig {
    match fs::read_to_string(ENGINE_FILE) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(config) => {
                info!(file = ENGINE_FILE, "loaded engine tuning");
                config
            }
            Err(e) => {
                warn!(file = ENGINE_FILE, error = %e, "engine tuning unreadable, using defaults");
                EngineConfig::default()
            }
        },
        Err(_) => EngineConfig::default(),
    }
}

fn demo_route() -> MapRoute {
    MapRoute {
        from_lat: 37.62,
        from_lon: -122.38,
        to_lat: 35.76,
        to_lon: 140.39,
        label: "SFO-NRT".to_string(),
    }
}

/// Synthetic face mesh so the landmark path works without a camera. The
/// mouth opens with the audio level and the eyes blink on a slow cycle.
fn synth_face(t: f32, level: f32) -> Vec<FacePoint> {
    let mut points = Vec::with_capacity(96);
    let blink = if (t * 0.47).sin() > 0.97 { 1.0 } else { 0.0 };
    let eye_h = 0.028 * (1.0 - blink * 0.85);
    let mouth_open = 0.015 + level * 0.05;

    for i in 0..28 {
        let a = i as f32 / 28.0 * TAU;
        points.push(FacePoint {
            x: 0.5 + a.cos() * 0.27,
            y: 0.48 + a.sin() * 0.36,
            z: -0.02,
        });
    }
    for (cx, drift) in [(0.40_f32, -1.0_f32), (0.60, 1.0)] {
        for i in 0..10 {
            let a = i as f32 / 10.0 * TAU;
            points.push(FacePoint {
                x: cx + a.cos() * 0.045 + drift * (t * 0.9).sin() * 0.004,
                y: 0.40 + a.sin() * eye_h,
                z: -0.03,
            });
        }
        for i in 0..6 {
            let f = i as f32 / 5.0;
            points.push(FacePoint {
                x: cx - 0.055 + f * 0.11,
                y: 0.335 - (f - 0.5).powi(2) * 0.05,
                z: -0.025,
            });
        }
    }
    for i in 0..5 {
        points.push(FacePoint {
            x: 0.5,
            y: 0.42 + i as f32 * 0.03,
            z: -0.04,
        });
    }
    for i in 0..18 {
        let a = i as f32 / 18.0 * TAU;
        points.push(FacePoint {
            x: 0.5 + a.cos() * 0.09,
            y: 0.64 + a.sin() * mouth_open,
            z: -0.025,
        });
    }
    points
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_title("Orbfield")
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Orbfield",
        options,
        Box::new(|cc| Box::new(OrbfieldApp::new(cc))),
    )
}
