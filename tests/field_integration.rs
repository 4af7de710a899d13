use orbfield::compositor::Compositor;
use orbfield::config::{EngineConfig, Mode, VisualState, WeatherKind};
use orbfield::field::ParticleField;
use orbfield::postprocess::mean_luminance;
use orbfield::shapes::ShapeKind;
use orbfield::theme::Theme;

const DT: f32 = 1.0 / 60.0;

fn small_config(count: usize) -> EngineConfig {
    EngineConfig {
        baseline_count: count,
        ..EngineConfig::default()
    }
}

fn run_frames(field: &mut ParticleField, frames: usize) {
    for _ in 0..frames {
        field.advance(DT);
    }
}

fn mean_radius(field: &ParticleField) -> f32 {
    let ps = field.particles();
    ps.iter().map(|p| p.radius).sum::<f32>() / ps.len() as f32
}

/// Horizontal extent of the brightly lit particles only.
fn lit_x_spread(field: &ParticleField, min_alpha: f32) -> f32 {
    let mut lo = f32::MAX;
    let mut hi = f32::MIN;
    for p in field.particles().iter().filter(|p| p.alpha >= min_alpha) {
        lo = lo.min(p.x);
        hi = hi.max(p.x);
    }
    if hi > lo {
        hi - lo
    } else {
        0.0
    }
}

#[test]
fn speaking_cycle_swells_then_relaxes() {
    let mut field = ParticleField::new(small_config(400), 640.0, 480.0);
    let levels = field.level_sender();
    field.set_state(VisualState {
        mode: Mode::Speaking,
        shape: ShapeKind::Orb,
        ..VisualState::default()
    });

    for _ in 0..90 {
        levels.publish(0.0, 0.02);
        field.advance(DT);
    }
    let quiet = mean_radius(&field);

    for &level in &[0.1_f32, 0.3, 0.55] {
        for _ in 0..20 {
            levels.publish(0.0, level);
            field.advance(DT);
        }
    }
    for _ in 0..60 {
        levels.publish(0.0, 0.55);
        field.advance(DT);
    }
    let loud = mean_radius(&field);
    assert!(loud > quiet * 1.05, "loud {loud} vs quiet {quiet}");

    for _ in 0..140 {
        levels.publish(0.0, 0.0);
        field.advance(DT);
    }
    let relaxed = mean_radius(&field);
    assert!(relaxed < loud * 0.97, "relaxed {relaxed} vs loud {loud}");
    assert!(
        (relaxed - quiet).abs() < quiet * 0.1,
        "relaxed {relaxed} should land back near quiet {quiet}"
    );
}

#[test]
fn morph_request_commits_like_a_host() {
    let mut field = ParticleField::new(small_config(400), 640.0, 480.0);
    let mut state = VisualState::default();
    run_frames(&mut field, 30);

    state.morphing_to = Some(ShapeKind::Globe);
    let mut committed_at = None;
    let mut prev_progress = 0.0_f32;
    for frame in 0..600 {
        field.set_state(state.clone());
        field.advance(DT);
        let progress = field.state().morph_progress;
        assert!(
            progress >= prev_progress - 1e-4,
            "progress went backwards at frame {frame}: {prev_progress} -> {progress}"
        );
        prev_progress = progress;
        state.morph_progress = progress;
        if progress >= 1.0 {
            state.shape = state.morphing_to.take().expect("target");
            committed_at = Some(frame);
            break;
        }
    }
    let committed_at = committed_at.expect("morph never finished");
    assert!(committed_at > 10, "morph finished suspiciously fast");

    field.set_state(state.clone());
    run_frames(&mut field, 30);
    assert_eq!(field.state().shape, ShapeKind::Globe);
    assert!(field.state().morphing_to.is_none());
}

#[test]
fn longer_banners_spread_wider() {
    let mut short_field = ParticleField::new(small_config(600), 960.0, 540.0);
    short_field.set_state(VisualState {
        shape: ShapeKind::Text,
        text: Some("HI".to_string()),
        ..VisualState::default()
    });
    run_frames(&mut short_field, 120);

    let mut long_field = ParticleField::new(small_config(600), 960.0, 540.0);
    long_field.set_state(VisualState {
        shape: ShapeKind::Text,
        text: Some("PARTICLE WEATHER".to_string()),
        ..VisualState::default()
    });
    run_frames(&mut long_field, 120);

    let short_spread = lit_x_spread(&short_field, 0.5);
    let long_spread = lit_x_spread(&long_field, 0.5);
    assert!(
        long_spread > short_spread * 1.3,
        "short {short_spread} long {long_spread}"
    );
}

#[test]
fn rain_keeps_recycling_drops() {
    let mut field = ParticleField::new(small_config(500), 640.0, 480.0);
    field.set_state(VisualState {
        shape: ShapeKind::Weather,
        weather: Some(WeatherKind::Rainy),
        temperature: Some(12.0),
        ..VisualState::default()
    });
    run_frames(&mut field, 120);

    let total = field.particles().len();
    let teleported = field.particles().iter().filter(|p| p.teleported).count();
    assert!(
        teleported * 5 > total,
        "only {teleported} of {total} drops recycled"
    );

    let (w, h) = field.size();
    for p in field.particles() {
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!(p.x >= -40.0 && p.x <= w + 40.0, "x out of range: {}", p.x);
        assert!(p.y >= -0.3 * h && p.y <= 1.5 * h, "y out of range: {}", p.y);
    }
}

#[test]
fn voice_brightens_the_composited_frame() {
    let mut field = ParticleField::new(small_config(400), 320.0, 240.0);
    let levels = field.level_sender();
    field.set_state(VisualState {
        mode: Mode::Speaking,
        ..VisualState::default()
    });
    let theme = Theme::midnight();
    let mut compositor = Compositor::new(320, 240);

    for _ in 0..90 {
        levels.publish(0.0, 0.02);
        field.advance(DT);
    }
    compositor.render_frame(&field, &theme);
    let quiet = mean_luminance(compositor.buffer());

    for _ in 0..120 {
        levels.publish(0.0, 0.8);
        field.advance(DT);
    }
    compositor.render_frame(&field, &theme);
    let loud = mean_luminance(compositor.buffer());

    assert!(loud > quiet, "loud {loud} should out-glow quiet {quiet}");
}
