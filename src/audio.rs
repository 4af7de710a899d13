//! Audio level plumbing for Orbfield
//! The host pushes raw input/output levels through a channel; the engine
//! drains them once per frame and keeps smoothed companions for the modes
//! that want time-averaged motion.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::trace;

use crate::config::Mode;
use crate::motion::clamp01;

/// Samples dropped on the floor when the frame loop stalls; the channel is
/// sized for roughly half a second of 100 Hz metering.
const FEED_CAPACITY: usize = 48;

/// One metering sample from the host. `input` is the microphone side,
/// `output` the assistant's own voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSample {
    pub input: f32,
    pub output: f32,
}

impl LevelSample {
    pub fn new(input: f32, output: f32) -> Self {
        Self {
            input: clamp01(input),
            output: clamp01(output),
        }
    }
}

// ============================================================================
// Feed
// ============================================================================

/// Bounded single-producer feed from the host's metering thread. Cloning the
/// handle clones the sender side only.
pub struct LevelFeed {
    tx: Sender<LevelSample>,
    rx: Receiver<LevelSample>,
}

impl LevelFeed {
    pub fn new() -> Self {
        let (tx, rx) = bounded(FEED_CAPACITY);
        Self { tx, rx }
    }

    pub fn sender(&self) -> LevelSender {
        LevelSender {
            tx: self.tx.clone(),
        }
    }

    /// Drains every queued sample, returning the most recent one if any
    /// arrived since the last call.
    pub fn drain_latest(&self) -> Option<LevelSample> {
        let mut latest = None;
        while let Ok(sample) = self.rx.try_recv() {
            latest = Some(sample);
        }
        latest
    }
}

impl Default for LevelFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct LevelSender {
    tx: Sender<LevelSample>,
}

impl LevelSender {
    /// Non-blocking publish. A full queue drops the oldest behavior by
    /// simply discarding this sample; levels are advisory, never queued up.
    pub fn publish(&self, input: f32, output: f32) {
        match self.tx.try_send(LevelSample::new(input, output)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!("level feed full, dropping sample");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

// ============================================================================
// Per-frame level state
// ============================================================================

/// Raw and smoothed levels for both channels. Raw values are the latest
/// sample verbatim; smoothed values chase them with separate attack and
/// release rates so speech envelopes read as swells rather than flicker.
#[derive(Debug, Clone, Copy)]
pub struct AudioLevels {
    pub input_raw: f32,
    pub output_raw: f32,
    pub input_smooth: f32,
    pub output_smooth: f32,
}

impl Default for AudioLevels {
    fn default() -> Self {
        Self {
            input_raw: 0.0,
            output_raw: 0.0,
            input_smooth: 0.0,
            output_smooth: 0.0,
        }
    }
}

impl AudioLevels {
    /// Attack faster than release; tuned against 60 fps frame times.
    const ATTACK_RATE: f32 = 12.0;
    const RELEASE_RATE: f32 = 4.5;

    pub fn apply_sample(&mut self, sample: LevelSample) {
        self.input_raw = sample.input;
        self.output_raw = sample.output;
    }

    pub fn update_smoothing(&mut self, dt: f32) {
        self.input_smooth = chase(self.input_smooth, self.input_raw, dt);
        self.output_smooth = chase(self.output_smooth, self.output_raw, dt);
    }

    /// Instantaneous level for the given mode. Speaking tracks the output
    /// channel so the orb snaps with the assistant's own voice.
    pub fn raw_for(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Speaking => self.output_raw,
            Mode::Listening => self.input_raw,
            Mode::Thinking | Mode::Idle => self.input_raw.max(self.output_raw) * 0.5,
        }
    }

    /// Time-averaged level for the given mode.
    pub fn smooth_for(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Speaking => self.output_smooth,
            Mode::Listening => self.input_smooth,
            Mode::Thinking | Mode::Idle => self.input_smooth.max(self.output_smooth) * 0.5,
        }
    }
}

fn chase(current: f32, target: f32, dt: f32) -> f32 {
    let rate = if target > current {
        AudioLevels::ATTACK_RATE
    } else {
        AudioLevels::RELEASE_RATE
    };
    let blended = current + (target - current) * (rate * dt).min(1.0);
    clamp01(blended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_clamped_on_entry() {
        let s = LevelSample::new(1.7, -0.4);
        assert_eq!(s.input, 1.0);
        assert_eq!(s.output, 0.0);
        let s = LevelSample::new(f32::NAN, 0.5);
        assert_eq!(s.input, 0.0);
    }

    #[test]
    fn drain_returns_most_recent_sample() {
        let feed = LevelFeed::new();
        let tx = feed.sender();
        tx.publish(0.1, 0.0);
        tx.publish(0.2, 0.0);
        tx.publish(0.3, 0.0);
        let latest = feed.drain_latest().unwrap();
        assert!((latest.input - 0.3).abs() < 1e-6);
        assert!(feed.drain_latest().is_none());
    }

    #[test]
    fn overflow_drops_samples_instead_of_blocking() {
        let feed = LevelFeed::new();
        let tx = feed.sender();
        for i in 0..FEED_CAPACITY + 20 {
            tx.publish(i as f32 / 100.0, 0.0);
        }
        // Still alive, and the queue drained cleanly.
        assert!(feed.drain_latest().is_some());
    }

    #[test]
    fn smoothing_attacks_faster_than_it_releases() {
        let mut levels = AudioLevels::default();
        levels.apply_sample(LevelSample::new(0.0, 1.0));
        levels.update_smoothing(1.0 / 60.0);
        let after_attack = levels.output_smooth;
        assert!(after_attack > 0.0);

        levels.apply_sample(LevelSample::new(0.0, 0.0));
        levels.update_smoothing(1.0 / 60.0);
        let dropped = after_attack - levels.output_smooth;
        assert!(
            dropped < after_attack,
            "release should be slower than attack"
        );
        assert!(levels.output_smooth > 0.0);
    }

    #[test]
    fn mode_selects_channel() {
        let mut levels = AudioLevels::default();
        levels.apply_sample(LevelSample::new(0.8, 0.2));
        assert!((levels.raw_for(Mode::Listening) - 0.8).abs() < 1e-6);
        assert!((levels.raw_for(Mode::Speaking) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn levels_never_go_negative() {
        let mut levels = AudioLevels::default();
        levels.apply_sample(LevelSample::new(0.0, 0.0));
        for _ in 0..200 {
            levels.update_smoothing(1.0 / 60.0);
        }
        assert!(levels.input_smooth >= 0.0);
        assert!(levels.output_smooth >= 0.0);
    }
}
