use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Upper bound of the input level scale.
pub const LEVEL_MAX: u16 = 1000;

/// Root mean square of a block of 16-bit samples.
pub fn rms(block: &[i16]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    let sum: f64 = block.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / block.len() as f64).sqrt()
}

/// Map an RMS value onto `0..=LEVEL_MAX`, relative to `i16::MAX`.
pub fn level_from_rms(rms: f64) -> u16 {
    if rms <= 0.0 {
        return 0;
    }
    let scaled = rms * LEVEL_MAX as f64 / i16::MAX as f64;
    scaled.clamp(0.0, LEVEL_MAX as f64) as u16
}

/// Latest block level, written by the audio callback and read by the UI.
#[derive(Clone, Default)]
pub struct LevelMeter {
    level: Arc<AtomicU16>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, block: &[i16]) {
        if block.is_empty() {
            return;
        }
        self.level
            .store(level_from_rms(rms(block)), Ordering::Relaxed);
    }

    pub fn get(&self) -> u16 {
        self.level.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.level.store(0, Ordering::Relaxed);
    }

    /// Level as a `0.0..=1.0` ratio, for gauges.
    pub fn ratio(&self) -> f64 {
        self.get() as f64 / LEVEL_MAX as f64
    }
}
