//! Loudness measurement
//!
//! Turns raw microphone samples into dB-equivalent loudness values. Runs on
//! the audio thread, so nothing in here allocates.

use serde::{Deserialize, Serialize};

use crate::consts::{ANALYSIS_WINDOW, SILENCE_FLOOR_DB};

/// One loudness measurement (dB-equivalent, roughly -inf..0 for normalized input)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LoudnessSample(pub f32);

impl LoudnessSample {
    #[inline]
    pub fn db(self) -> f32 {
        self.0
    }
}

/// Root-mean-square of a block of normalized samples
///
/// Non-finite samples count as silence. An empty block has zero energy.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    (sum / samples.len() as f32).sqrt()
}

/// Convert an RMS amplitude to decibels (`20·log10(rms)`)
#[inline]
pub fn amplitude_to_db(rms: f32) -> f32 {
    20.0 * rms.log10()
}

/// Loudness of a whole frame in dB (-inf for silence)
pub fn frame_loudness_db(samples: &[f32]) -> f32 {
    amplitude_to_db(rms(samples))
}

/// Windowed loudness gate
///
/// Accumulates energy over fixed windows regardless of how the host slices
/// its buffers, and emits a sample for each full window louder than the floor.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    window: usize,
    floor_db: f32,
    sum_squares: f32,
    count: usize,
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(ANALYSIS_WINDOW, SILENCE_FLOOR_DB)
    }
}

impl LevelMeter {
    pub fn new(window: usize, floor_db: f32) -> Self {
        Self {
            window: window.max(1),
            floor_db,
            sum_squares: 0.0,
            count: 0,
        }
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    /// Feed mono samples; `emit` is called once per loud window
    pub fn push<I, F>(&mut self, samples: I, mut emit: F)
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(LoudnessSample),
    {
        for s in samples {
            if s.is_finite() {
                self.sum_squares += s * s;
            }
            self.count += 1;

            if self.count == self.window {
                let db = amplitude_to_db((self.sum_squares / self.window as f32).sqrt());
                self.sum_squares = 0.0;
                self.count = 0;

                // NaN and -inf both fail this comparison
                if db > self.floor_db {
                    emit(LoudnessSample(db));
                }
            }
        }
    }

    /// Drop any partially filled window
    pub fn reset(&mut self) {
        self.sum_squares = 0.0;
        self.count = 0;
    }
}
