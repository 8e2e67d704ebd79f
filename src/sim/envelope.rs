//! Loudness envelope estimation
//!
//! Raw frame RMS goes into a short history; the mean of that history is the
//! smoothed envelope. The envelope is gated against background noise and
//! normalized against a calibration ceiling to give a level in [0, 1].

use serde::{Deserialize, Serialize};

use crate::audio::AudioFrame;

/// Estimator tuning (see `ChaseConfig`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub history_len: usize,
    pub volume_threshold: f32,
    pub max_volume: f32,
    pub silence_level: f32,
}

/// One loudness reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessSample {
    /// Normalized level in [0, 1]
    pub level: f32,
    /// Smoothed RMS the level was derived from
    pub rms: f32,
}

/// Smoothing ring buffer plus the last reading handed out
#[derive(Debug, Clone)]
pub struct EnvelopeEstimator {
    params: EnvelopeParams,
    /// Fixed-length ring of raw RMS values, zero-filled at start
    history: Vec<f32>,
    /// Slot the next value overwrites (the oldest one)
    cursor: usize,
    last: Option<LoudnessSample>,
}

impl EnvelopeEstimator {
    pub fn new(params: EnvelopeParams) -> Self {
        let len = params.history_len.max(1);
        Self {
            params,
            history: vec![0.0; len],
            cursor: 0,
            last: None,
        }
    }

    /// Feed one frame and return the resulting reading.
    ///
    /// Fallback: a malformed frame (empty or non-finite) does not touch the
    /// history and yields [`hold`](Self::hold) instead.
    pub fn observe(&mut self, frame: &AudioFrame) -> LoudnessSample {
        self.try_observe(frame).unwrap_or_else(|| self.hold())
    }

    /// Like [`observe`](Self::observe) but reports a malformed frame as `None`
    /// so the caller can tell a fresh reading from a held one.
    pub fn try_observe(&mut self, frame: &AudioFrame) -> Option<LoudnessSample> {
        let Some(rms) = frame.rms() else {
            log::debug!("Malformed audio frame ({} samples), holding last level", frame.len());
            return None;
        };

        self.history[self.cursor] = rms;
        self.cursor = (self.cursor + 1) % self.history.len();

        let smoothed = self.smoothed();
        let sample = LoudnessSample {
            level: self.normalize(smoothed),
            rms: smoothed,
        };
        log::trace!("rms {:.5} smoothed {:.5} level {:.3}", rms, smoothed, sample.level);

        self.last = Some(sample);
        Some(sample)
    }

    /// Reading to use when no usable frame arrived this tick: the previous
    /// reading unchanged, or the gated silence reading if there is none yet.
    pub fn hold(&self) -> LoudnessSample {
        self.last.unwrap_or(LoudnessSample {
            level: self.normalize(0.0),
            rms: 0.0,
        })
    }

    /// Last reading produced by `observe`, if any
    pub fn last(&self) -> Option<LoudnessSample> {
        self.last
    }

    /// Mean of the history ring
    pub fn smoothed(&self) -> f32 {
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    /// Gate then scale a smoothed RMS into [0, 1]
    fn normalize(&self, smoothed: f32) -> f32 {
        if smoothed < self.params.volume_threshold {
            return self.params.silence_level.clamp(0.0, 1.0);
        }
        (smoothed / self.params.max_volume).clamp(0.0, 1.0)
    }
}
