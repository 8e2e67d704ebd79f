//! Audio input boundary
//!
//! The engine never talks to a device. A capture layer (cpal, PortAudio, a
//! test script...) produces mono frames and hands them to the tick loop through
//! an [`AudioSource`]. Everything downstream of `pull_frame` is deterministic.

pub mod queue;
pub mod synth;

use thiserror::Error;

use crate::consts::PCM16_SCALE;

pub use queue::{FrameReceiver, FrameSender, frame_channel};
pub use synth::{SampleFormat, ScriptedSource, SynthSource, VoiceScript, Waveform};

/// One capture chunk of mono samples
#[derive(Debug, Clone, PartialEq)]
pub enum AudioFrame {
    /// Signed 16-bit PCM, normalized by 1/32768 before analysis
    Pcm16(Vec<i16>),
    /// 32-bit float, expected in [-1, 1] (out-of-range samples are clamped)
    Float32(Vec<f32>),
}

impl AudioFrame {
    /// Decode little-endian 16-bit PCM bytes as delivered by most capture APIs.
    /// A trailing odd byte is ignored.
    pub fn from_pcm16_le(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        AudioFrame::Pcm16(samples)
    }

    /// Constant-amplitude float frame. Its RMS is exactly `|amplitude|`
    /// (after clamping), which makes it handy for calibrating thresholds.
    pub fn dc(amplitude: f32, len: usize) -> Self {
        AudioFrame::Float32(vec![amplitude; len])
    }

    pub fn len(&self) -> usize {
        match self {
            AudioFrame::Pcm16(s) => s.len(),
            AudioFrame::Float32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root-mean-square of the frame on the normalized [-1, 1] scale.
    ///
    /// Returns `None` for malformed frames (empty, or containing NaN/inf),
    /// which the envelope estimator treats as a missing reading.
    pub fn rms(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let sum_sq: f32 = match self {
            AudioFrame::Pcm16(samples) => samples
                .iter()
                .map(|&s| {
                    let x = s as f32 / PCM16_SCALE;
                    x * x
                })
                .sum(),
            AudioFrame::Float32(samples) => {
                if samples.iter().any(|s| !s.is_finite()) {
                    return None;
                }
                samples
                    .iter()
                    .map(|&s| {
                        let x = s.clamp(-1.0, 1.0);
                        x * x
                    })
                    .sum()
            }
        };

        Some((sum_sq / self.len() as f32).sqrt())
    }
}

/// Transient capture faults. None of these end a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The capture side has gone away
    #[error("audio source disconnected")]
    Disconnected,
    /// Device-level read failure
    #[error("audio device error: {0}")]
    Device(String),
}

/// Supplier of capture frames, polled once per tick.
pub trait AudioSource {
    /// Next frame for this tick.
    ///
    /// `Ok(None)` means nothing new arrived since the last pull. Implementations
    /// must not block waiting for audio.
    fn pull_frame(&mut self) -> Result<Option<AudioFrame>, SourceError>;
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn pull_frame(&mut self) -> Result<Option<AudioFrame>, SourceError> {
        (**self).pull_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_rms_is_normalized() {
        let frame = AudioFrame::Pcm16(vec![i16::MIN; 64]);
        let rms = frame.rms().unwrap();
        assert!((rms - 1.0).abs() < 1e-6);

        let frame = AudioFrame::Pcm16(vec![16384, -16384, 16384, -16384]);
        assert!((frame.rms().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_float_rms_clamps_out_of_range() {
        let frame = AudioFrame::Float32(vec![3.0, -3.0]);
        assert!((frame.rms().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_frames_have_no_rms() {
        assert_eq!(AudioFrame::Pcm16(Vec::new()).rms(), None);
        assert_eq!(AudioFrame::Float32(vec![0.1, f32::NAN]).rms(), None);
        assert_eq!(AudioFrame::Float32(vec![f32::INFINITY]).rms(), None);
    }

    #[test]
    fn test_dc_frame_rms() {
        let frame = AudioFrame::dc(-0.25, 1024);
        assert!((frame.rms().unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_pcm16_le_decoding() {
        let frame = AudioFrame::from_pcm16_le(&[0x00, 0x40, 0x00, 0xC0, 0xFF]);
        assert_eq!(frame, AudioFrame::Pcm16(vec![16384, -16384]));
    }
}
