//! Procedural audio sources
//!
//! Stand-ins for a microphone: no devices, no files. Used by the headless
//! driver and by tests that need a repeatable voice.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{AudioFrame, AudioSource, SourceError};
use crate::consts::{CHUNK_SAMPLES, SAMPLE_RATE};

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample at phase in [0, 1)
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

/// Peak amplitude over time, indexed by frame number
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceScript {
    /// Nothing but the noise floor
    Silence,
    /// Constant level
    Steady { amplitude: f32 },
    /// Quiet until `at_frame`, then loud
    Shout {
        quiet: f32,
        loud: f32,
        at_frame: u64,
    },
    /// Repeating on/off pattern
    Bursts {
        amplitude: f32,
        on_frames: u64,
        off_frames: u64,
    },
}

impl VoiceScript {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceScript::Silence => "silence",
            VoiceScript::Steady { .. } => "steady",
            VoiceScript::Shout { .. } => "shout",
            VoiceScript::Bursts { .. } => "bursts",
        }
    }

    /// Named scripts with amplitudes suited to the default calibration
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silence" | "quiet" => Some(VoiceScript::Silence),
            "steady" => Some(VoiceScript::Steady { amplitude: 0.05 }),
            "shout" => Some(VoiceScript::Shout {
                quiet: 0.01,
                loud: 0.12,
                at_frame: 120,
            }),
            "bursts" => Some(VoiceScript::Bursts {
                amplitude: 0.1,
                on_frames: 30,
                off_frames: 20,
            }),
            _ => None,
        }
    }

    pub fn amplitude_at(&self, frame: u64) -> f32 {
        match *self {
            VoiceScript::Silence => 0.0,
            VoiceScript::Steady { amplitude } => amplitude,
            VoiceScript::Shout {
                quiet,
                loud,
                at_frame,
            } => {
                if frame < at_frame {
                    quiet
                } else {
                    loud
                }
            }
            VoiceScript::Bursts {
                amplitude,
                on_frames,
                off_frames,
            } => {
                let period = (on_frames + off_frames).max(1);
                if frame % period < on_frames {
                    amplitude
                } else {
                    0.0
                }
            }
        }
    }
}

/// Output sample format of a synthetic source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    #[default]
    Float32,
    Pcm16,
}

/// Oscillator plus seeded background hiss, following a [`VoiceScript`]
pub struct SynthSource {
    script: VoiceScript,
    waveform: Waveform,
    freq_hz: f32,
    noise_floor: f32,
    format: SampleFormat,
    chunk: usize,
    sample_rate: u32,
    phase: f32,
    frame_index: u64,
    rng: Pcg32,
}

impl SynthSource {
    pub fn new(script: VoiceScript, seed: u64) -> Self {
        Self {
            script,
            waveform: Waveform::Sine,
            freq_hz: 220.0,
            noise_floor: 0.0005,
            format: SampleFormat::Float32,
            chunk: CHUNK_SAMPLES,
            sample_rate: SAMPLE_RATE,
            phase: 0.0,
            frame_index: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn with_waveform(mut self, waveform: Waveform, freq_hz: f32) -> Self {
        self.waveform = waveform;
        self.freq_hz = freq_hz.max(1.0);
        self
    }

    pub fn with_noise_floor(mut self, noise_floor: f32) -> Self {
        self.noise_floor = noise_floor.clamp(0.0, 1.0);
        self
    }

    pub fn with_format(mut self, format: SampleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Render the next chunk
    pub fn next_frame(&mut self) -> AudioFrame {
        let amplitude = self.script.amplitude_at(self.frame_index);
        let step = self.freq_hz / self.sample_rate as f32;

        let mut samples = Vec::with_capacity(self.chunk);
        for _ in 0..self.chunk {
            let tone = self.waveform.sample(self.phase) * amplitude;
            let hiss = if self.noise_floor > 0.0 {
                self.rng.random_range(-self.noise_floor..self.noise_floor)
            } else {
                0.0
            };
            samples.push((tone + hiss).clamp(-1.0, 1.0));

            self.phase += step;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
        self.frame_index += 1;

        match self.format {
            SampleFormat::Float32 => AudioFrame::Float32(samples),
            SampleFormat::Pcm16 => AudioFrame::Pcm16(
                samples
                    .into_iter()
                    .map(|s| (s * i16::MAX as f32) as i16)
                    .collect(),
            ),
        }
    }
}

impl AudioSource for SynthSource {
    fn pull_frame(&mut self) -> Result<Option<AudioFrame>, SourceError> {
        Ok(Some(self.next_frame()))
    }
}

/// Plays back a fixed list of frames; `None` entries simulate a device fault.
/// Once exhausted it reports "nothing new" forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Option<AudioFrame>>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Option<AudioFrame>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `count` copies of a DC frame at `amplitude`
    pub fn constant(amplitude: f32, len: usize, count: usize) -> Self {
        Self::new((0..count).map(|_| Some(AudioFrame::dc(amplitude, len))))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl AudioSource for ScriptedSource {
    fn pull_frame(&mut self) -> Result<Option<AudioFrame>, SourceError> {
        match self.frames.pop_front() {
            Some(Some(frame)) => Ok(Some(frame)),
            Some(None) => Err(SourceError::Device("scripted dropout".to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_stays_near_noise_floor() {
        let mut source = SynthSource::new(VoiceScript::Silence, 7).with_noise_floor(0.001);
        for _ in 0..10 {
            let rms = source.next_frame().rms().unwrap();
            assert!(rms <= 0.001);
        }
    }

    #[test]
    fn test_square_wave_rms_matches_amplitude() {
        let mut source = SynthSource::new(VoiceScript::Steady { amplitude: 0.2 }, 1)
            .with_waveform(Waveform::Square, 441.0)
            .with_noise_floor(0.0);
        let rms = source.next_frame().rms().unwrap();
        assert!((rms - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = SynthSource::new(VoiceScript::from_str("bursts").unwrap(), 42);
        let mut b = SynthSource::new(VoiceScript::from_str("bursts").unwrap(), 42);
        for _ in 0..5 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_bursts_pattern() {
        let script = VoiceScript::Bursts {
            amplitude: 0.3,
            on_frames: 2,
            off_frames: 1,
        };
        let levels: Vec<f32> = (0..6).map(|f| script.amplitude_at(f)).collect();
        assert_eq!(levels, vec![0.3, 0.3, 0.0, 0.3, 0.3, 0.0]);
    }

    #[test]
    fn test_pcm16_output() {
        let mut source = SynthSource::new(VoiceScript::Steady { amplitude: 0.5 }, 3)
            .with_format(SampleFormat::Pcm16)
            .with_chunk(256);
        let frame = source.next_frame();
        assert!(matches!(frame, AudioFrame::Pcm16(_)));
        assert_eq!(frame.len(), 256);
    }

    #[test]
    fn test_scripted_source_faults_and_exhaustion() {
        let mut source = ScriptedSource::new([Some(AudioFrame::dc(0.1, 4)), None]);
        assert!(source.pull_frame().unwrap().is_some());
        assert!(matches!(source.pull_frame(), Err(SourceError::Device(_))));
        assert_eq!(source.pull_frame(), Ok(None));
        assert_eq!(source.remaining(), 0);
    }
}
