//! Session configuration
//!
//! Everything a chase needs is fixed at session start. The four game
//! variants are presets of one engine rather than separate code paths.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{EnvelopeParams, RampParams, Role, SpeedModel, TrackConfig, VoiceCurve};

/// Tuned variants of the chase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// Time-ramped car hunts a voice-driven dog to the finish line
    #[default]
    DogRun,
    /// Voice-driven car hunts a steadily accelerating dog
    CarChasesDog,
    /// Accelerating dog hunts a voice-driven car, no finish line
    DogChasesCar,
    /// Faster, twitchier take on `DogChasesCar`
    PixelDogChasesCar,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::DogRun,
        Preset::CarChasesDog,
        Preset::DogChasesCar,
        Preset::PixelDogChasesCar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::DogRun => "dog-run",
            Preset::CarChasesDog => "car-chases-dog",
            Preset::DogChasesCar => "dog-chases-car",
            Preset::PixelDogChasesCar => "pixel-dog-chases-car",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "dog-run" | "dogrun" => Some(Preset::DogRun),
            "car-chases-dog" => Some(Preset::CarChasesDog),
            "dog-chases-car" => Some(Preset::DogChasesCar),
            "pixel-dog-chases-car" | "pixel" => Some(Preset::PixelDogChasesCar),
            _ => None,
        }
    }
}

/// Configuration rejected at session construction
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("track_min ({min}) must be below track_max ({max})")]
    InvalidTrack { min: f32, max: f32 },
    #[error("finish_line {finish} lies outside the track ({min}..={max})")]
    FinishOutsideTrack { finish: f32, min: f32, max: f32 },
    #[error("{role} start {position} lies outside the track ({min}..={max})")]
    StartOutsideTrack {
        role: Role,
        position: f32,
        min: f32,
        max: f32,
    },
    #[error("pursuer must start behind the pursued (pursuer {pursuer}, pursued {pursued})")]
    StartOrder { pursuer: f32, pursued: f32 },
    #[error("{role} speed range is inverted: v_min {min} > v_max {max}")]
    SpeedRange { role: Role, min: f32, max: f32 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must lie in [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("envelope_history_len must be at least 1")]
    EmptyHistory,
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Chase session configuration
///
/// Distances are track units, speeds are track units per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    // === Track ===
    pub track_min: f32,
    pub track_max: f32,
    /// Line the pursued must reach to escape. `None` = endurance chase.
    pub finish_line: Option<f32>,
    /// Distance at which the pursuer counts as having caught up
    pub capture_margin: f32,
    pub pursuer_start: f32,
    pub pursued_start: f32,

    // === Speeds ===
    pub v_min_pursuer: f32,
    pub v_max_pursuer: f32,
    pub v_min_pursued: f32,
    pub v_max_pursued: f32,
    /// Ramp slope up to `accel_break_tick` (time-driven agent)
    pub accel_phase1: f32,
    /// Ramp slope after `accel_break_tick`
    pub accel_phase2: f32,
    pub accel_break_tick: u64,
    /// Response exponent of the voice-driven agent (>1 softens the mid range)
    pub loudness_gamma: f32,
    /// Which agent the microphone drives; the other follows the time ramp
    pub voice_controlled: Role,

    // === Envelope ===
    /// Smoothed RMS below this is treated as silence
    pub volume_threshold: f32,
    /// Smoothed RMS that maps to full loudness
    pub max_volume: f32,
    pub envelope_history_len: usize,
    /// Level reported while gated
    pub silence_level: f32,

    // === Scoring ===
    pub scoring_factor: f32,
    /// Whose speed feeds the score
    pub scored: Role,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self::from_preset(Preset::DogRun)
    }
}

impl ChaseConfig {
    /// Build the configuration for a preset
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::DogRun => Self {
                track_min: 0.0,
                track_max: 12.0,
                finish_line: Some(11.0),
                capture_margin: 0.2,
                pursuer_start: 0.5,
                pursued_start: 2.0,

                v_min_pursuer: 0.05,
                v_max_pursuer: 0.60,
                v_min_pursued: 0.03,
                v_max_pursued: 0.125,
                accel_phase1: 0.0014,
                accel_phase2: 0.0019,
                // ~10 s at 25 ms per tick
                accel_break_tick: 400,
                loudness_gamma: 1.6,
                voice_controlled: Role::Pursued,

                volume_threshold: 0.004,
                max_volume: 0.06,
                envelope_history_len: 20,
                silence_level: 0.0,

                scoring_factor: 10.0,
                scored: Role::Pursuer,
            },
            Preset::CarChasesDog => Self {
                capture_margin: 0.3,
                v_min_pursuer: 0.07,
                v_max_pursuer: 0.22,
                v_min_pursued: 0.08,
                v_max_pursued: 1.0,
                accel_phase1: 0.00018,
                accel_phase2: 0.00018,
                accel_break_tick: 0,
                loudness_gamma: 1.0,
                voice_controlled: Role::Pursuer,
                volume_threshold: 0.0003,
                max_volume: 0.04,
                envelope_history_len: 8,
                ..Self::from_preset(Preset::DogRun)
            },
            Preset::DogChasesCar => Self {
                finish_line: None,
                capture_margin: 0.0,
                v_min_pursuer: 0.02,
                v_max_pursuer: 1.0,
                v_min_pursued: 0.01,
                v_max_pursued: 0.08,
                accel_phase1: 0.00005,
                accel_phase2: 0.00005,
                accel_break_tick: 0,
                loudness_gamma: 1.0,
                voice_controlled: Role::Pursued,
                volume_threshold: 0.001,
                max_volume: 0.15,
                envelope_history_len: 1,
                silence_level: 0.1,
                scored: Role::Pursued,
                ..Self::from_preset(Preset::DogRun)
            },
            Preset::PixelDogChasesCar => Self {
                v_min_pursuer: 0.08,
                v_min_pursued: 0.07,
                v_max_pursued: 0.22,
                accel_phase1: 0.00025,
                accel_phase2: 0.00025,
                volume_threshold: 0.0005,
                max_volume: 0.25,
                envelope_history_len: 5,
                ..Self::from_preset(Preset::DogChasesCar)
            },
        }
    }

    /// Parse JSON; missing fields take the `DogRun` defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The player steers whichever agent the microphone drives
    pub fn player(&self) -> Role {
        self.voice_controlled
    }

    pub fn start_position(&self, role: Role) -> f32 {
        match role {
            Role::Pursuer => self.pursuer_start,
            Role::Pursued => self.pursued_start,
        }
    }

    fn speed_range(&self, role: Role) -> (f32, f32) {
        match role {
            Role::Pursuer => (self.v_min_pursuer, self.v_max_pursuer),
            Role::Pursued => (self.v_min_pursued, self.v_max_pursued),
        }
    }

    pub fn track(&self) -> TrackConfig {
        TrackConfig {
            min: self.track_min,
            max: self.track_max,
            finish_line: self.finish_line,
            capture_margin: self.capture_margin,
        }
    }

    pub fn envelope_params(&self) -> EnvelopeParams {
        EnvelopeParams {
            history_len: self.envelope_history_len,
            volume_threshold: self.volume_threshold,
            max_volume: self.max_volume,
            silence_level: self.silence_level,
        }
    }

    /// Speed model assigned to `role`
    pub fn speed_model(&self, role: Role) -> SpeedModel {
        let (v_min, v_max) = self.speed_range(role);
        if role == self.voice_controlled {
            SpeedModel::Voice(VoiceCurve {
                v_min,
                v_max,
                gamma: self.loudness_gamma,
            })
        } else {
            SpeedModel::Ramp(RampParams {
                v_min,
                v_max,
                accel_phase1: self.accel_phase1,
                accel_phase2: self.accel_phase2,
                break_tick: self.accel_break_tick,
            })
        }
    }

    /// Reject configurations that would start a session in an inconsistent state
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("track_min", self.track_min),
            ("track_max", self.track_max),
            ("finish_line", self.finish_line.unwrap_or(0.0)),
            ("capture_margin", self.capture_margin),
            ("pursuer_start", self.pursuer_start),
            ("pursued_start", self.pursued_start),
            ("v_min_pursuer", self.v_min_pursuer),
            ("v_max_pursuer", self.v_max_pursuer),
            ("v_min_pursued", self.v_min_pursued),
            ("v_max_pursued", self.v_max_pursued),
            ("accel_phase1", self.accel_phase1),
            ("accel_phase2", self.accel_phase2),
            ("loudness_gamma", self.loudness_gamma),
            ("volume_threshold", self.volume_threshold),
            ("max_volume", self.max_volume),
            ("silence_level", self.silence_level),
            ("scoring_factor", self.scoring_factor),
        ];
        if let Some(&(field, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field });
        }

        if self.track_min >= self.track_max {
            return Err(ConfigError::InvalidTrack {
                min: self.track_min,
                max: self.track_max,
            });
        }
        let on_track = |x: f32| (self.track_min..=self.track_max).contains(&x);

        if let Some(finish) = self.finish_line {
            if !on_track(finish) {
                return Err(ConfigError::FinishOutsideTrack {
                    finish,
                    min: self.track_min,
                    max: self.track_max,
                });
            }
        }

        for role in Role::ALL {
            let position = self.start_position(role);
            if !on_track(position) {
                return Err(ConfigError::StartOutsideTrack {
                    role,
                    position,
                    min: self.track_min,
                    max: self.track_max,
                });
            }
        }
        if self.pursuer_start >= self.pursued_start {
            return Err(ConfigError::StartOrder {
                pursuer: self.pursuer_start,
                pursued: self.pursued_start,
            });
        }

        let non_negative = [
            ("capture_margin", self.capture_margin),
            ("v_min_pursuer", self.v_min_pursuer),
            ("v_min_pursued", self.v_min_pursued),
            ("accel_phase1", self.accel_phase1),
            ("accel_phase2", self.accel_phase2),
            ("volume_threshold", self.volume_threshold),
            ("scoring_factor", self.scoring_factor),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::Negative { field, value });
        }

        for role in Role::ALL {
            let (min, max) = self.speed_range(role);
            if min > max {
                return Err(ConfigError::SpeedRange { role, min, max });
            }
        }

        let positive = [
            ("loudness_gamma", self.loudness_gamma),
            ("max_volume", self.max_volume),
        ];
        if let Some(&(field, value)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(ConfigError::NonPositive { field, value });
        }

        if !(0.0..=1.0).contains(&self.silence_level) {
            return Err(ConfigError::OutOfUnitRange {
                field: "silence_level",
                value: self.silence_level,
            });
        }

        if self.envelope_history_len == 0 {
            return Err(ConfigError::EmptyHistory);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in Preset::ALL {
            let config = ChaseConfig::from_preset(preset);
            assert!(config.validate().is_ok(), "{} failed validation", preset.as_str());
            assert_eq!(Preset::from_str(preset.as_str()), Some(preset));
        }
    }

    #[test]
    fn test_default_is_dog_run() {
        assert_eq!(ChaseConfig::default(), ChaseConfig::from_preset(Preset::DogRun));
        assert_eq!(Preset::default(), Preset::DogRun);
    }

    #[test]
    fn test_role_assignment_follows_voice_controlled() {
        let config = ChaseConfig::from_preset(Preset::DogRun);
        assert!(matches!(config.speed_model(Role::Pursuer), SpeedModel::Ramp(_)));
        assert!(matches!(config.speed_model(Role::Pursued), SpeedModel::Voice(_)));

        let config = ChaseConfig::from_preset(Preset::CarChasesDog);
        assert!(matches!(config.speed_model(Role::Pursuer), SpeedModel::Voice(_)));
        assert!(matches!(config.speed_model(Role::Pursued), SpeedModel::Ramp(_)));
        assert_eq!(config.player(), Role::Pursuer);
    }

    #[test]
    fn test_inverted_speed_range_rejected() {
        let config = ChaseConfig {
            v_min_pursuer: 0.7,
            v_max_pursuer: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpeedRange {
                role: Role::Pursuer,
                ..
            })
        ));
    }

    #[test]
    fn test_inverted_track_rejected() {
        let config = ChaseConfig {
            track_min: 12.0,
            track_max: 12.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTrack { .. })
        ));
    }

    #[test]
    fn test_misc_validation_rules() {
        let cases = [
            ChaseConfig {
                finish_line: Some(13.0),
                ..Default::default()
            },
            ChaseConfig {
                pursuer_start: 3.0,
                ..Default::default()
            },
            ChaseConfig {
                capture_margin: -0.1,
                ..Default::default()
            },
            ChaseConfig {
                max_volume: 0.0,
                ..Default::default()
            },
            ChaseConfig {
                silence_level: 1.5,
                ..Default::default()
            },
            ChaseConfig {
                envelope_history_len: 0,
                ..Default::default()
            },
            ChaseConfig {
                loudness_gamma: f32::NAN,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn test_json_partial_override() {
        let config = ChaseConfig::from_json(r#"{ "capture_margin": 0.5, "finish_line": null }"#)
            .unwrap();
        assert_eq!(config.capture_margin, 0.5);
        assert_eq!(config.finish_line, None);
        assert_eq!(config.track_max, 12.0);
    }

    #[test]
    fn test_json_roundtrip_and_rejection() {
        let config = ChaseConfig::from_preset(Preset::PixelDogChasesCar);
        let json = config.to_json().unwrap();
        assert_eq!(ChaseConfig::from_json(&json).unwrap(), config);

        assert!(matches!(
            ChaseConfig::from_json(r#"{ "track_min": 5.0, "track_max": 1.0 }"#),
            Err(ConfigError::InvalidTrack { .. })
        ));
        assert!(matches!(
            ChaseConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
