//! Voice Chase - an audio-reactive pursuit game engine
//!
//! Core modules:
//! - `audio`: Frame formats, capture handoff, procedural test sources
//! - `sim`: Deterministic simulation (envelope, speeds, kinematics, outcome)
//! - `settings`: Session configuration, presets and validation
//! - `hud`: Read-only derivations for renderers
//! - `results`: Verdicts, ratings and the in-memory scoreboard

pub mod audio;
pub mod hud;
pub mod results;
pub mod settings;
pub mod sim;

pub use results::{Rating, Scoreboard, SessionSummary, Verdict};
pub use settings::{ChaseConfig, ConfigError, Preset};
pub use sim::{ChaseSession, Outcome, Role, Snapshot};

/// Engine constants
pub mod consts {
    /// Capture chunk size in samples (one frame per tick)
    pub const CHUNK_SAMPLES: usize = 1024;
    /// Capture sample rate (Hz)
    pub const SAMPLE_RATE: u32 = 44_100;
    /// Default driver tick rate (25 ms per tick)
    pub const TICK_HZ: u32 = 40;

    /// Fixed-point scale for signed 16-bit PCM
    pub const PCM16_SCALE: f32 = 32_768.0;

    /// Distance under which the HUD flags the pursued as nearly home
    pub const NEAR_FINISH_DISTANCE: f32 = 1.0;
    /// Gap under which the HUD flags a close call
    pub const CLOSE_CALL_GAP: f32 = 1.0;
}
