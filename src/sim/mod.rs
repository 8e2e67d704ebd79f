//! Deterministic simulation module
//!
//! All chase logic lives here. This module must be pure and deterministic:
//! - Fixed tick only (speeds are distance per tick)
//! - Audio enters as one optional frame per tick, nothing else
//! - Stable iteration order (by agent ID)
//! - No rendering, device or platform dependencies

pub mod envelope;
pub mod kinematics;
pub mod speed;
pub mod state;
pub mod terminal;
pub mod tick;

pub use envelope::{EnvelopeEstimator, EnvelopeParams, LoudnessSample};
pub use kinematics::{TrackConfig, advance};
pub use speed::{RampParams, SpeedModel, VoiceCurve, ramp_speed, voice_speed};
pub use state::{Agent, Phase, Role, SessionState};
pub use terminal::{Outcome, TerminalLatch, evaluate};
pub use tick::{AgentView, ChaseSession, Snapshot, TickResult, tick};
