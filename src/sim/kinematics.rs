//! Track geometry and per-tick integration

use serde::{Deserialize, Serialize};

use super::state::Agent;

/// Track layout, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub min: f32,
    pub max: f32,
    /// `None` for endurance chases with no escape
    pub finish_line: Option<f32>,
    pub capture_margin: f32,
}

impl TrackConfig {
    pub fn clamp(&self, position: f32) -> f32 {
        position.clamp(self.min, self.max)
    }

    pub fn contains(&self, position: f32) -> bool {
        (self.min..=self.max).contains(&position)
    }

    pub fn length(&self) -> f32 {
        self.max - self.min
    }
}

/// Move `agent` forward by one tick at `speed` (distance per tick), clamped
/// to the track.
pub fn advance(agent: &mut Agent, speed: f32, track: &TrackConfig) {
    agent.speed = speed;
    agent.position = track.clamp(agent.position + speed);
    debug_assert!(
        track.contains(agent.position),
        "agent {} left the track: {}",
        agent.id,
        agent.position
    );
}
