//! Session state and core simulation types
//!
//! The whole mutable state of one chase lives in [`SessionState`]. Only
//! `tick` mutates it; renderers read [`Snapshot`](super::Snapshot) copies.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::envelope::{EnvelopeEstimator, LoudnessSample};
use super::terminal::{Outcome, TerminalLatch};
use crate::settings::{ChaseConfig, ConfigError};

/// Which side of the chase an agent is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Pursuer,
    Pursued,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Pursuer, Role::Pursued];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pursuer => "pursuer",
            Role::Pursued => "pursued",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pursuer" | "hunter" => Some(Role::Pursuer),
            "pursued" | "prey" => Some(Role::Pursued),
            _ => None,
        }
    }

    pub fn opponent(&self) -> Role {
        match self {
            Role::Pursuer => Role::Pursued,
            Role::Pursued => Role::Pursuer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Ticks advance the chase
    Running,
    /// Outcome decided, state frozen until reset
    Terminal,
}

/// An agent on the 1-D track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    pub role: Role,
    /// Track coordinate
    pub position: f32,
    /// Distance covered on the last tick
    pub speed: f32,
}

impl Agent {
    pub fn new(id: u32, role: Role, position: f32) -> Self {
        Self {
            id,
            role,
            position,
            speed: 0.0,
        }
    }
}

/// Complete state of one chase session
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Ticks simulated so far
    pub tick: u64,
    /// Score accumulator
    pub score: f32,
    /// Agents in id order (pursuer first), which is also the update order
    pub agents: Vec<Agent>,
    /// Estimator history for this session
    pub envelope: EnvelopeEstimator,
    /// Most recent fresh loudness reading; `None` until the first one
    pub last_loudness: Option<LoudnessSample>,
    /// Consecutive ticks served by the loudness fallback
    pub stale_ticks: u32,
    /// Only `tick` evaluates through this, so the outcome is set at most once
    pub(super) latch: TerminalLatch,
}

impl SessionState {
    /// Start-of-session state for `config`. Rejects configs that would let a
    /// tick panic (inverted ranges, empty track).
    pub fn new(config: &ChaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::start(config))
    }

    /// Same as [`new`](Self::new) for a config already known to be valid
    pub(super) fn start(config: &ChaseConfig) -> Self {
        let agents = vec![
            Agent::new(1, Role::Pursuer, config.pursuer_start),
            Agent::new(2, Role::Pursued, config.pursued_start),
        ];

        Self {
            tick: 0,
            score: 0.0,
            agents,
            envelope: EnvelopeEstimator::new(config.envelope_params()),
            last_loudness: None,
            stale_ticks: 0,
            latch: TerminalLatch::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.latch.is_set() {
            Phase::Terminal
        } else {
            Phase::Running
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.latch.outcome()
    }

    pub fn is_terminal(&self) -> bool {
        self.latch.is_set()
    }

    /// Tick count at which the outcome fired
    pub fn ended_at(&self) -> Option<u64> {
        self.latch.at_tick()
    }

    /// First agent with `role`
    pub fn agent(&self, role: Role) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Preset;

    #[test]
    fn test_new_session_starts_running() {
        let config = ChaseConfig::from_preset(Preset::DogRun);
        let state = SessionState::new(&config).unwrap();

        assert_eq!(state.phase(), Phase::Running);
        assert_eq!(state.tick, 0);
        assert_eq!(state.score, 0.0);
        assert_eq!(state.outcome(), None);
        assert_eq!(state.last_loudness, None);
        assert_eq!(state.agent(Role::Pursuer).unwrap().position, 0.5);
        assert_eq!(state.agent(Role::Pursued).unwrap().position, 2.0);
    }

    #[test]
    fn test_invalid_config_has_no_state() {
        let config = ChaseConfig {
            v_min_pursued: 0.2,
            v_max_pursued: 0.1,
            ..ChaseConfig::from_preset(Preset::DogRun)
        };
        assert!(matches!(
            SessionState::new(&config),
            Err(ConfigError::SpeedRange {
                role: Role::Pursued,
                ..
            })
        ));
    }

    #[test]
    fn test_role_names() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
            assert_eq!(role.opponent().opponent(), role);
        }
        assert_eq!(Role::Pursued.to_string(), "pursued");
    }
}
