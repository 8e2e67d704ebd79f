//! Terminal conditions
//!
//! Capture: `pursuer + capture_margin >= pursued`.
//! Escape: `pursued >= finish_line`.
//! When both hold on the same tick, capture wins.

use serde::{Deserialize, Serialize};

use super::kinematics::TrackConfig;
use super::state::{Agent, Role};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The pursuer reached the pursued
    Captured,
    /// The pursued crossed the finish line first
    Escaped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Captured => "captured",
            Outcome::Escaped => "escaped",
        }
    }

    /// Role whose goal this outcome fulfils
    pub fn winner(&self) -> Role {
        match self {
            Outcome::Captured => Role::Pursuer,
            Outcome::Escaped => Role::Pursued,
        }
    }
}

/// Evaluate the terminal predicates on the current positions.
///
/// With several agents per role, any pursuer reaching any pursued is a
/// capture and any pursued past the line is an escape.
pub fn evaluate(agents: &[Agent], track: &TrackConfig) -> Option<Outcome> {
    let pursuers = || agents.iter().filter(|a| a.role == Role::Pursuer);
    let pursued = || agents.iter().filter(|a| a.role == Role::Pursued);

    let captured = pursuers().any(|hunter| {
        pursued().any(|prey| hunter.position + track.capture_margin >= prey.position)
    });
    if captured {
        return Some(Outcome::Captured);
    }

    let escaped = track
        .finish_line
        .is_some_and(|finish| pursued().any(|prey| prey.position >= finish));
    if escaped {
        return Some(Outcome::Escaped);
    }

    None
}

/// Latches the first outcome so later evaluations cannot re-derive it
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalLatch {
    outcome: Option<Outcome>,
    /// Tick count at which the outcome fired
    at_tick: Option<u64>,
}

impl TerminalLatch {
    /// Return the latched outcome if set, otherwise evaluate and latch.
    pub fn evaluate(&mut self, agents: &[Agent], track: &TrackConfig, tick: u64) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        if let Some(outcome) = evaluate(agents, track) {
            self.outcome = Some(outcome);
            self.at_tick = Some(tick);
        }
        self.outcome
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn at_tick(&self) -> Option<u64> {
        self.at_tick
    }

    pub fn is_set(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackConfig {
        TrackConfig {
            min: 0.0,
            max: 12.0,
            finish_line: Some(11.0),
            capture_margin: 0.2,
        }
    }

    fn pair(pursuer: f32, pursued: f32) -> Vec<Agent> {
        vec![
            Agent::new(1, Role::Pursuer, pursuer),
            Agent::new(2, Role::Pursued, pursued),
        ]
    }

    #[test]
    fn test_no_outcome_mid_chase() {
        assert_eq!(evaluate(&pair(1.0, 3.0), &track()), None);
    }

    #[test]
    fn test_capture_within_margin() {
        assert_eq!(evaluate(&pair(2.85, 3.0), &track()), Some(Outcome::Captured));
        assert_eq!(evaluate(&pair(2.7, 3.0), &track()), None);
    }

    #[test]
    fn test_escape_at_finish() {
        assert_eq!(evaluate(&pair(5.0, 11.0), &track()), Some(Outcome::Escaped));
    }

    #[test]
    fn test_capture_beats_escape_on_same_tick() {
        assert_eq!(evaluate(&pair(10.9, 11.0), &track()), Some(Outcome::Captured));
    }

    #[test]
    fn test_endurance_track_never_escapes() {
        let track = TrackConfig {
            finish_line: None,
            ..track()
        };
        assert_eq!(evaluate(&pair(1.0, 12.0), &track), None);
    }

    #[test]
    fn test_extra_pursuer_can_capture() {
        let mut agents = pair(1.0, 5.0);
        agents.push(Agent::new(3, Role::Pursuer, 4.9));
        assert_eq!(evaluate(&agents, &track()), Some(Outcome::Captured));
    }

    #[test]
    fn test_latch_is_idempotent() {
        let mut latch = TerminalLatch::default();
        assert_eq!(latch.evaluate(&pair(1.0, 3.0), &track(), 4), None);
        assert_eq!(latch.evaluate(&pair(5.0, 11.5), &track(), 9), Some(Outcome::Escaped));

        // Positions that would now read as a capture do not change the verdict
        assert_eq!(latch.evaluate(&pair(11.5, 11.5), &track(), 10), Some(Outcome::Escaped));
        assert_eq!(latch.evaluate(&pair(11.5, 11.5), &track(), 11), Some(Outcome::Escaped));
        assert_eq!(latch.at_tick(), Some(9));
    }

    #[test]
    fn test_winner() {
        assert_eq!(Outcome::Captured.winner(), Role::Pursuer);
        assert_eq!(Outcome::Escaped.winner(), Role::Pursued);
    }
}
