//! Fixed-step simulation tick
//!
//! One call advances the chase by exactly one tick:
//! loudness -> speeds -> positions -> score -> outcome.

use serde::{Deserialize, Serialize};

use super::envelope::LoudnessSample;
use super::kinematics::advance;
use super::state::{Agent, Phase, Role, SessionState};
use super::terminal::Outcome;
use crate::audio::{AudioFrame, AudioSource};
use crate::hud::Hud;
use crate::results::SessionSummary;
use crate::settings::{ChaseConfig, ConfigError};

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// The chase advanced and is still undecided
    Running,
    /// This tick decided the chase
    Finished(Outcome),
    /// The chase was already over; nothing moved
    Frozen(Outcome),
}

impl TickResult {
    pub fn outcome(&self) -> Option<Outcome> {
        match *self {
            TickResult::Running => None,
            TickResult::Finished(o) | TickResult::Frozen(o) => Some(o),
        }
    }
}

/// Advance `state` by one tick.
///
/// `frame` is this tick's capture chunk, or `None` when the source had
/// nothing (or failed). Missing and malformed frames reuse the last loudness
/// reading. Agents are all moved (in id order, pursuer first) before the
/// terminal check, so the outcome does not depend on update order.
///
/// `config` must be the one `state` was created from; [`SessionState::new`]
/// is where it gets validated.
pub fn tick(state: &mut SessionState, config: &ChaseConfig, frame: Option<&AudioFrame>) -> TickResult {
    if let Some(outcome) = state.outcome() {
        return TickResult::Frozen(outcome);
    }

    let fresh = frame.and_then(|f| state.envelope.try_observe(f));
    let loudness = match fresh {
        Some(sample) => {
            state.stale_ticks = 0;
            state.last_loudness = Some(sample);
            sample
        }
        None => {
            state.stale_ticks = state.stale_ticks.saturating_add(1);
            state.envelope.hold()
        }
    };

    let track = config.track();
    let elapsed = state.tick;
    for agent in state.agents.iter_mut() {
        let speed = config.speed_model(agent.role).speed(elapsed, loudness.level);
        advance(agent, speed, &track);
    }

    let scored_speed = state.agent(config.scored).map_or(0.0, |a| a.speed);
    state.tick += 1;
    state.score += scored_speed * config.scoring_factor;

    let outcome = state.latch.evaluate(&state.agents, &track, state.tick);

    match outcome {
        Some(outcome) => {
            log::info!(
                "Chase over: {} at tick {} (score {:.1})",
                outcome.as_str(),
                state.tick,
                state.score
            );
            TickResult::Finished(outcome)
        }
        None => TickResult::Running,
    }
}

/// Read-only view of one agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: u32,
    pub role: Role,
    pub position: f32,
    pub speed: f32,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            role: agent.role,
            position: agent.position,
            speed: agent.speed,
        }
    }
}

/// Immutable copy of the session for renderers, taken after the outcome check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: f32,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub agents: Vec<AgentView>,
    pub last_loudness: Option<LoudnessSample>,
    pub stale_ticks: u32,
    pub hud: Hud,
}

impl SessionState {
    pub fn snapshot(&self, config: &ChaseConfig) -> Snapshot {
        let level = self.last_loudness.map_or(0.0, |s| s.level);
        Snapshot {
            tick: self.tick,
            score: self.score,
            phase: self.phase(),
            outcome: self.outcome(),
            agents: self.agents.iter().map(AgentView::from).collect(),
            last_loudness: self.last_loudness,
            stale_ticks: self.stale_ticks,
            hud: Hud::measure(&self.agents, &config.track(), level),
        }
    }
}

/// A validated config plus the session it drives
///
/// This is the object an external driver holds: call [`step`](Self::step)
/// from the fixed-rate timer, render the returned snapshot.
#[derive(Debug, Clone)]
pub struct ChaseSession {
    config: ChaseConfig,
    state: SessionState,
    /// Consecutive failed pulls, for log throttling
    fault_streak: u32,
}

impl ChaseSession {
    /// Validate `config` and start a session
    pub fn new(config: ChaseConfig) -> Result<Self, ConfigError> {
        let state = SessionState::new(&config)?;
        log::info!(
            "New chase: {} is voice-controlled, finish {:?}, margin {}",
            config.voice_controlled,
            config.finish_line,
            config.capture_margin
        );
        Ok(Self {
            config,
            state,
            fault_streak: 0,
        })
    }

    pub fn config(&self) -> &ChaseConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Pull one frame from `source` and advance. Source faults are logged and
    /// absorbed; the tick proceeds on the last loudness reading. A finished
    /// session does not touch the source.
    pub fn step<S: AudioSource + ?Sized>(&mut self, source: &mut S) -> TickResult {
        if let Some(outcome) = self.state.outcome() {
            return TickResult::Frozen(outcome);
        }

        let frame = match source.pull_frame() {
            Ok(Some(frame)) => {
                if self.fault_streak > 0 {
                    log::info!("Audio recovered after {} failed pull(s)", self.fault_streak);
                    self.fault_streak = 0;
                }
                Some(frame)
            }
            Ok(None) => {
                log::trace!("No new audio frame at tick {}", self.state.tick);
                None
            }
            Err(err) => {
                self.fault_streak += 1;
                if self.fault_streak == 1 {
                    log::warn!("Audio fault at tick {}: {} (holding last level)", self.state.tick, err);
                } else {
                    log::debug!("Audio fault x{}: {}", self.fault_streak, err);
                }
                None
            }
        };

        self.tick_frame(frame.as_ref())
    }

    /// Advance with an explicit frame (`None` = no frame this tick)
    pub fn tick_frame(&mut self, frame: Option<&AudioFrame>) -> TickResult {
        tick(&mut self.state, &self.config, frame)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(&self.config)
    }

    /// Final result, once the chase is over
    pub fn summary(&self) -> Option<SessionSummary> {
        self.state
            .outcome()
            .map(|outcome| SessionSummary::new(outcome, self.state.score, self.state.tick, self.config.player()))
    }

    /// Fresh envelope, zeroed tick and score, agents back at the start
    pub fn reset(&mut self) {
        log::info!("Resetting chase after {} tick(s)", self.state.tick);
        self.state = SessionState::start(&self.config);
        self.fault_streak = 0;
    }
}
