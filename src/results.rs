//! Session results and the scoreboard
//!
//! Kept in memory only; a fresh process starts with an empty board.

use serde::{Deserialize, Serialize};

use crate::sim::{Outcome, Role};

/// Maximum number of entries to keep
pub const MAX_ENTRIES: usize = 10;

/// Outcome from the player's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Victory,
    Defeat,
}

impl Verdict {
    /// `player` is the role the microphone drives
    pub fn for_player(outcome: Outcome, player: Role) -> Self {
        if outcome.winner() == player {
            Verdict::Victory
        } else {
            Verdict::Defeat
        }
    }
}

/// End-of-run rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Legend,
    Awesome,
    Great,
    TryAgain,
}

impl Rating {
    /// Victories are rated more generously than defeats
    pub fn rate(verdict: Verdict, score: f32) -> Self {
        match verdict {
            Verdict::Victory if score > 700.0 => Rating::Legend,
            Verdict::Victory if score > 500.0 => Rating::Awesome,
            Verdict::Victory => Rating::Great,
            Verdict::Defeat if score > 500.0 => Rating::Awesome,
            Verdict::Defeat if score > 200.0 => Rating::Great,
            Verdict::Defeat => Rating::TryAgain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Legend => "LEGEND!",
            Rating::Awesome => "AWESOME!",
            Rating::Great => "GREAT!",
            Rating::TryAgain => "TRY AGAIN!",
        }
    }
}

/// Final numbers of one finished session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub outcome: Outcome,
    pub verdict: Verdict,
    pub rating: Rating,
    pub score: f32,
    /// Tick count when the outcome fired
    pub ticks: u64,
}

impl SessionSummary {
    pub fn new(outcome: Outcome, score: f32, ticks: u64, player: Role) -> Self {
        let verdict = Verdict::for_player(outcome, player);
        Self {
            outcome,
            verdict,
            rating: Rating::rate(verdict, score),
            score,
            ticks,
        }
    }

    /// Board order: higher score first, then the quicker finish
    fn outranks(&self, other: &SessionSummary) -> bool {
        self.score > other.score || (self.score == other.score && self.ticks < other.ticks)
    }
}

/// Best sessions of this process, highest score first. Equal scores are
/// ordered by fewer ticks; a full tie keeps the earlier session ahead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scoreboard {
    pub entries: Vec<SessionSummary>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `summary` would be inserted at. Entries it does not outrank stay ahead.
    fn slot(&self, summary: &SessionSummary) -> usize {
        self.entries.partition_point(|e| !summary.outranks(e))
    }

    /// 1-based rank `summary` would get, or `None` if it would not make the board
    pub fn potential_rank(&self, summary: &SessionSummary) -> Option<usize> {
        if summary.score <= 0.0 || !summary.score.is_finite() {
            return None;
        }
        let slot = self.slot(summary);
        (slot < MAX_ENTRIES).then_some(slot + 1)
    }

    pub fn qualifies(&self, summary: &SessionSummary) -> bool {
        self.potential_rank(summary).is_some()
    }

    /// Insert `summary` and return its rank; sessions pushed off the end are forgotten.
    pub fn record(&mut self, summary: SessionSummary) -> Option<usize> {
        let rank = self.potential_rank(&summary)?;
        self.entries.insert(rank - 1, summary);
        self.entries.truncate(MAX_ENTRIES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score)
    }

    /// Wins among the recorded entries
    pub fn victories(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.verdict == Verdict::Victory)
            .count()
    }
}
