//! Round-progression state machine.
//!
//! A round is Complete only when every one of its fixtures has a post-match
//! report. The round actually processed is `max(current, checkpoint + 1)`:
//! the persisted checkpoint can push the target forward past a stale or
//! incomplete official feed, never backward.

use std::collections::HashSet;

use crate::types::{FinishedFixture, Fixture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// No fixture of the round is finished.
    Pending,
    /// Some but not all fixtures are finished.
    Partial,
    /// Every fixture of the round is finished.
    Complete,
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoundState::Pending => "pending",
            RoundState::Partial => "partial",
            RoundState::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoundDecision {
    /// Smallest round that is not Complete; TOTAL_ROUNDS when the season is done.
    pub current_round: u32,
    /// Round to process this run: `max(current_round, checkpoint + 1)`.
    /// May exceed TOTAL_ROUNDS, in which case there is nothing left to process.
    pub target_round: u32,
    pub target_state: RoundState,
}

pub struct RoundTracker {
    total_rounds: u32,
}

impl RoundTracker {
    pub fn new(total_rounds: u32) -> Self {
        Self { total_rounds }
    }

    /// Classifies one round against the fetched fixture set.
    ///
    /// A round with no fetched fixtures is Pending, not Complete: missing data
    /// cannot confirm completeness.
    pub fn state(&self, round: u32, fixtures: &[Fixture], finished: &HashSet<i64>) -> RoundState {
        let mut total = 0usize;
        let mut done = 0usize;
        for fixture in fixtures.iter().filter(|f| f.round == round) {
            total += 1;
            if finished.contains(&fixture.fixture_id) {
                done += 1;
            }
        }
        match (total, done) {
            (0, _) => RoundState::Pending,
            (t, d) if t == d => RoundState::Complete,
            (_, 0) => RoundState::Pending,
            _ => RoundState::Partial,
        }
    }

    /// Smallest round that is not Complete; terminal at TOTAL_ROUNDS.
    pub fn current_round(&self, fixtures: &[Fixture], finished: &HashSet<i64>) -> u32 {
        for round in 1..=self.total_rounds {
            if self.state(round, fixtures, finished) != RoundState::Complete {
                return round;
            }
        }
        self.total_rounds
    }

    /// Full decision for one run given the persisted checkpoint.
    pub fn decide(
        &self,
        fixtures: &[Fixture],
        finished: &[FinishedFixture],
        checkpoint: u32,
    ) -> RoundDecision {
        let finished_ids: HashSet<i64> = finished.iter().map(|f| f.fixture_id).collect();
        let current_round = self.current_round(fixtures, &finished_ids);
        let target_round = current_round.max(checkpoint + 1);
        RoundDecision {
            current_round,
            target_round,
            target_state: self.state(target_round, fixtures, &finished_ids),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
