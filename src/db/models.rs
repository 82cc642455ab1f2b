//! Batch and row types owned by the persistence layer.

use crate::types::{
    FinishedFixture, Fixture, LineupDraft, PlayerCardStat, RosterDraft, Team, TeamRoundStat,
};

/// Everything one run wants committed, handed to the gateway as a unit and
/// written inside a single transaction.
#[derive(Debug, Default)]
pub struct RunBatch {
    pub teams: Vec<Team>,
    pub fixtures: Vec<Fixture>,
    pub finished: Vec<FinishedFixture>,
    pub stats: Vec<TeamRoundStat>,
    pub cards: Vec<PlayerCardStat>,
    pub roster: Vec<RosterDraft>,
    pub lineups: Vec<LineupDraft>,
    /// Set only when the target round's roster/lineup data is in the batch.
    pub advance_checkpoint: Option<u32>,
}

/// Row counts actually written, reported at the end of a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersistSummary {
    pub teams: usize,
    pub fixtures: usize,
    pub finished: usize,
    pub stats: usize,
    pub cards: usize,
    /// Roster rows newly inserted (re-submitted rows are ignored, not counted).
    pub roster_inserted: usize,
    /// Lineup rows newly inserted.
    pub lineups_inserted: usize,
}

/// Surrogate-id lookup row used to materialize lineup references.
#[derive(Debug, sqlx::FromRow)]
pub struct RosterIdRow {
    pub player_id: i64,
    pub team_id: i64,
    pub normalized_name: String,
}
