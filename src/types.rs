use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// One real-world club. `team_id` comes from the official API and is immutable;
/// the name/crest fields are overwritten whenever a richer source is merged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub canonical_name: String,
    pub short_name: Option<String>,
    pub crest_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub fixture_id: i64,
    pub round: u32,
    pub kickoff_date: Option<String>,
    pub kickoff_time: Option<String>,
    pub venue: Option<String>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_goals: Option<String>,
    pub away_goals: Option<String>,
    /// Filled in only once lineup data for the fixture is available.
    pub home_formation: Option<String>,
    pub away_formation: Option<String>,
}

/// A fixture with a post-match report. Append-only set; drives round completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinishedFixture {
    pub fixture_id: i64,
    pub round: u32,
}

// ---------------------------------------------------------------------------
// Roster & lineups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Unknown,
    Gk,
    Df,
    Mf,
    Fw,
}

impl Position {
    /// Maps a source position label (Portuguese) to the canonical enum.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        if l.starts_with("goleiro") {
            Position::Gk
        } else if l.starts_with("zagueiro") || l.starts_with("lateral") || l.starts_with("defensor")
        {
            Position::Df
        } else if l.starts_with("meia") || l.starts_with("meio") || l.starts_with("volante") {
            Position::Mf
        } else if l.starts_with("atacante") || l.starts_with("ponta") || l.starts_with("centroavante")
        {
            Position::Fw
        } else {
            Position::Unknown
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Position::Unknown => "UNKNOWN",
            Position::Gk => "GK",
            Position::Df => "DF",
            Position::Mf => "MF",
            Position::Fw => "FW",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Starter,
    Substitute,
    Unavailable,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Starter => "STARTER",
            Role::Substitute => "SUBSTITUTE",
            Role::Unavailable => "UNAVAILABLE",
        };
        write!(f, "{s}")
    }
}

/// Key of a roster entry before an id exists. Ids are assigned by the
/// persistence layer's insert-or-ignore path, never in memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RosterKey {
    pub team_id: i64,
    pub normalized_name: String,
}

/// Consolidated master record for one (team, player) pair.
#[derive(Debug, Clone)]
pub struct RosterDraft {
    pub key: RosterKey,
    pub display_name: String,
    pub shirt_number: Option<String>,
    pub position: Position,
    pub photo_url: Option<String>,
}

/// Consolidated sighting record for one (fixture, team, player).
#[derive(Debug, Clone)]
pub struct LineupDraft {
    pub fixture_id: i64,
    pub key: RosterKey,
    pub role: Role,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Point-in-time standings snapshot per team, overwritten each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoundStat {
    pub team_id: i64,
    pub standing_position: u32,
    pub points: i32,
    /// Fixed-length W/D/L sequence, most recent last.
    pub recent_form: String,
    pub avg_yellow_cards: f64,
    pub total_red_cards: i64,
    pub avg_corners: f64,
}

/// Per-player discipline ledger from the official penalty feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCardStat {
    pub player_ref: i64,
    pub display_name: String,
    pub team_id: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub last_red_round: u32,
    pub yellow_suspension_round: u32,
}
