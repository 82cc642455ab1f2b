//! Consolidates per-fixture lineup sightings into one master roster record per
//! (team, player) and one lineup record per (fixture, team, player).
//!
//! The same player routinely appears in several widgets of the same page —
//! probable starters, bench list, unavailable list — with conflicting detail.
//! Merging is monotone: a STARTER sighting upgrades the record and pins the
//! pitch coordinates; later bench/unavailable sightings never downgrade it.

use std::collections::HashMap;

use crate::resolve::matcher::LeaguePhotos;
use crate::resolve::normalize_player_name;
use crate::types::{LineupDraft, Position, Role, RosterDraft, RosterKey};

/// One observation of a player in a fixture's lineup source.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub fixture_id: i64,
    pub team_id: i64,
    pub role: Role,
    pub display_name: String,
    pub shirt_number: Option<String>,
    pub position_label: Option<String>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
pub struct Consolidator {
    roster: HashMap<RosterKey, RosterDraft>,
    lineups: HashMap<(i64, RosterKey), LineupDraft>,
    /// Keys in first-sighting order, for deterministic output.
    roster_order: Vec<RosterKey>,
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests one sighting, creating or upgrading the roster and lineup
    /// records it touches. Photos come from the league photo index via the
    /// tiered fallback matcher.
    pub fn ingest(&mut self, sighting: &Sighting, photos: &LeaguePhotos) {
        let key = RosterKey {
            team_id: sighting.team_id,
            normalized_name: normalize_player_name(&sighting.display_name),
        };

        match self.roster.get_mut(&key) {
            Some(entry) => merge_sighting(entry, sighting),
            None => {
                let photo_url = photos
                    .lookup(key.team_id, &key.normalized_name)
                    .map(str::to_string);
                self.roster.insert(key.clone(), new_roster_draft(&key, sighting, photo_url));
                self.roster_order.push(key.clone());
            }
        }

        let lineup_key = (sighting.fixture_id, key.clone());
        match self.lineups.get_mut(&lineup_key) {
            Some(entry) => merge_lineup(entry, sighting),
            None => {
                self.lineups.insert(lineup_key, new_lineup_draft(key, sighting));
            }
        }
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    pub fn lineup_len(&self) -> usize {
        self.lineups.len()
    }

    /// Finalizes into roster drafts (first-sighting order) and lineup drafts
    /// (sorted by fixture, team, player for stable batches).
    pub fn finish(self) -> (Vec<RosterDraft>, Vec<LineupDraft>) {
        let mut by_key = self.roster;
        let roster = self
            .roster_order
            .iter()
            .filter_map(|key| by_key.remove(key))
            .collect();

        let mut lineups: Vec<LineupDraft> = self.lineups.into_values().collect();
        lineups.sort_by(|a, b| {
            (a.fixture_id, a.key.team_id, &a.key.normalized_name)
                .cmp(&(b.fixture_id, b.key.team_id, &b.key.normalized_name))
        });
        (roster, lineups)
    }
}

fn new_roster_draft(key: &RosterKey, s: &Sighting, photo_url: Option<String>) -> RosterDraft {
    RosterDraft {
        key: key.clone(),
        display_name: s.display_name.trim().to_string(),
        shirt_number: s.shirt_number.clone(),
        position: s
            .position_label
            .as_deref()
            .map(Position::from_label)
            .unwrap_or(Position::Unknown),
        photo_url,
    }
}

/// Applies one sighting to an existing roster record. Upgrades only:
/// position fills in when UNKNOWN, shirt number when absent.
pub fn merge_sighting(entry: &mut RosterDraft, s: &Sighting) {
    if entry.position == Position::Unknown {
        if let Some(label) = s.position_label.as_deref() {
            entry.position = Position::from_label(label);
        }
    }
    if entry.shirt_number.is_none() {
        entry.shirt_number = s.shirt_number.clone();
    }
}

fn new_lineup_draft(key: RosterKey, s: &Sighting) -> LineupDraft {
    LineupDraft {
        fixture_id: s.fixture_id,
        key,
        role: s.role,
        pos_x: if s.role == Role::Starter { s.pos_x } else { None },
        pos_y: if s.role == Role::Starter { s.pos_y } else { None },
        reason: if s.role == Role::Unavailable { s.reason.clone() } else { None },
    }
}

/// Applies one sighting to an existing lineup record. A STARTER sighting
/// overwrites the role and (re)populates the pitch coordinates; bench and
/// unavailable sightings never change what was already recorded.
pub fn merge_lineup(entry: &mut LineupDraft, s: &Sighting) {
    if s.role == Role::Starter {
        entry.role = Role::Starter;
        entry.pos_x = s.pos_x;
        entry.pos_y = s.pos_y;
        entry.reason = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
