//! Joins the official standings snapshot with third-party aggregate stats and
//! accumulates the per-player discipline ledger from the official penalty feed.

use std::collections::HashMap;

use crate::types::{PlayerCardStat, TeamRoundStat};

/// One standings row from the official site, already resolved to a team id.
#[derive(Debug, Clone)]
pub struct StandingRow {
    pub team_id: i64,
    pub position: u32,
    pub points: i32,
    pub matches_played: u32,
    pub recent_form: String,
}

/// Aggregate card/corner numbers from the third-party site, resolved to a team id.
#[derive(Debug, Clone, Default)]
pub struct TeamAggregate {
    pub avg_corners: f64,
    pub total_yellow: i64,
    pub total_red: i64,
}

/// Average per match rounded to two decimals; zero matches yields zero.
pub fn avg_per_match(total: i64, matches_played: u32) -> f64 {
    if matches_played == 0 {
        return 0.0;
    }
    (total as f64 / f64::from(matches_played) * 100.0).round() / 100.0
}

/// Builds the per-team snapshot. Teams absent from the third-party aggregates
/// keep their official fields and default the derived ones to zero; the run
/// never fails over a missing aggregate.
pub fn merge_team_stats(
    standings: &[StandingRow],
    aggregates: &HashMap<i64, TeamAggregate>,
) -> Vec<TeamRoundStat> {
    standings
        .iter()
        .map(|row| {
            let agg = aggregates.get(&row.team_id).cloned().unwrap_or_default();
            TeamRoundStat {
                team_id: row.team_id,
                standing_position: row.position,
                points: row.points,
                recent_form: row.recent_form.clone(),
                avg_yellow_cards: avg_per_match(agg.total_yellow, row.matches_played),
                total_red_cards: agg.total_red,
                avg_corners: agg.avg_corners,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Card ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Yellow,
    Red,
    /// Second yellow in the same match: counts one yellow and one red.
    SecondYellowRed,
}

impl CardKind {
    /// Wire values emitted by the official penalty feed.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "AMARELO" => Some(CardKind::Yellow),
            "VERMELHO" => Some(CardKind::Red),
            "VERMELHO2AMARELO" => Some(CardKind::SecondYellowRed),
            _ => None,
        }
    }
}

/// Accumulates card events per player across rounds. Every third accumulated
/// yellow marks the suspension round; any red marks the last-red round.
#[derive(Debug, Default)]
pub struct CardLedger {
    players: HashMap<i64, PlayerCardStat>,
}

impl CardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, player_ref: i64, display_name: &str, team_id: i64, kind: CardKind, round: u32) {
        let entry = self.players.entry(player_ref).or_insert_with(|| PlayerCardStat {
            player_ref,
            display_name: display_name.to_string(),
            team_id,
            yellow_cards: 0,
            red_cards: 0,
            last_red_round: 0,
            yellow_suspension_round: 0,
        });

        match kind {
            CardKind::Yellow => entry.yellow_cards += 1,
            CardKind::Red => {
                entry.red_cards += 1;
                entry.last_red_round = round;
            }
            CardKind::SecondYellowRed => {
                entry.yellow_cards += 1;
                entry.red_cards += 1;
                entry.last_red_round = round;
            }
        }
        if matches!(kind, CardKind::Yellow | CardKind::SecondYellowRed)
            && entry.yellow_cards > 0
            && entry.yellow_cards % 3 == 0
        {
            entry.yellow_suspension_round = round;
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Drains into a batch sorted by player_ref.
    pub fn finish(self) -> Vec<PlayerCardStat> {
        let mut out: Vec<PlayerCardStat> = self.players.into_values().collect();
        out.sort_by_key(|p| p.player_ref);
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(team_id: i64, position: u32, matches_played: u32) -> StandingRow {
        StandingRow {
            team_id,
            position,
            points: 3 * position as i32,
            matches_played,
            recent_form: "WWDLW".to_string(),
        }
    }

    #[test]
    fn zero_matches_yields_zero_average() {
        assert_eq!(avg_per_match(7, 0), 0.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(avg_per_match(10, 3), 3.33);
        assert_eq!(avg_per_match(25, 10), 2.5);
    }

    #[test]
    fn missing_aggregate_defaults_to_zero_without_failing() {
        let standings = vec![standing(1, 1, 12), standing(2, 2, 12)];
        let mut aggregates = HashMap::new();
        aggregates.insert(
            1,
            TeamAggregate { avg_corners: 5.4, total_yellow: 30, total_red: 2 },
        );

        let merged = merge_team_stats(&standings, &aggregates);
        assert_eq!(merged.len(), 2);

        let with = merged.iter().find(|s| s.team_id == 1).unwrap();
        assert_eq!(with.avg_yellow_cards, 2.5);
        assert_eq!(with.total_red_cards, 2);
        assert_eq!(with.avg_corners, 5.4);

        let without = merged.iter().find(|s| s.team_id == 2).unwrap();
        assert_eq!(without.avg_yellow_cards, 0.0);
        assert_eq!(without.total_red_cards, 0);
        assert_eq!(without.avg_corners, 0.0);
        assert_eq!(without.standing_position, 2);
        assert_eq!(without.recent_form, "WWDLW");
    }

    #[test]
    fn third_yellow_marks_suspension_round() {
        let mut ledger = CardLedger::new();
        ledger.apply(77, "Bruno Silva", 1, CardKind::Yellow, 2);
        ledger.apply(77, "Bruno Silva", 1, CardKind::Yellow, 5);
        assert_eq!(ledger.finish()[0].yellow_suspension_round, 0);

        let mut ledger = CardLedger::new();
        ledger.apply(77, "Bruno Silva", 1, CardKind::Yellow, 2);
        ledger.apply(77, "Bruno Silva", 1, CardKind::Yellow, 5);
        ledger.apply(77, "Bruno Silva", 1, CardKind::Yellow, 9);
        let stats = ledger.finish();
        assert_eq!(stats[0].yellow_cards, 3);
        assert_eq!(stats[0].yellow_suspension_round, 9);
    }

    #[test]
    fn second_yellow_red_counts_both_cards() {
        let mut ledger = CardLedger::new();
        ledger.apply(9, "Cafu", 3, CardKind::Yellow, 1);
        ledger.apply(9, "Cafu", 3, CardKind::Yellow, 4);
        ledger.apply(9, "Cafu", 3, CardKind::SecondYellowRed, 7);
        let stats = ledger.finish();
        assert_eq!(stats[0].yellow_cards, 3);
        assert_eq!(stats[0].red_cards, 1);
        assert_eq!(stats[0].last_red_round, 7);
        assert_eq!(stats[0].yellow_suspension_round, 7);
    }

    #[test]
    fn straight_red_tracks_round() {
        let mut ledger = CardLedger::new();
        ledger.apply(4, "Marcos", 2, CardKind::Red, 12);
        let stats = ledger.finish();
        assert_eq!(stats[0].red_cards, 1);
        assert_eq!(stats[0].last_red_round, 12);
        assert_eq!(stats[0].yellow_cards, 0);
    }

    #[test]
    fn unknown_wire_value_is_rejected() {
        assert_eq!(CardKind::from_wire("ADVERTENCIA"), None);
        assert_eq!(CardKind::from_wire("AMARELO"), Some(CardKind::Yellow));
    }
}
