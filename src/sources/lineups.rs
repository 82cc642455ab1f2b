//! Per-fixture probable lineups from the third-party site.
//!
//! A lineup may simply not exist yet for an upcoming fixture; that is a normal
//! `Ok(None)`, distinct from transport failures and from payloads whose shape
//! is unrecognizable.

use serde_json::Value;

use crate::config::Config;
use crate::sources::{get_json, string_field, value_as_f64, SourceResult};
use crate::types::Role;

#[derive(Debug, Clone)]
pub struct RawLineupPlayer {
    pub name: String,
    pub shirt_number: Option<String>,
    pub position_label: Option<String>,
    /// Pitch coordinates as percentages; starters only.
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    /// Suspenso / Lesionado / Indisponível; unavailable players only.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTeamLineup {
    pub formation: Option<String>,
    pub starters: Vec<RawLineupPlayer>,
    pub bench: Vec<RawLineupPlayer>,
    pub unavailable: Vec<RawLineupPlayer>,
}

impl RawTeamLineup {
    pub fn is_empty(&self) -> bool {
        self.starters.is_empty() && self.bench.is_empty() && self.unavailable.is_empty()
    }

    /// Iterates `(role, player)` across the three widget lists.
    pub fn players(&self) -> impl Iterator<Item = (Role, &RawLineupPlayer)> {
        self.starters
            .iter()
            .map(|p| (Role::Starter, p))
            .chain(self.bench.iter().map(|p| (Role::Substitute, p)))
            .chain(self.unavailable.iter().map(|p| (Role::Unavailable, p)))
    }
}

#[derive(Debug, Clone)]
pub struct RawFixtureLineups {
    pub home: RawTeamLineup,
    pub away: RawTeamLineup,
}

/// Fetches the probable lineups for one fixture, `Ok(None)` when the source
/// has not published them yet.
pub async fn fetch_fixture_lineups(
    client: &reqwest::Client,
    cfg: &Config,
    home_slug: &str,
    away_slug: &str,
) -> SourceResult<Option<RawFixtureLineups>> {
    let url = format!(
        "{}/match/{}-vs-{}/lineups",
        cfg.third_party_url, home_slug, away_slug
    );
    let body = get_json(client, &url).await?;

    if body.get("lineups").map_or(true, Value::is_null) {
        return Ok(None);
    }

    let home = parse_team_lineup(body.pointer("/lineups/home"));
    let away = parse_team_lineup(body.pointer("/lineups/away"));
    if home.is_empty() && away.is_empty() {
        return Ok(None);
    }
    Ok(Some(RawFixtureLineups { home, away }))
}

fn parse_team_lineup(v: Option<&Value>) -> RawTeamLineup {
    let Some(v) = v else {
        return RawTeamLineup::default();
    };
    RawTeamLineup {
        formation: string_field(v, "formation"),
        starters: parse_players(v.get("starters"), true),
        bench: parse_players(v.get("bench"), false),
        unavailable: parse_players(v.get("unavailable"), false),
    }
}

fn parse_players(list: Option<&Value>, with_coordinates: bool) -> Vec<RawLineupPlayer> {
    let Some(items) = list.and_then(|l| l.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = string_field(item, "name")?;
            Some(RawLineupPlayer {
                name,
                shirt_number: string_field(item, "number"),
                position_label: string_field(item, "position"),
                pos_x: if with_coordinates {
                    item.get("posX").and_then(value_as_f64)
                } else {
                    None
                },
                pos_y: if with_coordinates {
                    item.get("posY").and_then(value_as_f64)
                } else {
                    None
                },
                reason: string_field(item, "reason"),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_three_widget_lists() {
        let v = json!({
            "formation": "4-2-3-1",
            "starters": [
                {"name": "Rossi", "number": "1", "position": "Goleiro", "posX": 50.0, "posY": 4.2},
            ],
            "bench": [
                {"name": "Matheus Cunha", "number": "25", "position": "Goleiro"},
            ],
            "unavailable": [
                {"name": "Pedro", "position": "Atacante", "reason": "Lesionado"},
            ],
        });
        let lineup = parse_team_lineup(Some(&v));
        assert_eq!(lineup.formation.as_deref(), Some("4-2-3-1"));
        assert_eq!(lineup.starters.len(), 1);
        assert_eq!(lineup.starters[0].pos_x, Some(50.0));
        assert_eq!(lineup.bench.len(), 1);
        assert_eq!(lineup.bench[0].pos_x, None);
        assert_eq!(lineup.unavailable[0].reason.as_deref(), Some("Lesionado"));

        let roles: Vec<Role> = lineup.players().map(|(r, _)| r).collect();
        assert_eq!(roles, vec![Role::Starter, Role::Substitute, Role::Unavailable]);
    }

    #[test]
    fn missing_side_is_empty() {
        assert!(parse_team_lineup(None).is_empty());
    }
}
