//! Third-party scores site: team identities (crest + abbreviated name),
//! aggregate card/corner stats, and per-team squad photo listings.

use serde_json::Value;

use crate::config::Config;
use crate::resolve::normalize_player_name;
use crate::sources::{get_json, string_field, value_as_f64, SourceError, SourceResult};

/// Squad page slugs per canonical short club name. Same maintenance status as
/// the alias tables: a slug change upstream is a data change here.
pub const SQUAD_SLUGS: &[(&str, &str)] = &[
    ("Atlético-MG", "atletico-mineiro-1209"),
    ("Bahia", "bahia-1767"),
    ("Botafogo", "botafogo-1211"),
    ("Ceará", "ceara-1781"),
    ("Corinthians", "corinthians-1267"),
    ("Cruzeiro", "cruzeiro-1213"),
    ("Flamengo", "flamengo-1215"),
    ("Fluminense", "fluminense-1216"),
    ("Fortaleza", "fortaleza-1778"),
    ("Grêmio", "gremio-1218"),
    ("Internacional", "sc-internacional-1219"),
    ("Juventude", "juventude-1775"),
    ("Mirassol", "mirassol-1269"),
    ("Palmeiras", "palmeiras-1222"),
    ("RB Bragantino", "red-bull-bragantino-1273"),
    ("Santos", "santos-1224"),
    ("São Paulo", "sao-paulo-1225"),
    ("Sport Recife", "sport-recife-1226"),
    ("Vasco da Gama", "vasco-da-gama-1227"),
    ("Vitória", "vitoria-1228"),
];

#[derive(Debug, Clone)]
pub struct RawTeamIdentity {
    /// The site's own spelling, resolved through the third-party alias table.
    pub name: String,
    pub short_name: String,
    pub crest_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTeamAggregate {
    pub avg_corners: f64,
    pub total_yellow: i64,
    pub total_red: i64,
}

#[derive(Debug, Clone)]
pub struct RawSquadPhoto {
    pub normalized_name: String,
    pub photo_url: String,
}

/// Standings widget of the third-party site: names, abbreviations and crests.
pub async fn fetch_team_identities(
    client: &reqwest::Client,
    cfg: &Config,
) -> SourceResult<Vec<RawTeamIdentity>> {
    let url = format!("{}/league/brasileirao-serie-a-113/standings", cfg.third_party_url);
    let body = get_json(client, &url).await?;

    let rows = body
        .get("competitors")
        .and_then(|c| c.as_array())
        .ok_or_else(|| SourceError::Structural("identities: missing 'competitors' array".into()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(name) = string_field(row, "name") else {
            continue;
        };
        let short_name = string_field(row, "shortName").unwrap_or_else(|| name.clone());
        out.push(RawTeamIdentity {
            name,
            short_name,
            crest_url: string_field(row, "logoUrl"),
        });
    }
    Ok(out)
}

/// Aggregate per-team stats: corners per game, yellow and red card totals.
/// Returns `(team_name, aggregate)` pairs in the site's own spelling.
pub async fn fetch_team_aggregates(
    client: &reqwest::Client,
    cfg: &Config,
) -> SourceResult<Vec<(String, RawTeamAggregate)>> {
    let url = format!("{}/league/brasileirao-serie-a-113/stats", cfg.third_party_url);
    let body = get_json(client, &url).await?;

    let tables = body
        .get("stats")
        .and_then(|s| s.as_array())
        .ok_or_else(|| SourceError::Structural("aggregates: missing 'stats' array".into()))?;

    let mut out: Vec<(String, RawTeamAggregate)> = Vec::new();
    for table in tables {
        let Some(title) = table.get("title").and_then(|t| t.as_str()) else {
            continue;
        };
        let Some(rows) = table.get("rows").and_then(|r| r.as_array()) else {
            continue;
        };
        for row in rows {
            let (Some(name), Some(value)) =
                (string_field(row, "name"), row.get("value").and_then(value_as_f64))
            else {
                continue;
            };
            let idx = match out.iter().position(|(n, _)| *n == name) {
                Some(i) => i,
                None => {
                    out.push((name, RawTeamAggregate::default()));
                    out.len() - 1
                }
            };
            let entry = &mut out[idx].1;
            match title {
                "Escanteios por jogo" => entry.avg_corners = value,
                "Cartões Amarelos" => entry.total_yellow = value as i64,
                "Cartões Vermelhos" => entry.total_red = value as i64,
                _ => {}
            }
        }
    }
    Ok(out)
}

/// One team's squad listing: player names (already normalized) with photo URLs,
/// in page order — the order ties break on during fallback matching.
pub async fn fetch_squad_photos(
    client: &reqwest::Client,
    cfg: &Config,
    slug: &str,
) -> SourceResult<Vec<RawSquadPhoto>> {
    let url = format!("{}/team/{}/squad", cfg.third_party_url, slug);
    let body = get_json(client, &url).await?;

    let rows = body
        .get("athletes")
        .and_then(|a| a.as_array())
        .ok_or_else(|| SourceError::Structural(format!("squad {slug}: missing 'athletes' array")))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(name), Some(photo_url)) =
            (string_field(row, "name"), string_field(row, "imageUrl"))
        else {
            continue;
        };
        out.push(RawSquadPhoto {
            normalized_name: normalize_player_name(&name),
            photo_url,
        });
    }
    Ok(out)
}

pub fn squad_slug(short_name: &str) -> Option<&'static str> {
    SQUAD_SLUGS
        .iter()
        .find(|(name, _)| *name == short_name)
        .map(|(_, slug)| *slug)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_club_has_a_squad_slug() {
        use crate::resolve::aliases::OFFICIAL_LONG_TO_SHORT;
        for (_, short) in OFFICIAL_LONG_TO_SHORT {
            assert!(squad_slug(short).is_some(), "no squad slug for {short}");
        }
    }
}
