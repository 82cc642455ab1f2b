//! Official site standings: position, points, matches played and recent form
//! per team, keyed by the site's short club spelling.

use serde_json::Value;

use crate::config::Config;
use crate::sources::{get_json, string_field, value_as_i64, SourceError, SourceResult};

#[derive(Debug, Clone)]
pub struct RawStandingRow {
    pub team_name: String,
    pub position: u32,
    pub points: i32,
    pub matches_played: u32,
    /// W/D/L sequence, most recent last.
    pub recent_form: String,
}

pub async fn fetch_standings(
    client: &reqwest::Client,
    cfg: &Config,
) -> SourceResult<Vec<RawStandingRow>> {
    let url = format!(
        "{}/tabelas/campeonato-brasileiro/serie-a/{}",
        cfg.official_site_url, cfg.season_year
    );
    let body = get_json(client, &url).await?;

    let rows = body
        .get("classificacao")
        .and_then(|c| c.as_array())
        .ok_or_else(|| SourceError::Structural("standings: missing 'classificacao' array".into()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(parsed) = parse_row(row) {
            out.push(parsed);
        }
    }
    Ok(out)
}

fn parse_row(row: &Value) -> Option<RawStandingRow> {
    Some(RawStandingRow {
        team_name: string_field(row, "nome")?,
        position: row.get("posicao").and_then(value_as_i64)? as u32,
        points: row.get("pontos").and_then(value_as_i64)? as i32,
        matches_played: row.get("jogos").and_then(value_as_i64)? as u32,
        recent_form: row
            .get("ultimos_jogos")
            .and_then(|f| f.as_array())
            .map(|tokens| tokens.iter().filter_map(form_letter).collect())
            .unwrap_or_default(),
    })
}

/// The site encodes form as v/e/d tokens (vitória/empate/derrota).
fn form_letter(token: &Value) -> Option<char> {
    match token.as_str()?.to_lowercase().as_str() {
        "v" => Some('W'),
        "e" => Some('D'),
        "d" => Some('L'),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_row_and_maps_form_tokens() {
        let row = json!({
            "nome": "Flamengo",
            "posicao": 1,
            "pontos": "24",
            "jogos": 11,
            "ultimos_jogos": ["v", "v", "e", "d", "v"],
        });
        let parsed = parse_row(&row).unwrap();
        assert_eq!(parsed.team_name, "Flamengo");
        assert_eq!(parsed.position, 1);
        assert_eq!(parsed.points, 24);
        assert_eq!(parsed.matches_played, 11);
        assert_eq!(parsed.recent_form, "WWDLW");
    }

    #[test]
    fn row_missing_points_is_skipped() {
        let row = json!({"nome": "Flamengo", "posicao": 1, "jogos": 11});
        assert!(parse_row(&row).is_none());
    }

    #[test]
    fn unknown_form_tokens_are_dropped() {
        let row = json!({
            "nome": "Bahia",
            "posicao": 8,
            "pontos": 15,
            "jogos": 11,
            "ultimos_jogos": ["v", "?", "d"],
        });
        assert_eq!(parse_row(&row).unwrap().recent_form, "WL");
    }
}
