//! Official competition API: per-round fixture lists, finished-fixture flags
//! and the penalty feed the discipline ledger is built from.

use serde_json::Value;

use crate::config::Config;
use crate::sources::{get_json, string_field, value_as_i64, SourceError, SourceResult};
use crate::stats::CardKind;

/// One fixture side as the API reports it, before identity resolution.
#[derive(Debug, Clone)]
pub struct RawSide {
    pub team_id: i64,
    pub name: String,
    pub crest_url: Option<String>,
    pub goals: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawFixture {
    pub fixture_id: i64,
    pub round: u32,
    pub date: Option<String>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub home: RawSide,
    pub away: RawSide,
    /// True once the match-report document list is non-empty.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct RawCardEvent {
    pub player_ref: i64,
    pub team_id: i64,
    pub display_name: String,
    pub kind: CardKind,
}

#[derive(Debug, Default)]
pub struct RoundPayload {
    pub round: u32,
    pub fixtures: Vec<RawFixture>,
    pub cards: Vec<RawCardEvent>,
}

/// Fetches one round's fixture groups from the official API.
pub async fn fetch_round(
    client: &reqwest::Client,
    cfg: &Config,
    round: u32,
) -> SourceResult<RoundPayload> {
    let url = format!(
        "{}?path=/jogos/campeonato/{}/rodada/{}/fase",
        cfg.official_api_url, cfg.competition_id, round
    );
    let body = get_json(client, &url).await?;

    let groups = body
        .get("jogos")
        .and_then(|g| g.as_array())
        .ok_or_else(|| SourceError::Structural(format!("round {round}: missing 'jogos' array")))?;

    let mut payload = RoundPayload { round, ..Default::default() };
    for group in groups {
        let Some(games) = group.get("jogo").and_then(|j| j.as_array()) else {
            continue;
        };
        for game in games {
            let Some(fixture) = parse_fixture(game, round) else {
                continue;
            };
            collect_cards(game, &mut payload.cards);
            payload.fixtures.push(fixture);
        }
    }
    Ok(payload)
}

fn parse_fixture(game: &Value, round: u32) -> Option<RawFixture> {
    let fixture_id = game.get("id_jogo").and_then(value_as_i64)?;
    let home = parse_side(game.get("mandante")?)?;
    let away = parse_side(game.get("visitante")?)?;

    let finished = game
        .get("documentos")
        .and_then(|d| d.as_array())
        .is_some_and(|docs| !docs.is_empty());

    Some(RawFixture {
        fixture_id,
        round,
        date: string_field(game, "data"),
        time: string_field(game, "hora"),
        venue: string_field(game, "local"),
        home,
        away,
        finished,
    })
}

fn parse_side(side: &Value) -> Option<RawSide> {
    Some(RawSide {
        team_id: side.get("id").and_then(value_as_i64)?,
        name: string_field(side, "nome")?,
        crest_url: string_field(side, "url_escudo"),
        goals: side
            .get("gols")
            .and_then(|g| match g {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
    })
}

/// Card events ride on each game as penalty records of kind PENALIDADE.
fn collect_cards(game: &Value, out: &mut Vec<RawCardEvent>) {
    let Some(penalties) = game.get("penalidades").and_then(|p| p.as_array()) else {
        return;
    };
    for penalty in penalties {
        if penalty.get("tipo").and_then(|t| t.as_str()) != Some("PENALIDADE") {
            continue;
        }
        // Entries without a shirt number are staff, not athletes.
        if penalty.get("atleta_camisa").map_or(true, Value::is_null) {
            continue;
        }
        let (Some(player_ref), Some(team_id), Some(display_name), Some(kind)) = (
            penalty.get("atleta_id").and_then(value_as_i64).filter(|id| *id != 0),
            penalty.get("clube_id").and_then(value_as_i64).filter(|id| *id != 0),
            string_field(penalty, "atleta_apelido"),
            penalty
                .get("resultado")
                .and_then(|r| r.as_str())
                .and_then(CardKind::from_wire),
        ) else {
            continue;
        };
        out.push(RawCardEvent { player_ref, team_id, display_name, kind });
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
    fn parses_fixture_with_report_as_finished() {
        let game = json!({
            "id_jogo": 5511,
            "data": "2025-05-04",
            "hora": "16:00",
            "local": "Maracanã",
            "mandante": {"id": 1, "nome": "Flamengo", "url_escudo": "http://c/1.png", "gols": "2"},
            "visitante": {"id": 2, "nome": "Bahia", "url_escudo": "http://c/2.png", "gols": 0},
            "documentos": [{"tipo": "sumula"}],
        });
        let fixture = parse_fixture(&game, 7).unwrap();
        assert!(fixture.finished);
        assert_eq!(fixture.fixture_id, 5511);
        assert_eq!(fixture.round, 7);
        assert_eq!(fixture.home.name, "Flamengo");
        assert_eq!(fixture.home.goals.as_deref(), Some("2"));
        assert_eq!(fixture.away.goals.as_deref(), Some("0"));
    }

    #[test]
    fn fixture_without_documents_is_pending() {
        let game = json!({
            "id_jogo": 5512,
            "mandante": {"id": 1, "nome": "Flamengo"},
            "visitante": {"id": 2, "nome": "Bahia"},
            "documentos": [],
        });
        assert!(!parse_fixture(&game, 7).unwrap().finished);
    }

    #[test]
    fn fixture_without_id_is_skipped() {
        let game = json!({
            "mandante": {"id": 1, "nome": "Flamengo"},
            "visitante": {"id": 2, "nome": "Bahia"},
        });
        assert!(parse_fixture(&game, 7).is_none());
    }

    #[test]
    fn card_events_filter_staff_and_unknown_kinds() {
        let game = json!({
            "penalidades": [
                {"tipo": "PENALIDADE", "atleta_camisa": 10, "atleta_id": 71, "clube_id": 1,
                 "atleta_apelido": "Bruno", "resultado": "AMARELO"},
                // Staff member: no shirt number.
                {"tipo": "PENALIDADE", "atleta_camisa": null, "atleta_id": 72, "clube_id": 1,
                 "atleta_apelido": "Treinador", "resultado": "VERMELHO"},
                {"tipo": "ADVERTENCIA", "atleta_camisa": 9, "atleta_id": 73, "clube_id": 1,
                 "atleta_apelido": "Cafu", "resultado": "AMARELO"},
                {"tipo": "PENALIDADE", "atleta_camisa": 5, "atleta_id": 74, "clube_id": 2,
                 "atleta_apelido": "Marcos", "resultado": "VERMELHO2AMARELO"},
            ],
        });
        let mut cards = Vec::new();
        collect_cards(&game, &mut cards);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].player_ref, 71);
        assert_eq!(cards[0].kind, CardKind::Yellow);
        assert_eq!(cards[1].kind, CardKind::SecondYellowRed);
    }
}
