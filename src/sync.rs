//! One full synchronization run: fetch → resolve → consolidate → persist.
//!
//! Per-fixture and per-team failures are isolated — logged, skipped, retried
//! on a later invocation. Cross-cutting failures (validation thresholds,
//! integrity violations) abort the run before anything is written, leaving the
//! previous committed state and the checkpoint untouched.

use std::collections::HashMap;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Gateway, PersistSummary, RunBatch};
use crate::error::{Result, SyncError};
use crate::resolve::aliases::{lookup, OFFICIAL_LONG_TO_SHORT, SHORT_DISPLAY_NAMES};
use crate::resolve::matcher::LeaguePhotos;
use crate::resolve::{Source, TeamResolver};
use crate::roster::{Consolidator, Sighting};
use crate::rounds::{RoundDecision, RoundTracker};
use crate::sources::official::{RawFixture, RoundPayload};
use crate::sources::third_party::squad_slug;
use crate::sources::{build_client, lineups, official, standings, third_party, SourceError};
use crate::stats::{merge_team_stats, CardLedger, StandingRow, TeamAggregate};
use crate::types::{FinishedFixture, Fixture, Team};

#[derive(Debug)]
pub struct RunReport {
    pub decision: RoundDecision,
    pub summary: PersistSummary,
    pub skipped_fixtures: usize,
    pub resolution_misses: usize,
}

pub struct SyncRunner {
    cfg: Config,
    gateway: Gateway,
}

impl SyncRunner {
    pub fn new(cfg: Config, gateway: Gateway) -> Self {
        Self { cfg, gateway }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let client = build_client()?;

        // --- Official API: every round's fixtures, results and penalties ---
        let payloads = self.fetch_all_rounds(&client).await?;

        let mut fixtures: Vec<Fixture> = Vec::new();
        let mut finished: Vec<FinishedFixture> = Vec::new();
        let mut teams: HashMap<i64, Team> = HashMap::new();
        let mut long_names: Vec<(i64, String)> = Vec::new();
        let mut ledger = CardLedger::new();

        for payload in &payloads {
            for raw in &payload.fixtures {
                register_team(&mut teams, &mut long_names, raw.home.team_id, &raw.home.name, raw.home.crest_url.clone());
                register_team(&mut teams, &mut long_names, raw.away.team_id, &raw.away.name, raw.away.crest_url.clone());
                if raw.finished {
                    finished.push(FinishedFixture { fixture_id: raw.fixture_id, round: raw.round });
                }
                fixtures.push(to_fixture(raw));
            }
            for card in &payload.cards {
                ledger.apply(card.player_ref, &card.display_name, card.team_id, card.kind, payload.round);
            }
        }

        if teams.len() < self.cfg.league_size {
            return Err(SyncError::Validation(format!(
                "official API yielded {} teams, expected at least {}",
                teams.len(),
                self.cfg.league_size
            )));
        }
        info!(
            teams = teams.len(),
            fixtures = fixtures.len(),
            card_players = ledger.len(),
            "official data fetched"
        );

        let resolver = TeamResolver::new(&long_names);
        info!(keys = resolver.len(), "team resolver ready");
        let mut resolution_misses = 0usize;

        // --- Official site standings (fatal below threshold) ---
        let raw_standings = standings::fetch_standings(&client, &self.cfg)
            .await
            .map_err(|e| SyncError::Validation(format!("standings fetch failed: {e}")))?;
        if raw_standings.len() < self.cfg.league_size {
            return Err(SyncError::Validation(format!(
                "standings scrape yielded {} rows, expected at least {}",
                raw_standings.len(),
                self.cfg.league_size
            )));
        }

        let mut standings_rows: Vec<StandingRow> = Vec::new();
        for row in &raw_standings {
            match resolver.resolve(&row.team_name, Source::OfficialSite) {
                Some(team_id) => standings_rows.push(StandingRow {
                    team_id,
                    position: row.position,
                    points: row.points,
                    matches_played: row.matches_played,
                    recent_form: row.recent_form.clone(),
                }),
                None => {
                    resolution_misses += 1;
                    warn!("standings row '{}' did not resolve to a known team", row.team_name);
                }
            }
        }

        // --- Third-party identities and aggregates (tolerated failures) ---
        match third_party::fetch_team_identities(&client, &self.cfg).await {
            Ok(identities) => {
                for identity in identities {
                    match resolver.resolve(&identity.name, Source::ThirdParty) {
                        Some(team_id) => {
                            if let Some(team) = teams.get_mut(&team_id) {
                                team.short_name = Some(identity.short_name);
                                if identity.crest_url.is_some() {
                                    team.crest_url = identity.crest_url;
                                }
                            }
                        }
                        None => {
                            resolution_misses += 1;
                            warn!("identity row '{}' did not resolve to a known team", identity.name);
                        }
                    }
                }
            }
            Err(e) => warn!("team identities unavailable this run: {e}"),
        }

        let mut aggregates: HashMap<i64, TeamAggregate> = HashMap::new();
        match third_party::fetch_team_aggregates(&client, &self.cfg).await {
            Ok(rows) => {
                for (name, agg) in rows {
                    match resolver.resolve(&name, Source::ThirdParty) {
                        Some(team_id) => {
                            aggregates.insert(
                                team_id,
                                TeamAggregate {
                                    avg_corners: agg.avg_corners,
                                    total_yellow: agg.total_yellow,
                                    total_red: agg.total_red,
                                },
                            );
                        }
                        None => {
                            resolution_misses += 1;
                            warn!("aggregate row '{}' did not resolve to a known team", name);
                        }
                    }
                }
            }
            Err(e) => warn!("team aggregates unavailable this run: {e}"),
        }

        let stats = merge_team_stats(&standings_rows, &aggregates);

        // --- Round decision ---
        let checkpoint = self.gateway.read_checkpoint().await?;
        let tracker = RoundTracker::new(self.cfg.total_rounds);
        let decision = tracker.decide(&fixtures, &finished, checkpoint);
        info!(
            current = decision.current_round,
            target = decision.target_round,
            state = %decision.target_state,
            checkpoint,
            "round decision"
        );

        // --- Lineups for the target round ---
        let mut consolidator = Consolidator::new();
        let mut skipped_fixtures = 0usize;
        let process_round = decision.target_round <= self.cfg.total_rounds;
        if process_round {
            let photos = self.fetch_photos(&client, &teams).await;
            skipped_fixtures = self
                .fetch_round_lineups(
                    &client,
                    decision.target_round,
                    &teams,
                    &mut fixtures,
                    &photos,
                    &mut consolidator,
                )
                .await;
        } else {
            info!("season complete, no round left to process");
        }

        info!(
            roster = consolidator.roster_len(),
            lineup_rows = consolidator.lineup_len(),
            "consolidation complete"
        );
        let (roster, lineup_drafts) = consolidator.finish();

        // --- Persist ---
        let mut team_batch: Vec<Team> = teams.into_values().collect();
        team_batch.sort_by_key(|t| t.team_id);

        let batch = RunBatch {
            teams: team_batch,
            fixtures,
            finished,
            stats,
            cards: ledger.finish(),
            roster,
            lineups: lineup_drafts,
            advance_checkpoint: process_round.then_some(decision.target_round),
        };
        let summary = self.gateway.persist_run(&batch).await?;

        Ok(RunReport { decision, summary, skipped_fixtures, resolution_misses })
    }

    /// Fetches every round with bounded concurrency. Individual round failures
    /// are tolerated up to the validation threshold.
    async fn fetch_all_rounds(&self, client: &reqwest::Client) -> Result<Vec<RoundPayload>> {
        let cfg = &self.cfg;
        let results: Vec<(u32, std::result::Result<RoundPayload, SourceError>)> =
            stream::iter(1..=cfg.total_rounds)
                .map(|round| async move {
                    (round, official::fetch_round(client, cfg, round).await)
                })
                .buffer_unordered(cfg.round_fetch_concurrency)
                .collect()
                .await;

        let mut payloads = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (round, result) in results {
            match result {
                Ok(payload) => payloads.push(payload),
                Err(e) => {
                    failed += 1;
                    warn!(round, "round fetch failed: {e}");
                }
            }
        }
        if failed > cfg.max_failed_rounds() {
            return Err(SyncError::Validation(format!(
                "{failed} of {} rounds failed to fetch",
                cfg.total_rounds
            )));
        }
        payloads.sort_by_key(|p| p.round);
        Ok(payloads)
    }

    /// Squad photo indexes for all teams. Photo loss is tolerable: a missing
    /// index only degrades photo binding for that team.
    async fn fetch_photos(&self, client: &reqwest::Client, teams: &HashMap<i64, Team>) -> LeaguePhotos {
        let cfg = &self.cfg;
        let targets: Vec<(i64, &'static str)> = teams
            .values()
            .filter_map(|team| squad_slug(&team.canonical_name).map(|slug| (team.team_id, slug)))
            .collect();

        let results: Vec<(i64, std::result::Result<Vec<third_party::RawSquadPhoto>, SourceError>)> =
            stream::iter(targets)
                .map(|(team_id, slug)| async move {
                    (team_id, third_party::fetch_squad_photos(client, cfg, slug).await)
                })
                .buffer_unordered(cfg.lineup_fetch_concurrency)
                .collect()
                .await;

        let mut photos = LeaguePhotos::default();
        for (team_id, result) in results {
            match result {
                Ok(entries) => {
                    let index = photos.index_mut(team_id);
                    for entry in entries {
                        index.insert(entry.normalized_name, entry.photo_url);
                    }
                }
                Err(e) => warn!(team_id, "squad photos unavailable: {e}"),
            }
        }
        info!(photos = photos.total_entries(), "photo index built");
        photos
    }

    /// Fetches lineups for every fixture of the target round and feeds the
    /// consolidator. Returns how many fixtures were skipped; skipping never
    /// leaves partial rows for a fixture.
    async fn fetch_round_lineups(
        &self,
        client: &reqwest::Client,
        target_round: u32,
        teams: &HashMap<i64, Team>,
        fixtures: &mut [Fixture],
        photos: &LeaguePhotos,
        consolidator: &mut Consolidator,
    ) -> usize {
        let cfg = &self.cfg;
        let mut skipped = 0usize;

        let mut targets: Vec<(i64, i64, i64, &'static str, &'static str)> = Vec::new();
        for fixture in fixtures.iter().filter(|f| f.round == target_round) {
            let slugs = (
                teams.get(&fixture.home_team_id).and_then(|t| squad_slug(&t.canonical_name)),
                teams.get(&fixture.away_team_id).and_then(|t| squad_slug(&t.canonical_name)),
            );
            match slugs {
                (Some(home), Some(away)) => {
                    targets.push((fixture.fixture_id, fixture.home_team_id, fixture.away_team_id, home, away));
                }
                _ => {
                    skipped += 1;
                    warn!(
                        fixture_id = fixture.fixture_id,
                        "no third-party mapping for fixture teams, skipping lineup"
                    );
                }
            }
        }
        info!(round = target_round, fixtures = targets.len(), "fetching lineups");

        let results: Vec<(
            (i64, i64, i64),
            std::result::Result<Option<lineups::RawFixtureLineups>, SourceError>,
        )> = stream::iter(targets)
            .map(|(fixture_id, home_id, away_id, home_slug, away_slug)| async move {
                (
                    (fixture_id, home_id, away_id),
                    lineups::fetch_fixture_lineups(client, cfg, home_slug, away_slug).await,
                )
            })
            .buffer_unordered(cfg.lineup_fetch_concurrency)
            .collect()
            .await;

        for ((fixture_id, home_id, away_id), result) in results {
            match result {
                Ok(Some(fixture_lineups)) => {
                    for (team_id, side) in
                        [(home_id, &fixture_lineups.home), (away_id, &fixture_lineups.away)]
                    {
                        for (role, player) in side.players() {
                            consolidator.ingest(
                                &Sighting {
                                    fixture_id,
                                    team_id,
                                    role,
                                    display_name: player.name.clone(),
                                    shirt_number: player.shirt_number.clone(),
                                    position_label: player.position_label.clone(),
                                    pos_x: player.pos_x,
                                    pos_y: player.pos_y,
                                    reason: player.reason.clone(),
                                },
                                photos,
                            );
                        }
                    }
                    if let Some(fixture) = fixtures.iter_mut().find(|f| f.fixture_id == fixture_id) {
                        fixture.home_formation = fixture_lineups.home.formation.clone();
                        fixture.away_formation = fixture_lineups.away.formation.clone();
                    }
                }
                Ok(None) => {
                    info!(fixture_id, "no lineup published yet");
                }
                Err(e) => {
                    skipped += 1;
                    warn!(fixture_id, "lineup fetch skipped: {e}");
                }
            }
        }
        skipped
    }
}

fn register_team(
    teams: &mut HashMap<i64, Team>,
    long_names: &mut Vec<(i64, String)>,
    team_id: i64,
    long_name: &str,
    crest_url: Option<String>,
) {
    if teams.contains_key(&team_id) {
        return;
    }
    long_names.push((team_id, long_name.to_string()));
    let canonical = lookup(OFFICIAL_LONG_TO_SHORT, long_name).unwrap_or(long_name);
    let short = lookup(SHORT_DISPLAY_NAMES, canonical).unwrap_or(canonical);
    teams.insert(
        team_id,
        Team {
            team_id,
            canonical_name: canonical.to_string(),
            short_name: Some(short.to_string()),
            crest_url,
        },
    );
}

fn to_fixture(raw: &RawFixture) -> Fixture {
    Fixture {
        fixture_id: raw.fixture_id,
        round: raw.round,
        kickoff_date: raw.date.clone(),
        kickoff_time: raw.time.clone(),
        venue: raw.venue.clone(),
        home_team_id: raw.home.team_id,
        away_team_id: raw.away.team_id,
        home_goals: raw.home.goals.clone(),
        away_goals: raw.away.goals.clone(),
        home_formation: None,
        away_formation: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::official::RawSide;

    fn raw_fixture(id: i64, round: u32, home: (i64, &str), away: (i64, &str)) -> RawFixture {
        RawFixture {
            fixture_id: id,
            round,
            date: None,
            time: None,
            venue: None,
            home: RawSide {
                team_id: home.0,
                name: home.1.to_string(),
                crest_url: None,
                goals: None,
            },
            away: RawSide {
                team_id: away.0,
                name: away.1.to_string(),
                crest_url: None,
                goals: None,
            },
            finished: false,
        }
    }

    #[test]
    fn team_registration_applies_canonical_and_display_names() {
        let mut teams = HashMap::new();
        let mut long_names = Vec::new();
        let raw = raw_fixture(1, 1, (10, "Red Bull Bragantino"), (20, "Sport Recife"));
        register_team(&mut teams, &mut long_names, raw.home.team_id, &raw.home.name, None);
        register_team(&mut teams, &mut long_names, raw.away.team_id, &raw.away.name, None);

        assert_eq!(teams[&10].canonical_name, "RB Bragantino");
        assert_eq!(teams[&10].short_name.as_deref(), Some("Bragantino"));
        assert_eq!(teams[&20].canonical_name, "Sport Recife");
        assert_eq!(teams[&20].short_name.as_deref(), Some("Sport-PE"));
    }

    #[test]
    fn duplicate_registration_keeps_first_record() {
        let mut teams = HashMap::new();
        let mut long_names = Vec::new();
        register_team(&mut teams, &mut long_names, 10, "Flamengo", Some("http://a".into()));
        register_team(&mut teams, &mut long_names, 10, "Flamengo", Some("http://b".into()));
        assert_eq!(teams.len(), 1);
        assert_eq!(long_names.len(), 1);
        assert_eq!(teams[&10].crest_url.as_deref(), Some("http://a"));
    }
}
