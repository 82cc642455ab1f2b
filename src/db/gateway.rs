//! Idempotent persistence of the run batch.
//!
//! Replace-by-primary-key for teams, fixtures, stats, cards, finished fixtures
//! and the checkpoint; insert-or-ignore for roster and lineup rows so a
//! retried run can never duplicate them or churn surrogate ids. The whole
//! batch executes inside one transaction: a mid-run crash leaves the previous
//! run's committed state intact.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;
use tracing::info;

use crate::config::CHECKPOINT_KEY;
use crate::db::models::{PersistSummary, RosterIdRow, RunBatch};
use crate::error::{Result, SyncError};
use crate::types::RosterKey;

pub struct Gateway {
    pool: SqlitePool,
}

impl Gateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Last successfully processed round; 0 when never recorded.
    pub async fn read_checkpoint(&self) -> Result<u32> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM sync_status WHERE key = ?")
                .bind(CHECKPOINT_KEY)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.unwrap_or(0).max(0) as u32)
    }

    /// Commits the whole batch atomically. Rejects it up front when any record
    /// references a team id missing from the batch's team set — that is an
    /// unresolved-identity bug upstream, not something to paper over.
    pub async fn persist_run(&self, batch: &RunBatch) -> Result<PersistSummary> {
        verify_integrity(batch)?;

        let mut summary = PersistSummary::default();
        let mut tx = self.pool.begin().await?;

        // Plain upsert rather than OR REPLACE: REPLACE deletes the conflicting
        // row first, which trips the foreign keys pointing at teams.
        for team in &batch.teams {
            sqlx::query(
                r#"
                INSERT INTO teams (team_id, canonical_name, short_name, crest_url)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(team_id) DO UPDATE SET
                    canonical_name = excluded.canonical_name,
                    short_name = excluded.short_name,
                    crest_url = excluded.crest_url
                "#,
            )
            .bind(team.team_id)
            .bind(&team.canonical_name)
            .bind(&team.short_name)
            .bind(&team.crest_url)
            .execute(&mut *tx)
            .await?;
            summary.teams += 1;
        }

        // Official fields are overwritten each run; formations survive a NULL
        // resubmission so a later-round run never erases earlier lineup data.
        for fixture in &batch.fixtures {
            sqlx::query(
                r#"
                INSERT INTO fixtures (
                    fixture_id, round, kickoff_date, kickoff_time, venue,
                    home_team_id, away_team_id, home_goals, away_goals,
                    home_formation, away_formation
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(fixture_id) DO UPDATE SET
                    round = excluded.round,
                    kickoff_date = excluded.kickoff_date,
                    kickoff_time = excluded.kickoff_time,
                    venue = excluded.venue,
                    home_team_id = excluded.home_team_id,
                    away_team_id = excluded.away_team_id,
                    home_goals = excluded.home_goals,
                    away_goals = excluded.away_goals,
                    home_formation = COALESCE(excluded.home_formation, fixtures.home_formation),
                    away_formation = COALESCE(excluded.away_formation, fixtures.away_formation)
                "#,
            )
            .bind(fixture.fixture_id)
            .bind(fixture.round as i64)
            .bind(&fixture.kickoff_date)
            .bind(&fixture.kickoff_time)
            .bind(&fixture.venue)
            .bind(fixture.home_team_id)
            .bind(fixture.away_team_id)
            .bind(&fixture.home_goals)
            .bind(&fixture.away_goals)
            .bind(&fixture.home_formation)
            .bind(&fixture.away_formation)
            .execute(&mut *tx)
            .await?;
            summary.fixtures += 1;
        }

        for finished in &batch.finished {
            sqlx::query("INSERT OR REPLACE INTO finished_fixtures (fixture_id, round) VALUES (?, ?)")
                .bind(finished.fixture_id)
                .bind(finished.round as i64)
                .execute(&mut *tx)
                .await?;
            summary.finished += 1;
        }

        for stat in &batch.stats {
            sqlx::query(
                r#"
                INSERT INTO team_round_stats (
                    team_id, standing_position, points, recent_form,
                    avg_yellow_cards, total_red_cards, avg_corners
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(team_id) DO UPDATE SET
                    standing_position = excluded.standing_position,
                    points = excluded.points,
                    recent_form = excluded.recent_form,
                    avg_yellow_cards = excluded.avg_yellow_cards,
                    total_red_cards = excluded.total_red_cards,
                    avg_corners = excluded.avg_corners
                "#,
            )
            .bind(stat.team_id)
            .bind(stat.standing_position as i64)
            .bind(stat.points)
            .bind(&stat.recent_form)
            .bind(stat.avg_yellow_cards)
            .bind(stat.total_red_cards)
            .bind(stat.avg_corners)
            .execute(&mut *tx)
            .await?;
            summary.stats += 1;
        }

        for card in &batch.cards {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO player_cards (
                    player_ref, display_name, team_id, yellow_cards, red_cards,
                    last_red_round, yellow_suspension_round
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(card.player_ref)
            .bind(&card.display_name)
            .bind(card.team_id)
            .bind(card.yellow_cards)
            .bind(card.red_cards)
            .bind(card.last_red_round as i64)
            .bind(card.yellow_suspension_round as i64)
            .execute(&mut *tx)
            .await?;
            summary.cards += 1;
        }

        // Roster: insert-or-ignore keeps the first-assigned player_id stable,
        // then a non-downgrading pass fills photo/position gaps left by
        // earlier runs.
        for draft in &batch.roster {
            let res = sqlx::query(
                r#"
                INSERT OR IGNORE INTO roster (
                    team_id, display_name, normalized_name, shirt_number, position, photo_url
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(draft.key.team_id)
            .bind(&draft.display_name)
            .bind(&draft.key.normalized_name)
            .bind(&draft.shirt_number)
            .bind(draft.position.to_string())
            .bind(&draft.photo_url)
            .execute(&mut *tx)
            .await?;
            summary.roster_inserted += res.rows_affected() as usize;

            sqlx::query(
                r#"
                UPDATE roster SET
                    photo_url = CASE
                        WHEN (photo_url IS NULL OR photo_url = '') THEN COALESCE(?, photo_url)
                        ELSE photo_url
                    END,
                    position = CASE WHEN position = 'UNKNOWN' THEN ? ELSE position END
                WHERE team_id = ? AND normalized_name = ?
                "#,
            )
            .bind(&draft.photo_url)
            .bind(draft.position.to_string())
            .bind(draft.key.team_id)
            .bind(&draft.key.normalized_name)
            .execute(&mut *tx)
            .await?;
        }

        // Resolve surrogate ids for every roster key the lineup rows reference.
        let mut id_map: HashMap<RosterKey, i64> = HashMap::with_capacity(batch.roster.len());
        for draft in &batch.roster {
            let row: RosterIdRow = sqlx::query_as(
                "SELECT player_id, team_id, normalized_name FROM roster WHERE team_id = ? AND normalized_name = ?",
            )
            .bind(draft.key.team_id)
            .bind(&draft.key.normalized_name)
            .fetch_one(&mut *tx)
            .await?;
            id_map.insert(
                RosterKey { team_id: row.team_id, normalized_name: row.normalized_name },
                row.player_id,
            );
        }

        for lineup in &batch.lineups {
            let Some(player_id) = id_map.get(&lineup.key) else {
                return Err(SyncError::Integrity(format!(
                    "lineup for fixture {} references unknown roster key ({}, {})",
                    lineup.fixture_id, lineup.key.team_id, lineup.key.normalized_name
                )));
            };
            let res = sqlx::query(
                r#"
                INSERT OR IGNORE INTO lineups (
                    fixture_id, team_id, player_id, role, pos_x, pos_y, reason
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(lineup.fixture_id)
            .bind(lineup.key.team_id)
            .bind(player_id)
            .bind(lineup.role.to_string())
            .bind(lineup.pos_x)
            .bind(lineup.pos_y)
            .bind(&lineup.reason)
            .execute(&mut *tx)
            .await?;
            summary.lineups_inserted += res.rows_affected() as usize;
        }

        if let Some(round) = batch.advance_checkpoint {
            sqlx::query("INSERT OR REPLACE INTO sync_status (key, value) VALUES (?, ?)")
                .bind(CHECKPOINT_KEY)
                .bind(round as i64)
                .execute(&mut *tx)
                .await?;
            info!(round, "checkpoint advanced");
        }

        tx.commit().await?;
        Ok(summary)
    }
}

/// Every team reference in the batch must point at a team in the batch.
/// A violation is an upstream resolution bug and fails the whole batch.
fn verify_integrity(batch: &RunBatch) -> Result<()> {
    let team_ids: HashSet<i64> = batch.teams.iter().map(|t| t.team_id).collect();

    for fixture in &batch.fixtures {
        for side in [fixture.home_team_id, fixture.away_team_id] {
            if !team_ids.contains(&side) {
                return Err(SyncError::Integrity(format!(
                    "fixture {} references unknown team {side}",
                    fixture.fixture_id
                )));
            }
        }
    }
    for draft in &batch.roster {
        if !team_ids.contains(&draft.key.team_id) {
            return Err(SyncError::Integrity(format!(
                "roster entry '{}' references unknown team {}",
                draft.display_name, draft.key.team_id
            )));
        }
    }
    for lineup in &batch.lineups {
        if !team_ids.contains(&lineup.key.team_id) {
            return Err(SyncError::Integrity(format!(
                "lineup for fixture {} references unknown team {}",
                lineup.fixture_id, lineup.key.team_id
            )));
        }
    }
    for stat in &batch.stats {
        if !team_ids.contains(&stat.team_id) {
            return Err(SyncError::Integrity(format!(
                "round stats reference unknown team {}",
                stat.team_id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        FinishedFixture, Fixture, LineupDraft, Position, Role, RosterDraft, Team,
    };
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn team(team_id: i64) -> Team {
        Team {
            team_id,
            canonical_name: format!("Team {team_id}"),
            short_name: None,
            crest_url: None,
        }
    }

    fn fixture(id: i64, round: u32, home: i64, away: i64) -> Fixture {
        Fixture {
            fixture_id: id,
            round,
            kickoff_date: Some("2025-05-04".to_string()),
            kickoff_time: Some("16:00".to_string()),
            venue: Some("Arena".to_string()),
            home_team_id: home,
            away_team_id: away,
            home_goals: None,
            away_goals: None,
            home_formation: None,
            away_formation: None,
        }
    }

    fn roster_draft(team_id: i64, name: &str) -> RosterDraft {
        RosterDraft {
            key: RosterKey { team_id, normalized_name: name.to_lowercase() },
            display_name: name.to_string(),
            shirt_number: Some("10".to_string()),
            position: Position::Mf,
            photo_url: None,
        }
    }

    fn lineup_draft(fixture_id: i64, team_id: i64, name: &str) -> LineupDraft {
        LineupDraft {
            fixture_id,
            key: RosterKey { team_id, normalized_name: name.to_lowercase() },
            role: Role::Starter,
            pos_x: Some(40.0),
            pos_y: Some(60.0),
            reason: None,
        }
    }

    fn base_batch() -> RunBatch {
        RunBatch {
            teams: vec![team(1), team(2)],
            fixtures: vec![fixture(900, 1, 1, 2)],
            finished: vec![FinishedFixture { fixture_id: 900, round: 1 }],
            roster: vec![roster_draft(1, "Bruno"), roster_draft(2, "Marcos")],
            lineups: vec![lineup_draft(900, 1, "Bruno"), lineup_draft(900, 2, "Marcos")],
            advance_checkpoint: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resubmitting_identical_batch_changes_nothing() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        let batch = base_batch();
        let first = gateway.persist_run(&batch).await.unwrap();
        assert_eq!(first.roster_inserted, 2);
        assert_eq!(first.lineups_inserted, 2);

        let second = gateway.persist_run(&batch).await.unwrap();
        assert_eq!(second.roster_inserted, 0);
        assert_eq!(second.lineups_inserted, 0);

        let lineup_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lineups")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(lineup_count, 2);
        let roster_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roster")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(roster_count, 2);
    }

    #[tokio::test]
    async fn roster_keeps_original_player_id_on_resubmission() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        gateway.persist_run(&base_batch()).await.unwrap();
        let id_before: i64 =
            sqlx::query_scalar("SELECT player_id FROM roster WHERE team_id = 1 AND normalized_name = 'bruno'")
                .fetch_one(&pool)
                .await
                .unwrap();

        gateway.persist_run(&base_batch()).await.unwrap();
        let id_after: i64 =
            sqlx::query_scalar("SELECT player_id FROM roster WHERE team_id = 1 AND normalized_name = 'bruno'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(id_before, id_after);
    }

    #[tokio::test]
    async fn photo_fills_in_later_but_never_downgrades() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        gateway.persist_run(&base_batch()).await.unwrap();

        let mut upgraded = base_batch();
        upgraded.roster[0].photo_url = Some("http://p/bruno.png".to_string());
        gateway.persist_run(&upgraded).await.unwrap();

        let photo: Option<String> =
            sqlx::query_scalar("SELECT photo_url FROM roster WHERE team_id = 1 AND normalized_name = 'bruno'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(photo.as_deref(), Some("http://p/bruno.png"));

        // A later run without a photo must not clear the stored one.
        gateway.persist_run(&base_batch()).await.unwrap();
        let photo: Option<String> =
            sqlx::query_scalar("SELECT photo_url FROM roster WHERE team_id = 1 AND normalized_name = 'bruno'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(photo.as_deref(), Some("http://p/bruno.png"));
    }

    #[tokio::test]
    async fn formation_survives_null_resubmission() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        let mut with_formation = base_batch();
        with_formation.fixtures[0].home_formation = Some("4-3-3".to_string());
        gateway.persist_run(&with_formation).await.unwrap();

        let mut without = base_batch();
        without.fixtures[0].home_goals = Some("2".to_string());
        gateway.persist_run(&without).await.unwrap();

        let (formation, goals): (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT home_formation, home_goals FROM fixtures WHERE fixture_id = 900",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(formation.as_deref(), Some("4-3-3"));
        assert_eq!(goals.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn batch_with_unknown_team_is_rejected() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        let mut batch = base_batch();
        batch.fixtures.push(fixture(901, 1, 1, 99));
        let err = gateway.persist_run(&batch).await.unwrap_err();
        assert!(matches!(err, SyncError::Integrity(_)));

        // Rejected before anything was written.
        let team_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(team_count, 0);
    }

    #[tokio::test]
    async fn checkpoint_reads_back_after_advance() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());
        assert_eq!(gateway.read_checkpoint().await.unwrap(), 0);

        gateway.persist_run(&base_batch()).await.unwrap();
        assert_eq!(gateway.read_checkpoint().await.unwrap(), 1);

        let mut batch = base_batch();
        batch.advance_checkpoint = Some(2);
        gateway.persist_run(&batch).await.unwrap();
        assert_eq!(gateway.read_checkpoint().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn batch_without_checkpoint_leaves_it_untouched() {
        let pool = test_pool().await;
        let gateway = Gateway::new(pool.clone());

        gateway.persist_run(&base_batch()).await.unwrap();
        let mut batch = base_batch();
        batch.advance_checkpoint = None;
        gateway.persist_run(&batch).await.unwrap();
        assert_eq!(gateway.read_checkpoint().await.unwrap(), 1);
    }
}
