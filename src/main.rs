mod config;
mod db;
mod error;
mod resolve;
mod roster;
mod rounds;
mod sources;
mod stats;
mod sync;
mod types;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::Gateway;
use crate::error::Result;
use crate::sync::SyncRunner;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Run aborted: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.db_path))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    let runner = SyncRunner::new(cfg, Gateway::new(pool));
    let report = runner.run().await?;

    info!(
        target_round = report.decision.target_round,
        state = %report.decision.target_state,
        teams = report.summary.teams,
        fixtures = report.summary.fixtures,
        finished = report.summary.finished,
        stats = report.summary.stats,
        cards = report.summary.cards,
        roster_inserted = report.summary.roster_inserted,
        lineups_inserted = report.summary.lineups_inserted,
        skipped_fixtures = report.skipped_fixtures,
        resolution_misses = report.resolution_misses,
        "sync complete"
    );
    Ok(())
}
