use crate::error::{Result, SyncError};

pub const OFFICIAL_API_URL: &str = "https://www.cbf.com.br/api/proxy";
pub const OFFICIAL_SITE_URL: &str = "https://www.cbf.com.br/futebol-brasileiro";
pub const THIRD_PARTY_URL: &str = "https://data.365scores.com/pt-br/football";

/// Per-request timeout for every source fetch.
pub const FETCH_TIMEOUT_SECS: u64 = 20;

/// Delay before the single retry after an HTTP 429.
pub const RATE_LIMIT_RETRY_SECS: u64 = 10;

/// A run aborts when more than this fraction of official rounds fails to fetch.
pub const MAX_FAILED_ROUND_FRACTION: f64 = 0.25;

/// Checkpoint key in sync_status.
pub const CHECKPOINT_KEY: &str = "last_processed_round";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub official_api_url: String,
    pub official_site_url: String,
    pub third_party_url: String,
    /// Competition id on the official API (COMPETITION_ID)
    pub competition_id: u32,
    /// Season year used in official site URLs (SEASON_YEAR)
    pub season_year: u32,
    /// Rounds in the season calendar (TOTAL_ROUNDS)
    pub total_rounds: u32,
    /// Known league size — fewer resolved teams/standings than this aborts the run
    pub league_size: usize,
    /// Concurrent per-round fixture fetches (ROUND_FETCH_CONCURRENCY)
    pub round_fetch_concurrency: usize,
    /// Concurrent per-fixture lineup fetches (LINEUP_FETCH_CONCURRENCY)
    pub lineup_fetch_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "brasileirao.db".to_string()),
            official_api_url: std::env::var("OFFICIAL_API_URL")
                .unwrap_or_else(|_| OFFICIAL_API_URL.to_string()),
            official_site_url: std::env::var("OFFICIAL_SITE_URL")
                .unwrap_or_else(|_| OFFICIAL_SITE_URL.to_string()),
            third_party_url: std::env::var("THIRD_PARTY_URL")
                .unwrap_or_else(|_| THIRD_PARTY_URL.to_string()),
            competition_id: std::env::var("COMPETITION_ID")
                .unwrap_or_else(|_| "12606".to_string())
                .parse::<u32>()
                .map_err(|_| SyncError::Config("COMPETITION_ID must be an integer".to_string()))?,
            season_year: std::env::var("SEASON_YEAR")
                .unwrap_or_else(|_| "2025".to_string())
                .parse::<u32>()
                .map_err(|_| SyncError::Config("SEASON_YEAR must be a year".to_string()))?,
            total_rounds: std::env::var("TOTAL_ROUNDS")
                .unwrap_or_else(|_| "38".to_string())
                .parse::<u32>()
                .map_err(|_| SyncError::Config("TOTAL_ROUNDS must be an integer".to_string()))?,
            league_size: std::env::var("LEAGUE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<usize>()
                .unwrap_or(20),
            round_fetch_concurrency: std::env::var("ROUND_FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<usize>()
                .unwrap_or(4),
            lineup_fetch_concurrency: std::env::var("LINEUP_FETCH_CONCURRENCY")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<usize>()
                .unwrap_or(3),
        })
    }

    /// Rounds allowed to fail fetching before the run is considered invalid.
    pub fn max_failed_rounds(&self) -> usize {
        (self.total_rounds as f64 * MAX_FAILED_ROUND_FRACTION).floor() as usize
    }
}
