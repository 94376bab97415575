use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use twofold_protocol::{LEADERBOARD_LIMIT, LeaderboardEntry, ValidSubmission};
use wasm_bindgen::JsValue;
use worker::{D1Database, Date, Env};

use crate::error::LeaderboardError;

/// Name of the D1 binding in `wrangler.toml`.
pub const DATABASE_BINDING: &str = "DB";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS leaderboard (id INTEGER PRIMARY KEY AUTOINCREMENT, player_name TEXT NOT NULL, score INTEGER NOT NULL, created_at TEXT NOT NULL)";
const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_score ON leaderboard(score DESC)";
const SELECT_TOP: &str = "SELECT player_name, score, created_at FROM leaderboard ORDER BY score DESC, id ASC LIMIT ?1";
const INSERT_SCORE: &str =
    "INSERT INTO leaderboard (player_name, score, created_at) VALUES (?1, ?2, ?3)";

static SCHEMA_READY: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Deserialize)]
struct LeaderboardRow {
    player_name: String,
    score: u32,
    created_at: String,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            player_name: row.player_name,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

pub struct Leaderboard {
    db: D1Database,
}

impl Leaderboard {
    pub async fn open(env: &Env) -> Result<Self, LeaderboardError> {
        let db = env
            .d1(DATABASE_BINDING)
            .map_err(LeaderboardError::from_database)?;
        let leaderboard = Self { db };
        leaderboard.ensure_schema().await?;
        Ok(leaderboard)
    }

    /// Creates the table on first use in this isolate; migrations normally did it already.
    async fn ensure_schema(&self) -> Result<(), LeaderboardError> {
        if SCHEMA_READY.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.db
            .batch(vec![self.db.prepare(CREATE_TABLE), self.db.prepare(CREATE_INDEX)])
            .await
            .map_err(LeaderboardError::from_database)?;
        SCHEMA_READY.store(true, Ordering::Relaxed);
        log::info!("leaderboard schema ready");
        Ok(())
    }

    pub async fn top(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let rows = self
            .db
            .prepare(SELECT_TOP)
            .bind(&[JsValue::from(LEADERBOARD_LIMIT)])
            .map_err(LeaderboardError::from_database)?
            .all()
            .await
            .map_err(LeaderboardError::from_database)?
            .results::<LeaderboardRow>()
            .map_err(LeaderboardError::from_database)?;
        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }

    pub async fn insert(&self, submission: ValidSubmission) -> Result<(), LeaderboardError> {
        let created_at = format_timestamp(Date::now().as_millis()).ok_or_else(|| {
            LeaderboardError::Database("clock out of range".to_string())
        })?;
        self.db
            .prepare(INSERT_SCORE)
            .bind(&[
                JsValue::from(submission.player_name.as_str()),
                JsValue::from(submission.score),
                JsValue::from(created_at.as_str()),
            ])
            .map_err(LeaderboardError::from_database)?
            .run()
            .await
            .map_err(LeaderboardError::from_database)?;
        log::debug!(
            "recorded {} for {}",
            submission.score,
            submission.player_name
        );
        Ok(())
    }
}

/// RFC 3339 rendering of a unix time in milliseconds.
pub fn format_timestamp(millis: u64) -> Option<String> {
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
