//! Wire types shared by the leaderboard worker and the web client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LEADERBOARD_PATH: &str = "/api/leaderboard";
pub const SCORE_PATH: &str = "/api/score";

/// Number of entries returned by the leaderboard.
pub const LEADERBOARD_LIMIT: u32 = 10;

/// Longest player name kept, in characters.
pub const MAX_NAME_LEN: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: u32,
    /// RFC 3339 timestamp of the submission.
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub player_name: String,
    pub score: u32,
}

/// A submission that passed [`ScoreSubmission::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSubmission {
    pub player_name: String,
    pub score: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Player name and score are required")]
    MissingName,
    #[error("Malformed score submission: {0}")]
    Malformed(String),
}

impl ScoreSubmission {
    /// Trims the name and cuts it down to [`MAX_NAME_LEN`] characters.
    pub fn validate(self) -> Result<ValidSubmission, SubmissionError> {
        let trimmed = self.player_name.trim();
        if trimmed.is_empty() {
            return Err(SubmissionError::MissingName);
        }

        let player_name: String = trimmed.chars().take(MAX_NAME_LEN).collect();
        Ok(ValidSubmission {
            player_name: player_name.trim_end().to_string(),
            score: self.score,
        })
    }

    pub fn parse(body: &str) -> Result<ValidSubmission, SubmissionError> {
        serde_json::from_str::<ScoreSubmission>(body)
            .map_err(|err| SubmissionError::Malformed(err.to_string()))?
            .validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// How a failed leaderboard call should be presented.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    #[error("Leaderboard is warming up, try again in a moment")]
    WarmingUp,
    #[error("{0}")]
    Rejected(String),
    #[error("Leaderboard unavailable: {0}")]
    Failed(String),
}

impl ApiFailure {
    pub const SERVICE_UNAVAILABLE: u16 = 503;
    pub const BAD_REQUEST: u16 = 400;

    /// Classifies a non-success HTTP status, using the server's error message when it sent one.
    pub fn from_status(status: u16, body: Option<ErrorBody>) -> Self {
        let message = body.map(|body| body.error);
        match status {
            Self::SERVICE_UNAVAILABLE => Self::WarmingUp,
            Self::BAD_REQUEST => Self::Rejected(
                message.unwrap_or_else(|| SubmissionError::MissingName.to_string()),
            ),
            _ => Self::Failed(message.unwrap_or_else(|| format!("HTTP {status}"))),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}
