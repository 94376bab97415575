use thiserror::Error;
use twofold_protocol::{ErrorBody, SubmissionError};
use worker::{Cors, Response};

/// Substrings of D1 errors that clear up on retry.
const TRANSIENT_MARKERS: &[&str] = &[
    "network connection lost",
    "transient",
    "overloaded",
    "timed out",
    "timeout",
    "unavailable",
    "starting up",
    "object to be reset",
];

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error(transparent)]
    Invalid(#[from] SubmissionError),
    #[error("Database temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("Database failure: {0}")]
    Database(String),
}

impl LeaderboardError {
    pub fn from_database(err: worker::Error) -> Self {
        let message = err.to_string();
        if is_transient(&message) {
            Self::Unavailable(message)
        } else {
            Self::Database(message)
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Invalid(_) => 400,
            Self::Unavailable(_) => 503,
            Self::Database(_) => 500,
        }
    }

    /// Message sent to the client; database details stay in the log.
    pub fn public_message(&self, failure: &str) -> String {
        match self {
            Self::Invalid(err) => err.to_string(),
            Self::Unavailable(_) => "Leaderboard is warming up, please retry".to_string(),
            Self::Database(_) => failure.to_string(),
        }
    }

    pub fn into_response(self, failure: &str, cors: &Cors) -> worker::Result<Response> {
        match &self {
            Self::Invalid(_) => log::info!("rejected submission: {}", self),
            _ => log::error!("{}: {}", failure, self),
        }
        let body = ErrorBody {
            error: self.public_message(failure),
        };
        Response::from_json(&body)?
            .with_status(self.status())
            .with_cors(cors)
    }
}

pub fn is_transient(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
