//! Error types for focus-insights
//!
//! The aggregation modules never fail; these cover the edges around them:
//! parsing caller input, session bookkeeping, and the feedback collaborator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// UTC offset string that is not `Z`, `±HH`, `±HHMM` or `±HH:MM`
    #[error("invalid UTC offset: {0}")]
    InvalidOffset(String),

    /// Stop requested for a user with no recorded study session
    #[error("no study session recorded for user {0}")]
    NoSession(i64),

    /// Feedback generator answered but the answer was unusable
    #[error("feedback error: {0}")]
    Feedback(String),

    /// Transport failure talking to the feedback generator
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
