use std::path::PathBuf;

use daybook_core::GoalId;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("bad {field} in {table}: {message}")]
    Decode {
        table: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unknown goal {0}")]
    UnknownGoal(GoalId),

    #[error("goal {goal} has no week {week}")]
    UnknownWeek { goal: GoalId, week: u32 },
}

impl StoreError {
    pub(crate) fn decode(
        table: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        StoreError::Decode {
            table,
            field,
            message: message.into(),
        }
    }
}
