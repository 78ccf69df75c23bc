use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Transport,
}

/// Failure reported by an entity fetch.
///
/// Both variants are recovered the same way by the flow controllers; the
/// distinction only survives into logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no pokemon found for '{key}'")]
    NotFound { key: String },
    #[error("pokemon fetch failed: {message}")]
    Transport { message: String },
}

impl FetchError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Transport { .. } => ErrorCode::Transport,
        }
    }
}
