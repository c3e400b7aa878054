//! Error types for craft_sync

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by callers that only care which job stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The market API could not be reached or rejected the request
    Fetch,
    /// Payload, database or snapshot file problem
    Data,
    /// Trade count refresh aborted
    Refresh,
}

/// Unified error type for craft_sync operations
#[derive(Debug, Error)]
pub enum CraftError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("API call failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Market API answered with a non-success status
    #[error("API call failed with {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Market payload did not have the expected structure
    #[error("Malformed market payload for code {code}: {source}")]
    MalformedPayload {
        code: u32,
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File could not be read or written
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot or seed document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Craft item id missing from a snapshot
    #[error("Craft item not found in snapshot: {0}")]
    ItemNotFound(i64),

    /// A bearer token required by the requested job is not configured
    #[error("Missing API token: {0}")]
    MissingToken(&'static str),

    /// Trade count refresh stopped at the given market id
    #[error("Trade count refresh failed at market id {market_id}: {source}")]
    Refresh {
        market_id: i64,
        #[source]
        source: Box<CraftError>,
    },
}

impl CraftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CraftError::Network(_) | CraftError::Api { .. } => ErrorKind::Fetch,
            CraftError::Refresh { .. } => ErrorKind::Refresh,
            _ => ErrorKind::Data,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CraftError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for craft_sync operations
pub type Result<T> = std::result::Result<T, CraftError>;
