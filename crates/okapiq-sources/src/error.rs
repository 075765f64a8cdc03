use thiserror::Error;

use okapiq_core::SourceId;

/// Per-adapter failure condition. The orchestrator treats any variant as a
/// recoverable "source unavailable" and continues the scan without that
/// provider's contribution.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error from {source_id}: {source}")]
    Http {
        source_id: SourceId,
        #[source]
        source: reqwest::Error,
    },

    #[error("deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {source_id}")]
    RateLimited { source_id: SourceId },

    #[error("unexpected HTTP status {status} from {source_id}")]
    UnexpectedStatus { source_id: SourceId, status: u16 },

    #[error("{source_id} API error: {message}")]
    Api {
        source_id: SourceId,
        message: String,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl SourceError {
    /// Wraps a `reqwest` error, classifying 429 as [`SourceError::RateLimited`].
    #[must_use]
    pub fn from_http(source_id: SourceId, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) if status.as_u16() == 429 => SourceError::RateLimited { source_id },
            Some(status) => SourceError::UnexpectedStatus {
                source_id,
                status: status.as_u16(),
            },
            None => SourceError::Http { source_id, source: error },
        }
    }
}
