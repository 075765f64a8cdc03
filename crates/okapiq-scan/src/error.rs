//! Scan-level errors.
//!
//! Individual source failures are not errors at this level; they become
//! provenance entries on a partial result, as do sources abandoned at the
//! scan deadline. A scan only fails outright when no source can contribute
//! or the request itself is invalid.

use okapiq_core::SourceId;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Every configured source failed or timed out.
    #[error("all sources unavailable: {failed:?}")]
    AllSourcesUnavailable { failed: Vec<SourceId> },

    /// No listing adapters are configured (no provider keys present).
    #[error("no source adapters configured")]
    NoSourcesConfigured,

    #[error("invalid scan request: {reason}")]
    InvalidRequest { reason: String },
}
