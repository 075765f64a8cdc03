//! The seam between the orchestrator and concrete providers.

use async_trait::async_trait;

use okapiq_core::{RawListing, SearchQuery, SourceId};

use crate::error::SourceError;

/// One external listing provider.
///
/// Contract: empty results are `Ok(vec![])`, never an error. Provider-side
/// failures (network, rate limit, non-2xx, timeout) surface as
/// [`SourceError`]; the orchestrator downgrades these to partial failures.
/// Implementations map provider shapes into [`RawListing`] and leave any
/// field they cannot populate as `None` — no fabricated data.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> SourceId;

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, SourceError>;
}

/// Drops listings that cannot be deduplicated meaningfully (no usable name).
///
/// Shared post-filter applied by every adapter before returning.
pub(crate) fn drop_malformed(mut listings: Vec<RawListing>) -> Vec<RawListing> {
    let before = listings.len();
    listings.retain(|l| !l.name.trim().is_empty());
    let dropped = before - listings.len();
    if dropped > 0 {
        tracing::debug!(dropped, "dropped listings without a usable name");
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(name: &str) -> RawListing {
        RawListing {
            source: SourceId::Serp,
            external_ref: "r1".to_owned(),
            name: name.to_owned(),
            address_text: None,
            phone: None,
            website: None,
            email: None,
            rating: None,
            review_count: None,
            category: None,
            lat: None,
            lng: None,
            raw_payload: json!({}),
        }
    }

    #[test]
    fn drop_malformed_removes_unnamed_listings() {
        let kept = drop_malformed(vec![listing("Acme"), listing(""), listing("   ")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Acme");
    }
}
