//! Source adapters for Okapiq.
//!
//! One adapter per external listing provider (Google Places, Yelp, SerpApi,
//! Apollo) plus the Census demographics client. Each adapter owns its HTTP
//! client, auth, and timeout, maps provider shapes into
//! [`okapiq_core::RawListing`] at a strict serde boundary, and surfaces
//! provider failures as [`SourceError`] for the orchestrator to downgrade to
//! partial-scan conditions.

pub mod adapter;
pub mod error;

mod apollo;
mod census;
mod google;
mod serp;
mod yelp;

pub use adapter::SourceAdapter;
pub use apollo::ApolloAdapter;
pub use census::CensusClient;
pub use error::SourceError;
pub use google::GooglePlacesAdapter;
pub use serp::SerpAdapter;
pub use yelp::YelpAdapter;

use std::sync::Arc;

use okapiq_core::ProviderKeys;

/// Builds the adapter set for the providers that have keys configured.
///
/// Adapters without keys are skipped (logged at startup); the Census client
/// is returned separately because it is a collaborator, not a listing source.
///
/// # Errors
///
/// Returns [`SourceError`] if any configured adapter's HTTP client cannot be
/// constructed.
pub fn build_adapters(
    keys: &ProviderKeys,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<(Vec<Arc<dyn SourceAdapter>>, Option<CensusClient>), SourceError> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if let Some(key) = &keys.google_maps {
        adapters.push(Arc::new(GooglePlacesAdapter::new(key, timeout_secs, user_agent)?));
    }
    if let Some(key) = &keys.yelp {
        adapters.push(Arc::new(YelpAdapter::new(key, timeout_secs, user_agent)?));
    }
    if let Some(key) = &keys.serp {
        adapters.push(Arc::new(SerpAdapter::new(key, timeout_secs, user_agent)?));
    }
    if let Some(key) = &keys.apollo {
        adapters.push(Arc::new(ApolloAdapter::new(key, timeout_secs, user_agent)?));
    }

    let census = match &keys.census {
        Some(key) => Some(CensusClient::new(key, timeout_secs, user_agent)?),
        None => None,
    };

    for adapter in &adapters {
        tracing::info!(source = %adapter.source(), "source adapter configured");
    }

    Ok((adapters, census))
}
