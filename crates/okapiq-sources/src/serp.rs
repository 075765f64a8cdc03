//! SerpApi `google_local` engine adapter (search-engine-results source).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use okapiq_core::{RawListing, SearchQuery, SourceId};

use crate::adapter::{drop_malformed, SourceAdapter};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://serpapi.com/";
const SERP_MAX_RESULTS: usize = 20;

pub struct SerpAdapter {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    local_results: Vec<LocalResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalResult {
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    title: String,
    address: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    rating: Option<f64>,
    reviews: Option<u32>,
    #[serde(rename = "type")]
    result_type: Option<String>,
    gps_coordinates: Option<GpsCoordinates>,
}

#[derive(Debug, Deserialize)]
struct GpsCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl SerpAdapter {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] for an unparseable URL, or
    /// [`SourceError::Http`] if the client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Http {
                source_id: SourceId::Serp,
                source: e,
            })?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SourceError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join("search.json")
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("engine", "google_local")
            .append_pair("q", &query.term())
            .append_pair("location", &query.location)
            .append_pair("hl", "en")
            .append_pair("gl", "us")
            .append_pair("num", &query.limit.min(SERP_MAX_RESULTS).to_string())
            .append_pair("api_key", &self.api_key);
        Ok(url)
    }

    fn map_result(result: LocalResult) -> RawListing {
        let (lat, lng) = result
            .gps_coordinates
            .as_ref()
            .map_or((None, None), |c| (c.latitude, c.longitude));

        // Local results carry no stable id; the rank position is the best
        // available external reference.
        let external_ref = result
            .position
            .map_or_else(|| "unranked".to_owned(), |p| format!("position-{p}"));

        let raw_payload = serde_json::json!({
            "position": result.position,
            "type": result.result_type,
        });

        RawListing {
            source: SourceId::Serp,
            external_ref,
            name: result.title,
            address_text: result.address,
            phone: result.phone,
            website: result.website,
            email: None,
            rating: result.rating,
            review_count: result.reviews,
            category: result.result_type,
            lat,
            lng,
            raw_payload,
        }
    }
}

#[async_trait]
impl SourceAdapter for SerpAdapter {
    fn source(&self) -> SourceId {
        SourceId::Serp
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, SourceError> {
        let url = self.search_url(query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Serp, e))?
            .error_for_status()
            .map_err(|e| SourceError::from_http(SourceId::Serp, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Serp, e))?;
        let parsed: SerpResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "serpapi google_local".to_owned(),
                source: e,
            })?;

        if let Some(message) = parsed.error {
            return Err(SourceError::Api {
                source_id: SourceId::Serp,
                message,
            });
        }

        let listings = parsed
            .local_results
            .into_iter()
            .map(Self::map_result)
            .collect();

        Ok(drop_malformed(listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_uses_google_local_engine() {
        let adapter = SerpAdapter::with_base_url("k", 12, "okapiq-test", "https://example.com")
            .expect("adapter");
        let url = adapter
            .search_url(&SearchQuery {
                location: "Austin".to_owned(),
                industry: Some("electrical".to_owned()),
                radius_miles: 25.0,
                limit: 20,
            })
            .expect("url");
        assert!(url.as_str().contains("engine=google_local"));
        assert!(url.as_str().contains("q=electrical+in+Austin"));
    }

    #[test]
    fn map_result_keeps_contact_fields() {
        let listing = SerpAdapter::map_result(LocalResult {
            position: Some(3),
            title: "Austin Air Systems".to_owned(),
            address: Some("500 Congress Ave, Austin, TX 78701".to_owned()),
            phone: Some("(512) 555-0188".to_owned()),
            website: Some("https://austinair.example.com".to_owned()),
            rating: Some(4.6),
            reviews: Some(212),
            result_type: Some("HVAC contractor".to_owned()),
            gps_coordinates: None,
        });
        assert_eq!(listing.external_ref, "position-3");
        assert_eq!(listing.phone.as_deref(), Some("(512) 555-0188"));
        assert_eq!(listing.website.as_deref(), Some("https://austinair.example.com"));
    }
}
