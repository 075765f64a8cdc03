//! Yelp Fusion search adapter (`/v3/businesses/search`, Bearer auth).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use okapiq_core::{RawListing, SearchQuery, SourceId};

use crate::adapter::{drop_malformed, SourceAdapter};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.yelp.com/";
const YELP_MAX_LIMIT: usize = 50;
/// Largest search radius Yelp accepts, in meters.
const YELP_MAX_RADIUS_METERS: u64 = 40_000;

/// Yelp takes the radius in whole meters, capped at its documented maximum.
fn radius_meters(radius_miles: f64) -> u64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let meters = (radius_miles.max(0.0) * 1_609.34).round() as u64;
    meters.min(YELP_MAX_RADIUS_METERS)
}

pub struct YelpAdapter {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Vec<YelpBusiness>,
}

#[derive(Debug, Deserialize)]
struct YelpBusiness {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    phone: Option<String>,
    url: Option<String>,
    rating: Option<f64>,
    review_count: Option<u32>,
    #[serde(default)]
    is_closed: bool,
    location: Option<YelpLocation>,
    coordinates: Option<YelpCoordinates>,
    #[serde(default)]
    categories: Vec<YelpCategory>,
}

#[derive(Debug, Deserialize)]
struct YelpLocation {
    #[serde(default)]
    display_address: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct YelpCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YelpCategory {
    title: Option<String>,
}

impl YelpAdapter {
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
                source_id: SourceId::Yelp,
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
            .join("v3/businesses/search")
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(industry) = &query.industry {
                pairs.append_pair("term", industry);
            }
            pairs
                .append_pair("location", &query.location)
                .append_pair("radius", &radius_meters(query.radius_miles).to_string())
                .append_pair("limit", &query.limit.min(YELP_MAX_LIMIT).to_string())
                .append_pair("sort_by", "best_match");
        }
        Ok(url)
    }

    fn map_business(biz: YelpBusiness) -> RawListing {
        let address_text = biz
            .location
            .as_ref()
            .map(|l| l.display_address.join(", "))
            .filter(|s| !s.is_empty());
        let (lat, lng) = biz
            .coordinates
            .as_ref()
            .map_or((None, None), |c| (c.latitude, c.longitude));
        let category = biz.categories.first().and_then(|c| c.title.clone());

        let raw_payload = serde_json::json!({ "id": biz.id, "url": biz.url });

        RawListing {
            source: SourceId::Yelp,
            external_ref: biz.id,
            name: biz.name,
            address_text,
            // Yelp sends "" for unknown phones; keep absent as absent.
            phone: biz.phone.filter(|p| !p.is_empty()),
            website: biz.url,
            email: None,
            rating: biz.rating,
            review_count: biz.review_count,
            category,
            lat,
            lng,
            raw_payload,
        }
    }
}

#[async_trait]
impl SourceAdapter for YelpAdapter {
    fn source(&self) -> SourceId {
        SourceId::Yelp
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, SourceError> {
        let url = self.search_url(query)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Yelp, e))?
            .error_for_status()
            .map_err(|e| SourceError::from_http(SourceId::Yelp, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Yelp, e))?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "yelp businesses/search".to_owned(),
                source: e,
            })?;

        let listings = parsed
            .businesses
            .into_iter()
            .filter(|b| !b.is_closed)
            .map(Self::map_business)
            .collect();

        Ok(drop_malformed(listings))
    }
}
