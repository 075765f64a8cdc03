//! Google Places Text Search adapter.
//!
//! Wraps the `textsearch/json` endpoint. The key travels as a query
//! parameter; results are filtered to operational establishments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use okapiq_core::{RawListing, SearchQuery, SourceId};

use crate::adapter::{drop_malformed, SourceAdapter};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/";

pub struct GooglePlacesAdapter {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<Place>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    name: String,
    #[serde(default)]
    place_id: String,
    formatted_address: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
    geometry: Option<Geometry>,
    business_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GooglePlacesAdapter {
    /// Creates an adapter pointed at the production Places API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (wiremock in tests).
    ///
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
                source_id: SourceId::GooglePlaces,
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
        let mut url =
            self.base_url
                .join("textsearch/json")
                .map_err(|e| SourceError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut()
            .append_pair("query", &query.term())
            .append_pair("key", &self.api_key)
            .append_pair("type", "establishment")
            .append_pair("region", "us");
        Ok(url)
    }

    fn map_place(place: Place) -> RawListing {
        let (lat, lng) = place
            .geometry
            .as_ref()
            .and_then(|g| g.location.as_ref())
            .map_or((None, None), |l| (Some(l.lat), Some(l.lng)));

        let raw_payload = serde_json::json!({
            "place_id": place.place_id,
            "types": place.types,
            "business_status": place.business_status,
        });

        RawListing {
            source: SourceId::GooglePlaces,
            external_ref: place.place_id,
            name: place.name,
            address_text: place.formatted_address,
            phone: None,
            website: None,
            email: None,
            rating: place.rating,
            review_count: place.user_ratings_total,
            category: place.types.first().cloned(),
            lat,
            lng,
            raw_payload,
        }
    }
}

#[async_trait]
impl SourceAdapter for GooglePlacesAdapter {
    fn source(&self) -> SourceId {
        SourceId::GooglePlaces
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, SourceError> {
        let url = self.search_url(query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_http(SourceId::GooglePlaces, e))?
            .error_for_status()
            .map_err(|e| SourceError::from_http(SourceId::GooglePlaces, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_http(SourceId::GooglePlaces, e))?;
        let parsed: TextSearchResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "places textsearch".to_owned(),
                source: e,
            })?;

        // The Places API reports quota/key problems in-band with a 200.
        match parsed.status.as_str() {
            "OK" | "ZERO_RESULTS" | "" => {}
            "OVER_QUERY_LIMIT" => {
                return Err(SourceError::RateLimited {
                    source_id: SourceId::GooglePlaces,
                })
            }
            other => {
                return Err(SourceError::Api {
                    source_id: SourceId::GooglePlaces,
                    message: parsed
                        .error_message
                        .unwrap_or_else(|| other.to_owned()),
                })
            }
        }

        let listings = parsed
            .results
            .into_iter()
            .filter(|p| {
                p.business_status.as_deref().unwrap_or("OPERATIONAL") == "OPERATIONAL"
            })
            .take(query.limit)
            .map(Self::map_place)
            .collect();

        Ok(drop_malformed(listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> GooglePlacesAdapter {
        GooglePlacesAdapter::with_base_url("k", 12, "okapiq-test", "https://example.com/place")
            .expect("adapter construction should not fail")
    }

    fn query() -> SearchQuery {
        SearchQuery {
            location: "San Francisco".to_owned(),
            industry: Some("hvac".to_owned()),
            radius_miles: 25.0,
            limit: 20,
        }
    }

    #[test]
    fn search_url_carries_query_and_key() {
        let url = adapter().search_url(&query()).expect("url");
        assert!(url.as_str().starts_with("https://example.com/place/textsearch/json?"));
        assert!(url.as_str().contains("query=hvac+in+San+Francisco"));
        assert!(url.as_str().contains("key=k"));
    }

    #[test]
    fn map_place_extracts_coordinates() {
        let place = Place {
            name: "Golden Gate HVAC".to_owned(),
            place_id: "p1".to_owned(),
            formatted_address: Some("100 Market St, San Francisco, CA 94102".to_owned()),
            rating: Some(4.2),
            user_ratings_total: Some(89),
            types: vec!["hvac_contractor".to_owned()],
            geometry: Some(Geometry {
                location: Some(LatLng {
                    lat: 37.77,
                    lng: -122.42,
                }),
            }),
            business_status: Some("OPERATIONAL".to_owned()),
        };
        let listing = GooglePlacesAdapter::map_place(place);
        assert_eq!(listing.source, SourceId::GooglePlaces);
        assert_eq!(listing.lat, Some(37.77));
        assert_eq!(listing.review_count, Some(89));
        assert!(listing.phone.is_none(), "text search has no phone field");
    }
}
