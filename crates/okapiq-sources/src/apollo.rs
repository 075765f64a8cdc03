//! Apollo organization search adapter (business-graph source).
//!
//! POSTs to `v1/mixed_companies/search` with the key in the `X-Api-Key`
//! header. Organization search returns firmographics only; contact emails
//! require the separate enrichment endpoints, so listings carry no email.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use okapiq_core::{RawListing, SearchQuery, SourceId};

use crate::adapter::{drop_malformed, SourceAdapter};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.apollo.io/";

pub struct ApolloAdapter {
    client: Client,
    api_key: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct CompanySearchResponse {
    #[serde(default)]
    organizations: Vec<Organization>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    website_url: Option<String>,
    primary_phone: Option<PrimaryPhone>,
    primary_domain: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrimaryPhone {
    number: Option<String>,
}

impl ApolloAdapter {
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
                source_id: SourceId::Apollo,
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

    fn map_organization(org: Organization) -> RawListing {
        let address_text = match (&org.city, &org.state) {
            (Some(city), Some(state)) => Some(format!("{city}, {state}")),
            (Some(city), None) => Some(city.clone()),
            _ => None,
        };

        let raw_payload = serde_json::json!({
            "id": org.id,
            "primary_domain": org.primary_domain,
            "postal_code": org.postal_code,
        });

        RawListing {
            source: SourceId::Apollo,
            external_ref: org.id,
            name: org.name,
            address_text,
            phone: org.primary_phone.and_then(|p| p.number),
            website: org.website_url,
            // Organization search carries domains, not mailboxes. Synthesising
            // an address from the domain would put made-up data in the merge.
            email: None,
            rating: None,
            review_count: None,
            category: org.industry,
            lat: None,
            lng: None,
            raw_payload,
        }
    }
}

#[async_trait]
impl SourceAdapter for ApolloAdapter {
    fn source(&self) -> SourceId {
        SourceId::Apollo
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, SourceError> {
        let url = self
            .base_url
            .join("v1/mixed_companies/search")
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let body = serde_json::json!({
            "q_organization_keyword_tags": query.industry.as_deref().map(|i| vec![i]),
            "organization_locations": [query.location],
            "page": 1,
            "per_page": query.limit,
        });

        let response = self
            .client
            .post(url)
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Apollo, e))?
            .error_for_status()
            .map_err(|e| SourceError::from_http(SourceId::Apollo, e))?;

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Apollo, e))?;
        let parsed: CompanySearchResponse =
            serde_json::from_str(&text).map_err(|e| SourceError::Deserialize {
                context: "apollo mixed_companies/search".to_owned(),
                source: e,
            })?;

        let listings = parsed
            .organizations
            .into_iter()
            .map(Self::map_organization)
            .collect();

        Ok(drop_malformed(listings))
    }
}
