//! US Census ACS demographics client.
//!
//! Not a listing adapter: it supplies population and median household income
//! for the scanned location, feeding business-density and the TSM income
//! multiplier. Lookups are keyed by 5-digit ZIP (ZCTA); non-ZIP locations
//! resolve to `None` rather than guessing a geography.

use std::time::Duration;

use reqwest::{Client, Url};

use okapiq_core::{Demographics, SourceId};

use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.census.gov/";

/// ACS 5-year variables: total population, median household income.
const ACS_VARIABLES: &str = "B01003_001E,B19013_001E";

pub struct CensusClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl CensusClient {
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
                source_id: SourceId::Census,
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

    /// Fetches demographics for `location` when it is a 5-digit ZIP code.
    ///
    /// Returns `Ok(None)` for non-ZIP locations — city names would need a
    /// geocoding step this client does not own.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network failure, non-2xx status, or an
    /// unparseable response body.
    pub async fn demographics(&self, location: &str) -> Result<Option<Demographics>, SourceError> {
        let Some(zip) = as_zip(location) else {
            return Ok(None);
        };

        let mut url = self
            .base_url
            .join("data/2022/acs/acs5")
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("get", ACS_VARIABLES)
            .append_pair("for", &format!("zip code tabulation area:{zip}"))
            .append_pair("key", &self.api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Census, e))?
            .error_for_status()
            .map_err(|e| SourceError::from_http(SourceId::Census, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_http(SourceId::Census, e))?;
        let rows: Vec<Vec<serde_json::Value>> =
            serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
                context: "census acs5".to_owned(),
                source: e,
            })?;

        Ok(parse_acs_rows(&rows))
    }
}

fn as_zip(location: &str) -> Option<&str> {
    let trimmed = location.trim();
    (trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit())).then_some(trimmed)
}

/// The ACS API returns a header row followed by value rows, all strings.
fn parse_acs_rows(rows: &[Vec<serde_json::Value>]) -> Option<Demographics> {
    let values = rows.get(1)?;
    let population = values.first()?.as_str()?.parse::<u64>().ok()?;
    // Income is suppressed for some geographies (negative sentinel values).
    let median_household_income_usd = values
        .get(1)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| *v > 0.0);

    Some(Demographics {
        population,
        median_household_income_usd,
    })
}
