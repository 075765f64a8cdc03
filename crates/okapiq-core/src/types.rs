//! Domain types for the aggregation and scoring pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one external data provider.
///
/// `Census` is the demographics collaborator; it never produces listings and
/// therefore never appears in [`RawListing::source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    GooglePlaces,
    Yelp,
    Serp,
    Apollo,
    Census,
}

impl SourceId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::GooglePlaces => "google_places",
            SourceId::Yelp => "yelp",
            SourceId::Serp => "serp",
            SourceId::Apollo => "apollo",
            SourceId::Census => "census",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location + industry search as the adapters consume it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub location: String,
    pub industry: Option<String>,
    pub radius_miles: f64,
    pub limit: usize,
}

impl SearchQuery {
    /// The free-text term adapters send upstream, e.g. `"hvac in Tulsa"`.
    #[must_use]
    pub fn term(&self) -> String {
        match &self.industry {
            Some(industry) => format!("{industry} in {}", self.location),
            None => format!("businesses in {}", self.location),
        }
    }
}

/// One provider-specific listing, produced fresh on every scan and discarded
/// after merge. Fields an adapter cannot populate stay `None` — adapters never
/// fabricate data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub source: SourceId,
    pub external_ref: String,
    pub name: String,
    pub address_text: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Opaque provider payload, passed through for debugging.
    pub raw_payload: serde_json::Value,
}

/// Structured postal address on a canonical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Address {
    /// Both coordinates present and inside valid lat/lng ranges.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
            {
                Some((lat, lng))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// Canonical business record produced by the deduplicator.
///
/// Invariants (enforced by the deduplicator, checked by [`Self::validate`]):
/// `source_count >= 1`, rating in `[0, 5]` when present, coordinates valid
/// when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Stable within a scan; derived from the normalized name + zip.
    pub business_id: String,
    pub name: String,
    pub address: Address,
    pub contact: Contact,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    /// Number of raw listings merged into this record.
    pub source_count: usize,
    /// Distinct providers that reported this entity.
    pub sources: Vec<SourceId>,
    /// Provenance / quality markers, e.g. `"no_website"`.
    pub tags: Vec<String>,
}

impl BusinessRecord {
    /// Checks the record invariants; returns the first violation as text.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.source_count == 0 {
            return Err(format!("{}: source_count must be >= 1", self.name));
        }
        if let Some(r) = self.rating {
            if !(0.0..=5.0).contains(&r) {
                return Err(format!("{}: rating {r} outside [0, 5]", self.name));
            }
        }
        if (self.address.lat.is_some() || self.address.lng.is_some())
            && self.address.coordinates().is_none()
        {
            return Err(format!("{}: invalid or partial coordinates", self.name));
        }
        Ok(())
    }
}

/// Per-business derived analytics. Created once at the end of a scan and
/// never mutated afterward. Every figure here is an estimate; `is_estimated`
/// marks that explicitly so callers never mistake derived numbers for
/// reported ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub tam_usd: f64,
    pub tsm_usd: f64,
    /// This business's share of the scan's composite weight, as a percentage.
    pub market_share_pct: f64,
    /// Squared share; the per-business term of the scan's HHI sum.
    pub hhi_contribution: f64,
    pub succession_risk_score: u8,
    pub succession_risk_level: String,
    pub succession_timeline: String,
    pub digital_presence_score: u8,
    pub has_strong_digital_presence: bool,
    pub digital_roi_estimate_usd: f64,
    pub lead_score: u8,
    pub is_estimated: bool,
}

/// A business record paired with its analytics annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredBusiness {
    #[serde(flatten)]
    pub record: BusinessRecord,
    pub market_analytics: AnalyticsResult,
}

/// Scan-level market statistics.
///
/// `hhi_index` lives on the conventional 0–10,000 antitrust scale and is
/// derived solely from the current scan's records — it has no identity
/// across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub hhi_index: f64,
    pub concentration_label: String,
    /// Inverse of concentration, 0–100.
    pub fragmentation_score: f64,
    /// Businesses per 1,000 residents; `None` without demographic data.
    pub business_density: Option<f64>,
    pub avg_succession_risk: f64,
    pub ad_spend_to_dominate_usd: f64,
    pub total_market_revenue_usd: f64,
}

/// Which sources contributed to a scan and which failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanProvenance {
    pub sources_used: Vec<SourceId>,
    pub sources_failed: Vec<SourceId>,
    /// True when at least one configured source failed or timed out.
    pub partial: bool,
}

/// Demographics for the scanned location, from the Census collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub population: u64,
    pub median_household_income_usd: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipCount {
    pub zip: String,
    pub count: usize,
}

/// Top-level result of one market scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketScanResult {
    pub location: String,
    pub industry: String,
    pub businesses: Vec<ScoredBusiness>,
    pub total_businesses: usize,
    pub analytics: AggregateStats,
    pub provenance: ScanProvenance,
    pub map_center: Option<MapPoint>,
    pub top_zips: Vec<ZipCount>,
    pub demographics: Option<Demographics>,
    pub scanned_at: DateTime<Utc>,
}
