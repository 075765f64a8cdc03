//! Static industry reference data.
//!
//! Benchmarks compiled from IBISWorld/BLS/Census figures. Read-only at
//! runtime; the analytics engine looks profiles up by key and falls back to
//! [`DEFAULT_INDUSTRY_KEY`] when the requested industry is unknown.

/// Key of the profile substituted when an industry is not in the table.
pub const DEFAULT_INDUSTRY_KEY: &str = "retail";

/// Reference economics for one industry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IndustryProfile {
    pub industry_key: &'static str,
    pub naics_code: &'static str,
    /// Regional addressable market, USD.
    pub total_addressable_market_usd: f64,
    pub average_business_revenue_usd: f64,
    /// Industry-average review rating, used to scale TSM.
    pub average_rating: f64,
    /// Review count at which a business is considered established.
    pub review_benchmark: u32,
    /// Industry-average digital presence score (0–100).
    pub digital_benchmark: u8,
    /// ROI multiplier applied to the digital gap.
    pub digital_roi_multiplier: f64,
    /// Average Google Ads cost-per-click, USD.
    pub cost_per_click_usd: f64,
    pub growth_rate: f64,
}

const PROFILES: &[IndustryProfile] = &[
    IndustryProfile {
        industry_key: "hvac",
        naics_code: "238220",
        total_addressable_market_usd: 25_500_000.0,
        average_business_revenue_usd: 850_000.0,
        average_rating: 4.1,
        review_benchmark: 60,
        digital_benchmark: 42,
        digital_roi_multiplier: 1.8,
        cost_per_click_usd: 15.50,
        growth_rate: 0.045,
    },
    IndustryProfile {
        industry_key: "plumbing",
        naics_code: "238220",
        total_addressable_market_usd: 21_600_000.0,
        average_business_revenue_usd: 720_000.0,
        average_rating: 4.0,
        review_benchmark: 55,
        digital_benchmark: 38,
        digital_roi_multiplier: 1.9,
        cost_per_click_usd: 12.80,
        growth_rate: 0.038,
    },
    IndustryProfile {
        industry_key: "electrical",
        naics_code: "238210",
        total_addressable_market_usd: 20_400_000.0,
        average_business_revenue_usd: 680_000.0,
        average_rating: 4.2,
        review_benchmark: 50,
        digital_benchmark: 45,
        digital_roi_multiplier: 1.7,
        cost_per_click_usd: 14.20,
        growth_rate: 0.042,
    },
    IndustryProfile {
        industry_key: "landscaping",
        naics_code: "561730",
        total_addressable_market_usd: 13_500_000.0,
        average_business_revenue_usd: 450_000.0,
        average_rating: 4.3,
        review_benchmark: 40,
        digital_benchmark: 51,
        digital_roi_multiplier: 2.1,
        cost_per_click_usd: 8.90,
        growth_rate: 0.035,
    },
    IndustryProfile {
        industry_key: "restaurant",
        naics_code: "722511",
        total_addressable_market_usd: 28_500_000.0,
        average_business_revenue_usd: 950_000.0,
        average_rating: 4.0,
        review_benchmark: 250,
        digital_benchmark: 68,
        digital_roi_multiplier: 1.4,
        cost_per_click_usd: 2.40,
        growth_rate: 0.028,
    },
    IndustryProfile {
        industry_key: "retail",
        naics_code: "44-45",
        total_addressable_market_usd: 19_500_000.0,
        average_business_revenue_usd: 650_000.0,
        average_rating: 4.1,
        review_benchmark: 120,
        digital_benchmark: 72,
        digital_roi_multiplier: 1.3,
        cost_per_click_usd: 1.80,
        growth_rate: 0.031,
    },
    IndustryProfile {
        industry_key: "automotive",
        naics_code: "811111",
        total_addressable_market_usd: 36_000_000.0,
        average_business_revenue_usd: 1_200_000.0,
        average_rating: 4.2,
        review_benchmark: 80,
        digital_benchmark: 48,
        digital_roi_multiplier: 1.8,
        cost_per_click_usd: 2.20,
        growth_rate: 0.043,
    },
    IndustryProfile {
        industry_key: "healthcare",
        naics_code: "621",
        total_addressable_market_usd: 54_000_000.0,
        average_business_revenue_usd: 1_800_000.0,
        average_rating: 4.4,
        review_benchmark: 70,
        digital_benchmark: 55,
        digital_roi_multiplier: 1.6,
        cost_per_click_usd: 6.80,
        growth_rate: 0.063,
    },
    IndustryProfile {
        industry_key: "construction",
        naics_code: "236118",
        total_addressable_market_usd: 33_000_000.0,
        average_business_revenue_usd: 1_100_000.0,
        average_rating: 4.1,
        review_benchmark: 45,
        digital_benchmark: 44,
        digital_roi_multiplier: 1.8,
        cost_per_click_usd: 9.50,
        growth_rate: 0.040,
    },
];

/// Looks up the profile for `industry`, case-insensitively.
///
/// Returns `None` for unknown industries; callers decide whether to fall back
/// to [`default_profile`] (the analytics engine does, logging the
/// substitution).
#[must_use]
pub fn industry_profile(industry: &str) -> Option<&'static IndustryProfile> {
    let key = industry.trim().to_lowercase();
    PROFILES.iter().find(|p| p.industry_key == key)
}

/// The documented fallback profile used when an industry is unknown.
#[must_use]
pub fn default_profile() -> &'static IndustryProfile {
    PROFILES
        .iter()
        .find(|p| p.industry_key == DEFAULT_INDUSTRY_KEY)
        .unwrap_or(&PROFILES[0])
}

/// All known profiles, for the `/market/industries` endpoint.
#[must_use]
pub fn all_profiles() -> &'static [IndustryProfile] {
    PROFILES
}
