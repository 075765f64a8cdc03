//! Shared domain types, industry reference data, and configuration for Okapiq.
//!
//! The pipeline crates (`okapiq-sources`, `okapiq-analytics`, `okapiq-scan`)
//! all speak in terms of the types defined here: a [`RawListing`] is what a
//! source adapter produces, a [`BusinessRecord`] is what the deduplicator
//! produces, and a [`MarketScanResult`] is what the orchestrator returns.

pub mod app_config;
pub mod config;
pub mod error;
pub mod industries;
pub mod types;

pub use app_config::{AppConfig, Environment, ProviderKeys};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use industries::{
    all_profiles, default_profile, industry_profile, IndustryProfile, DEFAULT_INDUSTRY_KEY,
};
pub use types::{
    Address, AggregateStats, AnalyticsResult, BusinessRecord, Contact, Demographics,
    MarketScanResult, MapPoint, RawListing, ScanProvenance, ScoredBusiness, SearchQuery, SourceId,
    ZipCount,
};
