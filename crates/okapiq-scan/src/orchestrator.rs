//! Scan orchestration: fan out to every configured source, tolerate partial
//! failure, merge, score, and aggregate.
//!
//! Failure policy: a failing or timed-out adapter is recorded in provenance
//! and the scan continues with whatever the rest returned. Adapters still
//! pending at the overall deadline are abandoned the same way, so a scan that
//! runs out of time still returns whatever it gathered, marked partial. The
//! scan itself fails only when every adapter fails or the request is invalid.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

use okapiq_analytics::hhi::composite_weight;
use okapiq_analytics::{aggregate, annotate, merge, resolve_profile, SourcePrecedence};
use okapiq_core::{
    BusinessRecord, Demographics, MapPoint, MarketScanResult, RawListing, ScanProvenance,
    SearchQuery, SourceId, ZipCount,
};
use okapiq_sources::{CensusClient, SourceAdapter};

use crate::cache::{scan_cache_key, ScanCache};
use crate::error::ScanError;

/// Most businesses one scan may return.
pub const MAX_RESULTS_LIMIT: usize = 50;

/// Default result cap when the request does not specify one.
pub const DEFAULT_MAX_RESULTS: usize = 20;

const TOP_ZIPS: usize = 5;

/// One market scan request, already past HTTP-level parsing.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub location: String,
    pub industry: Option<String>,
    pub max_results: usize,
    pub radius_miles: f64,
}

impl ScanRequest {
    fn validate(&self) -> Result<(), ScanError> {
        if self.location.trim().is_empty() {
            return Err(ScanError::InvalidRequest {
                reason: "location must not be empty".to_owned(),
            });
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(ScanError::InvalidRequest {
                reason: format!("max_results must be in 1..={MAX_RESULTS_LIMIT}"),
            });
        }
        Ok(())
    }
}

pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    census: Option<CensusClient>,
    precedence: SourcePrecedence,
    adapter_timeout: Duration,
    scan_deadline: Duration,
    cache: ScanCache<MarketScanResult>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        census: Option<CensusClient>,
        adapter_timeout_secs: u64,
        scan_timeout_secs: u64,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            adapters,
            census,
            precedence: SourcePrecedence::default(),
            adapter_timeout: Duration::from_secs(adapter_timeout_secs),
            scan_deadline: Duration::from_secs(scan_timeout_secs),
            cache: ScanCache::new(Duration::from_secs(cache_ttl_secs)),
        }
    }

    /// Runs a scan, serving repeats of the same request from the TTL cache.
    ///
    /// Cached results keep their original `scanned_at`.
    ///
    /// # Errors
    ///
    /// See [`ScanError`]; partial source failure is not an error.
    pub async fn scan(&self, request: &ScanRequest) -> Result<MarketScanResult, ScanError> {
        request.validate()?;
        let key = scan_cache_key(
            &request.location,
            request.industry.as_deref(),
            request.max_results,
        );
        self.cache
            .get_or_compute(&key, || self.scan_uncached(request))
            .await
    }

    /// Runs a scan bypassing the cache.
    ///
    /// # Errors
    ///
    /// See [`ScanError`].
    pub async fn scan_uncached(&self, request: &ScanRequest) -> Result<MarketScanResult, ScanError> {
        request.validate()?;
        if self.adapters.is_empty() {
            return Err(ScanError::NoSourcesConfigured);
        }

        self.run(request).await
    }

    /// Per-fetch time budget. Adapters start together, so capping each fetch
    /// at the scan deadline is what bounds the scan as a whole; anything still
    /// pending when its budget runs out lands in `sources_failed`.
    fn fetch_budget(&self) -> Duration {
        self.adapter_timeout.min(self.scan_deadline)
    }

    async fn run(&self, request: &ScanRequest) -> Result<MarketScanResult, ScanError> {
        let query = SearchQuery {
            location: request.location.clone(),
            industry: request.industry.clone(),
            radius_miles: request.radius_miles,
            limit: request.max_results,
        };

        let (collected, demographics) =
            tokio::join!(self.collect_listings(&query), self.fetch_demographics(request));
        let (listings, sources_used, sources_failed) = collected;

        if sources_used.is_empty() {
            return Err(ScanError::AllSourcesUnavailable {
                failed: sources_failed,
            });
        }

        let profile = resolve_profile(request.industry.as_deref());
        let records = merge(&listings, &self.precedence);
        let map_center = centroid(&records);
        let top_zips = top_zips(&records);

        let mut businesses = annotate(records, profile, demographics.as_ref());
        let total_businesses = businesses.len();
        let analytics = aggregate(&businesses, profile, demographics.as_ref());
        // The cap applies after merge and scoring so analytics always cover
        // the whole observed market; the best-evidenced records survive it.
        businesses.sort_by(|a, b| {
            composite_weight(&b.record)
                .total_cmp(&composite_weight(&a.record))
                .then_with(|| a.record.name.cmp(&b.record.name))
        });
        businesses.truncate(request.max_results);

        let partial = !sources_failed.is_empty();
        tracing::info!(
            location = %request.location,
            industry = ?request.industry,
            total_businesses,
            returned = businesses.len(),
            partial,
            "scan complete"
        );

        Ok(MarketScanResult {
            location: request.location.clone(),
            industry: profile.industry_key.to_owned(),
            businesses,
            total_businesses,
            analytics,
            provenance: ScanProvenance {
                sources_used,
                sources_failed,
                partial,
            },
            map_center,
            top_zips,
            demographics,
            scanned_at: Utc::now(),
        })
    }

    /// Fans out to every adapter; each gets its own timeout so one stalled
    /// provider cannot absorb the scan deadline.
    async fn collect_listings(
        &self,
        query: &SearchQuery,
    ) -> (Vec<RawListing>, Vec<SourceId>, Vec<SourceId>) {
        let budget = self.fetch_budget();
        let fetches = self.adapters.iter().map(|adapter| async move {
            let source = adapter.source();
            let outcome = tokio::time::timeout(budget, adapter.fetch(query)).await;
            (source, outcome)
        });

        let mut listings = Vec::new();
        let mut sources_used = Vec::new();
        let mut sources_failed = Vec::new();

        for (source, outcome) in join_all(fetches).await {
            match outcome {
                Ok(Ok(batch)) => {
                    tracing::debug!(source = %source, count = batch.len(), "source responded");
                    listings.extend(batch);
                    sources_used.push(source);
                }
                Ok(Err(err)) => {
                    tracing::warn!(source = %source, error = %err, "source failed, continuing");
                    sources_failed.push(source);
                }
                Err(_) => {
                    tracing::warn!(
                        source = %source,
                        timeout_secs = self.fetch_budget().as_secs(),
                        "source timed out, continuing"
                    );
                    sources_failed.push(source);
                }
            }
        }

        (listings, sources_used, sources_failed)
    }

    /// Demographics are best-effort; a Census failure never degrades the scan
    /// beyond a missing demographics block.
    async fn fetch_demographics(&self, request: &ScanRequest) -> Option<Demographics> {
        let census = self.census.as_ref()?;
        match tokio::time::timeout(self.fetch_budget(), census.demographics(&request.location))
            .await
        {
            Ok(Ok(demo)) => demo,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "census lookup failed, continuing without demographics");
                None
            }
            Err(_) => {
                tracing::warn!("census lookup timed out, continuing without demographics");
                None
            }
        }
    }
}

/// Mean of the records' coordinates, for centering a map view.
fn centroid(records: &[BusinessRecord]) -> Option<MapPoint> {
    let coords: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| r.address.coordinates())
        .collect();
    if coords.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = coords.len() as f64;
    Some(MapPoint {
        lat: coords.iter().map(|(lat, _)| lat).sum::<f64>() / n,
        lng: coords.iter().map(|(_, lng)| lng).sum::<f64>() / n,
    })
}

/// ZIPs ranked by business count, largest first, ties by ZIP for stability.
fn top_zips(records: &[BusinessRecord]) -> Vec<ZipCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for zip in records.iter().filter_map(|r| r.address.zip.as_deref()) {
        *counts.entry(zip).or_default() += 1;
    }
    let mut ranked: Vec<ZipCount> = counts
        .into_iter()
        .map(|(zip, count)| ZipCount {
            zip: zip.to_owned(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.zip.cmp(&b.zip)));
    ranked.truncate(TOP_ZIPS);
    ranked
}
