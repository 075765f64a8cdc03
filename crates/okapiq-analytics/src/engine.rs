//! The analytics engine: annotates merged records and rolls up scan-level
//! statistics.
//!
//! Every number produced here is derived from listing signals and industry
//! reference data, never fabricated, so each [`AnalyticsResult`] carries
//! `is_estimated: true` and fields with no basis stay at their explicit
//! missing value upstream.

use okapiq_core::{
    default_profile, industry_profile, AggregateStats, AnalyticsResult, BusinessRecord,
    Demographics, IndustryProfile, ScoredBusiness,
};

use crate::digital;
use crate::hhi;
use crate::succession::{self, DEFAULT_BUSINESS_AGE_YEARS};
use crate::tam;

/// Monthly searches assumed per local business when sizing ad spend.
const SEARCHES_PER_BUSINESS: f64 = 50.0;

/// Share of local search volume needed to dominate the category.
const DOMINANCE_CLICK_SHARE: f64 = 0.4;

/// Resolves the industry profile, falling back to the default when unknown.
#[must_use]
pub fn resolve_profile(industry: Option<&str>) -> &'static IndustryProfile {
    match industry {
        Some(key) => industry_profile(key).unwrap_or_else(|| {
            let fallback = default_profile();
            tracing::warn!(
                industry = key,
                fallback = fallback.industry_key,
                "unknown industry, using fallback profile"
            );
            fallback
        }),
        None => default_profile(),
    }
}

/// Annotates each record with its analytics result.
///
/// Output order mirrors input order; market shares are computed across the
/// whole batch, so annotation is a batch operation rather than per-record.
#[must_use]
pub fn annotate(
    records: Vec<BusinessRecord>,
    profile: &IndustryProfile,
    demographics: Option<&Demographics>,
) -> Vec<ScoredBusiness> {
    let shares = hhi::market_shares(&records);
    let hhi_value = hhi::hhi(&shares);
    let fragmentation = hhi::fragmentation_score(hhi_value);
    let median_income = demographics.and_then(|d| d.median_household_income_usd);

    records
        .into_iter()
        .zip(shares)
        .map(|(record, share_pct)| {
            let analytics = score_business(&record, profile, share_pct, median_income, fragmentation);
            ScoredBusiness {
                record,
                market_analytics: analytics,
            }
        })
        .collect()
}

fn score_business(
    record: &BusinessRecord,
    profile: &IndustryProfile,
    market_share_pct: f64,
    median_income_usd: Option<f64>,
    fragmentation: f64,
) -> AnalyticsResult {
    let tsm_usd = tam::tsm_usd(record, profile, median_income_usd);
    let digital_presence_score = digital::digital_score(record, profile);
    let risk = succession::succession_risk(record, DEFAULT_BUSINESS_AGE_YEARS, digital_presence_score);
    let lead_score = lead_score(
        tsm_usd,
        profile,
        risk.score,
        market_share_pct,
        digital_presence_score,
        fragmentation,
    );

    AnalyticsResult {
        tam_usd: profile.total_addressable_market_usd,
        tsm_usd,
        market_share_pct,
        hhi_contribution: market_share_pct * market_share_pct,
        succession_risk_score: risk.score,
        succession_risk_level: risk.level.to_owned(),
        succession_timeline: risk.timeline.to_owned(),
        digital_presence_score,
        has_strong_digital_presence: digital::has_strong_presence(digital_presence_score),
        digital_roi_estimate_usd: digital::roi_estimate_usd(digital_presence_score, profile),
        lead_score,
        is_estimated: true,
    }
}

/// Acquisition attractiveness blend, 0–100.
///
/// High TSM, high succession risk (a willing seller), meaningful share, and
/// a fragmented market all raise the score; a strong online presence lowers
/// the improvement upside slightly.
fn lead_score(
    tsm_usd: f64,
    profile: &IndustryProfile,
    succession_score: u8,
    market_share_pct: f64,
    digital_score: u8,
    fragmentation: f64,
) -> u8 {
    let revenue_component = if profile.total_addressable_market_usd > 0.0 {
        (tsm_usd / (profile.total_addressable_market_usd * tam::MAX_CAPTURE_RATE) * 100.0)
            .clamp(0.0, 100.0)
    } else {
        0.0
    };
    let share_component = (market_share_pct * 10.0).clamp(0.0, 100.0);
    let upside_component = f64::from(100u8.saturating_sub(digital_score));

    let blended = 0.30 * revenue_component
        + 0.25 * f64::from(succession_score)
        + 0.20 * share_component
        + 0.15 * upside_component
        + 0.10 * fragmentation;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = blended.round().clamp(0.0, 100.0) as u8;
    score
}

/// Rolls the annotated batch up into scan-level statistics.
///
/// An empty batch yields an HHI of 0 labeled `"Unknown"` so callers can tell
/// "no data" apart from a genuinely fragmented market.
#[must_use]
pub fn aggregate(
    scored: &[ScoredBusiness],
    profile: &IndustryProfile,
    demographics: Option<&Demographics>,
) -> AggregateStats {
    if scored.is_empty() {
        return AggregateStats {
            hhi_index: 0.0,
            concentration_label: "Unknown".to_owned(),
            fragmentation_score: 0.0,
            business_density: None,
            avg_succession_risk: 0.0,
            ad_spend_to_dominate_usd: 0.0,
            total_market_revenue_usd: 0.0,
        };
    }

    let shares: Vec<f64> = scored
        .iter()
        .map(|s| s.market_analytics.market_share_pct)
        .collect();
    let hhi_index = hhi::hhi(&shares);

    #[allow(clippy::cast_precision_loss)]
    let count = scored.len() as f64;
    let avg_succession_risk = scored
        .iter()
        .map(|s| f64::from(s.market_analytics.succession_risk_score))
        .sum::<f64>()
        / count;

    let business_density = demographics.and_then(|d| {
        #[allow(clippy::cast_precision_loss)]
        let population = d.population as f64;
        (population > 0.0).then(|| count / population * 1_000.0)
    });

    AggregateStats {
        hhi_index,
        concentration_label: hhi::concentration_label(hhi_index).to_owned(),
        fragmentation_score: hhi::fragmentation_score(hhi_index),
        business_density,
        avg_succession_risk,
        ad_spend_to_dominate_usd: count
            * SEARCHES_PER_BUSINESS
            * DOMINANCE_CLICK_SHARE
            * profile.cost_per_click_usd,
        total_market_revenue_usd: count * profile.average_business_revenue_usd,
    }
}
