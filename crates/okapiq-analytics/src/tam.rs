//! Addressable and serviceable market sizing.
//!
//! TAM comes straight from the industry profile. TSM scales TAM by a
//! per-business capture rate built from rating quality, review-count
//! experience (log-scaled against the industry benchmark), and a local
//! income multiplier. The capture rate is capped so no single business is
//! ever modeled as serving more than a small slice of the market.

use okapiq_core::{BusinessRecord, IndustryProfile};

/// Baseline share of TAM a typical business can serve.
pub const BASE_CAPTURE_RATE: f64 = 0.05;

/// Ceiling on the per-business capture rate.
pub const MAX_CAPTURE_RATE: f64 = 0.12;

/// National median household income, the income multiplier's pivot.
const NATIONAL_MEDIAN_INCOME_USD: f64 = 74_580.0;

/// Total serviceable market for one business, USD.
///
/// Missing rating or review count fall back to neutral factors (1.0 and the
/// minimum experience factor respectively); they widen uncertainty rather
/// than zeroing the estimate.
#[must_use]
pub fn tsm_usd(
    record: &BusinessRecord,
    profile: &IndustryProfile,
    median_income_usd: Option<f64>,
) -> f64 {
    profile.total_addressable_market_usd * capture_rate(record, profile, median_income_usd)
}

fn capture_rate(
    record: &BusinessRecord,
    profile: &IndustryProfile,
    median_income_usd: Option<f64>,
) -> f64 {
    let rate = BASE_CAPTURE_RATE
        * quality_factor(record.rating, profile.average_rating)
        * experience_factor(record.review_count, profile.review_benchmark)
        * income_multiplier(median_income_usd);
    rate.min(MAX_CAPTURE_RATE)
}

/// Rating relative to the industry average, clamped to [0.5, 1.5].
fn quality_factor(rating: Option<f64>, industry_average: f64) -> f64 {
    match rating {
        Some(r) if industry_average > 0.0 => (r / industry_average).clamp(0.5, 1.5),
        _ => 1.0,
    }
}

/// Log-scaled review volume against the industry benchmark, in [0.5, 1.5].
///
/// Logs keep a 500-review business from dwarfing a 50-review one by 10x.
fn experience_factor(review_count: Option<u32>, benchmark: u32) -> f64 {
    let reviews = f64::from(review_count.unwrap_or(0));
    let bench = f64::from(benchmark.max(1));
    ((1.0 + reviews).ln() / (1.0 + bench).ln()).clamp(0.5, 1.5)
}

/// Local income relative to the national median, clamped to [0.7, 1.3].
fn income_multiplier(median_income_usd: Option<f64>) -> f64 {
    match median_income_usd {
        Some(income) if income > 0.0 => (income / NATIONAL_MEDIAN_INCOME_USD).clamp(0.7, 1.3),
        _ => 1.0,
    }
}
