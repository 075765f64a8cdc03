//! Market concentration: HHI, concentration bands, fragmentation.
//!
//! Revenue figures are not observable from listings, so market shares use a
//! composite quality weight per business (presence signals plus rating plus
//! corroboration). With N equally-weighted businesses the HHI is exactly
//! 10,000 / N, which keeps the conventional antitrust bands meaningful.

use okapiq_core::BusinessRecord;

/// Band boundaries on the 0–10,000 HHI scale (DOJ/FTC convention).
pub const UNCONCENTRATED_BELOW: f64 = 1_500.0;
pub const MODERATE_UPPER: f64 = 2_500.0;

/// Composite weight standing in for firm size.
///
/// Every business gets a base weight so a listing with no extras still holds
/// share; presence fields, corroborating sources, and rating add to it.
#[must_use]
pub fn composite_weight(record: &BusinessRecord) -> f64 {
    let mut weight = 10.0;
    if record.contact.website.is_some() {
        weight += 25.0;
    }
    if record.contact.email.is_some() {
        weight += 15.0;
    }
    if record.contact.phone.is_some() {
        weight += 10.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        weight += (record.source_count.min(3) as f64) * 5.0;
        weight += record.rating.unwrap_or(0.0) * 5.0;
    }
    weight
}

/// Market share percentages, aligned index-for-index with `records`.
///
/// Shares sum to 100 (modulo float error) for a non-empty input.
#[must_use]
pub fn market_shares(records: &[BusinessRecord]) -> Vec<f64> {
    let weights: Vec<f64> = records.iter().map(composite_weight).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return vec![0.0; records.len()];
    }
    weights.iter().map(|w| w / total * 100.0).collect()
}

/// Herfindahl-Hirschman Index over percentage shares: sum of squared shares.
///
/// Empty input yields 0.0 (callers label that "Unknown").
#[must_use]
pub fn hhi(shares_pct: &[f64]) -> f64 {
    shares_pct.iter().map(|s| s * s).sum()
}

/// Maps an HHI value to its concentration band.
///
/// Boundary values belong to the lower band: exactly 2,500 is still
/// "Moderately Concentrated".
#[must_use]
pub fn concentration_label(hhi: f64) -> &'static str {
    if hhi < UNCONCENTRATED_BELOW {
        "Unconcentrated"
    } else if hhi <= MODERATE_UPPER {
        "Moderately Concentrated"
    } else {
        "Highly Concentrated"
    }
}

/// Fragmentation is the inverse of concentration, scaled to 0–100.
#[must_use]
pub fn fragmentation_score(hhi: f64) -> f64 {
    ((10_000.0 - hhi) / 100.0).clamp(0.0, 100.0)
}
