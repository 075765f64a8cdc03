//! Succession risk: how likely a business is to change hands soon.
//!
//! Weighted blend of four factors. Owner age is not observable from listing
//! data, so the engine passes an explicit age estimate (defaulting to the
//! small-business median); the age factor is monotonically non-decreasing in
//! that estimate while the scale factor decreases with review volume, which
//! is the property the ranking downstream relies on.

use okapiq_core::BusinessRecord;

/// Age assumed when nothing better is known, years. Roughly the median age
/// of an established US small business.
pub const DEFAULT_BUSINESS_AGE_YEARS: f64 = 15.0;

const AGE_WEIGHT: f64 = 0.35;
const SCALE_WEIGHT: f64 = 0.30;
const DIGITAL_WEIGHT: f64 = 0.20;
const PERFORMANCE_WEIGHT: f64 = 0.15;

/// Risk score with its qualitative level and transition timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessionRisk {
    pub score: u8,
    pub level: &'static str,
    pub timeline: &'static str,
}

/// Scores succession risk from the record plus an explicit age estimate.
///
/// Pure function of its arguments; `digital_score` is the 0–100 presence
/// score computed separately so the two modules agree on one number.
#[must_use]
pub fn succession_risk(
    record: &BusinessRecord,
    age_years: f64,
    digital_score: u8,
) -> SuccessionRisk {
    let blended = AGE_WEIGHT * age_factor(age_years)
        + SCALE_WEIGHT * scale_factor(record.review_count)
        + DIGITAL_WEIGHT * digital_factor(digital_score)
        + PERFORMANCE_WEIGHT * performance_factor(record.rating);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = blended.round().clamp(0.0, 100.0) as u8;
    let (level, timeline) = classify(score);
    SuccessionRisk {
        score,
        level,
        timeline,
    }
}

/// Piecewise linear and non-decreasing in age; saturates at 100.
fn age_factor(age_years: f64) -> f64 {
    let age = age_years.max(0.0);
    if age >= 25.0 {
        (85.0 + (age - 25.0) * 2.0).min(100.0)
    } else if age >= 15.0 {
        45.0 + (age - 15.0) * 4.0
    } else {
        age * 3.0
    }
}

/// Smaller operations are harder to hand off; risk falls as review volume
/// (the scale proxy) grows.
fn scale_factor(review_count: Option<u32>) -> f64 {
    let reviews = f64::from(review_count.unwrap_or(0));
    (100.0 - 18.0 * (1.0 + reviews).ln()).clamp(0.0, 100.0)
}

/// Weak digital presence correlates with owners near exit.
fn digital_factor(digital_score: u8) -> f64 {
    100.0 - f64::from(digital_score)
}

/// Below-average ratings raise risk; missing rating is neutral.
fn performance_factor(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) => ((5.0 - r) / 5.0 * 100.0).clamp(0.0, 100.0),
        None => 50.0,
    }
}

fn classify(score: u8) -> (&'static str, &'static str) {
    match score {
        85..=100 => ("Critical", "3-12 months"),
        70..=84 => ("High", "1-2 years"),
        50..=69 => ("Moderate", "2-5 years"),
        30..=49 => ("Low", "5-10 years"),
        _ => ("Minimal", "10+ years"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okapiq_core::{Address, Contact, SourceId};

    fn record(rating: Option<f64>, reviews: Option<u32>) -> BusinessRecord {
        BusinessRecord {
            business_id: "x".to_owned(),
            name: "x".to_owned(),
            address: Address::default(),
            contact: Contact::default(),
            category: None,
            rating,
            review_count: reviews,
            source_count: 1,
            sources: vec![SourceId::GooglePlaces],
            tags: vec![],
        }
    }

    #[test]
    fn risk_is_monotonic_in_age() {
        let r = record(Some(4.0), Some(50));
        let mut last = 0u8;
        for age in [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 35.0, 50.0] {
            let s = succession_risk(&r, age, 50).score;
            assert!(s >= last, "age {age}: {s} < {last}");
            last = s;
        }
    }

    #[test]
    fn risk_decreases_with_scale() {
        let small = succession_risk(&record(Some(4.0), Some(3)), 20.0, 50);
        let large = succession_risk(&record(Some(4.0), Some(800)), 20.0, 50);
        assert!(small.score > large.score);
    }

    #[test]
    fn weak_digital_presence_raises_risk() {
        let r = record(Some(4.0), Some(50));
        let offline = succession_risk(&r, 20.0, 10);
        let online = succession_risk(&r, 20.0, 90);
        assert!(offline.score > online.score);
    }

    #[test]
    fn low_rating_raises_risk() {
        let struggling = succession_risk(&record(Some(2.5), Some(50)), 20.0, 50);
        let thriving = succession_risk(&record(Some(4.9), Some(50)), 20.0, 50);
        assert!(struggling.score > thriving.score);
    }

    #[test]
    fn classification_levels_and_timelines() {
        assert_eq!(classify(92), ("Critical", "3-12 months"));
        assert_eq!(classify(85), ("Critical", "3-12 months"));
        assert_eq!(classify(84), ("High", "1-2 years"));
        assert_eq!(classify(70), ("High", "1-2 years"));
        assert_eq!(classify(69), ("Moderate", "2-5 years"));
        assert_eq!(classify(50), ("Moderate", "2-5 years"));
        assert_eq!(classify(49), ("Low", "5-10 years"));
        assert_eq!(classify(30), ("Low", "5-10 years"));
        assert_eq!(classify(29), ("Minimal", "10+ years"));
        assert_eq!(classify(0), ("Minimal", "10+ years"));
    }

    #[test]
    fn score_stays_in_range() {
        let extreme = succession_risk(&record(Some(0.0), Some(0)), 100.0, 0);
        assert!(extreme.score <= 100);
        let minimal = succession_risk(&record(Some(5.0), Some(100_000)), 0.0, 100);
        assert_eq!(minimal.level, "Minimal");
    }

    #[test]
    fn age_factor_is_continuous_at_breakpoints() {
        assert!((age_factor(15.0) - 45.0).abs() < 1e-9);
        assert!((age_factor(25.0) - 85.0).abs() < 1e-9);
        assert!((age_factor(14.999) - 44.997).abs() < 1e-2);
    }
}
