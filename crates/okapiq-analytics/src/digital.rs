//! Digital presence scoring and the upgrade-ROI estimate.

use okapiq_core::{BusinessRecord, IndustryProfile};

/// Score at or above which a presence counts as strong.
pub const STRONG_PRESENCE_THRESHOLD: u8 = 60;

const WEBSITE_POINTS: f64 = 35.0;
const EMAIL_POINTS: f64 = 20.0;
const PLACEHOLDER_EMAIL_POINTS: f64 = 10.0;
const PHONE_POINTS: f64 = 15.0;
const REVIEW_POINTS_MAX: f64 = 30.0;

/// Generic mailbox prefixes that signal a domain-derived contact rather than
/// a monitored inbox.
const PLACEHOLDER_PREFIXES: &[&str] = &["info@", "contact@", "admin@", "office@", "hello@"];

/// Digital presence score on 0–100.
#[must_use]
pub fn digital_score(record: &BusinessRecord, profile: &IndustryProfile) -> u8 {
    let mut score = 0.0;
    if record.contact.website.is_some() {
        score += WEBSITE_POINTS;
    }
    if let Some(email) = &record.contact.email {
        score += if is_placeholder_email(email) {
            PLACEHOLDER_EMAIL_POINTS
        } else {
            EMAIL_POINTS
        };
    }
    if record.contact.phone.is_some() {
        score += PHONE_POINTS;
    }
    score += review_points(record.review_count, profile.review_benchmark);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = score.round().clamp(0.0, 100.0) as u8;
    score
}

#[must_use]
pub fn has_strong_presence(score: u8) -> bool {
    score >= STRONG_PRESENCE_THRESHOLD
}

/// Expected annual revenue lift from closing the digital gap, USD.
///
/// Gap is measured against a full score of 100; a business already at 100
/// has nothing to gain and gets 0.
#[must_use]
pub fn roi_estimate_usd(score: u8, profile: &IndustryProfile) -> f64 {
    let gap = f64::from(100u8.saturating_sub(score)) / 100.0;
    gap * profile.digital_roi_multiplier * profile.average_business_revenue_usd * 0.15
}

fn is_placeholder_email(email: &str) -> bool {
    let lowered = email.to_lowercase();
    PLACEHOLDER_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

/// Review volume against the industry benchmark, up to [`REVIEW_POINTS_MAX`].
fn review_points(review_count: Option<u32>, benchmark: u32) -> f64 {
    let reviews = f64::from(review_count.unwrap_or(0));
    let bench = f64::from(benchmark.max(1));
    (reviews / bench * REVIEW_POINTS_MAX).min(REVIEW_POINTS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use okapiq_core::{industry_profile, Address, Contact, SourceId};

    fn record(contact: Contact, reviews: Option<u32>) -> BusinessRecord {
        BusinessRecord {
            business_id: "x".to_owned(),
            name: "x".to_owned(),
            address: Address::default(),
            contact,
            category: None,
            rating: None,
            review_count: reviews,
            source_count: 1,
            sources: vec![SourceId::Yelp],
            tags: vec![],
        }
    }

    #[test]
    fn full_presence_scores_near_maximum() {
        let profile = industry_profile("hvac").expect("profile");
        let r = record(
            Contact {
                phone: Some("555".to_owned()),
                email: Some("owner@goldengatehvac.com".to_owned()),
                website: Some("https://goldengatehvac.com".to_owned()),
            },
            Some(200),
        );
        let score = digital_score(&r, profile);
        assert_eq!(score, 100);
        assert!(has_strong_presence(score));
    }

    #[test]
    fn no_presence_scores_zero() {
        let profile = industry_profile("hvac").expect("profile");
        let score = digital_score(&record(Contact::default(), None), profile);
        assert_eq!(score, 0);
        assert!(!has_strong_presence(score));
    }

    #[test]
    fn placeholder_email_scores_less_than_real_mailbox() {
        let profile = industry_profile("plumbing").expect("profile");
        let placeholder = record(
            Contact {
                email: Some("info@pacificplumbing.example.com".to_owned()),
                ..Contact::default()
            },
            None,
        );
        let real = record(
            Contact {
                email: Some("maria@pacificplumbing.example.com".to_owned()),
                ..Contact::default()
            },
            None,
        );
        assert!(digital_score(&real, profile) > digital_score(&placeholder, profile));
    }

    #[test]
    fn website_alone_is_not_strong() {
        let profile = industry_profile("retail").expect("profile");
        let r = record(
            Contact {
                website: Some("https://shop.example.com".to_owned()),
                ..Contact::default()
            },
            None,
        );
        assert!(!has_strong_presence(digital_score(&r, profile)));
    }

    #[test]
    fn website_phone_and_reviews_cross_the_threshold() {
        let profile = industry_profile("hvac").expect("profile");
        let r = record(
            Contact {
                phone: Some("555".to_owned()),
                website: Some("https://x.example.com".to_owned()),
                ..Contact::default()
            },
            Some(60),
        );
        // 35 + 15 + 30 = 80.
        let score = digital_score(&r, profile);
        assert_eq!(score, 80);
        assert!(has_strong_presence(score));
    }

    #[test]
    fn roi_shrinks_as_score_rises() {
        let profile = industry_profile("hvac").expect("profile");
        assert!(roi_estimate_usd(20, profile) > roi_estimate_usd(80, profile));
        assert!((roi_estimate_usd(100, profile) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn review_points_are_capped() {
        assert!((review_points(Some(10_000), 60) - REVIEW_POINTS_MAX).abs() < 1e-9);
    }
}
