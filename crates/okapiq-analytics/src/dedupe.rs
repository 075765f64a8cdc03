//! Merging raw listings into canonical business records.
//!
//! Identity rule: two listings are the same business when their normalized
//! names are within [`NAME_SIMILARITY_THRESHOLD`] edit distance AND their
//! coordinates are within [`ADDRESS_PROXIMITY_METERS`] — or at least one of
//! the two has no coordinates (name match alone then suffices, since an
//! address cannot contradict a missing address).
//!
//! `merge` is a pure function: same listings in the same order with the same
//! precedence table always produce the same records.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use okapiq_core::{Address, BusinessRecord, Contact, RawListing, SourceId};

/// Normalized Levenshtein distance at or below which two names match.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.15;

/// Coordinate proximity under which two addressed listings are one entity.
pub const ADDRESS_PROXIMITY_METERS: f64 = 150.0;

/// Source reliability order used to break field conflicts during merge.
///
/// Earlier is more reliable. Defaults to business-graph > reviews-platform >
/// search-engine-results > maps; ties (same rank, or sources not in the
/// table) fall back to first-seen order.
#[derive(Debug, Clone)]
pub struct SourcePrecedence {
    order: Vec<SourceId>,
}

impl Default for SourcePrecedence {
    fn default() -> Self {
        Self {
            order: vec![
                SourceId::Apollo,
                SourceId::Yelp,
                SourceId::Serp,
                SourceId::GooglePlaces,
            ],
        }
    }
}

impl SourcePrecedence {
    #[must_use]
    pub fn new(order: Vec<SourceId>) -> Self {
        Self { order }
    }

    fn rank(&self, source: SourceId) -> usize {
        self.order
            .iter()
            .position(|s| *s == source)
            .unwrap_or(self.order.len())
    }
}

/// Merges raw listings into deduplicated, normalized business records.
///
/// Listings without a usable name were already dropped at the adapter
/// boundary; any stragglers are skipped here too. Output order follows the
/// first appearance of each business in the input.
#[must_use]
pub fn merge(listings: &[RawListing], precedence: &SourcePrecedence) -> Vec<BusinessRecord> {
    let mut groups: Vec<Vec<&RawListing>> = Vec::new();

    for listing in listings {
        if listing.name.trim().is_empty() {
            continue;
        }
        match groups
            .iter_mut()
            .find(|group| same_business(group[0], listing))
        {
            Some(group) => group.push(listing),
            None => groups.push(vec![listing]),
        }
    }

    groups
        .iter()
        .map(|group| build_record(group, precedence))
        .collect()
}

/// Group representative comparison; the first-seen listing anchors the group.
fn same_business(a: &RawListing, b: &RawListing) -> bool {
    let name_a = normalize_name(&a.name);
    let name_b = normalize_name(&b.name);
    if normalized_edit_distance(&name_a, &name_b) > NAME_SIMILARITY_THRESHOLD {
        return false;
    }
    match (coords(a), coords(b)) {
        (Some((lat_a, lng_a)), Some((lat_b, lng_b))) => {
            haversine_meters(lat_a, lng_a, lat_b, lng_b) <= ADDRESS_PROXIMITY_METERS
        }
        // One side has no resolvable address: the name match decides.
        _ => true,
    }
}

fn coords(l: &RawListing) -> Option<(f64, f64)> {
    match (l.lat, l.lng) {
        (Some(lat), Some(lng))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
        {
            Some((lat, lng))
        }
        _ => None,
    }
}

/// Lowercases, strips punctuation, and collapses whitespace.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let punct = PUNCT.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("static regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("static regex"));

    let lowered = name.to_lowercase();
    let stripped = punct.replace_all(&lowered, "");
    spaces.replace_all(stripped.trim(), " ").into_owned()
}

/// Levenshtein distance divided by the longer length; 0.0 for two empties.
#[must_use]
pub fn normalized_edit_distance(a: &str, b: &str) -> f64 {
    let len = a.chars().count().max(b.chars().count());
    if len == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let distance = levenshtein(a, b) as f64;
    #[allow(clippy::cast_precision_loss)]
    let denom = len as f64;
    distance / denom
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Great-circle distance between two coordinate pairs, in meters.
#[must_use]
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

fn build_record(group: &[&RawListing], precedence: &SourcePrecedence) -> BusinessRecord {
    // (rank, first-seen index) ordering makes field selection deterministic.
    let pick = |field: &dyn Fn(&RawListing) -> Option<String>| -> Option<String> {
        group
            .iter()
            .enumerate()
            .filter_map(|(idx, l)| field(l).map(|v| (precedence.rank(l.source), idx, v)))
            .min_by_key(|(rank, idx, _)| (*rank, *idx))
            .map(|(_, _, v)| v)
    };

    let name = pick(&|l| Some(l.name.clone())).unwrap_or_default();
    let address_text = pick(&|l| l.address_text.clone());
    let phone = pick(&|l| l.phone.clone());
    let email = pick(&|l| l.email.clone());
    let website = pick(&|l| l.website.clone());
    let category = pick(&|l| l.category.clone());

    let rating = group
        .iter()
        .enumerate()
        .filter_map(|(idx, l)| {
            l.rating
                .filter(|r| (0.0..=5.0).contains(r))
                .map(|r| (precedence.rank(l.source), idx, r))
        })
        .min_by_key(|(rank, idx, _)| (*rank, *idx))
        .map(|(_, _, r)| r);

    // Review counts are an experience signal; the largest observed count is
    // the least stale one.
    let review_count = group.iter().filter_map(|l| l.review_count).max();

    let (lat, lng) = group
        .iter()
        .enumerate()
        .filter_map(|(idx, l)| coords(l).map(|c| (precedence.rank(l.source), idx, c)))
        .min_by_key(|(rank, idx, _)| (*rank, *idx))
        .map_or((None, None), |(_, _, (lat, lng))| (Some(lat), Some(lng)));

    let mut address = parse_address_text(address_text.as_deref());
    address.lat = lat;
    address.lng = lng;

    let mut sources: Vec<SourceId> = Vec::new();
    for l in group {
        if !sources.contains(&l.source) {
            sources.push(l.source);
        }
    }

    let mut tags = Vec::new();
    if group.len() > 1 {
        tags.push("multi_source".to_owned());
    }
    if website.is_none() {
        tags.push("no_website".to_owned());
    }
    if phone.is_none() {
        tags.push("no_phone".to_owned());
    }

    let business_id = derive_business_id(&name, &address, &group[0].external_ref);

    BusinessRecord {
        business_id,
        name,
        address,
        contact: Contact {
            phone,
            email,
            website,
        },
        category,
        rating,
        review_count,
        source_count: group.len(),
        sources,
        tags,
    }
}

/// Splits a free-text address into street / city / state / zip.
///
/// Heuristic comma-split: `"100 Market St, San Francisco, CA 94102, USA"`.
/// Parts that do not parse stay `None` rather than being guessed.
fn parse_address_text(text: Option<&str>) -> Address {
    static STATE_ZIP: OnceLock<Regex> = OnceLock::new();
    let state_zip = STATE_ZIP
        .get_or_init(|| Regex::new(r"^([A-Z]{2})\s*(\d{5})?(?:-\d{4})?$").expect("static regex"));

    let Some(text) = text else {
        return Address::default();
    };

    let parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("usa") && !p.eq_ignore_ascii_case("united states"))
        .collect();

    let mut address = Address::default();
    for (i, part) in parts.iter().enumerate() {
        if let Some(caps) = state_zip.captures(part) {
            address.state = caps.get(1).map(|m| m.as_str().to_owned());
            address.zip = caps.get(2).map(|m| m.as_str().to_owned());
            if i >= 1 {
                address.city = Some(parts[i - 1].to_owned());
            }
            if i >= 2 {
                address.street = Some(parts[..i - 1].join(", "));
            }
            return address;
        }
    }

    // No state/zip token found; best effort is street [+ city].
    match parts.as_slice() {
        [] => {}
        [street] => address.street = Some((*street).to_owned()),
        [street, city, ..] => {
            address.street = Some((*street).to_owned());
            address.city = Some((*city).to_owned());
        }
    }
    address
}

/// First 16 hex chars of SHA-256 over the normalized name plus the strongest
/// location signal available: zip, then street, then the group's first-seen
/// provider ref. Same-name businesses in different places therefore keep
/// distinct ids even when neither has a zip. Stable within a scan; not meant
/// to be stable across data corrections.
fn derive_business_id(name: &str, address: &Address, anchor_ref: &str) -> String {
    let locality = address
        .zip
        .clone()
        .or_else(|| address.street.as_deref().map(normalize_name))
        .unwrap_or_else(|| anchor_ref.to_owned());

    let mut hasher = Sha256::new();
    hasher.update(normalize_name(name).as_bytes());
    hasher.update(b"|");
    hasher.update(locality.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}
