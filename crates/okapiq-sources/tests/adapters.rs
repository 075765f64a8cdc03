//! Integration tests for the source adapters using wiremock HTTP mocks.

use okapiq_core::{SearchQuery, SourceId};
use okapiq_sources::adapter::SourceAdapter;
use okapiq_sources::{
    ApolloAdapter, CensusClient, GooglePlacesAdapter, SerpAdapter, SourceError, YelpAdapter,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query() -> SearchQuery {
    SearchQuery {
        location: "San Francisco".to_owned(),
        industry: Some("hvac".to_owned()),
        radius_miles: 25.0,
        limit: 20,
    }
}

#[tokio::test]
async fn google_places_maps_operational_results() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "OK",
        "results": [
            {
                "name": "Golden Gate HVAC",
                "place_id": "p1",
                "formatted_address": "100 Market St, San Francisco, CA 94102",
                "rating": 4.2,
                "user_ratings_total": 89,
                "types": ["hvac_contractor"],
                "geometry": { "location": { "lat": 37.77, "lng": -122.42 } },
                "business_status": "OPERATIONAL"
            },
            {
                "name": "Closed Climate Co",
                "place_id": "p2",
                "business_status": "CLOSED_PERMANENTLY"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/textsearch/json"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = GooglePlacesAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri())
        .expect("adapter");
    let listings = adapter.fetch(&query()).await.expect("listings");

    assert_eq!(listings.len(), 1, "closed businesses are filtered out");
    assert_eq!(listings[0].name, "Golden Gate HVAC");
    assert_eq!(listings[0].source, SourceId::GooglePlaces);
    assert_eq!(listings[0].lat, Some(37.77));
}

#[tokio::test]
async fn google_places_over_query_limit_is_rate_limited() {
    let server = MockServer::start().await;

    let body = serde_json::json!({ "status": "OVER_QUERY_LIMIT", "results": [] });
    Mock::given(method("GET"))
        .and(path("/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = GooglePlacesAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri())
        .expect("adapter");
    let err = adapter.fetch(&query()).await.expect_err("should fail");
    assert!(matches!(err, SourceError::RateLimited { .. }), "got: {err:?}");
}

#[tokio::test]
async fn yelp_filters_closed_and_maps_fields() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "businesses": [
            {
                "id": "y1",
                "name": "Bay Area Plumbing Co",
                "phone": "+14155550123",
                "url": "https://yelp.example.com/biz/y1",
                "rating": 3.8,
                "review_count": 67,
                "is_closed": false,
                "location": { "display_address": ["200 Mission St", "San Francisco, CA 94105"] },
                "coordinates": { "latitude": 37.79, "longitude": -122.39 },
                "categories": [{ "title": "Plumbing" }]
            },
            { "id": "y2", "name": "Shuttered Pipes", "is_closed": true }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .and(query_param("location", "San Francisco"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter =
        YelpAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri()).expect("adapter");
    let listings = adapter.fetch(&query()).await.expect("listings");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].phone.as_deref(), Some("+14155550123"));
    assert_eq!(listings[0].review_count, Some(67));
}

#[tokio::test]
async fn yelp_unauthorized_is_source_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let adapter =
        YelpAdapter::with_base_url("bad-key", 12, "okapiq-test", &server.uri()).expect("adapter");
    let err = adapter.fetch(&query()).await.expect_err("should fail");
    assert!(
        matches!(err, SourceError::UnexpectedStatus { status: 401, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn serp_maps_local_results() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "local_results": [
            {
                "position": 1,
                "title": "SF Electrical Services",
                "address": "300 Howard St, San Francisco, CA 94105",
                "phone": "(415) 555-0456",
                "website": "https://sfelectrical.example.com",
                "rating": 4.5,
                "reviews": 124,
                "type": "Electrician"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter =
        SerpAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri()).expect("adapter");
    let listings = adapter.fetch(&query()).await.expect("listings");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].external_ref, "position-1");
    assert_eq!(listings[0].category.as_deref(), Some("Electrician"));
}

#[tokio::test]
async fn serp_in_band_error_surfaces_as_api_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({ "error": "Invalid API key." });
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter =
        SerpAdapter::with_base_url("bad-key", 12, "okapiq-test", &server.uri()).expect("adapter");
    let err = adapter.fetch(&query()).await.expect_err("should fail");
    assert!(
        matches!(err, SourceError::Api { ref message, .. } if message == "Invalid API key."),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn apollo_maps_organizations() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "organizations": [
            {
                "id": "org-1",
                "name": "Pacific Plumbing",
                "website_url": "https://pacificplumbing.example.com",
                "primary_phone": { "number": "(415) 555-0123" },
                "primary_domain": "pacificplumbing.example.com",
                "city": "San Francisco",
                "state": "CA",
                "industry": "plumbing"
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/v1/mixed_companies/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = ApolloAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri())
        .expect("adapter");
    let listings = adapter.fetch(&query()).await.expect("listings");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].source, SourceId::Apollo);
    assert_eq!(
        listings[0].website.as_deref(),
        Some("https://pacificplumbing.example.com")
    );
    assert!(
        listings[0].email.is_none(),
        "organization search has no mailbox data to map"
    );
}

#[tokio::test]
async fn empty_results_are_ok_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/businesses/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"businesses": []})))
        .mount(&server)
        .await;

    let adapter =
        YelpAdapter::with_base_url("test-key", 12, "okapiq-test", &server.uri()).expect("adapter");
    let listings = adapter.fetch(&query()).await.expect("empty is ok");
    assert!(listings.is_empty());
}

#[tokio::test]
async fn census_returns_demographics_for_zip() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        ["B01003_001E", "B19013_001E", "zip code tabulation area"],
        ["28752", "112442", "94102"]
    ]);

    Mock::given(method("GET"))
        .and(path("/data/2022/acs/acs5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = CensusClient::with_base_url("test-key", 12, "okapiq-test", &server.uri())
        .expect("client");
    let demo = client
        .demographics("94102")
        .await
        .expect("request")
        .expect("zip resolves");
    assert_eq!(demo.population, 28752);
    assert_eq!(demo.median_household_income_usd, Some(112_442.0));
}

#[tokio::test]
async fn census_skips_non_zip_locations_without_calling_upstream() {
    // No mock mounted: a request would 404 and fail the test.
    let server = MockServer::start().await;
    let client = CensusClient::with_base_url("test-key", 12, "okapiq-test", &server.uri())
        .expect("client");
    let demo = client.demographics("San Francisco").await.expect("request");
    assert!(demo.is_none());
}
