mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::*;
use mycampus_proxy::cache;
use mycampus_proxy::server::{router, AppState};
use mycampus_proxy::Scraper;
use serde_json::{json, Value};
use tokio::time;
use tower::ServiceExt;

const TTL: Duration = Duration::from_secs(300);

fn app(fake: &Arc<FakeSite>) -> Router {
    let config = cache::Config {
        enabled: true,
        ttl: TTL,
    };
    let state = AppState::new(Scraper::new(Arc::clone(fake), site()), &config);
    router(Arc::new(state))
}

fn listing() -> FakeSite {
    FakeSite::new(|_, _| {
        insert(fragment(
            &[row("spring-gala", None), row("career-fair", None)],
            false,
        ))
    })
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = app(&Arc::new(listing()));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "ok": true }));
}

#[tokio::test]
async fn events_are_served_from_cache_per_window() {
    let fake = Arc::new(listing());
    let app = app(&fake);

    let (status, body) = get(&app, "/events?days_back=7").await;
    assert_eq!(status, StatusCode::OK);
    let events = json_body(&body);
    assert_eq!(events[0]["slug"], "spring-gala");
    assert_eq!(events[1]["url"], "https://www.stfx.ca/events/career-fair");
    assert_eq!(fake.listing_fetches(), 1);

    let (status, again) = get(&app, "/events?days_back=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, body);
    assert_eq!(fake.listing_fetches(), 1);

    get(&app, "/events").await;
    assert_eq!(fake.listing_fetches(), 1);

    get(&app, "/events?days_back=3").await;
    assert_eq!(fake.listing_fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn events_are_refetched_after_ttl() {
    let fake = Arc::new(listing());
    let app = app(&fake);

    get(&app, "/events?days_back=7").await;
    time::advance(TTL - Duration::from_secs(1)).await;
    get(&app, "/events?days_back=7").await;
    assert_eq!(fake.listing_fetches(), 1);

    time::advance(Duration::from_secs(2)).await;
    get(&app, "/events?days_back=7").await;
    assert_eq!(fake.listing_fetches(), 2);
}

#[tokio::test]
async fn days_back_out_of_range_is_rejected() {
    let fake = Arc::new(listing());
    let app = app(&fake);

    for uri in ["/events?days_back=-1", "/events?days_back=366"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "days_back must be between 0 and 365");
    }

    let (status, _) = get(&app, "/events?days_back=365").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.listing_fetches(), 1);
}

#[tokio::test]
async fn failed_events_scrape_is_a_server_error_and_not_cached() {
    let mut fake = listing();
    fake.fail_ajax = true;
    let fake = Arc::new(fake);
    let app = app(&fake);

    for _ in 0..2 {
        let (status, body) = get(&app, "/events?days_back=7").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to scrape upstream site");
    }
    assert_eq!(fake.listing_fetches(), 2);
}

#[tokio::test]
async fn event_detail_is_cached_by_slug() {
    let mut fake = listing();
    fake.pages.insert(
        "https://www.stfx.ca/events/winter-convocation".to_string(),
        CONVOCATION_PAGE.to_string(),
    );
    let fake = Arc::new(fake);
    let app = app(&fake);

    for _ in 0..2 {
        let (status, body) = get(&app, "/events/winter-convocation").await;
        assert_eq!(status, StatusCode::OK);
        let detail = json_body(&body);
        assert_eq!(detail["title"], "Winter Convocation");
        assert_eq!(detail["slug"], "winter-convocation");
    }
    assert_eq!(fake.fetches("https://www.stfx.ca/events/winter-convocation"), 1);
}

#[tokio::test]
async fn unparsable_event_is_not_found_and_not_cached() {
    let mut fake = listing();
    fake.pages.insert(
        "https://www.stfx.ca/events/moved".to_string(),
        MOVED_PAGE.to_string(),
    );
    let fake = Arc::new(fake);
    let app = app(&fake);

    for _ in 0..2 {
        let (status, body) = get(&app, "/events/moved").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Event not found or could not parse");
    }
    assert_eq!(fake.fetches("https://www.stfx.ca/events/moved"), 2);
}

#[tokio::test]
async fn dot_segment_slug_is_not_found() {
    let fake = Arc::new(listing());
    let app = app(&fake);

    let (status, _) = get(&app, "/events/%2E%2E").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(fake.page_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_event_page_is_a_server_error() {
    let fake = Arc::new(listing());
    let app = app(&fake);

    let (status, body) = get(&app, "/events/missing").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to scrape upstream site");
}

#[tokio::test]
async fn announcements_are_cached() {
    let mut fake = listing();
    fake.pages.insert(
        "https://www.stfx.ca/mycampus/announcements".to_string(),
        ANNOUNCEMENTS_PAGE.to_string(),
    );
    let fake = Arc::new(fake);
    let app = app(&fake);

    for _ in 0..2 {
        let (status, body) = get(&app, "/announcements").await;
        assert_eq!(status, StatusCode::OK);
        let announcements = json_body(&body);
        assert_eq!(announcements[0]["headline"], "Snow day");
        assert_eq!(announcements[0]["is_new"], true);
    }
    assert_eq!(fake.fetches("https://www.stfx.ca/mycampus/announcements"), 1);
}
