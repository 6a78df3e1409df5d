use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mycampus_parser::{Announcement, EventDetail, EventSummary};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::cache::{self, Cache};
use crate::error::ScrapeError;
use crate::fetch::Fetch;
use crate::scrape::Scraper;

const MAX_DAYS_BACK: i64 = 365;

pub struct AppState<F> {
    scraper: Scraper<F>,
    events: Cache<Vec<EventSummary>>,
    details: Cache<EventDetail>,
    announcements: Cache<Vec<Announcement>>,
}

impl<F: Fetch> AppState<F> {
    pub fn new(scraper: Scraper<F>, config: &cache::Config) -> Self {
        Self {
            scraper,
            events: Cache::new(config),
            details: Cache::new(config),
            announcements: Cache::new(config),
        }
    }
}

pub fn router<F: Fetch + 'static>(state: Arc<AppState<F>>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "ok": true })) }))
        .route("/events", get(handle_events::<F>))
        .route("/events/:slug", get(handle_event_detail::<F>))
        .route("/announcements", get(handle_announcements::<F>))
        .with_state(state)
}

fn default_days_back() -> i64 {
    7
}

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default = "default_days_back")]
    days_back: i64,
}

fn days_back(value: i64) -> Option<u32> {
    if (0..=MAX_DAYS_BACK).contains(&value) {
        u32::try_from(value).ok()
    } else {
        None
    }
}

fn scrape_failed(err: ScrapeError) -> Response {
    error!("scrape failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to scrape upstream site").into_response()
}

async fn handle_events<F: Fetch>(
    State(state): State<Arc<AppState<F>>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let Some(days_back) = days_back(query.days_back) else {
        return (
            StatusCode::BAD_REQUEST,
            "days_back must be between 0 and 365",
        )
            .into_response();
    };

    match state
        .events
        .memoize(format!("events:{days_back}"), || {
            state.scraper.scrape_events(days_back)
        })
        .await
    {
        Ok(events) => Json(events.as_ref()).into_response(),
        Err(err) => scrape_failed(err),
    }
}

async fn handle_event_detail<F: Fetch>(
    State(state): State<Arc<AppState<F>>>,
    Path(slug): Path<String>,
) -> Response {
    match state
        .details
        .memoize_some(format!("event:{slug}"), || {
            state.scraper.scrape_event_detail(&slug)
        })
        .await
    {
        Ok(Some(detail)) => Json(detail.as_ref()).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            "Event not found or could not parse",
        )
            .into_response(),
        Err(err) => scrape_failed(err),
    }
}

async fn handle_announcements<F: Fetch>(State(state): State<Arc<AppState<F>>>) -> Response {
    match state
        .announcements
        .memoize("announcements".to_string(), || {
            state.scraper.scrape_announcements()
        })
        .await
    {
        Ok(announcements) => Json(announcements.as_ref()).into_response(),
        Err(err) => scrape_failed(err),
    }
}
