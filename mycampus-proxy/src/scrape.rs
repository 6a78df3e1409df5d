use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use mycampus_parser::{
    find_next_page, localize, parse_announcements, parse_event_detail, parse_events_list,
    Announcement, EventDetail, EventSummary, Site,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::fetch::Fetch;
use crate::views;

pub const EVENTS_PATH: &[&str] = &["events"];
pub const ANNOUNCEMENTS_PATH: &[&str] = &["mycampus", "announcements"];

/// Highest page index requested before giving up on a pager that never ends.
const MAX_PAGE_INDEX: u32 = 50;

/// Lower bound of an events scrape: a calendar date for the upstream filter
/// and its local midnight for re-checking what comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub date: NaiveDate,
    pub start: DateTime<Tz>,
}

impl Window {
    #[must_use]
    pub fn new(today: NaiveDate, days_back: u32, timezone: Tz) -> Self {
        let date = today - Duration::days(i64::from(days_back));
        let midnight = date.and_time(NaiveTime::MIN);
        let start = localize(midnight, timezone)
            .unwrap_or_else(|| timezone.from_utc_datetime(&midnight));

        Self { date, start }
    }

    /// Window ending at the current date in `timezone`.
    #[must_use]
    pub fn days_back(days_back: u32, timezone: Tz) -> Self {
        let today = Utc::now().with_timezone(&timezone).date_naive();
        Self::new(today, days_back, timezone)
    }
}

pub struct Scraper<F> {
    fetcher: F,
    site: Site,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetcher: F, site: Site) -> Self {
        Self { fetcher, site }
    }

    /// Events starting no earlier than `days_back` days before today, in
    /// listing order, first occurrence of each slug only.
    pub async fn scrape_events(&self, days_back: u32) -> Result<Vec<EventSummary>> {
        self.scrape_window(Window::days_back(days_back, self.site.timezone))
            .await
    }

    pub async fn scrape_window(&self, window: Window) -> Result<Vec<EventSummary>> {
        let mut events = Vec::new();
        let mut seen = HashSet::new();
        let mut page_index = 0;
        let mut pages = 0;

        loop {
            pages += 1;
            let page_url = self.events_page_url(window.date, page_index)?;
            let Some(fragment) = views::fetch_fragment(
                &self.fetcher,
                &self.site,
                page_url.as_str(),
                window.date,
                page_index,
            )
            .await?
            else {
                break;
            };

            let page_events = parse_events_list(&self.site, &fragment);
            debug!(page_index, rows = page_events.len(), "parsed events page");

            for event in page_events {
                if event.start.is_some_and(|start| start < window.start) {
                    continue;
                }
                if !event.slug.is_empty() && seen.insert(event.slug.clone()) {
                    events.push(event);
                }
            }

            if find_next_page(&fragment).is_none() {
                break;
            }

            page_index += 1;
            if page_index > MAX_PAGE_INDEX {
                warn!(page_index, "pager still reports a next page, stopping");
                break;
            }
        }

        info!(
            count = events.len(),
            pages,
            since = %window.date,
            "scraped events"
        );
        Ok(events)
    }

    /// `Ok(None)` when the page doesn't parse as an event. Slugs that are
    /// not a single path segment are never fetched.
    pub async fn scrape_event_detail(&self, slug: &str) -> Result<Option<EventDetail>> {
        if matches!(slug, "" | "." | "..") {
            debug!(slug, "not an event slug");
            return Ok(None);
        }

        let url = self.event_url(slug)?;
        let page = self.fetcher.get_text(url.as_str()).await?;
        let detail = parse_event_detail(&self.site, &page, url.as_str());

        if detail.is_none() {
            debug!(slug, "event page did not parse");
        }
        Ok(detail)
    }

    pub async fn scrape_announcements(&self) -> Result<Vec<Announcement>> {
        let url = views::site_url(&self.site, ANNOUNCEMENTS_PATH)?;
        let page = self.fetcher.get_text(url.as_str()).await?;
        let announcements = parse_announcements(&page);

        info!(count = announcements.len(), "scraped announcements");
        Ok(announcements)
    }

    fn events_page_url(&self, window_date: NaiveDate, page_index: u32) -> Result<Url> {
        let mut url = views::site_url(&self.site, EVENTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("mycampus", "0")
            .append_pair("type", "All")
            .append_pair("start_date", &window_date.format("%Y-%m-%d").to_string())
            .append_pair("page", &page_index.to_string());

        Ok(url)
    }

    fn event_url(&self, slug: &str) -> Result<Url> {
        let mut segments = EVENTS_PATH.to_vec();
        segments.push(slug);
        views::site_url(&self.site, &segments)
    }
}
