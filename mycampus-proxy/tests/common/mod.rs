#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono_tz::America::Halifax;
use mycampus_parser::{EventSummary, Site};
use mycampus_proxy::{Fetch, Result, ScrapeError};
use serde_json::{json, Value};
use url::Url;

pub const TOKEN: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

type AjaxHandler = Box<dyn Fn(u32, bool) -> Value + Send + Sync>;

pub struct AjaxRequest {
    pub url: String,
    pub referer: String,
    pub params: Vec<(String, String)>,
}

impl AjaxRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// In-memory stand-in for the upstream site.
///
/// Any URL with an `/events?` listing query gets the listing shell. Other
/// pages come from `pages` and are a 404 when missing.
pub struct FakeSite {
    pub shell: String,
    pub pages: HashMap<String, String>,
    pub ajax: AjaxHandler,
    pub fail_ajax: bool,
    pub page_fetches: AtomicUsize,
    pub page_requests: Mutex<Vec<String>>,
    pub ajax_requests: Mutex<Vec<AjaxRequest>>,
}

impl FakeSite {
    pub fn new(ajax: impl Fn(u32, bool) -> Value + Send + Sync + 'static) -> Self {
        Self {
            shell: shell(Some(TOKEN)),
            pages: HashMap::new(),
            ajax: Box::new(ajax),
            fail_ajax: false,
            page_fetches: AtomicUsize::new(0),
            page_requests: Mutex::new(Vec::new()),
            ajax_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn listing_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    /// How many times `url` was fetched as a plain page.
    pub fn fetches(&self, url: &str) -> usize {
        self.page_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| *requested == url)
            .count()
    }
}

#[async_trait]
impl Fetch for FakeSite {
    async fn get_text(&self, url: &str) -> Result<String> {
        if url.contains("/events?") {
            self.page_fetches.fetch_add(1, Ordering::SeqCst);
            return Ok(self.shell.clone());
        }

        self.page_requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(ScrapeError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)], referer: &str) -> Result<Value> {
        let request = AjaxRequest {
            url: url.to_string(),
            referer: referer.to_string(),
            params: params
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        };
        let page = request.param("page").and_then(|page| page.parse().ok()).unwrap_or(0);
        let hinted = request.param("ajax_page_state[theme]").is_some();
        self.ajax_requests.lock().unwrap().push(request);

        if self.fail_ajax {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        Ok((self.ajax)(page, hinted))
    }
}

pub fn site() -> Site {
    site_at("https://www.stfx.ca")
}

pub fn site_at(base: &str) -> Site {
    Site::new(Url::parse(base).unwrap(), Halifax)
}

pub fn shell(token: Option<&str>) -> String {
    let placeholder = token
        .map(|token| format!(r#"<div class="views-element-container js-view-dom-id-{token}"></div>"#))
        .unwrap_or_default();

    format!(
        r#"<html><head><script type="application/json" data-drupal-selector="drupal-settings-json">{{"ajaxPageState":{{"libraries":"stfx/global","theme":"stfx"}}}}</script></head><body>{placeholder}</body></html>"#
    )
}

pub fn row(slug: &str, start: Option<&str>) -> String {
    let dates = start
        .map(|start| {
            format!(r#"<div class="views-field views-field-field-dates"><time datetime="{start}">when</time></div>"#)
        })
        .unwrap_or_default();

    format!(
        r#"<div class="views-row"><div class="views-field views-field-title"><a href="/events/{slug}">{slug}</a></div>{dates}</div>"#
    )
}

pub fn fragment(rows: &[String], next: bool) -> String {
    let pager = if next {
        r#"<ul class="pager"><li class="pager__item pager__item--next"><a href="?page=next">Next</a></li></ul>"#
    } else {
        ""
    };

    format!(
        r#"<div class="view view-events js-view-dom-id-{TOKEN}"><div class="view-content">{}</div>{pager}</div>"#,
        rows.concat()
    )
}

pub fn insert(fragment: String) -> Value {
    json!([
        {"command": "settings", "settings": {}, "merge": true},
        {"command": "insert", "method": "replaceWith", "selector": ".js-view-dom-id", "data": fragment},
    ])
}

pub fn slugs(events: &[EventSummary]) -> Vec<&str> {
    events.iter().map(|event| event.slug.as_str()).collect()
}

pub const CONVOCATION_PAGE: &str = r#"<html><body><h1>Winter Convocation</h1>
   <article class="node--type-event">
     <div class="field--name-field-dates"><time datetime="2025-12-06T14:00:00Z">Dec 6</time></div>
     <div class="field--name-body"><p>Caps and gowns.</p></div>
   </article></body></html>"#;

pub const MOVED_PAGE: &str = "<html><body><h1>Page moved</h1></body></html>";

pub const ANNOUNCEMENTS_PAGE: &str = r#"<html><body>
     <article class="node--type-announcement">
       <div class="field--name-field-announcement-headline">Snow day</div>
       <span class="new-sign">New</span>
     </article>
   </body></html>"#;
