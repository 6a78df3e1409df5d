//! Client side of Drupal's Views AJAX protocol for the events listing.

use chrono::NaiveDate;
use mycampus_parser::{extract_ajax_hints, extract_view_token, AjaxHints, Site};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::{ParseError, Url};

use crate::error::Result;
use crate::fetch::Fetch;

pub const AJAX_PATH: &[&str] = &["views", "ajax"];

/// Substring identifying the insert command that carries the events view.
const VIEW_MARKER: &str = "view-events";

/// One entry of a `/views/ajax` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Insert {
        #[serde(default)]
        data: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl Command {
    /// Decodes a response body. Anything that isn't a list yields no
    /// commands; list items that don't decode become [`Command::Other`].
    pub fn decode_all(payload: Value) -> Vec<Command> {
        let Value::Array(items) = payload else {
            return Vec::new();
        };

        items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or(Command::Other))
            .collect()
    }
}

/// `segments` under the site's base path.
pub(crate) fn site_url(site: &Site, segments: &[&str]) -> Result<Url> {
    Ok(site
        .endpoint(segments)
        .ok_or(ParseError::RelativeUrlWithCannotBeABaseBase)?)
}

fn find_view_fragment(commands: Vec<Command>) -> Option<String> {
    commands.into_iter().find_map(|command| match command {
        Command::Insert { data: Some(data) } if data.contains(VIEW_MARKER) => Some(data),
        _ => None,
    })
}

/// Everything one AJAX request for a page of the events view depends on.
#[derive(Debug, Clone)]
pub struct PageState {
    pub view_dom_id: String,
    pub hints: AjaxHints,
    pub page_index: u32,
    pub window_start: NaiveDate,
}

impl PageState {
    /// Query parameters in wire order. Hints are appended only when asked for
    /// and present.
    pub fn params(&self, with_hints: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("_wrapper_format", "drupal_ajax".to_string()),
            ("view_name", "events".to_string()),
            ("view_display_id", "block_all".to_string()),
            ("view_args", String::new()),
            ("view_path", "/node/1756".to_string()),
            ("pager_element", "0".to_string()),
            ("view_dom_id", self.view_dom_id.clone()),
            ("_drupal_ajax", "1".to_string()),
            ("type", "All".to_string()),
            ("start_date", self.window_start.format("%Y-%m-%d").to_string()),
            ("end_date", String::new()),
            ("mycampus", "0".to_string()),
            ("page", self.page_index.to_string()),
        ];

        if with_hints {
            if let Some(theme) = &self.hints.theme {
                params.push(("ajax_page_state[theme]", theme.clone()));
            }
            if let Some(libraries) = &self.hints.libraries {
                params.push(("ajax_page_state[libraries]", libraries.clone()));
            }
        }

        params
    }
}

/// Fetches the rendered events view for one page.
///
/// `Ok(None)` means the page carried no view id, or neither the plain nor
/// the hinted request returned the view. Transport errors propagate.
pub async fn fetch_fragment<F>(
    fetcher: &F,
    site: &Site,
    page_url: &str,
    window_start: NaiveDate,
    page_index: u32,
) -> Result<Option<String>>
where
    F: Fetch + ?Sized,
{
    let page = fetcher.get_text(page_url).await?;

    let Some(view_dom_id) = extract_view_token(&page) else {
        warn!(page_url, "no view id on page");
        return Ok(None);
    };

    let state = PageState {
        view_dom_id,
        hints: extract_ajax_hints(&page),
        page_index,
        window_start,
    };

    let ajax_url = site_url(site, AJAX_PATH)?;
    let ajax_url = ajax_url.as_str();

    debug!(page_index, "requesting view fragment");
    let payload = fetcher
        .get_json(ajax_url, &state.params(false), page_url)
        .await?;
    if let Some(fragment) = find_view_fragment(Command::decode_all(payload)) {
        return Ok(Some(fragment));
    }

    warn!(page_index, hints = ?state.hints, "view missing from AJAX response, retrying with page state");
    let payload = fetcher
        .get_json(ajax_url, &state.params(true), page_url)
        .await?;
    let fragment = find_view_fragment(Command::decode_all(payload));
    if fragment.is_none() {
        warn!(page_index, "view missing from AJAX response after retry, protocol degraded");
    }

    Ok(fragment)
}
