//! Best-effort scraping of the ephemeral identifiers a Views AJAX request needs.
//!
//! These patterns are tied to the upstream Drupal templates. When a template
//! changes they stop matching and callers see `None`.

use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! regex {
    ($pattern:expr) => {{
        static REGEX: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).unwrap());
        &REGEX
    }};
}

/// Theme and library hints from the page's `ajaxPageState` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AjaxHints {
    pub theme: Option<String>,
    pub libraries: Option<String>,
}

/// The per-render view id, taken from the `js-view-dom-id-<64 hex>` class on
/// the view placeholder.
#[must_use]
pub fn extract_view_token(markup: &str) -> Option<String> {
    regex!(r"js-view-dom-id-([0-9a-f]{64})")
        .captures(markup)
        .map(|captures| captures[1].to_string())
}

#[must_use]
pub fn extract_ajax_hints(markup: &str) -> AjaxHints {
    let theme = regex!(r#""ajaxPageState"\s*:\s*\{[^}]*"theme"\s*:\s*"([^"]+)""#)
        .captures(markup)
        .map(|captures| captures[1].to_string());

    let libraries = regex!(r#""ajaxPageState"\s*:\s*\{[^}]*"libraries"\s*:\s*"([^"]+)""#)
        .captures(markup)
        .map(|captures| captures[1].to_string());

    AjaxHints { theme, libraries }
}
