use chrono::DateTime;
use chrono_tz::Tz;
use url::Url;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Where the scraped pages come from and which zone their timestamps live in.
#[derive(Debug, Clone)]
pub struct Site {
    pub base_url: Url,
    pub timezone: Tz,
}

impl Site {
    #[must_use]
    pub fn new(base_url: Url, timezone: Tz) -> Self {
        Self { base_url, timezone }
    }

    /// Resolves `href` against the base URL. Empty references resolve to nothing.
    #[must_use]
    pub fn absolute(&self, href: &str) -> Option<String> {
        if href.is_empty() {
            return None;
        }

        self.base_url.join(href).ok().map(String::from)
    }

    /// Appends `segments` to the base URL's own path, percent-encoding each
    /// one. `.` and `..` segments are skipped. Fails only for base URLs that
    /// can't carry a path, like `mailto:`.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);

        Some(url)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventSummary {
    pub title: String,
    pub url: String,
    pub slug: String,
    pub start: Option<DateTime<Tz>>,
    pub end: Option<DateTime<Tz>>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub teaser: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventDetail {
    pub title: String,
    pub url: String,
    pub slug: String,
    pub start: Option<DateTime<Tz>>,
    pub end: Option<DateTime<Tz>>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Announcement {
    pub headline: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub is_new: bool,
}
