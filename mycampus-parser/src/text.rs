use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use scraper::{ElementRef, Html};

/// Visible text of an element, whitespace collapsed to single spaces.
pub(crate) fn text_of(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of an HTML snippet. Script and style contents are dropped.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);

    fragment
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| matches!(element.name(), "script" | "style"))
            })
        })
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last path segment of `url`, ignoring trailing slashes.
#[must_use]
pub fn slug_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Attaches `timezone` to a wall-clock time. Times skipped by a DST jump move
/// forward by an hour.
#[must_use]
pub fn localize(naive: NaiveDateTime, timezone: Tz) -> Option<DateTime<Tz>> {
    timezone.from_local_datetime(&naive).earliest().or_else(|| {
        timezone
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
    })
}

/// Parses the value of a `<time datetime>` attribute into the site's zone.
///
/// Accepts RFC 3339, offset-less `YYYY-MM-DDTHH:MM[:SS[.fff]]` and bare dates.
/// Anything else is treated as missing.
#[must_use]
pub fn parse_timestamp(value: &str, timezone: Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(&timezone));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })?;

    localize(naive, timezone)
}
