use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::text::{html_to_text, parse_timestamp, slug_from_url, text_of};
use crate::{Announcement, EventDetail, EventSummary, Site};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

/// Parses one page of the rendered events view. Rows without a linked title
/// are skipped.
pub fn parse_events_list<S: AsRef<str>>(site: &Site, fragment: S) -> Vec<EventSummary> {
    let html = Html::parse_fragment(fragment.as_ref());

    html.select(selector!("div.views-row"))
        .filter_map(|row| parse_event_row(site, row))
        .collect()
}

fn parse_event_row(site: &Site, row: ElementRef) -> Option<EventSummary> {
    let link = row.select(selector!(".views-field-title a[href]")).next()?;
    let title = text_of(link);
    let url = link
        .value()
        .attr("href")
        .and_then(|href| site.absolute(href))
        .unwrap_or_default();
    let slug = slug_from_url(&url);

    let times = row
        .select(selector!(".views-field-field-dates time[datetime]"))
        .filter_map(|time| time.value().attr("datetime"))
        .collect::<Vec<_>>();

    let start = times
        .first()
        .and_then(|value| parse_timestamp(value, site.timezone));
    let end = times
        .get(1)
        .and_then(|value| parse_timestamp(value, site.timezone));

    let location = first_text(row, selector!(".views-field-field-location .field-content"));
    let event_type = first_text(row, selector!(".views-field-field-event-type .field-content"));
    let teaser = first_text(row, selector!(".views-field-body .field-content"));

    let image_url = row
        .select(selector!("img[src]"))
        .next()
        .and_then(|image| site.absolute(image.value().attr("src")?));

    Some(EventSummary {
        title,
        url,
        slug,
        start,
        end,
        location,
        event_type,
        teaser,
        image_url,
    })
}

/// Parses a full event page. Returns `None` unless both a title heading and
/// the event article are present.
pub fn parse_event_detail<S: AsRef<str>>(
    site: &Site,
    page: S,
    canonical_url: &str,
) -> Option<EventDetail> {
    let html = Html::parse_document(page.as_ref());

    let title = [
        selector!("h1.page-title .field--name-title"),
        selector!("h1.page-title"),
        selector!("h1"),
    ]
    .into_iter()
    .find_map(|selector| html.select(selector).next())
    .map(text_of)?;

    let article = html.select(selector!("article.node--type-event")).next()?;

    let event_type = first_text(article, selector!(".field--name-field-event-type"));
    let location = first_text(article, selector!(".field--name-field-custom-location"));

    // Multi-day events repeat the same value in adjacent <time> elements.
    let mut stamps: Vec<&str> = Vec::new();
    for value in article
        .select(selector!(".field--name-field-dates time[datetime]"))
        .filter_map(|time| time.value().attr("datetime"))
    {
        if !value.is_empty() && stamps.last() != Some(&value) {
            stamps.push(value);
        }
    }

    let start = stamps
        .first()
        .and_then(|value| parse_timestamp(value, site.timezone));
    let end = (stamps.len() >= 2)
        .then(|| stamps.last())
        .flatten()
        .and_then(|value| parse_timestamp(value, site.timezone));

    let image_url = article
        .select(selector!(".field--name-field-image img[src]"))
        .next()
        .and_then(|image| site.absolute(image.value().attr("src")?));

    let (body_html, body_text) = body(article.select(selector!(".field--name-body")).next());

    Some(EventDetail {
        title,
        url: canonical_url.to_string(),
        slug: slug_from_url(canonical_url),
        start,
        end,
        location,
        event_type,
        body_text,
        body_html,
        image_url,
    })
}

/// Parses the announcements page. Articles without a headline are skipped.
pub fn parse_announcements<S: AsRef<str>>(page: S) -> Vec<Announcement> {
    let html = Html::parse_document(page.as_ref());

    html.select(selector!("article.node--type-announcement"))
        .filter_map(|article| {
            let headline = first_text(
                article,
                selector!(".field--name-field-announcement-headline"),
            )?;
            let is_new = article.select(selector!(".new-sign")).next().is_some();
            let (body_html, body_text) = body(
                article
                    .select(selector!(".announcement-content-full .field--name-body"))
                    .next(),
            );

            Some(Announcement {
                headline,
                body_text,
                body_html,
                is_new,
            })
        })
        .collect()
}

/// The href of the view's "next page" link, if it has one.
pub fn find_next_page<S: AsRef<str>>(fragment: S) -> Option<String> {
    let html = Html::parse_fragment(fragment.as_ref());

    [
        selector!("li.pager__item--next a[href]"),
        selector!("a[rel='next'][href]"),
    ]
    .into_iter()
    .filter_map(|selector| html.select(selector).next())
    .filter_map(|anchor| anchor.value().attr("href"))
    .find(|href| !href.is_empty())
    .map(str::to_string)
}

fn first_text(element: ElementRef, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(text_of)
}

fn body(element: Option<ElementRef>) -> (Option<String>, Option<String>) {
    let Some(element) = element else {
        return (None, None);
    };

    let html = element.html();
    let text = html_to_text(&html);
    (Some(html), Some(text))
}
