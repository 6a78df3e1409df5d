mod parser;
mod structs;
mod text;
mod token;

pub use parser::{find_next_page, parse_announcements, parse_event_detail, parse_events_list};
pub use structs::{Announcement, EventDetail, EventSummary, Site};
pub use text::{html_to_text, localize, parse_timestamp, slug_from_url};
pub use token::{extract_ajax_hints, extract_view_token, AjaxHints};
