pub mod cache;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod scrape;
pub mod server;
pub mod views;

pub use error::{Result, ScrapeError};
pub use fetch::{Fetch, HttpFetcher};
pub use scrape::{Scraper, Window};
