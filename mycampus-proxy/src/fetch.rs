use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const MAX_REDIRECTS: usize = 10;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const AJAX_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const ACCEPT_LANGUAGE: &str = "en-CA,en;q=0.9";

/// The transport the scrapers run on. Non-success statuses are errors.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Issues an XHR-style GET with `params` as the query string, in order.
    async fn get_json(&self, url: &str, params: &[(&str, String)], referer: &str) -> Result<Value>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn get_text(&self, url: &str) -> Result<String> {
        (**self).get_text(url).await
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)], referer: &str) -> Result<Value> {
        (**self).get_json(url, params, referer).await
    }
}

/// [`Fetch`] over a pooled reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(HTML_ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(ScrapeError::Status {
        url: response.url().to_string(),
        status: status.as_u16(),
    })
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET page");
        let response = check_status(self.client.get(url).send().await?)?;
        Ok(response.text().await?)
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)], referer: &str) -> Result<Value> {
        debug!(url, referer, "GET ajax");
        let response = self
            .client
            .get(url)
            .query(params)
            .header(header::ACCEPT, AJAX_ACCEPT)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, referer)
            .send()
            .await?;

        let body = check_status(response)?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
