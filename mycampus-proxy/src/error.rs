use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid AJAX response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
