use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("No articles found from any source for \"{query}\"")]
    NoArticlesFound { query: String },

    #[error("Historical source failed: {0}")]
    HistoricalFetchFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Generative service error: {0}")]
    GenerativeService(String),

    #[error("Malformed service output: {0}")]
    MalformedServiceOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

const RATE_LIMIT_MARKERS: &[&str] = &[
    "quota",
    "429",
    "rate limit",
    "rate-limit",
    "ratelimit",
    "rate_limit",
    "resourceexhausted",
    "resource_exhausted",
    "too many requests",
];

impl Error {
    /// True when the failure looks like rate limiting or quota exhaustion.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Http(e) if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => true,
            other => {
                let msg = other.to_string().to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| msg.contains(m))
            }
        }
    }
}
