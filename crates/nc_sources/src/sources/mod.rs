use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use nc_core::{Article, Result};
use serde::Serialize;

pub mod fields;
pub mod gdelt;
pub mod google_news;
pub mod newsapi;
pub mod rss;
pub mod wikipedia;

pub use gdelt::GdeltSource;
pub use google_news::GoogleNewsSource;
pub use newsapi::NewsApiSource;
pub use rss::FeedSource;
pub use wikipedia::WikipediaSource;

pub(crate) const USER_AGENT: &str = concat!("newscard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Current events; failures degrade to an empty result.
    News,
    /// Encyclopedic background; failures are reported to the caller.
    Historical,
    /// A single user-supplied RSS/Atom feed.
    Feed,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::News => "news",
            SourceKind::Historical => "historical",
            SourceKind::Feed => "feed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
}

#[async_trait]
pub trait Source: Send + Sync {
    fn source_metadata(&self) -> SourceMetadata;

    /// Short names accepted on the command line.
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }

    /// Result cap used when the caller does not pick one.
    fn max_results(&self) -> usize;

    /// One best-effort fetch. News adapters answer `Ok(vec![])` for every
    /// ordinary network or parsing failure.
    async fn fetch(&self, query: &str, max: usize) -> Result<Vec<Article>>;
}

/// Shared HTTP client for every adapter: one timeout, one user agent.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}
