use async_trait::async_trait;
use nc_core::{Article, Config, Result};
use tracing::{info, warn};
use url::Url;

use super::rss::{parse_feed, FeedEntry};
use super::{Source, SourceKind, SourceMetadata};

const FALLBACK_PUBLISHER: &str = "Google News";

pub struct GoogleNewsSource {
    client: reqwest::Client,
    base_url: String,
    locale: String,
    max_results: usize,
}

impl GoogleNewsSource {
    const BASE_URL: &'static str = "https://news.google.com/rss/search";

    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: Self::BASE_URL.to_string(),
            locale: config.google_news_locale.clone(),
            max_results: config.google_news_max,
        }
    }

    /// Points the adapter at another endpoint, such as a mirror or a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search feed URL: `q` plus the configured edition parameters.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| nc_core::Error::Config(format!("Invalid Google News URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            for (key, value) in self.locale.split('&').filter_map(|kv| kv.split_once('=')) {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn search(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        let url = self.search_url(query)?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(parse_feed(&body, max)?.into_iter().map(to_article).collect())
    }
}

/// Google News titles end in ` - Publisher`; that suffix names the source.
pub fn publisher(title: &str) -> &str {
    title
        .rsplit_once(" - ")
        .map(|(_, p)| p.trim())
        .filter(|p| !p.is_empty())
        .unwrap_or(FALLBACK_PUBLISHER)
}

fn to_article(entry: FeedEntry) -> Article {
    let source = publisher(&entry.title).to_string();
    Article::new(entry.title, entry.summary, entry.link, source, entry.published)
}

#[async_trait]
impl Source for GoogleNewsSource {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "Google News".to_string(),
            kind: SourceKind::News,
            url: self.base_url.clone(),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["google", "google-news"]
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn fetch(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        match self.search(query, max).await {
            Ok(articles) => {
                info!("📰 Google News returned {} articles", articles.len());
                Ok(articles)
            }
            Err(e) => {
                warn!("Google News fetch failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
