use async_trait::async_trait;
use nc_core::normalize::clean_html;
use nc_core::{Article, Error, Result};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::{Source, SourceKind, SourceMetadata};

const PAGE_TEXT_CHARS: usize = 3000;

/// Source-agnostic view of one RSS/Atom entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: String,
}

/// Parses an RSS, Atom or JSON feed body into at most `max` entries, in feed
/// order. Entries without a link are skipped.
pub fn parse_feed(body: &[u8], max: usize) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| Error::SourceUnavailable {
        source_name: "feed".to_string(),
        reason: format!("unparsable feed: {}", e),
    })?;

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            let summary = entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            Some(FeedEntry {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                summary,
                link,
                published: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            })
        })
        .take(max)
        .collect())
}

pub fn host_of(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// Visible text of an HTML page's body, capped.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    document
        .select(&body)
        .next()
        .map(|el| clean_html(&el.inner_html()))
        .unwrap_or_default()
        .chars()
        .take(PAGE_TEXT_CHARS)
        .collect()
}

/// Any RSS/Atom feed URL. Each entry's linked page is fetched for fuller
/// text, falling back to the entry summary. A feed is its own selection, so
/// the query is not used.
pub struct FeedSource {
    client: reqwest::Client,
    feed_url: String,
    max_results: usize,
}

impl FeedSource {
    pub const DEFAULT_MAX: usize = 5;

    pub fn new(client: reqwest::Client, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
            max_results: Self::DEFAULT_MAX,
        }
    }

    async fn fetch_feed(&self, max: usize) -> Result<Vec<FeedEntry>> {
        let response = self.client.get(&self.feed_url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_feed(&body, max)
    }

    async fn linked_text(&self, link: &str) -> Option<String> {
        let response = self.client.get(link).send().await.ok()?;
        let html = response.error_for_status().ok()?.text().await.ok()?;
        Some(page_text(&html)).filter(|t| !t.is_empty())
    }
}

#[async_trait]
impl Source for FeedSource {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "RSS feed".to_string(),
            kind: SourceKind::Feed,
            url: self.feed_url.clone(),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["feed", "rss"]
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn fetch(&self, _query: &str, max: usize) -> Result<Vec<Article>> {
        let entries = match self.fetch_feed(max).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Feed {} failed: {}", self.feed_url, e);
                return Ok(Vec::new());
            }
        };
        info!("📡 {} entries from {}", entries.len(), self.feed_url);

        let mut articles = Vec::with_capacity(entries.len());
        for entry in entries {
            let content = match self.linked_text(&entry.link).await {
                Some(text) => text,
                None => {
                    debug!("Using feed summary for {}", entry.link);
                    entry.summary.chars().take(PAGE_TEXT_CHARS).collect()
                }
            };
            articles.push(Article::new(
                entry.title,
                content,
                entry.link.clone(),
                host_of(&entry.link),
                entry.published,
            ));
        }
        Ok(articles)
    }
}
