use async_trait::async_trait;
use nc_core::dates::HISTORICAL_DATE;
use nc_core::normalize::clean_html;
use nc_core::{Article, Result};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::info;

use super::{Source, SourceKind, SourceMetadata};

const SOURCE_NAME: &str = "Wikipedia";

/// Best-matching encyclopedia page for a query. Unlike the news adapters,
/// network and HTTP failures are returned as errors.
pub struct WikipediaSource {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaSource {
    const BASE_URL: &'static str = "https://en.wikipedia.org";

    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn page_url(&self, title: &str) -> String {
        format!("{}/wiki/{}", self.base_url, title.replace(' ', "_"))
    }

    async fn search(&self, query: &str) -> Result<Option<String>> {
        let data: Value = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(best_title(&data))
    }
}

/// Title of the top search hit.
pub fn best_title(data: &Value) -> Option<String> {
    data.pointer("/query/search/0/title")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// All paragraph texts of a page, in document order.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(paragraphs) = Selector::parse("p") else {
        return String::new();
    };
    document
        .select(&paragraphs)
        .map(|p| clean_html(&p.inner_html()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Source for WikipediaSource {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: SOURCE_NAME.to_string(),
            kind: SourceKind::Historical,
            url: self.base_url.clone(),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["wikipedia", "wiki"]
    }

    fn max_results(&self) -> usize {
        1
    }

    async fn fetch(&self, query: &str, _max: usize) -> Result<Vec<Article>> {
        let Some(title) = self.search(query).await? else {
            info!("📚 Wikipedia has no page for {:?}", query);
            return Ok(Vec::new());
        };

        let page_url = self.page_url(&title);
        let html = self
            .client
            .get(&page_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        info!("📚 Wikipedia page: {}", title);

        Ok(vec![Article::new(
            title,
            paragraph_text(&html),
            page_url,
            SOURCE_NAME,
            HISTORICAL_DATE,
        )])
    }
}
