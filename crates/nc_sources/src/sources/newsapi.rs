use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use nc_core::dates::query_year;
use nc_core::{Article, Config, Error, Result};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::fields::{first_str, nested_str};
use super::{Source, SourceKind, SourceMetadata};

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

/// Rewrites a free-text query for NewsAPI's boolean syntax: any keyword may
/// match, but a year in the query is required.
pub fn expand_query(query: &str) -> String {
    let query = query.trim();
    let keywords: Vec<&str> = KEYWORD_RE.find_iter(query).map(|m| m.as_str()).collect();
    if keywords.len() <= 1 {
        return query.to_string();
    }

    let any_keyword = keywords
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(" OR ");
    match query_year(query) {
        Some(year) => format!("({}) AND {}", any_keyword, year),
        None => format!("({})", any_keyword),
    }
}

pub struct NewsApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl fmt::Debug for NewsApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiSource")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl NewsApiSource {
    const BASE_URL: &'static str = "https://newsapi.org/v2/everything";

    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: Self::BASE_URL.to_string(),
            api_key: config.newsapi_key.clone(),
            max_results: config.newsapi_max,
        }
    }

    /// Overrides the endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn search(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("NewsAPI key is not set (NEWSAPI_KEY)".to_string()))?;

        let expanded = expand_query(query);
        debug!("NewsAPI query: {}", expanded);
        let page_size = max.to_string();
        let data: Value = self
            .client
            .get(&self.base_url)
            .header("X-Api-Key", api_key)
            .query(&[
                ("q", expanded.as_str()),
                ("searchIn", "title,description"),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        parse_response(&data)
    }
}

/// Anything but `"status": "ok"` is an error report from the API.
pub fn parse_response(data: &Value) -> Result<Vec<Article>> {
    if data.get("status").and_then(Value::as_str) != Some("ok") {
        return Err(Error::SourceUnavailable {
            source_name: "NewsAPI".to_string(),
            reason: first_str(data, &["message", "code"]),
        });
    }

    let records = data.get("articles").and_then(Value::as_array);
    Ok(records
        .into_iter()
        .flatten()
        .map(|record| {
            Article::new(
                first_str(record, &["title"]),
                first_str(record, &["content", "description"]),
                first_str(record, &["url"]),
                nested_str(record, &["source", "name"]),
                first_str(record, &["publishedAt"]),
            )
        })
        .collect())
}

#[async_trait]
impl Source for NewsApiSource {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "NewsAPI".to_string(),
            kind: SourceKind::News,
            url: self.base_url.clone(),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["newsapi"]
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn fetch(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        match self.search(query, max).await {
            Ok(articles) => {
                info!("🗞️ NewsAPI returned {} articles", articles.len());
                Ok(articles)
            }
            Err(e) => {
                warn!("NewsAPI fetch failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn keyed_source(server: &MockServer) -> NewsApiSource {
        let config = Config {
            newsapi_key: Some("test-key".to_string()),
            ..Config::default()
        };
        NewsApiSource::new(reqwest::Client::new(), &config)
            .with_base_url(format!("{}/v2/everything", server.uri()))
    }

    #[test]
    fn test_expand_query() {
        assert_eq!(
            expand_query("Delhi floods 2023"),
            r#"("Delhi" OR "floods" OR "2023") AND 2023"#
        );
        assert_eq!(expand_query("Chandrayaan-3 landing"), r#"("Chandrayaan" OR "3" OR "landing")"#);
        assert_eq!(expand_query("  Brexit "), "Brexit");
    }

    #[test]
    fn test_parse_response() {
        let data = json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"source": {"id": null, "name": "BBC News"}, "title": "Floods",
                 "description": "Short.", "content": null, "url": "https://bbc.test/1",
                 "publishedAt": "2023-07-13T08:00:00Z"},
                {"source": {"name": "Reuters"}, "title": "More floods",
                 "description": "Desc", "content": "Full text [+200 chars]", "url": "https://r.test/2"}
            ]
        });
        let articles = parse_response(&data).unwrap();
        assert_eq!(articles[0].content, "Short.");
        assert_eq!(articles[0].source, "BBC News");
        assert_eq!(articles[1].content, "Full text [+200 chars]");
        assert_eq!(articles[1].published_at, "");
    }

    #[test]
    fn test_parse_error_status() {
        let data = json!({"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."});
        let err = parse_response(&data).unwrap_err();
        assert!(err.to_string().contains("Your API key is invalid."));
    }

    #[tokio::test]
    async fn test_missing_key_is_empty_result() {
        let source = NewsApiSource::new(reqwest::Client::new(), &Config::default());
        let articles = source.fetch("anything", 10).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_key_header_and_expanded_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(header("X-Api-Key", "test-key"))
            .and(query_param("q", r#"("Delhi" OR "floods" OR "2023") AND 2023"#))
            .and(query_param("pageSize", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "articles": [{"source": {"name": "BBC News"}, "title": "Floods",
                              "description": "Short.", "url": "https://bbc.test/1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let articles = keyed_source(&server).fetch("Delhi floods 2023", 10).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "BBC News");
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."
            })))
            .mount(&server)
            .await;

        assert!(keyed_source(&server).fetch("Delhi floods", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_non_json_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
            .mount(&server)
            .await;

        assert!(keyed_source(&server).fetch("Delhi floods", 10).await.unwrap().is_empty());
    }
}
