use async_trait::async_trait;
use nc_core::{Article, Config, Error, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::fields::{find_records, first_str};
use super::{Source, SourceKind, SourceMetadata};

const RECORD_KEYS: [&str; 3] = ["articles", "articleslist", "data"];
const TITLE_KEYS: [&str; 3] = ["title", "seentitle", "title_full"];
const DATE_KEYS: [&str; 3] = ["seendate", "date", "published"];
const CONTENT_KEYS: [&str; 3] = ["excerpt", "body", "snippet"];
const URL_KEYS: [&str; 2] = ["url", "sourceurl"];
const DOMAIN_KEYS: [&str; 2] = ["domain", "domainname"];

/// GDELT DOC 2.0 article list.
pub struct GdeltSource {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl GdeltSource {
    const BASE_URL: &'static str = "https://api.gdeltproject.org/api/v2/doc/doc";

    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: Self::BASE_URL.to_string(),
            max_results: config.gdelt_max,
        }
    }

    /// Points the adapter at another endpoint, such as a mirror or a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn search(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        let max_records = max.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", query),
                ("mode", "artlist"),
                ("format", "json"),
                ("maxrecords", max_records.as_str()),
                ("sort", "date"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                source_name: "GDELT".to_string(),
                reason: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            });
        }
        parse_response(&body, max)
    }
}

/// Reads an artlist body. GDELT answers some failures with plain text and
/// has renamed fields over time, so every field has fallbacks.
pub fn parse_response(body: &str, max: usize) -> Result<Vec<Article>> {
    let data: Value = serde_json::from_str(body).map_err(|e| Error::SourceUnavailable {
        source_name: "GDELT".to_string(),
        reason: format!("non-JSON response ({}): {}", e, body.chars().take(200).collect::<String>()),
    })?;

    let Some(records) = find_records(&data, &RECORD_KEYS) else {
        if let Some(object) = data.as_object() {
            debug!("GDELT JSON keys: {:?}", object.keys().collect::<Vec<_>>());
        }
        return Ok(Vec::new());
    };

    Ok(records
        .iter()
        .take(max)
        .map(|record| {
            Article::new(
                first_str(record, &TITLE_KEYS),
                first_str(record, &CONTENT_KEYS),
                first_str(record, &URL_KEYS),
                first_str(record, &DOMAIN_KEYS),
                first_str(record, &DATE_KEYS),
            )
        })
        .collect())
}

#[async_trait]
impl Source for GdeltSource {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "GDELT".to_string(),
            kind: SourceKind::News,
            url: self.base_url.clone(),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["gdelt"]
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn fetch(&self, query: &str, max: usize) -> Result<Vec<Article>> {
        match self.search(query, max).await {
            Ok(articles) => {
                info!("🌐 GDELT returned {} articles", articles.len());
                Ok(articles)
            }
            Err(e) => {
                warn!("GDELT fetch failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gdelt_at(base_url: String, timeout: Duration) -> GdeltSource {
        GdeltSource::new(build_client(timeout).unwrap(), &Config::default()).with_base_url(base_url)
    }

    async fn serve(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_parse_artlist() {
        let body = r#"{"articles": [
            {"url": "https://a.test/1", "title": "Delhi floods", "seendate": "20230713T101500Z",
             "domain": "a.test", "language": "English"},
            {"sourceurl": "https://b.test/2", "seentitle": "Yamuna crosses danger mark",
             "date": "20230712", "domainname": "b.test", "excerpt": "Water levels rose."}
        ]}"#;
        let articles = parse_response(body, 12).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Delhi floods");
        assert_eq!(articles[0].published_at, "20230713T101500Z");
        assert_eq!(articles[0].content, "");
        assert_eq!(articles[1].url, "https://b.test/2");
        assert_eq!(articles[1].title, "Yamuna crosses danger mark");
        assert_eq!(articles[1].source, "b.test");
        assert_eq!(articles[1].content, "Water levels rose.");
    }

    #[test]
    fn test_parse_unexpected_shape_scans_for_records() {
        let body = r#"{"status": "ok", "results": [{"url": "https://c.test", "title": "Found"}]}"#;
        let articles = parse_response(body, 12).unwrap();
        assert_eq!(articles[0].title, "Found");
    }

    #[test]
    fn test_parse_caps_results() {
        let records: Vec<_> = (0..20)
            .map(|i| serde_json::json!({"url": format!("https://x/{}", i), "title": "t"}))
            .collect();
        let body = serde_json::json!({ "articles": records }).to_string();
        assert_eq!(parse_response(&body, 12).unwrap().len(), 12);
    }

    #[test]
    fn test_parse_empty_and_plain_text() {
        assert!(parse_response("{}", 12).unwrap().is_empty());
        assert!(parse_response("Timespan is too short.", 12).is_err());
    }

    #[test]
    fn test_parse_bare_array_body() {
        let body = r#"[{"url": "https://d.test/1", "title": "Bare"}]"#;
        assert_eq!(parse_response(body, 12).unwrap()[0].title, "Bare");
    }

    #[tokio::test]
    async fn test_fetch_reads_artlist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .and(query_param("mode", "artlist"))
            .and(query_param("maxrecords", "5"))
            .and(query_param("query", "Delhi floods 2023"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [{"url": "https://a.test/1", "title": "Delhi floods", "domain": "a.test"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gdelt = gdelt_at(format!("{}/doc", server.uri()), Duration::from_secs(5));
        let articles = gdelt.fetch("Delhi floods 2023", 5).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "a.test");
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_empty() {
        let server = serve(ResponseTemplate::new(500).set_body_string("internal error")).await;
        let gdelt = gdelt_at(format!("{}/doc", server.uri()), Duration::from_secs(5));
        assert!(gdelt.fetch("Delhi floods", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_plain_text_body_is_empty() {
        let server = serve(ResponseTemplate::new(200).set_body_string("Timespan is too short.")).await;
        let gdelt = gdelt_at(format!("{}/doc", server.uri()), Duration::from_secs(5));
        assert!(gdelt.fetch("Delhi floods", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_empty() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"articles": [{"url": "https://a.test/1"}]}"#)
                .set_delay(Duration::from_secs(2)),
        )
        .await;
        let gdelt = gdelt_at(format!("{}/doc", server.uri()), Duration::from_millis(100));
        assert!(gdelt.fetch("Delhi floods", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_empty() {
        let gdelt = gdelt_at("http://127.0.0.1:1/doc".to_string(), Duration::from_secs(5));
        assert!(gdelt.fetch("Delhi floods", 5).await.unwrap().is_empty());
    }
}
