use nc_core::Article;
use serde::Serialize;

/// Trims and cuts `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

/// Compact article view sent to the review services (credibility, consistency).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub snippet: String,
}

impl ReviewArticle {
    pub const SNIPPET_CHARS: usize = 800;

    pub fn new(article: &Article, title_chars: usize) -> Self {
        Self {
            title: truncate_chars(&article.title, title_chars),
            url: article.url.clone(),
            source: article.source.clone(),
            published_at: article.published_at.clone(),
            snippet: truncate_chars(&article.content, Self::SNIPPET_CHARS),
        }
    }
}

pub fn review_payload(articles: &[Article], cap: usize, title_chars: usize) -> serde_json::Result<String> {
    let compact: Vec<ReviewArticle> = articles
        .iter()
        .take(cap)
        .map(|a| ReviewArticle::new(a, title_chars))
        .collect();
    serde_json::to_string_pretty(&compact)
}
