use tracing::{debug, info};

use crate::types::Article;

/// Lowercased query words plus the year token the query pins, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    pub words: Vec<String>,
    pub year: Option<String>,
}

impl QueryTerms {
    pub fn parse(query: &str) -> Self {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let year = words
            .iter()
            .rev()
            .find(|w| w.len() == 4 && w.bytes().all(|b| b.is_ascii_digit()))
            .cloned();
        Self { words, year }
    }

    /// Number of query words appearing as substrings of `text`.
    pub fn keyword_hits(&self, text: &str) -> usize {
        self.words.iter().filter(|w| text.contains(w.as_str())).count()
    }

    pub fn is_relevant(&self, article: &Article) -> bool {
        let text = article.searchable_text();
        if let Some(year) = &self.year {
            if !text.contains(year.as_str()) {
                return false;
            }
        }
        self.keyword_hits(&text) >= 1
    }
}

/// Keeps topically relevant articles, or the whole batch if none qualify.
pub fn filter_relevant(query: &str, articles: Vec<Article>) -> Vec<Article> {
    let terms = QueryTerms::parse(query);
    let total = articles.len();
    let (relevant, rejected): (Vec<_>, Vec<_>) =
        articles.into_iter().partition(|a| terms.is_relevant(a));

    if relevant.is_empty() {
        debug!("Relevance filter rejected all {} articles; keeping unfiltered batch", total);
        return rejected;
    }

    info!("🔎 Kept {}/{} relevant articles", relevant.len(), total);
    relevant
}
