//! Named-span annotation.
//!
//! The pipeline only depends on [`EntityAnnotator`]; a statistical NER model
//! can be plugged in behind it. [`HeuristicAnnotator`] is the bundled,
//! dependency-free implementation.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Article, Entity};

pub const DATE_LABEL: &str = "DATE";
pub const PROPER_LABEL: &str = "PROPER";

const MONTH_PATTERN: &str =
    r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.?";

static DAY_MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(\d{{1,2}})\s+({})\s+(\d{{4}})\b", MONTH_PATTERN)).unwrap()
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({})\s+(\d{{1,2}})(?:,?\s+(\d{{4}}))?\b", MONTH_PATTERN)).unwrap()
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static PROPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z0-9-]*(?:\s+[A-Z][A-Za-z0-9-]*)*").unwrap()
});

const SENTENCE_STARTERS: [&str; 14] = [
    "The", "A", "An", "This", "That", "It", "He", "She", "They", "We", "In", "On", "At", "But",
];

/// Attaches (span, label) pairs to text. Implementations must not fail:
/// anything that goes wrong yields an empty list.
pub trait EntityAnnotator: Send + Sync {
    fn annotate(&self, text: &str) -> Vec<Entity>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnnotator;

impl HeuristicAnnotator {
    pub fn new() -> Self {
        Self
    }

    fn date_spans(text: &str) -> Vec<Range<usize>> {
        let mut spans: Vec<Range<usize>> = Vec::new();
        let matches = DAY_MONTH_YEAR_RE
            .find_iter(text)
            .chain(MONTH_DAY_RE.find_iter(text))
            .chain(YEAR_RE.find_iter(text));
        for m in matches {
            let range = m.range();
            if !spans.iter().any(|s| overlaps(s, &range)) {
                spans.push(range);
            }
        }
        spans
    }
}

impl EntityAnnotator for HeuristicAnnotator {
    fn annotate(&self, text: &str) -> Vec<Entity> {
        let dates = Self::date_spans(text);
        let mut spans: Vec<(Range<usize>, &str)> =
            dates.iter().cloned().map(|r| (r, DATE_LABEL)).collect();

        for m in PROPER_RE.find_iter(text) {
            let mut range = m.range();
            match m.as_str().split_once(char::is_whitespace) {
                Some((first, rest)) if SENTENCE_STARTERS.contains(&first) => {
                    range.start = range.end - rest.trim_start().len();
                }
                None if SENTENCE_STARTERS.contains(&m.as_str()) => continue,
                _ => {}
            }
            if dates.iter().any(|d| overlaps(d, &range)) {
                continue;
            }
            spans.push((range, PROPER_LABEL));
        }

        spans.sort_by_key(|(range, _)| range.start);
        spans
            .into_iter()
            .map(|(range, label)| Entity {
                text: text[range].to_string(),
                label: label.to_string(),
            })
            .collect()
    }
}

/// Attaches entities to every article from its cleaned content.
pub fn annotate_articles(annotator: &dyn EntityAnnotator, articles: &mut [Article]) {
    for article in articles.iter_mut() {
        article.entities = annotator.annotate(&article.content);
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels<'a>(entities: &'a [Entity], label: &str) -> Vec<&'a str> {
        entities
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn test_annotates_dates_and_names() {
        let entities = HeuristicAnnotator::new()
            .annotate("The Indian Space Research Organisation landed Chandrayaan-3 on August 23, 2023.");
        assert_eq!(labels(&entities, DATE_LABEL), vec!["August 23, 2023"]);
        assert_eq!(
            labels(&entities, PROPER_LABEL),
            vec!["Indian Space Research Organisation", "Chandrayaan-3"]
        );
    }

    #[test]
    fn test_entities_in_text_order() {
        let entities = HeuristicAnnotator::new().annotate("In 1947 Nehru spoke in Delhi.");
        let texts: Vec<_> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["1947", "Nehru", "Delhi"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(HeuristicAnnotator::new().annotate("").is_empty());
    }

    #[test]
    fn test_annotate_articles() {
        let mut articles = vec![Article::new("t", "Modi visited Paris in 2023.", "u", "s", "2023-07-14")];
        annotate_articles(&HeuristicAnnotator::new(), &mut articles);
        assert_eq!(articles[0].entities.len(), 3);
    }
}
