use crate::types::{Article, MilestoneCandidate};

/// Verb stems that signal something happened. Matched as lowercase substrings,
/// so inflections ("landed", "announces") match too.
pub const TRIGGER_WORDS: [&str; 11] = [
    "announce",
    "launch",
    "land",
    "arrive",
    "confirm",
    "reach",
    "declare",
    "resign",
    "investigate",
    "file",
    "deploy",
];

/// Splits on `.`, `!` or `?` followed by whitespace. Terminators stay with
/// their sentence; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_i, next_c)) = chars.peek() {
                if next_c.is_whitespace() {
                    sentences.push(&text[start..next_i]);
                    start = next_i;
                }
            }
        }
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn has_trigger(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    TRIGGER_WORDS.iter().any(|t| lower.contains(t))
}

/// Scans every article's content for event-like sentences, in article order
/// then sentence order.
pub fn extract_milestones(articles: &[Article]) -> Vec<MilestoneCandidate> {
    articles
        .iter()
        .flat_map(|article| {
            split_sentences(&article.content)
                .into_iter()
                .filter(|s| has_trigger(s))
                .map(move |sentence| MilestoneCandidate {
                    sentence: sentence.to_string(),
                    published_at: article.published_at.clone(),
                    source: article.source.clone(),
                    url: article.url.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(content: &str, url: &str) -> Article {
        Article::new("t", content, url, "src", "2023-08-23")
    }

    #[test]
    fn test_split_sentences() {
        let text = "First one. Second one!  Third? Version 3.5 is out";
        assert_eq!(
            split_sentences(text),
            vec!["First one.", "Second one!", "Third?", "Version 3.5 is out"]
        );
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_single_trigger_sentence() {
        let candidates = extract_milestones(&[article(
            "The agency will announce results tomorrow.",
            "https://a",
        )]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].sentence, "The agency will announce results tomorrow.");
        assert_eq!(candidates[0].published_at, "2023-08-23");
        assert_eq!(candidates[0].url, "https://a");
    }

    #[test]
    fn test_no_trigger_no_candidate() {
        assert!(extract_milestones(&[article("It rained all day.", "https://a")]).is_empty());
    }

    #[test]
    fn test_multiple_triggers_one_candidate() {
        let candidates = extract_milestones(&[article(
            "Officials CONFIRMED the lander will launch and land on Friday.",
            "https://a",
        )]);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_order_follows_articles_then_sentences() {
        let candidates = extract_milestones(&[
            article("Rover deployed. Nothing else. Lander reached orbit.", "https://a"),
            article("Minister resigns.", "https://b"),
        ]);
        let sentences: Vec<_> = candidates.iter().map(|c| c.sentence.as_str()).collect();
        assert_eq!(
            sentences,
            vec!["Rover deployed.", "Lander reached orbit.", "Minister resigns."]
        );
        assert_eq!(candidates[2].url, "https://b");
    }
}
