use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::Html;
use tracing::debug;

use crate::dates;
use crate::types::Article;

/// A `<` that would open a tag, or an `&` that would start a character
/// reference, if the text were read as HTML again.
static MARKUP_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z/!?]|&[A-Za-z0-9#]").unwrap());

/// Strips markup in a single parse and collapses whitespace runs.
///
/// Decoded text that would read as markup again (`a<b`, `&amp;lt;`) is
/// written back escaped, so the output is a fixed point: cleaning it again
/// returns it unchanged and no literal text is lost.
pub fn clean_html(raw: &str) -> String {
    if !raw.contains('<') && !raw.contains('&') {
        return collapse_whitespace(raw);
    }
    escape_markup_like(&collapse_whitespace(&strip_markup(raw))).into_owned()
}

fn strip_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_markup_like(text: &str) -> Cow<'_, str> {
    MARKUP_LIKE_RE.replace_all(text, |caps: &Captures| {
        let (head, tail) = caps[0].split_at(1);
        let escaped = if head == "<" { "&lt;" } else { "&amp;" };
        format!("{}{}", escaped, tail)
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans content and title, and canonicalizes the publication date.
pub fn normalize_article(article: &mut Article) {
    article.content = clean_html(&article.content);
    article.title = clean_html(&article.title);

    let canonical = dates::canonicalize(&article.published_at);
    if canonical != article.published_at {
        debug!(
            "Reconciled date {:?} -> {:?} for {}",
            article.published_at, canonical, article.url
        );
        article.published_at = canonical;
    }
}

pub fn normalize_articles(mut articles: Vec<Article>) -> Vec<Article> {
    articles.iter_mut().for_each(normalize_article);
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::UNKNOWN_DATE;

    fn article(content: &str, published_at: &str) -> Article {
        Article::new("Title", content, "https://example.com/a", "example.com", published_at)
    }

    #[test]
    fn test_clean_html_strips_tags_and_whitespace() {
        let raw = "<p>ISRO   confirms</p>\n<p><b>landing</b> near the\tsouth pole</p>";
        assert_eq!(clean_html(raw), "ISRO confirms landing near the south pole");
    }

    #[test]
    fn test_clean_html_decodes_entities() {
        assert_eq!(clean_html("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(clean_html("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn test_clean_html_never_leaves_tags() {
        let raw = "<div>&lt;script&gt;alert(1)&lt;/script&gt; text</div>";
        let cleaned = clean_html(raw);
        assert!(!cleaned.contains("<script>"), "{cleaned}");
        assert!(cleaned.contains("text"));
    }

    #[test]
    fn test_clean_html_keeps_escaped_literals() {
        let cleaned = clean_html("Use vector&lt;int&gt; items when a&lt;b holds.");
        assert_eq!(cleaned, "Use vector&lt;int> items when a&lt;b holds.");
        assert_eq!(clean_html(&cleaned), cleaned);
        assert_eq!(clean_html("<p>x &lt; 3 &amp;&amp; y</p>"), "x < 3 && y");
    }

    #[test]
    fn test_clean_html_fixed_point_on_entity_heavy_input() {
        for raw in [
            "Hi &amp;amp;amp;amp;lt;b&amp;amp;amp;amp;gt;bold",
            "&lt;b&gt;bold&lt;/b&gt; &amp;nbsp; &#60;i&#62;",
            "<div>&lt;!-- note --&gt; &amp;copy 2023</div>",
            "R&D spent &pound;5m; a<b and c > d",
        ] {
            let once = clean_html(raw);
            assert_eq!(clean_html(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let batch = vec![
            article("<a href=\"x\">Rover</a> lands &amp; rolls", "20230823123000"),
            article("plain text", "Wed, 23 Aug 2023 12:30:00 GMT"),
            article("  ", "not a date"),
            article("Launch &amp;amp;lt;delayed&amp;amp;gt; when fuel&lt;limit", "2023-07-14"),
        ];
        let once = normalize_articles(batch);
        let twice = normalize_articles(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_dates() {
        let normalized = normalize_articles(vec![
            article("x", "20230823123000"),
            article("x", "garbled"),
            article("x", "2023-08-23T12:30:00Z"),
        ]);
        assert_eq!(normalized[0].published_at, "2023-08-23");
        assert_eq!(normalized[1].published_at, UNKNOWN_DATE);
        assert_eq!(normalized[2].published_at, "2023-08-23T12:30:00Z");
    }
}
