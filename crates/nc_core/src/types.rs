use serde::{Deserialize, Serialize};

use crate::dates::{self, BucketDate};

/// One fetched document, normalized to a common shape regardless of source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    /// ISO-8601 date or timestamp, or [`crate::UNKNOWN_DATE`] once normalized.
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: url.into(),
            source: source.into(),
            published_at: published_at.into(),
            entities: Vec::new(),
        }
    }

    /// Lowercased title and content, the text relevance checks run against.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content).to_lowercase()
    }
}

/// A recognized named span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// A sentence that looks like it reports a discrete event, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneCandidate {
    pub sentence: String,
    pub published_at: String,
    pub source: String,
    pub url: String,
}

/// A dated one-sentence event, as returned by the summarization service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub event: String,
}

/// Anything the timeline assembler can bucket by date.
pub trait Dated {
    fn date_str(&self) -> &str;

    fn bucket_date(&self) -> BucketDate {
        dates::bucket_date(self.date_str())
    }
}

impl Dated for MilestoneCandidate {
    fn date_str(&self) -> &str {
        &self.published_at
    }
}

impl Dated for TimelineEvent {
    fn date_str(&self) -> &str {
        &self.date
    }
}

/// Date-keyed group of timeline entries, in extraction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket<T = MilestoneCandidate> {
    pub date: BucketDate,
    pub events: Vec<T>,
}

impl<T> TimelineBucket<T> {
    pub fn is_unknown(&self) -> bool {
        self.date == BucketDate::Unknown
    }
}
