use std::sync::Arc;

use nc_core::dates::canonical_day;
use nc_core::{Article, Config, RetryPolicy, TimelineEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::extract::{extract_json, extract_json_where, JsonShape};
use crate::outcome::ServiceOutcome;
use crate::prompt::truncate_chars;
use crate::retry::retry_on_rate_limit;
use crate::InferenceModel;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

const TITLE_CHARS: usize = 250;
const CONTENT_CHARS: usize = 1500;
const MIN_PARAGRAPH_CHARS: usize = 40;

/// Chronological event list plus a narrative paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub timeline: Vec<TimelineEvent>,
    pub summary: String,
}

impl TimelineSummary {
    pub fn unavailable() -> Self {
        Self {
            timeline: Vec::new(),
            summary: SUMMARY_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryArticle {
    title: String,
    published_at: String,
    source: String,
    url: String,
    content: String,
}

#[derive(Debug, Clone)]
pub struct TimelineSummarizer {
    model: Arc<dyn InferenceModel>,
    retry: RetryPolicy,
    batch_cap: usize,
}

impl TimelineSummarizer {
    pub fn new(model: Arc<dyn InferenceModel>, config: &Config) -> Self {
        Self {
            model,
            retry: config.retry,
            batch_cap: config.summary_batch_cap,
        }
    }

    fn build_prompt(&self, articles: &[Article], query: &str) -> serde_json::Result<String> {
        let compact: Vec<SummaryArticle> = articles
            .iter()
            .take(self.batch_cap)
            .map(|a| SummaryArticle {
                title: truncate_chars(&a.title, TITLE_CHARS),
                published_at: a.published_at.clone(),
                source: a.source.clone(),
                url: a.url.clone(),
                content: truncate_chars(&a.content, CONTENT_CHARS),
            })
            .collect();
        let payload = serde_json::to_string_pretty(&compact)?;

        Ok(format!(
            r#"You are an expert event reconstruction analyst.

Given a set of articles about a single topic, do two things:

1. Construct a chronological timeline from beginning to end.
   - Output a JSON array named "timeline"
   - Format each item as: {{"date":"YYYY-MM-DD","event":"one sentence"}}
   - Give a best-effort date; if none can be inferred use "Unknown"

2. Write a single detailed paragraph summary (3-6 sentences) describing the
   overall flow, causes, progression, turning points and final outcome.

Return ONLY a JSON object with keys "timeline" and "summary".

QUERY = "{query}"

ARTICLES JSON:
{payload}
"#
        ))
    }

    pub async fn summarize(&self, articles: &[Article], query: &str) -> ServiceOutcome<TimelineSummary> {
        let prompt = match self.build_prompt(articles, query) {
            Ok(prompt) => prompt,
            Err(e) => return ServiceOutcome::fallback(TimelineSummary::unavailable(), e.to_string()),
        };

        info!("🧠 Building timeline and summary with {}", self.model.name());
        let model = &self.model;
        let prompt = prompt.as_str();
        match retry_on_rate_limit(&self.retry, move || model.complete(prompt)).await {
            Ok(text) => match parse_summary_response(&text) {
                Some(summary) => ServiceOutcome::Success(summary),
                None => {
                    warn!("Timeline/summary reply could not be parsed");
                    ServiceOutcome::fallback(
                        TimelineSummary::unavailable(),
                        "malformed timeline/summary output",
                    )
                }
            },
            Err(e) => {
                warn!("Timeline/summary generation failed: {}", e);
                ServiceOutcome::fallback(TimelineSummary::unavailable(), e.to_string())
            }
        }
    }
}

/// Structured object first, then an embedded event array plus the last prose
/// paragraph. `None` when neither yields anything usable.
pub fn parse_summary_response(text: &str) -> Option<TimelineSummary> {
    let object = extract_json_where(text, JsonShape::Object, |v| {
        v.get("timeline").is_some() || v.get("summary").is_some()
    });
    if let Some(object) = object {
        let timeline = object.get("timeline").map(clean_timeline).unwrap_or_default();
        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        return finish(timeline, summary);
    }

    let timeline = extract_json(text, JsonShape::Array)
        .map(|v| clean_timeline(&v))
        .unwrap_or_default();
    let summary = last_paragraph(text).unwrap_or_default();
    finish(timeline, summary)
}

fn finish(timeline: Vec<TimelineEvent>, summary: &str) -> Option<TimelineSummary> {
    if timeline.is_empty() && summary.is_empty() {
        return None;
    }
    Some(TimelineSummary {
        timeline,
        summary: if summary.is_empty() {
            SUMMARY_UNAVAILABLE.to_string()
        } else {
            summary.to_string()
        },
    })
}

/// Normalizes model-produced events: text from `event` or `description`,
/// date from `date` or `publishedAt`, canonicalized to a day or `unknown`.
pub fn clean_timeline(value: &Value) -> Vec<TimelineEvent> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let event = ["event", "description"]
                .iter()
                .find_map(|k| item.get(k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|e| !e.is_empty())?;
            let date = ["date", "publishedAt"]
                .iter()
                .find_map(|k| item.get(k).and_then(Value::as_str))
                .unwrap_or_default();
            Some(TimelineEvent {
                date: canonical_day(date),
                event: event.to_string(),
            })
        })
        .collect()
}

fn last_paragraph(text: &str) -> Option<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .filter(|p| !p.starts_with('[') && !p.starts_with('{') && !p.starts_with("```"))
        .last()
}
