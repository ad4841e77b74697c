use std::fmt;
use std::sync::Arc;

use nc_core::{Article, Config, RetryPolicy, TimelineEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::extract::{extract_json, JsonShape};
use crate::outcome::ServiceOutcome;
use crate::prompt::review_payload;
use crate::retry::retry_on_rate_limit;
use crate::InferenceModel;

pub const PARSE_FAILURE_NOTE: &str = "Unable to analyze due to parsing error.";
pub const MISSING_RESULT_NOTE: &str = "No analysis returned for this event.";

const TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Unrecognised tags read as `Medium`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

/// Cross-source agreement on one timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConsistency {
    pub date: String,
    pub event: String,
    pub is_consistent: bool,
    pub agreement_points: Vec<String>,
    pub discrepancies: Vec<String>,
    pub severity: Severity,
}

impl EventConsistency {
    pub fn unverified(event: &TimelineEvent, note: &str) -> Self {
        Self {
            date: event.date.clone(),
            event: event.event.clone(),
            is_consistent: false,
            agreement_points: Vec::new(),
            discrepancies: vec![note.to_string()],
            severity: Severity::Medium,
        }
    }

    fn from_value(event: &TimelineEvent, value: &Value) -> Self {
        let strings = |key: &str| -> Vec<String> {
            match value.get(key) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
                _ => Vec::new(),
            }
        };
        let is_consistent = match value.get("is_consistent") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        Self {
            date: event.date.clone(),
            event: event.event.clone(),
            is_consistent,
            agreement_points: strings("agreement_points"),
            discrepancies: strings("discrepancies"),
            severity: value
                .get("severity")
                .and_then(Value::as_str)
                .map(Severity::parse)
                .unwrap_or(Severity::Medium),
        }
    }
}

/// Lines results up with `timeline` by position. Events the reply does not
/// cover are reported unverified. `None` when no array can be recovered.
pub fn parse_consistency(text: &str, timeline: &[TimelineEvent]) -> Option<Vec<EventConsistency>> {
    let value = extract_json(text, JsonShape::Array)?;
    let items = value.as_array()?;
    Some(
        timeline
            .iter()
            .enumerate()
            .map(|(i, event)| match items.get(i) {
                Some(item) if item.is_object() => EventConsistency::from_value(event, item),
                _ => EventConsistency::unverified(event, MISSING_RESULT_NOTE),
            })
            .collect(),
    )
}

pub struct DivergenceAnalyzer {
    model: Arc<dyn InferenceModel>,
    retry: RetryPolicy,
    batch_cap: usize,
}

impl fmt::Debug for DivergenceAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DivergenceAnalyzer")
            .field("model", &self.model.name())
            .field("batch_cap", &self.batch_cap)
            .finish()
    }
}

impl Clone for DivergenceAnalyzer {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            retry: self.retry,
            batch_cap: self.batch_cap,
        }
    }
}

impl DivergenceAnalyzer {
    pub fn new(model: Arc<dyn InferenceModel>, config: &Config) -> Self {
        Self {
            model,
            retry: config.retry,
            batch_cap: config.review_batch_cap,
        }
    }

    fn build_prompt(&self, timeline: &[TimelineEvent], articles: &[Article]) -> serde_json::Result<String> {
        let timeline_json = serde_json::to_string_pretty(timeline)?;
        let articles_json = review_payload(articles, self.batch_cap, TITLE_CHARS)?;
        Ok(format!(
            r#"You are a cross-source fact consistency evaluator.

Given:

TIMELINE:
{timeline_json}

ARTICLES:
{articles_json}

For each timeline event, determine:
- is_consistent (true/false)
- agreement_points (list)
- discrepancies (list)
- severity: "low" | "medium" | "high"

Return ONLY a JSON array in the same order as the timeline.
"#
        ))
    }

    /// Checks each timeline event against the article batch. An empty
    /// timeline never reaches the service.
    pub async fn check(
        &self,
        timeline: &[TimelineEvent],
        articles: &[Article],
    ) -> ServiceOutcome<Vec<EventConsistency>> {
        if timeline.is_empty() {
            return ServiceOutcome::Success(Vec::new());
        }

        let unverified = || -> Vec<EventConsistency> {
            timeline
                .iter()
                .map(|e| EventConsistency::unverified(e, PARSE_FAILURE_NOTE))
                .collect()
        };

        let prompt = match self.build_prompt(timeline, articles) {
            Ok(prompt) => prompt,
            Err(e) => return ServiceOutcome::fallback(unverified(), e.to_string()),
        };

        info!("🔬 Checking {} timeline events across sources", timeline.len());
        let model = &self.model;
        let prompt = prompt.as_str();
        match retry_on_rate_limit(&self.retry, move || model.complete(prompt)).await {
            Ok(text) => match parse_consistency(&text, timeline) {
                Some(results) => ServiceOutcome::Success(results),
                None => {
                    warn!("Consistency reply could not be parsed");
                    ServiceOutcome::fallback(unverified(), "malformed consistency output")
                }
            },
            Err(e) => {
                warn!("Consistency check failed: {}", e);
                ServiceOutcome::fallback(unverified(), e.to_string())
            }
        }
    }
}
