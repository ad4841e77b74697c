use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nc_core::{Article, Config, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::extract::{extract_json, JsonShape};
use crate::outcome::ServiceOutcome;
use crate::prompt::review_payload;
use crate::retry::retry_on_rate_limit;
use crate::InferenceModel;

/// Score given to any article the service did not rate.
pub const DEFAULT_CREDIBILITY: f64 = 0.6;

const TITLE_CHARS: usize = 150;
const UNKNOWN_LABEL: &str = "unknown";

/// One rating as returned by the service, keyed by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityAssessment {
    pub url: String,
    pub credibility_score: f64,
    pub authenticity_label: String,
    pub bias_label: String,
    pub reasoning: String,
}

impl CredibilityAssessment {
    pub fn neutral(url: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credibility_score: DEFAULT_CREDIBILITY,
            authenticity_label: UNKNOWN_LABEL.to_string(),
            bias_label: UNKNOWN_LABEL.to_string(),
            reasoning: reasoning.into(),
        }
    }

    /// Lenient read of a single array item. Entries without a URL are useless
    /// for matching and are dropped; scores are clamped to `0.0..=1.0`.
    fn from_value(value: &Value) -> Option<Self> {
        let url = value.get("url")?.as_str()?.trim();
        if url.is_empty() {
            return None;
        }
        let score = match value.get("credibility_score") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|s: &f64| s.is_finite())
        .map(|s| s.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CREDIBILITY);
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_LABEL)
                .to_string()
        };

        Some(Self {
            url: url.to_string(),
            credibility_score: score,
            authenticity_label: text("authenticity_label"),
            bias_label: text("bias_label"),
            reasoning: value
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Confidence::High
        } else if score >= 0.6 {
            Confidence::Moderate
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "High Confidence",
            Confidence::Moderate => "Moderate Confidence",
            Confidence::Low => "Low Confidence",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCredibility {
    pub url: String,
    pub title: String,
    pub source: String,
    pub score: f64,
    pub authenticity_label: String,
    pub bias_label: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityReport {
    pub articles: Vec<ArticleCredibility>,
    pub overall_score: f64,
    pub confidence: Confidence,
}

impl CredibilityReport {
    /// Joins service ratings onto `articles` by URL. Unrated articles get
    /// [`DEFAULT_CREDIBILITY`]; the overall score is their mean.
    pub fn build(articles: &[Article], assessments: &[CredibilityAssessment]) -> Self {
        let by_url: HashMap<&str, &CredibilityAssessment> =
            assessments.iter().map(|a| (a.url.as_str(), a)).collect();

        let rated: Vec<ArticleCredibility> = articles
            .iter()
            .map(|article| {
                match by_url.get(article.url.as_str()) {
                    Some(found) => ArticleCredibility {
                        url: article.url.clone(),
                        title: article.title.clone(),
                        source: article.source.clone(),
                        score: found.credibility_score,
                        authenticity_label: found.authenticity_label.clone(),
                        bias_label: found.bias_label.clone(),
                        reasoning: found.reasoning.clone(),
                    },
                    None => ArticleCredibility {
                        url: article.url.clone(),
                        title: article.title.clone(),
                        source: article.source.clone(),
                        score: DEFAULT_CREDIBILITY,
                        authenticity_label: UNKNOWN_LABEL.to_string(),
                        bias_label: UNKNOWN_LABEL.to_string(),
                        reasoning: String::new(),
                    },
                }
            })
            .collect();

        let overall_score = if rated.is_empty() {
            DEFAULT_CREDIBILITY
        } else {
            rated.iter().map(|a| a.score).sum::<f64>() / rated.len() as f64
        };

        Self {
            articles: rated,
            overall_score,
            confidence: Confidence::from_score(overall_score),
        }
    }
}

pub fn parse_assessments(text: &str) -> Option<Vec<CredibilityAssessment>> {
    let value = extract_json(text, JsonShape::Array)?;
    let items = value.as_array()?;
    Some(items.iter().filter_map(CredibilityAssessment::from_value).collect())
}

#[derive(Debug, Clone)]
pub struct CredibilityScorer {
    model: Arc<dyn InferenceModel>,
    retry: RetryPolicy,
    batch_cap: usize,
}

impl CredibilityScorer {
    pub fn new(model: Arc<dyn InferenceModel>, config: &Config) -> Self {
        Self {
            model,
            retry: config.retry,
            batch_cap: config.review_batch_cap,
        }
    }

    fn build_prompt(&self, articles: &[Article]) -> serde_json::Result<String> {
        let payload = review_payload(articles, self.batch_cap, TITLE_CHARS)?;
        Ok(format!(
            r#"You are a news credibility analyst.

For each item in the array, output:
{{
  "url": "<same>",
  "credibility_score": 0.0-1.0,
  "authenticity_label": "credible" | "questionable" | "misleading",
  "bias_label": "neutral" | "left" | "right" | "sensational" | "unknown",
  "reasoning": "one sentence"
}}

Return ONLY a JSON array in the same order.

ARTICLES:
{payload}
"#
        ))
    }

    /// Rates up to the batch cap of `articles`. An empty batch never reaches
    /// the service.
    pub async fn assess(&self, articles: &[Article]) -> ServiceOutcome<Vec<CredibilityAssessment>> {
        let batch = &articles[..articles.len().min(self.batch_cap)];
        if batch.is_empty() {
            return ServiceOutcome::Success(Vec::new());
        }

        let neutral = |reasoning: &str| -> Vec<CredibilityAssessment> {
            batch
                .iter()
                .map(|a| CredibilityAssessment::neutral(a.url.clone(), reasoning))
                .collect()
        };

        let prompt = match self.build_prompt(batch) {
            Ok(prompt) => prompt,
            Err(e) => return ServiceOutcome::fallback(neutral("Model parsing failed."), e.to_string()),
        };

        info!("⚖️ Scoring credibility of {} articles", batch.len());
        let model = &self.model;
        let prompt = prompt.as_str();
        match retry_on_rate_limit(&self.retry, move || model.complete(prompt)).await {
            Ok(text) => match parse_assessments(&text) {
                Some(assessments) => ServiceOutcome::Success(assessments),
                None => {
                    warn!("Credibility reply could not be parsed");
                    ServiceOutcome::fallback(
                        neutral("Model parsing failed."),
                        "malformed credibility output",
                    )
                }
            },
            Err(e) => {
                warn!("Credibility scoring failed: {}", e);
                ServiceOutcome::fallback(neutral("Credibility scoring failed."), e.to_string())
            }
        }
    }

    /// [`assess`](Self::assess) followed by [`CredibilityReport::build`] over
    /// the same capped batch.
    pub async fn score(&self, articles: &[Article]) -> ServiceOutcome<CredibilityReport> {
        let batch = &articles[..articles.len().min(self.batch_cap)];
        match self.assess(batch).await {
            ServiceOutcome::Success(assessments) => {
                ServiceOutcome::Success(CredibilityReport::build(batch, &assessments))
            }
            ServiceOutcome::Fallback { value, reason } => {
                ServiceOutcome::fallback(CredibilityReport::build(batch, &value), reason)
            }
        }
    }
}
