use nc_core::Config;

pub mod credibility;
pub mod divergence;
pub mod extract;
pub mod models;
pub mod outcome;
pub mod prompt;
pub mod retry;
pub mod summary;

pub use credibility::{CredibilityReport, CredibilityScorer};
pub use divergence::{DivergenceAnalyzer, EventConsistency, Severity};
pub use models::{create_model, InferenceModel};
pub use outcome::ServiceOutcome;
pub use retry::retry_on_rate_limit;
pub use summary::{TimelineSummarizer, TimelineSummary, SUMMARY_UNAVAILABLE};

/// The three generative services, sharing one model and one configuration.
#[derive(Debug, Clone)]
pub struct Services {
    pub summarizer: TimelineSummarizer,
    pub scorer: CredibilityScorer,
    pub analyzer: DivergenceAnalyzer,
}

impl Services {
    pub fn new(model: std::sync::Arc<dyn InferenceModel>, config: &Config) -> Self {
        Self {
            summarizer: TimelineSummarizer::new(model.clone(), config),
            scorer: CredibilityScorer::new(model.clone(), config),
            analyzer: DivergenceAnalyzer::new(model, config),
        }
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{InferenceModel, ServiceOutcome, Services};
    pub use nc_core::{Article, Config, Error, Result, TimelineEvent};
}
