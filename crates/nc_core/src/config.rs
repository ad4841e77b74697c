use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_HISTORICAL_CUTOFF: i32 = 2021;
pub const DEFAULT_MODEL: &str = "gemini";
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.5-flash";

/// Backoff schedule for rate-limited generative calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub initial_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_factor: 1.6,
            initial_wait: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (0-based).
    pub fn wait_for(&self, attempt: u32) -> Duration {
        self.initial_wait
            .mul_f64(self.backoff_factor.powi(attempt as i32))
    }
}

/// Process-wide settings, built once in `main` and passed down explicitly.
#[derive(Clone)]
pub struct Config {
    pub historical_cutoff_year: i32,
    pub fetch_timeout: Duration,
    pub google_news_max: usize,
    pub gdelt_max: usize,
    pub newsapi_max: usize,
    pub summary_batch_cap: usize,
    pub review_batch_cap: usize,
    pub retry: RetryPolicy,
    pub google_news_locale: String,
    pub newsapi_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub model: String,
    pub model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            historical_cutoff_year: DEFAULT_HISTORICAL_CUTOFF,
            fetch_timeout: Duration::from_secs(15),
            google_news_max: 15,
            gdelt_max: 12,
            newsapi_max: 10,
            summary_batch_cap: 20,
            review_batch_cap: 30,
            retry: RetryPolicy::default(),
            google_news_locale: "hl=en-IN&gl=IN&ceid=IN:en".to_string(),
            newsapi_key: None,
            gemini_api_key: None,
            deepseek_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            model_name: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("historical_cutoff_year", &self.historical_cutoff_year)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("google_news_max", &self.google_news_max)
            .field("gdelt_max", &self.gdelt_max)
            .field("newsapi_max", &self.newsapi_max)
            .field("summary_batch_cap", &self.summary_batch_cap)
            .field("review_batch_cap", &self.review_batch_cap)
            .field("retry", &self.retry)
            .field("google_news_locale", &self.google_news_locale)
            .field("newsapi_key", &redact(&self.newsapi_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("deepseek_api_key", &redact(&self.deepseek_api_key))
            .field("model", &self.model)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl Config {
    /// Defaults overlaid with whatever the environment provides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            newsapi_key: non_empty("NEWSAPI_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            deepseek_api_key: non_empty("DEEPSEEK_API_KEY"),
            ..Self::default()
        };

        if let Some(model) = non_empty("NEWSCARD_MODEL") {
            config.model = model;
        }
        if let Some(name) = non_empty("NEWSCARD_MODEL_NAME") {
            config.model_name = name;
        }
        if let Some(cutoff) = non_empty("NEWSCARD_HISTORICAL_CUTOFF") {
            config.historical_cutoff_year = cutoff.trim().parse().map_err(|_| {
                Error::Config(format!("NEWSCARD_HISTORICAL_CUTOFF is not a year: {}", cutoff))
            })?;
        }
        if let Some(secs) = non_empty("NEWSCARD_FETCH_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("NEWSCARD_FETCH_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// True when a query year falls on the historical side of the cutoff.
    pub fn is_historical_year(&self, year: i32) -> bool {
        year <= self.historical_cutoff_year
    }
}
