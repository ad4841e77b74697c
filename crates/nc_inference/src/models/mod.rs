use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nc_core::{Config, Error, Result};

pub mod deepseek;
pub mod dummy;
pub mod gemini;

pub use deepseek::DeepSeekModel;
pub use dummy::{DummyModel, ScriptedReply};
pub use gemini::GeminiModel;

/// Opaque text-completion backend: prompt in, text out.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Fails with [`Error::RateLimited`] when the backend reports quota or
    /// rate exhaustion, so callers can back off.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds the backend named by `config.model`.
pub fn create_model(config: &Config) -> Result<Arc<dyn InferenceModel>> {
    match config.model.to_lowercase().as_str() {
        "gemini" => Ok(Arc::new(GeminiModel::new(
            config.gemini_api_key.clone(),
            config.model_name.clone(),
        )?)),
        "deepseek" => Ok(Arc::new(DeepSeekModel::new(config.deepseek_api_key.clone())?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Config(format!(
            "Unknown model '{}'. Available models: gemini, deepseek, dummy",
            other
        ))),
    }
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(300).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_by_name() {
        let config = Config {
            model: "dummy".to_string(),
            ..Config::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "Dummy");

        let config = Config {
            model: "gemini".to_string(),
            gemini_api_key: Some("k".to_string()),
            ..Config::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "Gemini");
    }

    #[test]
    fn test_create_model_rejects_unknown() {
        let config = Config {
            model: "gpt-9".to_string(),
            ..Config::default()
        };
        assert!(matches!(create_model(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = Config::default();
        assert!(matches!(create_model(&config), Err(Error::Config(_))));
    }
}
