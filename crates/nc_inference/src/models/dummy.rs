use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use nc_core::{Error, Result};

use super::InferenceModel;

/// What a [`DummyModel`] answers on its next call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    Text(String),
    RateLimited,
    Fail(String),
}

/// Offline backend. Plays back scripted replies in order, then answers every
/// further prompt with the default reply.
pub struct DummyModel {
    script: Mutex<VecDeque<ScriptedReply>>,
    default_reply: String,
    calls: AtomicUsize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("calls", &self.calls())
            .finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    /// Always answers with an empty JSON object, which every service treats
    /// as unusable output and replaces with its default.
    pub fn new() -> Self {
        Self::with_reply("{}")
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn scripted(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let model = Self::new();
        model.lock_script().extend(replies);
        model
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_script().pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::RateLimited) => {
                Err(Error::RateLimited("429 RESOURCE_EXHAUSTED".to_string()))
            }
            Some(ScriptedReply::Fail(message)) => Err(Error::GenerativeService(message)),
            None => Ok(self.default_reply.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model_plays_script_then_default() {
        let model = DummyModel::scripted([
            ScriptedReply::RateLimited,
            ScriptedReply::Text("first".to_string()),
        ]);
        assert!(model.complete("p").await.unwrap_err().is_rate_limit());
        assert_eq!(model.complete("p").await.unwrap(), "first");
        assert_eq!(model.complete("p").await.unwrap(), "{}");
        assert_eq!(model.calls(), 3);
    }
}
