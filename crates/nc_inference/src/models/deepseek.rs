use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use nc_core::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{snippet, InferenceModel};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// OpenAI-compatible chat completion backend.
pub struct DeepSeekModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekModel {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            Error::Config("DeepSeek API key is required (DEEPSEEK_API_KEY)".to_string())
        })?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
        })
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RateLimited(format!("DeepSeek: {}", snippet(&body))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerativeService(format!(
                "DeepSeek returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        let response = response.json::<ChatResponse>().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::MalformedServiceOutput("DeepSeek returned no choices".to_string()))
    }
}
