use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use nc_core::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{snippet, InferenceModel};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: Option<String>, model_name: String) -> Result<Self> {
        let api_key = api_key
            .ok_or_else(|| Error::Config("Gemini API key is required (GEMINI_API_KEY)".to_string()))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            model_name,
            base_url: BASE_URL.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        let model = if self.model_name.starts_with("models/") {
            self.model_name.clone()
        } else {
            format!("models/{}", self.model_name)
        };
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(format!("Gemini: {}", snippet(&body))));
        }
        if !status.is_success() {
            return Err(Error::GenerativeService(format!(
                "Gemini returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        debug!("Gemini returned {} chars", text.len());
        Ok(text)
    }
}
