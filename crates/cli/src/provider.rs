//! OpenAI-compatible chat-completions client used as the summarization
//! provider. Deadlines and retries live in the scheduler, so this client
//! does one plain request per call and reports failures precisely enough
//! for the retry classification to work.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use atlas_summarize::{SummarizeError, Summarizer};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "ATLAS_API_KEY";
const API_BASE_ENV: &str = "ATLAS_API_BASE";

const SYSTEM_PROMPT: &str =
    "You are a concise code documenter for search indexing. Respond exactly as instructed.";

const SUMMARY_PROMPT: &str = "Summarize this code for search and navigation as 3-6 plain-text \
bullet points covering purpose, inputs and outputs, side effects, and notable errors. At most \
80 words. No code fences.";

/// Chat-completions provider configured from the environment: `ATLAS_API_KEY`
/// for the key, `ATLAS_API_BASE` to point at a compatible self-hosted
/// endpoint.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn from_env(model: &str) -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        anyhow::ensure!(
            !api_key.is_empty(),
            "{API_KEY_ENV} must be set when summaries are on"
        );
        let base_url = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(Self::new(&base_url, api_key, model))
    }

    fn new(base_url: &str, api_key: String, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    fn request_for(&self, input: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: format!("{SUMMARY_PROMPT}\n\n--- CODE ---\n{input}"),
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiProvider {
    async fn summarize(&self, input: &str) -> atlas_summarize::Result<String> {
        let request = self.request_for(input);
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| SummarizeError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Rate limiting clears on retry; other 4xx responses never do.
            if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SummarizeError::InvalidInput(format!("{status}: {body}")));
            }
            return Err(SummarizeError::Transport(format!("{status}: {body}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| SummarizeError::Transport(err.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(SummarizeError::Transport("empty completion".to_string()));
        }
        Ok(content)
    }
}
