use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::InferenceConfig;
use crate::error::AppError;
use crate::models::ChatMessage;

/// Remote model the chat pages talk to. Callers pass the key to bill the
/// request to, so one client serves every session.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Single prompt in, single completion out
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, AppError>;

    /// Whole conversation in, next assistant turn out
    async fn chat(&self, api_key: &str, history: &[ChatMessage]) -> Result<String, AppError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for OpenAI-compatible `/v1/completions` and `/v1/chat/completions`
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    completion_model: String,
    chat_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &InferenceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            completion_model: config.completion_model.clone(),
            chat_model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        api_key: &str,
        path: &str,
        body: &B,
    ) -> Result<R, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Inference request failed: {}", e);
                AppError::Upstream(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            tracing::warn!("INFERENCE: {} {} -> {}", path, status, snippet);
            return Err(AppError::Upstream(format!("{}: {}", status, snippet)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl InferenceService for OpenAiClient {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, AppError> {
        tracing::info!(
            "INFERENCE: completion | Model: {} | PromptLen: {}",
            self.completion_model,
            prompt.len()
        );

        let response: CompletionResponse = self
            .post(
                api_key,
                "/v1/completions",
                &CompletionRequest {
                    model: &self.completion_model,
                    prompt,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                },
            )
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| AppError::Upstream("completion returned no choices".to_string()))
    }

    async fn chat(&self, api_key: &str, history: &[ChatMessage]) -> Result<String, AppError> {
        tracing::info!(
            "INFERENCE: chat | Model: {} | Turns: {}",
            self.chat_model,
            history.len()
        );

        let response: ChatResponse = self
            .post(
                api_key,
                "/v1/chat/completions",
                &ChatRequest {
                    model: &self.chat_model,
                    messages: history,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                },
            )
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream("chat returned no choices".to_string()))
    }

    fn name(&self) -> &'static str {
        "OpenAiClient"
    }
}
