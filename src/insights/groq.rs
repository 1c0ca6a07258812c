// src/insights/groq.rs
// =============================================================================
// Summary backend for Groq's OpenAI-compatible chat completions API.
//
// The system instruction goes in as a "system" message and the prompt as a
// "user" message. JSON mode is requested with response_format.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationConfig, ModelReply, SummaryBackend, UsageMetadata};
use crate::error::{Error, Result};

const BACKEND: &str = "groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GROQ_MODEL: &str = "mixtral-8x7b-32768";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
    n: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<ChatUsage> for UsageMetadata {
    fn from(usage: ChatUsage) -> Self {
        UsageMetadata {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

pub struct GroqBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GroqBackend {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| failure(format!("could not create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: GROQ_MODEL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn build_request(&self, system: &str, prompt: &str, config: &GenerationConfig) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: config.temperature,
            n: config.candidate_count,
            stream: false,
            max_tokens: config.max_output_tokens,
            stop: config.stop_sequences.clone(),
        }
    }
}

fn failure(message: String) -> Error {
    Error::SummaryGeneration {
        backend: BACKEND,
        message,
    }
}

fn into_reply(response: ChatCompletionResponse) -> Result<ModelReply> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| failure("response contained no message content".to_string()))?;

    Ok(ModelReply {
        text,
        usage: response.usage.unwrap_or_default().into(),
    })
}

#[async_trait]
impl SummaryBackend for GroqBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn complete(&self, system: &str, prompt: &str, config: &GenerationConfig) -> Result<ModelReply> {
        let request = self.build_request(system, prompt, config);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("could not decode response: {}", e)))?;

        into_reply(body)
    }
}
