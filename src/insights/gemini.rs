// src/insights/gemini.rs
// =============================================================================
// Summary backend for Google's Gemini generateContent REST API.
//
// Request:  POST {base}/models/{model}:generateContent
//           x-goog-api-key: <key>
//           { systemInstruction, contents, generationConfig }
// Response: { candidates: [{ content: { parts: [{ text }] } }], usageMetadata }
//
// JSON mode is requested with generationConfig.responseMimeType.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationConfig, ModelReply, SummaryBackend, UsageMetadata};
use crate::error::{Error, Result};

const BACKEND: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    candidate_count: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

impl From<GeminiUsage> for UsageMetadata {
    fn from(usage: GeminiUsage) -> Self {
        UsageMetadata {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        }
    }
}

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
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
            model: GEMINI_MODEL.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn failure(message: String) -> Error {
    Error::SummaryGeneration {
        backend: BACKEND,
        message,
    }
}

fn build_request(system: &str, prompt: &str, config: &GenerationConfig) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: system.to_string(),
            }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GeminiGenerationConfig {
            candidate_count: config.candidate_count,
            temperature: config.temperature,
            stop_sequences: config.stop_sequences.clone(),
            max_output_tokens: config.max_output_tokens,
            response_mime_type: "application/json",
        },
    }
}

// Text of the first candidate plus normalized usage
fn into_reply(response: GenerateContentResponse) -> Result<ModelReply> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| failure("response contained no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(failure(format!("candidate has no text (finish reason: {})", reason)));
    }

    Ok(ModelReply {
        text,
        usage: response.usage_metadata.unwrap_or_default().into(),
    })
}

#[async_trait]
impl SummaryBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn complete(&self, system: &str, prompt: &str, config: &GenerationConfig) -> Result<ModelReply> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = build_request(system, prompt, config);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("could not decode response: {}", e)))?;

        into_reply(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestServer;
    use serde_json::json;

    #[test]
    fn test_request_uses_gemini_field_names() {
        let config = GenerationConfig {
            temperature: 0.7,
            max_output_tokens: Some(2048),
            ..Default::default()
        };
        let request = serde_json::to_value(build_request("be useful", "hello", &config)).unwrap();

        assert_eq!(request["systemInstruction"]["parts"][0]["text"], "be useful");
        assert!(request["systemInstruction"].get("role").is_none());
        assert_eq!(request["contents"][0]["role"], "user");
        assert_eq!(request["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(request["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(request["generationConfig"]["candidateCount"], 1);
        assert_eq!(request["generationConfig"]["maxOutputTokens"], 2048);
        assert!(request["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_reply_normalizes_usage() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"summary\": "}, {"text": "[]}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 11161, "candidatesTokenCount": 774, "totalTokenCount": 11935}
        }))
        .unwrap();

        let reply = into_reply(response).unwrap();
        assert_eq!(reply.text, "{\"summary\": []}");
        assert_eq!(
            reply.usage,
            UsageMetadata {
                prompt_tokens: 11161,
                completion_tokens: 774,
                total_tokens: 11935,
            }
        );
    }

    #[test]
    fn test_reply_without_candidates_fails() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        let err = into_reply(response).unwrap_err();
        assert!(matches!(err, Error::SummaryGeneration { backend: "gemini", .. }));
    }

    #[tokio::test]
    async fn test_complete_over_http() {
        let server = TestServer::start(|_| {
            let body = json!({
                "candidates": [{"content": {"parts": [{"text": "```json\n{\"summary\": []}\n```"}]}}],
                "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 2, "totalTokenCount": 7}
            });
            (200, body.to_string())
        })
        .await;
        let backend = GeminiBackend::with_base_url(&server.base_url, "g-key").unwrap();

        let reply = backend
            .complete("system", "prompt", &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(reply.usage.total_tokens, 7);

        let request = server.requests()[0].to_lowercase();
        assert!(request.starts_with("post /models/gemini-1.5-flash:generatecontent "));
        assert!(request.contains("x-goog-api-key: g-key"));
    }

    #[tokio::test]
    async fn test_complete_http_error_names_backend() {
        let server = TestServer::start(|_| (403, r#"{"error": {"message": "API key not valid"}}"#.to_string())).await;
        let backend = GeminiBackend::with_base_url(&server.base_url, "bad").unwrap();

        let err = backend
            .complete("system", "prompt", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to generate summary using gemini"));
        assert!(err.to_string().contains("403"));
    }
}
