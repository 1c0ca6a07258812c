// src/insights/mod.rs
// =============================================================================
// This module turns combined repository data into structured insights.
//
// Submodules:
// - prompt: the fixed system instruction and the prompt template
// - parse: turns the model's text into an InsightPayload
// - gemini / groq: the two summary backends
//
// Both backends implement SummaryBackend. The pipeline only ever sees the
// trait, so adding a third backend means adding one more impl and one more
// ModelKind variant.
//
// Rust concepts:
// - Trait objects: build_backend returns Box<dyn SummaryBackend>
// - Default trait methods: generate() is written once on top of complete()
// =============================================================================

mod gemini;
mod groq;
mod parse;
mod prompt;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::info;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::github::CombinedRepositoryData;

pub use gemini::GeminiBackend;
pub use groq::GroqBackend;
pub use parse::parse_insights;

// Which backend the user picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Gemini,
    Groq,
}

impl ModelKind {
    // Environment variable (or `[api_keys]` entry) holding this backend's key
    pub fn api_key_name(self) -> &'static str {
        match self {
            ModelKind::Gemini => "GOOGLE_GEMINI_API_KEY",
            ModelKind::Groq => "GROQ_API_KEY",
        }
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ModelKind::Gemini),
            "groq" => Ok(ModelKind::Groq),
            other => Err(Error::Validation(format!(
                "Invalid model '{}'. Please choose either \"gemini\" or \"groq\".",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Gemini => write!(f, "gemini"),
            ModelKind::Groq => write!(f, "groq"),
        }
    }
}

// The categories the model is asked to fill, in prompt order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightCategory {
    ContributionTrends,
    CommunityEngagement,
    ReleaseCadence,
    CodeBaseComposition,
    RepositoryPopularity,
    BranchProtection,
    PotentialChanges,
    Summary,
}

impl InsightCategory {
    pub const ALL: [InsightCategory; 8] = [
        InsightCategory::ContributionTrends,
        InsightCategory::CommunityEngagement,
        InsightCategory::ReleaseCadence,
        InsightCategory::CodeBaseComposition,
        InsightCategory::RepositoryPopularity,
        InsightCategory::BranchProtection,
        InsightCategory::PotentialChanges,
        InsightCategory::Summary,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InsightCategory::ContributionTrends => "contribution_trends",
            InsightCategory::CommunityEngagement => "community_engagement",
            InsightCategory::ReleaseCadence => "release_cadence",
            InsightCategory::CodeBaseComposition => "code_base_composition",
            InsightCategory::RepositoryPopularity => "repository_popularity",
            InsightCategory::BranchProtection => "branch_protection",
            InsightCategory::PotentialChanges => "potential_changes",
            InsightCategory::Summary => "summary",
        }
    }
}

// One titled observation about the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insight {
    pub title: String,
    pub description: String,
}

impl Insight {
    // Both fields must have visible text to be rendered
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

// Category name -> insights, in the order the model returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightPayload {
    categories: Vec<(String, Vec<Insight>)>,
}

impl InsightPayload {
    pub fn push(&mut self, category: impl Into<String>, insights: Vec<Insight>) {
        self.categories.push((category.into(), insights));
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Insight])> {
        self.categories
            .iter()
            .map(|(name, insights)| (name.as_str(), insights.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

// Token counts, normalized across backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

// Sampling parameters shared by both backends
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub candidate_count: u32,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            candidate_count: 1,
            temperature: 0.5,
            stop_sequences: Vec::new(),
            max_output_tokens: None,
        }
    }
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Default::default()
        }
    }

    // Checked before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.candidate_count < 1 {
            return Err(Error::Validation(
                "candidate_count must be an integer greater than or equal to 1.".to_string(),
            ));
        }
        validate_temperature(self.temperature)?;
        if self.stop_sequences.len() > 5 {
            return Err(Error::Validation(
                "stop_sequences must be a list of up to 5 strings.".to_string(),
            ));
        }
        if self.max_output_tokens == Some(0) {
            return Err(Error::Validation(
                "max_output_tokens must be an integer greater than or equal to 1.".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn validate_temperature(temperature: f32) -> Result<()> {
    if !temperature.is_finite() || !(0.0..=1.0).contains(&temperature) {
        return Err(Error::Validation(format!(
            "Invalid model temperature {}. The value should be between 0 and 1.",
            temperature
        )));
    }
    Ok(())
}

// Raw text and usage as returned by one backend call
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub usage: UsageMetadata,
}

// What a successful generation hands to the renderer
#[derive(Debug, Clone)]
pub struct Summary {
    pub payload: InsightPayload,
    pub usage: UsageMetadata,
}

#[async_trait]
pub trait SummaryBackend: Send + Sync {
    // Name used in error messages and logs
    fn name(&self) -> &'static str;

    // Sends the system instruction and prompt to the model.
    // Any transport or API failure comes back as `Error::SummaryGeneration`.
    async fn complete(&self, system: &str, prompt: &str, config: &GenerationConfig) -> Result<ModelReply>;

    // Validates the config, prompts the model and parses its JSON answer
    async fn generate(&self, data: &CombinedRepositoryData, config: &GenerationConfig) -> Result<Summary> {
        config.validate()?;

        let data_json = serde_json::to_string_pretty(data).map_err(|e| Error::SummaryGeneration {
            backend: self.name(),
            message: format!("could not serialize repository data: {}", e),
        })?;
        let user_prompt = prompt::render_prompt(&data_json);

        info!(backend = self.name(), prompt_bytes = user_prompt.len(), "generating summary");
        let reply = self.complete(prompt::SYSTEM_INSTRUCTION, &user_prompt, config).await?;
        info!(
            backend = self.name(),
            prompt_tokens = reply.usage.prompt_tokens,
            completion_tokens = reply.usage.completion_tokens,
            "model replied"
        );

        let payload = parse_insights(self.name(), &reply.text)?;
        Ok(Summary {
            payload,
            usage: reply.usage,
        })
    }
}

// Builds the backend the user selected, with its API key
pub fn build_backend(model: ModelKind, credentials: &Credentials) -> Result<Box<dyn SummaryBackend>> {
    let api_key = credentials.backend_key(model)?;
    let backend: Box<dyn SummaryBackend> = match model {
        ModelKind::Gemini => Box::new(GeminiBackend::new(api_key)?),
        ModelKind::Groq => Box::new(GroqBackend::new(api_key)?),
    };
    Ok(backend)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::github::fakes::FakeGitHub;
    use crate::github::{fetch_github_data, RepositoryReference};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Returns a fixed reply text and counts how often it was called
    pub(crate) struct FakeBackend {
        pub reply: String,
        pub calls: AtomicUsize,
    }

    impl FakeBackend {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SummaryBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn complete(&self, _system: &str, prompt: &str, _config: &GenerationConfig) -> Result<ModelReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("\"repository_metadata\""));
            Ok(ModelReply {
                text: self.reply.clone(),
                usage: UsageMetadata {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    total_tokens: 120,
                },
            })
        }
    }

    async fn combined() -> CombinedRepositoryData {
        let reference = RepositoryReference::parse("https://github.com/octo/hello").unwrap();
        fetch_github_data(&FakeGitHub::default(), &reference).await.unwrap()
    }

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!("gemini".parse::<ModelKind>().unwrap(), ModelKind::Gemini);
        assert_eq!(" GROQ ".parse::<ModelKind>().unwrap(), ModelKind::Groq);
        assert!(matches!("gpt".parse::<ModelKind>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_generation_config_validation() {
        assert!(GenerationConfig::default().validate().is_ok());
        assert!(GenerationConfig::with_temperature(0.0).validate().is_ok());
        assert!(GenerationConfig::with_temperature(1.0).validate().is_ok());

        for bad in [-0.1, 1.01, 2.0, f32::NAN, f32::INFINITY] {
            assert!(GenerationConfig::with_temperature(bad).validate().is_err(), "{bad}");
        }

        let zero_candidates = GenerationConfig {
            candidate_count: 0,
            ..Default::default()
        };
        assert!(zero_candidates.validate().is_err());

        let too_many_stops = GenerationConfig {
            stop_sequences: vec!["x".to_string(); 6],
            ..Default::default()
        };
        assert!(too_many_stops.validate().is_err());

        let zero_tokens = GenerationConfig {
            max_output_tokens: Some(0),
            ..Default::default()
        };
        assert!(zero_tokens.validate().is_err());
    }

    #[test]
    fn test_insight_completeness() {
        let insight = |t: &str, d: &str| Insight {
            title: t.to_string(),
            description: d.to_string(),
        };
        assert!(insight("A", "B").is_complete());
        assert!(!insight("  ", "B").is_complete());
        assert!(!insight("A", "\n\t").is_complete());
    }

    #[tokio::test]
    async fn test_generate_parses_reply() {
        let backend = FakeBackend::replying(r#"{"summary": [{"title": "Healthy", "description": "Active."}]}"#);
        let summary = backend.generate(&combined().await, &GenerationConfig::default()).await.unwrap();

        assert_eq!(summary.payload.len(), 1);
        assert_eq!(summary.usage.total_tokens, 120);
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_config_before_calling_model() {
        let backend = FakeBackend::replying("{}");
        let err = backend
            .generate(&combined().await, &GenerationConfig::with_temperature(1.5))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_non_json_reply_is_malformed() {
        let backend = FakeBackend::replying("Here are your insights: not json");
        let err = backend.generate(&combined().await, &GenerationConfig::default()).await.unwrap_err();

        assert!(matches!(err, Error::MalformedModelResponse { backend: "fake", .. }));
    }
}
