// src/config.rs
// =============================================================================
// Optional config file and credentials.
//
// The config file lives at ~/.github-echo-config.toml:
//
//   [settings]
//   model = "groq"
//   model_temperature = 0.3
//   output_file = "summary.md"
//   token_usage = true
//
//   [api_keys]
//   GITHUB_API_TOKEN = "ghp_..."
//   GROQ_API_KEY = "gsk_..."
//
// A missing file is fine (everything falls back to defaults). A file that is
// present but not valid TOML is an error.
//
// Credentials are resolved once at startup: environment variable first, then
// the [api_keys] table.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::insights::ModelKind;

pub const CONFIG_FILE_NAME: &str = ".github-echo-config.toml";

pub const DEFAULT_GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub api_keys: ApiKeys,
}

// The [settings] table; every field is optional
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Settings {
    pub model: Option<String>,
    pub model_temperature: Option<f32>,
    pub output_file: Option<PathBuf>,
    pub token_usage: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ApiKeys {
    #[serde(rename = "GITHUB_API_TOKEN", alias = "github_api_token")]
    pub github_api_token: Option<String>,
    #[serde(rename = "GITHUB_API_VERSION", alias = "github_api_version")]
    pub github_api_version: Option<String>,
    #[serde(rename = "GOOGLE_GEMINI_API_KEY", alias = "google_gemini_api_key")]
    pub google_gemini_api_key: Option<String>,
    #[serde(rename = "GROQ_API_KEY", alias = "groq_api_key")]
    pub groq_api_key: Option<String>,
}

impl ConfigFile {
    // Loads ~/.github-echo-config.toml, or an empty config if there is none
    pub fn load() -> Result<Self> {
        match dirs::home_dir() {
            Some(home) => Self::load_from(&home.join(CONFIG_FILE_NAME)),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents).map_err(|e: toml::de::Error| Error::ConfigLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

// Tokens and keys, resolved once and handed to the components that need them
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub github_api_version: String,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env(api_keys: &ApiKeys) -> Self {
        Self::resolve(api_keys, |name| std::env::var(name).ok())
    }

    // `lookup` stands in for the environment; blank values count as unset
    pub fn resolve(api_keys: &ApiKeys, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |name: &str, fallback: &Option<String>| {
            lookup(name)
                .or_else(|| fallback.clone())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            github_token: pick("GITHUB_API_TOKEN", &api_keys.github_api_token),
            github_api_version: pick("GITHUB_API_VERSION", &api_keys.github_api_version)
                .unwrap_or_else(|| DEFAULT_GITHUB_API_VERSION.to_string()),
            gemini_api_key: pick("GOOGLE_GEMINI_API_KEY", &api_keys.google_gemini_api_key),
            groq_api_key: pick("GROQ_API_KEY", &api_keys.groq_api_key),
        }
    }

    pub fn github_token(&self) -> Result<&str> {
        self.github_token
            .as_deref()
            .ok_or_else(|| Error::MissingCredential {
                name: "GITHUB_API_TOKEN",
                purpose: String::new(),
            })
    }

    // Only the selected backend's key is ever required
    pub fn backend_key(&self, model: ModelKind) -> Result<&str> {
        let key = match model {
            ModelKind::Gemini => self.gemini_api_key.as_deref(),
            ModelKind::Groq => self.groq_api_key.as_deref(),
        };
        key.ok_or_else(|| Error::MissingCredential {
            name: model.api_key_name(),
            purpose: format!(" for the {} model", model),
        })
    }
}
