// src/error.rs
// =============================================================================
// One error type for the whole pipeline.
//
// Every stage (URL parsing, GitHub fetches, the model call, config loading)
// returns crate::error::Result<T>. Nothing in the pipeline recovers from these
// errors: they travel up to main.rs, which prints them once and exits.
//
// Rust concepts:
// - thiserror: derives Display and std::error::Error from the #[error] attrs
// - #[from]: lets the ? operator convert io errors automatically
// =============================================================================

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The repository URL does not contain an owner and a repository name
    #[error("Invalid GitHub repository reference '{input}': {hint}")]
    InvalidReference { input: String, hint: String },

    /// A CLI or config-file argument is out of range or inconsistent
    #[error("{0}")]
    Validation(String),

    /// A required token or API key is not set anywhere
    #[error("{name} is required{purpose} but was not found in the environment or config file")]
    MissingCredential { name: &'static str, purpose: String },

    #[error("GitHub rejected the request for {endpoint} (HTTP 401 Unauthorized)")]
    Unauthorized { endpoint: String },

    #[error("GitHub returned 404 Not Found for {endpoint} of {owner}/{repo}")]
    NotFound {
        owner: String,
        repo: String,
        endpoint: String,
    },

    #[error("GitHub request for {endpoint} failed with HTTP {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Network error while fetching {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to generate summary using {backend}: {message}")]
    SummaryGeneration {
        backend: &'static str,
        message: String,
    },

    #[error("The {backend} model returned a response that is not valid insights JSON: {reason}")]
    MalformedModelResponse {
        backend: &'static str,
        reason: String,
    },

    #[error("Failed to load or parse the config file {path}: {message}")]
    ConfigLoad { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    // A short, actionable hint shown under the error message
    pub fn tip(&self) -> Option<&'static str> {
        match self {
            Error::InvalidReference { .. } => {
                Some("Use a URL like https://github.com/{owner}/{repository}.")
            }
            Error::MissingCredential { .. } => Some(
                "Export the variable, add it to a .env file, or set it under [api_keys] in ~/.github-echo-config.toml.",
            ),
            Error::Unauthorized { .. } => {
                Some("Check that GITHUB_API_TOKEN is valid and has not expired.")
            }
            Error::NotFound { .. } => Some(
                "Check the owner and repository names, and that your token can see the repository.",
            ),
            Error::Upstream { status: 403, .. } | Error::Upstream { status: 429, .. } => {
                Some("You may have hit the GitHub API rate limit; wait a bit and retry.")
            }
            Error::Transport { .. } => Some("Check your network connection and try again."),
            Error::SummaryGeneration { .. } => {
                Some("Check the model API key, or try the other model with --model.")
            }
            Error::MalformedModelResponse { .. } => {
                Some("Model output varies between runs; retrying or lowering --temperature often helps.")
            }
            Error::ConfigLoad { .. } => Some("Fix the TOML syntax or remove the config file."),
            _ => None,
        }
    }
}
