// src/validation.rs
// =============================================================================
// Merges CLI flags with the config file and validates the result.
//
// Precedence for every setting: command line > config file > built-in default.
// Everything here runs before the first network request, so a bad argument
// never costs an API call.
// =============================================================================

use std::path::{Path, PathBuf};

use url::Url;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::insights::{validate_temperature, ModelKind};

pub const DEFAULT_MODEL: ModelKind = ModelKind::Gemini;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

// The fully resolved arguments for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub repository_url: String,
    pub model: ModelKind,
    pub temperature: f32,
    pub output_file: Option<PathBuf>,
    pub token_usage: bool,
}

pub fn resolve_options(cli: &Cli, settings: &Settings) -> Result<RunOptions> {
    validate_repository_url(&cli.repository_url)?;

    let model = match cli.model.as_deref().or(settings.model.as_deref()) {
        Some(name) => name.parse()?,
        None => DEFAULT_MODEL,
    };

    let temperature = match (cli.temperature, settings.model_temperature) {
        (Some(t), _) => with_source(validate_temperature(t), "--temperature").map(|_| t)?,
        (None, Some(t)) => with_source(validate_temperature(t), "config file").map(|_| t)?,
        (None, None) => DEFAULT_TEMPERATURE,
    };

    let output_file = cli.output.clone().or_else(|| settings.output_file.clone());
    if let Some(path) = &output_file {
        validate_output_file(path)?;
    }

    Ok(RunOptions {
        repository_url: cli.repository_url.clone(),
        model,
        temperature,
        output_file,
        token_usage: cli.token_usage || settings.token_usage.unwrap_or(false),
    })
}

// Says where a rejected value came from
fn with_source(result: Result<()>, source: &str) -> Result<()> {
    result.map_err(|e| match e {
        Error::Validation(message) => Error::Validation(format!("{} (from {})", message, source)),
        other => other,
    })
}

// https://github.com/{owner}/{repository}[/...]
pub fn validate_repository_url(url: &str) -> Result<()> {
    let invalid = || {
        Error::Validation(
            "Invalid GitHub repository URL. Please provide a valid URL in the format: \
             https://github.com/username/repository"
                .to_string(),
        )
    };

    let parsed = Url::parse(url).map_err(|_| invalid())?;
    if parsed.scheme() != "https" {
        return Err(invalid());
    }
    if !matches!(parsed.host_str(), Some("github.com") | Some("www.github.com")) {
        return Err(invalid());
    }
    // No ?tab=... or #readme suffixes
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid());
    }

    let segments: Vec<&str> = parsed.path_segments().map(|s| s.collect()).unwrap_or_default();
    if segments.len() < 2 || !segments[..2].iter().all(|s| is_valid_name(s)) {
        return Err(invalid());
    }

    Ok(())
}

fn is_valid_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

pub fn validate_output_file(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(Error::Validation(format!(
            "Invalid output file '{}'. The path points to a directory, but a file path is expected.",
            path.display()
        )));
    }

    // "summary.md" has an empty parent, meaning the current directory
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(Error::Validation(format!(
                "Invalid output file path '{}'. The directory of the specified file does not exist.",
                path.display()
            )));
        }
    }

    Ok(())
}
