// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every option is optional here on purpose: values not given on the command
// line fall back to the config file, then to built-in defaults. That merge
// happens in validation.rs, not here.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "github-echo",
    version,
    about = "Obtain in-depth, actionable information about a GitHub repository",
    long_about = "github-echo fetches commits, contributors, issues, pull requests, releases, languages \
                  and the community profile of a GitHub repository, asks an LLM to analyze them, \
                  and prints the resulting insights as Markdown."
)]
pub struct Cli {
    /// GitHub repository URL (e.g., https://github.com/user/repo)
    pub repository_url: String,

    /// Model backend used to generate insights: gemini or groq [default: gemini]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature between 0.0 (deterministic) and 1.0 (more random) [default: 0.5]
    #[arg(short = 't', long = "temperature", allow_negative_numbers = true)]
    pub temperature: Option<f32>,

    /// Write the Markdown summary to this file instead of the terminal
    #[arg(short, long = "output")]
    pub output: Option<PathBuf>,

    /// Print prompt/completion token counts after the summary
    #[arg(long)]
    pub token_usage: bool,

    /// Log each pipeline step to stderr (RUST_LOG overrides this)
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "github-echo",
            "https://github.com/octo/hello",
            "-m",
            "groq",
            "-t",
            "0.2",
            "-o",
            "out.md",
            "--token-usage",
        ])
        .unwrap();

        assert_eq!(cli.repository_url, "https://github.com/octo/hello");
        assert_eq!(cli.model.as_deref(), Some("groq"));
        assert_eq!(cli.temperature, Some(0.2));
        assert_eq!(cli.output, Some(PathBuf::from("out.md")));
        assert!(cli.token_usage);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_version_flag_short_circuits() {
        let err = Cli::try_parse_from(["github-echo", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_repository_url_is_required() {
        assert!(Cli::try_parse_from(["github-echo"]).is_err());
    }
}
