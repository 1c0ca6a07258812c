// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Load the optional config file and resolve credentials
// 3. Validate everything before touching the network
// 4. Run the pipeline (fetch -> summarize -> render)
// 5. Write the Markdown to a file or the terminal
// 6. Exit with 0 on success, 1 on any error
//
// Errors from every stage end up in exactly one place: main() prints them
// with a tip and exits non-zero. No partial output is written on failure.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;        // src/cli.rs - command-line parsing
mod config;     // src/config.rs - config file and credentials
mod error;      // src/error.rs - the error type shared by every stage
mod github;     // src/github/ - GitHub REST fetching and aggregation
mod insights;   // src/insights/ - prompt, model backends, response parsing
mod pipeline;   // src/pipeline.rs - ties the stages together
mod render;     // src/render/ - Markdown and terminal output
mod validation; // src/validation.rs - argument merging and checks

#[cfg(test)]
mod test_support;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::{ConfigFile, Credentials};
use github::GitHubClient;
use insights::{GenerationConfig, UsageMetadata};
use pipeline::Outcome;
use validation::RunOptions;

#[tokio::main]
async fn main() {
    // --help and --version exit here with code 0
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            report_error(&e);
            1
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout only ever carries the summary
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "github_echo=debug" } else { "github_echo=warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // A .env file is optional
    dotenvy::dotenv().ok();

    let config = ConfigFile::load()?;
    let options = validation::resolve_options(&cli, &config.settings)?;

    // Credentials are checked up front: the GitHub token always, and the key
    // of the selected backend only
    let credentials = Credentials::from_env(&config.api_keys);
    let github = GitHubClient::new(credentials.github_token()?, &credentials.github_api_version)?;
    let backend = insights::build_backend(options.model, &credentials)?;

    print_banner(&options);

    let generation = GenerationConfig::with_temperature(options.temperature);
    let outcome =
        pipeline::summarize_repository(&github, backend.as_ref(), &options.repository_url, &generation)
            .await?;

    write_output(&outcome, options.output_file.as_deref())?;

    if options.token_usage {
        print_token_usage(&outcome.usage);
    }

    Ok(())
}

fn print_banner(options: &RunOptions) {
    eprintln!(
        "{} {}",
        "[Model Selected]".cyan().bold(),
        options.model.to_string().yellow().bold()
    );
    eprintln!(
        "{} {} {}",
        "[Model Temperature]".cyan().bold(),
        options.temperature.to_string().yellow().bold(),
        "(higher values are more random)".dimmed().italic()
    );
    eprintln!(
        "{} {}\n",
        "[Display Token Usage Stats]".cyan().bold(),
        options.token_usage.to_string().yellow().bold()
    );
}

fn write_output(outcome: &Outcome, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        fs::write(path, &outcome.markdown)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!(
            "\n✨ {} {}",
            "Summary written to".bold(),
            path.display().to_string().cyan().bold()
        );
        return Ok(());
    }

    if outcome.markdown.is_empty() {
        println!("\n⚠️  The model returned no complete insights for this repository.");
        return Ok(());
    }

    println!("\n✨ {}\n", "Task completed! Here is the generated summary:".bold());
    print!("{}", render::render_for_terminal(&outcome.markdown));
    Ok(())
}

fn print_token_usage(usage: &UsageMetadata) {
    eprintln!("\n{}", "Token Usage:".green().bold());
    eprintln!("{}", "-------------".yellow().bold());
    eprintln!("- {} {}", "Completion Tokens:".cyan(), usage.completion_tokens.to_string().bold());
    eprintln!("- {} {}", "Prompt Tokens:".cyan(), usage.prompt_tokens.to_string().bold());
    eprintln!("- {} {}", "Total Tokens:".cyan(), usage.total_tokens.to_string().bold());
}

// The single place where errors are shown to the user
fn report_error(e: &anyhow::Error) {
    eprintln!("\n{}\n", "🚨 Something went wrong!".red().bold());
    eprintln!("{} {:#}\n", "💡 Error:".red().bold(), e);

    if let Some(tip) = e.downcast_ref::<error::Error>().and_then(error::Error::tip) {
        eprintln!("{} {}\n", "Tip:".yellow().bold(), tip);
    }

    eprintln!(
        "{} Use {} to get usage information.\n",
        "Tip:".yellow().bold(),
        "github-echo --help".bright_magenta().bold()
    );
    eprintln!("{}", "For more help, please refer to the project README file.".green().bold());
}
