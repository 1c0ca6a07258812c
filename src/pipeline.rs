// src/pipeline.rs
// =============================================================================
// The summarization pipeline, start to finish:
//
//   URL --parse--> RepositoryReference
//       --fetch--> CombinedRepositoryData   (eight concurrent GitHub calls)
//       --model--> InsightPayload + usage   (one backend call)
//       --render-> Markdown
//
// Data only flows forward. The first error stops the pipeline and nothing is
// rendered, so a failed run never produces partial Markdown.
// =============================================================================

use tracing::info;

use crate::error::Result;
use crate::github::{fetch_github_data, GitHubApi, RepositoryReference};
use crate::insights::{GenerationConfig, SummaryBackend, UsageMetadata};
use crate::render;

#[derive(Debug, Clone)]
pub struct Outcome {
    pub markdown: String,
    pub usage: UsageMetadata,
}

pub async fn summarize_repository<G, B>(
    github: &G,
    backend: &B,
    repository_url: &str,
    config: &GenerationConfig,
) -> Result<Outcome>
where
    G: GitHubApi + ?Sized,
    B: SummaryBackend + ?Sized,
{
    config.validate()?;

    let reference = RepositoryReference::parse(repository_url)?;
    info!(repository = %reference, backend = backend.name(), "summarizing");

    let data = fetch_github_data(github, &reference).await?;
    let summary = backend.generate(&data, config).await?;
    let markdown = render::json_to_markdown(&summary.payload);

    info!(
        categories = summary.payload.len(),
        markdown_bytes = markdown.len(),
        "summary rendered"
    );

    Ok(Outcome {
        markdown,
        usage: summary.usage,
    })
}
