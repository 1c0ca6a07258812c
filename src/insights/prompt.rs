// src/insights/prompt.rs
// =============================================================================
// The fixed system instruction and prompt template sent to every backend.
//
// The template embeds the combined repository JSON verbatim, lists what we
// want to learn for each category, and spells out the exact JSON shape the
// model has to answer with.
// =============================================================================

use super::InsightCategory;

pub const SYSTEM_INSTRUCTION: &str = "You are a software developer analyzing a GitHub repository. \
Your task is to provide concise, actionable insights into the repository's development trends, \
community engagement, release cadence, code base composition, popularity, branch protection, \
and areas needing improvement. Use quantifiable metrics to help determine if the repository \
is a good fit for new contributors.";

fn category_instruction(category: InsightCategory) -> &'static str {
    match category {
        InsightCategory::ContributionTrends => {
            "Identify trends in commit frequency, average commits per month, and any peak or dip \
             periods. Highlight active contributors and any gaps in contribution history that may \
             suggest high or low activity periods."
        }
        InsightCategory::CommunityEngagement => {
            "Provide average issue response time and merge time for pull requests. Highlight tags \
             like 'good first issue' and 'help wanted' and their usage frequency to indicate \
             welcoming community practices."
        }
        InsightCategory::ReleaseCadence => {
            "Examine the release pattern and version frequency. Identify if there is a consistent \
             release schedule, and note any recent shifts in release frequency that could reflect \
             changing priorities or stability."
        }
        InsightCategory::CodeBaseComposition => {
            "Summarize primary language composition (top two or three languages by percentage) and \
             dependency health. Identify any outdated or vulnerable dependencies to assess \
             maintenance quality."
        }
        InsightCategory::RepositoryPopularity => {
            "Analyze growth in stars, forks, and watchers over time. Provide traffic data (views, \
             clones) to indicate active user interest. Correlate popular periods with key releases \
             or updates."
        }
        InsightCategory::BranchProtection => {
            "List current branch protection rules (e.g., required reviews, tests). Identify missing \
             protections that could benefit code quality, such as enforcing CI checks."
        }
        InsightCategory::PotentialChanges => {
            "Highlight low-activity areas, outstanding enhancement requests, or any components \
             lacking recent contributions where new contributors can add value."
        }
        InsightCategory::Summary => {
            "Summarize top insights across categories, focusing on repository health, engagement \
             level, and potential for growth. Provide an overall assessment for new contributors."
        }
    }
}

// Renders the user prompt around the already-serialized repository data
pub fn render_prompt(repository_json: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("Based on the following GitHub repository data, provide actionable insights:\n\n");
    prompt.push_str(repository_json);
    prompt.push_str("\n\nFor each category, include:\n");
    prompt.push_str("- Insight title and concise description.\n");
    prompt.push_str("- Data-driven and actionable content, using quantifiable metrics.\n\n");

    prompt.push_str("**Categories and Prompts:**\n\n");
    for category in InsightCategory::ALL {
        prompt.push_str(&format!("- {}: {}\n", category.key(), category_instruction(category)));
    }

    prompt.push_str(
        "\nRespond with a single JSON object and nothing else. Every one of these keys must be \
         present, each holding an array of objects with a \"title\" and a \"description\" string:\n\n",
    );
    prompt.push_str(&response_shape());
    prompt.push('\n');

    prompt
}

// {"contribution_trends": [{"title": "string", "description": "string"}], ...}
fn response_shape() -> String {
    let entries: Vec<String> = InsightCategory::ALL
        .iter()
        .map(|category| {
            format!(
                "  \"{}\": [\n    {{\n      \"title\": \"string\",\n      \"description\": \"string\"\n    }}\n  ]",
                category.key()
            )
        })
        .collect();
    format!("{{\n{}\n}}", entries.join(",\n"))
}
