// src/render/markdown.rs
// =============================================================================
// Converts an InsightPayload into Markdown.
//
// Output for each category that has at least one complete insight:
//
//   ## Category Name
//    - **Title**: Description
//    - **Title**: Description
//   <blank line>
//
// Insights with an empty title or description (after trimming) are dropped,
// and a category left with nothing to show gets no heading at all.
// =============================================================================

use crate::insights::InsightPayload;

pub fn json_to_markdown(payload: &InsightPayload) -> String {
    let mut result = String::new();

    for (category, insights) in payload.categories() {
        let mut complete = insights.iter().filter(|insight| insight.is_complete()).peekable();
        if complete.peek().is_none() {
            continue;
        }

        result.push_str(&format!("## {}\n", format_category_name(category)));
        for insight in complete {
            result.push_str(&format!(
                " - **{}**: {}\n",
                insight.title.trim(),
                insight.description.trim()
            ));
        }
        result.push('\n');
    }

    result
}

// "branch_protection" -> "Branch Protection"
pub fn format_category_name(name: &str) -> String {
    name.split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

// First letter upper case, the rest lower case
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
