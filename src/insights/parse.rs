// src/insights/parse.rs
// =============================================================================
// Turns the model's reply text into an InsightPayload.
//
// Models sometimes wrap JSON in a fenced code block even in JSON mode, e.g.
//
//   ```json
//   {"summary": [...]}
//   ```
//
// so the fence is stripped first. The payload must then be a JSON object whose
// values are arrays. Array entries that are not well-formed insights are kept
// as empty insights; the renderer drops those later.
// =============================================================================

use serde_json::Value;

use super::{Insight, InsightPayload};
use crate::error::{Error, Result};

pub fn parse_insights(backend: &'static str, text: &str) -> Result<InsightPayload> {
    let malformed = |reason: String| Error::MalformedModelResponse { backend, reason };

    let json = strip_code_fence(text);
    let value: Value = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object at the top level".to_string()))?;

    let mut payload = InsightPayload::default();
    for (category, entries) in object {
        let entries = entries
            .as_array()
            .ok_or_else(|| malformed(format!("category '{}' is not an array", category)))?;
        payload.push(category.clone(), entries.iter().map(to_insight).collect());
    }

    Ok(payload)
}

fn to_insight(entry: &Value) -> Insight {
    let text = |field: &str| {
        entry
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Insight {
        title: text("title"),
        description: text("description"),
    }
}

// Removes a surrounding ``` / ```json fence, if there is one
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...), with or without a newline after it
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
