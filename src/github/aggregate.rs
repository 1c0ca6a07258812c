// src/github/aggregate.rs
// =============================================================================
// Fetches all eight endpoints concurrently and combines them.
//
// How it works:
// 1. Start all eight requests at once with futures::try_join!
// 2. Each result is trimmed down to the fields we care about
// 3. As soon as one request fails, the whole join fails with that error and
//    the requests still in flight are dropped
//
// All eight futures are polled on the current task, so nothing here needs a
// lock: every fetch produces its own independent value.
// =============================================================================

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{Endpoint, GitHubApi, RepositoryReference};
use crate::error::{Error, Result};

const METADATA_FIELDS: &[&str] = &[
    "name",
    "full_name",
    "description",
    "html_url",
    "homepage",
    "license",
    "stargazers_count",
    "watchers_count",
    "forks_count",
    "open_issues_count",
    "subscribers_count",
    "created_at",
    "updated_at",
    "pushed_at",
    "size",
    "language",
    "topics",
];

const CONTRIBUTOR_FIELDS: &[&str] = &["login", "id", "avatar_url", "html_url", "contributions"];

const COMMUNITY_FIELDS: &[&str] = &[
    "health_percentage",
    "description",
    "files",
    "notes",
    "status",
    "activity",
];

// Everything we know about a repository, one field per endpoint.
// Serializes to a JSON object whose keys match Endpoint::key().
#[derive(Debug, Clone, Serialize)]
pub struct CombinedRepositoryData {
    pub repository_metadata: Value,
    pub commit_history: Value,
    pub contributors: Value,
    pub issues: Value,
    pub pull_requests: Value,
    pub releases: Value,
    pub languages: Value,
    pub community_profile: Value,
}

// Fetches and combines all repository data
//
// Fails with the error of the first endpoint that fails.
pub async fn fetch_github_data<A>(api: &A, reference: &RepositoryReference) -> Result<CombinedRepositoryData>
where
    A: GitHubApi + ?Sized,
{
    info!(repository = %reference, "fetching repository data");

    let (
        repository_metadata,
        commit_history,
        contributors,
        issues,
        pull_requests,
        releases,
        languages,
        community_profile,
    ) = futures::try_join!(
        fetch_endpoint(api, reference, Endpoint::RepositoryMetadata),
        fetch_endpoint(api, reference, Endpoint::CommitHistory),
        fetch_endpoint(api, reference, Endpoint::Contributors),
        fetch_endpoint(api, reference, Endpoint::Issues),
        fetch_endpoint(api, reference, Endpoint::PullRequests),
        fetch_endpoint(api, reference, Endpoint::Releases),
        fetch_endpoint(api, reference, Endpoint::Languages),
        fetch_endpoint(api, reference, Endpoint::CommunityProfile),
    )?;

    info!(repository = %reference, "all endpoints fetched");

    Ok(CombinedRepositoryData {
        repository_metadata,
        commit_history,
        contributors,
        issues,
        pull_requests,
        releases,
        languages,
        community_profile,
    })
}

async fn fetch_endpoint<A>(api: &A, reference: &RepositoryReference, endpoint: Endpoint) -> Result<Value>
where
    A: GitHubApi + ?Sized,
{
    let value = api.get_json(reference, endpoint).await?;

    // A null body would leave a hole in the combined data
    if value.is_null() {
        return Err(Error::Upstream {
            endpoint: endpoint.key().to_string(),
            status: 200,
            body: "empty response body".to_string(),
        });
    }

    Ok(project(endpoint, value))
}

// Keeps only the fields we send to the model
fn project(endpoint: Endpoint, value: Value) -> Value {
    match endpoint {
        // Single objects: a fixed set of keys
        Endpoint::RepositoryMetadata => pick_fields(&value, METADATA_FIELDS),
        Endpoint::CommunityProfile => pick_fields(&value, COMMUNITY_FIELDS),

        // Arrays: every element projected the same way
        Endpoint::CommitHistory => map_array(&value, project_commit),
        Endpoint::Contributors => map_array(&value, |c| pick_fields(c, CONTRIBUTOR_FIELDS)),

        // Everything else as GitHub sent it
        Endpoint::Issues | Endpoint::PullRequests | Endpoint::Releases | Endpoint::Languages => value,
    }
}

// Builds an object with exactly `fields`; missing ones become null
fn pick_fields(value: &Value, fields: &[&str]) -> Value {
    let picked: Map<String, Value> = fields
        .iter()
        .map(|field| {
            let v = value.get(*field).cloned().unwrap_or(Value::Null);
            (field.to_string(), v)
        })
        .collect();
    Value::Object(picked)
}

fn map_array(value: &Value, f: impl Fn(&Value) -> Value) -> Value {
    let items = value
        .as_array()
        .map(|items| items.iter().map(f).collect())
        .unwrap_or_default();
    Value::Array(items)
}

// sha and url live on the outer object, the rest on the nested "commit"
fn project_commit(commit: &Value) -> Value {
    let inner = commit.get("commit").unwrap_or(&Value::Null);
    let field = |source: &Value, name: &str| source.get(name).cloned().unwrap_or(Value::Null);

    let mut projected = Map::new();
    projected.insert("sha".to_string(), field(commit, "sha"));
    projected.insert("author".to_string(), field(inner, "author"));
    projected.insert("committer".to_string(), field(inner, "committer"));
    projected.insert("message".to_string(), field(inner, "message"));
    projected.insert("url".to_string(), field(commit, "url"));
    Value::Object(projected)
}
