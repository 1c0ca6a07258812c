// src/github/fetch.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Strategy:
// - One authenticated GET per endpoint, no retries
// - Every request carries the same three headers:
//     Accept: application/vnd.github+json
//     Authorization: Bearer <token>
//     X-GitHub-Api-Version: <version>
// - Non-2xx statuses are mapped to typed errors so the user gets a useful hint
// - Request URLs are built segment by segment, so owner and repository names
//   are percent-encoded and can never add a query or fragment
//
// Rust concepts:
// - Traits: GitHubApi lets tests swap the network for canned data
// - async fn in traits via the async-trait crate
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::reference::RepositoryReference;
use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// The eight fixed endpoints we query for every repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RepositoryMetadata,
    CommitHistory,
    Contributors,
    Issues,
    PullRequests,
    Releases,
    Languages,
    CommunityProfile,
}

impl Endpoint {
    // Key under which this endpoint's data lands in the combined structure
    pub fn key(self) -> &'static str {
        match self {
            Endpoint::RepositoryMetadata => "repository_metadata",
            Endpoint::CommitHistory => "commit_history",
            Endpoint::Contributors => "contributors",
            Endpoint::Issues => "issues",
            Endpoint::PullRequests => "pull_requests",
            Endpoint::Releases => "releases",
            Endpoint::Languages => "languages",
            Endpoint::CommunityProfile => "community_profile",
        }
    }

    // Path segments relative to the API base, e.g. ["repos", "octo", "hello", "pulls"]
    pub fn segments(self, reference: &RepositoryReference) -> Vec<&str> {
        let suffix: &[&'static str] = match self {
            Endpoint::RepositoryMetadata => &[],
            Endpoint::CommitHistory => &["commits"],
            Endpoint::Contributors => &["contributors"],
            Endpoint::Issues => &["issues"],
            Endpoint::PullRequests => &["pulls"],
            Endpoint::Releases => &["releases"],
            Endpoint::Languages => &["languages"],
            Endpoint::CommunityProfile => &["community", "profile"],
        };

        let mut segments = vec!["repos", reference.owner.as_str(), reference.name.as_str()];
        segments.extend_from_slice(suffix);
        segments
    }
}

// Anything that can answer "give me the JSON for this endpoint"
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_json(&self, reference: &RepositoryReference, endpoint: Endpoint) -> Result<Value>;
}

// The real client, backed by reqwest
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    token: String,
    api_version: String,
}

impl GitHubClient {
    pub fn new(token: &str, api_version: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE, token, api_version)
    }

    pub fn with_base_url(base_url: &str, token: &str, api_version: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| Error::Validation(format!("Invalid GitHub API base URL '{}'", base_url)))?;

        // GitHub refuses requests without a User-Agent
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| Error::Transport {
                endpoint: "HTTP client setup".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base,
            token: token.to_string(),
            api_version: api_version.to_string(),
        })
    }

    // {base}/repos/{owner}/{repo}/..., one encoded segment at a time
    pub fn request_url(&self, reference: &RepositoryReference, endpoint: Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Validation(format!("Invalid GitHub API base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(endpoint.segments(reference));
        Ok(url)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_json(&self, reference: &RepositoryReference, endpoint: Endpoint) -> Result<Value> {
        let url = self.request_url(reference, endpoint)?;
        debug!(endpoint = endpoint.key(), %url, "requesting");

        let transport = |source| Error::Transport {
            endpoint: endpoint.key().to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", &self.api_version)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(endpoint = endpoint.key(), status = status.as_u16(), bytes = body.len(), "response");

        if !status.is_success() {
            return Err(classify_failure(reference, endpoint, status, body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Upstream {
            endpoint: endpoint.key().to_string(),
            status: status.as_u16(),
            body: format!("response is not valid JSON: {}", e),
        })
    }
}

// Maps a non-2xx status to the matching error variant
fn classify_failure(
    reference: &RepositoryReference,
    endpoint: Endpoint,
    status: StatusCode,
    body: String,
) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized {
            endpoint: endpoint.key().to_string(),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            owner: reference.owner.clone(),
            repo: reference.name.clone(),
            endpoint: endpoint.key().to_string(),
        },
        _ => Error::Upstream {
            endpoint: endpoint.key().to_string(),
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestServer;

    fn reference() -> RepositoryReference {
        RepositoryReference {
            owner: "octo".to_string(),
            name: "hello".to_string(),
        }
    }

    #[test]
    fn test_request_urls() {
        let client = GitHubClient::new("t", "v").unwrap();
        let url = |endpoint| client.request_url(&reference(), endpoint).unwrap().to_string();

        assert_eq!(url(Endpoint::RepositoryMetadata), "https://api.github.com/repos/octo/hello");
        assert_eq!(url(Endpoint::PullRequests), "https://api.github.com/repos/octo/hello/pulls");
        assert_eq!(
            url(Endpoint::CommunityProfile),
            "https://api.github.com/repos/octo/hello/community/profile"
        );
    }

    #[test]
    fn test_request_url_encodes_names() {
        let client = GitHubClient::with_base_url("https://ghe.example.com/api/v3/", "t", "v").unwrap();
        let odd = RepositoryReference {
            owner: "octo".to_string(),
            name: "hello#readme".to_string(),
        };

        let url = client.request_url(&odd, Endpoint::Languages).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/octo/hello%23readme/languages");
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            GitHubClient::with_base_url("not a url", "t", "v"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_classify_failure() {
        let r = reference();
        assert!(matches!(
            classify_failure(&r, Endpoint::Issues, StatusCode::UNAUTHORIZED, String::new()),
            Error::Unauthorized { .. }
        ));

        match classify_failure(&r, Endpoint::Contributors, StatusCode::NOT_FOUND, String::new()) {
            Error::NotFound { owner, repo, endpoint } => {
                assert_eq!((owner.as_str(), repo.as_str()), ("octo", "hello"));
                assert_eq!(endpoint, "contributors");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match classify_failure(&r, Endpoint::Releases, StatusCode::BAD_GATEWAY, "oops".into()) {
            Error::Upstream { status, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_json_sends_github_headers() {
        let server = TestServer::start(|_| (200, r#"{"Rust": 1024}"#.to_string())).await;
        let client = GitHubClient::with_base_url(&server.base_url, "t0ken", "2022-11-28").unwrap();

        let value = client.get_json(&reference(), Endpoint::Languages).await.unwrap();
        assert_eq!(value["Rust"], 1024);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("get /repos/octo/hello/languages "));
        assert!(request.contains("accept: application/vnd.github+json"));
        assert!(request.contains("authorization: bearer t0ken"));
        assert!(request.contains("x-github-api-version: 2022-11-28"));
        assert!(request.contains("user-agent: github-echo/"));
    }

    #[tokio::test]
    async fn test_get_json_maps_statuses() {
        let server = TestServer::start(|path| {
            if path.ends_with("/issues") {
                (401, r#"{"message": "Bad credentials"}"#.to_string())
            } else if path.ends_with("/pulls") {
                (500, "boom".to_string())
            } else {
                (200, "not json".to_string())
            }
        })
        .await;
        let client = GitHubClient::with_base_url(&server.base_url, "t", "v").unwrap();

        let err = client.get_json(&reference(), Endpoint::Issues).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));

        let err = client.get_json(&reference(), Endpoint::PullRequests).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 500, .. }));

        let err = client.get_json(&reference(), Endpoint::Releases).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_get_json_connection_refused_is_transport_error() {
        // Grab a free port, then close the listener so nothing answers on it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GitHubClient::with_base_url(&format!("http://{}", addr), "t", "v").unwrap();
        let err = client.get_json(&reference(), Endpoint::Languages).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
