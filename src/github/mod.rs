// src/github/mod.rs
// =============================================================================
// This module gathers everything we know about a GitHub repository.
//
// Submodules:
// - reference: turns a repository URL into (owner, name)
// - fetch: one authenticated GET per REST endpoint
// - aggregate: runs the eight endpoint fetches concurrently and combines them
// =============================================================================

mod aggregate;
mod fetch;
mod reference;

pub use aggregate::{fetch_github_data, CombinedRepositoryData};
pub use fetch::{Endpoint, GitHubApi, GitHubClient};
pub use reference::RepositoryReference;

#[cfg(test)]
pub(crate) use aggregate::tests as fakes;
