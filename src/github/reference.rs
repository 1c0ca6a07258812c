// src/github/reference.rs
// =============================================================================
// Extracts the (owner, repository) pair from a GitHub URL.
//
// The URL is split on '/', so for https://github.com/rust-lang/rust we get:
//   ["https:", "", "github.com", "rust-lang", "rust"]
//      0       1       2             3          4
// Index 3 is the owner and index 4 is the repository. Anything after index 4
// (a trailing slash, /tree/main, /issues, ...) is ignored, and so is a
// ?query or #fragment, which is cut off before splitting.
// =============================================================================

use std::fmt;

use crate::error::{Error, Result};

const FORMAT_HINT: &str =
    "ensure the URL is in the form 'https://github.com/{owner}/{repository}'";

// Which repository every endpoint fetch is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
}

impl RepositoryReference {
    // Parses a GitHub repository URL
    //
    // Example:
    //   "https://github.com/rust-lang/rust/tree/master" -> ("rust-lang", "rust")
    pub fn parse(url: &str) -> Result<Self> {
        // "https://github.com/octo/hello#readme" names octo/hello
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').collect();

        if segments.len() < 5 || segments[3].is_empty() || segments[4].is_empty() {
            return Err(Error::InvalidReference {
                input: url.to_string(),
                hint: FORMAT_HINT.to_string(),
            });
        }

        Ok(Self {
            owner: segments[3].to_string(),
            name: segments[4].to_string(),
        })
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
