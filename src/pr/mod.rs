pub mod fixture;
pub mod github;
pub mod types;

pub use fixture::FixtureHost;
pub use github::GitHubClient;
pub use types::{PrState, PrUrl, PullRequestSnapshot};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid GitHub API URL: {0}")]
    InvalidApiUrl(String),

    #[error("GitHub token not found in environment")]
    MissingToken,

    #[error("Host could not serve {0}")]
    Unavailable(String),
}

/// Everything the labeler needs from the hosting service for one pull request.
///
/// Fetches may fail with `PrError`. Writes are only issued after a full
/// plan has been computed.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch the pull request snapshot. `changed_paths` is left empty.
    async fn fetch_pull_request(&self) -> Result<PullRequestSnapshot, PrError>;

    /// Fetch the raw rule configuration document.
    async fn fetch_rule_configuration(&self) -> Result<Vec<u8>, PrError>;

    /// List the paths touched by the pull request.
    async fn list_changed_paths(&self) -> Result<Vec<String>, PrError>;

    /// Add labels in a single call. Callers skip this for an empty slice.
    async fn add_labels(&self, labels: &[String]) -> Result<(), PrError>;

    async fn remove_label(&self, name: &str) -> Result<(), PrError>;
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}
