use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle state of a pull request.
///
/// GitHub reports merged pull requests as `closed` with `merged: true`;
/// the client folds that into `Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
            PrState::Merged => write!(f, "merged"),
        }
    }
}

/// Read-only view of a pull request for one evaluation.
/// Note: not Deserialize; the GitHub client maps its own response type
/// into this so the core never sees API field names.
#[derive(Debug, Clone)]
pub struct PullRequestSnapshot {
    /// PR number (e.g., 42)
    pub number: u64,
    pub state: PrState,
    pub title: String,
    /// Description body; GitHub returns null for an empty body
    pub body: Option<String>,
    /// Author's GitHub login
    pub author: String,
    /// Name of the branch the PR targets (base ref)
    pub target_branch: String,
    pub has_milestone: bool,
    pub comments: u64,
    pub review_comments: u64,
    /// None while GitHub is still computing mergeability
    pub mergeable: Option<bool>,
    pub draft: bool,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    /// Changed file paths. Only populated when a path rule needs them.
    pub changed_paths: Vec<String>,
    /// Labels currently applied to the PR
    pub labels: BTreeSet<String>,
}

impl PullRequestSnapshot {
    /// Total changed lines (additions plus deletions).
    pub fn line_changes(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}
