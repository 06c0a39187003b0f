use crate::labeler::Outcome;
use crate::pr::PrState;

/// What happened to the removal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    /// Labels were removed
    Applied,
    /// `remove-labels` is off; the set is informational
    Disabled,
    /// Dry run; nothing was written
    DryRun,
}

impl std::fmt::Display for RemovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalMode::Applied => write!(f, "Labels removed"),
            RemovalMode::Disabled => write!(f, "Would remove (remove-labels is off)"),
            RemovalMode::DryRun => write!(f, "Would remove (dry run)"),
        }
    }
}

/// Summary of one labeling pass.
#[derive(Debug)]
pub struct Report {
    /// PR number
    pub pr_number: u64,
    /// PR title
    pub pr_title: String,
    /// PR author
    pub author: String,
    pub state: PrState,
    pub target_branch: String,
    /// Labels on the PR before this pass
    pub current_labels: Vec<String>,
    pub outcome: Outcome,
    pub dry_run: bool,
}

impl Report {
    /// How the removal set should be presented.
    pub fn removal_mode(&self) -> RemovalMode {
        match &self.outcome {
            Outcome::Planned(plan) if !plan.remove_enabled => RemovalMode::Disabled,
            _ if self.dry_run => RemovalMode::DryRun,
            _ => RemovalMode::Applied,
        }
    }

    /// Heading for the add set.
    pub fn add_heading(&self) -> &'static str {
        if self.dry_run {
            "Would add (dry run)"
        } else {
            "Labels added"
        }
    }
}
