use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::types::PullRequestSnapshot;
use super::{PrError, PullRequestHost};

/// A label mutation issued against a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelWrite {
    Add(Vec<String>),
    Remove(String),
}

/// A fetch the fixture can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    PullRequest,
    ChangedPaths,
}

impl std::fmt::Display for FetchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStep::PullRequest => write!(f, "pull request"),
            FetchStep::ChangedPaths => write!(f, "changed paths"),
        }
    }
}

/// In-memory host serving a fixed pull request and rule document.
///
/// Writes are recorded and applied to the held label set, so a second
/// run observes the effects of the first.
pub struct FixtureHost {
    pr: Mutex<PullRequestSnapshot>,
    rules: Vec<u8>,
    changed_paths: Vec<String>,
    writes: Mutex<Vec<LabelWrite>>,
    path_listings: Mutex<usize>,
    failing: Option<FetchStep>,
}

impl FixtureHost {
    pub fn new(pr: PullRequestSnapshot, rules: impl Into<Vec<u8>>) -> Self {
        let changed_paths = pr.changed_paths.clone();
        let mut served = pr;
        served.changed_paths.clear();
        Self {
            pr: Mutex::new(served),
            rules: rules.into(),
            changed_paths,
            writes: Mutex::new(Vec::new()),
            path_listings: Mutex::new(0),
            failing: None,
        }
    }

    /// Make `step` fail with `PrError::Unavailable`.
    #[cfg(test)]
    pub fn failing_on(mut self, step: FetchStep) -> Self {
        self.failing = Some(step);
        self
    }

    fn check(&self, step: FetchStep) -> Result<(), PrError> {
        match self.failing {
            Some(failing) if failing == step => Err(PrError::Unavailable(step.to_string())),
            _ => Ok(()),
        }
    }

    /// All writes issued so far, in order.
    pub fn writes(&self) -> Vec<LabelWrite> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times the changed paths were listed.
    #[cfg(test)]
    pub fn path_listings(&self) -> usize {
        *self.path_listings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn labels(&self) -> std::collections::BTreeSet<String> {
        self.pr.lock().unwrap_or_else(PoisonError::into_inner).labels.clone()
    }
}

#[async_trait]
impl PullRequestHost for FixtureHost {
    async fn fetch_pull_request(&self) -> Result<PullRequestSnapshot, PrError> {
        self.check(FetchStep::PullRequest)?;
        Ok(self.pr.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn fetch_rule_configuration(&self) -> Result<Vec<u8>, PrError> {
        Ok(self.rules.clone())
    }

    async fn list_changed_paths(&self) -> Result<Vec<String>, PrError> {
        self.check(FetchStep::ChangedPaths)?;
        *self.path_listings.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(self.changed_paths.clone())
    }

    async fn add_labels(&self, labels: &[String]) -> Result<(), PrError> {
        if labels.is_empty() {
            return Ok(());
        }
        self.pr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .labels
            .extend(labels.iter().cloned());
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LabelWrite::Add(labels.to_vec()));
        Ok(())
    }

    async fn remove_label(&self, name: &str) -> Result<(), PrError> {
        self.pr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .labels
            .remove(name);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LabelWrite::Remove(name.to_string()));
        Ok(())
    }
}
