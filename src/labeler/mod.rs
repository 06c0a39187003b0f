pub mod counts;
pub mod evaluators;
pub mod normalize;
pub mod paths;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::pr::{PrError, PrState, PullRequestHost, PullRequestSnapshot};
use crate::rules::{self, ConfigParseError, RuleSet, Settings};

#[derive(Debug, Error)]
pub enum LabelerError {
    #[error(transparent)]
    Fetch(#[from] PrError),

    #[error(transparent)]
    Config(#[from] ConfigParseError),
}

/// Working memory for one evaluation. Both sets only grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationState {
    /// Labels the configuration claims and may therefore remove
    governed: BTreeSet<String>,
    /// Labels whose condition currently holds
    matched: BTreeSet<String>,
}

impl EvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn govern(&mut self, label: &str) {
        self.governed.insert(label.to_owned());
    }

    pub fn mark_matched(&mut self, label: &str) {
        self.matched.insert(label.to_owned());
    }

    pub fn governed(&self) -> &BTreeSet<String> {
        &self.governed
    }

    pub fn matched(&self) -> &BTreeSet<String> {
        &self.matched
    }
}

/// Label changes computed for one pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Matched labels not yet applied
    pub to_add: BTreeSet<String>,
    /// Governed, unmatched labels that are applied. Computed even when
    /// removal is disabled so it can be reported.
    pub to_remove: BTreeSet<String>,
    /// Whether `to_remove` is acted upon (`remove-labels`)
    pub remove_enabled: bool,
}

impl ReconciliationPlan {
    /// Labels that will actually be removed.
    pub fn removals(&self) -> impl Iterator<Item = &String> {
        self.to_remove.iter().filter(|_| self.remove_enabled)
    }

    /// True when executing the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.removals().next().is_none()
    }
}

/// Result of evaluating one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The lifecycle gate rejected the PR; nothing is done.
    Skipped(PrState),
    Planned(ReconciliationPlan),
}

/// A snapshot and what the labeler decided for it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub pr: PullRequestSnapshot,
    pub outcome: Outcome,
}

/// Lifecycle gate: open PRs always proceed, closed and merged ones only
/// when the matching setting is on.
pub fn admits(state: PrState, settings: &Settings) -> bool {
    match state {
        PrState::Open => true,
        PrState::Closed => settings.process_closed_prs,
        PrState::Merged => settings.process_merged_prs,
    }
}

/// Compute the plan from the accumulated sets and the applied labels.
pub fn reconcile(
    state: &EvaluationState,
    current: &BTreeSet<String>,
    settings: &Settings,
) -> ReconciliationPlan {
    let to_add = state.matched.difference(current).cloned().collect();
    let to_remove = state
        .governed
        .iter()
        .filter(|label| !state.matched.contains(*label) && current.contains(*label))
        .cloned()
        .collect();

    ReconciliationPlan {
        to_add,
        to_remove,
        remove_enabled: settings.remove_labels,
    }
}

/// Evaluate every rule against `pr` and reconcile with its current labels.
///
/// Pure: depends only on the snapshot and the rule set.
pub fn evaluate(pr: &PullRequestSnapshot, rules: &RuleSet) -> Outcome {
    if !admits(pr.state, &rules.settings) {
        return Outcome::Skipped(pr.state);
    }

    let mut state = EvaluationState::new();
    for rule in &rules.rules {
        evaluators::evaluate(rule, pr, &rules.settings, &mut state);
    }
    debug!(governed = ?state.governed(), matched = ?state.matched(), current = ?pr.labels, "rules evaluated");

    Outcome::Planned(reconcile(&state, &pr.labels, &rules.settings))
}

/// Run one labeling pass against `host`.
///
/// Fetch failures and malformed rule documents abort before any label is
/// touched. With `dry_run` the plan is computed but not executed.
pub async fn run<H>(host: &H, dry_run: bool) -> Result<Evaluation, LabelerError>
where
    H: PullRequestHost + ?Sized,
{
    let pr = host.fetch_pull_request().await?;
    let span = info_span!("label", pr = pr.number, state = %pr.state);
    label_pull_request(host, pr, dry_run).instrument(span).await
}

async fn label_pull_request<H>(
    host: &H,
    mut pr: PullRequestSnapshot,
    dry_run: bool,
) -> Result<Evaluation, LabelerError>
where
    H: PullRequestHost + ?Sized,
{
    info!(title = %pr.title, "fetched pull request");

    let raw = host.fetch_rule_configuration().await?;
    let rules = rules::parse(&raw)?;
    info!(rules = rules.rules.len(), settings = ?rules.settings, "fetched rule configuration");

    if !admits(pr.state, &rules.settings) {
        info!(state = %pr.state, "pull request is not open, ignoring");
        return Ok(Evaluation {
            outcome: Outcome::Skipped(pr.state),
            pr,
        });
    }

    if rules.needs_changed_paths() {
        pr.changed_paths = host.list_changed_paths().await?;
        debug!(files = pr.changed_paths.len(), "fetched changed paths");
    }

    let outcome = evaluate(&pr, &rules);
    if let Outcome::Planned(plan) = &outcome {
        if dry_run {
            info!(add = ?plan.to_add, remove = ?plan.to_remove, "dry run, not applying plan");
        } else {
            apply(host, plan).await?;
        }
    }

    Ok(Evaluation { pr, outcome })
}

async fn apply<H>(host: &H, plan: &ReconciliationPlan) -> Result<(), PrError>
where
    H: PullRequestHost + ?Sized,
{
    if plan.to_add.is_empty() {
        info!("no labels to add");
    } else {
        let labels: Vec<String> = plan.to_add.iter().cloned().collect();
        info!(labels = ?labels, "adding labels");
        host.add_labels(&labels).await?;
    }

    if !plan.remove_enabled {
        debug!(labels = ?plan.to_remove, "would have removed these labels");
        return Ok(());
    }
    if plan.to_remove.is_empty() {
        info!("no labels to remove");
        return Ok(());
    }
    info!(labels = ?plan.to_remove, "removing labels");
    for label in plan.removals() {
        host.remove_label(label).await?;
    }
    Ok(())
}
