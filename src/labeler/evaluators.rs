use tracing::{debug, warn};

use super::counts::within_bounds;
use super::normalize::{contains_keyword, normalize};
use super::paths;
use super::EvaluationState;
use crate::pr::PullRequestSnapshot;
use crate::rules::{CountMetric, CountRule, Fact, LabelValues, Rule, Settings, TextField};

/// Apply one rule category to `state`.
///
/// Every label the rule governs goes into `governed`, and every label
/// whose condition holds goes into `matched`. Re-running a rule with the
/// same inputs leaves `state` unchanged.
pub fn evaluate(
    rule: &Rule,
    pr: &PullRequestSnapshot,
    settings: &Settings,
    state: &mut EvaluationState,
) {
    match rule {
        Rule::Flag { fact, label } => evaluate_flag(*fact, label, pr, state),
        Rule::Paths(labels) => evaluate_paths(labels, pr, state),
        Rule::TargetBranch(labels) => {
            debug!(target_branch = %pr.target_branch, "checking target branch rules");
            evaluate_exact(labels, &pr.target_branch, "branch", state)
        }
        Rule::Keywords { field, labels } => evaluate_keywords(*field, labels, pr, settings, state),
        Rule::Count { metric, rules } => evaluate_counts(*metric, rules, pr, state),
        Rule::Author(labels) => evaluate_exact(labels, &pr.author, "author", state),
    }
}

fn fact_holds(fact: Fact, pr: &PullRequestSnapshot) -> bool {
    match fact {
        Fact::Milestone => pr.has_milestone,
        Fact::Comments => pr.comments > 0,
        Fact::ReviewComments => pr.review_comments > 0,
        Fact::Mergeable => pr.mergeable == Some(true),
        Fact::Draft => pr.draft,
    }
}

fn evaluate_flag(fact: Fact, label: &str, pr: &PullRequestSnapshot, state: &mut EvaluationState) {
    state.govern(label);
    if fact_holds(fact, pr) {
        debug!(?fact, label, "fact holds, applying label");
        state.mark_matched(label);
    }
}

fn evaluate_paths(labels: &[LabelValues], pr: &PullRequestSnapshot, state: &mut EvaluationState) {
    for entry in labels {
        state.govern(&entry.label);
        debug!(label = %entry.label, patterns = ?entry.values, "looking for paths");
        if paths::matches(&entry.values, &pr.changed_paths) {
            debug!(label = %entry.label, "found path, applying label");
            state.mark_matched(&entry.label);
        }
    }
}

/// Labels triggered by `actual` equalling one of the configured values.
fn evaluate_exact(
    labels: &[LabelValues],
    actual: &str,
    kind: &'static str,
    state: &mut EvaluationState,
) {
    for entry in labels {
        state.govern(&entry.label);
        if entry.values.iter().any(|value| value == actual) {
            debug!(label = %entry.label, kind, value = actual, "exact match, applying label");
            state.mark_matched(&entry.label);
        }
    }
}

fn evaluate_keywords(
    field: TextField,
    labels: &[LabelValues],
    pr: &PullRequestSnapshot,
    settings: &Settings,
    state: &mut EvaluationState,
) {
    let text = match field {
        TextField::Title => normalize(Some(&pr.title)),
        TextField::Description => normalize(pr.body.as_deref()),
    };

    for entry in labels {
        // Soft matches: only claimed when keyword labels may be removed.
        if settings.remove_keyword_labels {
            state.govern(&entry.label);
        }
        if let Some(keyword) = entry
            .values
            .iter()
            .find(|keyword| contains_keyword(&text, keyword))
        {
            debug!(?field, label = %entry.label, keyword = %keyword, "found keyword, applying label");
            state.mark_matched(&entry.label);
        }
    }
}

fn metric_value(metric: CountMetric, pr: &PullRequestSnapshot) -> u64 {
    match metric {
        CountMetric::Commits => pr.commits,
        CountMetric::LineChanges => pr.line_changes(),
        CountMetric::LineAdditions => pr.additions,
        CountMetric::LineDeletions => pr.deletions,
    }
}

fn evaluate_counts(
    metric: CountMetric,
    rules: &[CountRule],
    pr: &PullRequestSnapshot,
    state: &mut EvaluationState,
) {
    let count = metric_value(metric, pr);
    for (index, rule) in rules.iter().enumerate() {
        let Some(label) = rule.label.as_deref().filter(|l| !l.is_empty()) else {
            warn!(%metric, index, "count rule has no label, skipping");
            continue;
        };
        state.govern(label);
        if within_bounds(count, &rule.bounds) {
            debug!(%metric, count, label, "count within bounds, applying label");
            state.mark_matched(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::tests::test_snapshot;
    use crate::rules::Bounds;

    fn entry(label: &str, values: &[&str]) -> LabelValues {
        LabelValues {
            label: label.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn run(rule: &Rule, pr: &PullRequestSnapshot, settings: &Settings) -> EvaluationState {
        let mut state = EvaluationState::new();
        evaluate(rule, pr, settings, &mut state);
        state
    }

    #[test]
    fn test_flag_rules_govern_and_match_on_fact() {
        let mut pr = test_snapshot();
        pr.comments = 3;
        pr.mergeable = None;

        let comments = Rule::Flag {
            fact: Fact::Comments,
            label: "discussed".to_string(),
        };
        let state = run(&comments, &pr, &Settings::default());
        assert!(state.governed().contains("discussed"));
        assert!(state.matched().contains("discussed"));

        let mergeable = Rule::Flag {
            fact: Fact::Mergeable,
            label: "ready".to_string(),
        };
        let state = run(&mergeable, &pr, &Settings::default());
        assert!(state.governed().contains("ready"));
        assert!(state.matched().is_empty());
    }

    #[test]
    fn test_every_fact_matches_only_when_it_holds() {
        type Setter = fn(&mut PullRequestSnapshot);
        let cases: [(Fact, Setter, Setter); 5] = [
            (Fact::Milestone, |pr| pr.has_milestone = true, |pr| pr.has_milestone = false),
            (Fact::Comments, |pr| pr.comments = 1, |pr| pr.comments = 0),
            (Fact::ReviewComments, |pr| pr.review_comments = 2, |pr| pr.review_comments = 0),
            (Fact::Mergeable, |pr| pr.mergeable = Some(true), |pr| pr.mergeable = Some(false)),
            (Fact::Draft, |pr| pr.draft = true, |pr| pr.draft = false),
        ];

        for (fact, holds, fails) in cases {
            let rule = Rule::Flag {
                fact,
                label: "flagged".to_string(),
            };

            let mut pr = test_snapshot();
            holds(&mut pr);
            let state = run(&rule, &pr, &Settings::default());
            assert!(state.matched().contains("flagged"), "{fact:?} should match");

            let mut pr = test_snapshot();
            fails(&mut pr);
            let state = run(&rule, &pr, &Settings::default());
            assert!(state.matched().is_empty(), "{fact:?} should not match");
            assert!(state.governed().contains("flagged"));
        }
    }

    #[test]
    fn test_path_rule_matches_changed_paths() {
        let mut pr = test_snapshot();
        pr.changed_paths = vec!["docs/readme.md".to_string()];
        let rule = Rule::Paths(vec![entry("docs", &["docs/**"]), entry("rust", &["*.rs"])]);
        let state = run(&rule, &pr, &Settings::default());
        assert!(state.matched().contains("docs"));
        assert!(!state.matched().contains("rust"));
        assert!(state.governed().contains("rust"));
    }

    #[test]
    fn test_target_branch_and_author_are_exact() {
        let mut pr = test_snapshot();
        pr.target_branch = "release".to_string();
        pr.author = "alice".to_string();

        let branch = Rule::TargetBranch(vec![entry("release-branch", &["release", "hotfix"])]);
        assert!(run(&branch, &pr, &Settings::default()).matched().contains("release-branch"));

        let author = Rule::Author(vec![entry("team", &["Alice", "bob"])]);
        assert!(run(&author, &pr, &Settings::default()).matched().is_empty());
    }

    #[test]
    fn test_keyword_labels_only_governed_when_removal_enabled() {
        let mut pr = test_snapshot();
        pr.body = Some("This FIXES the crash".to_string());
        let rule = Rule::Keywords {
            field: TextField::Description,
            labels: vec![entry("bug", &["fixes"]), entry("feature", &["adds"])],
        };

        let soft = run(&rule, &pr, &Settings::default());
        assert!(soft.matched().contains("bug"));
        assert!(soft.governed().is_empty());

        let strict = Settings {
            remove_keyword_labels: true,
            ..Settings::default()
        };
        let state = run(&rule, &pr, &strict);
        assert!(state.governed().contains("bug") && state.governed().contains("feature"));
    }

    #[test]
    fn test_title_keywords_search_title_only() {
        let mut pr = test_snapshot();
        pr.title = "WIP: refactor parser".to_string();
        pr.body = None;
        let rule = Rule::Keywords {
            field: TextField::Title,
            labels: vec![entry("wip", &["wip"])],
        };
        assert!(run(&rule, &pr, &Settings::default()).matched().contains("wip"));
    }

    #[test]
    fn test_count_rule_without_label_is_skipped() {
        let mut pr = test_snapshot();
        pr.commits = 12;
        let rule = Rule::Count {
            metric: CountMetric::Commits,
            rules: vec![
                CountRule {
                    label: None,
                    bounds: Bounds::default(),
                },
                CountRule {
                    label: Some("many-commits".to_string()),
                    bounds: Bounds {
                        greater_than_or_equal: Some(10),
                        ..Bounds::default()
                    },
                },
            ],
        };
        let state = run(&rule, &pr, &Settings::default());
        assert_eq!(state.governed().len(), 1);
        assert!(state.matched().contains("many-commits"));
    }

    #[test]
    fn test_line_metrics() {
        let mut pr = test_snapshot();
        pr.additions = 150;
        pr.deletions = 100;
        let bounds = Bounds {
            greater_than: Some(200),
            ..Bounds::default()
        };
        let rule_for = |metric| Rule::Count {
            metric,
            rules: vec![CountRule {
                label: Some("big".to_string()),
                bounds,
            }],
        };
        let settings = Settings::default();
        assert!(run(&rule_for(CountMetric::LineChanges), &pr, &settings).matched().contains("big"));
        assert!(run(&rule_for(CountMetric::LineAdditions), &pr, &settings).matched().is_empty());
        assert!(run(&rule_for(CountMetric::LineDeletions), &pr, &settings).matched().is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut pr = test_snapshot();
        pr.changed_paths = vec!["docs/a.md".to_string()];
        let rule = Rule::Paths(vec![entry("docs", &["docs/**"])]);
        let mut state = EvaluationState::new();
        evaluate(&rule, &pr, &Settings::default(), &mut state);
        let once = state.clone();
        evaluate(&rule, &pr, &Settings::default(), &mut state);
        assert_eq!(state, once);
    }
}
