pub mod types;

pub use types::{
    Bounds, CountMetric, CountRule, Fact, LabelValues, Rule, RuleSet, Settings, TextField,
};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigParseError {
    #[error("Failed to parse rule configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The rule document as written. Fields that accept a scalar or a
/// sequence stay as raw YAML until `lower` normalizes them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDocument {
    milestone: Option<Value>,
    comments: Option<Value>,
    review_comments: Option<Value>,
    mergeable: Option<Value>,
    draft: Option<Value>,
    path_labels: Option<Mapping>,
    target_branch_labels: Option<Mapping>,
    #[serde(alias = "pr-title-keyword-labels")]
    title_keyword_labels: Option<Mapping>,
    #[serde(alias = "pr-description-keyword-labels")]
    description_keyword_labels: Option<Mapping>,
    commit_count_labels: Option<Vec<Value>>,
    line_changes_labels: Option<Vec<Value>>,
    line_addition_labels: Option<Vec<Value>>,
    line_deletion_labels: Option<Vec<Value>>,
    #[serde(alias = "pr-author-labels")]
    author_labels: Option<Mapping>,
    settings: Option<Settings>,
}

/// Decode a rule document into a `RuleSet`.
///
/// An empty document yields an empty rule set. A document that is not
/// valid YAML, or whose categories have the wrong shape, is rejected as a
/// whole. Individual entries that cannot be used are skipped with a warning.
pub fn parse(raw: &[u8]) -> Result<RuleSet, ConfigParseError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        debug!("rule configuration is empty");
        return Ok(RuleSet::default());
    }

    let value: Value = serde_yaml::from_slice(raw)?;
    if value.is_null() {
        return Ok(RuleSet::default());
    }

    let document: RawDocument = serde_yaml::from_value(value)?;
    Ok(lower(document))
}

fn lower(doc: RawDocument) -> RuleSet {
    let mut rules = Vec::new();

    let flags = [
        (Fact::Milestone, "milestone", doc.milestone),
        (Fact::Comments, "comments", doc.comments),
        (Fact::ReviewComments, "review-comments", doc.review_comments),
        (Fact::Mergeable, "mergeable", doc.mergeable),
        (Fact::Draft, "draft", doc.draft),
    ];
    for (fact, key, value) in flags {
        if let Some(label) = value.and_then(|v| label_setting(key, v)) {
            rules.push(Rule::Flag { fact, label });
        }
    }

    let paths = label_values("path-labels", doc.path_labels);
    if !paths.is_empty() {
        rules.push(Rule::Paths(paths));
    }

    let branches = label_values("target-branch-labels", doc.target_branch_labels);
    if !branches.is_empty() {
        rules.push(Rule::TargetBranch(branches));
    }

    let keywords = [
        (TextField::Title, "title-keyword-labels", doc.title_keyword_labels),
        (
            TextField::Description,
            "description-keyword-labels",
            doc.description_keyword_labels,
        ),
    ];
    for (field, key, mapping) in keywords {
        let labels = label_values(key, mapping);
        if !labels.is_empty() {
            rules.push(Rule::Keywords { field, labels });
        }
    }

    let counts = [
        (CountMetric::Commits, "commit-count-labels", doc.commit_count_labels),
        (CountMetric::LineChanges, "line-changes-labels", doc.line_changes_labels),
        (CountMetric::LineAdditions, "line-addition-labels", doc.line_addition_labels),
        (CountMetric::LineDeletions, "line-deletion-labels", doc.line_deletion_labels),
    ];
    for (metric, key, entries) in counts {
        let entries = count_rules(key, entries);
        if !entries.is_empty() {
            rules.push(Rule::Count {
                metric,
                rules: entries,
            });
        }
    }

    let authors = label_values("author-labels", doc.author_labels);
    if !authors.is_empty() {
        rules.push(Rule::Author(authors));
    }

    RuleSet {
        rules,
        settings: doc.settings.unwrap_or_default(),
    }
}

/// String form of a YAML scalar; `None` for null, sequences and mappings.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A single-label setting. Absent, null, `false` and `""` all disable it.
fn label_setting(key: &str, value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Bool(true) => {
            warn!(key, "label setting needs a label name, ignoring");
            None
        }
        other => {
            let label = scalar(&other);
            if label.is_none() {
                warn!(key, "label setting is not a scalar, ignoring");
            }
            label
        }
    }
}

/// Normalize `label: value | [values]` into one `LabelValues` per label.
fn label_values(key: &str, mapping: Option<Mapping>) -> Vec<LabelValues> {
    let Some(mapping) = mapping else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(mapping.len());
    for (raw_label, raw_values) in mapping {
        let Some(label) = scalar(&raw_label) else {
            warn!(key, "label name is not a scalar, skipping entry");
            continue;
        };

        let values: Vec<String> = match raw_values {
            Value::Sequence(items) => items
                .iter()
                .filter_map(|item| {
                    let value = scalar(item);
                    if value.is_none() {
                        warn!(key, label = %label, "ignoring non-scalar value");
                    }
                    value
                })
                .collect(),
            other => scalar(&other).into_iter().collect(),
        };

        if values.is_empty() {
            warn!(key, label = %label, "label has no values, skipping entry");
            continue;
        }
        out.push(LabelValues { label, values });
    }
    out
}

/// Decode count rule entries. The label goes through `scalar` like label
/// map keys; the remaining keys are the bounds.
fn count_rules(key: &str, entries: Option<Vec<Value>>) -> Vec<CountRule> {
    entries
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Value::Mapping(mut fields) = entry else {
                warn!(key, index, "count rule is not a mapping, skipping entry");
                return None;
            };
            let label = fields.remove("label").as_ref().and_then(scalar);
            match serde_yaml::from_value::<Bounds>(Value::Mapping(fields)) {
                Ok(bounds) => Some(CountRule { label, bounds }),
                Err(e) => {
                    warn!(key, index, error = %e, "malformed count rule, skipping entry");
                    None
                }
            }
        })
        .collect()
}
