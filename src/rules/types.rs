use serde::Deserialize;

/// Reconciliation policy switches from the `settings` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub process_closed_prs: bool,
    pub process_merged_prs: bool,
    /// Act on the removal set. Off by default.
    pub remove_labels: bool,
    /// Let keyword rules claim (and so remove) their labels.
    pub remove_keyword_labels: bool,
}

/// A label and the values that trigger it (globs, branches, keywords, logins).
/// Always one or more values, however the document declared them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelValues {
    pub label: String,
    pub values: Vec<String>,
}

/// Bound predicates on a count, all of which must hold.
///
/// Zero or negative thresholds count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Bounds {
    #[serde(alias = "gt")]
    pub greater_than: Option<i64>,
    #[serde(alias = "gte")]
    pub greater_than_or_equal: Option<i64>,
    #[serde(alias = "lt")]
    pub less_than: Option<i64>,
    #[serde(alias = "lte")]
    pub less_than_or_equal: Option<i64>,
}

/// One entry of a count rule list. An entry without a label is kept here
/// and skipped at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRule {
    pub label: Option<String>,
    pub bounds: Bounds,
}

/// Which number a count rule is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMetric {
    Commits,
    LineChanges,
    LineAdditions,
    LineDeletions,
}

impl std::fmt::Display for CountMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountMetric::Commits => write!(f, "commits"),
            CountMetric::LineChanges => write!(f, "line changes"),
            CountMetric::LineAdditions => write!(f, "line additions"),
            CountMetric::LineDeletions => write!(f, "line deletions"),
        }
    }
}

/// Which free-text field a keyword rule searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

/// Single-label facts about a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact {
    Milestone,
    Comments,
    ReviewComments,
    Mergeable,
    Draft,
}

/// One rule category from the document, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Label applied while a fact holds (milestone set, has comments, ...).
    Flag { fact: Fact, label: String },
    Paths(Vec<LabelValues>),
    TargetBranch(Vec<LabelValues>),
    Keywords {
        field: TextField,
        labels: Vec<LabelValues>,
    },
    Count {
        metric: CountMetric,
        rules: Vec<CountRule>,
    },
    Author(Vec<LabelValues>),
}

/// A parsed rule document: rules in evaluation order plus settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    pub settings: Settings,
}

impl RuleSet {
    /// Whether evaluation needs the list of changed paths.
    pub fn needs_changed_paths(&self) -> bool {
        self.rules.iter().any(|rule| matches!(rule, Rule::Paths(_)))
    }
}
