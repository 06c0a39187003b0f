pub mod types;

pub use types::{RemovalMode, Report};

use crate::labeler::{Evaluation, Outcome};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a Report from a finished labeling pass.
pub fn build(evaluation: Evaluation, dry_run: bool) -> Report {
    let Evaluation { pr, outcome } = evaluation;
    Report {
        pr_number: pr.number,
        pr_title: pr.title,
        author: pr.author,
        state: pr.state,
        target_branch: pr.target_branch,
        current_labels: pr.labels.into_iter().collect(),
        outcome,
        dry_run,
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(pr = report.pr_number, state = %report.state))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

/// Format and print the report to the terminal with colors.
///
/// PR #42: "Add OAuth2 login flow"
/// Author: alice | State: open | Target: main
/// Current labels: docs, bot
///
/// ═══ Labels added ═══
///   + docs
///
/// ═══ Labels removed ═══
///   - bot
fn print_terminal_report(report: &Report) {
    println!();
    println!("PR #{}: \"{}\"", report.pr_number, report.pr_title);
    println!(
        "Author: {} | State: {} | Target: {}",
        report.author, report.state, report.target_branch
    );
    println!("Current labels: {}", join_or_none(&report.current_labels));
    println!();

    let plan = match &report.outcome {
        Outcome::Skipped(state) => {
            println!(
                "{}",
                format!("═══ Skipped: pull request is {} ═══", state).yellow().bold()
            );
            println!();
            return;
        }
        Outcome::Planned(plan) => plan,
    };

    println!("═══ {} ═══", report.add_heading());
    if plan.to_add.is_empty() {
        println!("  None.");
    }
    for label in &plan.to_add {
        println!("  {} {}", "+".green().bold(), label);
    }
    println!();

    let mode = report.removal_mode();
    println!("═══ {} ═══", mode);
    if plan.to_remove.is_empty() {
        println!("  None.");
    }
    for label in &plan.to_remove {
        let marker = match mode {
            RemovalMode::Applied => "-".red().bold(),
            _ => "-".yellow(),
        };
        println!("  {} {}", marker, label);
    }
    println!();

    if plan.is_noop() {
        println!("{}", "═══ Labels up to date ═══".green().bold());
        println!();
    }
}

/// Write the report as a markdown file.
///
/// # PR #42: "Add OAuth2 login flow"
/// **Author:** alice | **State:** open | **Target:** main
///
/// ## Labels added
/// - `docs`
fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!("# PR #{}: \"{}\"\n\n", report.pr_number, report.pr_title));
    md.push_str(&format!(
        "**Author:** {} | **State:** {} | **Target:** {}\n\n",
        report.author, report.state, report.target_branch
    ));
    md.push_str(&format!(
        "**Current labels:** {}\n\n",
        join_or_none(&report.current_labels)
    ));

    match &report.outcome {
        Outcome::Skipped(state) => {
            md.push_str(&format!("## Skipped: pull request is {}\n", state));
        }
        Outcome::Planned(plan) => {
            md.push_str(&format!("## {}\n\n", report.add_heading()));
            push_label_list(&mut md, plan.to_add.iter());

            md.push_str(&format!("## {}\n\n", report.removal_mode()));
            push_label_list(&mut md, plan.to_remove.iter());
        }
    }

    std::fs::write(path, md)?;
    Ok(())
}

fn push_label_list<'a>(md: &mut String, labels: impl Iterator<Item = &'a String>) {
    let mut any = false;
    for label in labels {
        md.push_str(&format!("- `{}`\n", label));
        any = true;
    }
    if !any {
        md.push_str("None.\n");
    }
    md.push('\n');
}

fn join_or_none(labels: &[String]) -> String {
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeler::tests::test_snapshot;
    use crate::labeler::ReconciliationPlan;
    use crate::pr::PrState;

    fn sample_evaluation(outcome: Outcome) -> Evaluation {
        let mut pr = test_snapshot();
        pr.number = 42;
        pr.title = "Add OAuth2 login flow".to_string();
        pr.author = "alice".to_string();
        pr.labels = ["bot".to_string()].into_iter().collect();
        Evaluation { pr, outcome }
    }

    fn sample_plan() -> ReconciliationPlan {
        ReconciliationPlan {
            to_add: ["docs".to_string()].into_iter().collect(),
            to_remove: ["bot".to_string()].into_iter().collect(),
            remove_enabled: true,
        }
    }

    #[test]
    fn test_build_report_metadata() {
        let report = build(sample_evaluation(Outcome::Planned(sample_plan())), false);
        assert_eq!(report.pr_number, 42);
        assert_eq!(report.author, "alice");
        assert_eq!(report.current_labels, vec!["bot".to_string()]);
        assert!(!report.dry_run);
    }

    #[test]
    fn test_write_markdown_report() {
        let report = build(sample_evaluation(Outcome::Planned(sample_plan())), false);

        let path = std::env::temp_dir().join("pr_labeler_test_report.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# PR #42"));
        assert!(content.contains("**Author:** alice"));
        assert!(content.contains("## Labels added"));
        assert!(content.contains("- `docs`"));
        assert!(content.contains("## Labels removed"));
        assert!(content.contains("- `bot`"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_markdown_skipped_report() {
        let report = build(sample_evaluation(Outcome::Skipped(PrState::Merged)), false);
        let path = std::env::temp_dir().join("pr_labeler_test_skipped.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("## Skipped: pull request is merged"));
        assert!(!content.contains("Labels added"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_terminal_report_does_not_panic() {
        let report = build(sample_evaluation(Outcome::Planned(ReconciliationPlan::default())), true);
        print_terminal_report(&report);
        let skipped = build(sample_evaluation(Outcome::Skipped(PrState::Closed)), false);
        print_terminal_report(&skipped);
    }

    #[test]
    fn test_output_to_file() {
        let report = build(sample_evaluation(Outcome::Planned(sample_plan())), true);
        let path = std::env::temp_dir().join("pr_labeler_test_output.md");
        output(&report, Some(&path)).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
