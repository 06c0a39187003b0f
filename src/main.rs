mod config;
mod labeler;
mod pr;
mod report;
mod rules;

use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// PR Labeler — CLI tool that applies and retracts labels on a GitHub Pull
/// Request from the declarative rules in the repository's rule file.
#[derive(Parser, Debug)]
#[command(name = "pr-labeler", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    ///
    /// Not required when --mock is used.
    pr_url: Option<String>,

    /// Compute the label plan without adding or removing any label
    #[arg(long)]
    dry_run: bool,

    /// Optional output file path for markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use a built-in mock PR and rule file for demo purposes (no GitHub token needed)
    #[arg(long)]
    r#mock: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let evaluation = if cli.r#mock {
        info!("using mock PR data for demo");
        let host = build_mock_host();
        let evaluation = labeler::run(&host, cli.dry_run).await?;
        debug!(writes = host.writes().len(), "mock label writes recorded");
        evaluation
    } else {
        let pr_url = cli.pr_url.as_deref().ok_or(
            "PR URL is required unless --mock is used. Usage: pr-labeler <URL> or pr-labeler --mock",
        )?;

        let _main_span = info_span!("pr_label", pr_url = %pr_url).entered();

        info!("parsing PR URL");
        let parsed_url = pr::parse_pr_url(pr_url)?;
        debug!(owner = %parsed_url.owner, repo = %parsed_url.repo, pr = parsed_url.pr_number, "parsed PR URL");

        info!("loading configuration");
        let config = config::Config::load()?;

        let host = pr::GitHubClient::new(parsed_url, &config)?;
        info!(dry_run = cli.dry_run, "labeling pull request");
        labeler::run(&host, cli.dry_run).await?
    };

    info!("generating report");
    let built_report = report::build(evaluation, cli.dry_run);
    report::output(&built_report, cli.output.as_deref())?;
    info!(state = %built_report.state, "done");

    Ok(())
}

/// Build an in-memory host from a fixture PR and the embedded rule file.
/// This enables running the full labeling pipeline without a GitHub token.
fn build_mock_host() -> pr::FixtureHost {
    let rules = include_str!("../tests/fixtures/pr-labeler.yml");

    let snapshot = pr::PullRequestSnapshot {
        number: 42,
        state: pr::PrState::Open,
        title: "Add OAuth2 login flow".to_string(),
        body: Some("Replaces session cookies with OAuth2.\n\nThis is a Breaking Change for API clients.".to_string()),
        author: "alice".to_string(),
        target_branch: "release".to_string(),
        has_milestone: true,
        comments: 4,
        review_comments: 0,
        mergeable: Some(true),
        draft: false,
        commits: 7,
        additions: 320,
        deletions: 45,
        changed_paths: vec![
            "src/auth/oauth.rs".to_string(),
            "src/auth/config.rs".to_string(),
            "docs/auth.md".to_string(),
        ],
        labels: BTreeSet::from(["wip".to_string(), "needs-design".to_string()]),
    };

    pr::FixtureHost::new(snapshot, rules)
}
