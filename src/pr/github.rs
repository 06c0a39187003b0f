use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{PrState, PrUrl, PullRequestSnapshot};
use super::{PrError, PullRequestHost};
use crate::config::Config;

const USER_AGENT: &str = "pr-labeler";
const FILES_PER_PAGE: usize = 100;

/// `PullRequestHost` backed by the GitHub REST API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    rules_path: String,
    pr: PrUrl,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct BaseRef {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Deserialize)]
struct Milestone {}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    state: String,
    #[serde(default)]
    merged: bool,
    title: String,
    body: Option<String>,
    user: User,
    base: BaseRef,
    milestone: Option<Milestone>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    review_comments: u64,
    mergeable: Option<bool>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    commits: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    labels: Vec<LabelResponse>,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
}

impl PullResponse {
    fn into_snapshot(self) -> PullRequestSnapshot {
        let state = if self.merged {
            PrState::Merged
        } else if self.state == "closed" {
            PrState::Closed
        } else {
            PrState::Open
        };

        PullRequestSnapshot {
            number: self.number,
            state,
            title: self.title,
            body: self.body,
            author: self.user.login,
            target_branch: self.base.name,
            has_milestone: self.milestone.is_some(),
            comments: self.comments,
            review_comments: self.review_comments,
            mergeable: self.mergeable,
            draft: self.draft,
            commits: self.commits,
            additions: self.additions,
            deletions: self.deletions,
            changed_paths: Vec::new(),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl GitHubClient {
    pub fn new(pr: PrUrl, config: &Config) -> Result<Self, PrError> {
        let token = config.github_token().ok_or(PrError::MissingToken)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url().to_string(),
            token,
            rules_path: config.rules.path.clone(),
            pr,
        })
    }

    /// Build `{api}/repos/{owner}/{repo}/{segments...}` with each segment escaped.
    fn endpoint<'a, I>(&self, segments: I) -> Result<Url, PrError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url =
            Url::parse(&self.api_url).map_err(|_| PrError::InvalidApiUrl(self.api_url.clone()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PrError::InvalidApiUrl(self.api_url.clone()))?;
            path.pop_if_empty()
                .extend(["repos", self.pr.owner.as_str(), self.pr.repo.as_str()])
                .extend(segments);
        }
        Ok(url)
    }

    fn pull_endpoint(&self, rest: &[&str]) -> Result<Url, PrError> {
        let number = self.pr.pr_number.to_string();
        self.endpoint(["pulls", number.as_str()].into_iter().chain(rest.iter().copied()))
    }

    fn issue_endpoint(&self, rest: &[&str]) -> Result<Url, PrError> {
        let number = self.pr.pr_number.to_string();
        self.endpoint(["issues", number.as_str()].into_iter().chain(rest.iter().copied()))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    #[instrument(skip(self), fields(owner = %self.pr.owner, repo = %self.pr.repo, pr = self.pr.pr_number))]
    async fn fetch_pull_request(&self) -> Result<PullRequestSnapshot, PrError> {
        debug!("fetching PR metadata from GitHub API");
        let metadata = self
            .request(reqwest::Method::GET, self.pull_endpoint(&[])?)
            .send()
            .await?
            .error_for_status()?
            .json::<PullResponse>()
            .await?;
        debug!(title = %metadata.title, state = %metadata.state, merged = metadata.merged, "received PR metadata");
        Ok(metadata.into_snapshot())
    }

    #[instrument(skip(self), fields(path = %self.rules_path))]
    async fn fetch_rule_configuration(&self) -> Result<Vec<u8>, PrError> {
        let url = self.endpoint(
            std::iter::once("contents").chain(self.rules_path.split('/').filter(|s| !s.is_empty())),
        )?;
        let bytes = self
            .request(reqwest::Method::GET, url)
            .header("Accept", "application/vnd.github.raw")
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!(config_bytes = bytes.len(), "received rule configuration");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), fields(pr = self.pr.pr_number))]
    async fn list_changed_paths(&self) -> Result<Vec<String>, PrError> {
        let mut paths = Vec::new();
        let mut page = 1usize;
        loop {
            let mut url = self.pull_endpoint(&["files"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &FILES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let files = self
                .request(reqwest::Method::GET, url)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<FileResponse>>()
                .await?;
            let fetched = files.len();
            paths.extend(files.into_iter().map(|f| f.filename));
            debug!(page, fetched, "received changed files page");

            if fetched < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(paths)
    }

    #[instrument(skip(self), fields(pr = self.pr.pr_number))]
    async fn add_labels(&self, labels: &[String]) -> Result<(), PrError> {
        if labels.is_empty() {
            return Ok(());
        }
        self.request(reqwest::Method::POST, self.issue_endpoint(&["labels"])?)
            .json(&serde_json::json!({ "labels": labels }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self), fields(pr = self.pr.pr_number))]
    async fn remove_label(&self, name: &str) -> Result<(), PrError> {
        let response = self
            .request(reqwest::Method::DELETE, self.issue_endpoint(&["labels", name])?)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(label = %name, "label already absent");
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        let mut config = Config::default();
        config.github.token = Some("test-token".to_string());
        let pr = PrUrl {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
        };
        GitHubClient::new(pr, &config).unwrap()
    }

    fn pull_json(state: &str, merged: bool) -> serde_json::Value {
        serde_json::json!({
            "number": 42,
            "state": state,
            "merged": merged,
            "title": "Add OAuth2 login flow",
            "body": null,
            "user": { "login": "alice" },
            "base": { "ref": "release" },
            "milestone": { "title": "v1.0" },
            "comments": 2,
            "review_comments": 0,
            "mergeable": null,
            "draft": true,
            "commits": 3,
            "additions": 320,
            "deletions": 45,
            "labels": [{ "name": "docs" }, { "name": "bot" }]
        })
    }

    #[test]
    fn test_pull_response_maps_to_snapshot() {
        let response: PullResponse = serde_json::from_value(pull_json("open", false)).unwrap();
        let pr = response.into_snapshot();
        assert_eq!(pr.state, PrState::Open);
        assert_eq!(pr.author, "alice");
        assert_eq!(pr.target_branch, "release");
        assert!(pr.has_milestone);
        assert_eq!(pr.mergeable, None);
        assert!(pr.draft);
        assert!(pr.body.is_none());
        assert!(pr.labels.contains("docs") && pr.labels.contains("bot"));
    }

    #[test]
    fn test_merged_flag_overrides_closed_state() {
        let merged: PullResponse = serde_json::from_value(pull_json("closed", true)).unwrap();
        assert_eq!(merged.into_snapshot().state, PrState::Merged);

        let closed: PullResponse = serde_json::from_value(pull_json("closed", false)).unwrap();
        assert_eq!(closed.into_snapshot().state, PrState::Closed);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let mut config = Config::default();
        config.github.token = None;
        if std::env::var("GITHUB_TOKEN").is_err() {
            let pr = PrUrl {
                owner: "org".to_string(),
                repo: "repo".to_string(),
                pr_number: 1,
            };
            assert!(matches!(GitHubClient::new(pr, &config), Err(PrError::MissingToken)));
        }
    }

    #[test]
    fn test_label_endpoint_escapes_name() {
        let url = client().issue_endpoint(&["labels", "needs review/ui"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/org/repo/issues/42/labels/needs%20review%2Fui"
        );
    }

    #[test]
    fn test_files_endpoint() {
        let url = client().pull_endpoint(&["files"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/org/repo/pulls/42/files");
    }
}
