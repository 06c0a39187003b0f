use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_RULES_PATH: &str = ".github/pr-labeler.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-labeler.toml.
///
/// All fields are optional — the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where the rule document lives in the labeled repository
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    /// API base URL, for GitHub Enterprise installations.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Repository path of the YAML rule document
    #[serde(default = "default_rules_path")]
    pub path: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

fn default_rules_path() -> String {
    DEFAULT_RULES_PATH.to_string()
}

impl Config {
    /// Load configuration from .pr-labeler.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-labeler.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn api_url(&self) -> &str {
        self.github
            .api_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_API_URL)
    }
}
