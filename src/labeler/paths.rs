use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::warn;

/// Gitignore-style matcher over one label's pattern list.
pub struct PathMatcher {
    inner: Option<Gitignore>,
}

impl PathMatcher {
    /// Compile `patterns`. Patterns that fail to compile are skipped with
    /// a warning; the remaining ones still apply.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if let Err(e) = builder.add_line(None, pattern) {
                warn!(pattern, error = %e, "invalid path pattern, skipping");
            }
        }

        let inner = match builder.build() {
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                warn!(error = %e, "failed to build path matcher");
                None
            }
        };
        Self { inner }
    }

    /// True when `path`, or any directory containing it, is matched and
    /// not re-included by a negated pattern.
    pub fn is_match(&self, path: &str) -> bool {
        let Some(gitignore) = &self.inner else {
            return false;
        };
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return false;
        }
        gitignore
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }
}

/// Whether any of `changed_paths` matches any of `patterns`.
pub fn matches<S: AsRef<str>>(patterns: &[S], changed_paths: &[String]) -> bool {
    let matcher = PathMatcher::new(patterns);
    changed_paths.iter().any(|path| matcher.is_match(path))
}
