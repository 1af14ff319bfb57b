//! Changed-line detection for "only check new code" mode
//!
//! Asks git for a zero-context diff of one file against `HEAD` and expands
//! every hunk header into the set of added or modified line numbers.
//!
//! Any failure (git missing, file outside a repository, no commits yet,
//! untracked file) yields `None`, which callers treat as "check everything".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tokio::process::Command;

/// Hunk header: `@@ -old_start[,old_count] +new_start[,new_count] @@`
static HUNK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex")
});

/// Set of 1-based line numbers touched since the last commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    lines: BTreeSet<usize>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.iter().copied()
    }
}

impl FromIterator<usize> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

/// Parse a hunk header to get the new-file start line and line count
pub fn parse_hunk_header(header: &str) -> Option<(usize, usize)> {
    let caps = HUNK_HEADER.captures(header)?;
    let start: usize = caps.get(3)?.as_str().parse().ok()?;
    let count: usize = match caps.get(4) {
        Some(c) => c.as_str().parse().ok()?,
        None => 1,
    };
    Some((start, count))
}

/// Expand every hunk header of a unified diff into changed line numbers
pub fn parse_unified_diff(diff: &str) -> ChangeSet {
    diff.lines()
        .filter(|line| line.starts_with("@@"))
        .filter_map(parse_hunk_header)
        .flat_map(|(start, count)| start..start + count)
        .collect()
}

/// Why a change set could not be computed
#[derive(Error, Debug)]
pub enum ChangeSetError {
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Git error: {0}")]
    Git(String),
    #[error("File is not tracked: {0}")]
    Untracked(PathBuf),
    #[error("File cannot be located: {0}")]
    NoWorkdir(PathBuf),
}

/// Computes changed lines by invoking git
#[derive(Debug, Clone)]
pub struct ChangeSetResolver {
    git: PathBuf,
}

impl Default for ChangeSetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSetResolver {
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable
    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    /// Lines changed in `path` since `HEAD`, or `None` to check every line
    pub async fn changed_lines(&self, path: &Path) -> Option<ChangeSet> {
        match self.try_changed_lines(path).await {
            Ok(changes) => {
                tracing::debug!(
                    "{} changed lines in {}",
                    changes.len(),
                    path.display()
                );
                Some(changes)
            }
            Err(e) => {
                tracing::debug!("No change set for {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn try_changed_lines(&self, path: &Path) -> Result<ChangeSet, ChangeSetError> {
        // git runs from the file's directory, so relative paths are resolved first
        let absolute = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| ChangeSetError::NoWorkdir(path.to_path_buf()))?;
        let (Some(workdir), Some(name)) = (absolute.parent(), absolute.file_name()) else {
            return Err(ChangeSetError::NoWorkdir(path.to_path_buf()));
        };
        let name = Path::new(name);

        let output = Command::new(&self.git)
            .args(["diff", "-U0", "--no-color", "--no-ext-diff", "HEAD", "--"])
            .arg(name)
            .current_dir(workdir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ChangeSetError::Git(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let diff = String::from_utf8_lossy(&output.stdout);
        if diff.trim().is_empty() && !self.is_tracked(name, workdir).await? {
            return Err(ChangeSetError::Untracked(path.to_path_buf()));
        }

        Ok(parse_unified_diff(&diff))
    }

    async fn is_tracked(&self, name: &Path, workdir: &Path) -> Result<bool, ChangeSetError> {
        let output = Command::new(&self.git)
            .args(["ls-files", "--error-unmatch", "--"])
            .arg(name)
            .current_dir(workdir)
            .output()
            .await?;
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git(dir: &Path, args: &[&str]) -> bool {
        std::process::Command::new("git")
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Repository with a committed `src/app.js` whose line 2 was added since.
    /// `None` when git is unavailable.
    fn modified_repo(dir: &Path) -> Option<PathBuf> {
        if !git(dir, &["init", "-q"]) {
            return None;
        }
        let file = dir.join("src").join("app.js");
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(&file, "const first = 1;\nconst last = 3;\n").unwrap();
        if !git(dir, &["add", "."]) || !git(dir, &["commit", "-q", "-m", "initial"]) {
            return None;
        }
        std::fs::write(&file, "const first = 1;\nconst second = 2;\nconst last = 3;\n").unwrap();
        Some(file)
    }

    fn lines(changes: Option<ChangeSet>) -> Option<Vec<usize>> {
        changes.map(|c| c.iter().collect())
    }

    #[test]
    fn test_parse_hunk_header() {
        assert_eq!(parse_hunk_header("@@ -1,5 +1,10 @@"), Some((1, 10)));
        assert_eq!(parse_hunk_header("@@ -10 +15,3 @@ function"), Some((15, 3)));
        assert_eq!(parse_hunk_header("@@ -0,0 +1 @@"), Some((1, 1)));
        assert_eq!(parse_hunk_header("@@ -3,2 +2,0 @@"), Some((2, 0)));
        assert_eq!(parse_hunk_header("not a header"), None);
        assert_eq!(parse_hunk_header("@@ garbage @@"), None);
    }

    #[test]
    fn test_hunk_with_zero_old_count_expands() {
        let changes = parse_unified_diff("@@ -10,0 +12,3 @@");
        let lines: Vec<usize> = changes.iter().collect();
        assert_eq!(lines, vec![12, 13, 14]);
    }

    #[test]
    fn test_parse_unified_diff_multiple_hunks() {
        let diff = "\
diff --git a/src/app.js b/src/app.js
index 83db48f..bf269f4 100644
--- a/src/app.js
+++ b/src/app.js
@@ -2 +2 @@ const a = 1;
-const b = 2;
+const bee = 2;
@@ -10,2 +10,0 @@ function load() {
-  x();
-  y();
@@ -20,0 +19,2 @@
+const c = 3;
+const d = 4;
";
        let changes = parse_unified_diff(diff);
        let lines: Vec<usize> = changes.iter().collect();
        assert_eq!(lines, vec![2, 19, 20]);
        assert!(changes.contains(19));
        assert!(!changes.contains(10));
    }

    #[test]
    fn test_parse_unified_diff_empty() {
        assert!(parse_unified_diff("").is_empty());
    }

    #[test]
    fn test_change_set_from_iter() {
        let changes: ChangeSet = [5, 3, 5].into_iter().collect();
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(3));
        assert!(changes.contains(5));
    }

    #[tokio::test]
    async fn test_missing_git_binary_yields_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("app.js");
        std::fs::write(&file, "const value = 1;\n").unwrap();

        let resolver = ChangeSetResolver::new().with_git_binary("definitely-not-a-git-binary");
        assert!(resolver.changed_lines(&file).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_yields_none() {
        let resolver = ChangeSetResolver::new();
        let path = Path::new("/nonexistent/dir/for/changes/app.js");
        assert!(resolver.changed_lines(path).await.is_none());
    }

    #[tokio::test]
    async fn test_changed_lines_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let Some(file) = modified_repo(dir.path()) else {
            return;
        };

        let resolver = ChangeSetResolver::new();
        assert_eq!(lines(resolver.changed_lines(&file).await), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_changed_lines_relative_path() {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir_in(&cwd).unwrap();
        let Some(file) = modified_repo(dir.path()) else {
            return;
        };
        let relative = file.strip_prefix(&cwd).unwrap().to_path_buf();
        assert!(relative.is_relative());

        let resolver = ChangeSetResolver::new();
        assert_eq!(lines(resolver.changed_lines(&relative).await), Some(vec![2]));
        let dotted = Path::new(".").join(&relative);
        assert_eq!(lines(resolver.changed_lines(&dotted).await), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_unmodified_file_has_no_changed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let Some(file) = modified_repo(dir.path()) else {
            return;
        };
        assert!(git(dir.path(), &["commit", "-q", "-am", "second"]));

        let resolver = ChangeSetResolver::new();
        assert_eq!(lines(resolver.changed_lines(&file).await), Some(vec![]));
    }

    #[tokio::test]
    async fn test_untracked_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        if modified_repo(dir.path()).is_none() {
            return;
        }
        let untracked = dir.path().join("src").join("new.js");
        std::fs::write(&untracked, "const fresh = 1;\n").unwrap();

        let resolver = ChangeSetResolver::new();
        assert!(resolver.changed_lines(&untracked).await.is_none());
    }

    #[test]
    fn test_change_set_error_display() {
        let err = ChangeSetError::Git("not a git repository".to_string());
        assert!(err.to_string().contains("Git error"));
        assert!(err.to_string().contains("not a git repository"));
    }
}
