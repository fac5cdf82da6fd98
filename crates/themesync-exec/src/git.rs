use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },
}

/// Thin gateway over the `git` binary. Two call shapes with distinct
/// contracts: `run` fails loudly with the process stderr, while `try_run`
/// swallows any failure and returns `None`, for probes where absence of a
/// result is a legitimate answer rather than an error.
#[derive(Debug, Clone)]
pub struct GitClient {
    repo: PathBuf,
}

impl GitClient {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Runs git and returns trimmed stdout, or a `GitError` carrying the
    /// trimmed stderr (or a generic exit message) on non-zero exit.
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .current_dir(&self.repo)
            .args(args)
            .output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(GitError::Command {
                args: args.join(" "),
                stderr: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            })
        }
    }

    /// Probe form: `None` on any failure, spawn errors included.
    pub fn try_run(&self, args: &[&str]) -> Option<String> {
        self.run(args).ok()
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::fixtures::*;
    use super::*;

    #[test]
    fn run_returns_trimmed_stdout() {
        let upstream = make_upstream("1.0.0");
        let git = GitClient::new(upstream.path());
        let branch = git.run(&["rev-parse", "--abbrev-ref", "HEAD"]).expect("branch");
        assert_eq!(branch, "main");
    }

    #[test]
    fn run_carries_stderr_on_failure() {
        let upstream = make_upstream("1.0.0");
        let git = GitClient::new(upstream.path());
        let err = git
            .run(&["rev-parse", "--verify", "refs/heads/not-a-branch"])
            .expect_err("missing ref should fail");
        match err {
            GitError::Command { args, stderr } => {
                assert!(args.contains("rev-parse"));
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn try_run_swallows_failure() {
        let upstream = make_upstream("1.0.0");
        let git = GitClient::new(upstream.path());
        assert_eq!(git.try_run(&["remote", "get-url", "upstream"]), None);
        assert!(git.try_run(&["rev-parse", "HEAD"]).is_some());
    }
}
