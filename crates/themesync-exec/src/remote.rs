use themesync_core::normalize::normalize_remote_url;

use crate::git::GitClient;

pub const UPSTREAM_REMOTE: &str = "upstream";

/// Outcome of resolving the upstream remote. A URL mismatch is never
/// auto-corrected; it needs a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Ready { existed: bool },
    Mismatch { current_url: String },
    Missing,
    AddFailed { message: String },
}

/// Ensures the `upstream` remote exists and points at the expected URL
/// (normalized comparison). `allow_add` is false in check-only mode, which
/// must never mutate the remote set.
pub fn ensure_upstream_remote(git: &GitClient, expected_url: &str, allow_add: bool) -> RemoteStatus {
    match git.try_run(&["remote", "get-url", UPSTREAM_REMOTE]) {
        Some(current_url) => {
            if normalize_remote_url(&current_url) == normalize_remote_url(expected_url) {
                RemoteStatus::Ready { existed: true }
            } else {
                RemoteStatus::Mismatch { current_url }
            }
        }
        None => {
            if !allow_add {
                return RemoteStatus::Missing;
            }
            match git.run(&["remote", "add", UPSTREAM_REMOTE, expected_url]) {
                Ok(_) => RemoteStatus::Ready { existed: false },
                Err(err) => RemoteStatus::AddFailed {
                    message: err.to_string(),
                },
            }
        }
    }
}
