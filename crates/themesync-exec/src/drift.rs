use std::fs;

use themesync_core::normalize::manifest_version;
use themesync_core::normalize::normalize_tag;
use themesync_core::normalize::normalize_version;
use themesync_core::state::is_downgrade;
use themesync_core::state::CommitInfo;
use themesync_core::state::RepoStatus;
use themesync_core::state::UpdateInfo;

use crate::git::GitClient;
use crate::git::GitError;
use crate::remote::UPSTREAM_REMOTE;

pub const MANIFEST_FILE: &str = "package.json";

/// Reads the working-tree state: current branch plus uncommitted paths.
pub fn repo_status(git: &GitClient) -> Result<RepoStatus, GitError> {
    let branch = git.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    let porcelain = git.run(&["status", "--porcelain"])?;
    let uncommitted: Vec<String> = porcelain
        .lines()
        .filter_map(|line| line.get(3..))
        .map(str::to_string)
        .filter(|path| !path.is_empty())
        .collect();
    Ok(RepoStatus {
        branch,
        is_clean: uncommitted.is_empty(),
        uncommitted,
    })
}

/// Target of the sync: a normalized tag when pinned, the upstream branch tip
/// otherwise.
pub fn resolve_target_ref(branch: &str, target_tag: Option<&str>) -> String {
    match target_tag {
        Some(tag) => normalize_tag(tag),
        None => format!("{UPSTREAM_REMOTE}/{branch}"),
    }
}

/// Computes the drift summary against the resolved target. Assumes refs are
/// already fetched; never touches the network itself.
pub fn update_info(
    git: &GitClient,
    branch: &str,
    target_tag: Option<&str>,
) -> Result<UpdateInfo, GitError> {
    if git.try_run(&["remote", "get-url", UPSTREAM_REMOTE]).is_none() {
        return Ok(UpdateInfo::none());
    }

    let target_ref = resolve_target_ref(branch, target_tag);
    let counts = git.run(&[
        "rev-list",
        "--left-right",
        "--count",
        &format!("HEAD...{target_ref}"),
    ])?;
    let (ahead, behind) = parse_counts(&counts);

    let downgrade = is_downgrade(target_tag, ahead, behind);
    // On a downgrade the preview shows what will be removed, otherwise what
    // will arrive.
    let preview_range = if downgrade {
        format!("{target_ref}..HEAD")
    } else {
        format!("HEAD..{target_ref}")
    };
    let commits = commit_list(git, &preview_range)?;
    let local_commits = if downgrade {
        commits.clone()
    } else {
        commit_list(git, &format!("{target_ref}..HEAD"))?
    };

    let current_version = fs::read_to_string(git.repo().join(MANIFEST_FILE))
        .ok()
        .as_deref()
        .and_then(manifest_version)
        .unwrap_or_else(|| "unknown".to_string());
    let latest_version = match target_tag {
        Some(tag) => normalize_version(tag),
        None => git
            .try_run(&["show", &format!("{target_ref}:{MANIFEST_FILE}")])
            .as_deref()
            .and_then(manifest_version)
            .unwrap_or_else(|| "unknown".to_string()),
    };

    Ok(UpdateInfo {
        has_upstream: true,
        ahead,
        behind,
        commits,
        local_commits,
        current_version,
        latest_version,
        is_downgrade: downgrade,
    })
}

fn parse_counts(counts: &str) -> (u32, u32) {
    let mut parts = counts.split_whitespace();
    let ahead = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
    let behind = parts.next().and_then(|n| n.parse().ok()).unwrap_or(0);
    (ahead, behind)
}

/// Log for a commit range, newest first: abbreviated hash, subject, relative
/// date, author, tab-separated.
fn commit_list(git: &GitClient, range: &str) -> Result<Vec<CommitInfo>, GitError> {
    let log = git.run(&["log", "--pretty=format:%h%x09%s%x09%cr%x09%an", range])?;
    Ok(log
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(4, '\t');
            Some(CommitInfo {
                hash: parts.next()?.to_string(),
                subject: parts.next()?.to_string(),
                date: parts.next()?.to_string(),
                author: parts.next()?.to_string(),
            })
        })
        .collect())
}
