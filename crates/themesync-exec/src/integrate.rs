use themesync_core::normalize::manifest_version;
use themesync_core::state::MergeOutcome;
use themesync_core::state::SyncOptions;

use crate::drift::MANIFEST_FILE;
use crate::git::GitClient;

/// Mutually exclusive integration strategies, selected from the session
/// options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    Squash,
    Rebase,
    Downgrade,
}

impl UpdateStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Squash => "squash merge",
            Self::Rebase => "rebase",
            Self::Downgrade => "downgrade",
        }
    }
}

pub fn strategy_for(options: &SyncOptions, downgrade: bool) -> UpdateStrategy {
    if options.rebase {
        UpdateStrategy::Rebase
    } else if downgrade {
        UpdateStrategy::Downgrade
    } else {
        UpdateStrategy::Squash
    }
}

/// Applies the chosen strategy against the target ref and classifies the
/// result.
pub fn run_update(git: &GitClient, strategy: UpdateStrategy, target_ref: &str) -> MergeOutcome {
    match strategy {
        UpdateStrategy::Squash => squash_merge(git, target_ref),
        UpdateStrategy::Rebase => rebase_onto(git, target_ref),
        UpdateStrategy::Downgrade => downgrade_to(git, target_ref),
    }
}

/// Unmerged paths, unioned from two independent signals: the diff index and
/// porcelain status codes. De-duplicated, order-stable by first discovery.
pub fn get_conflict_files(git: &GitClient) -> Vec<String> {
    fn push_unique(files: &mut Vec<String>, path: &str) {
        let path = path.trim();
        if !path.is_empty() && !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    }

    let mut files = Vec::new();
    if let Some(unmerged) = git.try_run(&["diff", "--name-only", "--diff-filter=U"]) {
        for line in unmerged.lines() {
            push_unique(&mut files, line);
        }
    }
    if files.is_empty() {
        if let Some(porcelain) = git.try_run(&["status", "--porcelain"]) {
            for line in porcelain.lines() {
                let code = line.get(..2).unwrap_or_default();
                let unmerged = code.contains('U') || code == "AA" || code == "DD";
                if unmerged {
                    if let Some(path) = line.get(3..) {
                        push_unique(&mut files, path);
                    }
                }
            }
        }
    }
    files
}

/// Integrates the target as a single squash commit on top of local history.
/// `--allow-unrelated-histories` covers the first sync of a fork whose
/// history diverged at template creation.
fn squash_merge(git: &GitClient, target_ref: &str) -> MergeOutcome {
    if let Err(err) = git.run(&[
        "merge",
        "--squash",
        "--allow-unrelated-histories",
        target_ref,
    ]) {
        let conflicts = get_conflict_files(git);
        if conflicts.is_empty() {
            return MergeOutcome::failed(err.to_string());
        }
        return MergeOutcome::conflicted(conflicts, false);
    }

    if !staged_changes(git) {
        // No-op merge: nothing to commit.
        return MergeOutcome::succeeded();
    }

    let version = git
        .try_run(&["show", &format!("{target_ref}:{MANIFEST_FILE}")])
        .as_deref()
        .and_then(manifest_version)
        .unwrap_or_else(|| "latest".to_string());
    match git.run(&["commit", "-m", &format!("chore: sync theme with upstream {version}")]) {
        Ok(_) => MergeOutcome::succeeded(),
        Err(err) => MergeOutcome::failed(err.to_string()),
    }
}

/// Replays local commits on top of the target. Conflicts are tagged as
/// rebase conflicts so recovery offers `rebase --abort`.
fn rebase_onto(git: &GitClient, target_ref: &str) -> MergeOutcome {
    match git.run(&["rebase", target_ref]) {
        Ok(_) => MergeOutcome::succeeded(),
        Err(err) => {
            let conflicts = get_conflict_files(git);
            if conflicts.is_empty() {
                MergeOutcome::failed(err.to_string())
            } else {
                MergeOutcome::conflicted(conflicts, true)
            }
        }
    }
}

/// Overwrites the tree with the tag's content and commits only when the tree
/// actually changed. Works directly on the tree, so a failure here is never
/// a content conflict.
fn downgrade_to(git: &GitClient, target_ref: &str) -> MergeOutcome {
    if let Err(err) = git.run(&["checkout", target_ref, "--", "."]) {
        return MergeOutcome::failed(err.to_string());
    }
    if !staged_changes(git) {
        return MergeOutcome::succeeded();
    }
    match git.run(&[
        "commit",
        "-m",
        &format!("chore: downgrade theme to {target_ref}"),
    ]) {
        Ok(_) => MergeOutcome::succeeded(),
        Err(err) => MergeOutcome::failed(err.to_string()),
    }
}

/// `diff --cached --quiet` exits non-zero exactly when something is staged.
fn staged_changes(git: &GitClient) -> bool {
    git.try_run(&["diff", "--cached", "--quiet"]).is_none()
}

/// A conflicted squash merge leaves no MERGE_HEAD, so `merge --abort` alone
/// cannot always unwind it; `reset --merge` covers that case.
pub fn abort_merge(git: &GitClient) -> bool {
    git.try_run(&["merge", "--abort"]).is_some()
        || git.try_run(&["reset", "--merge"]).is_some()
}

pub fn abort_rebase(git: &GitClient) -> bool {
    git.try_run(&["rebase", "--abort"]).is_some()
}
