pub(super) use super::reduce;
pub(super) use crate::config::Config;
pub(super) use crate::events::RuntimeAction;
pub(super) use crate::events::SyncAction;
pub(super) use crate::events::UserAction;
pub(super) use crate::state::has_changes;
pub(super) use crate::state::is_downgrade;
pub(super) use crate::state::CommitInfo;
pub(super) use crate::state::MergeOutcome;
pub(super) use crate::state::RepoStatus;
pub(super) use crate::state::SyncOptions;
pub(super) use crate::state::SyncPhase;
pub(super) use crate::state::SyncSession;
pub(super) use crate::state::UpdateInfo;

mod drift_rules;
mod preview_gate;
mod terminal;

fn session(options: SyncOptions) -> SyncSession {
    SyncSession::new(options, Config::default())
}

fn clean_status() -> RepoStatus {
    RepoStatus {
        branch: "main".to_string(),
        is_clean: true,
        uncommitted: Vec::new(),
    }
}

fn dirty_status(files: &[&str]) -> RepoStatus {
    RepoStatus {
        branch: "main".to_string(),
        is_clean: false,
        uncommitted: files.iter().map(|f| f.to_string()).collect(),
    }
}

fn commit(hash: &str, subject: &str) -> CommitInfo {
    CommitInfo {
        hash: hash.to_string(),
        subject: subject.to_string(),
        date: "2 days ago".to_string(),
        author: "upstream".to_string(),
    }
}

fn drift(ahead: u32, behind: u32, commits: Vec<CommitInfo>) -> UpdateInfo {
    UpdateInfo {
        has_upstream: true,
        ahead,
        behind,
        commits,
        local_commits: Vec::new(),
        current_version: "1.0.0".to_string(),
        latest_version: "1.1.0".to_string(),
        is_downgrade: false,
    }
}

fn status_resolved(status: RepoStatus) -> SyncAction {
    SyncAction::Runtime(RuntimeAction::StatusResolved {
        status,
        branch_warning: None,
    })
}

fn drift_resolved(info: UpdateInfo) -> SyncAction {
    SyncAction::Runtime(RuntimeAction::DriftResolved(info))
}
