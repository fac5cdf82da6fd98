use crate::state::MergeOutcome;
use crate::state::RepoStatus;
use crate::state::UpdateInfo;

#[derive(Debug, Clone)]
pub enum SyncAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

/// Explicit confirmations from the person driving the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    ConfirmBackup,
    SkipBackup,
    ConfirmUpdate,
}

/// Results fed back by the effect layer. Effects catch every failure locally
/// and convert it into `Error`; the reducer never sees a thrown error.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    StatusResolved {
        status: RepoStatus,
        branch_warning: Option<String>,
    },
    DriftResolved(UpdateInfo),
    BackupFinished {
        backup_file: String,
    },
    MergeFinished(MergeOutcome),
    InstallLine(String),
    InstallFinished,
    /// Global escape hatch: any non-terminal phase transitions to `Error`.
    Error(String),
}
