use crate::config::Config;
use crate::normalize::normalize_version;

/// Phase of a single synchronization session. Every CLI invocation starts at
/// `Checking` and walks the graph until one of the terminal phases is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Checking,
    DirtyWarning,
    Fetching,
    UpToDate,
    BackupConfirm,
    BackingUp,
    Preview,
    Merging,
    Conflict,
    Installing,
    Done,
    Error,
}

impl SyncPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Checking => "Checking repository",
            Self::DirtyWarning => "Uncommitted changes",
            Self::Fetching => "Fetching upstream",
            Self::UpToDate => "Up to date",
            Self::BackupConfirm => "Backup confirmation",
            Self::BackingUp => "Backing up",
            Self::Preview => "Preview",
            Self::Merging => "Applying update",
            Self::Conflict => "Merge conflict",
            Self::Installing => "Installing dependencies",
            Self::Done => "Done",
            Self::Error => "Error",
        }
    }

    /// Terminal phases never transition again, not even on an `Error` event.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DirtyWarning | Self::UpToDate | Self::Conflict | Self::Done | Self::Error
        )
    }
}

/// Snapshot of the working tree, recomputed at the start of every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub branch: String,
    pub is_clean: bool,
    pub uncommitted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub subject: String,
    pub date: String,
    pub author: String,
}

/// Drift summary against the resolved target reference (upstream branch tip
/// or a pinned tag). When `has_upstream` is false every other field is
/// zero-valued and must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub has_upstream: bool,
    pub ahead: u32,
    pub behind: u32,
    /// Incoming commits for a normal update, commits to be removed for a
    /// downgrade. Newest first.
    pub commits: Vec<CommitInfo>,
    /// Local-only commits ahead of the target, independent of direction.
    /// Needed for the rebase preview.
    pub local_commits: Vec<CommitInfo>,
    pub current_version: String,
    pub latest_version: String,
    pub is_downgrade: bool,
}

impl UpdateInfo {
    pub fn none() -> Self {
        Self {
            has_upstream: false,
            ahead: 0,
            behind: 0,
            commits: Vec::new(),
            local_commits: Vec::new(),
            current_version: String::new(),
            latest_version: String::new(),
            is_downgrade: false,
        }
    }
}

/// Outcome of the merge/rebase/downgrade step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub success: bool,
    pub has_conflict: bool,
    pub conflict_files: Vec<String>,
    pub error: Option<String>,
    /// Distinguishes a rebase conflict from a merge conflict; selects the
    /// abort command offered in the recovery instructions.
    pub is_rebase_conflict: bool,
}

impl MergeOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            has_conflict: false,
            conflict_files: Vec::new(),
            error: None,
            is_rebase_conflict: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            has_conflict: false,
            conflict_files: Vec::new(),
            error: Some(message.into()),
            is_rebase_conflict: false,
        }
    }

    pub fn conflicted(files: Vec<String>, rebase: bool) -> Self {
        Self {
            success: false,
            has_conflict: true,
            conflict_files: files,
            error: None,
            is_rebase_conflict: rebase,
        }
    }
}

/// Immutable per-session options, fixed at CLI parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Read-only mode: never mutates the repository, never touches the
    /// network, stops at the preview.
    pub check_only: bool,
    pub skip_backup: bool,
    /// Bypass confirmations. Never overrides `check_only` or `dry_run`.
    pub force: bool,
    /// Pin the sync to a specific release tag instead of the branch tip.
    pub target_tag: Option<String>,
    /// Replay local commits on top of the target instead of squash-merging.
    pub rebase: bool,
    /// Preview only; stops at the preview like `check_only` but still fetches.
    pub dry_run: bool,
}

impl SyncOptions {
    /// Rebase rewrites history, so the backup confirmation is mandatory no
    /// matter what `skip_backup` and `force` say.
    pub fn backup_gate_bypassed(&self) -> bool {
        !self.rebase && (self.skip_backup || self.force)
    }

    pub fn stops_at_preview(&self) -> bool {
        self.check_only || self.dry_run
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// The reducer's state: one value per CLI invocation, replaced wholesale on
/// every transition and discarded at process exit. Nothing here persists.
#[derive(Debug, Clone)]
pub struct SyncSession {
    pub phase: SyncPhase,
    pub repo_status: Option<RepoStatus>,
    pub update_info: Option<UpdateInfo>,
    pub merge_result: Option<MergeOutcome>,
    /// Name of the backup produced this session; empty when none was taken.
    pub backup_file: String,
    pub error: Option<String>,
    pub branch_warning: Option<String>,
    pub session_log: Vec<LogLine>,
    pub options: SyncOptions,
    pub config: Config,
}

impl SyncSession {
    pub fn new(options: SyncOptions, config: Config) -> Self {
        Self {
            phase: SyncPhase::Checking,
            repo_status: None,
            update_info: None,
            merge_result: None,
            backup_file: String::new(),
            error: None,
            branch_warning: None,
            session_log: Vec::new(),
            options,
            config,
        }
    }

    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.session_log.push(LogLine {
            level,
            message: message.into(),
        });
    }
}

/// A downgrade is only a downgrade when a specific tag was requested and the
/// local HEAD has already passed it: strictly ahead, zero behind.
pub fn is_downgrade(target_tag: Option<&str>, ahead: u32, behind: u32) -> bool {
    target_tag.is_some() && ahead > 0 && behind == 0
}

/// Whether the drift summary warrants an update at all. Versions are
/// normalized before comparison so `v1.2.0` and `1.2.0` short-circuit the
/// same way.
pub fn has_changes(info: &UpdateInfo) -> bool {
    let current = normalize_version(&info.current_version);
    let latest = normalize_version(&info.latest_version);
    let version_match = latest != "unknown" && !latest.is_empty() && current == latest;
    !version_match && (info.behind > 0 || (info.is_downgrade && info.ahead > 0))
}
