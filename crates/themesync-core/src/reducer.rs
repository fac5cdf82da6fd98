use crate::events::RuntimeAction;
use crate::events::SyncAction;
use crate::events::UserAction;
use crate::state::has_changes;
use crate::state::LogLevel;
use crate::state::SyncPhase;
use crate::state::SyncSession;

#[cfg(test)]
mod tests;

/// Pure transition function over (phase, action) pairs. The session is
/// replaced wholesale on every call; effects run elsewhere, keyed off the
/// phase the session has settled into.
///
/// Rules, in order:
/// 1. Terminal phases ignore every action, `Error` included.
/// 2. A runtime `Error` action moves any non-terminal phase to `Error`.
/// 3. Everything else is a per-phase match; unmatched actions are no-ops.
pub fn reduce(session: &SyncSession, action: SyncAction) -> SyncSession {
    if session.phase.is_terminal() {
        return session.clone();
    }

    let mut next = session.clone();

    if let SyncAction::Runtime(RuntimeAction::Error(message)) = action {
        next.push_log(LogLevel::Error, message.clone());
        next.error = Some(message);
        next.phase = SyncPhase::Error;
        return next;
    }

    match (session.phase, action) {
        (
            SyncPhase::Checking,
            SyncAction::Runtime(RuntimeAction::StatusResolved {
                status,
                branch_warning,
            }),
        ) => {
            if let Some(warning) = &branch_warning {
                next.push_log(LogLevel::Warn, warning.clone());
            }
            next.branch_warning = branch_warning;
            let blocked = !status.is_clean && !session.options.force;
            next.repo_status = Some(status);
            next.phase = if blocked {
                SyncPhase::DirtyWarning
            } else {
                SyncPhase::Fetching
            };
        }
        (SyncPhase::Fetching, SyncAction::Runtime(RuntimeAction::DriftResolved(info))) => {
            next.phase = if !has_changes(&info) {
                SyncPhase::UpToDate
            } else if session.options.backup_gate_bypassed() {
                SyncPhase::Preview
            } else {
                SyncPhase::BackupConfirm
            };
            next.update_info = Some(info);
        }
        (SyncPhase::BackupConfirm, SyncAction::User(UserAction::ConfirmBackup)) => {
            next.phase = SyncPhase::BackingUp;
        }
        (SyncPhase::BackupConfirm, SyncAction::User(UserAction::SkipBackup)) => {
            next.phase = SyncPhase::Preview;
        }
        (SyncPhase::BackingUp, SyncAction::Runtime(RuntimeAction::BackupFinished { backup_file })) => {
            next.push_log(LogLevel::Info, format!("backup saved to {backup_file}"));
            next.backup_file = backup_file;
            next.phase = SyncPhase::Preview;
        }
        (SyncPhase::Preview, SyncAction::User(UserAction::ConfirmUpdate)) => {
            // Check-only and dry-run end at the preview; a confirmation in
            // either mode is ignored, regardless of `force`.
            if !session.options.stops_at_preview() {
                next.phase = SyncPhase::Merging;
            }
        }
        (SyncPhase::Merging, SyncAction::Runtime(RuntimeAction::MergeFinished(outcome))) => {
            next.phase = if outcome.has_conflict {
                SyncPhase::Conflict
            } else if !outcome.success {
                next.error = outcome.error.clone();
                SyncPhase::Error
            } else {
                SyncPhase::Installing
            };
            next.merge_result = Some(outcome);
        }
        (SyncPhase::Installing, SyncAction::Runtime(RuntimeAction::InstallLine(line))) => {
            next.push_log(LogLevel::Info, line);
        }
        (SyncPhase::Installing, SyncAction::Runtime(RuntimeAction::InstallFinished)) => {
            next.phase = SyncPhase::Done;
        }
        // Anything else is an event arriving in a phase that does not expect
        // it. The reducer never fails, it ignores.
        (_, _) => {}
    }

    next
}
