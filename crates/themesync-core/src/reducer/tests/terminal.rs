use pretty_assertions::assert_eq;

use super::*;

const TERMINALS: &[SyncPhase] = &[
    SyncPhase::DirtyWarning,
    SyncPhase::UpToDate,
    SyncPhase::Conflict,
    SyncPhase::Done,
    SyncPhase::Error,
];

fn every_action() -> Vec<SyncAction> {
    vec![
        SyncAction::User(UserAction::ConfirmBackup),
        SyncAction::User(UserAction::SkipBackup),
        SyncAction::User(UserAction::ConfirmUpdate),
        super::status_resolved(clean_status()),
        super::drift_resolved(drift(0, 1, Vec::new())),
        SyncAction::Runtime(RuntimeAction::BackupFinished {
            backup_file: "b".to_string(),
        }),
        SyncAction::Runtime(RuntimeAction::MergeFinished(MergeOutcome::succeeded())),
        SyncAction::Runtime(RuntimeAction::InstallLine("line".to_string())),
        SyncAction::Runtime(RuntimeAction::InstallFinished),
        SyncAction::Runtime(RuntimeAction::Error("late failure".to_string())),
    ]
}

#[test]
fn terminal_phases_ignore_every_action() {
    for &phase in TERMINALS {
        let mut start = session(SyncOptions::default());
        start.phase = phase;
        for action in every_action() {
            let settled = reduce(&start, action);
            assert_eq!(settled.phase, phase, "phase {} moved", phase.label());
        }
    }
}

#[test]
fn error_event_escapes_from_any_non_terminal_phase() {
    for phase in [
        SyncPhase::Checking,
        SyncPhase::Fetching,
        SyncPhase::BackupConfirm,
        SyncPhase::BackingUp,
        SyncPhase::Preview,
        SyncPhase::Merging,
        SyncPhase::Installing,
    ] {
        let mut start = session(SyncOptions::default());
        start.phase = phase;
        let settled = reduce(
            &start,
            SyncAction::Runtime(RuntimeAction::Error("boom".to_string())),
        );
        assert_eq!(settled.phase, SyncPhase::Error, "from {}", phase.label());
        assert_eq!(settled.error.as_deref(), Some("boom"));
    }
}

#[test]
fn unexpected_events_are_no_ops() {
    let mut start = session(SyncOptions::default());
    start.phase = SyncPhase::Checking;

    let settled = reduce(&start, SyncAction::Runtime(RuntimeAction::InstallFinished));
    assert_eq!(settled.phase, SyncPhase::Checking);

    let settled = reduce(&start, SyncAction::User(UserAction::ConfirmUpdate));
    assert_eq!(settled.phase, SyncPhase::Checking);
}
