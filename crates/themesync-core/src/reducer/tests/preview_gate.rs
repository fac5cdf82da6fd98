use pretty_assertions::assert_eq;

use super::*;

fn preview(options: SyncOptions) -> SyncSession {
    let mut s = session(options);
    s.phase = SyncPhase::Preview;
    s
}

#[test]
fn confirm_moves_preview_to_merging() {
    let start = preview(SyncOptions::default());
    let settled = reduce(&start, SyncAction::User(UserAction::ConfirmUpdate));
    assert_eq!(settled.phase, SyncPhase::Merging);
}

#[test]
fn check_only_never_leaves_preview() {
    let start = preview(SyncOptions {
        check_only: true,
        force: true,
        ..SyncOptions::default()
    });
    let settled = reduce(&start, SyncAction::User(UserAction::ConfirmUpdate));
    assert_eq!(settled.phase, SyncPhase::Preview);
}

#[test]
fn dry_run_overrides_force() {
    let start = preview(SyncOptions {
        dry_run: true,
        force: true,
        ..SyncOptions::default()
    });
    let settled = reduce(&start, SyncAction::User(UserAction::ConfirmUpdate));
    assert_eq!(settled.phase, SyncPhase::Preview);
}

#[test]
fn runtime_results_are_ignored_while_waiting_for_confirmation() {
    let start = preview(SyncOptions::default());
    let settled = reduce(
        &start,
        SyncAction::Runtime(RuntimeAction::MergeFinished(MergeOutcome::succeeded())),
    );
    assert_eq!(settled.phase, SyncPhase::Preview);
    assert!(settled.merge_result.is_none());
}
