use pretty_assertions::assert_eq;

use super::*;

#[test]
fn downgrade_requires_a_target_tag() {
    // Whatever the counts say, no tag means no downgrade.
    for (ahead, behind) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
        assert!(!is_downgrade(None, ahead, behind));
    }
}

#[test]
fn downgrade_means_strictly_ahead_of_the_tag() {
    assert!(is_downgrade(Some("v1.0.0"), 2, 0));
    assert!(!is_downgrade(Some("v1.0.0"), 0, 0));
    assert!(!is_downgrade(Some("v1.0.0"), 2, 1));
    assert!(!is_downgrade(Some("v1.0.0"), 0, 4));
}

#[test]
fn matching_versions_short_circuit_even_when_counts_disagree() {
    let info = UpdateInfo {
        current_version: "v1.2.0".to_string(),
        latest_version: "1.2.0".to_string(),
        behind: 2,
        ..UpdateInfo::none()
    };
    assert!(!has_changes(&info));

    let uppercase = UpdateInfo {
        current_version: "V1.2.0".to_string(),
        latest_version: "v1.2.0".to_string(),
        behind: 2,
        ..UpdateInfo::none()
    };
    assert!(!has_changes(&uppercase));
}

#[test]
fn unknown_latest_version_never_matches() {
    let info = UpdateInfo {
        current_version: "unknown".to_string(),
        latest_version: "unknown".to_string(),
        behind: 1,
        ..UpdateInfo::none()
    };
    assert!(has_changes(&info));
}

#[test]
fn downgrade_with_only_local_commits_counts_as_a_change() {
    let info = UpdateInfo {
        current_version: "1.4.0".to_string(),
        latest_version: "1.2.0".to_string(),
        ahead: 3,
        behind: 0,
        is_downgrade: true,
        ..UpdateInfo::none()
    };
    assert!(has_changes(&info));
}

#[test]
fn nothing_behind_and_no_downgrade_means_no_changes() {
    let info = UpdateInfo {
        current_version: "1.4.0".to_string(),
        latest_version: "1.5.0".to_string(),
        ahead: 3,
        behind: 0,
        ..UpdateInfo::none()
    };
    assert!(!has_changes(&info));
}

#[test]
fn reducer_reports_up_to_date_for_changeless_drift() {
    let mut start = session(SyncOptions::default());
    start.phase = SyncPhase::Fetching;
    let info = UpdateInfo {
        has_upstream: true,
        current_version: "1.4.0".to_string(),
        latest_version: "1.4.0".to_string(),
        ..UpdateInfo::none()
    };
    let settled = reduce(&start, drift_resolved(info));
    assert_eq!(settled.phase, SyncPhase::UpToDate);
}
