use std::sync::mpsc::Sender;

use themesync_core::events::RuntimeAction;
use themesync_core::state::SyncPhase;
use themesync_core::state::SyncSession;

use crate::backup::BackupRunner;
use crate::drift::repo_status;
use crate::drift::resolve_target_ref;
use crate::drift::update_info;
use crate::git::GitClient;
use crate::install::detect_package_manager;
use crate::install::reinstall_dependencies;
use crate::install::CancelToken;
use crate::integrate::run_update;
use crate::integrate::strategy_for;
use crate::remote::ensure_upstream_remote;
use crate::remote::RemoteStatus;
use crate::remote::UPSTREAM_REMOTE;

/// Owns the side-effectful collaborators and runs the effect associated with
/// the phase the reducer has settled into. Phases without I/O are pure
/// waypoints and dispatch nothing. Re-entrancy is guarded by the caller
/// dispatching once per phase entry, not by the effects themselves.
pub struct EffectRuntime {
    git: GitClient,
    backup: Box<dyn BackupRunner>,
}

impl EffectRuntime {
    pub fn new(git: GitClient, backup: Box<dyn BackupRunner>) -> Self {
        Self { git, backup }
    }

    pub fn git(&self) -> &GitClient {
        &self.git
    }

    /// Runs the effect for the session's current phase; every failure is
    /// converted into a `RuntimeAction::Error` event, never a panic or a
    /// propagated error. Returns a cancellation token only for the one
    /// genuinely asynchronous effect (dependency install).
    pub fn dispatch(&self, session: &SyncSession, events: &Sender<RuntimeAction>) -> Option<CancelToken> {
        match session.phase {
            SyncPhase::Checking => {
                self.run_checking(session, events);
                None
            }
            SyncPhase::Fetching => {
                self.run_fetching(session, events);
                None
            }
            SyncPhase::BackingUp => {
                self.run_backing_up(session, events);
                None
            }
            SyncPhase::Merging => {
                self.run_merging(session, events);
                None
            }
            SyncPhase::Installing => Some(self.run_installing(session, events)),
            _ => None,
        }
    }

    fn run_checking(&self, session: &SyncSession, events: &Sender<RuntimeAction>) {
        let upstream_url = &session.config.upstream.url;
        if upstream_url.is_empty() {
            emit(events, RuntimeAction::Error(
                "no upstream URL configured; set [upstream].url in .themesync.toml".to_string(),
            ));
            return;
        }

        let status = match repo_status(&self.git) {
            Ok(status) => status,
            Err(err) => {
                emit(events, RuntimeAction::Error(err.to_string()));
                return;
            }
        };

        // Check-only must never mutate the remote set.
        let allow_add = !session.options.check_only;
        match ensure_upstream_remote(&self.git, upstream_url, allow_add) {
            RemoteStatus::Ready { .. } => {}
            RemoteStatus::Mismatch { current_url } => {
                emit(events, RuntimeAction::Error(format!(
                    "the {UPSTREAM_REMOTE} remote points at {current_url}, expected {upstream_url}; \
                     fix it with `git remote set-url {UPSTREAM_REMOTE} {upstream_url}`"
                )));
                return;
            }
            RemoteStatus::Missing => {
                emit(events, RuntimeAction::Error(format!(
                    "no {UPSTREAM_REMOTE} remote configured; re-run without --check to add it, \
                     or run `git remote add {UPSTREAM_REMOTE} {upstream_url}`"
                )));
                return;
            }
            RemoteStatus::AddFailed { message } => {
                emit(events, RuntimeAction::Error(format!(
                    "could not add the {UPSTREAM_REMOTE} remote: {message}"
                )));
                return;
            }
        }

        let expected_branch = &session.config.upstream.branch;
        let branch_warning = (status.branch != *expected_branch).then(|| {
            format!(
                "current branch '{}' is not '{expected_branch}'; the update will apply to the checked-out branch",
                status.branch
            )
        });
        emit(events, RuntimeAction::StatusResolved {
            status,
            branch_warning,
        });
    }

    fn run_fetching(&self, session: &SyncSession, events: &Sender<RuntimeAction>) {
        let branch = &session.config.upstream.branch;
        let target_tag = session.options.target_tag.as_deref();
        let target_ref = resolve_target_ref(branch, target_tag);

        if session.options.check_only {
            // Never touch the network in check-only mode; a tracking ref must
            // already exist locally.
            let probe = if target_tag.is_some() {
                target_ref.clone()
            } else {
                format!("refs/remotes/{target_ref}")
            };
            if self.git.try_run(&["rev-parse", "--verify", &probe]).is_none() {
                emit(events, RuntimeAction::Error(format!(
                    "{target_ref} is not available locally; run `git fetch {UPSTREAM_REMOTE} --tags` \
                     first, then retry --check"
                )));
                return;
            }
        } else if let Err(err) = self.git.run(&["fetch", UPSTREAM_REMOTE, "--tags"]) {
            emit(events, RuntimeAction::Error(format!(
                "fetch from {UPSTREAM_REMOTE} failed ({err}); check your network connection"
            )));
            return;
        }

        match update_info(&self.git, branch, target_tag) {
            Ok(info) => emit(events, RuntimeAction::DriftResolved(info)),
            Err(err) => emit(events, RuntimeAction::Error(err.to_string())),
        }
    }

    fn run_backing_up(&self, session: &SyncSession, events: &Sender<RuntimeAction>) {
        match self.backup.run_backup(session.options.force) {
            Ok(outcome) => emit(events, RuntimeAction::BackupFinished {
                backup_file: outcome.backup_file,
            }),
            Err(err) => emit(events, RuntimeAction::Error(format!("backup failed: {err}"))),
        }
    }

    fn run_merging(&self, session: &SyncSession, events: &Sender<RuntimeAction>) {
        let downgrade = session
            .update_info
            .as_ref()
            .is_some_and(|info| info.is_downgrade);
        let strategy = strategy_for(&session.options, downgrade);
        let target_ref = resolve_target_ref(
            &session.config.upstream.branch,
            session.options.target_tag.as_deref(),
        );
        let outcome = run_update(&self.git, strategy, &target_ref);
        emit(events, RuntimeAction::MergeFinished(outcome));
    }

    fn run_installing(&self, session: &SyncSession, events: &Sender<RuntimeAction>) -> CancelToken {
        let manager = detect_package_manager(
            self.git.repo(),
            session.config.install.package_manager.as_deref(),
        );
        let token = CancelToken::new();
        let line_events = events.clone();
        let done_events = events.clone();
        reinstall_dependencies(
            self.git.repo(),
            &manager,
            token.clone(),
            move |line| {
                let _ = line_events.send(RuntimeAction::InstallLine(line));
            },
            move |result| {
                if result.success {
                    let _ = done_events.send(RuntimeAction::InstallFinished);
                } else {
                    let _ = done_events.send(RuntimeAction::Error(result.message));
                }
            },
        );
        token
    }
}

fn emit(events: &Sender<RuntimeAction>, action: RuntimeAction) {
    let _ = events.send(action);
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use pretty_assertions::assert_eq;
    use themesync_core::config::Config;
    use themesync_core::state::SyncOptions;
    use themesync_core::state::SyncPhase;
    use themesync_core::state::SyncSession;

    use crate::backup::BackupError;
    use crate::backup::BackupOutcome;
    use crate::backup::BackupRunner;
    use crate::git::fixtures::*;

    use super::*;

    struct FixedBackup(Result<&'static str, &'static str>);

    impl BackupRunner for FixedBackup {
        fn run_backup(&self, _force: bool) -> Result<BackupOutcome, BackupError> {
            match self.0 {
                Ok(name) => Ok(BackupOutcome {
                    backup_file: name.to_string(),
                }),
                Err(message) => Err(BackupError::Io(std::io::Error::other(message))),
            }
        }
    }

    fn session_for(upstream_url: &str, options: SyncOptions) -> SyncSession {
        let mut config = Config::default();
        config.upstream.url = upstream_url.to_string();
        SyncSession::new(options, config)
    }

    fn recv(rx: &mpsc::Receiver<RuntimeAction>) -> RuntimeAction {
        rx.recv_timeout(std::time::Duration::from_secs(30))
            .expect("effect should emit")
    }

    #[test]
    fn checking_effect_resolves_status_and_remote() {
        let upstream = make_upstream("1.0.0");
        let fork = make_fork(upstream.path());
        let runtime = EffectRuntime::new(
            GitClient::new(fork_path(&fork)),
            Box::new(FixedBackup(Ok("unused"))),
        );
        let session = session_for(
            upstream.path().to_str().expect("utf8 path"),
            SyncOptions::default(),
        );
        let (tx, rx) = mpsc::channel();

        runtime.dispatch(&session, &tx);
        match recv(&rx) {
            RuntimeAction::StatusResolved {
                status,
                branch_warning,
            } => {
                assert!(status.is_clean);
                assert_eq!(branch_warning, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn checking_under_check_only_fails_without_mutating_remotes() {
        let standalone = make_upstream("1.0.0");
        let git = GitClient::new(standalone.path());
        let runtime = EffectRuntime::new(git.clone(), Box::new(FixedBackup(Ok("unused"))));
        let session = session_for(
            "https://github.com/acme/theme",
            SyncOptions {
                check_only: true,
                ..SyncOptions::default()
            },
        );
        let (tx, rx) = mpsc::channel();

        runtime.dispatch(&session, &tx);
        match recv(&rx) {
            RuntimeAction::Error(message) => assert!(message.contains("no upstream remote")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(git.try_run(&["remote", "get-url", UPSTREAM_REMOTE]), None);
    }

    #[test]
    fn fetching_effect_computes_drift() {
        let upstream = make_upstream("1.0.0");
        let fork = make_fork(upstream.path());
        write_file(upstream.path(), "src/config.ts", "export const site = 'v2';\n");
        commit_all(upstream.path(), "feat: change");
        let runtime = EffectRuntime::new(
            GitClient::new(fork_path(&fork)),
            Box::new(FixedBackup(Ok("unused"))),
        );
        let mut session = session_for(
            upstream.path().to_str().expect("utf8 path"),
            SyncOptions::default(),
        );
        session.phase = SyncPhase::Fetching;
        let (tx, rx) = mpsc::channel();

        runtime.dispatch(&session, &tx);
        match recv(&rx) {
            RuntimeAction::DriftResolved(info) => {
                assert_eq!(info.behind, 1);
                assert_eq!(info.commits[0].subject, "feat: change");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn backup_failure_becomes_a_contextualized_error_event() {
        let upstream = make_upstream("1.0.0");
        let runtime = EffectRuntime::new(
            GitClient::new(upstream.path()),
            Box::new(FixedBackup(Err("disk full"))),
        );
        let mut session = session_for("https://github.com/acme/theme", SyncOptions::default());
        session.phase = SyncPhase::BackingUp;
        let (tx, rx) = mpsc::channel();

        runtime.dispatch(&session, &tx);
        match recv(&rx) {
            RuntimeAction::Error(message) => {
                assert!(message.starts_with("backup failed:"), "got: {message}")
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn pure_waypoint_phases_dispatch_nothing() {
        let upstream = make_upstream("1.0.0");
        let runtime = EffectRuntime::new(
            GitClient::new(upstream.path()),
            Box::new(FixedBackup(Ok("unused"))),
        );
        let (tx, rx) = mpsc::channel();

        for phase in [
            SyncPhase::BackupConfirm,
            SyncPhase::Preview,
            SyncPhase::Done,
            SyncPhase::Error,
        ] {
            let mut session = session_for("https://github.com/acme/theme", SyncOptions::default());
            session.phase = phase;
            assert!(runtime.dispatch(&session, &tx).is_none());
        }
        assert!(rx
            .recv_timeout(std::time::Duration::from_millis(100))
            .is_err());
    }
}
