use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;

use themesync_core::config::Config;
use themesync_core::events::SyncAction;
use themesync_core::events::UserAction;
use themesync_core::reducer::reduce;
use themesync_core::state::SyncOptions;
use themesync_core::state::SyncPhase;
use themesync_core::state::SyncSession;
use themesync_exec::backup::DirBackup;
use themesync_exec::effects::EffectRuntime;
use themesync_exec::git::GitClient;
use themesync_exec::notes::fetch_release_notes;

mod ui;

const CONFIG_FILE: &str = ".themesync.toml";

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let invocation = parse_args(env::args().skip(1).collect())?;
    let args = match invocation {
        Invocation::Help => {
            print_help();
            return Ok(0);
        }
        Invocation::Version => {
            println!("themesync {}", env!("CARGO_PKG_VERSION"));
            return Ok(0);
        }
        Invocation::Sync(args) => args,
    };

    let repo = args.repo.canonicalize()?;
    let config = load_config(&repo)?;
    let session = SyncSession::new(args.options, config.clone());
    let runtime = EffectRuntime::new(
        GitClient::new(repo.clone()),
        Box::new(DirBackup::new(repo, config.backup.clone())),
    );

    if args.plain {
        run_plain(session, &runtime)
    } else {
        ui::run(session, &runtime)
    }
}

enum Invocation {
    Help,
    Version,
    Sync(CliArgs),
}

struct CliArgs {
    options: SyncOptions,
    repo: PathBuf,
    plain: bool,
}

fn parse_args(args: Vec<String>) -> Result<Invocation, Box<dyn std::error::Error>> {
    let mut options = SyncOptions::default();
    let mut repo = None;
    let mut plain = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" | "help" => return Ok(Invocation::Help),
            "--version" | "-V" | "version" => return Ok(Invocation::Version),
            "--check" => options.check_only = true,
            "--skip-backup" => options.skip_backup = true,
            "--force" => options.force = true,
            "--dry-run" => options.dry_run = true,
            "--rebase" => options.rebase = true,
            "--plain" => plain = true,
            "--tag" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--tag requires a release tag".into());
                };
                options.target_tag = Some(value.clone());
                i += 1;
            }
            "--repo" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--repo requires a path".into());
                };
                repo = Some(PathBuf::from(value));
                i += 1;
            }
            other => {
                return Err(format!("unsupported argument: {other}").into());
            }
        }
        i += 1;
    }
    Ok(Invocation::Sync(CliArgs {
        options,
        repo: repo.unwrap_or_else(|| PathBuf::from(".")),
        plain,
    }))
}

/// Config resolution order: repo-local `.themesync.toml`, then the per-user
/// config directory, then built-in defaults.
fn load_config(repo: &std::path::Path) -> Result<Config, Box<dyn std::error::Error>> {
    let local = repo.join(CONFIG_FILE);
    if local.is_file() {
        let text = fs::read_to_string(&local)?;
        return toml::from_str(&text)
            .map_err(|err| format!("could not parse {}: {err}", local.display()).into());
    }
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("themesync").join("config.toml");
        if global.is_file() {
            let text = fs::read_to_string(&global)?;
            return toml::from_str(&text)
                .map_err(|err| format!("could not parse {}: {err}", global.display()).into());
        }
    }
    Ok(Config::default())
}

/// Non-interactive driver: dispatches one effect per phase entry, prompts on
/// stdin at the two confirmation gates, prints session log lines as they
/// accumulate.
fn run_plain(
    mut session: SyncSession,
    runtime: &EffectRuntime,
) -> Result<i32, Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel();
    let mut dispatched: Option<SyncPhase> = None;
    let mut printed_logs = 0;

    loop {
        printed_logs = print_new_log_lines(&session, printed_logs);
        if session.phase.is_terminal() {
            return Ok(report_terminal(&session));
        }
        match session.phase {
            SyncPhase::BackupConfirm => {
                // --force commits to the update but never skips the backup.
                let action = if session.options.force || prompt_yes("create a backup first?")? {
                    UserAction::ConfirmBackup
                } else {
                    UserAction::SkipBackup
                };
                session = reduce(&session, SyncAction::User(action));
            }
            SyncPhase::Preview => {
                print_preview(&session);
                if session.options.stops_at_preview() {
                    return Ok(0);
                }
                if session.options.force || prompt_yes("apply this update?")? {
                    session = reduce(&session, SyncAction::User(UserAction::ConfirmUpdate));
                } else {
                    println!("update declined");
                    return Ok(0);
                }
            }
            phase => {
                if dispatched != Some(phase) {
                    println!("{}...", phase.label());
                    runtime.dispatch(&session, &tx);
                    dispatched = Some(phase);
                }
                let event = rx.recv()?;
                session = reduce(&session, SyncAction::Runtime(event));
            }
        }
    }
}

fn print_new_log_lines(session: &SyncSession, printed: usize) -> usize {
    for line in &session.session_log[printed..] {
        println!("[{}] {}", line.level.label(), line.message);
    }
    session.session_log.len()
}

fn print_preview(session: &SyncSession) {
    let Some(info) = session.update_info.as_ref() else {
        return;
    };
    if info.is_downgrade {
        println!(
            "downgrade: {} -> {} (removes {} local commit{})",
            info.current_version,
            info.latest_version,
            info.ahead,
            if info.ahead == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "update: {} -> {} ({} commit{} behind)",
            info.current_version,
            info.latest_version,
            info.behind,
            if info.behind == 1 { "" } else { "s" }
        );
    }
    for commit in &info.commits {
        println!("  {} {} ({}, {})", commit.hash, commit.subject, commit.date, commit.author);
    }
    if session.options.rebase && !info.local_commits.is_empty() {
        println!("local commits to replay:");
        for commit in &info.local_commits {
            println!("  {} {}", commit.hash, commit.subject);
        }
    }
    if info.latest_version != "unknown" && !info.latest_version.is_empty() {
        println!("release notes:");
        let notes = fetch_release_notes(&session.config.upstream.url, &info.latest_version);
        for line in notes.lines() {
            println!("  {line}");
        }
    }
}

/// Maps the five terminal phases onto output and an exit status: success
/// terminals exit 0, everything needing operator attention exits 1.
pub(crate) fn report_terminal(session: &SyncSession) -> i32 {
    match session.phase {
        SyncPhase::Done => {
            println!("update complete");
            if !session.backup_file.is_empty() {
                println!("backup kept at {}", session.backup_file);
            }
            0
        }
        SyncPhase::UpToDate => {
            let version = session
                .update_info
                .as_ref()
                .map(|info| info.current_version.as_str())
                .unwrap_or("unknown");
            println!("already up to date (version {version})");
            0
        }
        SyncPhase::DirtyWarning => {
            eprintln!("uncommitted changes; commit or stash them, or re-run with --force:");
            if let Some(status) = session.repo_status.as_ref() {
                for path in &status.uncommitted {
                    eprintln!("  {path}");
                }
            }
            1
        }
        SyncPhase::Conflict => {
            report_conflict(session);
            1
        }
        SyncPhase::Error => {
            eprintln!(
                "sync failed: {}",
                session.error.as_deref().unwrap_or("unknown error")
            );
            1
        }
        _ => 1,
    }
}

fn report_conflict(session: &SyncSession) {
    eprintln!("merge conflict; resolve the files below, then commit:");
    if let Some(outcome) = session.merge_result.as_ref() {
        for path in &outcome.conflict_files {
            eprintln!("  {path}");
        }
        let abort = if outcome.is_rebase_conflict {
            "git rebase --abort"
        } else {
            "git merge --abort"
        };
        eprintln!("or abandon the update with `{abort}`");
    }
    if !session.backup_file.is_empty() {
        eprintln!("your content was backed up to {}", session.backup_file);
    }
}

fn prompt_yes(question: &str) -> io::Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

fn print_help() {
    println!("themesync {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  themesync [--repo PATH] [options]");
    println!();
    println!("Options:");
    println!("  --check        report drift without touching the repo or network");
    println!("  --dry-run      fetch and preview, apply nothing");
    println!("  --tag TAG      sync to a specific release tag instead of the branch tip");
    println!("  --rebase       replay local commits on top of the update");
    println!("  --skip-backup  skip the content backup (ignored with --rebase)");
    println!("  --force        answer yes to confirmations; never overrides --check/--dry-run");
    println!("  --plain        line-oriented output instead of the interactive view");
    println!("  --repo PATH    repository to sync (default: current directory)");
    println!("  --help, --version");
}
