use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;

use themesync_core::events::{SyncAction, UserAction};
use themesync_core::reducer::reduce;
use themesync_core::state::{LogLevel, SyncPhase, SyncSession};
use themesync_exec::effects::EffectRuntime;
use themesync_exec::install::CancelToken;
use themesync_exec::notes::fetch_release_notes;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Interactive session view. The loop owns the dispatch-once-per-phase
/// bookkeeping; the reducer owns every transition. After the terminal is
/// restored the final outcome is reported on stdout like a plain run.
pub fn run(
    session: SyncSession,
    runtime: &EffectRuntime,
) -> Result<i32, Box<dyn std::error::Error>> {
    let session = {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
        let _guard = TuiGuard; // restores the terminal on exit or panic

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        run_app(&mut terminal, session, runtime)?
    };
    Ok(crate::report_terminal(&session))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut session: SyncSession,
    runtime: &EffectRuntime,
) -> io::Result<SyncSession> {
    let (tx, rx) = mpsc::channel();
    let mut dispatched: Option<SyncPhase> = None;
    let mut install_token: Option<CancelToken> = None;
    let mut release_notes: Option<String> = None;

    loop {
        match session.phase {
            SyncPhase::BackupConfirm if session.options.force => {
                // --force commits to the update; the backup itself still runs.
                session = reduce(&session, SyncAction::User(UserAction::ConfirmBackup));
                continue;
            }
            SyncPhase::Preview => {
                if release_notes.is_none() {
                    let notes = session
                        .update_info
                        .as_ref()
                        .filter(|info| {
                            info.latest_version != "unknown" && !info.latest_version.is_empty()
                        })
                        .map(|info| {
                            fetch_release_notes(&session.config.upstream.url, &info.latest_version)
                        })
                        .unwrap_or_default();
                    release_notes = Some(notes);
                }
                if session.options.force && !session.options.stops_at_preview() {
                    session = reduce(&session, SyncAction::User(UserAction::ConfirmUpdate));
                    continue;
                }
            }
            phase if !phase.is_terminal() && dispatched != Some(phase) => {
                if let Some(token) = runtime.dispatch(&session, &tx) {
                    install_token = Some(token);
                }
                dispatched = Some(phase);
            }
            _ => {}
        }

        while let Ok(action) = rx.try_recv() {
            session = reduce(&session, SyncAction::Runtime(action));
        }

        terminal.draw(|frame| draw(frame, &session, release_notes.as_deref()))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if let Some(token) = install_token.take() {
                token.cancel();
            }
            return Ok(session);
        }
        match (session.phase, key.code) {
            (_, KeyCode::Char('q') | KeyCode::Esc) => {
                if let Some(token) = install_token.take() {
                    token.cancel();
                }
                return Ok(session);
            }
            (phase, _) if phase.is_terminal() => return Ok(session),
            (SyncPhase::BackupConfirm, KeyCode::Char('y') | KeyCode::Enter) => {
                session = reduce(&session, SyncAction::User(UserAction::ConfirmBackup));
            }
            (SyncPhase::BackupConfirm, KeyCode::Char('n')) => {
                session = reduce(&session, SyncAction::User(UserAction::SkipBackup));
            }
            (SyncPhase::Preview, KeyCode::Char('y') | KeyCode::Enter) => {
                session = reduce(&session, SyncAction::User(UserAction::ConfirmUpdate));
            }
            (SyncPhase::Preview, KeyCode::Char('n')) => return Ok(session),
            _ => {}
        }
    }
}

fn phase_color(phase: SyncPhase) -> Color {
    match phase {
        SyncPhase::Done | SyncPhase::UpToDate => Color::Green,
        SyncPhase::Error | SyncPhase::Conflict => Color::Red,
        SyncPhase::DirtyWarning | SyncPhase::BackupConfirm | SyncPhase::Preview => Color::Yellow,
        _ => Color::Cyan,
    }
}

fn draw(frame: &mut ratatui::Frame, session: &SyncSession, release_notes: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(Span::styled(
        session.phase.label(),
        Style::default()
            .fg(phase_color(session.phase))
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).title("themesync"));
    frame.render_widget(header, chunks[0]);

    let body = Paragraph::new(body_lines(session, release_notes))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(body, chunks[1]);

    let log_items: Vec<ListItem> = session
        .session_log
        .iter()
        .rev()
        .take(6)
        .rev()
        .map(|line| {
            let color = match line.level {
                LogLevel::Info => Color::Gray,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            ListItem::new(Line::from(Span::styled(
                format!("[{}] {}", line.level.label(), line.message),
                Style::default().fg(color),
            )))
        })
        .collect();
    let log = List::new(log_items).block(Block::default().borders(Borders::ALL).title("log"));
    frame.render_widget(log, chunks[2]);

    let footer = Paragraph::new(Span::styled(
        key_hints(session),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(footer, chunks[3]);
}

fn key_hints(session: &SyncSession) -> &'static str {
    match session.phase {
        SyncPhase::BackupConfirm => "y: back up  n: skip backup  q: quit",
        SyncPhase::Preview if session.options.stops_at_preview() => "q: quit",
        SyncPhase::Preview => "y: apply update  n: decline  q: quit",
        SyncPhase::Installing => "q: cancel install and quit",
        phase if phase.is_terminal() => "press any key to exit",
        _ => "q: quit",
    }
}

fn body_lines(session: &SyncSession, release_notes: Option<&str>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(warning) = session.branch_warning.as_deref() {
        lines.push(warn(warning));
        lines.push(Line::from(""));
    }
    match session.phase {
        SyncPhase::DirtyWarning => {
            lines.push(warn(
                "uncommitted changes; commit or stash them, or re-run with --force:",
            ));
            if let Some(status) = session.repo_status.as_ref() {
                for path in &status.uncommitted {
                    lines.push(plain(format!("  {path}")));
                }
            }
        }
        SyncPhase::BackupConfirm => {
            lines.push(plain("an update is available"));
            if session.options.rebase {
                lines.push(warn("rebase rewrites history; a backup is strongly advised"));
            }
            lines.push(plain("create a backup of your content first?"));
        }
        SyncPhase::Preview => {
            preview_lines(session, release_notes, &mut lines);
        }
        SyncPhase::Conflict => {
            conflict_lines(session, &mut lines);
        }
        SyncPhase::UpToDate => {
            let version = session
                .update_info
                .as_ref()
                .map(|info| info.current_version.clone())
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(plain(format!("already up to date (version {version})")));
        }
        SyncPhase::Done => {
            lines.push(plain("update complete"));
            if !session.backup_file.is_empty() {
                lines.push(plain(format!("backup kept at {}", session.backup_file)));
            }
        }
        SyncPhase::Error => {
            lines.push(Line::from(Span::styled(
                format!(
                    "sync failed: {}",
                    session.error.as_deref().unwrap_or("unknown error")
                ),
                Style::default().fg(Color::Red),
            )));
        }
        _ => {
            lines.push(plain("working..."));
        }
    }
    lines
}

fn preview_lines(session: &SyncSession, release_notes: Option<&str>, lines: &mut Vec<Line<'static>>) {
    let Some(info) = session.update_info.as_ref() else {
        return;
    };
    let summary = if info.is_downgrade {
        format!(
            "downgrade: {} -> {} (removes {} local commits)",
            info.current_version, info.latest_version, info.ahead
        )
    } else {
        format!(
            "update: {} -> {} ({} commits behind)",
            info.current_version, info.latest_version, info.behind
        )
    };
    lines.push(Line::from(Span::styled(
        summary,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for commit in &info.commits {
        lines.push(plain(format!(
            "  {} {} ({}, {})",
            commit.hash, commit.subject, commit.date, commit.author
        )));
    }
    if session.options.rebase && !info.local_commits.is_empty() {
        lines.push(plain("local commits to replay:"));
        for commit in &info.local_commits {
            lines.push(plain(format!("  {} {}", commit.hash, commit.subject)));
        }
    }
    if let Some(notes) = release_notes.filter(|notes| !notes.is_empty()) {
        lines.push(Line::from(""));
        lines.push(plain("release notes:"));
        for note in notes.lines() {
            lines.push(plain(format!("  {note}")));
        }
    }
    if session.options.stops_at_preview() {
        lines.push(Line::from(""));
        lines.push(warn("preview only; nothing will be applied"));
    }
}

fn conflict_lines(session: &SyncSession, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(Span::styled(
        "merge conflict; resolve the files below, then commit:",
        Style::default().fg(Color::Red),
    )));
    if let Some(outcome) = session.merge_result.as_ref() {
        for path in &outcome.conflict_files {
            lines.push(plain(format!("  {path}")));
        }
        let abort = if outcome.is_rebase_conflict {
            "git rebase --abort"
        } else {
            "git merge --abort"
        };
        lines.push(plain(format!("or abandon the update with `{abort}`")));
    }
    if !session.backup_file.is_empty() {
        lines.push(plain(format!(
            "your content was backed up to {}",
            session.backup_file
        )));
    }
}

fn plain(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::raw(text.into()))
}

fn warn(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(Color::Yellow),
    ))
}
