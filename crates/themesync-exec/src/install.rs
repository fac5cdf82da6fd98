use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub success: bool,
    pub message: String,
}

/// Cancellation handle for an in-flight install. Once cancelled, the worker
/// thread discards its result instead of emitting into a stale session.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the package manager from the lockfile on disk, unless overridden.
pub fn detect_package_manager(repo: &Path, override_manager: Option<&str>) -> String {
    if let Some(manager) = override_manager {
        return manager.to_string();
    }
    if repo.join("pnpm-lock.yaml").exists() {
        "pnpm".to_string()
    } else if repo.join("yarn.lock").exists() {
        "yarn".to_string()
    } else {
        "npm".to_string()
    }
}

/// Reinstalls dependencies on a worker thread, streaming stdout chunks to
/// `on_output` and delivering exactly one final result to `on_done`. If the
/// token is cancelled before completion, nothing further is emitted.
pub fn reinstall_dependencies<O, D>(
    repo: &Path,
    manager: &str,
    token: CancelToken,
    on_output: O,
    on_done: D,
) where
    O: Fn(String) + Send + 'static,
    D: FnOnce(InstallResult) + Send + 'static,
{
    let repo = repo.to_path_buf();
    let manager = manager.to_string();

    thread::spawn(move || {
        let result = run_install(&repo, &manager, &token, &on_output);
        if !token.is_cancelled() {
            on_done(result);
        }
    });
}

fn run_install<O>(repo: &Path, manager: &str, token: &CancelToken, on_output: &O) -> InstallResult
where
    O: Fn(String),
{
    let spawned = Command::new(manager)
        .arg("install")
        .current_dir(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            return InstallResult {
                success: false,
                message: format!("failed to start {manager} install: {err}"),
            }
        }
    };

    let stderr_handle = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = [0_u8; 2048];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if token.is_cancelled() {
                        let _ = child.kill();
                        break;
                    }
                    for line in String::from_utf8_lossy(&buf[..n]).lines() {
                        let line = line.trim_end();
                        if !line.is_empty() {
                            on_output(line.to_string());
                        }
                    }
                }
                Err(_) => break,
            }
        }
    }

    let status = child.wait().ok();
    let stderr_text = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
        .trim()
        .to_string();

    if status.is_some_and(|s| s.success()) {
        InstallResult {
            success: true,
            message: format!("{manager} install completed"),
        }
    } else {
        InstallResult {
            success: false,
            message: if stderr_text.is_empty() {
                format!(
                    "{manager} install exited with {}",
                    status.map_or_else(|| "unknown status".to_string(), |s| s.to_string())
                )
            } else {
                stderr_text
            },
        }
    }
}
