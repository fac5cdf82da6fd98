use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use themesync_core::config::BackupConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup target {0} already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    pub backup_file: String,
}

/// Interface the sync core consumes. How a backup is physically archived is
/// someone else's problem; the state machine only needs a name back.
pub trait BackupRunner {
    fn run_backup(&self, force: bool) -> Result<BackupOutcome, BackupError>;
}

/// Copies the configured content directories into a timestamped folder under
/// the backup dir.
pub struct DirBackup {
    repo: PathBuf,
    config: BackupConfig,
}

impl DirBackup {
    pub fn new(repo: impl Into<PathBuf>, config: BackupConfig) -> Self {
        Self {
            repo: repo.into(),
            config,
        }
    }
}

impl BackupRunner for DirBackup {
    fn run_backup(&self, force: bool) -> Result<BackupOutcome, BackupError> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let name = format!("backup-{stamp}");
        let target = self.repo.join(&self.config.dir).join(&name);
        if target.exists() {
            if !force {
                return Err(BackupError::AlreadyExists(name));
            }
            fs::remove_dir_all(&target)?;
        }
        fs::create_dir_all(&target)?;

        for include in &self.config.include {
            let source = self.repo.join(include);
            if source.is_dir() {
                copy_tree(&source, &target.join(include))?;
            }
        }

        Ok(BackupOutcome { backup_file: name })
    }
}

fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let dest = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
