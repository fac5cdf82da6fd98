use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub install: InstallConfig,
    pub backup: BackupConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL of the template repository this site was forked from. Required
    /// before a sync can run; compared against the configured remote after
    /// normalization.
    pub url: String,
    pub branch: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            branch: "main".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    /// Overrides lockfile-based package manager detection.
    pub package_manager: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackupConfig {
    pub dir: String,
    /// Repository-relative directories captured by a backup.
    pub include: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: ".themesync/backups".to_string(),
            include: vec!["src/content".to_string(), "public".to_string()],
        }
    }
}
