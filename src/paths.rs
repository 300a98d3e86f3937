use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations of the daemon's on-disk state. Currently that is only the log
/// file that stdout/stderr are redirected to when the daemon detaches.
#[derive(Debug, Clone)]
pub struct IconPaths {
    log_file: PathBuf,
}

impl IconPaths {
    pub fn default() -> Result<Self> {
        let log_dir = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(std::env::var("HOME").unwrap()).join(".cache"))
            .join("irssi-icon");

        if !log_dir.exists() {
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;
        }

        Ok(IconPaths { log_file: log_dir.join("irssi-icon.log") })
    }

    pub fn get_log_file(&self) -> &Path {
        self.log_file.as_path()
    }
}
