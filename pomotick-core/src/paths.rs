use std::path::PathBuf;

use directories::ProjectDirs;

use crate::activity_log::LOG_DIR_NAME;
use crate::config::CONFIG_FILE_NAME;
use crate::error::PathsError;

/// Where settings, daily logs and diagnostics live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub config_file: PathBuf,
    pub log_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ProjectPaths {
    /// Platform defaults, e.g. `~/.config/pomotick/settings.json` and
    /// `~/.local/share/pomotick/log/` on Linux.
    pub fn discover() -> Result<Self, PathsError> {
        let dirs =
            ProjectDirs::from("com", "pomotick", "pomotick").ok_or(PathsError::NoProjectDirs)?;
        let data_dir = dirs.data_dir().to_path_buf();
        Ok(Self {
            config_file: dirs.config_dir().join(CONFIG_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            data_dir,
        })
    }

    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        log_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = config_file {
            self.config_file = path;
        }
        if let Some(dir) = log_dir {
            self.log_dir = dir;
        }
        self
    }
}
