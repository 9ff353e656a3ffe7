use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "FOCUSLOG_DATA_DIR";

/// Where the database and settings live.
pub struct AppDirs {
    data_dir: PathBuf,
}

impl AppDirs {
    /// `--data-dir`, then `$FOCUSLOG_DATA_DIR`, then the platform data dir.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let data_dir = explicit
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| {
                ProjectDirs::from("", "", "focuslog")
                    .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from(".focuslog"));
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("focuslog.sqlite3")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}
