//! On-disk locations of the preference database and logs.

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Overrides the platform directories with one root holding everything.
pub const HOME_VAR: &str = "DATAGRID_HOME";

const LATEST_LOG: &str = "latest.log";

/// Archived logs kept by [`Paths::rotate_logs`].
pub const KEPT_LOGS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl Paths {
    /// `$DATAGRID_HOME` if set, else the platform's data and cache
    /// directories (XDG on Linux).
    pub fn resolve() -> Option<Self> {
        if let Some(home) = env::var_os(HOME_VAR).filter(|home| !home.is_empty()) {
            return Some(Self::under(Path::new(&home)));
        }
        let dirs = ProjectDirs::from("dev", "datagrid", "datagrid")?;
        Some(Self {
            data_dir: dirs.data_dir().to_path_buf(),
            log_dir: dirs.cache_dir().to_path_buf(),
        })
    }

    pub fn under(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            log_dir: root.join("logs"),
        }
    }

    pub fn preferences_db(&self) -> PathBuf {
        self.data_dir.join("preferences.db")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LATEST_LOG)
    }

    /// Moves the previous run's log aside and prunes archives down to `keep`.
    ///
    /// Archives are named by their start time, so name order is age order.
    pub fn rotate_logs(&self, keep: usize) -> io::Result<()> {
        fs::create_dir_all(&self.log_dir)?;

        let latest = self.log_file();
        if latest.exists() {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            fs::rename(&latest, self.log_dir.join(format!("{}.log", stamp)))?;
        }

        let mut archived: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_archive(path))
            .collect();
        archived.sort();

        let excess = archived.len().saturating_sub(keep);
        for path in &archived[..excess] {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "log")
        && path.file_name().is_some_and(|name| name != LATEST_LOG)
}
