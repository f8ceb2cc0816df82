//! Filesystem locations used by the backend.

use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "penmark";

#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Fallback location of `config.yml`
    pub project_root: PathBuf,
    /// Saved config, secrets, session token and logs
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    /// Resolve locations from `PENMARK_ROOT` and `PENMARK_DATA_DIR`.
    ///
    /// Without `PENMARK_DATA_DIR`, debug builds keep data next to the project
    /// and release builds use the platform data directory.
    pub fn new() -> Self {
        let project_root = env_dir("PENMARK_ROOT")
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let user_data_dir = env_dir("PENMARK_DATA_DIR").unwrap_or_else(|| {
            if cfg!(debug_assertions) {
                project_root.clone()
            } else {
                platform_data_dir().join(APP_DIR_NAME)
            }
        });

        Self::from_dirs(project_root, user_data_dir)
    }

    /// Lay out paths under explicit directories, creating the log dir.
    pub fn from_dirs(project_root: PathBuf, user_data_dir: PathBuf) -> Self {
        let paths = AppPaths {
            log_dir: user_data_dir.join("logs"),
            secrets_path: user_data_dir.join("secrets.yaml"),
            project_root,
            user_data_dir,
        };

        if let Err(err) = fs::create_dir_all(&paths.log_dir) {
            tracing::warn!("Failed to create {}: {}", paths.log_dir.display(), err);
        }
        paths
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn env_dir(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn platform_data_dir() -> PathBuf {
    let home = || {
        env_dir("HOME")
            .or_else(|| env_dir("USERPROFILE"))
            .unwrap_or_else(|| PathBuf::from("."))
    };

    match env::consts::OS {
        "windows" => env_dir("LOCALAPPDATA").unwrap_or_else(home),
        "macos" => home().join("Library").join("Application Support"),
        _ => env_dir("XDG_DATA_HOME").unwrap_or_else(|| home().join(".local").join("share")),
    }
}
