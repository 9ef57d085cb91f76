use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

const APPLICATION_DIR: &str = "habitrack";

fn base_state_dir() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("APPDATA")
                .map(PathBuf::from)
                .context("APPDATA should be present on Windows")
        }
        else if #[cfg(target_os = "macos")] {
            env::var("HOME")
                .map(|home| Path::new(&home).join("Library/Application Support"))
                .context("Couldn't find HOME")
        }
        else {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| env::var("HOME").map(|home| Path::new(&home).join(".local/state")))
                .context("Couldn't find neither XDG_STATE_HOME nor HOME")
        }
    }
}

/// Returns the directory holding the catalog, the records, preferences and logs, creating it when
/// needed. An explicit directory wins over the platform default.
pub fn application_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => base_state_dir()?.join(APPLICATION_DIR),
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
