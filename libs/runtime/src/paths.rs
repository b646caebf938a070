//! Home directory resolution.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("environment variable {0} is not set; cannot locate the home directory")]
    NoHome(&'static str),
    #[error("cannot determine the current directory")]
    CurrentDir(#[source] std::io::Error),
    #[error("failed to create home directory '{path}'")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(target_os = "windows")]
const HOME_VAR: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const HOME_VAR: &str = "HOME";

fn platform_home() -> Result<PathBuf, HomeDirError> {
    std::env::var_os(HOME_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::NoHome(HOME_VAR))
}

/// Expand a leading `~` and make `raw` absolute against the current directory.
fn expand(raw: &str) -> Result<PathBuf, HomeDirError> {
    let path = if raw == "~" {
        platform_home()?
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        platform_home()?.join(rest)
    } else {
        PathBuf::from(raw)
    };

    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = std::env::current_dir().map_err(HomeDirError::CurrentDir)?;
        Ok(cwd.join(path))
    }
}

/// Resolve the application home directory.
///
/// `requested` wins when given (`~` expanded, relative paths made absolute);
/// otherwise `<platform home>/<default_subdir>`. With `create`, the directory
/// is created if missing.
pub fn resolve_home_dir(
    requested: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let dir = match requested.as_deref() {
        Some(raw) => expand(raw)?,
        None => platform_home()?.join(default_subdir),
    };

    if create {
        ensure_dir(&dir)?;
    }
    Ok(dir)
}

fn ensure_dir(dir: &Path) -> Result<(), HomeDirError> {
    std::fs::create_dir_all(dir).map_err(|source| HomeDirError::Create {
        path: dir.to_path_buf(),
        source,
    })
}
