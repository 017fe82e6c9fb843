use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

pub const BACKUP_DIR: &str = "backup";

/// `<dir>/backup/<stem>_<YYYYmmdd_HHMMSS><.ext>`
pub fn backup_path(path: &Path, at: NaiveDateTime) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    dir.join(BACKUP_DIR)
        .join(format!("{stem}_{}{ext}", at.format("%Y%m%d_%H%M%S")))
}

pub fn create_backup(path: &Path) -> Result<PathBuf> {
    let dest = backup_path(path, Local::now().naive_local());
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create backup dir: {}", parent.display()))?;
    }
    fs::copy(path, &dest)
        .with_context(|| format!("failed to copy {} to {}", path.display(), dest.display()))?;
    Ok(dest)
}

fn run_backup(path: &Path) {
    match create_backup(path) {
        Ok(dest) => log::info!("backup created: {}", dest.display()),
        Err(err) => log::warn!("failed to create backup: {err:#}"),
    }
}

/// Fire-and-forget on the runtime's blocking pool; runs inline when called
/// outside a runtime.
pub fn schedule_backup(path: PathBuf) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(move || run_backup(&path));
        }
        Err(_) => run_backup(&path),
    }
}
