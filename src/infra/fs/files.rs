use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};

use crate::domain::entities::lookup::WorkbookFile;
use crate::usecase::ports::repo::StoreError;

pub const FALLBACK_WORKBOOK: &str = "daily_report_template.xlsm";

const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// Rejects names that could escape the workbook directory.
pub fn check_file_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == ".."
    {
        return Err(StoreError::Validation(format!("invalid file name: '{name}'")));
    }
    Ok(())
}

pub fn is_workbook_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

fn is_lock_file(name: &str) -> bool {
    name.starts_with("~$")
}

/// First macro-enabled workbook in name order, skipping Office lock files.
pub fn default_workbook(excel_dir: &Path) -> String {
    let Ok(entries) = fs::read_dir(excel_dir) else {
        log::warn!(
            "excel dir not readable, using fallback workbook: {}",
            excel_dir.display()
        );
        return FALLBACK_WORKBOOK.to_string();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.to_lowercase().ends_with(".xlsm") && !is_lock_file(name))
        .collect();
    names.sort();

    names
        .into_iter()
        .next()
        .unwrap_or_else(|| FALLBACK_WORKBOOK.to_string())
}

pub fn list_workbooks(excel_dir: &Path) -> Result<Vec<WorkbookFile>, StoreError> {
    if !excel_dir.is_dir() {
        return Err(StoreError::Internal(anyhow::anyhow!(
            "Excel Directory not found: {}",
            excel_dir.display()
        )));
    }

    let entries = fs::read_dir(excel_dir)
        .with_context(|| format!("failed to list excel dir: {}", excel_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry in {}: {err}", excel_dir.display());
                continue;
            }
        };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_workbook_name(&name) {
            continue;
        }
        match entry.metadata().and_then(|meta| Ok((meta.len(), meta.modified()?))) {
            Ok((size, modified)) => files.push(WorkbookFile {
                name,
                size,
                modified: DateTime::<Local>::from(modified)
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
            }),
            Err(err) => log::warn!("error reading metadata of {name}: {err}"),
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Writes `bytes` next to the destination first, then renames over it.
pub fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = dest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create dir: {}", dir.display()))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    temp.write_all(bytes)
        .context("failed to write temp file")?;
    temp.as_file()
        .sync_all()
        .context("failed to sync temp file")?;
    temp.persist(dest).map_err(|err| {
        if crate::infra::workbook::save::is_busy_error(&err.error) {
            StoreError::Busy
        } else {
            StoreError::Internal(
                anyhow::Error::new(err.error)
                    .context(format!("failed to replace {}", dest.display())),
            )
        }
    })?;
    Ok(())
}

pub fn save_upload(excel_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    check_file_name(name)?;
    if !is_workbook_name(name) {
        return Err(StoreError::Validation(
            "Only .xlsx and .xlsm files are allowed".to_string(),
        ));
    }
    let dest = excel_dir.join(name);
    write_atomically(&dest, bytes)?;
    log::info!("uploaded workbook saved: {}", dest.display());
    Ok(dest)
}
