use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Context};
use calamine::{open_workbook_auto, Reader};
use umya_spreadsheet::Spreadsheet;

use crate::usecase::ports::repo::StoreError;

/// Excel holds an open workbook with a sharing lock; on Windows that surfaces
/// as ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION rather than EACCES.
pub fn is_busy_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

fn map_io(err: io::Error, what: String) -> StoreError {
    if is_busy_error(&err) {
        StoreError::Busy
    } else {
        StoreError::Internal(anyhow::Error::new(err).context(what))
    }
}

/// Saves `book` over `path` without ever leaving a half-written workbook:
/// the temp copy must re-open and still contain `required_sheet` before it
/// replaces the original. The temp file is removed on every failure path.
pub fn save_workbook(book: &Spreadsheet, path: &Path, required_sheet: &str) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("xlsx");

    let temp = tempfile::Builder::new()
        .prefix(".daily-report-")
        .suffix(&format!(".{ext}"))
        .tempfile_in(dir)
        .map_err(|err| map_io(err, format!("failed to create temp file in {}", dir.display())))?;

    umya_spreadsheet::writer::xlsx::write(book, temp.path())
        .map_err(|err| StoreError::Internal(anyhow!("failed to write workbook: {err:?}")))?;

    verify_saved(temp.path(), required_sheet)?;

    File::open(temp.path())
        .and_then(|file| file.sync_all())
        .context("failed to sync temp workbook")?;

    temp.persist(path)
        .map_err(|err| map_io(err.error, format!("failed to replace {}", path.display())))?;
    log::debug!("saved workbook {}", path.display());
    Ok(())
}

fn verify_saved(temp_path: &Path, required_sheet: &str) -> Result<(), StoreError> {
    let workbook = open_workbook_auto(temp_path).map_err(|err| {
        StoreError::Internal(anyhow!("saved workbook failed verification: {err}"))
    })?;
    if !workbook.sheet_names().iter().any(|name| name == required_sheet) {
        return Err(StoreError::Internal(anyhow!(
            "saved workbook lost sheet '{required_sheet}'"
        )));
    }
    Ok(())
}
