use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::lookup::WorkbookFile;
use crate::infra::cache::WorkbookCache;
use crate::infra::fs::files::{list_workbooks, save_upload};
use crate::usecase::ports::repo::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    pub files: Vec<WorkbookFile>,
    pub default: String,
}

pub struct FileService {
    cache: Arc<WorkbookCache>,
    default_workbook: String,
}

impl FileService {
    pub fn new(cache: Arc<WorkbookCache>, default_workbook: impl Into<String>) -> Self {
        Self {
            cache,
            default_workbook: default_workbook.into(),
        }
    }

    pub fn default_workbook(&self) -> &str {
        &self.default_workbook
    }

    pub fn list_files(&self) -> Result<FileListing, StoreError> {
        log::debug!("listing files in {}", self.cache.excel_dir().display());
        Ok(FileListing {
            files: list_workbooks(self.cache.excel_dir())?,
            default: self.default_workbook.clone(),
        })
    }

    /// Stores an uploaded workbook and drops any cached sheets of the same name.
    pub fn upload_workbook(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = save_upload(self.cache.excel_dir(), name, bytes)?;
        self.cache.invalidate_file(name);
        Ok(path)
    }
}
