//! Parsed-sheet cache keyed by workbook file and sheet.
//!
//! Reading a macro workbook from the share takes seconds, so parsed tables
//! are reused for as long as the file's modification time is unchanged. A
//! SQLite copy survives restarts; it is only an optimization and every disk
//! cache failure degrades to a fresh parse.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

use crate::domain::entities::table::Table;
use crate::infra::fs::files::check_file_name;
use crate::infra::import::xlsx::read_sheet_table;
use crate::infra::sqlite::queries::{cache_key, load_cached_table, store_cached_table};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::StoreError;

pub const DISK_CACHE_FILE: &str = "table_cache.sqlite";

struct CacheEntry {
    mtime: SystemTime,
    table: Arc<Table>,
}

pub struct WorkbookCache {
    excel_dir: PathBuf,
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
    disk_db: Option<PathBuf>,
    parse_count: AtomicUsize,
}

fn mtime_nanos(mtime: SystemTime) -> i64 {
    mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

impl WorkbookCache {
    pub fn new(excel_dir: impl Into<PathBuf>) -> Self {
        Self {
            excel_dir: excel_dir.into(),
            entries: Mutex::new(HashMap::new()),
            disk_db: None,
            parse_count: AtomicUsize::new(0),
        }
    }

    /// Enables the persistent layer. An unusable cache dir only disables it.
    pub fn with_disk_cache(mut self, cache_dir: &Path) -> Self {
        let db_path = cache_dir.join(DISK_CACHE_FILE);
        match init_db(&db_path) {
            Ok(()) => {
                log::info!("disk cache enabled: {}", db_path.display());
                self.disk_db = Some(db_path);
            }
            Err(err) => log::warn!("disk cache disabled: {err:#}"),
        }
        self
    }

    pub fn excel_dir(&self) -> &Path {
        &self.excel_dir
    }

    /// Full path of a workbook in the Excel directory; the file must exist.
    pub fn workbook_path(&self, file: &str) -> Result<PathBuf, StoreError> {
        check_file_name(file)?;
        let path = self.excel_dir.join(file);
        if !path.is_file() {
            log::error!("file not found: {}", path.display());
            return Err(StoreError::FileNotFound(file.to_string()));
        }
        Ok(path)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(String, String), CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_table(&self, file: &str, sheet: &str) -> Result<Arc<Table>, StoreError> {
        let path = self.workbook_path(file)?;
        let mtime = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("failed to read mtime: {}", path.display()))?;
        let key = (file.to_string(), sheet.to_string());

        if let Some(entry) = self.entries().get(&key) {
            if entry.mtime == mtime {
                log::debug!("cache hit: {file} ({sheet})");
                return Ok(Arc::clone(&entry.table));
            }
        }

        let table = match self.load_from_disk(file, sheet, mtime) {
            Some(table) => {
                log::debug!("loaded {file} ({sheet}) from disk cache");
                Arc::new(table)
            }
            None => {
                log::debug!("reading workbook {} sheet={sheet}", path.display());
                let table = read_sheet_table(&path, sheet)?;
                self.parse_count.fetch_add(1, Ordering::SeqCst);
                log::info!(
                    "parsed {file} ({sheet}): {} rows, {} workbook reads so far",
                    table.row_count(),
                    self.parse_count()
                );
                self.store_to_disk(file, sheet, mtime, &table);
                Arc::new(table)
            }
        };

        self.entries().insert(
            key,
            CacheEntry {
                mtime,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    fn load_from_disk(&self, file: &str, sheet: &str, mtime: SystemTime) -> Option<Table> {
        let db_path = self.disk_db.as_ref()?;
        match load_cached_table(db_path, &cache_key(file, sheet), mtime_nanos(mtime)) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("failed to load from disk cache: {err:#}");
                None
            }
        }
    }

    fn store_to_disk(&self, file: &str, sheet: &str, mtime: SystemTime, table: &Table) {
        let Some(db_path) = self.disk_db.as_ref() else {
            return;
        };
        let key = cache_key(file, sheet);
        if let Err(err) = store_cached_table(db_path, &key, file, sheet, mtime_nanos(mtime), table)
        {
            log::warn!("failed to save disk cache: {err:#}");
        }
    }

    pub fn invalidate(&self, file: &str, sheet: &str) {
        self.entries()
            .remove(&(file.to_string(), sheet.to_string()));
    }

    pub fn invalidate_file(&self, file: &str) {
        self.entries().retain(|(cached_file, _), _| cached_file != file);
    }

    /// Number of real workbook parses since construction.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::SeqCst)
    }
}
