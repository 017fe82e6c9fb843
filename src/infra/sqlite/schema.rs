use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cached_sheet (
            cache_key   TEXT PRIMARY KEY,
            file_name   TEXT NOT NULL,
            sheet_name  TEXT NOT NULL,
            mtime_ns    INTEGER NOT NULL,
            row_count   INTEGER NOT NULL,
            cached_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS cached_column (
            cache_key   TEXT NOT NULL,
            col_idx     INTEGER NOT NULL,
            name        TEXT NOT NULL,
            PRIMARY KEY (cache_key, col_idx),
            FOREIGN KEY (cache_key) REFERENCES cached_sheet(cache_key) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS cached_cell (
            cache_key   TEXT NOT NULL,
            row_idx     INTEGER NOT NULL,
            col_idx     INTEGER NOT NULL,
            kind        TEXT NOT NULL,
            value       TEXT NOT NULL,
            PRIMARY KEY (cache_key, row_idx, col_idx),
            FOREIGN KEY (cache_key) REFERENCES cached_sheet(cache_key) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cached_cell_key_row
            ON cached_cell(cache_key, row_idx);
        ",
    )
    .context("failed to initialize cache schema")?;

    Ok(())
}
