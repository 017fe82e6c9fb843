use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::domain::entities::table::{CellValue, Table};
use crate::infra::sqlite::schema::open_connection;

/// Stable identifier for one (file, sheet) pair across restarts.
pub fn cache_key(file_name: &str, sheet_name: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{file_name}_{sheet_name}").as_bytes()))
}

fn encode_cell(cell: &CellValue) -> Option<(&'static str, String)> {
    match cell {
        CellValue::Empty => None,
        CellValue::Text(v) => Some(("S", v.clone())),
        CellValue::Number(v) => Some(("N", v.to_string())),
        CellValue::Bool(v) => Some(("B", v.to_string())),
        CellValue::DateTime(v) => Some(("D", v.clone())),
    }
}

fn decode_cell(kind: &str, value: String) -> CellValue {
    match kind {
        "S" => CellValue::Text(value),
        "N" => value
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Text(value)),
        "B" => CellValue::Bool(value == "true"),
        "D" => CellValue::DateTime(value),
        _ => CellValue::Empty,
    }
}

pub fn store_cached_table(
    db_path: &Path,
    cache_key: &str,
    file_name: &str,
    sheet_name: &str,
    mtime_ns: i64,
    table: &Table,
) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start cache write transaction")?;

    tx.execute("DELETE FROM cached_sheet WHERE cache_key = ?1", [cache_key])
        .context("failed to clear previous cache entry")?;
    tx.execute(
        "INSERT INTO cached_sheet(cache_key, file_name, sheet_name, mtime_ns, row_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![cache_key, file_name, sheet_name, mtime_ns, table.row_count() as i64],
    )
    .context("failed to insert cache entry")?;

    let mut insert_column = tx
        .prepare("INSERT INTO cached_column(cache_key, col_idx, name) VALUES (?1, ?2, ?3)")
        .context("failed to prepare cached column insert")?;
    for (col_idx, name) in table.columns.iter().enumerate() {
        insert_column
            .execute(params![cache_key, col_idx as i64, name])
            .context("failed to insert cached column")?;
    }
    drop(insert_column);

    let mut insert_cell = tx
        .prepare(
            "INSERT INTO cached_cell(cache_key, row_idx, col_idx, kind, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .context("failed to prepare cached cell insert")?;
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if let Some((kind, value)) = encode_cell(cell) {
                insert_cell
                    .execute(params![cache_key, row_idx as i64, col_idx as i64, kind, value])
                    .context("failed to insert cached cell")?;
            }
        }
    }
    drop(insert_cell);

    tx.commit().context("failed to commit cache entry")?;
    Ok(())
}

/// Returns the cached table only when it was stored for the same mtime.
pub fn load_cached_table(db_path: &Path, cache_key: &str, mtime_ns: i64) -> Result<Option<Table>> {
    let conn = open_connection(db_path)?;

    let entry: Option<(i64, i64)> = conn
        .query_row(
            "SELECT mtime_ns, row_count FROM cached_sheet WHERE cache_key = ?1",
            [cache_key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .context("failed to query cache entry")?;

    let Some((stored_mtime, row_count)) = entry else {
        return Ok(None);
    };
    if stored_mtime != mtime_ns {
        return Ok(None);
    }

    let mut columns_stmt = conn
        .prepare(
            "SELECT name
             FROM cached_column
             WHERE cache_key = ?1
             ORDER BY col_idx ASC",
        )
        .context("failed to prepare cached columns query")?;
    let columns = columns_stmt
        .query_map([cache_key], |row| row.get::<_, String>(0))
        .context("failed to query cached columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect cached columns")?;
    drop(columns_stmt);

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_count.max(0) as usize];

    let mut cells_stmt = conn
        .prepare(
            "SELECT row_idx, col_idx, kind, value
             FROM cached_cell
             WHERE cache_key = ?1
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare cached cells query")?;
    let cells = cells_stmt
        .query_map([cache_key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .context("failed to query cached cells")?;

    for cell in cells {
        let (row_idx, col_idx, kind, value) = cell.context("failed to read cached cell")?;
        let Some(row) = rows.get_mut(row_idx as usize) else {
            continue;
        };
        let col_idx = col_idx as usize;
        if row.len() <= col_idx {
            row.resize(col_idx + 1, CellValue::Empty);
        }
        row[col_idx] = decode_cell(&kind, value);
    }

    Ok(Some(Table { columns, rows }))
}
