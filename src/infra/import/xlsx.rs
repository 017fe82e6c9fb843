use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, Timelike};

use crate::domain::entities::table::{CellValue, Table};
use crate::usecase::ports::repo::StoreError;

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) if v.is_empty() => CellValue::Empty,
        Data::String(v) => CellValue::Text(v.to_string()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => excel_serial_to_text(v.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(v.as_f64())),
        Data::DateTimeIso(v) => CellValue::DateTime(v.to_string()),
        Data::DurationIso(v) => CellValue::Text(v.to_string()),
        Data::Error(v) => CellValue::Text(v.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

/// Serial dates count days from 1899-12-30 (Excel's 1900 leap-year bug included).
pub fn excel_serial_to_text(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let datetime = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    if datetime.num_seconds_from_midnight() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn header_text(cell: &Data) -> String {
    match cell_to_value(cell) {
        CellValue::Empty => String::new(),
        other => other.as_text(),
    }
}

/// Loads one sheet with the first used row as header. Column positions are
/// absolute: a sheet whose used range starts at column C still puts that cell
/// at index 2.
pub fn read_sheet_table(xlsx_path: &Path, sheet: &str) -> Result<Table, StoreError> {
    let mut workbook = open_workbook_auto(xlsx_path).map_err(|err| {
        StoreError::Read(format!("failed to open {}: {err}", xlsx_path.display()))
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(StoreError::SheetNotFound(sheet.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|err| StoreError::Read(format!("failed to read sheet {sheet}: {err}")))?;

    let start_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let pad = || std::iter::repeat(CellValue::Empty).take(start_col);

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => std::iter::repeat(String::new())
            .take(start_col)
            .chain(header.iter().map(header_text))
            .collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<CellValue>> = rows
        .map(|row| pad().chain(row.iter().map(cell_to_value)).collect())
        .collect();

    Ok(Table { columns, rows })
}
