use std::path::Path;

use anyhow::Context;
use encoding_rs::SHIFT_JIS;

use crate::domain::entities::sales::{SalesTable, SALES_CODE_COLUMN};
use crate::domain::text::normalize_sales_code;
use crate::usecase::ports::repo::StoreError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sales exports come out of the accounting system as CP932; hand-edited
/// files are usually UTF-8.
pub fn decode_csv_bytes(bytes: &[u8]) -> Result<String, StoreError> {
    let without_bom = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        return Ok(text.to_string());
    }

    let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
    if had_errors {
        return Err(StoreError::Validation(
            "Invalid CSV format. Please use Shift-JIS or UTF-8.".to_string(),
        ));
    }
    Ok(text.into_owned())
}

pub fn parse_sales_csv(bytes: &[u8]) -> Result<SalesTable, StoreError> {
    let text = decode_csv_bytes(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| StoreError::Validation(format!("failed to read csv header: {err}")))?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let Some(code_idx) = columns.iter().position(|c| c == SALES_CODE_COLUMN) else {
        return Err(StoreError::Validation(format!(
            "Sales CSV missing '{SALES_CODE_COLUMN}' column."
        )));
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| StoreError::Validation(format!("failed to parse csv record: {err}")))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if let Some(code) = row.get_mut(code_idx) {
            *code = normalize_sales_code(code);
        }
        rows.push(row);
    }

    Ok(SalesTable { columns, rows })
}

pub fn load_sales_csv(csv_path: &Path) -> Result<Option<SalesTable>, StoreError> {
    if !csv_path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(csv_path)
        .with_context(|| format!("failed to read sales csv: {}", csv_path.display()))?;
    parse_sales_csv(&bytes).map(Some)
}
