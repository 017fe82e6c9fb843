use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Number, Value};
use umya_spreadsheet::Worksheet;

use crate::domain::entities::report::{FieldPatch, Record, ReportInput};
use crate::domain::entities::table::{CellValue, Table};
use crate::domain::schema::{ReportField, ReportSchema, CUSTOMER_SHEET, REPORT_SHEET};
use crate::domain::text::{canonical_header, clean_text, normalize_code, HeaderKind};
use crate::infra::cache::WorkbookCache;
use crate::infra::workbook::backup::schedule_backup;
use crate::infra::workbook::save::save_workbook;
use crate::infra::workbook::writer;
use crate::usecase::ports::repo::{ReportRepository, StoreError};

const CODE_KEYS: [&str; 2] = ["得意先CD", "直送先CD"];

fn json_value(cell: &CellValue, is_code: bool) -> Value {
    match cell {
        CellValue::Empty => Value::Null,
        CellValue::Text(text) if text.is_empty() => Value::Null,
        CellValue::Text(text) if is_code => Value::String(normalize_code(text)),
        CellValue::Text(text) => Value::String(clean_text(text)),
        CellValue::Number(_) if is_code => Value::String(cell.as_text()),
        CellValue::Number(value) if value.is_finite() && value.fract() == 0.0 => {
            Value::from(*value as i64)
        }
        CellValue::Number(value) => Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Bool(flag) => Value::Bool(*flag),
        CellValue::DateTime(text) => Value::String(text.clone()),
    }
}

/// Projects every non-blank row of `table` into a record keyed by canonical
/// header names. Columns without a header are dropped.
pub fn project_records(table: &Table, kind: HeaderKind) -> Vec<Record> {
    let headers: Vec<(usize, String)> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, raw)| (idx, canonical_header(raw, kind)))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    table
        .rows
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_blank()))
        .map(|row| {
            headers
                .iter()
                .map(|(idx, name)| {
                    let is_code = CODE_KEYS.contains(&name.as_str());
                    let value = row
                        .get(*idx)
                        .map(|cell| json_value(cell, is_code))
                        .unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Report store backed by workbooks in one directory. Reads go through the
/// shared [`WorkbookCache`]; writes are serialized per process.
pub struct WorkbookRepo {
    cache: Arc<WorkbookCache>,
    schema: ReportSchema,
    write_lock: Mutex<()>,
}

impl WorkbookRepo {
    pub fn new(cache: Arc<WorkbookCache>) -> Self {
        Self {
            cache,
            schema: ReportSchema::standard(),
            write_lock: Mutex::new(()),
        }
    }

    /// Checks the report header of `file` against the column layout.
    pub fn validate_schema(&self, file: &str) -> Result<(), StoreError> {
        let table = self.cache.get_table(file, REPORT_SHEET)?;
        self.schema.validate(&table.columns)?;
        Ok(())
    }

    fn mutate<T, F>(&self, file: &str, action: &str, edit: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Worksheet, &ReportSchema) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.cache.workbook_path(file)?;

        let mut book = umya_spreadsheet::reader::xlsx::read(&path).map_err(|err| {
            StoreError::Read(format!("failed to open {}: {err:?}", path.display()))
        })?;
        let ws = book
            .get_sheet_by_name_mut(REPORT_SHEET)
            .ok_or_else(|| StoreError::SheetNotFound(REPORT_SHEET.to_string()))?;

        writer::validate_header(ws, &self.schema)?;
        let result = edit(ws, &self.schema)?;

        save_workbook(&book, &path, REPORT_SHEET)?;
        self.cache.invalidate(file, REPORT_SHEET);
        log::info!("{action} saved to {}", path.display());
        schedule_backup(path);
        Ok(result)
    }
}

impl ReportRepository for WorkbookRepo {
    fn sheet_table(&self, file: &str, sheet: &str) -> Result<Arc<Table>, StoreError> {
        self.cache.get_table(file, sheet)
    }

    fn list_reports(&self, file: &str) -> Result<Vec<Record>, StoreError> {
        let table = self.cache.get_table(file, REPORT_SHEET)?;
        Ok(project_records(&table, HeaderKind::Report))
    }

    fn get_report(&self, file: &str, management_number: i64) -> Result<Record, StoreError> {
        let table = self.cache.get_table(file, REPORT_SHEET)?;
        let col = self.schema.column(ReportField::ManagementNumber) as usize - 1;
        let row = table
            .rows
            .iter()
            .find(|row| row.get(col).and_then(CellValue::as_i64) == Some(management_number))
            .ok_or(StoreError::ReportNotFound(management_number))?;

        let single = Table {
            columns: table.columns.clone(),
            rows: vec![row.clone()],
        };
        project_records(&single, HeaderKind::Report)
            .into_iter()
            .next()
            .ok_or(StoreError::ReportNotFound(management_number))
    }

    fn customers(&self, file: &str) -> Result<Vec<Record>, StoreError> {
        let table = self.cache.get_table(file, CUSTOMER_SHEET)?;
        Ok(project_records(&table, HeaderKind::Customer))
    }

    fn create_report(&self, file: &str, input: &ReportInput) -> Result<i64, StoreError> {
        let number = self.mutate(file, "new report", |ws, schema| {
            writer::append_report(ws, schema, input)
        })?;
        log::info!("created report {number} in {file}");
        Ok(number)
    }

    fn update_report(
        &self,
        file: &str,
        management_number: i64,
        input: &ReportInput,
    ) -> Result<(), StoreError> {
        self.mutate(file, "report update", |ws, schema| {
            writer::update_report(ws, schema, management_number, input)
        })?;
        log::info!("updated report {management_number} in {file}");
        Ok(())
    }

    fn patch_report(
        &self,
        file: &str,
        management_number: i64,
        patch: &FieldPatch,
    ) -> Result<(), StoreError> {
        self.mutate(file, "report patch", |ws, schema| {
            writer::patch_report(ws, schema, management_number, patch)
        })?;
        log::info!(
            "patched {} field(s) of report {management_number} in {file}",
            patch.values.len()
        );
        Ok(())
    }

    fn delete_report(&self, file: &str, management_number: i64) -> Result<(), StoreError> {
        self.mutate(file, "report delete", |ws, schema| {
            writer::delete_report(ws, schema, management_number)
        })?;
        log::info!("deleted report {management_number} from {file}");
        Ok(())
    }
}
