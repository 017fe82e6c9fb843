//! Row-level edits on the report sheet through umya-spreadsheet, which keeps
//! the workbook's VBA project and styles intact on save.

use umya_spreadsheet::Worksheet;

use crate::domain::conflict::detect_conflicts;
use crate::domain::entities::report::{FieldPatch, ReportInput};
use crate::domain::entities::table::CellValue;
use crate::domain::schema::{ReportField, ReportSchema, FIRST_DATA_ROW};
use crate::domain::text::integer_code;
use crate::usecase::ports::repo::StoreError;

const HEADER_ROW: u32 = 1;

pub fn header_labels(ws: &Worksheet, schema: &ReportSchema) -> Vec<String> {
    (1..=schema.width())
        .map(|col| ws.get_value((col, HEADER_ROW)))
        .collect()
}

pub fn validate_header(ws: &Worksheet, schema: &ReportSchema) -> Result<(), StoreError> {
    schema.validate(&header_labels(ws, schema))?;
    Ok(())
}

fn management_number_at(ws: &Worksheet, schema: &ReportSchema, row: u32) -> Option<i64> {
    let col = schema.column(ReportField::ManagementNumber);
    CellValue::Text(ws.get_value((col, row))).as_i64()
}

/// `(row, management number)` for every data row whose first column parses
/// as an integer.
pub fn scan_numbers(ws: &Worksheet, schema: &ReportSchema) -> Vec<(u32, i64)> {
    (FIRST_DATA_ROW..=ws.get_highest_row())
        .filter_map(|row| management_number_at(ws, schema, row).map(|number| (row, number)))
        .collect()
}

pub fn find_row(ws: &Worksheet, schema: &ReportSchema, management_number: i64) -> Option<u32> {
    (FIRST_DATA_ROW..=ws.get_highest_row())
        .find(|row| management_number_at(ws, schema, *row) == Some(management_number))
}

/// A row is free only when every schema column is blank.
fn row_is_empty(ws: &Worksheet, schema: &ReportSchema, row: u32) -> bool {
    (1..=schema.width()).all(|col| ws.get_value((col, row)).trim().is_empty())
}

fn write_field(ws: &mut Worksheet, schema: &ReportSchema, row: u32, field: ReportField, value: &str) {
    let cell = ws.get_cell_mut((schema.column(field), row));
    match integer_code(value).filter(|_| field.is_code()) {
        Some(code) => {
            cell.set_value_number(code as f64);
        }
        None => {
            cell.set_value_string(value);
        }
    }
}

fn copy_row_style(ws: &mut Worksheet, from_row: u32, to_row: u32, last_col: u32) {
    for col in 1..=last_col {
        let style = ws.get_style((col, from_row)).clone();
        ws.set_style((col, to_row), style);
    }
}

/// Appends a report after the row holding the current maximum number and
/// returns the new number. A target row with any content, numbered or not,
/// is shifted down rather than overwritten.
pub fn append_report(
    ws: &mut Worksheet,
    schema: &ReportSchema,
    input: &ReportInput,
) -> Result<i64, StoreError> {
    let numbers = scan_numbers(ws, schema);
    let max = numbers
        .iter()
        .copied()
        .fold(None, |best: Option<(u32, i64)>, (row, number)| match best {
            Some((_, best_number)) if best_number >= number => best,
            _ => Some((row, number)),
        });

    let next_number = max.map(|(_, number)| number + 1).unwrap_or(1);
    let target_row = max.map(|(row, _)| row + 1).unwrap_or(FIRST_DATA_ROW);
    log::debug!(
        "scanned {} numbered rows, next number {next_number} at row {target_row}",
        numbers.len()
    );

    if !row_is_empty(ws, schema, target_row) {
        log::info!("row {target_row} is occupied, inserting a new row");
        ws.insert_new_row(&target_row, &1);
    }

    ws.get_cell_mut((schema.column(ReportField::ManagementNumber), target_row))
        .set_value_number(next_number as f64);
    for (field, value) in input.field_values() {
        write_field(ws, schema, target_row, field, value);
    }

    if let Some((style_row, _)) = max {
        copy_row_style(
            ws,
            style_row,
            target_row,
            schema.column(ReportField::CommentReply),
        );
    }

    Ok(next_number)
}

/// Overwrites content columns of an existing report. With a snapshot in
/// `input.original_values` the watched fields must still match the sheet.
pub fn update_report(
    ws: &mut Worksheet,
    schema: &ReportSchema,
    management_number: i64,
    input: &ReportInput,
) -> Result<(), StoreError> {
    let row = find_row(ws, schema, management_number)
        .ok_or(StoreError::ReportNotFound(management_number))?;

    if let Some(original_values) = &input.original_values {
        let conflicts = detect_conflicts(original_values, |field| {
            ws.get_value((schema.column(field), row))
        });
        if !conflicts.is_empty() {
            return Err(StoreError::Conflict(
                conflicts.into_iter().map(str::to_string).collect(),
            ));
        }
    }

    for (field, value) in input.field_values() {
        write_field(ws, schema, row, field, value);
    }
    Ok(())
}

pub fn patch_report(
    ws: &mut Worksheet,
    schema: &ReportSchema,
    management_number: i64,
    patch: &FieldPatch,
) -> Result<(), StoreError> {
    let row = find_row(ws, schema, management_number)
        .ok_or(StoreError::ReportNotFound(management_number))?;
    for (field, value) in &patch.values {
        write_field(ws, schema, row, *field, value);
    }
    Ok(())
}

pub fn delete_report(
    ws: &mut Worksheet,
    schema: &ReportSchema,
    management_number: i64,
) -> Result<(), StoreError> {
    let row = find_row(ws, schema, management_number)
        .ok_or(StoreError::ReportNotFound(management_number))?;
    ws.remove_row(&row, &1);
    Ok(())
}
