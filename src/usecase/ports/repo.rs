use std::sync::Arc;

use crate::domain::entities::report::{FieldPatch, Record, ReportInput};
use crate::domain::entities::table::Table;
use crate::domain::schema::SchemaError;

pub const BUSY_MESSAGE: &str =
    "ファイルが開かれているため保存できません。Excelファイルを閉じてから再度実行してください。";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Excel file '{0}' not found")]
    FileNotFound(String),
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),
    #[error("Report with management number {0} not found")]
    ReportNotFound(i64),
    #[error("{0}")]
    NotFound(String),
    #[error("{}", BUSY_MESSAGE)]
    Busy,
    #[error("他の方が編集しました（{}）。最新の情報を読み込んでからやり直してください。", .0.join(", "))]
    Conflict(Vec<String>),
    #[error("{0}")]
    Validation(String),
    #[error("Access denied")]
    Forbidden,
    #[error("Error reading Excel file: {0}")]
    Read(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::FileNotFound(_)
                | StoreError::SheetNotFound(_)
                | StoreError::ReportNotFound(_)
                | StoreError::NotFound(_)
        )
    }
}

/// Storage seam for report rows and the reference sheets that live next to
/// them in the same workbook. `file` is a bare workbook file name inside the
/// configured Excel directory.
pub trait ReportRepository: Send + Sync {
    fn sheet_table(&self, file: &str, sheet: &str) -> Result<Arc<Table>, StoreError>;

    fn list_reports(&self, file: &str) -> Result<Vec<Record>, StoreError>;
    fn get_report(&self, file: &str, management_number: i64) -> Result<Record, StoreError>;
    fn customers(&self, file: &str) -> Result<Vec<Record>, StoreError>;

    fn create_report(&self, file: &str, input: &ReportInput) -> Result<i64, StoreError>;
    fn update_report(
        &self,
        file: &str,
        management_number: i64,
        input: &ReportInput,
    ) -> Result<(), StoreError>;
    fn patch_report(
        &self,
        file: &str,
        management_number: i64,
        patch: &FieldPatch,
    ) -> Result<(), StoreError>;
    fn delete_report(&self, file: &str, management_number: i64) -> Result<(), StoreError>;
}
