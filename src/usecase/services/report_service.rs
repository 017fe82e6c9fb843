use std::sync::Arc;

use crate::domain::entities::report::{
    ApprovalPatch, CommentPatch, FieldPatch, Record, ReplyPatch, ReportInput,
};
use crate::usecase::ports::repo::{ReportRepository, StoreError};

pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>) -> Self {
        Self { repo }
    }

    pub fn list_reports(&self, file: &str) -> Result<Vec<Record>, StoreError> {
        self.repo.list_reports(file)
    }

    pub fn get_report(&self, file: &str, management_number: i64) -> Result<Record, StoreError> {
        self.repo.get_report(file, management_number)
    }

    pub fn customers(&self, file: &str) -> Result<Vec<Record>, StoreError> {
        self.repo.customers(file)
    }

    pub fn create_report(&self, file: &str, input: &ReportInput) -> Result<i64, StoreError> {
        self.repo.create_report(file, input)
    }

    pub fn update_report(
        &self,
        file: &str,
        management_number: i64,
        input: &ReportInput,
    ) -> Result<(), StoreError> {
        self.repo.update_report(file, management_number, input)
    }

    pub fn patch_comment(
        &self,
        file: &str,
        management_number: i64,
        patch: CommentPatch,
    ) -> Result<(), StoreError> {
        self.apply_patch(file, management_number, patch.into())
    }

    pub fn patch_reply(
        &self,
        file: &str,
        management_number: i64,
        patch: ReplyPatch,
    ) -> Result<(), StoreError> {
        self.apply_patch(file, management_number, patch.into())
    }

    pub fn patch_approval(
        &self,
        file: &str,
        management_number: i64,
        patch: ApprovalPatch,
    ) -> Result<(), StoreError> {
        self.apply_patch(file, management_number, patch.into())
    }

    /// An empty patch still has to name an existing report.
    fn apply_patch(
        &self,
        file: &str,
        management_number: i64,
        patch: FieldPatch,
    ) -> Result<(), StoreError> {
        if patch.values.is_empty() {
            self.repo.get_report(file, management_number)?;
            return Ok(());
        }
        self.repo.patch_report(file, management_number, &patch)
    }

    pub fn delete_report(&self, file: &str, management_number: i64) -> Result<(), StoreError> {
        self.repo.delete_report(file, management_number)
    }
}
