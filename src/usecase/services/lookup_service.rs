use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::domain::entities::lookup::{DesignSummary, PriorityCustomer};
use crate::domain::entities::report::Record;
use crate::domain::entities::table::CellValue;
use crate::domain::schema::{ReportField, CUSTOMER_SHEET};
use crate::domain::text::{clean_header, format_number, normalize_code};
use crate::usecase::ports::repo::{ReportRepository, StoreError};

const PRIORITY_MARK: &str = "重点";
const CLOSED_DESIGN_STATUSES: [&str; 3] = ["出稿", "コンペ負け", "企画倒れ"];
const IGNORED_INTERVIEWERS: [&str; 2] = ["-", "nan"];

// Positional columns of the customer sheet.
const CUSTOMER_CODE_COL: usize = 0;
const CUSTOMER_NAME_COL: usize = 1;
const PRIORITY_COL: usize = 7;
const STAFF_COL: usize = 8;

/// Which delivery destination a lookup is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFilter {
    Any,
    /// Rows for this 直送先名 only.
    Named(String),
    /// Rows of the main customer, i.e. without a 直送先名.
    Unnamed,
}

impl DeliveryFilter {
    pub fn from_query(delivery_name: Option<&str>) -> Self {
        match delivery_name.map(str::trim) {
            Some(name) if !name.is_empty() => DeliveryFilter::Named(name.to_string()),
            _ => DeliveryFilter::Unnamed,
        }
    }

    fn accepts(&self, delivery_name: &str) -> bool {
        match self {
            DeliveryFilter::Any => true,
            DeliveryFilter::Named(name) => delivery_name == name,
            DeliveryFilter::Unnamed => delivery_name.is_empty(),
        }
    }
}

fn record_text(record: &Record, field: ReportField) -> String {
    match record.get(field.key()) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Some(other) => other.to_string(),
    }
}

fn code_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(value) => format_number(*value),
        other => other.as_text().trim().to_string(),
    }
}

pub struct LookupService {
    repo: Arc<dyn ReportRepository>,
}

impl LookupService {
    pub fn new(repo: Arc<dyn ReportRepository>) -> Self {
        Self { repo }
    }

    fn reports_for(
        &self,
        file: &str,
        customer_code: &str,
        delivery: &DeliveryFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let target = normalize_code(customer_code);
        Ok(self
            .repo
            .list_reports(file)?
            .into_iter()
            .filter(|record| normalize_code(&record_text(record, ReportField::CustomerCode)) == target)
            .filter(|record| delivery.accepts(&record_text(record, ReportField::DeliveryName)))
            .collect())
    }

    /// Customers flagged 重点 in the customer sheet.
    pub fn priority_customers(&self, file: &str) -> Result<Vec<PriorityCustomer>, StoreError> {
        let table = self.repo.sheet_table(file, CUSTOMER_SHEET)?;

        let priority_col = if table.columns.len() > PRIORITY_COL {
            Some(PRIORITY_COL)
        } else {
            table
                .columns
                .iter()
                .position(|name| clean_header(name).contains(PRIORITY_MARK))
        };
        let Some(priority_col) = priority_col else {
            log::warn!("priority column not found. columns: {:?}", table.columns);
            return Ok(Vec::new());
        };

        let customers: Vec<PriorityCustomer> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(idx, _)| table.cell(*idx, priority_col).as_text().contains(PRIORITY_MARK))
            .filter_map(|(idx, _)| {
                let code = code_text(table.cell(idx, CUSTOMER_CODE_COL));
                (!code.is_empty()).then(|| PriorityCustomer {
                    code,
                    name: table.cell(idx, CUSTOMER_NAME_COL).as_text().trim().to_string(),
                    staff: table.cell(idx, STAFF_COL).as_text().trim().to_string(),
                })
            })
            .collect();

        log::info!("found {} priority customers in {file}", customers.len());
        Ok(customers)
    }

    /// Sorted distinct interviewers recorded for a customer.
    pub fn interviewers(
        &self,
        file: &str,
        customer_code: &str,
        delivery: &DeliveryFilter,
    ) -> Result<Vec<String>, StoreError> {
        let names: BTreeSet<String> = self
            .reports_for(file, customer_code, delivery)?
            .iter()
            .map(|record| record_text(record, ReportField::Interviewee))
            .filter(|name| !name.is_empty() && !IGNORED_INTERVIEWERS.contains(&name.as_str()))
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Open design requests for a customer, one per request number in
    /// first-seen order, described by the lowest (latest) row.
    pub fn designs(
        &self,
        file: &str,
        customer_code: &str,
        delivery_name: Option<&str>,
    ) -> Result<Vec<DesignSummary>, StoreError> {
        let delivery = match delivery_name.map(str::trim) {
            Some(name) if !name.is_empty() => DeliveryFilter::Named(name.to_string()),
            _ => DeliveryFilter::Any,
        };
        let reports = self.reports_for(file, customer_code, &delivery)?;

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, &Record> = HashMap::new();
        for record in &reports {
            let request_no = record_text(record, ReportField::DesignRequestNo);
            if request_no.is_empty() {
                continue;
            }
            if !latest.contains_key(&request_no) {
                order.push(request_no.clone());
            }
            latest.insert(request_no, record);
        }

        let designs: Vec<DesignSummary> = order
            .iter()
            .filter_map(|request_no| latest.get(request_no))
            .filter_map(|record| {
                let progress = record_text(record, ReportField::DesignProgress);
                if CLOSED_DESIGN_STATUSES
                    .iter()
                    .any(|status| progress.contains(status))
                {
                    return None;
                }
                Some(DesignSummary {
                    request_no: record
                        .get(ReportField::DesignRequestNo.key())
                        .cloned()
                        .unwrap_or(Value::Null),
                    name: record_text(record, ReportField::DesignName),
                    kind: record_text(record, ReportField::DesignType),
                    progress,
                    proposal: record_text(record, ReportField::DesignProposal),
                })
            })
            .collect();

        log::debug!(
            "{} open designs for customer {customer_code} ({} rows)",
            designs.len(),
            reports.len()
        );
        Ok(designs)
    }
}
