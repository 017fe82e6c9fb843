use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use chrono::Local;
use serde::Serialize;

use crate::domain::entities::sales::{SalesSummary, SalesTable};
use crate::infra::fs::files::write_atomically;
use crate::infra::import::csv::{load_sales_csv, parse_sales_csv};
use crate::usecase::ports::repo::StoreError;

pub const SALES_CSV_FILE: &str = "sales_data.csv";

/// Response of a single-customer sales lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSales {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub summary: Option<SalesSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CustomerSales {
    fn missing(message: &str) -> Self {
        Self {
            found: false,
            message: Some(message.to_string()),
            summary: None,
            updated_at: None,
        }
    }
}

/// Holds the last uploaded sales ranking, mirrored to `<data_dir>/sales_data.csv`.
pub struct SalesService {
    csv_path: PathBuf,
    table: RwLock<Option<SalesTable>>,
}

impl SalesService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: data_dir.into().join(SALES_CSV_FILE),
            table: RwLock::new(None),
        }
    }

    /// Loads the persisted CSV if there is one. A broken file is logged and
    /// leaves the service empty.
    pub fn load(&self) {
        match load_sales_csv(&self.csv_path) {
            Ok(Some(table)) => {
                log::info!("sales data loaded: {} rows", table.rows.len());
                *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(table);
            }
            Ok(None) => log::info!("no existing sales data found"),
            Err(err) => log::error!("failed to load sales data: {err}"),
        }
    }

    pub fn upload(&self, bytes: &[u8]) -> Result<usize, StoreError> {
        let table = parse_sales_csv(bytes)?;
        write_atomically(&self.csv_path, bytes)?;
        let rows = table.rows.len();
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(table);
        log::info!("sales csv saved: {} ({rows} rows)", self.csv_path.display());
        Ok(rows)
    }

    pub fn all(&self) -> Vec<SalesSummary> {
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(table) => table.rows.iter().map(|row| table.summarize(row)).collect(),
            None => Vec::new(),
        }
    }

    pub fn for_customer(&self, code: &str) -> CustomerSales {
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let Some(table) = guard.as_ref() else {
            return CustomerSales::missing("Sales data not yet uploaded.");
        };
        match table.find_customer(code) {
            Some(row) => CustomerSales {
                found: true,
                message: None,
                summary: Some(table.summarize(row)),
                updated_at: Some(Local::now().to_rfc3339()),
            },
            None => CustomerSales::missing("Customer not found in sales data."),
        }
    }
}
