use serde::Serialize;
use serde_json::Value;

use crate::domain::text::normalize_sales_code;

pub const SALES_CODE_COLUMN: &str = "得意先コード";

/// The uploaded sales-ranking CSV, kept as text and projected on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One customer's ranking line as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub rank: Value,
    pub rank_class: Value,
    pub customer_code: Value,
    pub customer_name: Value,
    pub sales_amount: Value,
    pub gross_profit: Value,
    pub sales_yoy: Value,
    pub sales_last_year: Value,
    pub profit_last_year: Value,
    pub sales_2y_ago: Value,
    pub profit_2y_ago: Value,
    pub area: Value,
    pub sales_rep: Value,
}

/// Empty text becomes `null`, numeric text becomes a JSON number.
pub fn sales_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Value::from)
        .unwrap_or_else(|| Value::String(trimmed.to_string()))
}

impl SalesTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn named(&self, row: &[String], name: &str) -> Value {
        self.column(name)
            .and_then(|idx| row.get(idx))
            .map(|raw| sales_value(raw))
            .unwrap_or(Value::Null)
    }

    fn positional(row: &[String], idx: usize) -> Value {
        row.get(idx).map(|raw| sales_value(raw)).unwrap_or(Value::Null)
    }

    fn first_present(candidates: impl IntoIterator<Item = Value>) -> Value {
        candidates
            .into_iter()
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null)
    }

    pub fn summarize(&self, row: &[String]) -> SalesSummary {
        SalesSummary {
            rank: self.named(row, "順位"),
            rank_class: self.named(row, "ランク"),
            customer_code: self
                .column(SALES_CODE_COLUMN)
                .and_then(|idx| row.get(idx))
                .map(|code| Value::String(code.clone()))
                .unwrap_or(Value::Null),
            customer_name: self.named(row, "得意先名称"),
            sales_amount: self.named(row, "売上金額"),
            gross_profit: self.named(row, "粗利金額"),
            sales_yoy: self.named(row, "前年対比率"),
            sales_last_year: self.named(row, "前年売上"),
            profit_last_year: self.named(row, "前年粗利"),
            sales_2y_ago: self.named(row, "前々年売上"),
            profit_2y_ago: self.named(row, "前々年粗利"),
            area: Self::first_present([
                self.named(row, "地域名称"),
                self.named(row, "地域"),
                Self::positional(row, 12),
            ]),
            sales_rep: Self::first_present([
                self.named(row, "担当者"),
                Self::positional(row, 8),
            ]),
        }
    }

    pub fn find_customer(&self, code: &str) -> Option<&[String]> {
        let idx = self.column(SALES_CODE_COLUMN)?;
        let target = normalize_sales_code(code);
        self.rows
            .iter()
            .find(|row| row.get(idx).map(String::as_str) == Some(target.as_str()))
            .map(Vec::as_slice)
    }
}
