use crate::domain::text::format_number;

/// A single worksheet cell after it has been lifted out of the workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Already rendered as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    DateTime(String),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => format_number(*value),
            CellValue::Bool(value) => value.to_string(),
            CellValue::DateTime(text) => text.clone(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Number(value) if value.is_finite() && value.fract() == 0.0 => {
                Some(*value as i64)
            }
            CellValue::Text(text) => {
                let trimmed = text.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }
}

/// One sheet loaded into memory: cleaned header names plus rows addressed by
/// absolute column position (index 0 is column A).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
