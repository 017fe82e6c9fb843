//! String cleanup shared by the workbook reader, the writer and the conflict
//! checker. Excel round-trips carriage returns as the literal `_x000D_`, and
//! numeric codes come back as floats, so every comparison goes through here.

const REPORT_HEADER_ALIASES: &[(&str, &str)] = &[
    ("得意先CD.", "得意先CD"),
    ("直送先CD.", "直送先CD"),
    ("訪問先名得意先名", "訪問先名"),
    ("直送先名.", "直送先名"),
    ("コメント", "上長コメント"),
];

const CUSTOMER_HEADER_ALIASES: &[(&str, &str)] =
    &[("得意先CD.", "得意先CD"), ("直送先CD.", "直送先CD")];

/// Which rename table applies when canonicalizing a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Report,
    Customer,
}

pub fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

/// Translates `_x000D_` back to a line break and normalizes CR/CRLF to LF.
pub fn clean_text(value: &str) -> String {
    normalize_newlines(&value.replace("_x000D_", "\r"))
}

pub fn clean_header(raw: &str) -> String {
    raw.replace(|c: char| c == '\n' || c == '\r', "")
        .trim()
        .to_string()
}

pub fn canonical_header(raw: &str, kind: HeaderKind) -> String {
    let cleaned = clean_header(raw);
    let aliases = match kind {
        HeaderKind::Report => REPORT_HEADER_ALIASES,
        HeaderKind::Customer => CUSTOMER_HEADER_ALIASES,
    };
    aliases
        .iter()
        .find(|(from, _)| *from == cleaned)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(cleaned)
}

pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// `"43006"`, `"43006.0"` and `" 43006 "` all normalize to `"43006"`.
/// Non-numeric codes are only trimmed.
pub fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => format_number(value),
        _ => trimmed.to_string(),
    }
}

/// Sales exports carry codes like `43006.0`; everything after the first dot is dropped.
pub fn normalize_sales_code(raw: &str) -> String {
    raw.trim().split('.').next().unwrap_or_default().to_string()
}

/// Whole-number strings that should be written to the sheet as numbers.
pub fn integer_code(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}
