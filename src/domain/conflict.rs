//! Optimistic-lock check for report updates.
//!
//! The workbook has no row-level locking, so an update carries the values the
//! client last saw for a few free-text fields. If any of them differ from what
//! is on disk now, the update is refused instead of overwriting someone else's
//! edit.

use serde_json::{Map, Value};

use crate::domain::schema::ReportField;
use crate::domain::text::{clean_text, format_number};

pub const WATCHED_FIELDS: [ReportField; 3] = [
    ReportField::ManagerComment,
    ReportField::CommentReply,
    ReportField::Discussion,
];

fn comparable(value: &str) -> String {
    clean_text(value).trim().to_string()
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Some(other) => other.to_string(),
    }
}

/// Returns the keys of watched fields whose on-disk value no longer matches
/// the client's snapshot, in [`WATCHED_FIELDS`] order.
pub fn detect_conflicts<F>(original_values: &Map<String, Value>, mut current: F) -> Vec<&'static str>
where
    F: FnMut(ReportField) -> String,
{
    WATCHED_FIELDS
        .iter()
        .filter(|field| {
            let original = comparable(&value_text(original_values.get(field.key())));
            let on_disk = comparable(&current(**field));
            if original != on_disk {
                log::warn!(
                    "conflict on '{}': on disk {:?}, client saw {:?}",
                    field.key(),
                    on_disk,
                    original
                );
                true
            } else {
                false
            }
        })
        .map(|field| field.key())
        .collect()
}
