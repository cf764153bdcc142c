//! Row lookups shared by the serializers.

use sched_model::{CanonicalField, MappingProposal, Row};
use serde_json::Value;

/// Value of `field` in `row`.
///
/// Uses the first column (in source order) mapped to the field, then a column
/// literally named after the field, then an empty string.
pub fn mapped_value(row: &Row, columns: &[String], proposal: &MappingProposal, field: CanonicalField) -> Value {
    let source = proposal
        .source_for(field, columns)
        .or_else(|| {
            // Mapped columns missing from the column list still count.
            proposal
                .mappings
                .iter()
                .find(|(_, mapped)| **mapped == field)
                .map(|(column, _)| column.as_str())
        })
        .unwrap_or(field.as_str());
    row.get(source)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Plain text rendering: strings unquoted, null as empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whether a value carries anything worth emitting.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Bool(flag) => !flag,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
