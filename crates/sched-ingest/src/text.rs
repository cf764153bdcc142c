use serde_json::Value;

use sched_model::{ParsedInput, Row};

/// Name of the single column produced for plain-text input.
pub const TEXT_COLUMN: &str = "text";

/// Splits trimmed text into one row per line under a single `text` column.
pub fn parse_text(content: &str) -> ParsedInput {
    let rows = content
        .trim()
        .split('\n')
        .map(|line| {
            let mut row = Row::new();
            row.insert(
                TEXT_COLUMN.to_string(),
                Value::String(line.trim_end_matches('\r').to_string()),
            );
            row
        })
        .collect();
    ParsedInput::new(vec![TEXT_COLUMN.to_string()], rows)
}
