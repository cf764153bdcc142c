use csv::ReaderBuilder;
use serde_json::Value;

use sched_model::{ParsedInput, Row};

use crate::error::Result;

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Parses CSV text whose first record is the header row.
///
/// Blank records are skipped. Short records are padded with empty strings and
/// cells beyond the header width are ignored.
pub fn parse_csv(content: &str) -> Result<ParsedInput> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let Some(columns) = headers.as_ref() else {
            headers = Some(record.iter().map(normalize_header).collect());
            continue;
        };
        let mut row = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = record.get(idx).map(normalize_cell).unwrap_or_default();
            row.insert(column.clone(), Value::String(value));
        }
        rows.push(row);
    }

    Ok(ParsedInput::new(headers.unwrap_or_default(), rows))
}
