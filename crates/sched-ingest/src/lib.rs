//! Decoding and parsing of raw schedule files into [`ParsedInput`].

pub mod csv_table;
pub mod decode;
pub mod error;
pub mod json_table;
pub mod text;

use sched_model::{FileType, ParsedInput};
use tracing::debug;

pub use csv_table::parse_csv;
pub use decode::decode_content;
pub use error::{IngestError, Result};
pub use json_table::parse_json;
pub use text::{TEXT_COLUMN, parse_text};

/// Decodes `content` (base64 or raw) and parses it according to `file_type`.
pub fn parse_input(content: &str, file_type: FileType) -> Result<ParsedInput> {
    let text = decode_content(content);
    let parsed = match file_type {
        FileType::Csv => parse_csv(&text)?,
        FileType::Json => parse_json(&text)?,
        FileType::Text => parse_text(&text),
    };
    debug!(
        file_type = %file_type,
        columns = parsed.columns().len(),
        rows = parsed.row_count(),
        fingerprint = %parsed.fingerprint(),
        "parsed input"
    );
    Ok(parsed)
}
