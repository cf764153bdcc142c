//! JSON-friendly conversion request.

use serde::{Deserialize, Serialize};

fn default_file_type() -> String {
    "text".to_string()
}

fn default_target_format() -> String {
    "CDISC_SDTM".to_string()
}

/// Loosely typed conversion input, as received from a tool call or a JSON file.
///
/// File type and target format stay strings until [`crate::ScheduleConverter::run`]
/// validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Base64-encoded or raw file content.
    #[serde(default)]
    pub file_content: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    #[serde(default = "default_target_format")]
    pub target_format: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Falls back to the converter's configured default when absent.
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

impl ConvertRequest {
    pub fn new(file_content: impl Into<String>) -> Self {
        Self {
            file_content: file_content.into(),
            file_type: default_file_type(),
            target_format: default_target_format(),
            organization_id: None,
            confidence_threshold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let request: ConvertRequest =
            serde_json::from_str(r#"{"file_content": "Visit 1"}"#).expect("parse request");
        assert_eq!(request, ConvertRequest::new("Visit 1"));
        assert_eq!(request.file_type, "text");
        assert_eq!(request.target_format, "CDISC_SDTM");
        assert_eq!(request.confidence_threshold, None);
    }
}
