//! Outputs of the converter.

use std::collections::BTreeMap;

use sched_model::{AnalyzerMode, CanonicalField, FileType, MappingProposal, TargetFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pipeline stage that settled a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    Cache,
    Pattern,
    Agreement,
    Arbitration,
}

impl DecidedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Pattern => "pattern",
            Self::Agreement => "agreement",
            Self::Arbitration => "arbitration",
        }
    }
}

impl std::fmt::Display for DecidedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    /// Serialized target document; absent when the input was malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings_used: Option<MappingProposal>,
    pub row_count: usize,
    pub arbitration_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_reasoning: Option<String>,
    pub cache_hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<DecidedBy>,
    /// Present only when the analyzer ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_mode: Option<AnalyzerMode>,
    pub target_format: TargetFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    /// Unsuccessful result for input that could not be parsed.
    pub fn malformed(target_format: TargetFormat, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            confidence: 0.0,
            mappings_used: None,
            row_count: 0,
            arbitration_used: false,
            judge_reasoning: None,
            cache_hit: false,
            decided_by: None,
            analyzer_mode: None,
            target_format,
            error: Some(error.into()),
        }
    }
}

/// Structure of an input without converting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub detected_patterns: Vec<String>,
    pub suggested_mappings: BTreeMap<String, CanonicalField>,
    pub file_type: FileType,
}
