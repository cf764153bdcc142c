pub mod cache;
pub mod error;
pub mod field;
pub mod fingerprint;
pub mod format;
pub mod input;
pub mod mapping;

pub use cache::{CacheRecord, CacheStatistics, CacheWritePolicy, ClearScope};
pub use error::{ModelError, Result};
pub use field::CanonicalField;
pub use fingerprint::{FINGERPRINT_DELIMITER, fingerprint};
pub use format::{FileType, TargetFormat};
pub use input::{ParsedInput, Row};
pub use mapping::{
    AnalyzerMode, JudgeKind, MappingMethod, MappingProposal, coverage_confidence,
};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn proposal_serializes_with_snake_case_fields() {
        let mut mappings = BTreeMap::new();
        mappings.insert("Visit Name".to_string(), CanonicalField::VisitName);
        let proposal = MappingProposal {
            fingerprint: "visit name".to_string(),
            mappings,
            confidence: 100.0,
            method: MappingMethod::PatternMatching,
            reasoning: None,
            arbitrated: false,
            judge: None,
        };
        let json = serde_json::to_value(&proposal).expect("serialize proposal");
        assert_eq!(json["mappings"]["Visit Name"], "visit_name");
        assert_eq!(json["method"], "pattern_matching");
        assert!(json.get("reasoning").is_none());

        let round: MappingProposal = serde_json::from_value(json).expect("deserialize proposal");
        assert_eq!(round, proposal);
    }

    #[test]
    fn parsed_input_is_fingerprinted_on_construction() {
        let parsed = ParsedInput::new(
            vec!["Study Day".to_string(), "Visit Name".to_string()],
            Vec::new(),
        );
        assert_eq!(parsed.fingerprint(), "study day|visit name");
        assert_eq!(parsed.row_count(), 0);
    }
}
