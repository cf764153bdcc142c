//! String similarity scoring for the independent fuzzy validator.
//!
//! The validator never looks at the proposal it checks when building its own
//! mapping; the proposal is only used to report how far the two disagree.

use std::collections::{BTreeMap, BTreeSet};

use sched_model::{
    CanonicalField, MappingMethod, MappingProposal, ParsedInput, coverage_confidence,
};
use tracing::debug;

use crate::thresholds::FUZZY_ACCEPTANCE;

/// Keyword each canonical field is compared against, in tie-break order.
pub const FIELD_KEYWORDS: [(CanonicalField, &str); 5] = [
    (CanonicalField::VisitName, "visit"),
    (CanonicalField::VisitDay, "day"),
    (CanonicalField::Procedures, "procedure"),
    (CanonicalField::VisitWindow, "window"),
    (CanonicalField::SubjectId, "subject"),
];

/// Similarity of a column name to a keyword in 0.0-1.0.
///
/// Keyword contained in the column scores 1.0, column contained in the keyword
/// scores 0.8, otherwise the count of shared distinct characters divided by the
/// longer length. Empty columns score 0.
pub fn similarity(column: &str, keyword: &str) -> f64 {
    let column = column.trim().to_lowercase();
    let keyword = keyword.to_lowercase();
    if column.is_empty() || keyword.is_empty() {
        return 0.0;
    }
    if column.contains(&keyword) {
        return 1.0;
    }
    if keyword.contains(&column) {
        return 0.8;
    }
    let left: BTreeSet<char> = column.chars().collect();
    let right: BTreeSet<char> = keyword.chars().collect();
    let shared = left.intersection(&right).count();
    let longest = column.chars().count().max(keyword.chars().count());
    shared as f64 / longest as f64
}

/// Best keyword match for a column; the first field wins ties.
pub fn best_field(column: &str) -> (CanonicalField, f64) {
    let mut best = (FIELD_KEYWORDS[0].0, similarity(column, FIELD_KEYWORDS[0].1));
    for (field, keyword) in FIELD_KEYWORDS.iter().skip(1) {
        let score = similarity(column, keyword);
        if score > best.1 {
            best = (*field, score);
        }
    }
    best
}

/// Second opinion built from string similarity alone.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyValidator {
    acceptance: f64,
}

impl Default for FuzzyValidator {
    fn default() -> Self {
        Self::new(FUZZY_ACCEPTANCE)
    }
}

impl FuzzyValidator {
    pub fn new(acceptance: f64) -> Self {
        Self { acceptance }
    }

    /// Maps each column whose best similarity exceeds the acceptance level.
    pub fn validate(&self, proposal: &MappingProposal, parsed: &ParsedInput) -> MappingProposal {
        let mut mappings = BTreeMap::new();
        for column in parsed.columns() {
            let (field, score) = best_field(column);
            if score > self.acceptance {
                mappings.insert(column.clone(), field);
            }
        }
        let confidence = coverage_confidence(mappings.len(), parsed.columns().len());
        let disagreements = mappings
            .iter()
            .filter(|(column, field)| proposal.mappings.get(*column) != Some(*field))
            .count();
        debug!(
            fingerprint = parsed.fingerprint(),
            confidence,
            disagreements,
            "fuzzy validation finished"
        );
        MappingProposal {
            fingerprint: parsed.fingerprint().to_string(),
            mappings,
            confidence,
            method: MappingMethod::FuzzyLogic,
            reasoning: Some("Independent string-similarity mapping".to_string()),
            arbitrated: false,
            judge: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_tiers() {
        assert_eq!(similarity("Visit Name", "visit"), 1.0);
        assert_eq!(similarity("Vis", "visit"), 0.8);
        // {d, a} shared, longer length 4
        assert_eq!(similarity("date", "day"), 0.5);
        assert_eq!(similarity("", "visit"), 0.0);
    }

    #[test]
    fn first_field_wins_ties() {
        // Both "visit" and "day" are substrings.
        let (field, score) = best_field("Visit Day");
        assert_eq!(field, CanonicalField::VisitName);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn validator_maps_independently() {
        let parsed = ParsedInput::new(
            vec![
                "Visit Name".to_string(),
                "Study Day".to_string(),
                "Procedures".to_string(),
                "Cost".to_string(),
            ],
            Vec::new(),
        );
        let proposal = MappingProposal::empty(parsed.fingerprint(), MappingMethod::Analysis);
        let validated = FuzzyValidator::default().validate(&proposal, &parsed);
        assert_eq!(validated.method, MappingMethod::FuzzyLogic);
        assert_eq!(validated.mappings.len(), 3);
        assert_eq!(validated.mappings["Procedures"], CanonicalField::Procedures);
        assert!(!validated.mappings.contains_key("Cost"));
        assert_eq!(validated.confidence, 75.0);
    }

    #[test]
    fn date_column_is_not_accepted_at_half() {
        let parsed = ParsedInput::new(vec!["date".to_string()], Vec::new());
        let proposal = MappingProposal::empty(parsed.fingerprint(), MappingMethod::Analysis);
        let validated = FuzzyValidator::default().validate(&proposal, &parsed);
        assert!(validated.is_empty());
        assert_eq!(validated.confidence, 0.0);
    }
}
