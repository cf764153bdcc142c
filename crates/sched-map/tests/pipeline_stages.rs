use proptest::prelude::*;
use sched_map::{
    AgreementBonus, FuzzyValidator, Judge, PatternMatcher, StructureAnalyzer, agreement_score,
    merge_proposals,
};
use sched_model::{MappingMethod, ParsedInput};

fn parsed(columns: &[&str]) -> ParsedInput {
    ParsedInput::new(columns.iter().map(|c| (*c).to_string()).collect(), Vec::new())
}

#[test]
fn offline_stages_agree_on_plain_schedule() {
    let input = parsed(&["Visit Name", "Study Day", "Procedures"]);
    let analysis = StructureAnalyzer::offline().analyze(&input).proposal;
    let validation = FuzzyValidator::default().validate(&analysis, &input);

    let score = agreement_score(&analysis, &validation, AgreementBonus::default());
    assert_eq!(score, 100.0);

    let merged = merge_proposals(&analysis, &validation);
    assert_eq!(merged.method, MappingMethod::Merged);
    assert_eq!(merged.mappings, analysis.mappings);
}

#[test]
fn unrecognized_columns_reach_arbitration_with_empty_proposals() {
    let input = parsed(&["foo", "bar"]);
    let analysis = StructureAnalyzer::offline().analyze(&input).proposal;
    let validation = FuzzyValidator::default().validate(&analysis, &input);
    assert_eq!(agreement_score(&analysis, &validation, AgreementBonus::default()), 0.0);

    let decision = Judge::default().arbitrate(&analysis, &validation, &input);
    assert!(decision.arbitrated);
    assert!(decision.is_empty());
    assert!(decision.reasoning.is_some());
}

proptest! {
    #[test]
    fn matcher_is_total_and_bounded(columns in prop::collection::vec("[ -~]{0,16}", 0..8)) {
        let input = ParsedInput::new(columns.clone(), Vec::new());
        let proposal = PatternMatcher::new().match_input(&input);
        prop_assert!((0.0..=100.0).contains(&proposal.confidence));
        prop_assert!(proposal.mappings.keys().all(|column| columns.contains(column)));
    }

    #[test]
    fn agreement_never_exceeds_hundred(columns in prop::collection::vec("[a-z ]{1,12}", 1..6)) {
        let input = ParsedInput::new(columns, Vec::new());
        let analysis = StructureAnalyzer::offline().analyze(&input).proposal;
        let validation = FuzzyValidator::default().validate(&analysis, &input);
        let score = agreement_score(&analysis, &validation, AgreementBonus::default());
        prop_assert!((0.0..=100.0).contains(&score));
    }
}
