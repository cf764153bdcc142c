//! Agreement between the analysis and validation proposals.

use sched_model::{MappingMethod, MappingProposal};

use crate::thresholds::{AGREEMENT_BONUS, AGREEMENT_BONUS_FLOOR};

/// Bonus rule applied on top of the raw assignment overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgreementBonus {
    /// Both confidences must exceed this for the bonus to apply.
    pub floor: f64,
    pub bonus: f64,
}

impl Default for AgreementBonus {
    fn default() -> Self {
        Self {
            floor: AGREEMENT_BONUS_FLOOR,
            bonus: AGREEMENT_BONUS,
        }
    }
}

/// Share of identical column assignments on a 0-100 scale.
///
/// Zero when either side maps nothing. Two confident proposals earn a flat
/// bonus; the result never exceeds 100.
pub fn agreement_score(first: &MappingProposal, second: &MappingProposal, bonus: AgreementBonus) -> f64 {
    if first.is_empty() || second.is_empty() {
        return 0.0;
    }
    let matches = first
        .mappings
        .iter()
        .filter(|(column, field)| second.mappings.get(*column) == Some(*field))
        .count();
    let total = first.mappings.len().max(second.mappings.len());
    let mut score = matches as f64 / total as f64 * 100.0;
    if first.confidence > bonus.floor && second.confidence > bonus.floor {
        score = (score + bonus.bonus).min(100.0);
    }
    score
}

/// Union of both proposals.
///
/// Conflicting columns take the assignment of the more confident proposal,
/// the first one on ties. Confidence is the mean of both.
pub fn merge_proposals(first: &MappingProposal, second: &MappingProposal) -> MappingProposal {
    let (preferred, other) = if second.confidence > first.confidence {
        (second, first)
    } else {
        (first, second)
    };
    let mut mappings = other.mappings.clone();
    mappings.extend(preferred.mappings.iter().map(|(column, field)| (column.clone(), *field)));
    MappingProposal {
        fingerprint: first.fingerprint.clone(),
        mappings,
        confidence: (first.confidence + second.confidence) / 2.0,
        method: MappingMethod::Merged,
        reasoning: Some(format!(
            "Merged {} and {} proposals",
            first.method.as_str(),
            second.method.as_str()
        )),
        arbitrated: false,
        judge: None,
    }
}
