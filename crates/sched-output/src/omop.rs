//! OMOP CDM visit occurrences.

use sched_model::{CanonicalField, MappingProposal, ParsedInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::mapped_value;

pub const OMOP_FORMAT: &str = "OMOP_CDM";
pub const OMOP_VERSION: &str = "5.3";
/// Concept id for a clinical trial visit.
pub const CLINICAL_TRIAL_VISIT_CONCEPT: u32 = 32810;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitOccurrence {
    pub visit_occurrence_id: usize,
    pub visit_concept_id: u32,
    pub visit_start_date: Value,
    pub visit_type_concept_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmopDocument {
    pub visit_occurrence: Vec<VisitOccurrence>,
    pub format: String,
    pub version: String,
}

pub fn to_omop(parsed: &ParsedInput, proposal: &MappingProposal) -> OmopDocument {
    let columns = parsed.columns();
    let visit_occurrence = parsed
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| VisitOccurrence {
            visit_occurrence_id: idx + 1,
            visit_concept_id: CLINICAL_TRIAL_VISIT_CONCEPT,
            visit_start_date: mapped_value(row, columns, proposal, CanonicalField::VisitDay),
            visit_type_concept_id: CLINICAL_TRIAL_VISIT_CONCEPT,
        })
        .collect();

    OmopDocument {
        visit_occurrence,
        format: OMOP_FORMAT.to_string(),
        version: OMOP_VERSION.to_string(),
    }
}
