//! Schedule output generation.
//!
//! This crate shapes mapped schedule rows into the supported target formats:
//!
//! - **CDISC SDTM**: TV (trial visits) and PR (procedures) records
//! - **FHIR R4**: a `CarePlan` resource with one appointment per visit
//! - **OMOP CDM**: `visit_occurrence` rows
//!
//! The transforms are structural only and never fail. [`validate_output`]
//! provides a coarse lint of a serialized document.

mod common;
pub mod fhir;
pub mod omop;
pub mod sdtm;
mod validate;

use sched_model::{MappingProposal, ParsedInput, TargetFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use common::{mapped_value, value_text};
pub use fhir::{CarePlan, to_fhir};
pub use omop::{OmopDocument, to_omop};
pub use sdtm::{SdtmDocument, to_sdtm};
pub use validate::{ValidationReport, validate_output};

/// Study identifier written when none is configured.
pub const DEFAULT_STUDY_ID: &str = "STUDY001";

/// Options for output generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// STUDYID of SDTM records.
    pub study_id: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            study_id: DEFAULT_STUDY_ID.to_string(),
        }
    }
}

impl OutputOptions {
    pub fn with_study_id(mut self, study_id: impl Into<String>) -> Self {
        self.study_id = study_id.into();
        self
    }
}

/// A serialized schedule in one of the target formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleDocument {
    Sdtm(SdtmDocument),
    Fhir(CarePlan),
    Omop(OmopDocument),
}

impl ScheduleDocument {
    pub fn target_format(&self) -> TargetFormat {
        match self {
            Self::Sdtm(_) => TargetFormat::CdiscSdtm,
            Self::Fhir(_) => TargetFormat::FhirR4,
            Self::Omop(_) => TargetFormat::OmopCdm,
        }
    }

    /// Number of top-level records: TV rows, activities or visit occurrences.
    pub fn record_count(&self) -> usize {
        match self {
            Self::Sdtm(document) => document.trial_visits.len(),
            Self::Fhir(care_plan) => care_plan.activity.len(),
            Self::Omop(document) => document.visit_occurrence.len(),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Shapes `parsed` into `target` using the accepted mapping.
pub fn serialize(
    parsed: &ParsedInput,
    proposal: &MappingProposal,
    target: TargetFormat,
    options: &OutputOptions,
) -> ScheduleDocument {
    debug!(
        target = target.as_str(),
        rows = parsed.row_count(),
        mapped = proposal.mappings.len(),
        "serializing schedule"
    );
    match target {
        TargetFormat::CdiscSdtm => ScheduleDocument::Sdtm(to_sdtm(parsed, proposal, options)),
        TargetFormat::FhirR4 => ScheduleDocument::Fhir(to_fhir(parsed, proposal)),
        TargetFormat::OmopCdm => ScheduleDocument::Omop(to_omop(parsed, proposal)),
    }
}
