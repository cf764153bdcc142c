//! Coarse structural lint of serialized output.
//!
//! Checks only the keys each target needs; it is not a conformance validator.

use sched_model::TargetFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of [`validate_output`]. Issues make the output invalid; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_findings(issues: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
            warnings,
        }
    }
}

pub fn validate_output(data: &Value, target: TargetFormat) -> ValidationReport {
    match target {
        TargetFormat::CdiscSdtm => validate_sdtm(data),
        TargetFormat::FhirR4 => validate_fhir(data),
        TargetFormat::OmopCdm => validate_omop(data),
    }
}

fn validate_sdtm(data: &Value) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    match data.get("TV") {
        None => issues.push("Missing TV (Trial Visits) domain".to_string()),
        Some(records) => {
            for record in records.as_array().into_iter().flatten() {
                if record.get("VISITNUM").is_none() {
                    issues.push("TV record missing VISITNUM".to_string());
                }
                if record.get("VISIT").is_none() {
                    warnings.push("TV record missing VISIT name".to_string());
                }
            }
        }
    }
    ValidationReport::from_findings(issues, warnings)
}

fn validate_fhir(data: &Value) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    match data.get("resourceType") {
        None => issues.push("Missing resourceType".to_string()),
        Some(Value::String(kind)) if kind == "CarePlan" => {}
        Some(Value::String(kind)) => warnings.push(format!("Unexpected resourceType: {kind}")),
        Some(other) => warnings.push(format!("Unexpected resourceType: {other}")),
    }
    if data.get("status").is_none() {
        issues.push("Missing status field".to_string());
    }
    ValidationReport::from_findings(issues, warnings)
}

fn validate_omop(data: &Value) -> ValidationReport {
    let mut issues = Vec::new();
    if data.get("visit_occurrence").is_none() {
        issues.push("Missing visit_occurrence table".to_string());
    }
    ValidationReport::from_findings(issues, Vec::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sdtm_rules() {
        let report = validate_output(&json!({"PR": []}), TargetFormat::CdiscSdtm);
        assert!(!report.valid);
        assert_eq!(report.issues, vec!["Missing TV (Trial Visits) domain"]);

        let report = validate_output(
            &json!({"TV": [{"VISIT": "Screening"}, {"VISITNUM": 2}]}),
            TargetFormat::CdiscSdtm,
        );
        assert_eq!(report.issues, vec!["TV record missing VISITNUM"]);
        assert_eq!(report.warnings, vec!["TV record missing VISIT name"]);
    }

    #[test]
    fn fhir_rules() {
        let report = validate_output(
            &json!({"resourceType": "Patient", "status": "active"}),
            TargetFormat::FhirR4,
        );
        assert!(report.valid);
        assert_eq!(report.warnings, vec!["Unexpected resourceType: Patient"]);

        let report = validate_output(&json!({}), TargetFormat::FhirR4);
        assert_eq!(
            report.issues,
            vec!["Missing resourceType", "Missing status field"]
        );
    }

    #[test]
    fn omop_rules() {
        assert!(validate_output(&json!({"visit_occurrence": []}), TargetFormat::OmopCdm).valid);
        assert!(!validate_output(&json!({}), TargetFormat::OmopCdm).valid);
    }
}
