//! FHIR R4 CarePlan with one appointment activity per row.

use sched_model::{CanonicalField, MappingProposal, ParsedInput};
use serde::{Deserialize, Serialize};

use crate::common::{mapped_value, value_text};

pub const CARE_PLAN_TITLE: &str = "Clinical Trial Schedule";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    pub resource_type: String,
    pub status: String,
    pub intent: String,
    pub title: String,
    pub activity: Vec<CarePlanActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarePlanActivity {
    pub detail: ActivityDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetail {
    pub kind: String,
    pub code: CodeableText,
    pub scheduled_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeableText {
    pub text: serde_json::Value,
}

pub fn to_fhir(parsed: &ParsedInput, proposal: &MappingProposal) -> CarePlan {
    let columns = parsed.columns();
    let activity = parsed
        .rows()
        .iter()
        .map(|row| {
            let day = mapped_value(row, columns, proposal, CanonicalField::VisitDay);
            CarePlanActivity {
                detail: ActivityDetail {
                    kind: "Appointment".to_string(),
                    code: CodeableText {
                        text: mapped_value(row, columns, proposal, CanonicalField::VisitName),
                    },
                    scheduled_string: format!("Day {}", value_text(&day)),
                },
            }
        })
        .collect();

    CarePlan {
        resource_type: "CarePlan".to_string(),
        status: "active".to_string(),
        intent: "plan".to_string(),
        title: CARE_PLAN_TITLE.to_string(),
        activity,
    }
}
