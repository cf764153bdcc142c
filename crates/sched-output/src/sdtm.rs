//! CDISC SDTM trial visits (TV) and procedures (PR).

use sched_model::{CanonicalField, MappingProposal, ParsedInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OutputOptions;
use crate::common::{is_blank, mapped_value};

pub const SDTM_FORMAT: &str = "CDISC_SDTM";
pub const SDTM_VERSION: &str = "3.3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct TrialVisit {
    pub studyid: String,
    pub domain: String,
    pub visitnum: usize,
    pub visit: Value,
    pub visitdy: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Procedure {
    pub studyid: String,
    pub domain: String,
    pub visitnum: usize,
    pub prtrt: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdtmDocument {
    #[serde(rename = "TV")]
    pub trial_visits: Vec<TrialVisit>,
    #[serde(rename = "PR")]
    pub procedures: Vec<Procedure>,
    pub format: String,
    pub version: String,
}

/// One TV record per row; one PR record per comma-separated procedure.
pub fn to_sdtm(parsed: &ParsedInput, proposal: &MappingProposal, options: &OutputOptions) -> SdtmDocument {
    let columns = parsed.columns();
    let mut trial_visits = Vec::with_capacity(parsed.row_count());
    let mut procedures = Vec::new();

    for (idx, row) in parsed.rows().iter().enumerate() {
        let visitnum = idx + 1;
        trial_visits.push(TrialVisit {
            studyid: options.study_id.clone(),
            domain: "TV".to_string(),
            visitnum,
            visit: mapped_value(row, columns, proposal, CanonicalField::VisitName),
            visitdy: mapped_value(row, columns, proposal, CanonicalField::VisitDay),
        });

        let treatments = mapped_value(row, columns, proposal, CanonicalField::Procedures);
        for prtrt in split_procedures(treatments) {
            procedures.push(Procedure {
                studyid: options.study_id.clone(),
                domain: "PR".to_string(),
                visitnum,
                prtrt,
            });
        }
    }

    SdtmDocument {
        trial_visits,
        procedures,
        format: SDTM_FORMAT.to_string(),
        version: SDTM_VERSION.to_string(),
    }
}

/// Text splits on commas (empty pieces dropped); other non-blank values pass through whole.
fn split_procedures(value: Value) -> Vec<Value> {
    match value {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(|piece| Value::String(piece.to_string()))
            .collect(),
        other if is_blank(&other) => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn splits_and_trims_procedures() {
        assert_eq!(
            split_procedures(json!(" Vitals, Labs,,")),
            vec![json!("Vitals"), json!("Labs")]
        );
        assert_eq!(split_procedures(json!(42)), vec![json!(42)]);
        assert!(split_procedures(json!("")).is_empty());
        assert!(split_procedures(Value::Null).is_empty());
    }

    #[test]
    fn serializes_with_sdtm_names() {
        let record = TrialVisit {
            studyid: "S1".to_string(),
            domain: "TV".to_string(),
            visitnum: 1,
            visit: json!("Screening"),
            visitdy: json!("-7"),
        };
        let value = serde_json::to_value(record).expect("serialize");
        assert_eq!(value["STUDYID"], "S1");
        assert_eq!(value["VISITNUM"], 1);
        assert_eq!(value["VISITDY"], "-7");
    }
}
