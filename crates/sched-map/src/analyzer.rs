//! Structural analysis of an input's columns.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use sched_model::{
    AnalyzerMode, CanonicalField, MappingMethod, MappingProposal, ParsedInput, coverage_confidence,
};
use tracing::{debug, warn};

use crate::oracle::{MappingOracle, OracleProposal};
use crate::thresholds::clamp_confidence;
use crate::utils::normalize_text;

/// Substring rules of the local fallback, checked in order.
const FALLBACK_RULES: [(&[&str], CanonicalField); 5] = [
    (&["visit", "timepoint"], CanonicalField::VisitName),
    (&["day", "date"], CanonicalField::VisitDay),
    (&["procedure", "assessment", "test"], CanonicalField::Procedures),
    (&["window"], CanonicalField::VisitWindow),
    (&["subject", "patient"], CanonicalField::SubjectId),
];

/// A proposal together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOutcome {
    pub proposal: MappingProposal,
    pub mode: AnalyzerMode,
}

/// Produces the `analysis` proposal, from an oracle when one is configured.
#[derive(Clone, Default)]
pub struct StructureAnalyzer {
    oracle: Option<Arc<dyn MappingOracle>>,
}

impl std::fmt::Debug for StructureAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureAnalyzer")
            .field("oracle", &self.oracle.is_some())
            .finish()
    }
}

impl StructureAnalyzer {
    pub fn new(oracle: Option<Arc<dyn MappingOracle>>) -> Self {
        Self { oracle }
    }

    /// Analyzer that only ever uses its local rules.
    pub fn offline() -> Self {
        Self { oracle: None }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Never fails: any oracle problem falls back to the local rules.
    pub fn analyze(&self, parsed: &ParsedInput) -> AnalyzerOutcome {
        if let Some(oracle) = &self.oracle {
            match oracle.propose(parsed) {
                Ok(reply) => {
                    let proposal = from_oracle(reply, parsed);
                    debug!(
                        fingerprint = parsed.fingerprint(),
                        confidence = proposal.confidence,
                        "oracle analysis accepted"
                    );
                    return AnalyzerOutcome {
                        proposal,
                        mode: AnalyzerMode::Oracle,
                    };
                }
                Err(error) => {
                    warn!(%error, "oracle analysis failed, using local rules");
                }
            }
        }
        AnalyzerOutcome {
            proposal: fallback_analysis(parsed),
            mode: AnalyzerMode::Fallback,
        }
    }
}

/// Keeps only known columns mapped to known fields and clamps the confidence.
fn from_oracle(reply: OracleProposal, parsed: &ParsedInput) -> MappingProposal {
    let mappings = filter_mappings(reply.mappings, parsed);
    MappingProposal {
        fingerprint: parsed.fingerprint().to_string(),
        mappings,
        confidence: clamp_confidence(reply.confidence),
        method: MappingMethod::Analysis,
        reasoning: reply.reasoning.or_else(|| Some("Oracle analysis".to_string())),
        arbitrated: false,
        judge: None,
    }
}

/// Drops oracle assignments naming unknown columns or unknown fields.
pub(crate) fn filter_mappings(
    raw: BTreeMap<String, String>,
    parsed: &ParsedInput,
) -> BTreeMap<String, CanonicalField> {
    raw.into_iter()
        .filter(|(column, _)| parsed.columns().contains(column))
        .filter_map(|(column, field)| match CanonicalField::from_str(field.trim()) {
            Ok(field) => Some((column, field)),
            Err(_) => {
                debug!(column = %column, field = %field, "dropping unknown oracle field");
                None
            }
        })
        .collect()
}

/// Local substring heuristic; confidence is the mapped share of columns.
pub fn fallback_analysis(parsed: &ParsedInput) -> MappingProposal {
    let mut mappings = BTreeMap::new();
    for column in parsed.columns() {
        let normalized = normalize_text(column);
        let hit = FALLBACK_RULES.iter().find(|(needles, _)| {
            needles.iter().any(|needle| normalized.contains(needle))
        });
        if let Some((_, field)) = hit {
            mappings.insert(column.clone(), *field);
        }
    }
    let confidence = coverage_confidence(mappings.len(), parsed.columns().len());
    MappingProposal {
        fingerprint: parsed.fingerprint().to_string(),
        mappings,
        confidence,
        method: MappingMethod::Analysis,
        reasoning: Some("No oracle available - using local column rules".to_string()),
        arbitrated: false,
        judge: None,
    }
}
