//! Mapping proposals exchanged between the decision stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::CanonicalField;

/// Which stage produced a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMethod {
    Cache,
    PatternMatching,
    Analysis,
    FuzzyLogic,
    Merged,
}

impl MappingMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::PatternMatching => "pattern_matching",
            Self::Analysis => "analysis",
            Self::FuzzyLogic => "fuzzy_logic",
            Self::Merged => "merged",
        }
    }
}

/// Who settled an arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeKind {
    Oracle,
    HeuristicFallback,
}

/// Whether the structural analyzer answered from its oracle or its local rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerMode {
    Oracle,
    Fallback,
}

/// A column-to-field assignment with a self-reported confidence (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingProposal {
    /// Fingerprint of the input the proposal was made for.
    #[serde(default)]
    pub fingerprint: String,
    /// Source column name to canonical field.
    pub mappings: BTreeMap<String, CanonicalField>,
    pub confidence: f64,
    pub method: MappingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub arbitrated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<JudgeKind>,
}

impl MappingProposal {
    /// An empty proposal with zero confidence.
    pub fn empty(fingerprint: impl Into<String>, method: MappingMethod) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            mappings: BTreeMap::new(),
            confidence: 0.0,
            method,
            reasoning: None,
            arbitrated: false,
            judge: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// The first column, in `columns` order, assigned to `field`.
    pub fn source_for<'a>(&self, field: CanonicalField, columns: &'a [String]) -> Option<&'a str> {
        columns
            .iter()
            .find(|column| self.mappings.get(column.as_str()) == Some(&field))
            .map(String::as_str)
    }
}

/// Share of columns that received a mapping, as a 0-100 score.
///
/// Zero columns yield zero confidence.
#[must_use]
pub fn coverage_confidence(mapped: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    mapped as f64 / total as f64 * 100.0
}
