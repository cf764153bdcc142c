//! Column mapping stages for the schedule converter.
//!
//! - [`PatternMatcher`]: deterministic regex rules, the pipeline's fast path
//! - [`StructureAnalyzer`]: oracle-backed analysis with a local fallback
//! - [`FuzzyValidator`]: independent string-similarity second opinion
//! - [`agreement_score`] / [`merge_proposals`]: agreement between the two
//! - [`Judge`]: arbitration when they disagree
//! - [`MappingStore`]: persisted decisions keyed by organization and fingerprint

pub mod agreement;
pub mod analyzer;
pub mod error;
pub mod judge;
pub mod oracle;
pub mod patterns;
pub mod repository;
pub mod score;
pub mod thresholds;
mod utils;

pub use agreement::{AgreementBonus, agreement_score, merge_proposals};
pub use analyzer::{AnalyzerOutcome, StructureAnalyzer, fallback_analysis};
pub use error::{OracleError, StoreError, StoreResult};
pub use judge::Judge;
pub use oracle::{
    ChatCompletionsOracle, MappingOracle, OracleConfig, OracleProposal, OracleVerdict,
    VerdictChoice,
};
pub use patterns::{PatternMatcher, match_column};
pub use repository::{FileMappingStore, MappingStore, MemoryMappingStore, StoreOutcome};
pub use score::{FuzzyValidator, similarity};
pub use thresholds::{DecisionThresholds, clamp_confidence};
