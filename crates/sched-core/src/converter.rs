//! The tiered mapping decision pipeline.
//!
//! Stages run in order and the first one that is confident enough settles the
//! mapping:
//!
//! 1. cached decision for the organization (fixed acceptance level)
//! 2. deterministic pattern matching
//! 3. structural analysis plus independent fuzzy validation, merged when they
//!    agree
//! 4. arbitration, which always yields a decision
//!
//! Every decision except a cache hit is written through to the store before
//! the conversion returns.

use std::sync::Arc;

use sched_ingest::parse_input;
use sched_map::{
    AgreementBonus, FuzzyValidator, Judge, MappingOracle, MappingStore, PatternMatcher,
    StructureAnalyzer, agreement_score, merge_proposals,
};
use sched_model::{
    AnalyzerMode, CacheRecord, CacheStatistics, ClearScope, FileType, MappingMethod,
    MappingProposal, ParsedInput, TargetFormat,
};
use sched_output::{ValidationReport, serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::request::ConvertRequest;
use crate::result::{ConversionResult, DecidedBy, StructureReport};

/// Mapping chosen by the pipeline and how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub proposal: MappingProposal,
    pub decided_by: DecidedBy,
    pub analyzer_mode: Option<AnalyzerMode>,
}

/// Converts schedules, owning the mapping store and the decision stages.
pub struct ScheduleConverter {
    store: Arc<dyn MappingStore>,
    config: ConverterConfig,
    matcher: PatternMatcher,
    analyzer: StructureAnalyzer,
    validator: FuzzyValidator,
    judge: Judge,
}

impl std::fmt::Debug for ScheduleConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleConverter")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer)
            .field("judge", &self.judge)
            .finish_non_exhaustive()
    }
}

impl ScheduleConverter {
    /// Converter without an oracle: analysis and arbitration use local rules.
    pub fn new(store: Arc<dyn MappingStore>, config: ConverterConfig) -> Self {
        let thresholds = config.thresholds;
        Self {
            store,
            matcher: PatternMatcher::new(),
            analyzer: StructureAnalyzer::offline(),
            validator: FuzzyValidator::new(thresholds.fuzzy_acceptance),
            judge: Judge::new(None)
                .with_boost(thresholds.arbitration_boost, thresholds.arbitration_cap),
            config,
        }
    }

    /// Routes analysis and arbitration through `oracle` first.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn MappingOracle>) -> Self {
        let thresholds = self.config.thresholds;
        self.analyzer = StructureAnalyzer::new(Some(Arc::clone(&oracle)));
        self.judge = Judge::new(Some(oracle))
            .with_boost(thresholds.arbitration_boost, thresholds.arbitration_cap);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Converts `content` into `target`.
    ///
    /// Without a `confidence_threshold` the configured default applies.
    /// Malformed input yields `Ok` with `success = false`. Store failures are
    /// logged and do not affect the result.
    pub fn convert(
        &self,
        content: &str,
        file_type: FileType,
        target: TargetFormat,
        organization_id: Option<&str>,
        confidence_threshold: Option<f64>,
    ) -> Result<ConversionResult> {
        let confidence_threshold =
            confidence_threshold.unwrap_or(self.config.default_confidence_threshold);
        let span = info_span!("convert", %file_type, %target, confidence_threshold);
        let _guard = span.enter();

        let parsed = match parse_input(content, file_type) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "input could not be parsed");
                return Ok(ConversionResult::malformed(target, error.to_string()));
            }
        };

        let organization_id = organization_id
            .map(str::trim)
            .filter(|organization| !organization.is_empty());
        let cached = organization_id.and_then(|organization| self.cached_decision(organization, &parsed));
        let cache_hit = cached.is_some();
        let decision = match cached {
            Some(decision) => decision,
            None => self.decide(&parsed, organization_id, confidence_threshold),
        };

        let document = serialize(&parsed, &decision.proposal, target, &self.config.output);
        let data = document.to_value()?;
        let arbitration_used = decision.decided_by == DecidedBy::Arbitration;
        info!(
            decided_by = decision.decided_by.as_str(),
            confidence = decision.proposal.confidence,
            rows = parsed.row_count(),
            "conversion finished"
        );

        Ok(ConversionResult {
            success: true,
            data: Some(data),
            confidence: decision.proposal.confidence,
            row_count: parsed.row_count(),
            arbitration_used,
            judge_reasoning: arbitration_used
                .then(|| decision.proposal.reasoning.clone())
                .flatten(),
            cache_hit,
            decided_by: Some(decision.decided_by),
            analyzer_mode: decision.analyzer_mode,
            target_format: target,
            error: None,
            mappings_used: Some(decision.proposal),
        })
    }

    /// Validates the request's strings, then converts.
    pub fn run(&self, request: &ConvertRequest) -> Result<ConversionResult> {
        let file_type: FileType = request.file_type.parse()?;
        let target: TargetFormat = request.target_format.parse()?;
        self.convert(
            &request.file_content,
            file_type,
            target,
            request.organization_id.as_deref(),
            request.confidence_threshold,
        )
    }

    /// Runs the non-cache stages and writes the decision through.
    pub fn decide(
        &self,
        parsed: &ParsedInput,
        organization_id: Option<&str>,
        confidence_threshold: f64,
    ) -> Decision {
        let thresholds = self.config.thresholds;

        let pattern = self.matcher.match_input(parsed);
        debug!(stage = "pattern", confidence = pattern.confidence, "stage scored");
        if pattern.confidence > confidence_threshold {
            info!(
                fingerprint = parsed.fingerprint(),
                confidence = pattern.confidence,
                "pattern matching accepted"
            );
            self.write_through(organization_id, &pattern);
            return Decision {
                proposal: pattern,
                decided_by: DecidedBy::Pattern,
                analyzer_mode: None,
            };
        }

        debug!(oracle = self.analyzer.has_oracle(), "running structural analysis");
        let analysis = self.analyzer.analyze(parsed);
        let analyzer_mode = Some(analysis.mode);
        let validation = self.validator.validate(&analysis.proposal, parsed);
        let bonus = AgreementBonus {
            floor: thresholds.agreement_bonus_floor,
            bonus: thresholds.agreement_bonus,
        };
        let agreement = agreement_score(&analysis.proposal, &validation, bonus);
        debug!(
            stage = "agreement",
            analysis = analysis.proposal.confidence,
            validation = validation.confidence,
            agreement,
            "stage scored"
        );

        if agreement > confidence_threshold {
            let mut merged = merge_proposals(&analysis.proposal, &validation);
            merged.fingerprint = parsed.fingerprint().to_string();
            info!(
                fingerprint = parsed.fingerprint(),
                agreement,
                confidence = merged.confidence,
                "analysis and validation agree"
            );
            self.write_through(organization_id, &merged);
            return Decision {
                proposal: merged,
                decided_by: DecidedBy::Agreement,
                analyzer_mode,
            };
        }

        info!(
            fingerprint = parsed.fingerprint(),
            agreement, "disagreement detected, arbitrating"
        );
        let decision = self.judge.arbitrate(&analysis.proposal, &validation, parsed);
        self.write_through(organization_id, &decision);
        Decision {
            proposal: decision,
            decided_by: DecidedBy::Arbitration,
            analyzer_mode,
        }
    }

    /// Cached decision above the cache acceptance level, if any.
    fn cached_decision(&self, organization_id: &str, parsed: &ParsedInput) -> Option<Decision> {
        let record = match self.store.record(organization_id, parsed.fingerprint()) {
            Ok(record) => record?,
            Err(error) => {
                warn!(%error, organization = organization_id, "cache lookup failed");
                return None;
            }
        };
        if record.confidence() <= self.config.thresholds.cache_accept {
            debug!(
                confidence = record.confidence(),
                "cached mapping below acceptance level"
            );
            return None;
        }
        if let Err(error) = self.store.touch(organization_id, parsed.fingerprint()) {
            warn!(%error, organization = organization_id, "failed to update cache usage");
        }
        info!(
            organization = organization_id,
            confidence = record.confidence(),
            "using cached mapping"
        );
        let mut proposal = record.proposal;
        proposal.method = MappingMethod::Cache;
        Some(Decision {
            proposal,
            decided_by: DecidedBy::Cache,
            analyzer_mode: None,
        })
    }

    fn write_through(&self, organization_id: Option<&str>, proposal: &MappingProposal) {
        if let Err(error) = self.store.store(organization_id, proposal) {
            warn!(%error, "failed to persist mapping decision");
        }
    }

    /// Columns, detected patterns and suggested mappings of an input.
    pub fn analyze_structure(&self, content: &str, file_type: FileType) -> Result<StructureReport> {
        let parsed = parse_input(content, file_type)?;
        Ok(StructureReport {
            columns: parsed.columns().to_vec(),
            row_count: parsed.row_count(),
            detected_patterns: self.matcher.detect_patterns(&parsed),
            suggested_mappings: self.matcher.suggest_mappings(&parsed),
            file_type,
        })
    }

    pub fn validate_output(&self, data: &Value, target: TargetFormat) -> ValidationReport {
        sched_output::validate_output(data, target)
    }

    pub fn get_cached_mappings(&self, organization_id: &str) -> Result<Vec<CacheRecord>> {
        Ok(self.store.list_all(organization_id)?)
    }

    /// Clears one organization, or everything for `"all"`.
    pub fn clear_cache(&self, organization_id: &str) -> Result<usize> {
        Ok(self.store.clear(&ClearScope::parse(organization_id))?)
    }

    pub fn get_statistics(&self, organization_id: Option<&str>) -> Result<CacheStatistics> {
        Ok(self.store.statistics(organization_id)?)
    }
}
