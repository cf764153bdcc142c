use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sched_core::{ConvertError, ConvertRequest, ConverterConfig, DecidedBy, ScheduleConverter};
use sched_map::{
    FileMappingStore, MappingOracle, MappingStore, MemoryMappingStore, OracleError,
    OracleProposal, OracleVerdict, StoreError, StoreOutcome, StoreResult,
};
use sched_model::{
    AnalyzerMode, CacheRecord, CacheStatistics, CacheWritePolicy, ClearScope, FileType,
    MappingMethod, MappingProposal, ModelError, ParsedInput, TargetFormat,
};
use tempfile::tempdir;

const SCHEDULE_CSV: &str =
    "Visit Name,Study Day,Procedures\nScreening,-14,Informed Consent\nBaseline,0,Vital Signs";

/// Oracle that counts calls and answers with a fixed proposal.
struct CountingOracle {
    proposals: AtomicUsize,
    judgements: AtomicUsize,
    reply: OracleProposal,
}

impl CountingOracle {
    fn new(reply: OracleProposal) -> Self {
        Self {
            proposals: AtomicUsize::new(0),
            judgements: AtomicUsize::new(0),
            reply,
        }
    }
}

impl MappingOracle for CountingOracle {
    fn propose(&self, _parsed: &ParsedInput) -> Result<OracleProposal, OracleError> {
        self.proposals.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn judge(
        &self,
        _first: &MappingProposal,
        _second: &MappingProposal,
        _parsed: &ParsedInput,
    ) -> Result<OracleVerdict, OracleError> {
        self.judgements.fetch_add(1, Ordering::SeqCst);
        Err(OracleError::Timeout)
    }
}

/// Store whose writes always fail.
struct BrokenStore;

impl MappingStore for BrokenStore {
    fn store(&self, _organization_id: Option<&str>, _proposal: &MappingProposal) -> StoreResult<StoreOutcome> {
        Err(StoreError::Poisoned)
    }

    fn record(&self, _organization_id: &str, _fingerprint: &str) -> StoreResult<Option<CacheRecord>> {
        Err(StoreError::Poisoned)
    }

    fn touch(&self, _organization_id: &str, _fingerprint: &str) -> StoreResult<()> {
        Err(StoreError::Poisoned)
    }

    fn list_all(&self, _organization_id: &str) -> StoreResult<Vec<CacheRecord>> {
        Err(StoreError::Poisoned)
    }

    fn clear(&self, _scope: &ClearScope) -> StoreResult<usize> {
        Err(StoreError::Poisoned)
    }

    fn statistics(&self, _organization_id: Option<&str>) -> StoreResult<CacheStatistics> {
        Err(StoreError::Poisoned)
    }
}

fn memory_converter() -> ScheduleConverter {
    ScheduleConverter::new(Arc::new(MemoryMappingStore::default()), ConverterConfig::default())
}

#[test]
fn csv_to_sdtm_end_to_end() {
    let result = memory_converter()
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, None, Some(85.0))
        .expect("convert");

    assert!(result.success);
    assert!(result.confidence > 0.0);
    assert_eq!(result.row_count, 2);
    assert_eq!(result.decided_by, Some(DecidedBy::Pattern));
    let data = result.data.expect("document");
    assert_eq!(data["TV"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["PR"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["TV"][0]["VISIT"], "Screening");
    assert_eq!(data["PR"][1]["PRTRT"], "Vital Signs");
}

#[test]
fn csv_to_fhir_end_to_end() {
    let result = memory_converter()
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::FhirR4, None, Some(85.0))
        .expect("convert");
    let data = result.data.expect("document");
    assert_eq!(data["resourceType"], "CarePlan");
    assert_eq!(data["status"], "active");
    assert_eq!(data["activity"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["activity"][0]["detail"]["scheduledString"], "Day -14");
}

#[test]
fn second_call_hits_the_cache() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("store"));
    let converter = ScheduleConverter::new(store.clone(), ConverterConfig::default());

    let first = converter
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, Some("acme"), Some(85.0))
        .expect("first convert");
    assert!(!first.cache_hit);
    assert!(first.confidence > 90.0);

    let second = converter
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::OmopCdm, Some("acme"), Some(85.0))
        .expect("second convert");
    assert!(second.cache_hit);
    assert_eq!(second.decided_by, Some(DecidedBy::Cache));
    assert_eq!(
        second.mappings_used.as_ref().map(|p| p.method),
        Some(MappingMethod::Cache)
    );
    assert_eq!(second.data.expect("document")["visit_occurrence"][1]["visit_start_date"], "0");

    let records = converter.get_cached_mappings("acme").expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].success_count, 2);
}

#[test]
fn confident_patterns_skip_the_analyzer() {
    let oracle = Arc::new(CountingOracle::new(OracleProposal::default()));
    let converter = memory_converter().with_oracle(oracle.clone());
    let result = converter
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, None, Some(85.0))
        .expect("convert");
    assert_eq!(result.decided_by, Some(DecidedBy::Pattern));
    assert_eq!(result.analyzer_mode, None);
    assert_eq!(oracle.proposals.load(Ordering::SeqCst), 0);
    assert_eq!(oracle.judgements.load(Ordering::SeqCst), 0);
}

#[test]
fn agreeing_stages_are_merged() {
    let mut mappings = BTreeMap::new();
    mappings.insert("Visit".to_string(), "visit_name".to_string());
    let oracle = Arc::new(CountingOracle::new(OracleProposal {
        mappings,
        confidence: 90.0,
        reasoning: Some("visit column".to_string()),
    }));
    let converter = memory_converter().with_oracle(oracle.clone());

    let result = converter
        .convert("Visit,Notes\nScreening,fasting", FileType::Csv, TargetFormat::CdiscSdtm, None, Some(85.0))
        .expect("convert");
    assert_eq!(result.decided_by, Some(DecidedBy::Agreement));
    assert_eq!(result.analyzer_mode, Some(AnalyzerMode::Oracle));
    assert_eq!(result.confidence, 70.0);
    assert!(!result.arbitration_used);
    assert_eq!(oracle.proposals.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.mappings_used.map(|p| p.method),
        Some(MappingMethod::Merged)
    );
}

#[test]
fn unrecognized_columns_are_arbitrated() {
    let store = Arc::new(MemoryMappingStore::default());
    let converter = ScheduleConverter::new(store.clone(), ConverterConfig::default());
    let result = converter
        .convert("alpha\nbeta", FileType::Text, TargetFormat::CdiscSdtm, Some("acme"), Some(85.0))
        .expect("convert");

    assert!(result.success);
    assert!(result.arbitration_used);
    assert_eq!(result.decided_by, Some(DecidedBy::Arbitration));
    assert_eq!(result.analyzer_mode, Some(AnalyzerMode::Fallback));
    assert_eq!(result.confidence, 10.0);
    assert!(result.judge_reasoning.is_some());
    assert_eq!(result.data.expect("document")["TV"][0]["VISIT"], "");

    // Low-confidence decisions are stored but never reused.
    let again = converter
        .convert("gamma", FileType::Text, TargetFormat::CdiscSdtm, Some("acme"), Some(85.0))
        .expect("convert again");
    assert!(!again.cache_hit);
    let records = store.list_all("acme").expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].success_count, 2);
}

#[test]
fn store_failures_do_not_fail_the_conversion() {
    let converter = ScheduleConverter::new(Arc::new(BrokenStore), ConverterConfig::default());
    let result = converter
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, Some("acme"), Some(85.0))
        .expect("convert");
    assert!(result.success);
    assert!(!result.cache_hit);
    assert!(matches!(
        converter.get_statistics(None),
        Err(ConvertError::Store(_))
    ));
}

#[test]
fn unknown_target_format_is_a_caller_error() {
    let mut request = ConvertRequest::new(SCHEDULE_CSV);
    request.file_type = "csv".to_string();
    request.target_format = "HL7_V2".to_string();
    let error = memory_converter().run(&request).expect_err("must fail");
    assert!(matches!(
        error,
        ConvertError::Request(ModelError::UnknownTargetFormat(ref name)) if name == "HL7_V2"
    ));
}

#[test]
fn unsupported_file_type_is_a_caller_error() {
    let mut request = ConvertRequest::new(SCHEDULE_CSV);
    request.file_type = "xlsx".to_string();
    assert!(matches!(
        memory_converter().run(&request),
        Err(ConvertError::Request(ModelError::UnsupportedFileType(_)))
    ));
}

#[test]
fn malformed_json_is_an_unsuccessful_result() {
    let result = memory_converter()
        .convert("[1, 2", FileType::Json, TargetFormat::FhirR4, None, Some(85.0))
        .expect("convert");
    assert!(!result.success);
    assert!(result.data.is_none());
    assert!(result.error.is_some());
}

#[test]
fn base64_content_is_decoded() {
    let mut request = ConvertRequest::new(STANDARD.encode(SCHEDULE_CSV));
    request.file_type = "csv".to_string();
    let result = memory_converter().run(&request).expect("run");
    assert_eq!(result.row_count, 2);
    assert_eq!(result.target_format, TargetFormat::CdiscSdtm);
}

#[test]
fn structure_report_lists_patterns() {
    let report = memory_converter()
        .analyze_structure(SCHEDULE_CSV, FileType::Csv)
        .expect("analyze");
    assert_eq!(report.columns, vec!["Visit Name", "Study Day", "Procedures"]);
    assert_eq!(report.row_count, 2);
    assert_eq!(report.suggested_mappings.len(), 3);
    assert!(report.detected_patterns.contains(&"Date pattern in column: Study Day".to_string()));
}

#[test]
fn clear_cache_and_statistics() {
    let converter = memory_converter();
    for organization in ["acme", "globex"] {
        converter
            .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, Some(organization), Some(85.0))
            .expect("convert");
    }
    let stats = converter.get_statistics(None).expect("stats");
    assert_eq!(stats.total_mappings, 2);
    assert_eq!(stats.average_confidence, 100.0);

    assert_eq!(converter.clear_cache("acme").expect("clear"), 1);
    assert_eq!(converter.clear_cache("all").expect("clear all"), 1);
    assert_eq!(converter.get_statistics(Some("acme")).expect("stats").total_mappings, 0);
}

#[test]
fn configured_default_threshold_applies_when_none_is_given() {
    let config = ConverterConfig::default().with_default_confidence_threshold(101.0);
    let strict = ScheduleConverter::new(Arc::new(MemoryMappingStore::default()), config);

    let defaulted = strict
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, None, None)
        .expect("convert");
    assert_eq!(defaulted.decided_by, Some(DecidedBy::Arbitration));

    let explicit = strict
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, None, Some(85.0))
        .expect("convert");
    assert_eq!(explicit.decided_by, Some(DecidedBy::Pattern));

    let request = ConvertRequest {
        file_type: "csv".to_string(),
        ..ConvertRequest::new(SCHEDULE_CSV)
    };
    let from_request = strict.run(&request).expect("run");
    assert_eq!(from_request.decided_by, Some(DecidedBy::Arbitration));
}

#[test]
fn converter_default_threshold_is_eighty_five() {
    let converter = memory_converter();
    assert_eq!(converter.config().default_confidence_threshold, 85.0);
    let result = converter
        .convert(SCHEDULE_CSV, FileType::Csv, TargetFormat::CdiscSdtm, None, None)
        .expect("convert");
    assert_eq!(result.decided_by, Some(DecidedBy::Pattern));
}
