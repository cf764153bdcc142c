//! Subcommand tests against files on disk.

use std::fs;

use sched_cli::commands::{
    ConvertJob, ConverterSettings, build_converter, run_analyze, run_cache_clear, run_cache_list,
    run_cache_stats, run_convert, run_validate,
};
use sched_model::{CacheWritePolicy, FileType, TargetFormat};
use tempfile::TempDir;

const SCHEDULE_CSV: &str = "Visit,Day,Procedure\nScreening,-14,\"Consent, Vitals\"\nBaseline,1,Labs\n";

fn offline_settings(dir: &TempDir) -> ConverterSettings<'_> {
    ConverterSettings {
        cache_dir: Some(dir.path()),
        write_policy: CacheWritePolicy::ReplaceAlways,
        study_id: Some("CLI-STUDY".to_string()),
        use_oracle: false,
    }
}

#[test]
fn convert_writes_document_and_populates_cache() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("schedule.csv");
    let output = dir.path().join("out").join("sdtm.json");
    fs::write(&input, SCHEDULE_CSV).expect("write input");

    let cache_dir = dir.path().join("cache");
    let settings = ConverterSettings {
        cache_dir: Some(&cache_dir),
        ..offline_settings(&dir)
    };
    let converter = build_converter(&settings).expect("converter");
    let job = ConvertJob {
        input: &input,
        file_type: FileType::Csv,
        target: TargetFormat::CdiscSdtm,
        organization: Some("acme"),
        threshold: None,
        output: Some(&output),
    };

    let result = run_convert(&converter, &job).expect("convert");
    assert!(result.success);
    assert_eq!(result.row_count, 2);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("read output")).expect("json");
    assert_eq!(written["TV"].as_array().map(Vec::len), Some(2));
    assert_eq!(written["PR"].as_array().map(Vec::len), Some(3));
    assert_eq!(written["TV"][0]["STUDYID"], "CLI-STUDY");

    let records = run_cache_list(&converter, "acme").expect("list");
    assert_eq!(records.len(), 1);
    let stats = run_cache_stats(&converter, Some("acme")).expect("stats");
    assert_eq!(stats.total_mappings, 1);

    let second = run_convert(&converter, &job).expect("second convert");
    assert!(second.cache_hit);

    assert_eq!(run_cache_clear(&converter, "acme").expect("clear"), 1);
    assert!(run_cache_list(&converter, "acme").expect("list").is_empty());
}

#[test]
fn analyze_reports_columns_and_suggestions() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("schedule.csv");
    fs::write(&input, SCHEDULE_CSV).expect("write input");
    let converter = build_converter(&ConverterSettings::default()).expect("converter");

    let report = run_analyze(&converter, &input, FileType::Csv).expect("analyze");
    assert_eq!(report.columns, vec!["Visit", "Day", "Procedure"]);
    assert_eq!(report.row_count, 2);
    assert_eq!(report.suggested_mappings.len(), 3);
}

#[test]
fn validate_accepts_full_conversion_result() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("schedule.csv");
    let result_path = dir.path().join("result.json");
    fs::write(&input, SCHEDULE_CSV).expect("write input");
    let converter = build_converter(&ConverterSettings::default()).expect("converter");

    let job = ConvertJob {
        input: &input,
        file_type: FileType::Csv,
        target: TargetFormat::FhirR4,
        organization: None,
        threshold: Some(85.0),
        output: None,
    };
    let result = run_convert(&converter, &job).expect("convert");
    fs::write(
        &result_path,
        serde_json::to_string(&result).expect("encode result"),
    )
    .expect("write result");

    let report = run_validate(&converter, &result_path, TargetFormat::FhirR4).expect("validate");
    assert!(report.valid, "{:?}", report.issues);
}

#[test]
fn validate_flags_document_for_wrong_target() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("doc.json");
    fs::write(&path, r#"{"resourceType": "CarePlan"}"#).expect("write doc");
    let converter = build_converter(&ConverterSettings::default()).expect("converter");

    let report = run_validate(&converter, &path, TargetFormat::CdiscSdtm).expect("validate");
    assert!(!report.valid);
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let converter = build_converter(&ConverterSettings::default()).expect("converter");
    let missing = dir.path().join("missing.csv");

    let error = run_analyze(&converter, &missing, FileType::Csv).expect_err("missing file");
    assert!(error.to_string().contains("missing.csv"));
}
