//! Subcommand implementations.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sched_core::{ConversionResult, ConverterConfig, ScheduleConverter, StructureReport};
use sched_map::ChatCompletionsOracle;
use sched_model::{CacheRecord, CacheStatistics, CacheWritePolicy, FileType, TargetFormat};
use sched_output::{OutputOptions, ValidationReport};
use serde_json::Value;
use tracing::{debug, info, info_span};

use crate::logging::redact_value;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct ConverterSettings<'a> {
    pub cache_dir: Option<&'a Path>,
    pub write_policy: CacheWritePolicy,
    pub study_id: Option<String>,
    /// Consult the remote oracle when it is configured in the environment.
    pub use_oracle: bool,
}

/// Parameters of a single conversion.
#[derive(Debug, Clone)]
pub struct ConvertJob<'a> {
    pub input: &'a Path,
    pub file_type: FileType,
    pub target: TargetFormat,
    pub organization: Option<&'a str>,
    /// `None` uses the converter's default threshold.
    pub threshold: Option<f64>,
    pub output: Option<&'a Path>,
}

pub fn build_converter(settings: &ConverterSettings<'_>) -> Result<ScheduleConverter> {
    let mut output = OutputOptions::default();
    if let Some(study_id) = &settings.study_id {
        output = output.with_study_id(study_id.clone());
    }
    let config = ConverterConfig::default()
        .with_write_policy(settings.write_policy)
        .with_output(output);
    let store = config.open_store(settings.cache_dir).with_context(|| {
        format!(
            "failed to open mapping cache {}",
            settings
                .cache_dir
                .map_or_else(|| "(memory)".to_string(), |dir| dir.display().to_string())
        )
    })?;

    let mut converter = ScheduleConverter::new(store, config);
    if settings.use_oracle
        && let Some(oracle) =
            ChatCompletionsOracle::from_env().context("failed to build oracle client")?
    {
        info!(deployment = %oracle.config().deployment, "mapping oracle enabled");
        converter = converter.with_oracle(Arc::new(oracle));
    }
    Ok(converter)
}

fn read_input(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Some(first_line) = content.lines().next() {
        debug!(path = %path.display(), first_line = redact_value(first_line), "read input");
    }
    Ok(content)
}

pub fn run_convert(converter: &ScheduleConverter, job: &ConvertJob<'_>) -> Result<ConversionResult> {
    let span = info_span!("convert_file", path = %job.input.display());
    let _guard = span.enter();

    let content = read_input(job.input)?;
    let result = converter
        .convert(
            &content,
            job.file_type,
            job.target,
            job.organization,
            job.threshold,
        )
        .context("conversion failed")?;

    if let (Some(path), Some(data)) = (job.output, result.data.as_ref()) {
        write_json(path, data)?;
        info!(path = %path.display(), "wrote converted document");
    }
    Ok(result)
}

pub fn run_analyze(converter: &ScheduleConverter, input: &Path, file_type: FileType) -> Result<StructureReport> {
    let content = read_input(input)?;
    converter
        .analyze_structure(&content, file_type)
        .with_context(|| format!("failed to analyze {}", input.display()))
}

pub fn run_validate(converter: &ScheduleConverter, input: &Path, target: TargetFormat) -> Result<ValidationReport> {
    let content = read_input(input)?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON document", input.display()))?;
    // Accept either a bare document or a full conversion result.
    let data = match document.get("data") {
        Some(data) if document.get("success").is_some() => data,
        _ => &document,
    };
    Ok(converter.validate_output(data, target))
}

pub fn run_cache_list(converter: &ScheduleConverter, organization: &str) -> Result<Vec<CacheRecord>> {
    converter
        .get_cached_mappings(organization)
        .with_context(|| format!("failed to list cached mappings for {organization}"))
}

pub fn run_cache_clear(converter: &ScheduleConverter, organization: &str) -> Result<usize> {
    converter
        .clear_cache(organization)
        .with_context(|| format!("failed to clear cached mappings for {organization}"))
}

pub fn run_cache_stats(converter: &ScheduleConverter, organization: Option<&str>) -> Result<CacheStatistics> {
    converter
        .get_statistics(organization)
        .context("failed to compute cache statistics")
}

pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
