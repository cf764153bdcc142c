//! Converter configuration.

use std::path::Path;
use std::sync::Arc;

use sched_map::{
    DecisionThresholds, FileMappingStore, MappingStore, MemoryMappingStore, StoreResult,
    thresholds::DEFAULT_CONFIDENCE_THRESHOLD,
};
use sched_model::CacheWritePolicy;
use sched_output::OutputOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    pub thresholds: DecisionThresholds,
    /// Stage acceptance threshold for conversions that do not name one.
    pub default_confidence_threshold: f64,
    pub write_policy: CacheWritePolicy,
    pub output: OutputOptions,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            thresholds: DecisionThresholds::default(),
            default_confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            write_policy: CacheWritePolicy::default(),
            output: OutputOptions::default(),
        }
    }
}

impl ConverterConfig {
    pub fn with_thresholds(mut self, thresholds: DecisionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_default_confidence_threshold(mut self, threshold: f64) -> Self {
        self.default_confidence_threshold = threshold;
        self
    }

    pub fn with_write_policy(mut self, write_policy: CacheWritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    /// Store honoring the configured write policy: file-backed under
    /// `cache_dir`, or in memory when no directory is given.
    pub fn open_store(&self, cache_dir: Option<&Path>) -> StoreResult<Arc<dyn MappingStore>> {
        Ok(match cache_dir {
            Some(dir) => Arc::new(FileMappingStore::open(dir, self.write_policy)?),
            None => Arc::new(MemoryMappingStore::new(self.write_policy)),
        })
    }
}
