//! Persisted mapping decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mapping::MappingProposal;

/// Best known decision for one `(organization, fingerprint)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub organization_id: String,
    pub fingerprint: String,
    pub proposal: MappingProposal,
    pub success_count: u64,
    pub last_used: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(organization_id: impl Into<String>, proposal: MappingProposal) -> Self {
        Self {
            organization_id: organization_id.into(),
            fingerprint: proposal.fingerprint.clone(),
            proposal,
            success_count: 1,
            last_used: Utc::now(),
        }
    }

    pub fn confidence(&self) -> f64 {
        self.proposal.confidence
    }
}

/// Aggregate figures over stored records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_mappings: usize,
    /// Mean confidence rounded to two decimals.
    pub average_confidence: f64,
    pub max_success_count: u64,
}

impl CacheStatistics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CacheRecord>) -> Self {
        let mut total = 0usize;
        let mut sum = 0.0;
        let mut max_success = 0u64;
        for record in records {
            total += 1;
            sum += record.confidence();
            max_success = max_success.max(record.success_count);
        }
        let average = if total == 0 { 0.0 } else { sum / total as f64 };
        Self {
            total_mappings: total,
            average_confidence: (average * 100.0).round() / 100.0,
            max_success_count: max_success,
        }
    }
}

/// How a store treats a second decision for a key it already holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheWritePolicy {
    /// Last write wins, even when the new confidence is lower.
    #[default]
    ReplaceAlways,
    /// Keep the stored record when the new confidence is lower.
    KeepHigherConfidence,
}

impl CacheWritePolicy {
    /// Whether `incoming` may replace a record holding `stored` confidence.
    #[must_use]
    pub fn allows_replace(&self, stored: f64, incoming: f64) -> bool {
        match self {
            Self::ReplaceAlways => true,
            Self::KeepHigherConfidence => incoming >= stored,
        }
    }
}

/// Target of a cache clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    Organization(String),
    All,
}

impl ClearScope {
    /// `"all"` clears every organization, anything else names one.
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            Self::All
        } else {
            Self::Organization(raw.to_string())
        }
    }
}
