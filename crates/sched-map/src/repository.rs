//! Persistent store of accepted mapping decisions.
//!
//! Records are keyed by `(organization, fingerprint)` and hold at most one
//! decision per key. A second decision for the same key replaces the first
//! (subject to the [`CacheWritePolicy`]); the success counter is carried over.
//!
//! # Storage Format
//!
//! [`FileMappingStore`] keeps one JSON document per key:
//! `{root}/{ORG}-{org hash}/{fingerprint hash}.json`, where both hashes are
//! SHA-256 hex digests (the organization hash truncated to 8 characters).
//! Listing, statistics and clearing only look at paths of that shape, so
//! other files sharing the root are left alone.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use sched_model::{CacheRecord, CacheStatistics, CacheWritePolicy, ClearScope, MappingProposal};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// What a call to [`MappingStore::store`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// No organization was given; nothing was written.
    Skipped,
    Inserted,
    Replaced,
    /// The write policy kept the stored record.
    KeptExisting,
}

/// Durable key-value store of mapping decisions.
pub trait MappingStore: Send + Sync {
    /// Writes or replaces the record for `(organization, proposal.fingerprint)`.
    ///
    /// A missing or blank organization is a no-op.
    fn store(
        &self,
        organization_id: Option<&str>,
        proposal: &MappingProposal,
    ) -> StoreResult<StoreOutcome>;

    /// Full record for a key, if present.
    fn record(&self, organization_id: &str, fingerprint: &str) -> StoreResult<Option<CacheRecord>>;

    /// Bumps the success counter and refreshes `last_used`; absent keys are ignored.
    fn touch(&self, organization_id: &str, fingerprint: &str) -> StoreResult<()>;

    /// Records of one organization, most recently used first.
    fn list_all(&self, organization_id: &str) -> StoreResult<Vec<CacheRecord>>;

    /// Removes records and returns how many were deleted.
    fn clear(&self, scope: &ClearScope) -> StoreResult<usize>;

    /// Aggregates over one organization, or over everything when `None`.
    fn statistics(&self, organization_id: Option<&str>) -> StoreResult<CacheStatistics>;

    /// Stored proposal for a key, if present.
    fn lookup(&self, organization_id: &str, fingerprint: &str) -> StoreResult<Option<MappingProposal>> {
        Ok(self
            .record(organization_id, fingerprint)?
            .map(|record| record.proposal))
    }
}

fn organization(organization_id: Option<&str>) -> Option<&str> {
    organization_id
        .map(str::trim)
        .filter(|organization| !organization.is_empty())
}

/// Record to write for `proposal`, given what is already stored.
fn next_record(
    existing: Option<CacheRecord>,
    organization_id: &str,
    proposal: &MappingProposal,
    policy: CacheWritePolicy,
) -> (Option<CacheRecord>, StoreOutcome) {
    match existing {
        None => (
            Some(CacheRecord::new(organization_id, proposal.clone())),
            StoreOutcome::Inserted,
        ),
        Some(stored) if !policy.allows_replace(stored.confidence(), proposal.confidence) => {
            (None, StoreOutcome::KeptExisting)
        }
        Some(stored) => {
            let mut record = CacheRecord::new(organization_id, proposal.clone());
            record.success_count = stored.success_count + 1;
            (Some(record), StoreOutcome::Replaced)
        }
    }
}

fn sort_recent_first(records: &mut [CacheRecord]) {
    records.sort_by(|a, b| b.last_used.cmp(&a.last_used));
}

/// Process-local store used for tests and sessions without a cache directory.
#[derive(Debug, Default)]
pub struct MemoryMappingStore {
    records: Mutex<BTreeMap<(String, String), CacheRecord>>,
    policy: CacheWritePolicy,
}

impl MemoryMappingStore {
    pub fn new(policy: CacheWritePolicy) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            policy,
        }
    }

    fn records(
        &self,
    ) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<(String, String), CacheRecord>>> {
        self.records.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl MappingStore for MemoryMappingStore {
    fn store(
        &self,
        organization_id: Option<&str>,
        proposal: &MappingProposal,
    ) -> StoreResult<StoreOutcome> {
        let Some(organization_id) = organization(organization_id) else {
            return Ok(StoreOutcome::Skipped);
        };
        let mut records = self.records()?;
        let key = (organization_id.to_string(), proposal.fingerprint.clone());
        let (record, outcome) =
            next_record(records.get(&key).cloned(), organization_id, proposal, self.policy);
        if let Some(record) = record {
            records.insert(key, record);
        }
        Ok(outcome)
    }

    fn record(&self, organization_id: &str, fingerprint: &str) -> StoreResult<Option<CacheRecord>> {
        let records = self.records()?;
        Ok(records
            .get(&(organization_id.to_string(), fingerprint.to_string()))
            .cloned())
    }

    fn touch(&self, organization_id: &str, fingerprint: &str) -> StoreResult<()> {
        let mut records = self.records()?;
        if let Some(record) = records.get_mut(&(organization_id.to_string(), fingerprint.to_string())) {
            record.success_count += 1;
            record.last_used = Utc::now();
        }
        Ok(())
    }

    fn list_all(&self, organization_id: &str) -> StoreResult<Vec<CacheRecord>> {
        let records = self.records()?;
        let mut listed: Vec<CacheRecord> = records
            .values()
            .filter(|record| record.organization_id == organization_id)
            .cloned()
            .collect();
        sort_recent_first(&mut listed);
        Ok(listed)
    }

    fn clear(&self, scope: &ClearScope) -> StoreResult<usize> {
        let mut records = self.records()?;
        let before = records.len();
        match scope {
            ClearScope::All => records.clear(),
            ClearScope::Organization(organization_id) => {
                records.retain(|(organization, _), _| organization != organization_id);
            }
        }
        Ok(before - records.len())
    }

    fn statistics(&self, organization_id: Option<&str>) -> StoreResult<CacheStatistics> {
        let records = self.records()?;
        Ok(CacheStatistics::from_records(records.values().filter(|record| {
            organization_id.is_none_or(|organization| record.organization_id == organization)
        })))
    }
}

/// Directory-backed store with one JSON document per key.
///
/// Writes go to a temp file that is renamed over the target, so readers never
/// observe a partial record. A mutex serializes access within the process;
/// across processes the last rename wins.
#[derive(Debug)]
pub struct FileMappingStore {
    root: PathBuf,
    policy: CacheWritePolicy,
    lock: Mutex<()>,
}

impl FileMappingStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, policy: CacheWritePolicy) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            policy,
            lock: Mutex::new(()),
        })
    }

    fn organization_dir(&self, organization_id: &str) -> PathBuf {
        let digest = sha256_hex(organization_id);
        self.root
            .join(format!("{}-{}", normalize_id(organization_id), &digest[..8]))
    }

    fn record_path(&self, organization_id: &str, fingerprint: &str) -> PathBuf {
        self.organization_dir(organization_id)
            .join(format!("{}.json", sha256_hex(fingerprint)))
    }

    fn guard(&self) -> StoreResult<std::sync::MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read_record(path: &Path) -> StoreResult<Option<CacheRecord>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_record(path: &Path, record: &CacheRecord) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(|source| StoreError::Io {
            operation: "create",
            path: temp_path.clone(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|source| StoreError::Io {
                operation: "write",
                path: temp_path.clone(),
                source,
            })?;
        file.sync_all().map_err(|source| StoreError::Io {
            operation: "sync",
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, path).map_err(|source| StoreError::AtomicWriteFailed {
            temp_path: temp_path.clone(),
            target_path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "wrote mapping record");
        Ok(())
    }

    /// Record files directly inside `dir`, plus leftover temp files when
    /// `with_temp` is set. Other files are never returned.
    fn record_files(dir: &Path, with_temp: bool) -> StoreResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(dir).map_err(|source| StoreError::Io {
            operation: "read directory",
            path: dir.to_path_buf(),
            source,
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                operation: "read directory",
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let owned = is_record_file_name(name)
                || (with_temp
                    && name
                        .strip_suffix(".tmp")
                        .is_some_and(is_record_file_name));
            if owned && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Organization directories under the root; anything else there is ignored.
    fn organization_dirs(&self) -> StoreResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            operation: "read directory",
            path: self.root.clone(),
            source,
        })?;
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                operation: "read directory",
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            let owned = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_organization_dir_name);
            if owned && path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    /// Parses every record in `dir`, skipping corrupt files.
    fn load_dir(dir: &Path) -> StoreResult<Vec<CacheRecord>> {
        let mut records = Vec::new();
        for path in Self::record_files(dir, false)? {
            match Self::read_record(&path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => warn!(%error, "skipping unreadable mapping record"),
            }
        }
        Ok(records)
    }

    /// Deletes the record files in `dir`, then the directory once it is empty.
    /// Returns the number of records removed.
    fn remove_records(dir: &Path) -> StoreResult<usize> {
        let mut removed = 0;
        for path in Self::record_files(dir, true)? {
            fs::remove_file(&path).map_err(|source| StoreError::Io {
                operation: "remove",
                path: path.clone(),
                source,
            })?;
            if path.extension().is_some_and(|ext| ext == "json") {
                removed += 1;
            }
        }
        if dir.is_dir() {
            match fs::remove_dir(dir) {
                Ok(()) => {}
                Err(source) if source.kind() == ErrorKind::DirectoryNotEmpty => {
                    warn!(path = %dir.display(), "organization directory holds foreign files, keeping it");
                }
                Err(source) => {
                    return Err(StoreError::Io {
                        operation: "remove directory",
                        path: dir.to_path_buf(),
                        source,
                    });
                }
            }
        }
        Ok(removed)
    }
}

impl MappingStore for FileMappingStore {
    fn store(
        &self,
        organization_id: Option<&str>,
        proposal: &MappingProposal,
    ) -> StoreResult<StoreOutcome> {
        let Some(organization_id) = organization(organization_id) else {
            return Ok(StoreOutcome::Skipped);
        };
        let _guard = self.guard()?;
        let path = self.record_path(organization_id, &proposal.fingerprint);
        // A corrupt record is overwritten rather than blocking new decisions.
        let existing = match Self::read_record(&path) {
            Ok(existing) => existing,
            Err(StoreError::Corrupt { .. }) => None,
            Err(error) => return Err(error),
        };
        let (record, outcome) = next_record(existing, organization_id, proposal, self.policy);
        if let Some(record) = record {
            Self::write_record(&path, &record)?;
        }
        info!(
            organization = organization_id,
            fingerprint = %proposal.fingerprint,
            confidence = proposal.confidence,
            ?outcome,
            "stored mapping decision"
        );
        Ok(outcome)
    }

    fn record(&self, organization_id: &str, fingerprint: &str) -> StoreResult<Option<CacheRecord>> {
        let _guard = self.guard()?;
        Self::read_record(&self.record_path(organization_id, fingerprint))
    }

    fn touch(&self, organization_id: &str, fingerprint: &str) -> StoreResult<()> {
        let _guard = self.guard()?;
        let path = self.record_path(organization_id, fingerprint);
        if let Some(mut record) = Self::read_record(&path)? {
            record.success_count += 1;
            record.last_used = Utc::now();
            Self::write_record(&path, &record)?;
        }
        Ok(())
    }

    fn list_all(&self, organization_id: &str) -> StoreResult<Vec<CacheRecord>> {
        let _guard = self.guard()?;
        let mut records = Self::load_dir(&self.organization_dir(organization_id))?;
        sort_recent_first(&mut records);
        Ok(records)
    }

    fn clear(&self, scope: &ClearScope) -> StoreResult<usize> {
        let _guard = self.guard()?;
        let removed = match scope {
            ClearScope::Organization(organization_id) => {
                Self::remove_records(&self.organization_dir(organization_id))?
            }
            ClearScope::All => {
                let mut removed = 0;
                for dir in self.organization_dirs()? {
                    removed += Self::remove_records(&dir)?;
                }
                removed
            }
        };
        info!(?scope, removed, "cleared mapping records");
        Ok(removed)
    }

    fn statistics(&self, organization_id: Option<&str>) -> StoreResult<CacheStatistics> {
        let _guard = self.guard()?;
        let records = match organization_id {
            Some(organization_id) => Self::load_dir(&self.organization_dir(organization_id))?,
            None => {
                let mut records = Vec::new();
                for dir in self.organization_dirs()? {
                    records.extend(Self::load_dir(&dir)?);
                }
                records
            }
        };
        Ok(CacheStatistics::from_records(&records))
    }
}

fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// `{ORG}-{8 hex}`, the shape of directories created by [`FileMappingStore`].
fn is_organization_dir_name(name: &str) -> bool {
    let Some((prefix, digest)) = name.rsplit_once('-') else {
        return false;
    };
    !prefix.is_empty()
        && prefix.chars().all(|c| c == '_' || (c.is_alphanumeric() && !c.is_lowercase()))
        && is_lower_hex(digest, 8)
}

/// `{64 hex}.json`, the shape of record files.
fn is_record_file_name(name: &str) -> bool {
    name.strip_suffix(".json")
        .is_some_and(|stem| is_lower_hex(stem, 64))
}

fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Normalize an ID for use in directory names.
fn normalize_id(id: &str) -> String {
    id.trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
