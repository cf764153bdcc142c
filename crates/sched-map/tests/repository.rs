use std::fs;

use sched_map::{FileMappingStore, MappingStore, MemoryMappingStore, StoreError, StoreOutcome};
use sched_model::{
    CacheWritePolicy, CanonicalField, ClearScope, MappingMethod, MappingProposal,
};
use tempfile::tempdir;

fn proposal(fingerprint: &str, confidence: f64, field: CanonicalField) -> MappingProposal {
    let mut proposal = MappingProposal::empty(fingerprint, MappingMethod::PatternMatching);
    proposal.confidence = confidence;
    proposal.mappings.insert("Visit".to_string(), field);
    proposal
}

#[test]
fn file_store_round_trip() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");

    let stored = proposal("day|visit", 100.0, CanonicalField::VisitName);
    let outcome = store.store(Some("acme"), &stored).expect("store");
    assert_eq!(outcome, StoreOutcome::Inserted);

    let loaded = store
        .lookup("acme", "day|visit")
        .expect("lookup")
        .expect("record should exist");
    assert_eq!(loaded, stored);
    assert!(store.lookup("other", "day|visit").expect("lookup").is_none());
}

#[test]
fn replace_does_not_merge() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::ReplaceAlways).expect("open store");

    store
        .store(Some("acme"), &proposal("visit", 95.0, CanonicalField::VisitName))
        .expect("first store");
    let outcome = store
        .store(Some("acme"), &proposal("visit", 40.0, CanonicalField::VisitDay))
        .expect("second store");
    assert_eq!(outcome, StoreOutcome::Replaced);

    let record = store.record("acme", "visit").expect("record").expect("exists");
    assert_eq!(record.proposal.confidence, 40.0);
    assert_eq!(record.proposal.mappings.len(), 1);
    assert_eq!(record.proposal.mappings["Visit"], CanonicalField::VisitDay);
    assert_eq!(record.success_count, 2);
    assert_eq!(store.list_all("acme").expect("list").len(), 1);
}

#[test]
fn keep_higher_confidence_policy_keeps_stored_record() {
    let store = MemoryMappingStore::new(CacheWritePolicy::KeepHigherConfidence);
    store
        .store(Some("acme"), &proposal("visit", 95.0, CanonicalField::VisitName))
        .expect("first store");
    let outcome = store
        .store(Some("acme"), &proposal("visit", 40.0, CanonicalField::VisitDay))
        .expect("second store");
    assert_eq!(outcome, StoreOutcome::KeptExisting);
    let kept = store.lookup("acme", "visit").expect("lookup").expect("exists");
    assert_eq!(kept.confidence, 95.0);
}

#[test]
fn touch_counts_successes() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    store
        .store(Some("acme"), &proposal("visit", 95.0, CanonicalField::VisitName))
        .expect("store");
    store.touch("acme", "visit").expect("touch");
    store.touch("acme", "missing").expect("touch missing is a no-op");

    let stats = store.statistics(Some("acme")).expect("stats");
    assert_eq!(stats.total_mappings, 1);
    assert_eq!(stats.max_success_count, 2);
}

#[test]
fn list_is_most_recent_first() {
    let store = MemoryMappingStore::default();
    store
        .store(Some("acme"), &proposal("a", 80.0, CanonicalField::VisitName))
        .expect("store a");
    store
        .store(Some("acme"), &proposal("b", 70.0, CanonicalField::VisitName))
        .expect("store b");
    store.touch("acme", "a").expect("touch");

    let listed = store.list_all("acme").expect("list");
    let order: Vec<&str> = listed.iter().map(|r| r.fingerprint.as_str()).collect();
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn clear_by_organization_and_all() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    for (organization, fingerprint) in [("acme", "a"), ("acme", "b"), ("globex", "a")] {
        store
            .store(Some(organization), &proposal(fingerprint, 90.0, CanonicalField::VisitName))
            .expect("store");
    }

    assert_eq!(store.clear(&ClearScope::Organization("acme".into())).expect("clear"), 2);
    assert!(store.list_all("acme").expect("list").is_empty());
    assert_eq!(store.statistics(None).expect("stats").total_mappings, 1);

    assert_eq!(store.clear(&ClearScope::All).expect("clear all"), 1);
    assert_eq!(store.statistics(None).expect("stats").total_mappings, 0);
}

#[test]
fn corrupt_record_is_skipped_when_listing() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    store
        .store(Some("acme"), &proposal("visit", 90.0, CanonicalField::VisitName))
        .expect("store");

    let org_dir = fs::read_dir(dir.path())
        .expect("read root")
        .next()
        .expect("org dir")
        .expect("entry")
        .path();
    let bad = org_dir.join(format!("{}.json", "0".repeat(64)));
    fs::write(&bad, "{not json").expect("write garbage");

    assert_eq!(store.list_all("acme").expect("list").len(), 1);
    let stats = store.statistics(Some("acme")).expect("stats");
    assert_eq!(stats.total_mappings, 1);
    assert_eq!(stats.average_confidence, 90.0);
}

#[test]
fn corrupt_record_is_an_error_on_lookup() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    store
        .store(Some("acme"), &proposal("visit", 90.0, CanonicalField::VisitName))
        .expect("store");
    let org_dir = fs::read_dir(dir.path())
        .expect("read root")
        .next()
        .expect("org dir")
        .expect("entry")
        .path();
    let record = fs::read_dir(&org_dir)
        .expect("read org dir")
        .next()
        .expect("record")
        .expect("entry")
        .path();
    fs::write(&record, "[]").expect("overwrite record");

    assert!(matches!(
        store.lookup("acme", "visit"),
        Err(StoreError::Corrupt { .. })
    ));
}

#[test]
fn clear_all_leaves_foreign_directories_alone() {
    let dir = tempdir().expect("tempdir");
    let project = dir.path().join("my_project");
    fs::create_dir_all(project.join("src")).expect("create project");
    fs::write(project.join("src").join("main.rs"), "fn main() {}").expect("write source");
    fs::write(project.join("package.json"), r#"{"name": "demo"}"#).expect("write manifest");

    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    store
        .store(Some("acme"), &proposal("visit", 95.0, CanonicalField::VisitName))
        .expect("store");
    assert_eq!(store.statistics(None).expect("stats").total_mappings, 1);

    assert_eq!(store.clear(&ClearScope::All).expect("clear all"), 1);
    assert!(project.join("src").join("main.rs").is_file());
    assert!(project.join("package.json").is_file());
    let remaining: Vec<_> = fs::read_dir(dir.path())
        .expect("read root")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(remaining, vec![std::ffi::OsString::from("my_project")]);
}

#[test]
fn clear_keeps_organization_directory_with_foreign_files() {
    let dir = tempdir().expect("tempdir");
    let store = FileMappingStore::open(dir.path(), CacheWritePolicy::default()).expect("open store");
    store
        .store(Some("acme"), &proposal("visit", 95.0, CanonicalField::VisitName))
        .expect("store");
    let org_dir = fs::read_dir(dir.path())
        .expect("read root")
        .next()
        .expect("org dir")
        .expect("entry")
        .path();
    fs::write(org_dir.join("notes.txt"), "keep me").expect("write notes");

    assert_eq!(store.clear(&ClearScope::Organization("acme".into())).expect("clear"), 1);
    assert!(org_dir.join("notes.txt").is_file());
    assert!(store.list_all("acme").expect("list").is_empty());
}
