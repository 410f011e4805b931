//! Canonicalization end to end against files on disk
//!
//! Loads `tests/fixtures/definitions.yaml` (a trimmed production snapshot with
//! a couple of deliberately broken provider/method fields), runs the built-in
//! plan through a `FileStore`, and checks the written `_v2` snapshot.

use std::path::{Path, PathBuf};

use semtype_registry::taxonomy::{
    self, run_with_store, CanonicalizationPlan, FileStore, MergeRule, TaxonomyStore,
};
use semtype_registry::{RegistryConfig, TaxonomyError};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/definitions.yaml")
}

/// Copy the fixture into a fresh project root laid out like production
fn project() -> (tempfile::TempDir, RegistryConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = RegistryConfig::new(dir.path());
    std::fs::create_dir_all(config.taxonomy_path.parent().unwrap()).unwrap();
    std::fs::copy(fixture(), &config.taxonomy_path).unwrap();
    (dir, config)
}

#[test]
fn merge_writes_canonical_v2_snapshot() {
    let (_dir, config) = project();
    let original = std::fs::read_to_string(&config.taxonomy_path).unwrap();

    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    let report = run_with_store(&store, &config.plan().unwrap()).unwrap();

    // Source snapshot is left for diffing
    assert_eq!(std::fs::read_to_string(&config.taxonomy_path).unwrap(), original);

    let merged = taxonomy::load(&config.merged_path).unwrap();
    let keys: Vec<&str> = merged.keys().collect();
    assert_eq!(
        keys,
        vec![
            "address.calling_code",
            "address.city",
            "address.subdivision",
            "code.ean",
            "datetime.unix_epoch_in_milliseconds",
            "datetime.unix_timestamp",
            "person.email",
        ]
    );

    assert_eq!(report.classes_before, 15);
    assert_eq!(report.classes_after, 7);
    assert_eq!(report.fixes.len(), 2);
    assert_eq!(report.ambiguous_removed, vec!["person.first_name", "person.last_name"]);
}

#[test]
fn subdivision_absorbs_every_regional_class() {
    let (_dir, config) = project();
    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    run_with_store(&store, &config.plan().unwrap()).unwrap();

    let merged = taxonomy::load(&config.merged_path).unwrap();
    for gone in [
        "address.province",
        "address.state",
        "address.region",
        "address.federal_subject",
        "address.prefecture",
    ] {
        assert!(!merged.contains(gone), "{gone} still present");
    }

    let sub = merged.get("address.subdivision").unwrap();
    assert_eq!(sub.aliases, vec!["federal_subject", "state", "region", "prefecture"]);
    assert_eq!(sub.provider, "address");
    assert_eq!(sub.method, "subdivision");
    // Provider-specific fields come along from the province base
    assert!(sub.extra.contains_key("locales"));
    assert!(sub.extra.contains_key("validation"));

    // Old names still resolve
    let (key, _) = merged.resolve("address.prefecture").unwrap();
    assert_eq!(key, "address.subdivision");
    let (key, _) = merged.resolve("datetime.timestamp").unwrap();
    assert_eq!(key, "datetime.unix_timestamp");
}

#[test]
fn notes_only_on_the_confusable_pair() {
    let (_dir, config) = project();
    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    run_with_store(&store, &config.plan().unwrap()).unwrap();

    let merged = taxonomy::load(&config.merged_path).unwrap();
    for key in ["code.ean", "datetime.unix_epoch_in_milliseconds"] {
        let notes = merged.get(key).unwrap().notes.as_deref().unwrap_or_default();
        assert!(!notes.is_empty(), "{key} has no notes");
    }
    for key in ["address.city", "person.email", "datetime.unix_timestamp"] {
        assert!(merged.get(key).unwrap().notes.is_none(), "{key} gained notes");
    }
}

#[test]
fn written_snapshot_is_a_fixed_point() {
    let (_dir, config) = project();
    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    run_with_store(&store, &config.plan().unwrap()).unwrap();

    let first = std::fs::read_to_string(&config.merged_path).unwrap();
    let reloaded = taxonomy::load(&config.merged_path).unwrap();
    assert_eq!(taxonomy::serialize(&reloaded).unwrap(), first);

    // Replaying the plan on its own output changes nothing
    let replay = FileStore::in_place(&config.merged_path);
    let report = run_with_store(&replay, &config.plan().unwrap()).unwrap();
    assert!(report.fixes.is_empty());
    assert!(report.removed_classes().is_empty());
    assert_eq!(std::fs::read_to_string(&config.merged_path).unwrap(), first);

    // Unicode survives unescaped
    assert!(first.contains("東京"));
}

#[test]
fn fix_rewrites_in_place_and_keeps_unknown_fields() {
    let (_dir, config) = project();
    let store = FileStore::in_place(&config.taxonomy_path);

    let (fixed, report) = taxonomy::fix_keys(store.load().unwrap()).unwrap();
    store.save(&fixed).unwrap();

    let fixes: Vec<String> = report.fixes.iter().map(|f| f.to_string()).collect();
    assert_eq!(
        fixes,
        vec![
            "address.state: addr.state → address.state",
            "datetime.unix_timestamp: datetime.unix → datetime.unix_timestamp",
        ]
    );

    let reloaded = taxonomy::load(&config.taxonomy_path).unwrap();
    assert_eq!(reloaded.len(), 15);
    let calling = reloaded.get("address.calling_code").unwrap();
    assert_eq!(
        calling.extra.get("designation").and_then(|v| v.as_str()),
        Some("universal")
    );
    assert!(calling.aliases.is_empty());
}

#[test]
fn failed_run_writes_nothing() {
    let (_dir, config) = project();
    let plan = CanonicalizationPlan {
        merge_rules: vec![
            MergeRule::into_existing("address.calling_code", ["address.isd_code"]),
            MergeRule::into_existing("person.email", ["person.email"]),
        ],
        ..Default::default()
    };

    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    let err = run_with_store(&store, &plan).unwrap_err();

    assert!(matches!(err, TaxonomyError::InvalidMergeRule { .. }));
    assert!(!config.merged_path.exists());
}

#[test]
fn malformed_file_is_rejected_before_any_write() {
    let (_dir, config) = project();
    std::fs::write(&config.taxonomy_path, "- not\n- a\n- mapping\n").unwrap();

    let store = FileStore::new(&config.taxonomy_path, &config.merged_path);
    let err = run_with_store(&store, &config.plan().unwrap()).unwrap_err();

    assert!(matches!(err, TaxonomyError::MalformedTaxonomy(_)));
    assert!(!config.merged_path.exists());
}
