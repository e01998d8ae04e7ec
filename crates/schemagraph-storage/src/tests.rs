//! Storage layer tests

use super::*;
use chrono::TimeZone;
use std::sync::Arc;
use tempfile::tempdir;

fn manager_with_memory() -> (StorageManager, Arc<MemoryAdapter>) {
    let manager = StorageManager::new();
    let memory = Arc::new(MemoryAdapter::new());
    manager.mount("mem", memory.clone());
    manager.set_default_namespace("mem");
    (manager, memory)
}

#[test]
fn test_split_namespace_path() {
    assert_eq!(split_namespace_path("local:/a/b.csv"), (Some("local"), "/a/b.csv"));
    assert_eq!(split_namespace_path("/a/b.csv"), (None, "/a/b.csv"));
    assert_eq!(split_namespace_path("a/b:c"), (None, "a/b:c"));
}

#[test]
fn test_absolute_path_passes_through_with_default_namespace() {
    let (manager, _) = manager_with_memory();
    assert_eq!(
        manager.create_absolute_corpus_path("/data/part1.csv", None).as_deref(),
        Some("mem:/data/part1.csv")
    );
    assert_eq!(
        manager.create_absolute_corpus_path("other:/x.csv", Some("mem:/root/")).as_deref(),
        Some("other:/x.csv")
    );
}

#[test]
fn test_relative_path_joins_document_folder() {
    let (manager, _) = manager_with_memory();
    assert_eq!(
        manager
            .create_absolute_corpus_path("./parts/p1.csv", Some("mem:/sales/default.manifest.cdm.json"))
            .as_deref(),
        Some("mem:/sales/parts/p1.csv")
    );
    assert_eq!(
        manager
            .create_absolute_corpus_path("../shared/Customer.cdm.json", Some("mem:/sales/"))
            .as_deref(),
        Some("mem:/shared/Customer.cdm.json")
    );
}

#[test]
fn test_empty_path_is_none() {
    let (manager, _) = manager_with_memory();
    assert!(manager.create_absolute_corpus_path("", None).is_none());
    assert!(manager.create_absolute_corpus_path("   ", Some("mem:/")).is_none());
}

#[test]
fn test_no_namespace_anywhere_stays_bare() {
    let manager = StorageManager::new();
    assert_eq!(
        manager.create_absolute_corpus_path("a/b.csv", None).as_deref(),
        Some("/a/b.csv")
    );
}

#[tokio::test]
async fn test_memory_adapter_modified_time() {
    let (manager, memory) = manager_with_memory();
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    memory.touch("/data/part1.csv", t);

    let found = manager.compute_last_modified_time("mem:/data/part1.csv").await.unwrap();
    assert_eq!(found, Some(t));

    let missing = manager.compute_last_modified_time("mem:/data/nope.csv").await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_unmounted_namespace_is_an_error() {
    let (manager, _) = manager_with_memory();
    let err = manager
        .compute_last_modified_time("cloud:/data/part1.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NamespaceNotMounted(ns) if ns == "cloud"));
}

#[tokio::test]
async fn test_unmount_clears_default() {
    let (manager, _) = manager_with_memory();
    assert!(manager.unmount("mem"));
    assert_eq!(manager.default_namespace(), None);
    let err = manager.read("/x").await.unwrap_err();
    assert!(matches!(err, StorageError::MissingNamespace(_)));
}

#[tokio::test]
async fn test_local_adapter_reads_and_stats_files() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/part1.csv"), "a,b\n1,2\n").unwrap();

    let manager = StorageManager::new();
    manager.mount("local", Arc::new(LocalAdapter::new(dir.path())));

    let text = manager.read("local:/data/part1.csv").await.unwrap();
    assert!(text.starts_with("a,b"));

    let modified = manager
        .compute_last_modified_time("local:/data/part1.csv")
        .await
        .unwrap();
    assert!(modified.is_some());

    let missing = manager
        .compute_last_modified_time("local:/data/part2.csv")
        .await
        .unwrap();
    assert!(missing.is_none());

    let err = manager.read("local:/data/part2.csv").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn test_local_adapter_path_round_trip() {
    let adapter = LocalAdapter::new("/srv/cdm");
    let adapter_path = adapter.create_adapter_path("/sales/p1.csv").unwrap();
    assert_eq!(adapter.create_corpus_path(&adapter_path).as_deref(), Some("/sales/p1.csv"));
    assert!(adapter.create_adapter_path("/../etc/passwd").is_none());
    assert!(adapter.create_corpus_path("/elsewhere/p1.csv").is_none());
}
