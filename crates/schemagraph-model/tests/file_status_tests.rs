use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use schemagraph_model::{
    Corpus, CorpusContext, DataPartitionDef, DocumentDef, EntityDef, LocalEntityDeclarationDef,
    ManifestDeclarationDef, ManifestDef, ManualClock, ModelError, NodeId, NodeKind,
};
use schemagraph_storage::{MemoryAdapter, StorageManager};

fn t(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap()
}

struct Fixture {
    corpus: Corpus,
    files: Arc<MemoryAdapter>,
    clock: Arc<ManualClock>,
}

fn fixture() -> Fixture {
    let files = Arc::new(MemoryAdapter::new());
    let storage = StorageManager::new();
    storage.mount("local", files.clone());
    storage.set_default_namespace("local");
    let clock = Arc::new(ManualClock::new(t(2024, 6)));
    let ctx = CorpusContext::new(storage).with_clock(clock.clone());
    Fixture {
        corpus: Corpus::new(Arc::new(ctx)),
        files,
        clock,
    }
}

/// manifest `default.manifest.cdm.json` -> Customer declaration -> partitions
fn manifest_tree(corpus: &mut Corpus, locations: &[&str]) -> (NodeId, NodeId, Vec<NodeId>) {
    let manifest = corpus.make_object(NodeKind::Manifest(ManifestDef::new(
        "default",
        DocumentDef::new("default.manifest.cdm.json", "local:/"),
    )));
    let declaration = corpus.make_object(NodeKind::LocalEntityDeclaration(LocalEntityDeclarationDef::new(
        "Customer",
        Some("Customer.cdm.json/Customer".into()),
    )));
    corpus.add_entity_declaration(manifest, declaration).unwrap();

    let partitions = locations
        .iter()
        .enumerate()
        .map(|(i, location)| {
            let partition = corpus.make_object(NodeKind::DataPartition(
                DataPartitionDef::new(format!("part{}", i + 1)).with_location(*location),
            ));
            corpus.add_data_partition(declaration, partition).unwrap();
            partition
        })
        .collect();
    (manifest, declaration, partitions)
}

#[tokio::test]
async fn partition_check_never_regresses_modified_time() {
    let Fixture {
        mut corpus,
        files,
        clock,
    } = fixture();
    let partition = corpus.make_object(NodeKind::DataPartition(
        DataPartitionDef::new("part1").with_location("/data/part1.csv"),
    ));

    files.touch("/data/part1.csv", t(2024, 1));
    clock.set(t(2024, 2));
    corpus.file_status_check(partition).await.unwrap();
    assert_eq!(corpus.partition(partition).unwrap().last_file_modified_time, Some(t(2024, 1)));
    assert_eq!(corpus.partition(partition).unwrap().last_file_status_check_time, Some(t(2024, 2)));

    files.touch("/data/part1.csv", t(2023, 1));
    clock.set(t(2024, 3));
    corpus.file_status_check(partition).await.unwrap();
    let checked = corpus.partition(partition).unwrap();
    assert_eq!(checked.last_file_modified_time, Some(t(2024, 1)));
    assert_eq!(checked.last_file_status_check_time, Some(t(2024, 3)));
}

#[tokio::test]
async fn report_with_older_time_keeps_the_maximum() {
    let Fixture { mut corpus, .. } = fixture();
    let mut def = DataPartitionDef::new("part1");
    def.last_file_modified_time = Some(t(2024, 1));
    let partition = corpus.make_object(NodeKind::DataPartition(def));

    corpus.report_most_recent_time(partition, Some(t(2023, 1))).unwrap();
    corpus.report_most_recent_time(partition, Some(t(2023, 1))).unwrap();
    corpus.report_most_recent_time(partition, None).unwrap();
    assert_eq!(corpus.partition(partition).unwrap().last_file_modified_time, Some(t(2024, 1)));
}

#[tokio::test]
async fn times_propagate_to_every_capable_ancestor() {
    let Fixture { mut corpus, files, .. } = fixture();
    let (manifest, declaration, partitions) = manifest_tree(&mut corpus, &["/data/a.csv", "/data/b.csv"]);
    files.touch("/data/a.csv", t(2024, 1));
    files.touch("/data/b.csv", t(2024, 4));
    files.touch("/Customer.cdm.json", t(2023, 6));
    files.touch("/default.manifest.cdm.json", t(2023, 1));

    corpus.file_status_check(manifest).await.unwrap();

    assert_eq!(corpus.partition(partitions[0]).unwrap().last_file_modified_time, Some(t(2024, 1)));
    assert_eq!(corpus.partition(partitions[1]).unwrap().last_file_modified_time, Some(t(2024, 4)));

    let decl = corpus.local_entity_declaration(declaration).unwrap();
    assert_eq!(decl.last_file_modified_time, Some(t(2023, 6)));
    assert_eq!(decl.last_child_file_modified_time, Some(t(2024, 4)));

    let manifest_def = corpus.manifest(manifest).unwrap();
    assert_eq!(manifest_def.last_file_modified_time, Some(t(2023, 1)));
    assert_eq!(manifest_def.last_child_file_modified_time, Some(t(2024, 4)));
    assert_eq!(manifest_def.last_file_status_check_time, Some(t(2024, 6)));
}

#[tokio::test]
async fn propagation_stops_at_an_owner_without_the_capability() {
    let Fixture { mut corpus, files, .. } = fixture();
    let doc = corpus.make_object(NodeKind::Document(DocumentDef::new("Loose.cdm.json", "local:/")));
    let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Loose")));
    corpus.add_definition(doc, entity).unwrap();
    let partition = corpus.make_object(NodeKind::DataPartition(
        DataPartitionDef::new("stray").with_location("stray.csv"),
    ));
    corpus.adopt(entity, partition).unwrap();
    files.touch("/stray.csv", t(2024, 2));

    corpus.file_status_check(partition).await.unwrap();
    assert_eq!(corpus.partition(partition).unwrap().last_file_modified_time, Some(t(2024, 2)));
}

#[tokio::test]
async fn storage_failures_leave_times_unchanged() {
    let Fixture { mut corpus, .. } = fixture();
    let mut def = DataPartitionDef::new("elsewhere").with_location("remote:/data/x.csv");
    def.last_file_modified_time = Some(t(2022, 1));
    let partition = corpus.make_object(NodeKind::DataPartition(def));
    let missing = corpus.make_object(NodeKind::DataPartition(
        DataPartitionDef::new("missing").with_location("/data/none.csv"),
    ));
    let unplaced = corpus.make_object(NodeKind::DataPartition(DataPartitionDef::new("unplaced")));

    corpus.file_status_check(partition).await.unwrap();
    corpus.file_status_check(missing).await.unwrap();
    corpus.file_status_check(unplaced).await.unwrap();

    assert_eq!(corpus.partition(partition).unwrap().last_file_modified_time, Some(t(2022, 1)));
    assert_eq!(corpus.partition(missing).unwrap().last_file_modified_time, None);
    assert_eq!(corpus.partition(unplaced).unwrap().last_file_modified_time, None);
    assert_eq!(corpus.partition(unplaced).unwrap().last_file_status_check_time, Some(t(2024, 6)));
}

#[tokio::test]
async fn relative_locations_resolve_against_the_document() {
    let Fixture { mut corpus, files, .. } = fixture();
    let manifest = corpus.make_object(NodeKind::Manifest(ManifestDef::new(
        "sales",
        DocumentDef::new("sales.manifest.cdm.json", "local:/sales/"),
    )));
    let declaration = corpus.make_object(NodeKind::LocalEntityDeclaration(LocalEntityDeclarationDef::new(
        "Order", None,
    )));
    corpus.add_entity_declaration(manifest, declaration).unwrap();
    let partition = corpus.make_object(NodeKind::DataPartition(
        DataPartitionDef::new("orders").with_location("./data/../orders.csv"),
    ));
    corpus.add_data_partition(declaration, partition).unwrap();
    files.touch("/sales/orders.csv", t(2024, 5));

    corpus.file_status_check(partition).await.unwrap();
    assert_eq!(corpus.partition(partition).unwrap().last_file_modified_time, Some(t(2024, 5)));
    assert_eq!(corpus.manifest(manifest).unwrap().last_child_file_modified_time, Some(t(2024, 5)));
}

#[tokio::test]
async fn sub_manifest_declarations_report_their_file() {
    let Fixture { mut corpus, files, .. } = fixture();
    let (manifest, _, _) = manifest_tree(&mut corpus, &[]);
    let sub = corpus.make_object(NodeKind::ManifestDeclaration(ManifestDeclarationDef::new(
        "archive",
        "archive/archive.manifest.cdm.json",
    )));
    corpus.add_sub_manifest(manifest, sub).unwrap();
    files.touch("/archive/archive.manifest.cdm.json", t(2024, 3));

    corpus.file_status_check(manifest).await.unwrap();
    assert_eq!(corpus.manifest_declaration(sub).unwrap().last_file_modified_time, Some(t(2024, 3)));
    assert_eq!(corpus.manifest(manifest).unwrap().last_child_file_modified_time, Some(t(2024, 3)));
}

#[tokio::test]
async fn nodes_without_the_capability_are_rejected() {
    let Fixture { mut corpus, .. } = fixture();
    let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
    let err = corpus.file_status_check(entity).await.unwrap_err();
    assert!(matches!(err, ModelError::MissingCapability { .. }));
}
