//! Integration tests for the record store lifecycle.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::redundant_closure_for_method_calls
)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tally::models::{Record, RecordFilter, RecordId, RecordPatch, RecordType};
use tally::storage::migrations::MigrationRunner;
use tally::storage::{RECORDS_TABLE, RecordStore, StoreHandle};
use tally::{Error, TallyConfig};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 8, 30, 0).unwrap()
}

fn memory_store() -> RecordStore {
    let handle = Arc::new(StoreHandle::in_memory());
    handle.initialize().unwrap();
    RecordStore::new(handle)
}

fn file_store(path: &std::path::Path) -> RecordStore {
    let handle = Arc::new(StoreHandle::open_path(path));
    handle.initialize().unwrap();
    RecordStore::new(handle)
}

async fn active_ids(store: &RecordStore, query: &str) -> Vec<String> {
    store
        .list_active(&RecordFilter::parse(Some(query)))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect()
}

async fn trashed_ids(store: &RecordStore, query: &str) -> Vec<String> {
    store
        .list_trashed(&RecordFilter::parse(Some(query)))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect()
}

#[tokio::test]
async fn test_coffee_trash_and_restore_scenario() {
    let store = memory_store();
    let coffee = Record::new("1", "Coffee", 35000.0, RecordType::Expense, t0());
    store.create(&coffee).await.unwrap();

    assert_eq!(active_ids(&store, "").await, vec!["1"]);

    store.soft_delete(&RecordId::new("1")).await.unwrap();
    assert!(active_ids(&store, "").await.is_empty());
    assert_eq!(trashed_ids(&store, "").await, vec!["1"]);

    store.restore(&RecordId::new("1")).await.unwrap();
    assert_eq!(active_ids(&store, "").await, vec!["1"]);
    assert!(trashed_ids(&store, "").await.is_empty());
    assert_eq!(store.get(&coffee.id).await.unwrap(), Some(coffee));
}

#[tokio::test]
async fn test_amount_substring_scenario() {
    let store = memory_store();
    store
        .create(&Record::new("a", "Rent", 500_000.0, RecordType::Expense, t0()))
        .await
        .unwrap();
    store
        .create(&Record::new(
            "b",
            "Salary",
            1_500_000.0,
            RecordType::Income,
            t0() + Duration::days(1),
        ))
        .await
        .unwrap();

    assert_eq!(active_ids(&store, "500").await, vec!["b", "a"]);
}

#[tokio::test]
async fn test_update_amount_only_scenario() {
    let store = memory_store();
    let original = Record::new("1", "Coffee", 35000.0, RecordType::Expense, t0());
    store.create(&original).await.unwrap();

    let updated = store
        .update(&RecordId::new("1"), RecordPatch::new().with_amount(99.0))
        .await
        .unwrap();

    assert_eq!(updated.amount, 99.0);
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.title, original.title);
    assert_eq!(updated.record_type, original.record_type);
    assert_eq!(updated.created_at, original.created_at);

    let err = store
        .update(&RecordId::new("missing-id"), RecordPatch::new().with_amount(1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_case_insensitive_title_match() {
    let store = memory_store();
    store
        .create(&Record::new("1", "Café Sữa", 25000.0, RecordType::Expense, t0()))
        .await
        .unwrap();
    store
        .create(&Record::new("2", "Groceries", 120_000.0, RecordType::Expense, t0()))
        .await
        .unwrap();

    assert_eq!(active_ids(&store, "CAFÉ").await, vec!["1"]);
    assert_eq!(active_ids(&store, "sữa").await, vec!["1"]);
    assert_eq!(active_ids(&store, "cer").await, vec!["2"]);
    assert!(active_ids(&store, "xyz").await.is_empty());
}

#[tokio::test]
async fn test_filter_applies_to_trash_too() {
    let store = memory_store();
    for (id, title) in [("1", "Coffee"), ("2", "Tea")] {
        store
            .create(&Record::new(id, title, 10.0, RecordType::Expense, t0()))
            .await
            .unwrap();
        store.soft_delete(&RecordId::new(id)).await.unwrap();
    }

    assert_eq!(trashed_ids(&store, "tea").await, vec!["2"]);
    assert!(active_ids(&store, "tea").await.is_empty());
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger").join("tally.db");

    {
        let store = file_store(&path);
        store
            .create(&Record::new("1", "Coffee", 35000.0, RecordType::Expense, t0()))
            .await
            .unwrap();
        store
            .create(&Record::new("2", "Tea", 15000.0, RecordType::Expense, t0()))
            .await
            .unwrap();
        store.soft_delete(&RecordId::new("2")).await.unwrap();
    }

    let store = file_store(&path);
    assert_eq!(active_ids(&store, "").await, vec!["1"]);
    assert_eq!(trashed_ids(&store, "").await, vec!["2"]);

    let version = MigrationRunner::new(RECORDS_TABLE)
        .current_version(&store.handle().connection().unwrap().lock().unwrap())
        .unwrap();
    assert_eq!(version, 1);
}

#[tokio::test]
async fn test_handle_from_config_uses_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = TallyConfig::default().with_data_dir(dir.path().join("data"));
    let handle = Arc::new(StoreHandle::from_config(&config));
    handle.initialize().unwrap();

    let store = RecordStore::new(Arc::clone(&handle));
    store
        .create(&Record::new("1", "Coffee", 1.0, RecordType::Expense, t0()))
        .await
        .unwrap();

    assert!(config.database_path().exists());
}

#[tokio::test]
async fn test_disabled_storage_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = TallyConfig::default()
        .with_data_dir(dir.path())
        .with_storage_enabled(false);
    let handle = Arc::new(StoreHandle::from_config(&config));

    assert!(!handle.is_supported());
    handle.initialize().unwrap();

    let store = RecordStore::new(handle);
    let err = store.list_active(&RecordFilter::new()).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable { .. }));
}

#[tokio::test]
async fn test_concurrent_creates_all_land() {
    let store = memory_store();
    let tasks: Vec<_> = (0..20_i32)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let record = Record::new(
                    format!("r{i}"),
                    format!("Item {i}"),
                    f64::from(i + 1),
                    RecordType::Expense,
                    t0() + Duration::seconds(i64::from(i)),
                );
                store.create(&record).await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let counts = store.count().await.unwrap();
    assert_eq!(counts.active, 20);
    assert_eq!(active_ids(&store, "").await.first().map(String::as_str), Some("r19"));
}
