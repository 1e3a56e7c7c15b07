//! Tests for the process-wide store handle.
//!
//! Kept in their own test binary: the global handle can be installed only once
//! per process.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use std::sync::Arc;
use tally::models::{Record, RecordType};
use tally::storage::{RecordStore, global_handle, install_global};
use tally::{Error, TallyConfig};

#[tokio::test]
async fn test_install_then_share_global_handle() {
    let dir = tempfile::tempdir().unwrap();
    let config = TallyConfig::default().with_data_dir(dir.path());

    let installed = install_global(&config).unwrap();
    installed.initialize().unwrap();

    let threads: Vec<_> = (0..4).map(|_| std::thread::spawn(global_handle)).collect();
    for thread in threads {
        assert!(Arc::ptr_eq(&thread.join().unwrap(), &installed));
    }

    let err = install_global(&config).unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }));

    let store = RecordStore::global();
    let record = Record::new("g1", "Coffee", 35000.0, RecordType::Expense, Utc::now());
    store.create(&record).await.unwrap();
    assert_eq!(store.get(&record.id).await.unwrap(), Some(record));
    assert!(config.database_path().exists());
}
