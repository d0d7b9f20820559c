//! End to end tests for syncing
//!

use backup_dropbox::{
    SyncError, SyncReport,
    storage::{Call, MemoryStorage},
    sync,
};
use common::{test_config, write_files};
use shared::test::init_test_logger;

mod common;

#[test]
fn deletes_oldest_and_uploads_newest() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230101", "db_20230105", "db_20230104"]);

    let config = test_config(directory.path(), &["db_"], 2);
    let mut storage = MemoryStorage::new()
        .with_file("/db_20230101", b"")
        .with_file("/db_20230102", b"")
        .with_file("/db_20230103", b"")
        .with_page_size(2);

    let report = sync(&config, &mut storage).unwrap();

    assert_eq!(
        report,
        SyncReport {
            deleted: vec!["/db_20230102".to_string(), "/db_20230101".to_string()],
            uploaded: vec![directory.path().join("db_20230105")],
        }
    );
    assert_eq!(storage.paths(), vec!["/db_20230103", "/db_20230105"]);
    assert_eq!(storage.contents("/db_20230105"), Some(b"db_20230105".as_slice()));
}

#[test]
fn prefixes_run_in_config_order() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(
        directory.path(),
        &["web_20230210", "db_20230201", "unrelated.txt"],
    );

    let config = test_config(directory.path(), &["web_", "db_"], 3);
    let mut storage = MemoryStorage::new()
        .with_file("/db_20230101", b"")
        .with_file("/web_20230101", b"")
        .with_file("/notes.txt", b"");

    sync(&config, &mut storage).unwrap();

    assert_eq!(
        storage.calls,
        vec![
            Call::List(None),
            Call::Upload("/web_20230210".to_string()),
            Call::Upload("/db_20230201".to_string()),
        ]
    );
}

#[test]
fn no_local_backup_means_no_upload() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["web_20230101"]);

    let config = test_config(directory.path(), &["db_"], 2);
    let mut storage = MemoryStorage::new().with_file("/db_20230101", b"");

    let report = sync(&config, &mut storage).unwrap();

    assert_eq!(report, SyncReport::default());
    assert_eq!(storage.calls, vec![Call::List(None)]);
}

#[test]
fn uploads_lowercased_name() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["DB_20230301.SQL"]);

    let config = test_config(directory.path(), &["Db_"], 2);
    let mut storage = MemoryStorage::new();

    sync(&config, &mut storage).unwrap();

    assert_eq!(storage.paths(), vec!["/db_20230301.sql"]);
}

#[test]
fn skips_upload_already_in_remote() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230102", "db_20230101"]);

    let config = test_config(directory.path(), &["db_"], 3);
    let mut storage = MemoryStorage::new()
        .with_file("/db_20230101", b"")
        .with_file("/db_20230102", b"");

    let report = sync(&config, &mut storage).unwrap();

    assert_eq!(report, SyncReport::default());
    assert_eq!(storage.calls, vec![Call::List(None)]);
}

#[test]
fn reuploads_newest_when_retention_deleted_it() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230102"]);

    let config = test_config(directory.path(), &["db_"], 1);
    let mut storage = MemoryStorage::new()
        .with_file("/db_20230101", b"")
        .with_file("/db_20230102", b"old");

    sync(&config, &mut storage).unwrap();

    assert_eq!(storage.paths(), vec!["/db_20230102"]);
    assert_eq!(storage.contents("/db_20230102"), Some(b"db_20230102".as_slice()));
}

#[test]
fn delete_failure_aborts_run() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230105", "web_20230105"]);

    let config = test_config(directory.path(), &["db_", "web_"], 1);
    let mut storage = MemoryStorage::new()
        .with_file("/db_20230101", b"")
        .with_file("/db_20230102", b"")
        .failing_on(Call::Delete("/db_20230102".to_string()));

    let error = sync(&config, &mut storage).unwrap_err();

    assert!(matches!(error, SyncError::Delete { ref path, .. } if path == "/db_20230102"));
    assert_eq!(
        storage.calls,
        vec![
            Call::List(None),
            Call::Delete("/db_20230102".to_string()),
        ]
    );
}

#[test]
fn upload_failure_aborts_run() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230105", "web_20230105"]);

    let config = test_config(directory.path(), &["db_", "web_"], 2);
    let mut storage =
        MemoryStorage::new().failing_on(Call::Upload("/db_20230105".to_string()));

    let error = sync(&config, &mut storage).unwrap_err();

    assert!(matches!(error, SyncError::Upload { .. }));
    assert!(!storage.calls.contains(&Call::Upload("/web_20230105".to_string())));
}

#[test]
fn malformed_remote_date_aborts_run() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230105"]);

    let config = test_config(directory.path(), &["db_"], 2);
    let mut storage = MemoryStorage::new().with_file("/db_notadate", b"");

    let error = sync(&config, &mut storage).unwrap_err();

    assert!(matches!(error, SyncError::InvalidDate(_)));
    assert_eq!(storage.calls, vec![Call::List(None)]);
}

#[test]
fn remote_list_failure_aborts_run() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();

    let config = test_config(directory.path(), &["db_"], 2);
    let mut storage = MemoryStorage::new().failing_on(Call::List(None));

    let error = sync(&config, &mut storage).unwrap_err();
    assert!(matches!(error, SyncError::RemoteList(_)));
}

#[test]
fn unreadable_backup_dir_aborts_run() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();

    let config = test_config(&directory.path().join("missing"), &["db_"], 2);
    let mut storage = MemoryStorage::new();

    let error = sync(&config, &mut storage).unwrap_err();

    assert!(matches!(error, SyncError::ListLocal(_)));
    assert!(storage.calls.is_empty());
}

#[cfg(unix)]
#[test]
fn dangling_symlink_does_not_stop_upload() {
    let _logger = init_test_logger();
    let directory = tempfile::tempdir().unwrap();
    write_files(directory.path(), &["db_20230105"]);
    std::os::unix::fs::symlink(
        directory.path().join("missing"),
        directory.path().join("notes.lnk"),
    )
    .unwrap();

    let config = test_config(directory.path(), &["db_"], 2);
    let mut storage = MemoryStorage::new();

    let report = sync(&config, &mut storage).unwrap();

    assert_eq!(report.uploaded, vec![directory.path().join("db_20230105")]);
    assert_eq!(
        storage.calls,
        vec![
            Call::List(None),
            Call::Upload("/db_20230105".to_string()),
        ]
    );
}
