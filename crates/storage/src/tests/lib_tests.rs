use super::*;

fn file_url(dir: &tempfile::TempDir, name: &str) -> String {
    let path = dir.path().join("nested").join(name);
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = file_url(&dir, "client.db");

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    let db_path = dir.path().join("nested").join("client.db");
    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn set_item_overwrites_previous_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set_item("profile", "first").await.expect("set");
    storage.set_item("profile", "second").await.expect("overwrite");

    assert_eq!(
        storage.get_item("profile").await.expect("get"),
        Some("second".to_string())
    );
}

#[tokio::test]
async fn remove_item_clears_key_and_tolerates_missing_keys() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set_item("profile", "{}").await.expect("set");

    storage.remove_item("profile").await.expect("remove");
    storage.remove_item("profile").await.expect("remove again");

    assert_eq!(storage.get_item("profile").await.expect("get"), None);
}

#[tokio::test]
async fn values_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = file_url(&dir, "persist.db");

    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage
            .set_item("studySaathiUser", r#"{"name":"Asha"}"#)
            .await
            .expect("set");
    }

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get_item("studySaathiUser").await.expect("get"),
        Some(r#"{"name":"Asha"}"#.to_string())
    );
}

#[test]
fn in_memory_urls_have_no_parent_directory() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/client.db?mode=rwc"),
        Some(PathBuf::from("./data/client.db"))
    );
}
