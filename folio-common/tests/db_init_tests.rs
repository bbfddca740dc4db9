//! Tests for database initialization

use folio_common::db::init::{init_database, init_in_memory};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("folio.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("folio.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_settings_table_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("folio.db")).await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'settings'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_settings_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("folio.db");

    {
        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('slot', 'kept')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let value: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'slot'")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(value, "kept");
}

#[tokio::test]
async fn test_in_memory_database_has_settings_table() {
    let pool = init_in_memory().await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(rows, 0);
}
