//! Database tests

use super::*;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (db, _temp_dir) = create_test_db().await;
    db.migrate().await.unwrap();
    db.migrate().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_keeps_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("test.db");

    let db = Database::connect(&db_path).await.unwrap();
    db.upsert_post(&Post::new(1, 1, "kept", "body")).await.unwrap();
    db.close().await;

    let db = Database::connect(&db_path).await.unwrap();
    assert_eq!(db.count_posts().await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_all_on_empty_store() {
    let (db, _temp_dir) = create_test_db().await;

    let posts = db.list_all().await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let (db, _temp_dir) = create_test_db().await;
    let post = Post::new(1, 10, "title", "body");

    db.upsert(&post).await.unwrap();
    db.upsert(&post).await.unwrap();

    assert_eq!(db.count_posts().await.unwrap(), 1);
    let stored = db.get_post(1).await.unwrap().unwrap();
    assert_eq!(stored.title, "title");
    assert_eq!(stored.body, "body");
    assert_eq!(stored.user_id, 10);
}

#[tokio::test]
async fn test_upsert_last_write_wins() {
    let (db, _temp_dir) = create_test_db().await;

    db.upsert(&Post::new(5, 1, "first", "first body"))
        .await
        .unwrap();
    let original = db.get_post(5).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    db.upsert(&Post::new(5, 1, "second", "second body"))
        .await
        .unwrap();

    assert_eq!(db.count_posts().await.unwrap(), 1);
    let updated = db.get_post(5).await.unwrap().unwrap();
    assert_eq!(updated.id, 5);
    assert_eq!(updated.title, "second");
    assert_eq!(updated.body, "second body");

    // creation time is untouched, update time moves forward
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
}

#[tokio::test]
async fn test_list_all_newest_first() {
    let (db, _temp_dir) = create_test_db().await;

    for id in 1..=3 {
        db.upsert(&Post::new(id, 1, format!("post {id}"), "body"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // an update does not change the creation order
    db.upsert(&Post::new(1, 1, "post 1 edited", "body"))
        .await
        .unwrap();

    let posts = db.list_all().await.unwrap();
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(posts[2].title, "post 1 edited");
    assert!(posts.iter().all(|p| p.created_at.is_some()));
}

#[tokio::test]
async fn test_read_error_surfaces_after_close() {
    let (db, _temp_dir) = create_test_db().await;
    db.close().await;

    assert!(db.list_all().await.is_err());
    assert!(db.upsert(&Post::new(1, 1, "t", "b")).await.is_err());
}
