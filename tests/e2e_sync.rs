//! E2E tests for the sync trigger and the cached post listing

mod common;

use common::{TestServer, sample_posts};
use serde_json::Value;

#[tokio::test]
async fn test_sync_then_list_items() {
    let mut server = TestServer::new().await;
    let _source = server.serve_posts(sample_posts()).await;

    let response = server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Posts synced successfully");
    assert_eq!(body["fetched"], 3);
    assert_eq!(body["applied"], 3);
    assert_eq!(body["failed"], 0);

    let response = server
        .client
        .get(&server.url("/items"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let items: Vec<Value> = response.json().await.unwrap();
    assert_eq!(items.len(), 3);

    let mut ids: Vec<i64> = items.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);

    let third = items.iter().find(|p| p["id"] == 3).unwrap();
    assert_eq!(third["userId"], 2);
    assert_eq!(third["title"], "third");
    assert_eq!(third["body"], "three");
}

#[tokio::test]
async fn test_repeated_sync_is_idempotent() {
    let mut server = TestServer::new().await;
    let _source = server.serve_posts(sample_posts()).await;

    for _ in 0..2 {
        let response = server
            .client
            .get(&server.url("/sync"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    assert_eq!(server.state.db.count_posts().await.unwrap(), 3);
}

#[tokio::test]
async fn test_items_empty_before_any_sync() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/items"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let items: Vec<Value> = response.json().await.unwrap();
    assert!(items.is_empty());

    // an empty result is never cached
    assert!(
        !server
            .state
            .cache
            .contains(postsync::data::ALL_POSTS_KEY)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_items_served_from_cache_until_refreshed() {
    let mut server = TestServer::new().await;
    let first = server.serve_posts(sample_posts()).await;

    server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = server
        .client
        .get(&server.url("/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.len(), 3);

    // source now returns an edited post; sync does not touch the cache
    first.remove_async().await;
    let _edited = server
        .serve_posts(serde_json::json!([
            {"userId": 1, "id": 1, "title": "edited", "body": "one"}
        ]))
        .await;
    server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    let cached: Vec<Value> = server
        .client
        .get(&server.url("/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post = cached.iter().find(|p| p["id"] == 1).unwrap();
    assert_eq!(post["title"], "first");

    server.state.posts.refresh().await.unwrap();

    let fresh: Vec<Value> = server
        .client
        .get(&server.url("/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post = fresh.iter().find(|p| p["id"] == 1).unwrap();
    assert_eq!(post["title"], "edited");
}

#[tokio::test]
async fn test_sync_reports_client_error_from_source() {
    let mut server = TestServer::new().await;
    let source = server.fail_posts(404).await;

    let response = server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("404"));

    // 4xx is not retried
    source.assert_async().await;
    assert_eq!(server.state.db.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sync_reports_exhausted_retries() {
    let mut server = TestServer::new().await;
    let _source = server.fail_posts(503).await;

    let response = server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_sync_reports_malformed_payload() {
    let mut server = TestServer::new().await;
    let _source = server
        .serve_posts(serde_json::json!({"posts": "not an array"}))
        .await;

    let response = server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
}

#[tokio::test]
async fn test_sync_fails_when_store_rejects_whole_batch() {
    let mut server = TestServer::new().await;
    let _source = server.serve_posts(sample_posts()).await;
    server.state.db.close().await;

    let response = server
        .client
        .get(&server.url("/sync"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");
}
