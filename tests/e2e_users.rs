//! E2E tests for user lookup

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_get_seeded_user() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/users/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["id"], 1);
    assert_eq!(user["name"], "John Doe");
    assert_eq!(user["email"], "john.doe@gmail.com");
}

#[tokio::test]
async fn test_unknown_user_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/users/42"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_non_numeric_user_id_is_400() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/users/abc"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}
