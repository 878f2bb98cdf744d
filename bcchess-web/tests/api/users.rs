use serde_json::{Value, json};

use crate::common::{TEST_PUBLIC_KEY, TestServer};

#[tokio::test]
async fn new_user_starts_at_1200() {
    let server = TestServer::start().await;

    let body = server
        .post_ok("/api/users", json!({ "username": "  alice " }))
        .await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["rating"], 1200);
    assert_eq!(body["wins"], 0);
    assert_eq!(body["losses"], 0);
    assert_eq!(body["draws"], 0);
    assert_eq!(body["gamesPlayed"], 0);
    assert_eq!(body["winRate"], 0.0);

    // Logging in again returns the same account.
    let again = server
        .post_ok("/api/users", json!({ "username": "alice" }))
        .await;
    assert_eq!(again["id"], body["id"]);
}

#[tokio::test]
async fn username_is_validated() {
    let server = TestServer::start().await;

    let resp = server.post("/api/users", json!({ "username": "   " })).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["field"], "username");

    let resp = server
        .post("/api/users", json!({ "username": "x".repeat(31) }))
        .await;
    assert_eq!(resp.status(), 400);

    let resp = server.post("/api/users", json!({ "name": "bob" })).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn unknown_user_is_404() {
    let server = TestServer::start().await;

    let resp = server.get("/api/users/9999").await;
    assert_eq!(resp.status(), 404);

    let resp = server
        .post("/api/users/9999/stats", json!({ "result": "win" }))
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stats_follow_results() {
    let server = TestServer::start().await;
    let id = server.create_user("carol").await;

    let body = server
        .post_ok(&format!("/api/users/{id}/stats"), json!({ "result": "win" }))
        .await;
    assert_eq!(body["rating"], 1216);
    assert_eq!(body["wins"], 1);

    // Draws leave the rating alone.
    let body = server
        .post_ok(&format!("/api/users/{id}/stats"), json!({ "result": "draw" }))
        .await;
    assert_eq!(body["rating"], 1216);
    assert_eq!(body["draws"], 1);
    assert_eq!(body["gamesPlayed"], 2);
    assert_eq!(body["winRate"], 75.0);

    let body = server
        .post_ok(&format!("/api/users/{id}/stats"), json!({ "result": "loss" }))
        .await;
    assert_eq!(body["losses"], 1);
    assert!(body["rating"].as_i64().unwrap() < 1216);
}

#[tokio::test]
async fn stats_reject_unknown_results() {
    let server = TestServer::start().await;
    let id = server.create_user("dave").await;

    let resp = server
        .post(&format!("/api/users/{id}/stats"), json!({ "result": "victory" }))
        .await;
    assert_eq!(resp.status(), 400);

    let user = server.user(id).await;
    assert_eq!(user["gamesPlayed"], 0);
}

#[tokio::test]
async fn leaderboard_is_sorted_by_rating() {
    let server = TestServer::start().await;
    let low = server.create_user("low").await;
    let mid = server.create_user("mid").await;
    let high = server.create_user("high").await;

    server
        .post_ok(&format!("/api/users/{high}/stats"), json!({ "result": "win" }))
        .await;
    server
        .post_ok(&format!("/api/users/{low}/stats"), json!({ "result": "loss" }))
        .await;

    let board = server.get_ok("/api/users").await;
    let ids: Vec<i64> = board
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![high, mid, low]);
}

#[tokio::test]
async fn push_subscriptions_are_stored_once() {
    let server = TestServer::start().await;
    let id = server.create_user("erin").await;
    let subscription = json!({
        "endpoint": "https://push.example.com/send/abc",
        "keys": { "p256dh": "key", "auth": "secret" }
    });

    for _ in 0..2 {
        let body = server
            .post_ok(
                &format!("/api/users/{id}/push"),
                json!({ "subscription": subscription }),
            )
            .await;
        assert_eq!(body["success"], true);
    }

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM push_subscriptions WHERE user_id = $1")
            .bind(id)
            .fetch_one(&server.pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn push_subscription_must_be_an_object() {
    let server = TestServer::start().await;
    let id = server.create_user("frank").await;

    let resp = server
        .post(&format!("/api/users/{id}/push"), json!({ "subscription": 42 }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["field"], "subscription");

    let resp = server
        .post(
            "/api/users/9999/push",
            json!({ "subscription": { "endpoint": "https://push.example.com/x" } }),
        )
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn public_key_is_served() {
    let server = TestServer::start().await;
    let body = server.get_ok("/api/push/public-key").await;
    assert_eq!(body["publicKey"], TEST_PUBLIC_KEY);
}

#[tokio::test]
async fn health_check() {
    let server = TestServer::start().await;
    let resp = server.get("/up").await;
    assert_eq!(resp.status(), 200);
}
