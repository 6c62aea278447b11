use super::router;
use crate::db::{DynStore, MemoryStore};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

fn app() -> Router {
    let store: DynStore = Arc::new(MemoryStore::new());
    router(store)
}

// Helper to issue one request against a cloned router and decode the JSON reply
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_raw(app, request).await
}

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn player_body(id: Value, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
        "age": 22,
        "Gold_trophies": 1,
        "Silver_trophies": 2,
        "Bronze_trophies": 3
    })
}

#[tokio::test]
async fn test_index_and_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_data_lifecycle() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/data",
        Some(json!({"key": "theme", "value": "dark"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Data stored successfully");

    let (status, body) = send(&app, Method::GET, "/data?key=theme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "theme", "value": "dark"}));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/data/theme",
        Some(json!({"value": "light"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(
        &app,
        Method::POST,
        "/data",
        Some(json!({"key": "volume", "value": 7})),
    )
    .await;
    let (status, body) = send(&app, Method::GET, "/data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"theme": "light", "volume": "7"}));

    let (status, body) = send(&app, Method::DELETE, "/data/theme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data deleted successfully");

    let (status, body) = send(&app, Method::DELETE, "/data/theme", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": "error", "message": "Data not found"}));

    let (status, _) = send(&app, Method::GET, "/data?key=theme", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_data_validation() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/data", Some(json!({"key": "k"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Key and value are required");

    let (status, body) = send(&app, Method::PUT, "/data/k", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Value is required");

    // Not JSON at all
    let request = Request::builder()
        .method(Method::POST)
        .uri("/data")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_snapshots_and_best_scores() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/snapshots/best", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "info");
    assert_eq!(body["best_scores"], json!({}));

    for (player, coins) in [(1001, 40), (1001, 120), (1002, 75), (1001, 60)] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/snapshots",
            Some(json!({"player_id": player, "coins": coins, "level": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["key"], format!("PlayerData:{}", player));
        assert!(body["received_data"]["timestamp"].is_string());
    }

    let (status, body) = send(&app, Method::GET, "/snapshots/best", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"1001": 120, "1002": 75}));
}

#[tokio::test]
async fn test_snapshot_requires_player_id() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/snapshots", Some(json!({"coins": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing 'player_id' in JSON data. Cannot store player data."
    );
}

#[tokio::test]
async fn test_snapshot_form_and_raw_bodies_are_echoed() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/snapshots")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("player_id=9&coins=10"))
        .unwrap();
    let (status, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Form data received successfully!");
    assert_eq!(body["received_data"], json!({"coins": "10", "player_id": "9"}));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/snapshots")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Raw data received successfully!");
    assert_eq!(body["received_data"], "hello");

    // Neither was stored as a snapshot
    let (_, body) = send(&app, Method::GET, "/snapshots/best", None).await;
    assert_eq!(body["status"], "info");

    let (status, _) = send(&app, Method::POST, "/snapshots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_player_profile_routes() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/players",
        Some(player_body(json!(1), "ace")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Player created successfully");
    assert_eq!(body["player"]["id"], "1");

    let (status, body) = send(
        &app,
        Method::POST,
        "/players",
        Some(player_body(json!("1"), "twin")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Player with id '1' already exists.");

    let (status, body) = send(&app, Method::GET, "/players?username=ace", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Bronze_trophies"], 3);

    let (status, _) = send(&app, Method::GET, "/players", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/players/1",
        Some(json!({"Gold_trophies": 5, "email": "ace@games.test"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player"]["Gold_trophies"], 5);
    assert_eq!(body["player"]["Silver_trophies"], 2);

    let (status, body) = send(&app, Method::GET, "/players/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ace@games.test");

    let (status, _) = send(&app, Method::GET, "/players/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/players/404",
        Some(json!({"age": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_player_create_missing_fields() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/players",
        Some(json!({"id": "3", "username": "solo"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_ledger_routes() {
    let app = app();

    for (route, amount) in [("earn", 100), ("earn", 200), ("spend", 50)] {
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/players/1001/{}", route),
            Some(json!({"amount": amount})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["timestamp"].is_string());
    }

    let (status, body) = send(&app, Method::GET, "/players/1001/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"player_id": "1001", "balance": 250}));

    let (status, body) = send(&app, Method::GET, "/players/1001/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["transaction_amount"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, vec![-50, 200, 100]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/players/1001/spend",
        Some(json!({"amount": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_earn_cannot_overflow_balance() {
    let app = app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/players/9/earn",
        Some(json!({"amount": i64::MAX})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/players/9/earn",
        Some(json!({"amount": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&app, Method::GET, "/players/9/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], i64::MAX);
}

#[tokio::test]
async fn test_update_creates_missing_key() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/data/fresh",
        Some(json!({"value": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data updated successfully");

    let (status, body) = send(&app, Method::GET, "/data?key=fresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "fresh", "value": "new"}));
}

#[tokio::test]
async fn test_best_scores_without_coins_is_plain_empty_map() {
    let app = app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/snapshots",
        Some(json!({"player_id": 1, "level": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/snapshots/best", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_numeric_key_stored_as_text() {
    let app = app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/data",
        Some(json!({"key": 5, "value": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/data?key=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "5", "value": "x"}));
}

#[tokio::test]
async fn test_malformed_snapshot_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/snapshots")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"player_id\": 1,"))
        .unwrap();
    let (status, body) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body:"));
}
