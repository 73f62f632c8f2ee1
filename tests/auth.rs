//! Integration tests for auth: register, login, token-protected routes and the user store.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{empty_user_store, fixture_catalog, spawn_app, test_app_state};
use paper_trader::api::auth::{self, AuthUserCredential};
use paper_trader::api::routes::{AppState, UserStore};
use paper_trader::catalog::SharedCatalog;
use tokio::sync::RwLock;
use uuid::Uuid;

fn app_state(user_store: UserStore) -> AppState {
    let catalog: SharedCatalog = Arc::new(fixture_catalog());
    test_app_state(catalog, user_store)
}

#[tokio::test]
async fn register_returns_201_with_user_id_and_username() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "alice", "password": "secret123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 201);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json.get("user_id").and_then(|v| v.as_str()).is_some());
    assert_eq!(json.get("username").and_then(|v| v.as_str()), Some("alice"));
}

#[tokio::test]
async fn register_empty_username_returns_400() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "", "password": "secret123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json.get("error").unwrap().as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn register_empty_password_returns_400() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "alice", "password": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json.get("error").unwrap().as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn register_duplicate_username_returns_400() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let r1 = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "bob", "password": "pass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(r1.status().as_u16(), 201);

    let r2 = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "bob", "password": "pass2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(r2.status().as_u16(), 400);
    let json: serde_json::Value = r2.json().await.unwrap();
    assert!(json.get("error").unwrap().as_str().unwrap().contains("already taken"));
}

#[tokio::test]
async fn register_then_login_returns_token() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let reg = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "carol", "password": "mypass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reg.status().as_u16(), 201);

    let login = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "carol", "password": "mypass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);
    let json: serde_json::Value = login.json().await.unwrap();
    assert!(json.get("token").and_then(|v| v.as_str()).is_some());
    assert!(json.get("user_id").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn login_case_insensitive_username() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let _ = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "Alice", "password": "secret" }))
        .send()
        .await
        .unwrap();

    let login = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "alice", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);
    let json: serde_json::Value = login.json().await.unwrap();
    assert!(json.get("user_id").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let _ = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "dave", "password": "right" }))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "dave", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn login_unknown_user_returns_401() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "nobody", "password": "any" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn login_with_env_seeded_user() {
    let user_id = Uuid::new_v4();
    let password_hash = auth::hash_password("envpass").unwrap();
    let cred = AuthUserCredential {
        user_id,
        username: "seeded".to_string(),
        password_hash,
    };
    let mut map = HashMap::new();
    map.insert("seeded".to_string(), cred);
    let user_store: UserStore = Arc::new(RwLock::new(map));
    let state = app_state(user_store);
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "seeded", "password": "envpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    let uid_str = json.get("user_id").and_then(|v| v.as_str()).unwrap();
    assert_eq!(uid_str, user_id.to_string());
}

#[tokio::test]
async fn register_opens_funded_account() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "erin", "password": "pw" }))
        .send()
        .await
        .unwrap();
    let login: serde_json::Value = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "username": "erin", "password": "pw" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap();

    let me = client
        .get(format!("{}/auth/me", base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 200);
    let json: serde_json::Value = me.json().await.unwrap();
    assert_eq!(json["username"], "erin");
    assert_eq!(json["balance"].as_i64(), Some(100_000 * 100_000_000));
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/positions", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let forged = auth::create_token(b"some-other-secret", Uuid::new_v4()).unwrap();
    let bad = client
        .get(format!("{}/account/balance", base_url))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 401);
    let json: serde_json::Value = bad.json().await.unwrap();
    assert!(json.get("error").is_some());
}

#[test]
fn token_round_trip_and_password_hashing() {
    let user_id = Uuid::new_v4();
    let token = auth::create_token(b"secret", user_id).unwrap();
    let claims = auth::decode_token(b"secret", &token).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.exp > claims.iat);
    assert!(auth::decode_token(b"other", &token).is_err());

    let hash = auth::hash_password("hunter2").unwrap();
    assert!(auth::verify_password("hunter2", &hash));
    assert!(!auth::verify_password("hunter3", &hash));
    assert!(!auth::verify_password("hunter2", "not-a-phc-string"));
}

#[tokio::test]
async fn concurrent_registrations_of_one_name_admit_exactly_one() {
    let user_store = empty_user_store();
    let state = app_state(user_store.clone());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        let url = format!("{}/auth/register", base_url);
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .json(&serde_json::json!({ "username": "Racer", "password": format!("pw{i}") }))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            201 => created += 1,
            400 => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(user_store.read().await.len(), 1);
}

#[tokio::test]
async fn malformed_register_body_returns_json_error() {
    let state = app_state(empty_user_store());
    let (base_url, _handle) = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json.get("error").and_then(|v| v.as_str()).is_some());
}
