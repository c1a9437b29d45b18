//! Session lifecycle against a mock backend: login, register, refresh,
//! and clearing on 401/403.

mod common;

use std::time::Duration;

use common::{harness, harness_with_token, hits, profile_json};
use luxbet::storage::{ADMIN_TOKEN_KEY, USER_TOKEN_KEY};
use luxbet::{LuxError, RegisterData, TokenStore};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": token, "token_type": "bearer" })),
        )
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer, role: &str, balance: f64) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(role, balance)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_admin_login_persists_admin_token() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-admin").await;
    mount_me(&server, "ADMIN", 0.0).await;
    let h = harness(&server);

    let outcome = h.client.login("maria", "secret").await.unwrap();

    assert!(outcome.is_admin);
    assert_eq!(h.tokens.get(USER_TOKEN_KEY).as_deref(), Some("tok-admin"));
    assert_eq!(h.tokens.get(ADMIN_TOKEN_KEY).as_deref(), Some("tok-admin"));
    let session = h.client.session().snapshot();
    assert_eq!(session.token.as_deref(), Some("tok-admin"));
    assert_eq!(session.user.map(|u| u.username), Some("maria".to_string()));
}

#[tokio::test]
async fn test_regular_login_has_no_admin_token() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-user").await;
    mount_me(&server, "user", 10.0).await;
    let h = harness(&server);

    let outcome = h.client.login("maria", "secret").await.unwrap();

    assert!(!outcome.is_admin);
    assert_eq!(h.tokens.get(USER_TOKEN_KEY).as_deref(), Some("tok-user"));
    assert_eq!(h.tokens.get(ADMIN_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_login_sends_bearer_on_profile_fetch() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("user", 5.0)))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);

    h.client.login("maria", "secret").await.unwrap();
    assert_eq!(h.client.session().user().map(|u| u.balance), Some(5.0));
}

#[tokio::test]
async fn test_login_rejection_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Credenciais inválidas" })),
        )
        .mount(&server)
        .await;
    let h = harness(&server);

    let err = h.client.login("maria", "wrong").await.unwrap_err();

    assert!(matches!(err, LuxError::Auth(ref m) if m == "Credenciais inválidas"));
    assert!(!h.client.session().is_authenticated());
    assert_eq!(h.tokens.get(USER_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_login_rejection_without_detail_uses_default_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;
    let h = harness(&server);

    let err = h.client.login("maria", "x").await.unwrap_err();
    assert!(matches!(err, LuxError::Auth(ref m) if m == "Erro ao fazer login"));
}

#[tokio::test]
async fn test_login_keeps_token_when_profile_fetch_fails() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-2").await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = harness(&server);

    let outcome = h.client.login("maria", "secret").await.unwrap();

    assert!(!outcome.is_admin);
    assert_eq!(h.client.session().token().as_deref(), Some("tok-2"));
    assert!(h.client.session().user().is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_does_not_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Email already registered" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "x" })))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(&server);

    let data = RegisterData {
        username: "maria".into(),
        email: "taken@example.com".into(),
        password: "secret".into(),
        ..Default::default()
    };
    let err = h.client.register(&data).await.unwrap_err();

    assert!(matches!(err, LuxError::Auth(ref m) if m == "Email already registered"));
    assert!(!h.client.session().is_authenticated());
}

#[tokio::test]
async fn test_register_then_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "username": "maria",
            "email": "maria@example.com",
            "password": "secret",
            "affiliate_code": "AFF1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("user", 0.0)))
        .expect(1)
        .mount(&server)
        .await;
    mount_login(&server, "tok-new").await;
    mount_me(&server, "user", 0.0).await;
    let h = harness(&server);

    let data = RegisterData {
        username: "maria".into(),
        email: "maria@example.com".into(),
        password: "secret".into(),
        affiliate_code: Some("AFF1".into()),
        ..Default::default()
    };
    h.client.register(&data).await.unwrap();

    assert_eq!(h.client.session().token().as_deref(), Some("tok-new"));
}

#[tokio::test]
async fn test_logout_clears_both_keys_without_network() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-admin").await;
    mount_me(&server, "admin", 0.0).await;
    let h = harness(&server);
    h.client.login("maria", "secret").await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    h.client.logout().unwrap();

    assert_eq!(h.tokens.get(USER_TOKEN_KEY), None);
    assert_eq!(h.tokens.get(ADMIN_TOKEN_KEY), None);
    assert!(!h.client.session().is_authenticated());
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_refresh_failures_keep_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("user", 25.0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok-3"));
    h.client.session().restore().await.unwrap();
    let cached = h.client.session().snapshot();

    for _ in 0..3 {
        let err = h.client.refresh_user().await.unwrap_err();
        assert!(matches!(err, LuxError::Api { status: 502, .. }));
    }

    assert_eq!(h.client.session().snapshot(), cached);
    assert_eq!(h.tokens.get(USER_TOKEN_KEY).as_deref(), Some("tok-3"));
}

#[tokio::test]
async fn test_refresh_network_failure_keeps_session() {
    // Nothing listens on port 9 of localhost.
    let server = MockServer::start().await;
    let h = harness_with_token(&server, Some("tok-4"));
    let dead = luxbet::LuxClient::new(
        common::test_config("http://127.0.0.1:9"),
        h.tokens.clone(),
        h.sink.clone(),
    )
    .unwrap();

    let err = dead.refresh_user().await.unwrap_err();

    assert!(matches!(err, LuxError::Transport { .. }));
    assert_eq!(dead.session().token().as_deref(), Some("tok-4"));
    assert_eq!(h.tokens.get(USER_TOKEN_KEY).as_deref(), Some("tok-4"));
}

#[tokio::test]
async fn test_background_refresh_swallows_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok-5"));
    let cancel = CancellationToken::new();

    let handle = h.client.session().start_background_refresh(cancel.clone());
    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(hits(&server, "/api/auth/me").await >= 2);
    assert_eq!(h.client.session().token().as_deref(), Some("tok-5"));
    assert_eq!(h.tokens.get(USER_TOKEN_KEY).as_deref(), Some("tok-5"));
}

#[tokio::test]
async fn test_notify_visible_refreshes_between_ticks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("user", 10.0)))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok-6"));
    let mut config = common::test_config(&server.uri());
    config.refresh_interval = Duration::from_secs(3600);
    let client = luxbet::LuxClient::new(config, h.tokens.clone(), h.sink.clone()).unwrap();
    let cancel = CancellationToken::new();

    let handle = client.session().start_background_refresh(cancel.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hits(&server, "/api/auth/me").await, 1);

    client.session().notify_visible();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hits(&server, "/api/auth/me").await, 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_background_refresh_idles_while_anonymous() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let cancel = CancellationToken::new();

    let handle = h.client.session().start_background_refresh(cancel.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(hits(&server, "/api/auth/me").await, 0);
}

#[tokio::test]
async fn test_unauthorized_clears_session_everywhere() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/transactions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expirado" })))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok-6"));
    let mut rx = h.client.session().subscribe();

    let err = h.client.history().transactions().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!h.client.session().is_authenticated());
    assert_eq!(h.tokens.get(USER_TOKEN_KEY), None);
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().is_authenticated());

    // Later calls fail locally and never reach the backend.
    let err = h.client.history().transactions().await.unwrap_err();
    assert!(matches!(err, LuxError::NotAuthenticated));
}

#[tokio::test]
async fn test_forbidden_on_refresh_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok-7"));

    let err = h.client.refresh_user().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!h.client.session().is_authenticated());
    assert_eq!(h.tokens.get(USER_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_authorized_without_token_sends_nothing() {
    let server = MockServer::start().await;
    let h = harness(&server);

    let err = h.client.history().bets(None).await.unwrap_err();

    assert!(matches!(err, LuxError::NotAuthenticated));
    assert!(server.received_requests().await.unwrap().is_empty());
}
