mod common;

use std::time::Duration;

use common::{harness_with_token, hits, profile_json};
use luxbet::{EventName, NotificationEvent};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/api/public/notifications";

async fn mount_list(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_mark_read(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/public/notifications/\d+/read$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("user", 12.5)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_same_notification_is_shown_once() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 5, "title": "Bem-vindo", "message": "Olá!", "type": "info", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    let first = poller.poll_once(&cancel).await.unwrap();
    let second = poller.poll_once(&cancel).await.unwrap();

    assert_eq!(first.map(|n| n.id), Some(5));
    assert!(second.is_none());
    assert!(poller.has_seen(5));
    cancel.cancel();
}

#[tokio::test]
async fn test_read_notifications_are_skipped() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 1, "title": "Antiga", "message": "", "type": "info", "is_read": true },
            { "id": 2, "title": "Nova", "message": "", "type": "promotion", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    let shown = poller.poll_once(&cancel).await.unwrap();

    assert_eq!(shown.map(|n| n.id), Some(2));
    assert!(!poller.has_seen(1));
    cancel.cancel();
}

#[tokio::test]
async fn test_shown_then_marked_read_then_dismissed() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 11, "title": "Aviso", "message": "Manutenção hoje", "type": "warning", "is_read": false }
        ]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/api/public/notifications/11/read"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let mut events = poller.subscribe();
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();

    match events.recv().await.unwrap() {
        NotificationEvent::Shown(n) => assert_eq!(n.id, 11),
        other => panic!("unexpected event {other:?}"),
    }
    let dismissed = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dismissed, NotificationEvent::Dismissed(11));
    assert_eq!(
        hits(&server, "/api/public/notifications/11/read").await,
        1
    );
    cancel.cancel();
}

#[tokio::test]
async fn test_deposit_amount_falls_back_to_message() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 20, "title": "Depósito aprovado", "message": "Seu depósito de R$ 12,50 foi aprovado", "type": "success", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    mount_me(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/transactions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, EventName::Purchase);
    assert_eq!(events[0].value, Some(dec!(12.50)));
    assert_eq!(events[0].currency.as_deref(), Some("BRL"));
    // The balance was refreshed on the way.
    assert_eq!(h.client.session().user().map(|u| u.balance), Some(12.5));
    cancel.cancel();
}

#[tokio::test]
async fn test_first_deposit_reports_purchase_and_lead() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 21, "title": "Depósito confirmado", "message": "R$ 30,00 creditados", "type": "success", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    mount_me(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                { "id": 1, "type": "deposit", "amount": 30.0, "status": "approved", "created_at": "2025-03-01T10:00:00" },
                { "id": 2, "type": "deposit", "amount": 99.0, "status": "pending", "created_at": "2025-03-02T10:00:00" },
                { "id": 3, "type": "withdrawal", "amount": 5.0, "status": "approved", "created_at": "2025-03-03T10:00:00" }
            ]
        })))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();

    let events = h.sink.events();
    let names: Vec<EventName> = events.iter().map(|e| e.name).collect();
    assert_eq!(names, vec![EventName::Purchase, EventName::Lead]);
    assert!(events.iter().all(|e| e.value == Some(dec!(30))));
    assert_eq!(events[0].content_name.as_deref(), Some("Primeiro Depósito"));
    cancel.cancel();
}

#[tokio::test]
async fn test_repeat_deposit_reports_latest_amount_without_lead() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 22, "title": "Depósito aprovado", "message": "Depósito aprovado", "type": "success", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    mount_me(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [
                { "id": 1, "type": "deposit", "amount": 10.0, "status": "approved", "created_at": "2025-03-01T10:00:00" },
                { "id": 4, "type": "deposit", "amount": 75.5, "status": "approved", "created_at": "2025-04-01T10:00:00" }
            ]
        })))
        .mount(&server)
        .await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    poller.poll_once(&cancel).await.unwrap();

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, EventName::Purchase);
    assert_eq!(events[0].value, Some(dec!(75.50)));
    assert_eq!(events[0].content_name.as_deref(), Some("Depósito"));
    cancel.cancel();
}

#[tokio::test]
async fn test_background_poller_surfaces_each_id_once() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            { "id": 40, "title": "A", "message": "", "type": "info", "is_read": false },
            { "id": 41, "title": "B", "message": "", "type": "info", "is_read": false }
        ]),
    )
    .await;
    mount_mark_read(&server).await;
    let h = harness_with_token(&server, Some("tok"));
    let poller = h.client.notification_poller();
    let mut events = poller.subscribe();
    let cancel = CancellationToken::new();

    let handle = poller.start(cancel.clone());
    tokio::time::sleep(Duration::from_millis(250)).await;
    cancel.cancel();
    handle.await.unwrap();

    let mut shown = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let NotificationEvent::Shown(n) = event {
            shown.push(n.id);
        }
    }
    assert_eq!(shown, vec![40, 41]);
    assert!(hits(&server, LIST_PATH).await >= 3);
}

#[tokio::test]
async fn test_background_poller_waits_for_login() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;
    let h = harness_with_token(&server, None);
    let poller = h.client.notification_poller();
    let cancel = CancellationToken::new();

    let handle = poller.start(cancel.clone());
    tokio::time::sleep(Duration::from_millis(120)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(hits(&server, LIST_PATH).await, 0);
}
