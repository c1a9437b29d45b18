#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use luxbet::storage::USER_TOKEN_KEY;
use luxbet::{
    AnalyticsEvent, AnalyticsSink, LuxClient, LuxConfig, MemoryTokenStore, RetryPolicy,
    TokenStore,
};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Sink that keeps every event for assertions.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<AnalyticsEvent>>);

impl Recorder {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl AnalyticsSink for Recorder {
    fn track(&self, event: AnalyticsEvent) {
        self.0.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub client: LuxClient,
    pub tokens: Arc<MemoryTokenStore>,
    pub sink: Arc<Recorder>,
}

pub fn test_config(base: &str) -> LuxConfig {
    let mut config = LuxConfig::for_base_url(base);
    config.retry = RetryPolicy {
        max_attempts: 4,
        backoff: Duration::from_millis(10),
        retry_on_timeout: true,
    };
    config.request_timeout = Duration::from_secs(5);
    config.refresh_interval = Duration::from_millis(30);
    config.notification_interval = Duration::from_millis(30);
    config.notification_dismiss = Duration::from_millis(30);
    config.deposit_poll_interval = Duration::from_millis(20);
    config
}

/// Anonymous client pointed at `server`.
pub fn harness(server: &MockServer) -> Harness {
    harness_with_token(server, None)
}

/// Client whose token store already holds `token`, as after a previous run.
pub fn harness_with_token(server: &MockServer, token: Option<&str>) -> Harness {
    let tokens = Arc::new(MemoryTokenStore::new());
    if let Some(token) = token {
        tokens.set(USER_TOKEN_KEY, token).unwrap();
    }
    let sink = Arc::new(Recorder::default());
    let client = LuxClient::new(test_config(&server.uri()), tokens.clone(), sink.clone()).unwrap();
    Harness {
        client,
        tokens,
        sink,
    }
}

pub fn profile_json(role: &str, balance: f64) -> Value {
    json!({
        "id": 7,
        "username": "maria",
        "email": "maria@example.com",
        "cpf": "12345678900",
        "phone": "+5511999990000",
        "role": role,
        "balance": balance,
        "is_active": true,
        "is_verified": true,
        "created_at": "2025-01-10T12:00:00",
        "updated_at": null
    })
}

/// Number of requests the server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}
