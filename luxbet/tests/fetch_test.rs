//! Ordered-candidate fetch: transport failures fall through, HTTP answers are final.

mod common;

use std::time::Duration;

use common::{hits, test_config};
use luxbet::{LuxError, LuxHttpClient, RequestOptions, RetryPolicy};
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Ports nothing listens on.
const DEAD_A: &str = "http://127.0.0.1:1";
const DEAD_B: &str = "http://127.0.0.1:9";

fn client_for(base: &str, retry: RetryPolicy) -> LuxHttpClient {
    let mut config = test_config(base);
    config.retry = retry;
    LuxHttpClient::new(&config).unwrap()
}

fn retry(max_attempts: usize) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::from_millis(5),
        retry_on_timeout: true,
    }
}

async fn mount_games(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/public/games"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "games": [] })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_live_candidate_answers_and_later_ones_are_untouched() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_games(&a, 200).await;
    mount_games(&b, 200).await;
    let client = client_for(DEAD_A, retry(4));

    let opts = RequestOptions::new().fallbacks(vec![DEAD_B.to_string(), a.uri(), b.uri()]);
    let body: Value = client.get("/api/public/games", opts).await.unwrap();

    assert_eq!(body, json!({ "games": [] }));
    assert_eq!(hits(&a, "/api/public/games").await, 1);
    assert_eq!(hits(&b, "/api/public/games").await, 0);
}

#[tokio::test]
async fn test_http_error_is_final() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_games(&a, 500).await;
    mount_games(&b, 200).await;
    let client = client_for(&a.uri(), retry(3));

    let opts = RequestOptions::new().fallbacks(vec![b.uri()]);
    let err = client
        .get::<Value>("/api/public/games", opts)
        .await
        .unwrap_err();

    assert!(matches!(err, LuxError::Api { status: 500, .. }));
    assert_eq!(hits(&b, "/api/public/games").await, 0);
}

#[tokio::test]
async fn test_not_found_is_returned_not_retried() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/public/affiliate/dashboard"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Você não é um afiliado" })),
        )
        .mount(&a)
        .await;
    let client = client_for(&a.uri(), retry(3));

    let opts = RequestOptions::new().fallbacks(vec![b.uri()]);
    let err = client
        .get::<Value>("/api/public/affiliate/dashboard", opts)
        .await
        .unwrap_err();

    assert!(matches!(err, LuxError::NotFound(ref d) if d == "Você não é um afiliado"));
    assert!(b.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_all_candidates_dead_returns_transport_error() {
    let client = client_for(DEAD_A, retry(3));

    let opts = RequestOptions::new().fallbacks(vec![DEAD_B.to_string()]);
    let err = client
        .get::<Value>("/api/public/games", opts)
        .await
        .unwrap_err();

    assert!(matches!(err, LuxError::Transport { attempts: 2, .. }));
}

#[tokio::test]
async fn test_max_attempts_caps_the_walk() {
    let live = MockServer::start().await;
    mount_games(&live, 200).await;
    let client = client_for(DEAD_A, retry(2));

    // The live server sits third in line but only two candidates are tried.
    let opts = RequestOptions::new().fallbacks(vec![DEAD_B.to_string(), live.uri()]);
    let err = client
        .get::<Value>("/api/public/games", opts)
        .await
        .unwrap_err();

    assert!(matches!(err, LuxError::Transport { attempts: 2, .. }));
    assert_eq!(hits(&live, "/api/public/games").await, 0);
}

#[tokio::test]
async fn test_timeout_advances_to_next_candidate() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/public/games"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&slow)
        .await;
    mount_games(&fast, 200).await;
    let client = client_for(&slow.uri(), retry(2));

    let opts = RequestOptions::new()
        .timeout(Duration::from_millis(200))
        .fallbacks(vec![fast.uri()]);
    let body: Value = client.get("/api/public/games", opts).await.unwrap();

    assert_eq!(body["games"], json!([]));
}

#[tokio::test]
async fn test_timeout_is_final_when_not_retried() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/public/games"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&slow)
        .await;
    mount_games(&fast, 200).await;
    let client = client_for(
        &slow.uri(),
        RetryPolicy {
            retry_on_timeout: false,
            ..retry(2)
        },
    );

    let opts = RequestOptions::new()
        .timeout(Duration::from_millis(200))
        .fallbacks(vec![fast.uri()]);
    let err = client
        .get::<Value>("/api/public/games", opts)
        .await
        .unwrap_err();

    assert!(matches!(err, LuxError::Request(ref e) if e.is_timeout()));
    assert_eq!(hits(&fast, "/api/public/games").await, 0);
}

#[tokio::test]
async fn test_query_and_bearer_reach_the_fallback() {
    let live = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/bets"))
        .and(query_param("status_filter", "won"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&live)
        .await;
    let client = client_for(DEAD_A, retry(2));

    let opts = RequestOptions::new()
        .bearer("tok")
        .query("status_filter", "won")
        .fallbacks(vec![live.uri()]);
    let resp = client
        .request(Method::GET, "/api/auth/bets", opts)
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let seen = live.received_requests().await.unwrap();
    assert_eq!(
        seen[0].headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer tok"
    );
}

#[tokio::test]
async fn test_bets_all_filter_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/bets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "game_name": "Fortune Tiger", "amount": 2.0, "win_amount": 0.0, "status": "lost" }
        ])))
        .mount(&server)
        .await;
    let client = client_for(&server.uri(), retry(1));

    let bets = client.get_bets("tok", Some("all")).await.unwrap();

    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].display_name(), "Fortune Tiger");
    let seen = server.received_requests().await.unwrap();
    assert_eq!(seen[0].url.query(), None);
}
