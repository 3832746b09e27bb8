//! Integration tests for `TelegramNotifier` using wiremock HTTP mocks.

use lmstock_core::{StockStatus, TelegramCredentials};
use lmstock_notify::{AlertItem, NotifyError, RunSummary, TelegramNotifier};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TelegramNotifier {
    let credentials = TelegramCredentials {
        bot_token: "123:abc".to_owned(),
        chat_id: "-1001".to_owned(),
    };
    TelegramNotifier::with_base_url(&credentials, 30, base_url)
        .expect("client construction should not fail")
        .with_retry(2, 0)
}

fn sent_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "ok": true,
        "result": { "message_id": 42 }
    }))
}

fn alert_item() -> AlertItem {
    AlertItem {
        branch_code: "ASB1".to_owned(),
        branch_name: "Surabaya Darmo".to_owned(),
        city: "Surabaya".to_owned(),
        weight_grams: 1.0,
        price_minor: Some(242_800_000),
        status: StockStatus::Available,
    }
}

#[tokio::test]
async fn check_connection_returns_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "id": 1, "first_name": "Stock Bot", "username": "lm_stock_bot" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let name = test_client(&server.uri()).check_connection().await.unwrap();
    assert_eq!(name, "lm_stock_bot");
}

#[tokio::test]
async fn check_connection_with_bad_token_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getMe"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "ok": false, "error_code": 401, "description": "Unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .check_connection()
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Api { error_code: Some(401), .. }));
}

#[tokio::test]
async fn send_message_posts_markdown_without_previews() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "-1001",
            "text": "hello",
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        })))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    let id = test_client(&server.uri()).send_message("hello").await.unwrap();
    assert_eq!(id, 42);
}

#[tokio::test]
async fn stock_alert_is_grouped_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_string_contains("Surabaya Darmo"))
        .and(body_string_contains("Rp 2.4M"))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    let sent = test_client(&server.uri())
        .send_stock_alert(&[alert_item()])
        .await
        .unwrap();
    assert!(sent);
}

#[tokio::test]
async fn empty_stock_alert_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sent_ok())
        .expect(0)
        .mount(&server)
        .await;

    let sent = test_client(&server.uri())
        .send_stock_alert(&[])
        .await
        .unwrap();
    assert!(!sent);
}

#[tokio::test]
async fn summary_without_availability_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sent_ok())
        .expect(0)
        .mount(&server)
        .await;

    let summary = RunSummary {
        branches_checked: 3,
        products_scanned: 12,
        ..RunSummary::default()
    };
    let sent = test_client(&server.uri())
        .send_summary_report(&summary)
        .await
        .unwrap();
    assert!(!sent);
}

#[tokio::test]
async fn rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 0",
            "parameters": { "retry_after": 0 }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(sent_ok())
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .send_error_notification("all branches failed", "check run")
        .await
        .expect("second attempt should succeed");
}

#[tokio::test]
async fn chat_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ok": false, "error_code": 400, "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .send_message("hi")
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Api { error_code: Some(400), .. }));
}
