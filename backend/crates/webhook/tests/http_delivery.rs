//! Deliveries over real HTTP against a mock receiver.

use kernel::id::{ProjectId, WebhookId};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use webhook::{
    ReqwestTransport, RetryPolicy, WebhookConfig, WebhookDispatcher, WebhookRecord,
    verify_signature,
};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "whsec_integration";

fn dispatcher(max_attempts: u32, timeout: Duration) -> WebhookDispatcher<ReqwestTransport> {
    let config = WebhookConfig::default()
        .with_retry(RetryPolicy::new(
            max_attempts,
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
        .with_request_timeout(timeout);
    let transport = ReqwestTransport::from_config(&config).unwrap();
    WebhookDispatcher::new(Arc::new(transport), Arc::new(config))
}

fn webhook(url: String) -> WebhookRecord {
    WebhookRecord {
        id: WebhookId::new(),
        project_id: ProjectId::new(),
        url,
        secret: SECRET.into(),
        events: Default::default(),
        is_active: true,
    }
}

/// Receiver errors twice, then accepts.
#[tokio::test]
async fn test_retries_until_receiver_accepts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let hook = webhook(format!("{}/hooks", server.uri()));
    let outcome = dispatcher(5, Duration::from_secs(5))
        .deliver_with_retries(&hook, "feedback.created", json!({"id": 42}))
        .await
        .unwrap();

    assert!(outcome.success);
    let statuses: Vec<Option<u16>> = outcome.attempts.iter().map(|a| a.status_code).collect();
    assert_eq!(statuses, vec![Some(500), Some(500), Some(202)]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

/// Receiver can verify the signature over the bytes it got.
#[tokio::test]
async fn test_receiver_verifies_signature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks"))
        .and(header_exists("x-webhook-signature"))
        .and(header_exists("x-webhook-timestamp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let hook = webhook(format!("{}/hooks", server.uri()));
    let outcome = dispatcher(1, Duration::from_secs(5))
        .deliver_with_retries(&hook, "survey.completed", json!({"surveyId": "s-9"}))
        .await
        .unwrap();
    assert!(outcome.success);

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let signature = request
        .headers
        .get("x-webhook-signature")
        .unwrap()
        .to_str()
        .unwrap();

    assert!(verify_signature(SECRET, &request.body, signature));
    assert_eq!(request.headers.get("content-type").unwrap(), "application/json");

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["event"], "survey.completed");
    assert_eq!(body["payload"]["surveyId"], "s-9");
    assert_eq!(body["id"], outcome.event_id.to_string());
}

/// Redirects are failed attempts, not followed.
#[tokio::test]
async fn test_redirect_is_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let hook = webhook(format!("{}/hooks", server.uri()));
    let outcome = dispatcher(2, Duration::from_secs(5))
        .deliver_with_retries(&hook, "feedback.created", json!({}))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.attempt_count(), 2);
    assert!(outcome.attempts.iter().all(|a| a.status_code == Some(302)));
}

/// Slow receivers count as timed-out attempts.
#[tokio::test]
async fn test_slow_receiver_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let hook = webhook(format!("{}/hooks", server.uri()));
    let outcome = dispatcher(1, Duration::from_millis(100))
        .deliver_with_retries(&hook, "feedback.created", json!({}))
        .await
        .unwrap();

    assert!(!outcome.success);
    let attempt = outcome.last_attempt().unwrap();
    assert_eq!(attempt.status_code, None);
    assert!(attempt.error_message.as_deref().unwrap().contains("timed out"));
}

/// Nothing listening: transport errors, no status code.
#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let hook = webhook(format!("http://{addr}/hooks"));
    let outcome = dispatcher(2, Duration::from_secs(2))
        .deliver_with_retries(&hook, "feedback.created", json!({}))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.attempt_count(), 2);
    assert!(outcome.attempts.iter().all(|a| a.status_code.is_none()));
    assert!(outcome.attempts.iter().all(|a| a.error_message.is_some()));
}
