/// CRM push client tests against a mocked CRM API
/// Verifies outcome classification, retry exhaustion, and the skip path
use std::time::Duration;

use lead_capture_api::config::Config;
use lead_capture_api::crm_client::{CrmClient, PushOutcome, RetryPolicy};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a test config pointing at the mock CRM
fn create_test_config(crm_api_base: String) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        app_name: "lead-capture-api-test".to_string(),
        crm_api_base,
        crm_token: Some("test_token".to_string()),
        crm_tag_id: Some("tag-42".to_string()),
        crm_timeout_secs: 8,
    }
}

/// Zero-delay schedule so retry tests finish instantly
fn no_backoff() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_step: Duration::ZERO,
    }
}

fn client_for(config: &Config) -> CrmClient {
    CrmClient::new(config).unwrap().with_policy(no_backoff())
}

#[tokio::test]
async fn test_push_delivered_on_created() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .and(header("Authorization", "Bearer test_token"))
        .and(body_partial_json(serde_json::json!({
            "email": "user@example.com",
            "tags": ["tag-42"]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let outcome = client_for(&config).push("user@example.com", Some("profil_a")).await;

    assert_eq!(outcome, PushOutcome::Delivered { status: 201 });
}

#[tokio::test]
async fn test_push_conflict_treated_as_delivered() {
    let mock_server = MockServer::start().await;

    // 409 means the contact already exists; a single attempt, no retries
    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let outcome = client_for(&config).push("dup@example.com", None).await;

    assert_eq!(outcome, PushOutcome::Delivered { status: 409 });
}

#[tokio::test]
async fn test_push_failed_after_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let outcome = client_for(&config).push("user@example.com", None).await;

    match outcome {
        PushOutcome::Failed { error } => {
            assert!(error.contains("HTTP 500"), "unexpected error: {}", error);
            assert!(error.contains("upstream exploded"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_push_recovers_after_transient_failures() {
    let mock_server = MockServer::start().await;

    // First two attempts hit a 503, the third lands
    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let outcome = client_for(&config).push("user@example.com", None).await;

    assert_eq!(outcome, PushOutcome::Delivered { status: 200 });
}

#[tokio::test]
async fn test_push_skipped_without_token() {
    let mock_server = MockServer::start().await;

    // No network call at all when the token is missing
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(mock_server.uri());
    config.crm_token = None;

    let outcome = client_for(&config).push("user@example.com", None).await;

    assert_eq!(
        outcome,
        PushOutcome::Skipped {
            reason: "skipped_missing_config".to_string()
        }
    );
}

#[tokio::test]
async fn test_push_skipped_without_tag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(mock_server.uri());
    config.crm_tag_id = None;

    let outcome = client_for(&config).push("user@example.com", None).await;

    assert!(matches!(outcome, PushOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_push_error_detail_is_bounded() {
    let mock_server = MockServer::start().await;

    let huge_body = "x".repeat(4_000);
    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(500).set_body_string(huge_body))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let outcome = client_for(&config).push("user@example.com", None).await;

    match outcome {
        PushOutcome::Failed { error } => {
            assert!(error.chars().count() <= 500, "detail not truncated: {} chars", error.len());
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_push_transport_error_exhausts_retries() {
    // Nothing listens on port 9; every attempt is a connection error
    let config = create_test_config("http://127.0.0.1:9".to_string());
    let outcome = client_for(&config).push("user@example.com", None).await;

    assert!(matches!(outcome, PushOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_concurrent_pushes_share_one_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/public/v1/contacts"))
        .respond_with(ResponseTemplate::new(201))
        .expect(10)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = client_for(&config);

    // Fire 10 concurrent pushes through clones of the same client
    let mut handles = vec![];
    for i in 0..10 {
        let client_clone = client.clone();
        let handle = tokio::spawn(async move {
            client_clone
                .push(&format!("user{}@example.com", i), None)
                .await
        });
        handles.push(handle);
    }

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert_eq!(outcome, PushOutcome::Delivered { status: 201 });
    }
}
