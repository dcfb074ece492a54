//! End-to-end resource lifecycles against a mock Resend API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hemmer_provider_resend::config::{API_KEY_ENV, BASE_URL_ENV};
use hemmer_provider_resend::testing::{
    assert_error_contains, assert_plan_changes_attribute, assert_plan_creates,
    assert_plan_no_changes, assert_plan_replaces, assert_warning_contains, ProviderTester,
    TestError,
};
use hemmer_provider_resend::{ProviderError, ProviderService, ResendProvider, UNKNOWN_VALUE};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn env(server: &MockServer, key: Option<&str>) -> HashMap<String, String> {
    let mut env = HashMap::from([(BASE_URL_ENV.to_string(), server.uri())]);
    if let Some(key) = key {
        env.insert(API_KEY_ENV.to_string(), key.to_string());
    }
    env
}

async fn configured(server: &MockServer) -> ProviderTester<ResendProvider> {
    let tester = ProviderTester::new(ResendProvider::with_env(env(server, Some("re_env"))));
    assert_ok!(tester.configure(Value::Null).await);
    tester
}

fn domain_body(region: &str) -> Value {
    json!({
        "id": "dom-1",
        "name": "mail.example.com",
        "created_at": "2023-03-28T17:12:02.059593+00:00",
        "status": "not_started",
        "region": region,
        "dns_provider": "Cloudflare",
        "records": [],
    })
}

async fn mount_domain_create(server: &MockServer, expected_body: Value, region: &str) {
    Mock::given(method("POST"))
        .and(path("/domains"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain_body(region)))
        .expect(1)
        .mount(server)
        .await;
}

// =========================================================================
// Credentials
// =========================================================================

#[tokio::test]
async fn configured_key_wins_over_environment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains/dom-1"))
        .and(header("authorization", "Bearer re_cfg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain_body("us-east-1")))
        .expect(1)
        .mount(&server)
        .await;

    let tester = ProviderTester::new(ResendProvider::with_env(env(&server, Some("re_env"))));
    assert_ok!(tester.configure(json!({"api_key": "re_cfg"})).await);
    assert_ok!(tester.read("resend_domain", json!({"id": "dom-1"})).await);
}

#[tokio::test]
async fn environment_key_used_when_config_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains/dom-1"))
        .and(header("authorization", "Bearer re_env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain_body("us-east-1")))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    assert_ok!(tester.read("resend_domain", json!({"id": "dom-1"})).await);
}

#[tokio::test]
async fn missing_key_is_reported() {
    let server = MockServer::start().await;
    let tester = ProviderTester::new(ResendProvider::with_env(env(&server, None)));

    let err = match assert_err!(tester.configure(json!({})).await) {
        TestError::Provider(err) => err,
        other => panic!("expected a provider error, got {}", other),
    };
    assert!(matches!(err, ProviderError::MissingApiKey));
    assert_error_contains(&[err.to_diagnostic()], "Missing API key");
    assert!(!tester.provider().is_configured());
}

#[tokio::test]
async fn pending_key_fails_before_environment() {
    let server = MockServer::start().await;
    let tester = ProviderTester::new(ResendProvider::with_env(env(&server, Some("re_env"))));

    let err = assert_err!(tester.configure(json!({"api_key": UNKNOWN_VALUE})).await);
    assert!(matches!(
        err,
        TestError::Provider(ProviderError::UnknownApiKey)
    ));
}

#[tokio::test]
async fn second_configure_keeps_first_client() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let diagnostics = assert_ok!(
        tester
            .provider()
            .configure(json!({"api_key": "re_other"}))
            .await
    );
    assert_warning_contains(&diagnostics, "already configured");
}

// =========================================================================
// resend_api_key
// =========================================================================

#[tokio::test]
async fn api_key_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api-keys"))
        .and(body_json(json!({
            "name": "ci",
            "permission": "sending_access",
            "domain_id": "dom-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dlrz4wq7-5f6a-4b1c-9d2e-8f7a6b5c4d3e",
            "token": "re_c1tpEyD8_NKFusih9vKVQknRAQfmFcWCv",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api-keys/dlrz4wq7-5f6a-4b1c-9d2e-8f7a6b5c4d3e"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let tester = configured(&server).await;

    let config = json!({
        "name": "ci",
        "permission": "sending_access",
        "domain_id": "dom-1",
    });
    let diagnostics = assert_ok!(
        tester
            .validate_resource_config("resend_api_key", config.clone())
            .await
    );
    assert!(diagnostics.is_empty());

    let plan = assert_ok!(tester.plan_create("resend_api_key", config.clone()).await);
    assert_plan_creates(&plan);
    assert_eq!(plan.planned_state["token"], UNKNOWN_VALUE);

    let state = assert_ok!(tester.create("resend_api_key", plan.planned_state).await);
    assert!(!state["id"].as_str().unwrap().is_empty());
    assert!(!state["token"].as_str().unwrap().is_empty());

    let read = assert_ok!(tester.read("resend_api_key", state.clone()).await);
    assert_eq!(read, state);

    for (attribute, value) in [
        ("name", json!("deploy")),
        ("permission", json!("full_access")),
        ("domain_id", json!("dom-2")),
    ] {
        let mut proposed = config.clone();
        proposed[attribute] = value;
        let plan = assert_ok!(
            tester
                .plan_update("resend_api_key", state.clone(), proposed)
                .await
        );
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, attribute);
    }

    assert_ok!(tester.lifecycle_delete("resend_api_key", state).await);
}

#[tokio::test]
async fn api_key_update_keeps_token() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let prior = json!({"id": "key-1", "token": "re_tok", "name": "ci"});
    let planned = json!({
        "id": "key-1",
        "token": UNKNOWN_VALUE,
        "name": "ci",
        "permission": null,
        "domain_id": null,
    });
    let state = assert_ok!(tester.update("resend_api_key", prior, planned).await);
    assert_eq!(state["token"], "re_tok");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_key_delete_of_missing_key_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api-keys/key-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "statusCode": 404,
            "name": "not_found",
            "message": "API key not found",
        })))
        .expect(1)
        .mount(&server)
        .await;
    let tester = configured(&server).await;

    assert_ok!(
        tester
            .delete("resend_api_key", json!({"id": "key-gone", "name": "ci"}))
            .await
    );
}

#[tokio::test]
async fn api_key_create_error_is_remote() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api-keys"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "statusCode": 422,
            "name": "validation_error",
            "message": "The `name` field must be a `string`.",
        })))
        .mount(&server)
        .await;
    let tester = configured(&server).await;

    let err = assert_err!(tester.create("resend_api_key", json!({"name": "ci"})).await);
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.summary, "Client Error");
    assert!(diagnostic
        .detail
        .unwrap()
        .starts_with("Unable to create key, got error:"));
}

#[tokio::test]
async fn import_api_key_sets_only_id() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let imported = assert_ok!(tester.import_resource("resend_api_key", "abc123").await);
    assert_eq!(imported.len(), 1);
    let state = imported[0].state.as_object().unwrap();
    assert_eq!(state["id"], "abc123");
    for (name, value) in state {
        if name != "id" {
            assert!(value.is_null(), "{} should be null", name);
        }
    }
    assert_warning_contains(&imported[0].diagnostics, "Partial import");
}

// =========================================================================
// resend_domain
// =========================================================================

#[tokio::test]
async fn domain_lifecycle() {
    let server = MockServer::start().await;
    mount_domain_create(
        &server,
        json!({"name": "mail.example.com", "region": "eu-west-1"}),
        "eu-west-1",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/domains/dom-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain_body("eu-west-1")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/domains/dom-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "domain",
            "id": "dom-1",
            "deleted": true,
        })))
        .expect(1)
        .mount(&server)
        .await;
    let tester = configured(&server).await;

    let state = assert_ok!(
        tester
            .lifecycle_create(
                "resend_domain",
                json!({"name": "mail.example.com", "region": "eu-west-1"}),
            )
            .await
    );
    assert_eq!(state["id"], "dom-1");
    assert_eq!(state["region"], "eu-west-1");
    assert_eq!(state["status"], "not_started");
    assert_eq!(state["dns_provider"], "Cloudflare");
    assert!(state["created_at"].is_string());

    let plan = assert_ok!(
        tester
            .plan_update(
                "resend_domain",
                state.clone(),
                json!({"name": "mail.example.com", "region": "sa-east-1"}),
            )
            .await
    );
    assert_plan_replaces(&plan);

    assert_ok!(tester.lifecycle_delete("resend_domain", state).await);
}

#[tokio::test]
async fn domain_region_defaults_on_server() {
    let server = MockServer::start().await;
    mount_domain_create(&server, json!({"name": "mail.example.com"}), "us-east-1").await;
    let tester = configured(&server).await;

    let state = assert_ok!(
        tester
            .create("resend_domain", json!({"name": "mail.example.com"}))
            .await
    );
    assert_eq!(state["region"], "us-east-1");

    let plan = assert_ok!(
        tester
            .plan_update(
                "resend_domain",
                state.clone(),
                json!({"name": "mail.example.com"}),
            )
            .await
    );
    assert_plan_no_changes(&plan);
    assert_eq!(plan.planned_state, state);
}

#[tokio::test]
async fn domain_update_is_unsupported() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let prior = json!({"id": "dom-1", "name": "mail.example.com", "region": "us-east-1"});
    let planned = json!({"id": "dom-1", "name": "mail.example.com", "region": "us-east-1"});
    let err = assert_err!(tester.update("resend_domain", prior, planned).await);
    assert!(matches!(
        err,
        ProviderError::Unsupported {
            resource_type: "resend_domain",
            operation: "update",
        }
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn domain_invalid_region_fails_validation() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let diagnostics = assert_ok!(
        tester
            .validate_resource_config(
                "resend_domain",
                json!({"name": "mail.example.com", "region": "ap-south-1"}),
            )
            .await
    );
    assert_error_contains(&diagnostics, "Invalid value for 'region'");
}

#[tokio::test]
async fn import_domain_then_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains/dom-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain_body("us-east-1")))
        .expect(1)
        .mount(&server)
        .await;
    let tester = configured(&server).await;

    let (state, diagnostics) = assert_ok!(tester.lifecycle_import("resend_domain", "dom-1").await);
    assert!(diagnostics.is_empty());
    assert_eq!(state["id"], "dom-1");
    assert_eq!(state["name"], "mail.example.com");
    assert_eq!(state["region"], "us-east-1");
    assert_eq!(state["status"], "not_started");
    assert_eq!(state["dns_provider"], "Cloudflare");
    assert!(state["created_at"].is_string());
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test]
async fn stop_cancels_in_flight_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/domains"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(domain_body("us-east-1"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    let tester = Arc::new(configured(&server).await);

    let task = tokio::spawn({
        let tester = Arc::clone(&tester);
        async move {
            tester
                .create("resend_domain", json!({"name": "mail.example.com"}))
                .await
        }
    });

    while server.received_requests().await.unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_ok!(tester.stop().await);

    let err = assert_err!(task.await.unwrap());
    assert!(matches!(
        err,
        ProviderError::Canceled {
            operation: "create domain"
        }
    ));
}
