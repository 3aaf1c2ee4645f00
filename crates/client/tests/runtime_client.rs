use ric_client::RuntimeClient;
use ric_models::{Config, Invocation, RuntimeError};
use ric_testsupport::{MockInvocation, MockRuntimeApi, NextOutcome};
use std::time::Duration;

fn test_config(api: &MockRuntimeApi) -> Config {
    let mut config = Config::default();
    config.runtime.ip = api.ip();
    config.runtime.port = api.port();
    config.runtime.request_timeout_ms = 1000;
    config
}

fn sample_invocation(request_id: &str) -> Invocation {
    Invocation {
        request_id: request_id.to_string(),
        deadline_ms: 1_700_000_000_000,
        invoked_function_arn: "arn:aws:lambda:local:000000000000:function:f".to_string(),
        trace_id: "Root=1-abc".to_string(),
        client_context: None,
        cognito_identity: None,
    }
}

#[tokio::test]
async fn request_work_returns_invocation_and_payload() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    api.push_invocation(MockInvocation::new("100", b"{\"ping\":\"pong\"}".to_vec()))
        .await;

    let client = RuntimeClient::new(&test_config(&api)).unwrap();
    let (invocation, payload) = client.request_work().await.unwrap();

    assert_eq!(invocation.request_id, "100");
    assert_eq!(invocation.deadline_ms, 1_700_000_000_000);
    assert!(invocation
        .invoked_function_arn
        .starts_with("arn:aws:lambda:local"));
    assert!(!invocation.trace_id.is_empty());
    assert_eq!(payload, b"{\"ping\":\"pong\"}");
}

#[tokio::test]
async fn request_work_surfaces_missing_header() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    api.push_invocation(
        MockInvocation::new("101", b"{}".to_vec()).without_header("Lambda-Runtime-Deadline-Ms"),
    )
    .await;

    let client = RuntimeClient::new(&test_config(&api)).unwrap();
    let err = client.request_work().await.unwrap_err();
    assert_eq!(
        err,
        RuntimeError::InvocationMissingHeader("Lambda-Runtime-Deadline-Ms")
    );
}

#[tokio::test]
async fn request_work_surfaces_bad_status() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    api.push(NextOutcome::Status(500)).await;

    let client = RuntimeClient::new(&test_config(&api)).unwrap();
    let err = client.request_work().await.unwrap_err();
    assert_eq!(err, RuntimeError::BadStatusCode(500));
}

#[tokio::test]
async fn request_work_timeout_is_an_upstream_error() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    api.push(NextOutcome::Delay(Duration::from_millis(500))).await;

    let mut config = test_config(&api);
    config.runtime.request_timeout_ms = 50;
    let client = RuntimeClient::new(&config).unwrap();
    let err = client.request_work().await.unwrap_err();
    assert_eq!(err, RuntimeError::UpstreamError("timeout".to_string()));
}

#[tokio::test]
async fn unreachable_endpoint_is_an_upstream_error() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    let config = test_config(&api);
    drop(api);
    // Give the aborted server task a moment to release the listener.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = RuntimeClient::new(&config).unwrap();
    let err = client.request_work().await.unwrap_err();
    assert!(matches!(err, RuntimeError::UpstreamError(_)));
}

#[tokio::test]
async fn report_success_posts_response_bytes() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    let client = RuntimeClient::new(&test_config(&api)).unwrap();

    client
        .report_success(&sample_invocation("200"), Some(b"result"))
        .await
        .unwrap();

    let responses = api.responses().await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].request_id, "200");
    assert_eq!(responses[0].body, b"result");
}

#[tokio::test]
async fn report_success_without_body_posts_empty() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    let client = RuntimeClient::new(&test_config(&api)).unwrap();

    client
        .report_success(&sample_invocation("201"), None)
        .await
        .unwrap();

    let responses = api.responses().await;
    assert_eq!(responses.len(), 1);
    assert!(responses[0].body.is_empty());
}

#[tokio::test]
async fn report_failure_posts_function_error_json() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    let client = RuntimeClient::new(&test_config(&api)).unwrap();

    let error = anyhow::anyhow!("boom");
    client
        .report_failure(&sample_invocation("202"), &error)
        .await
        .unwrap();

    let errors = api.errors().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].request_id, "202");
    assert_eq!(
        String::from_utf8(errors[0].body.clone()).unwrap(),
        r#"{ "errorType": "FunctionError", "errorMessage": "boom" }"#
    );
}

#[tokio::test]
async fn report_init_error_posts_initialization_error_json() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    let client = RuntimeClient::new(&test_config(&api)).unwrap();

    let error = anyhow::anyhow!("cant_init");
    client.report_init_error(&error).await.unwrap();

    let init_errors = api.init_errors().await;
    assert_eq!(init_errors.len(), 1);
    assert_eq!(
        String::from_utf8(init_errors[0].clone()).unwrap(),
        r#"{ "errorType": "InitializationError", "errorMessage": "cant_init" }"#
    );
}

#[tokio::test]
async fn non_accepted_report_is_a_bad_status() {
    let api = MockRuntimeApi::spawn().await.unwrap();
    api.set_report_status(404).await;
    let client = RuntimeClient::new(&test_config(&api)).unwrap();

    let err = client
        .report_success(&sample_invocation("203"), Some(b"late"))
        .await
        .unwrap_err();
    assert_eq!(err, RuntimeError::BadStatusCode(404));
}
