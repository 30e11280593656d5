//! Probe, metrics and gateway listing endpoints.

mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "wellness-service");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn readiness_reports_missing_credentials_without_failing() {
    let app = TestApp::spawn_with_key(None).await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["modelProvider"], "missing credentials");
}

#[tokio::test]
async fn gateway_lists_all_endpoints() {
    let app = TestApp::spawn().await;

    let body: Value = app
        .client
        .get(&app.address)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let services = &body["services"];
    assert_eq!(services["event"], "/generate-event-recommendation");
    assert_eq!(services["meal"], "/analyze-meal");
    assert_eq!(services["daily"], "/analyze-daily");
    assert_eq!(services["health"], "/analyze-health");
    assert_eq!(services["coach"], "/coach");
}

#[tokio::test]
async fn metrics_endpoint_responds() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
}
