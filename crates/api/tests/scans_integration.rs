//! Integration tests for the scan and offline sync endpoints.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{
    at, json_request_with_auth, parse_response_body, test_config, TestApp,
};
use domain::models::{ScanStatus, ValidityWindow};
use serde_json::json;
use tower::ServiceExt;

fn scan_body(identifier: &str, gate: &str) -> serde_json::Value {
    json!({ "ticketIdentifier": identifier, "gateName": gate })
}

#[tokio::test]
async fn test_scan_success() {
    let app = TestApp::new();
    let details = app.seed_ticket("TKT-1001", ValidityWindow::unbounded());

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-1001", "Gate A"),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["qrId"], "TKT-1001");
    assert_eq!(body["ticketId"], details.ticket.id.to_string());
    assert_eq!(body["userEmail"], details.holder.email);
    assert_eq!(body["eventName"], "Harbour Lights Festival");
    assert_eq!(body["gateName"], "Gate A");
    assert_eq!(body["scannedAt"], "2026-06-01T10:00:00Z");

    assert_eq!(
        app.store.ticket("TKT-1001").unwrap().scan_status,
        ScanStatus::Used
    );
}

#[tokio::test]
async fn test_scan_accepts_structured_payload() {
    let app = TestApp::new();
    app.seed_ticket("TKT-1002", ValidityWindow::unbounded());

    let payload = json!({ "qrId": "TKT-1002", "eventId": "launch" }).to_string();
    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body(&payload, "Gate A"),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_gate_scenario() {
    let app = TestApp::new();
    app.seed_ticket("TKT-2001", ValidityWindow::unbounded());
    let token = app.staff_token();

    let scan = |gate: &str| {
        json_request_with_auth(
            "POST",
            "/api/v1/scans",
            scan_body("TKT-2001", gate),
            &token,
        )
    };

    let response = app.router.clone().oneshot(scan("Gate A")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.clock.set(at(10, 0, 30));
    let response = app.router.clone().oneshot(scan("Gate A")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "duplicate-scan");
    assert_eq!(body["originalScanTime"], "2026-06-01T10:00:00Z");
    assert_eq!(body["gateName"], "Gate A");

    app.clock.set(at(10, 5, 0));
    let response = app.router.clone().oneshot(scan("Gate B")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "already-used");
    assert_eq!(body["originalScanTime"], "2026-06-01T10:00:00Z");
    assert_eq!(body["originalGate"], "Gate A");

    assert_eq!(app.store.entries().len(), 1);
}

#[tokio::test]
async fn test_configured_duplicate_window() {
    let mut config = test_config();
    config.checkin.duplicate_window_secs = 5;
    let app = TestApp::with_config(config);
    app.seed_ticket("TKT-2002", ValidityWindow::unbounded());
    let token = app.staff_token();

    let request = || {
        json_request_with_auth(
            "POST",
            "/api/v1/scans",
            scan_body("TKT-2002", "Gate A"),
            &token,
        )
    };
    app.router.clone().oneshot(request()).await.unwrap();

    app.clock.advance(Duration::seconds(10));
    let response = app.router.clone().oneshot(request()).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "already-used");
}

#[tokio::test]
async fn test_scan_expired() {
    let app = TestApp::new();
    let window = ValidityWindow::new(Some(at(6, 0, 0)), Some(at(9, 59, 59))).unwrap();
    app.seed_ticket("TKT-3001", window);

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-3001", "Gate A"),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "expired");
    assert_eq!(
        app.store.ticket("TKT-3001").unwrap().scan_status,
        ScanStatus::Unused
    );
}

#[tokio::test]
async fn test_scan_unknown_ticket() {
    let app = TestApp::new();

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-404", "Gate A"),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "invalid");
}

#[tokio::test]
async fn test_scan_store_failure() {
    let app = TestApp::new();
    app.seed_ticket("TKT-5001", ValidityWindow::unbounded());
    app.store.fail_ticket("TKT-5001");

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-5001", "Gate A"),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("retry"));
}

#[tokio::test]
async fn test_scan_blank_gate_rejected() {
    let app = TestApp::new();
    app.seed_ticket("TKT-6001", ValidityWindow::unbounded());

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-6001", "  "),
        &app.staff_token(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(app.store.entries().is_empty());
}

#[tokio::test]
async fn test_scan_requires_token() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/scans")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(
            scan_body("TKT-1", "Gate A").to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = json_request_with_auth(
        "POST",
        "/api/v1/scans",
        scan_body("TKT-1", "Gate A"),
        "not-a-jwt",
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_offline_sync_earliest_wins() {
    let app = TestApp::new();
    app.seed_ticket("TKT-7001", ValidityWindow::unbounded());

    let body = json!({
        "offlineScans": [
            { "ticketIdentifier": "TKT-7001", "gateName": "Gate D", "scannedAt": "2026-06-01T09:05:00Z" },
            { "ticketIdentifier": "TKT-7001", "gateName": "Gate C", "scannedAt": "2026-06-01T09:00:00Z" }
        ]
    });
    let request =
        json_request_with_auth("POST", "/api/v1/scans/offline-sync", body, &app.staff_token());
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = parse_response_body(response).await;
    assert_eq!(report["synced"].as_array().unwrap().len(), 1);
    assert_eq!(report["synced"][0]["scannedAt"], "2026-06-01T09:00:00Z");
    assert_eq!(report["synced"][0]["reason"], "synced");
    assert_eq!(report["duplicates"].as_array().unwrap().len(), 1);
    assert_eq!(
        report["duplicates"][0]["reason"],
        "already used at different time/location"
    );
    assert!(report["failed"].as_array().unwrap().is_empty());

    let ticket = app.store.ticket("TKT-7001").unwrap();
    assert_eq!(ticket.scanned_gate.as_deref(), Some("Gate C"));
    let entries = app.store.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].scanned_offline);
}

#[tokio::test]
async fn test_offline_sync_replay_is_idempotent() {
    let app = TestApp::new();
    app.seed_ticket("TKT-7002", ValidityWindow::unbounded());
    app.seed_ticket("TKT-7003", ValidityWindow::unbounded());
    let token = app.staff_token();

    let body = json!({
        "offlineScans": [
            { "ticketIdentifier": "TKT-7002", "gateName": "Gate C", "scannedAt": "2026-06-01T09:00:00Z" },
            { "ticketIdentifier": "TKT-7003", "gateName": "Gate C", "scannedAt": "2026-06-01T09:01:00Z" },
            { "ticketIdentifier": "TKT-missing", "gateName": "Gate C", "scannedAt": "2026-06-01T09:02:00Z" }
        ]
    });

    let first = app
        .router
        .clone()
        .oneshot(json_request_with_auth(
            "POST",
            "/api/v1/scans/offline-sync",
            body.clone(),
            &token,
        ))
        .await
        .unwrap();
    let first = parse_response_body(first).await;
    assert_eq!(first["synced"].as_array().unwrap().len(), 2);
    assert_eq!(first["failed"][0]["reason"], "ticket not found");

    let second = app
        .router
        .clone()
        .oneshot(json_request_with_auth(
            "POST",
            "/api/v1/scans/offline-sync",
            body,
            &token,
        ))
        .await
        .unwrap();
    let second = parse_response_body(second).await;
    assert!(second["synced"].as_array().unwrap().is_empty());
    assert_eq!(second["duplicates"].as_array().unwrap().len(), 2);
    assert_eq!(second["duplicates"][0]["reason"], "already synced");
    assert_eq!(second["failed"].as_array().unwrap().len(), 1);

    assert_eq!(app.store.entries().len(), 2);
}

#[tokio::test]
async fn test_offline_sync_bad_timestamp_fails_only_that_record() {
    let app = TestApp::new();
    app.seed_ticket("TKT-9001", ValidityWindow::unbounded());
    app.seed_ticket("TKT-9002", ValidityWindow::unbounded());

    let body = json!({
        "offlineScans": [
            { "ticketIdentifier": "TKT-9001", "gateName": "Gate C", "scannedAt": "2026-06-01T09:00:00Z" },
            { "ticketIdentifier": "TKT-9002", "gateName": "Gate C", "scannedAt": "not-a-time" }
        ]
    });
    let request =
        json_request_with_auth("POST", "/api/v1/scans/offline-sync", body, &app.staff_token());
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = parse_response_body(response).await;
    assert_eq!(report["synced"].as_array().unwrap().len(), 1);
    assert_eq!(report["synced"][0]["ticketIdentifier"], "TKT-9001");
    assert_eq!(report["failed"].as_array().unwrap().len(), 1);
    assert_eq!(report["failed"][0]["ticketIdentifier"], "TKT-9002");
    assert_eq!(report["failed"][0]["reason"], "invalid record");
    assert!(report["failed"][0]["scannedAt"].is_null());

    assert_eq!(app.store.entries().len(), 1);
    assert_eq!(
        app.store.ticket("TKT-9002").unwrap().scan_status,
        ScanStatus::Unused
    );
}

#[tokio::test]
async fn test_offline_sync_batch_limits() {
    let mut config = test_config();
    config.limits.max_offline_batch_size = 2;
    let app = TestApp::with_config(config);
    let token = app.staff_token();

    let empty = json_request_with_auth(
        "POST",
        "/api/v1/scans/offline-sync",
        json!({ "offlineScans": [] }),
        &token,
    );
    let response = app.router.clone().oneshot(empty).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let record = json!({ "ticketIdentifier": "TKT-1", "gateName": "Gate C", "scannedAt": "2026-06-01T09:00:00Z" });
    let oversized = json_request_with_auth(
        "POST",
        "/api/v1/scans/offline-sync",
        json!({ "offlineScans": [record.clone(), record.clone(), record] }),
        &token,
    );
    let response = app.router.clone().oneshot(oversized).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("at most 2"));
}
