// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for photo submission.
//!
//! These run the full router with a fake vision model and check:
//! 1. Successful estimates are normalized, stored and returned
//! 2. Bad uploads are rejected before the model is called
//! 3. Staged files never outlive the request

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;

use common::{
    body_json, create_test_app, jpeg_bytes, multipart_body, salmon_reply, upload_request,
    FakeAnalyzer,
};

#[tokio::test]
async fn test_analyze_salmon_photo() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["detectedFood"], "Grilled salmon with rice");
    assert_eq!(body["confidence"], 0.92);
    assert_eq!(body["totalCalories"], 520.0);
    assert_eq!(body["protein"], 38.0);
    assert_eq!(body["carbs"], 45.0);
    assert_eq!(body["fats"], 18.0);
    assert_eq!(body["fiber"], 2.0);
    assert!(body["sugar"].is_null());
    assert!(body["sodium"].is_null());
    assert!(body["cholesterol"].is_null());
    assert_eq!(body["ingredients"], json!(["salmon", "white rice", "lemon"]));
    assert_eq!(body["portionSize"], "1 plate (350g)");
    assert!(body["userId"].is_null());
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert!(!body["imagePath"].as_str().unwrap().is_empty());
    assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));

    assert_eq!(app.analyzer.calls(), 1);
    assert_eq!(app.analyzer.last_mime().as_deref(), Some("image/jpeg"));
    assert_eq!(app.leftover_uploads(), 0);
}

#[tokio::test]
async fn test_missing_fields_are_defaulted() {
    let app = create_test_app(FakeAnalyzer::replying(json!({
        "detectedFood": "Green salad",
        "confidence": 0.7,
        "totalCalories": 150,
        "carbs": 12,
        "fats": 9,
        "portionSize": "1 bowl"
    })));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/png", b"\x89PNG fake"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["protein"], 0.0);
    assert_eq!(body["ingredients"], json!([]));
    assert_eq!(body["detectedFood"], "Green salad");
}

#[tokio::test]
async fn test_empty_model_reply_uses_all_defaults() {
    let app = create_test_app(FakeAnalyzer::replying(json!({})));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/webp", b"RIFF....WEBP"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["detectedFood"], "Unknown food");
    assert_eq!(body["portionSize"], "1 serving");
    assert_eq!(body["totalCalories"], 0.0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));
    let big = vec![0xABu8; 12 * 1024 * 1024];

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/jpeg", &big),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("File too large"));

    assert_eq!(app.analyzer.calls(), 0);
    assert_eq!(app.leftover_uploads(), 0);
}

#[tokio::test]
async fn test_missing_image_field_rejected() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("photo", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "No image file provided");
    assert_eq!(app.analyzer.calls(), 0);
}

#[tokio::test]
async fn test_non_image_rejected() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "application/pdf", b"%PDF-1.7"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Only image files are allowed");
    assert_eq!(app.analyzer.calls(), 0);
    assert_eq!(app.leftover_uploads(), 0);
}

#[tokio::test]
async fn test_non_multipart_request_rejected() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"image":"not a file"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(app.analyzer.calls(), 0);
}

#[tokio::test]
async fn test_provider_failure_returns_500_and_cleans_up() {
    let app = create_test_app(FakeAnalyzer::failing("model overloaded"));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "external_service_error");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to analyze food"));
    assert!(message.contains("model overloaded"));

    assert_eq!(app.analyzer.calls(), 1);
    assert_eq!(app.leftover_uploads(), 0);

    let list = app
        .send(
            Request::builder()
                .uri("/analyses")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(body_json(list).await, json!([]));
}

#[tokio::test]
async fn test_wrongly_typed_reply_is_schema_violation() {
    let app = create_test_app(FakeAnalyzer::replying(json!({
        "detectedFood": "Pizza",
        "totalCalories": "a lot"
    })));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "schema_violation");
    assert_eq!(app.leftover_uploads(), 0);
}

#[tokio::test]
async fn test_out_of_range_confidence_is_schema_violation() {
    let app = create_test_app(FakeAnalyzer::replying(json!({
        "detectedFood": "Pizza",
        "confidence": 1.5
    })));

    let response = app
        .send(upload_request(
            "/analyze",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "schema_violation");
}

#[tokio::test]
async fn test_owner_query_is_recorded() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/analyze?owner=user-42",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["userId"], "user-42");
}

#[tokio::test]
async fn test_legacy_upload_path() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/api/analyze-food",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.analyzer.calls(), 1);
}

#[tokio::test]
async fn test_large_extra_field_does_not_block_valid_image() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    // 2 MiB text field followed by an image just under the 10 MiB limit
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\n",
        common::BOUNDARY
    )
    .into_bytes();
    body.extend_from_slice(&vec![b'n'; 2 * 1024 * 1024]);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(&multipart_body(
        "image",
        "image/jpeg",
        &vec![0xABu8; 9 * 1024 * 1024 + 512 * 1024],
    ));

    let response = app.send(upload_request("/analyze", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.analyzer.calls(), 1);
    assert_eq!(app.leftover_uploads(), 0);
}

#[tokio::test]
async fn test_malformed_owner_query_returns_json_error() {
    let app = create_test_app(FakeAnalyzer::replying(salmon_reply()));

    let response = app
        .send(upload_request(
            "/analyze?owner=a&owner=b",
            multipart_body("image", "image/jpeg", &jpeg_bytes()),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_json(response).await["error"], "bad_request");
    assert_eq!(app.analyzer.calls(), 0);
}
