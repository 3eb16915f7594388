//! Chat endpoint integration tests.
//!
//! Run with: `cargo test -p casedesk-api --test chat_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{api_path, setup_test_app, setup_test_app_with, TestOptions, DOCX};
use serde_json::{json, Value};

#[tokio::test]
async fn test_chat_stores_uploaded_file_through_tool() {
    let app = setup_test_app().await;

    let part = Part::bytes(bytes::Bytes::from(vec![5u8; 512]))
        .file_name("document.docx")
        .mime_type(DOCX);
    let form = MultipartForm::new()
        .add_part("file", part)
        .add_text("conversation_id", "chat-1");
    let upload = app
        .client()
        .post(&api_path("/files/upload"))
        .add_header("Authorization", app.bearer())
        .multipart(form)
        .await;
    assert_eq!(upload.status_code(), 200);

    app.model
        .push_tool_use("toolu_1", "store_files", json!({"client_name": "Sally Smith"}))
        .push_text("I saved document.docx to Sally Smith's file.");

    let response = app
        .client()
        .post(&api_path("/chat"))
        .add_header("Authorization", app.bearer())
        .json(&json!({
            "conversation_id": "chat-1",
            "messages": [{"role": "user", "content": "Please save this for Sally Smith"}]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let reply: Value = response.json();
    assert_eq!(reply["reply"], "I saved document.docx to Sally Smith's file.");
    assert_eq!(reply["tool_calls"][0]["name"], "store_files");
    assert_eq!(reply["tool_calls"][0]["is_error"], false);
    assert_eq!(reply["file_context"]["source"], "promoted");

    let rows = app.records.files();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].client_name, "Sally Smith");
    assert!(rows[0].uploaded_by.is_some());

    // The model was told about the staged upload before it answered
    let first = &app.model.requests()[0];
    assert!(first.system.contains("document.docx (document)"));
}

#[tokio::test]
async fn test_chat_without_model_is_configuration_error() {
    let app = setup_test_app_with(TestOptions {
        model_configured: false,
        ..TestOptions::default()
    })
    .await;

    let response = app
        .client()
        .post(&api_path("/chat"))
        .add_header("Authorization", app.bearer())
        .json(&json!({"messages": [{"role": "user", "content": "hello"}]}))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_chat_provider_failure_is_bad_gateway() {
    let app = setup_test_app().await;
    app.model.push_error("status 529: overloaded_error");

    let response = app
        .client()
        .post(&api_path("/chat"))
        .add_header("Authorization", app.bearer())
        .json(&json!({"messages": [{"role": "user", "content": "hello"}]}))
        .await;

    assert_eq!(response.status_code(), 502);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert!(!body["error"].as_str().unwrap().contains("529"));
}

#[tokio::test]
async fn test_chat_rejects_conversation_not_ending_with_user() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post(&api_path("/chat"))
        .add_header("Authorization", app.bearer())
        .json(&json!({"messages": [{"role": "assistant", "content": "Hi, how can I help?"}]}))
        .await;

    assert_eq!(response.status_code(), 400);
}
