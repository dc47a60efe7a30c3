//! Hosted classifier against a local chat-completions endpoint.

use intake_classifier::{
    ChatCompletion, ClassificationRequest, Classifier, ClassifierKind, LlmClassifier, LlmConfig,
    TextCompletion,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;
use warp::Filter;

type Captured = Arc<Mutex<Vec<(String, Value)>>>;

/// Start an endpoint that answers every request with `content` and `status`
fn spawn_endpoint(content: &'static str, status: StatusCode) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let route = warp::post()
        .and(warp::path!("v1" / "chat" / "completions"))
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .map(move |auth: String, body: Value| {
            sink.lock().unwrap().push((auth, body));
            let reply = json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            });
            warp::reply::with_status(warp::reply::json(&reply), status)
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (format!("http://{addr}/v1/chat/completions"), captured)
}

fn config(endpoint: &str) -> LlmConfig {
    LlmConfig::new()
        .with_api_key("sk-test")
        .with_endpoint(endpoint)
        .with_model("test-model")
}

#[tokio::test]
async fn completion_sends_key_model_and_prompt() {
    let (endpoint, captured) = spawn_endpoint("STORE: ST1 → assignment", StatusCode::OK);
    let completion = ChatCompletion::new(&config(&endpoint)).unwrap();

    let text = completion.complete("system", "user prompt").await.unwrap();
    assert_eq!(text, "STORE: ST1 → assignment");

    let calls = captured.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (auth, body) = &calls[0];
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "user prompt");
    assert_eq!(body["temperature"], 0.0);
}

#[tokio::test]
async fn classifier_uses_model_decision() {
    let (endpoint, _) = spawn_endpoint("CREATE_FOLDER: ST77\nTHEN_STORE: certificate", StatusCode::OK);
    let classifier = LlmClassifier::new(ChatCompletion::new(&config(&endpoint)).unwrap());
    assert_eq!(classifier.kind(), ClassifierKind::Llm);

    let response = classifier
        .classify(&ClassificationRequest::new("scan_0001.pdf"))
        .await;
    assert_eq!(
        response.to_string(),
        "CREATE_FOLDER: ST77\nTHEN_STORE: certificate"
    );
}

#[tokio::test]
async fn server_error_falls_back_to_rules() {
    let (endpoint, captured) = spawn_endpoint("", StatusCode::INTERNAL_SERVER_ERROR);
    let classifier = LlmClassifier::new(ChatCompletion::new(&config(&endpoint)).unwrap());

    let response = classifier
        .classify(&ClassificationRequest::new("ST102_Math_HW.pdf").with_existing_folder("ST102"))
        .await;
    assert_eq!(response.to_string(), "STORE: ST102 → assignment");
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_completion_is_an_error() {
    let (endpoint, _) = spawn_endpoint("   ", StatusCode::OK);
    let completion = ChatCompletion::new(&config(&endpoint)).unwrap();
    assert!(completion.complete("s", "p").await.is_err());
}

#[tokio::test]
async fn unreachable_endpoint_falls_back_to_rules() {
    // Port 9 (discard) on localhost is closed in test environments
    let classifier =
        LlmClassifier::new(ChatCompletion::new(&config("http://127.0.0.1:9/v1/chat/completions")).unwrap());

    let response = classifier
        .classify(&ClassificationRequest::new("Fee_Receipt_Jan.pdf").with_student_id("ST105"))
        .await;
    assert_eq!(
        response.to_string(),
        "CREATE_FOLDER: ST105\nTHEN_STORE: feeReceipt"
    );
}

#[test]
fn missing_key_cannot_build_client() {
    assert!(ChatCompletion::new(&LlmConfig::new()).is_err());
}
