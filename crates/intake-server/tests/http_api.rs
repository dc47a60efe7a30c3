//! HTTP API against the local storage backend and the rule classifier

use intake_classifier::RuleClassifier;
use intake_server::{api, AppState};
use intake_test_utils::{TempWorkspace, PUBLIC_URL};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::test::request;

const BOUNDARY: &str = "intake-test-boundary";
const PDF: &[u8] = b"%PDF-1.4\n%test\n";

fn state(ws: &TempWorkspace) -> AppState {
    AppState::new(ws.store(), ws.local_storage(), Arc::new(RuleClassifier::new()))
        .with_public_dir(ws.public_dir())
}

fn form(file: Option<(&str, &str, &[u8])>, student_id: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((name, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(id) = student_id {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"studentId\"\r\n\r\n{id}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(state: &AppState, body: Vec<u8>) -> (StatusCode, Value) {
    let res = request()
        .method("POST")
        .path("/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .reply(&api::routes(state.clone()))
        .await;
    (res.status(), serde_json::from_slice(res.body()).unwrap())
}

async fn send(state: &AppState, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = request().method(method).path(path);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let res = req.reply(&api::routes(state.clone())).await;
    let value = if res.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(res.body()).unwrap()
    };
    (res.status(), value)
}

#[tokio::test]
async fn upload_files_document_end_to_end() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, receipt) = upload(&state, form(Some(("ST102_Math_HW.pdf", "application/pdf", PDF)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["classification"], "CREATE_FOLDER: ST102\nTHEN_STORE: assignment");
    assert_eq!(receipt["action"], "createFolderThenStore");
    assert_eq!(receipt["studentId"], "ST102");
    assert_eq!(receipt["documentType"], "assignment");
    assert_eq!(receipt["storage"], "local");
    assert_eq!(receipt["folderId"], "mock-ST102");
    assert_eq!(receipt["student"]["driveFolderId"], "mock-ST102");
    assert_eq!(receipt["student"]["documents"]["assignmentLinks"].as_array().unwrap().len(), 1);

    let file_id = receipt["document"]["fileId"].as_str().unwrap();
    assert!(file_id.starts_with("mock-ST102/Assignments/"));
    let on_disk = state.storage.local().resolve(file_id).unwrap();
    assert_eq!(std::fs::read(on_disk).unwrap(), PDF);

    // The shareable link is served back by the same server
    let link = receipt["document"]["shareableLink"].as_str().unwrap();
    let path = link.strip_prefix(PUBLIC_URL).unwrap();
    let res = request().path(path).reply(&api::routes(state.clone())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), PDF);
}

#[tokio::test]
async fn second_upload_reuses_the_student_folder() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, _) = upload(&state, form(Some(("ST102_essay.pdf", "application/pdf", PDF)), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, receipt) = upload(
        &state,
        form(Some(("Fee_Receipt_Jan.pdf", "application/pdf", PDF)), Some("ST102")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["classification"], "STORE: ST102 → feeReceipt");
    assert_eq!(receipt["action"], "store");
    assert!(receipt["document"]["fileId"]
        .as_str()
        .unwrap()
        .starts_with("mock-ST102/Fee_Receipts/"));

    let (status, stats) = send(&state, "GET", "/api/students/ST102/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalDocuments"], 2);
    assert_eq!(stats["byType"]["assignment"], 1);
    assert_eq!(stats["byType"]["feeReceipt"], 1);
    assert_eq!(stats["hasDriveFolder"], true);

    let (_, list) = send(&state, "GET", "/api/students", None).await;
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn upload_without_any_student_id_is_rejected() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, body) = upload(&state, form(Some(("random_notes.pdf", "application/pdf", PDF)), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Could not determine student ID" }));

    let (_, list) = send(&state, "GET", "/api/students", None).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn upload_validation_errors() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, body) = upload(&state, form(None, Some("ST1"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = upload(
        &state,
        form(Some(("ST1_tool.exe", "application/x-msdownload", &b"MZ"[..])), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File type application/x-msdownload is not allowed");

    let (status, _) = upload(&state, form(Some(("ST1_hw.pdf", "application/pdf", &b""[..])), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generic_content_type_falls_back_to_extension() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, receipt) = upload(
        &state,
        form(Some(("ST707_ID_Card.png", "application/octet-stream", &b"\x89PNG"[..])), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["documentType"], "idCard");
}

#[tokio::test]
async fn student_crud_status_codes() {
    let ws = TempWorkspace::new();
    let state = state(&ws);
    let asha = json!({ "studentId": "ST200", "name": "Asha", "department": "Physics" });

    let (status, created) = send(&state, "POST", "/api/students", Some(asha.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["studentId"], "ST200");
    assert_eq!(created["department"], "Physics");

    let (status, _) = send(&state, "POST", "/api/students", Some(asha)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &state,
        "POST",
        "/api/students",
        Some(json!({ "studentId": "ST201", "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Lookup by record ID works too
    let record_id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&state, "GET", &format!("/api/students/{record_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Asha");

    let (status, updated) = send(
        &state,
        "PUT",
        "/api/students/ST200",
        Some(json!({ "name": "Asha Rao", "email": "asha@college.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Asha Rao");
    assert_eq!(updated["department"], "Physics");

    let (status, _) = send(&state, "PUT", "/api/students/ST200", Some(json!({ "email": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&state, "GET", "/api/students/ST999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) = send(&state, "DELETE", "/api/students/ST200", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["student"]["name"], "Asha Rao");

    let (status, _) = send(&state, "DELETE", "/api/students/ST200", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let res = request()
        .method("POST")
        .path("/api/students")
        .header("content-type", "application/json")
        .body("{ not json")
        .reply(&api::routes(state))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn removing_a_document_deletes_the_stored_file() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (_, receipt) = upload(&state, form(Some(("ST300_project.pdf", "application/pdf", PDF)), None)).await;
    let doc_id = receipt["document"]["id"].as_str().unwrap().to_string();
    let on_disk = state
        .storage
        .local()
        .resolve(receipt["document"]["fileId"].as_str().unwrap())
        .unwrap();
    assert!(on_disk.exists());

    let (status, _) = send(&state, "DELETE", &format!("/api/students/ST300/documents/transcript/{doc_id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/api/students/ST300/documents/assignment/{doc_id}");
    let (status, body) = send(&state, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileDeleted"], true);
    assert!(!on_disk.exists());

    let (_, documents) = send(&state, "GET", "/api/students/ST300/documents", None).await;
    assert_eq!(documents["assignmentLinks"], json!([]));

    let (status, _) = send(&state, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_matches_across_fields() {
    let ws = TempWorkspace::new();
    let store = ws.store();
    store.create(intake_test_utils::full_student("ST400", "Ravi Kumar")).await.unwrap();
    store
        .create(intake_test_utils::new_student("ST401", "Meena").with_department("Chemistry"))
        .await
        .unwrap();
    let state = state(&ws);

    let (status, body) = send(&state, "GET", "/api/search?q=computer", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "computer");
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["studentId"], "ST400");

    let (_, body) = send(&state, "GET", "/api/search?q=st40", None).await;
    assert_eq!(body["count"], 2);

    let (status, body) = send(&state, "GET", "/api/search", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn health_reports_backends() {
    let ws = TempWorkspace::new();
    let state = state(&ws);

    let (status, body) = send(&state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "local");
    assert_eq!(body["classifier"], "rules");
    assert_eq!(body["students"], 0);
    assert_eq!(body["version"], intake_server::VERSION);
}

#[tokio::test]
async fn api_token_guards_api_and_upload() {
    let ws = TempWorkspace::new();
    let state = state(&ws).with_api_token("s3cret");
    let routes = api::routes(state.clone());

    let res = request().path("/api/students").reply(&routes).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = request()
        .path("/api/students")
        .header("authorization", "Bearer wrong")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = request()
        .path("/api/students")
        .header("authorization", "Bearer s3cret")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let (status, _) = upload(&state, form(Some(("ST1_hw.pdf", "application/pdf", PDF)), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let res = request().path("/health").reply(&routes).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn frontend_and_unknown_routes() {
    let ws = TempWorkspace::new();
    std::fs::write(ws.public_dir().join("index.html"), "<h1>intake</h1>").unwrap();
    let state = state(&ws);
    let routes = api::routes(state);

    let res = request().path("/index.html").reply(&routes).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"<h1>intake</h1>");

    let res = request().path("/nope/missing").reply(&routes).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
