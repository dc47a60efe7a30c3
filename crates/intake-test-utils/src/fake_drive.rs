//! In-process fake of the drive REST API
//!
//! Covers only what the drive backend calls: folder search and create,
//! multipart upload, permission grants and delete. `set_failing(true)`
//! turns every response into a 503.

use bytes::Bytes;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

#[derive(Debug, Clone)]
pub struct FakeFolder {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    pub content: Bytes,
    pub shared: bool,
}

#[derive(Debug, Default)]
struct State {
    folders: Mutex<Vec<FakeFolder>>,
    files: Mutex<HashMap<String, FakeFile>>,
    failing: AtomicBool,
    requests: AtomicUsize,
    next_id: AtomicUsize,
}

impl State {
    fn mint(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Count the request; `Some` carries the refusal when it is rejected
    fn gate(&self, token: Option<&str>) -> Option<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Some(error(StatusCode::SERVICE_UNAVAILABLE, "backend unavailable"));
        }
        let expected = format!("Bearer {}", FakeDrive::TOKEN);
        if token != Some(expected.as_str()) {
            return Some(error(StatusCode::UNAUTHORIZED, "invalid credentials"));
        }
        None
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({ "error": { "code": status.as_u16(), "message": message } })),
        status,
    )
    .into_response()
}

/// Fake drive server bound to an ephemeral local port
#[derive(Debug, Clone)]
pub struct FakeDrive {
    addr: SocketAddr,
    state: Arc<State>,
}

impl FakeDrive {
    /// Bearer token the fake accepts
    pub const TOKEN: &'static str = "fake-drive-token";

    /// Start the server on the current tokio runtime
    pub fn spawn() -> Self {
        let state = Arc::new(State::default());
        let (addr, server) = warp::serve(routes(state.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn folders(&self) -> Vec<FakeFolder> {
        self.state.folders.lock().clone()
    }

    pub fn folder_named(&self, name: &str) -> Option<FakeFolder> {
        self.state.folders.lock().iter().find(|f| f.name == name).cloned()
    }

    pub fn files(&self) -> Vec<FakeFile> {
        self.state.files.lock().values().cloned().collect()
    }

    pub fn file(&self, id: &str) -> Option<FakeFile> {
        self.state.files.lock().get(id).cloned()
    }
}

fn routes(
    state: Arc<State>,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone + Send + Sync + 'static {
    let with_state = {
        let state = state.clone();
        warp::any().map(move || state.clone())
    };
    let auth = warp::header::optional::<String>("authorization");

    let search = warp::get()
        .and(warp::path!("drive" / "v3" / "files"))
        .and(auth.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state.clone())
        .map(search_folders);

    let create = warp::post()
        .and(warp::path!("drive" / "v3" / "files"))
        .and(auth.clone())
        .and(warp::body::json())
        .and(with_state.clone())
        .map(create_folder);

    let upload = warp::post()
        .and(warp::path!("upload" / "drive" / "v3" / "files"))
        .and(auth.clone())
        .and(warp::header::<String>("content-type"))
        .and(warp::body::bytes())
        .and(with_state.clone())
        .map(upload_file);

    let share = warp::post()
        .and(warp::path!("drive" / "v3" / "files" / String / "permissions"))
        .and(auth.clone())
        .and(with_state.clone())
        .map(share_file);

    let delete = warp::delete()
        .and(warp::path!("drive" / "v3" / "files" / String))
        .and(auth)
        .and(with_state)
        .map(delete_file);

    search
        .or(create)
        .unify()
        .or(upload)
        .unify()
        .or(share)
        .unify()
        .or(delete)
        .unify()
}

fn quoted_value(pattern: &str, query: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(query)
        .map(|c| c[1].replace("\\'", "'").replace("\\\\", "\\"))
}

fn search_folders(auth: Option<String>, params: HashMap<String, String>, state: Arc<State>) -> Response {
    if let Some(denied) = state.gate(auth.as_deref()) {
        return denied;
    }
    let query = params.get("q").cloned().unwrap_or_default();
    let name = quoted_value(r"name = '((?:[^'\\]|\\.)*)'", &query);
    let parent = quoted_value(r"'((?:[^'\\]|\\.)*)' in parents", &query);

    let files: Vec<Value> = state
        .folders
        .lock()
        .iter()
        .filter(|f| Some(&f.name) == name.as_ref())
        .filter(|f| parent.is_none() || f.parent == parent)
        .map(|f| json!({ "id": f.id, "name": f.name }))
        .take(1)
        .collect();
    warp::reply::json(&json!({ "files": files })).into_response()
}

fn create_folder(auth: Option<String>, body: Value, state: Arc<State>) -> Response {
    if let Some(denied) = state.gate(auth.as_deref()) {
        return denied;
    }
    let Some(name) = body["name"].as_str() else {
        return error(StatusCode::BAD_REQUEST, "name required");
    };
    let folder = FakeFolder {
        id: state.mint("fld"),
        name: name.to_string(),
        parent: body["parents"][0].as_str().map(str::to_string),
    };
    let reply = json!({ "id": folder.id });
    state.folders.lock().push(folder);
    warp::reply::json(&reply).into_response()
}

/// Split a `multipart/related` body into (metadata, content)
fn split_related(content_type: &str, body: &Bytes) -> Option<(Value, Bytes)> {
    let boundary = content_type.split("boundary=").nth(1)?.trim();
    let delimiter = format!("--{boundary}");
    let text = String::from_utf8_lossy(body);

    let first = text.find(&delimiter)?;
    let meta_start = first + text[first..].find("\r\n\r\n")? + 4;
    let meta_end = meta_start + text[meta_start..].find(&format!("\r\n{delimiter}"))?;
    let metadata: Value = serde_json::from_str(&text[meta_start..meta_end]).ok()?;

    let raw = body.as_ref();
    let after_meta = meta_end + 2 + delimiter.len();
    let content_start = after_meta + find(&raw[after_meta..], b"\r\n\r\n")? + 4;
    let closing = format!("\r\n{delimiter}--");
    let content_end = content_start + find(&raw[content_start..], closing.as_bytes())?;
    Some((metadata, body.slice(content_start..content_end)))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn upload_file(auth: Option<String>, content_type: String, body: Bytes, state: Arc<State>) -> Response {
    if let Some(denied) = state.gate(auth.as_deref()) {
        return denied;
    }
    let Some((metadata, content)) = split_related(&content_type, &body) else {
        return error(StatusCode::BAD_REQUEST, "malformed multipart body");
    };
    let file = FakeFile {
        id: state.mint("file"),
        name: metadata["name"].as_str().unwrap_or("untitled").to_string(),
        parent: metadata["parents"][0].as_str().map(str::to_string),
        content,
        shared: false,
    };
    let reply = json!({
        "id": file.id,
        "name": file.name,
        "webViewLink": format!("https://drive.google.com/file/d/{}/view", file.id),
        "webContentLink": format!("https://drive.google.com/uc?id={}&export=download", file.id),
    });
    state.files.lock().insert(file.id.clone(), file);
    warp::reply::json(&reply).into_response()
}

fn share_file(id: String, auth: Option<String>, state: Arc<State>) -> Response {
    if let Some(denied) = state.gate(auth.as_deref()) {
        return denied;
    }
    match state.files.lock().get_mut(&id) {
        Some(file) => {
            file.shared = true;
            warp::reply::json(&json!({ "id": "anyoneWithLink", "role": "reader" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "file not found"),
    }
}

fn delete_file(id: String, auth: Option<String>, state: Arc<State>) -> Response {
    if let Some(denied) = state.gate(auth.as_deref()) {
        return denied;
    }
    match state.files.lock().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "file not found"),
    }
}
