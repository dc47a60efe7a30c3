//! HTTP routes
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /upload` | [`handlers::upload`] |
//! | `GET/POST /api/students` | list / create |
//! | `GET/PUT/DELETE /api/students/:id` | fetch / update / delete |
//! | `GET /api/students/:id/documents` | document lists |
//! | `GET /api/students/:id/stats` | counts |
//! | `DELETE /api/students/:id/documents/:type/:docId` | remove one link |
//! | `GET /api/search?q=` | search |
//! | `GET /health` | status |
//! | `GET /uploads/*` | locally stored files |
//! | `GET /*` | static frontend |

pub mod handlers;

use crate::error::{handle_rejection, ApiError};
use crate::intake::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use intake_records::{NewStudent, StudentPatch};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

/// JSON bodies above this size are refused
const JSON_BODY_LIMIT: u64 = 64 * 1024;

/// Multipart envelope allowance on top of the file size cap
const FORM_OVERHEAD: u64 = 1024 * 1024;

/// `?q=` of the search route
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Search text; blank matches nothing
    #[serde(default)]
    pub q: String,
}

/// Every route, with error recovery and request tracing
///
/// Path filters come before method filters so an unknown path rejects as
/// 404 rather than 405.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let upload_dir = state.upload_dir.clone();
    let public_dir = state.public_dir.clone();

    let api = students(state.clone())
        .or(search(state.clone()))
        .or(upload(state.clone()));

    health(state)
        .or(api)
        .or(warp::path("uploads").and(warp::get()).and(warp::fs::dir(upload_dir)))
        .or(warp::get().and(warp::fs::dir(public_dir)))
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

/// Bearer token check; passes everything when no token is configured
fn authorized(token: Option<Arc<str>>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let token = token.clone();
            async move {
                let Some(expected) = token else {
                    return Ok(());
                };
                let presented = header
                    .as_deref()
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .map(str::trim);
                if presented == Some(&*expected) {
                    Ok(())
                } else {
                    Err(warp::reject::custom(ApiError::unauthorized()))
                }
            }
        })
        .untuple_one()
}

fn health(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::health)
}

fn upload(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(authorized(state.api_token.clone()))
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES as u64 + FORM_OVERHEAD))
        .and(with_state(state))
        .and_then(handlers::upload)
}

fn search(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "search")
        .and(warp::get())
        .and(authorized(state.api_token.clone()))
        .and(warp::query::<SearchQuery>())
        .and(with_state(state))
        .and_then(handlers::search)
}

fn students(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let base = warp::path!("api" / "students" / ..).and(authorized(state.api_token.clone()));

    let list = warp::get()
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(handlers::list_students);

    let create = warp::post()
        .and(warp::path::end())
        .and(json_body::<NewStudent>())
        .and(with_state(state.clone()))
        .and_then(handlers::create_student);

    let get = warp::get()
        .and(warp::path!(String))
        .and(with_state(state.clone()))
        .and_then(handlers::get_student);

    let update = warp::put()
        .and(warp::path!(String))
        .and(json_body::<StudentPatch>())
        .and(with_state(state.clone()))
        .and_then(handlers::update_student);

    let delete = warp::delete()
        .and(warp::path!(String))
        .and(with_state(state.clone()))
        .and_then(handlers::delete_student);

    let documents = warp::get()
        .and(warp::path!(String / "documents"))
        .and(with_state(state.clone()))
        .and_then(handlers::student_documents);

    let stats = warp::get()
        .and(warp::path!(String / "stats"))
        .and(with_state(state.clone()))
        .and_then(handlers::student_stats);

    let remove_document = warp::delete()
        .and(warp::path!(String / "documents" / String / String))
        .and(with_state(state))
        .and_then(handlers::remove_document);

    base.and(
        list.or(create)
            .or(get)
            .or(update)
            .or(delete)
            .or(documents)
            .or(stats)
            .or(remove_document),
    )
}
