//! Request handlers

use super::SearchQuery;
use crate::error::ApiError;
use crate::intake::{mime_from_extension, Upload};
use crate::state::AppState;
use bytes::{BufMut, BytesMut};
use chrono::Utc;
use futures::TryStreamExt;
use intake_records::{DocumentType, NewStudent, StudentPatch};
use intake_storage::UploadFile;
use serde_json::json;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::{Rejection, Reply};

fn reject(error: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(error.into())
}

async fn read_part(part: Part) -> Result<BytesMut, Rejection> {
    part.stream()
        .try_fold(BytesMut::new(), |mut buf, chunk| async move {
            buf.put(chunk);
            Ok(buf)
        })
        .await
        .map_err(|e| reject(ApiError::bad_request(format!("Malformed upload: {e}"))))
}

/// Pull the `file` and `studentId` fields out of a multipart form
async fn read_upload(form: FormData) -> Result<Upload, Rejection> {
    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| reject(ApiError::bad_request(format!("Malformed upload: {e}"))))?;

    let mut file = None;
    let mut student_id = None;
    for part in parts {
        let field = part.name().to_string();
        match field.as_str() {
            "file" => {
                let file_name = part.filename().unwrap_or_default().to_string();
                let mime_type = part
                    .content_type()
                    .filter(|ct| !ct.eq_ignore_ascii_case("application/octet-stream"))
                    .or_else(|| mime_from_extension(&file_name))
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = read_part(part).await?;
                file = Some(UploadFile::new(file_name, mime_type, bytes.freeze()));
            }
            "studentId" => {
                let raw = read_part(part).await?;
                let value = String::from_utf8_lossy(&raw).trim().to_string();
                student_id = (!value.is_empty()).then_some(value);
            }
            other => tracing::debug!(field = other, "ignoring form field"),
        }
    }

    let file = file.ok_or_else(|| reject(ApiError::bad_request("No file uploaded")))?;
    Ok(Upload { file, student_id })
}

/// `POST /upload`
pub async fn upload(form: FormData, state: AppState) -> Result<impl Reply, Rejection> {
    let upload = read_upload(form).await?;
    let receipt = state.intake.ingest(upload).await.map_err(reject)?;
    Ok(warp::reply::json(&receipt))
}

/// `GET /api/students`
pub async fn list_students(state: AppState) -> Result<impl Reply, Rejection> {
    let students = state.store.list().await.map_err(reject)?;
    Ok(warp::reply::json(&json!({
        "count": students.len(),
        "students": students,
    })))
}

/// `POST /api/students`
pub async fn create_student(new: NewStudent, state: AppState) -> Result<impl Reply, Rejection> {
    let student = state.store.create(new).await.map_err(reject)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&student),
        StatusCode::CREATED,
    ))
}

/// `GET /api/students/:id`
pub async fn get_student(key: String, state: AppState) -> Result<impl Reply, Rejection> {
    let student = state.store.get(&key).await.map_err(reject)?;
    Ok(warp::reply::json(&student))
}

/// `PUT /api/students/:id`
pub async fn update_student(
    key: String,
    patch: StudentPatch,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let student = state.store.update(&key, patch).await.map_err(reject)?;
    Ok(warp::reply::json(&student))
}

/// `DELETE /api/students/:id`
///
/// Stored files are left in place.
pub async fn delete_student(key: String, state: AppState) -> Result<impl Reply, Rejection> {
    let student = state.store.delete(&key).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({
        "message": format!("Student {} deleted", student.student_id),
        "student": student,
    })))
}

/// `GET /api/students/:id/documents`
pub async fn student_documents(key: String, state: AppState) -> Result<impl Reply, Rejection> {
    let documents = state.store.documents(&key).await.map_err(reject)?;
    Ok(warp::reply::json(&documents))
}

/// `GET /api/students/:id/stats`
pub async fn student_stats(key: String, state: AppState) -> Result<impl Reply, Rejection> {
    let stats = state.store.stats(&key).await.map_err(reject)?;
    Ok(warp::reply::json(&stats))
}

/// `DELETE /api/students/:id/documents/:type/:docId`
///
/// Drops the link, then tries to delete the stored file. A failed file
/// delete is logged and does not fail the request.
pub async fn remove_document(
    key: String,
    ty: String,
    doc_id: String,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let ty = ty.parse::<DocumentType>().map_err(reject)?;
    let document = state
        .store
        .remove_document(&key, ty, &doc_id)
        .await
        .map_err(reject)?;

    let file_deleted = match state.storage.delete_file(&document.file_id).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(file_id = %document.file_id, %error, "stored file not deleted");
            false
        }
    };

    Ok(warp::reply::json(&json!({
        "message": "Document removed",
        "document": document,
        "fileDeleted": file_deleted,
    })))
}

/// `GET /api/search?q=`
pub async fn search(query: SearchQuery, state: AppState) -> Result<impl Reply, Rejection> {
    let results = state.store.search(&query.q).await.map_err(reject)?;
    Ok(warp::reply::json(&json!({
        "query": query.q,
        "count": results.len(),
        "results": results,
    })))
}

/// `GET /health`
pub async fn health(state: AppState) -> Result<impl Reply, Rejection> {
    let students = match state.store.count().await {
        Ok(count) => Some(count),
        Err(error) => {
            tracing::warn!(%error, "student register unreadable");
            None
        }
    };
    Ok(warp::reply::json(&json!({
        "status": "ok",
        "storage": state.storage.backend_kind(),
        "classifier": state.classifier.kind(),
        "students": students,
        "timestamp": Utc::now(),
        "version": crate::VERSION,
    })))
}
