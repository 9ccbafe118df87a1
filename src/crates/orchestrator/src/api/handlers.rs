//! Task endpoint handlers.

use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::AppState;
use crate::models::{TaskRequest, TaskResponse, TaskStatus};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sandbox::DataFile;
use serde_json::json;

/// Handler for GET /health. Unauthenticated.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

/// Handler for POST /task/run/sync.
///
/// Runs the task to completion. Pipeline failures come back as a failure
/// `TaskResponse` with HTTP 422; a task that finished but did not succeed is
/// still HTTP 200.
pub async fn run_task_sync(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (request, files) = parse_task_form(multipart, state.settings.max_file_size_bytes()).await?;

    let response = state.service.process_sync(request, files).await;
    let status = if response.status == TaskStatus::Failed {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    Ok((status, Json(response)))
}

/// Handler for POST /task/run/async.
///
/// Returns the task id immediately with HTTP 202; the pipeline runs on a
/// background worker.
pub async fn run_task_async(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (request, files) = parse_task_form(multipart, state.settings.max_file_size_bytes()).await?;

    let task_id = state.service.process_async(request, files).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"id": task_id, "status": TaskStatus::InProgress})),
    ))
}

/// Handler for GET /task/{id}.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let info = state
        .registry
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", id)))?;

    let response = match info.response {
        Some(response) => response,
        None => TaskResponse::in_progress(&info.task_id),
    };

    Ok(Json(response))
}

/// Assemble a [`TaskRequest`] and its data files from a multipart form.
async fn parse_task_form(
    mut multipart: Multipart,
    max_file_size: usize,
) -> ApiResult<(TaskRequest, Vec<DataFile>)> {
    let mut request = TaskRequest::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("task_description") => {
                request.task_description = read_text(field).await?;
            }
            Some("data_files_description") => {
                request.data_files_description = read_text(field).await?;
            }
            Some("base_path") => {
                request.base_path = read_text(field).await?;
            }
            Some("file_paths") => {
                let path = read_text(field).await?;
                if !path.is_empty() {
                    request.file_paths.push(path);
                }
            }
            Some("target_path") => {
                let path = read_text(field).await?;
                if !path.is_empty() {
                    request.target_path = Some(path);
                }
            }
            Some("data_files") => {
                let filename = field
                    .file_name()
                    .unwrap_or("unnamed_file")
                    .to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read file '{}': {}", filename, e))
                })?;

                tooling::validation::validate_file_size(bytes.len(), max_file_size, &filename)
                    .map_err(|e| ApiError::FileTooLarge(e.to_string()))?;

                files.push(DataFile {
                    filename,
                    size: bytes.len(),
                    content: bytes.to_vec(),
                    content_type,
                });
            }
            _ => {}
        }
    }

    let request = request.validate()?;
    Ok((request, files))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form field: {}", e)))
}
