//! Image uploads for question illustrations.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, CurrentUser};
use crate::api::validation;
use crate::core::state::AppState;
use crate::services::uploads::UploadError;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image))
        .route("/image/:filename", get(serve_image).delete(delete_image))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    filename: String,
    url: String,
}

async fn upload_image(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("File field needs a filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("File field needs a content type".to_string()))?;

        validation::validate_image_upload(
            &filename,
            &content_type,
            &state.settings().storage().allowed_image_extensions,
        )?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        let stored = state.uploads().save(&filename, &bytes).await.map_err(map_upload_error)?;
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse { filename: stored.filename, url: stored.url }),
        ));
    }

    Err(ApiError::BadRequest("Multipart field 'file' is required".to_string()))
}

async fn serve_image(
    CurrentUser(_): CurrentUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.uploads().read(&filename).await.map_err(map_upload_error)?;
    let content_type = content_type_for(&filename);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn delete_image(
    CurrentTeacher(_): CurrentTeacher,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.uploads().delete(&filename).await.map_err(map_upload_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn map_upload_error(err: UploadError) -> ApiError {
    match err {
        UploadError::MissingExtension => {
            ApiError::BadRequest("File must have an extension".to_string())
        }
        UploadError::DisallowedExtension(ext) => {
            ApiError::BadRequest(format!("File extension '{ext}' is not allowed"))
        }
        UploadError::TooLarge(limit) => {
            ApiError::BadRequest(format!("File exceeds the {limit} MB limit"))
        }
        UploadError::InvalidFilename => ApiError::BadRequest("Invalid filename".to_string()),
        UploadError::NotFound => ApiError::NotFound("File not found".to_string()),
        UploadError::Io(e) => ApiError::internal(e, "Failed to access uploaded file"),
    }
}
