use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::{ObjectStorage, ObjectUpload, StorageError, DEFAULT_FOLDER};
use crate::workflows::http::error_response;

/// Multipart framing allowance on top of the file ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Router exposing document upload and signed-link downloads.
pub fn storage_router<O>(objects: Arc<O>, max_upload_bytes: usize) -> Router
where
    O: ObjectStorage + 'static,
{
    Router::new()
        .route(
            "/upload",
            post(upload_handler::<O>)
                .layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD))),
        )
        .route("/storage/objects/*path", get(download_handler::<O>))
        .with_state(objects)
}

pub(crate) async fn upload_handler<O>(
    State(objects): State<Arc<O>>,
    mut multipart: Multipart,
) -> Response
where
    O: ObjectStorage + 'static,
{
    let mut folder = DEFAULT_FOLDER.to_string();
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "malformed multipart upload");
                return error_response(StatusCode::BAD_REQUEST, "malformed multipart body");
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder") => match field.text().await {
                Ok(text) => folder = text,
                Err(err) => {
                    warn!(error = %err, "unreadable folder field");
                    return error_response(StatusCode::BAD_REQUEST, "malformed multipart body");
                }
            },
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => file = Some((file_name, content_type, bytes.to_vec())),
                    Err(err) => {
                        warn!(error = %err, "upload body rejected");
                        return error_response(
                            StatusCode::PAYLOAD_TOO_LARGE,
                            "uploaded file exceeds the size limit",
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let Some((file_name, declared_type, bytes)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let content_type = declared_type
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .filter(|mime| mime.essence_str() != "application/octet-stream")
        .unwrap_or_else(|| mime_guess::from_path(&file_name).first_or_octet_stream());

    let upload = ObjectUpload {
        folder,
        file_name,
        content_type,
        bytes,
    };

    match objects.upload(upload) {
        Ok(stored) => (StatusCode::OK, Json(json!({ "path": stored.path }))).into_response(),
        Err(err @ StorageError::TooLarge { .. }) => {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
        }
        Err(err) if err.is_rejection() => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        Err(err) => {
            error!(error = %err, "document upload failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignedQuery {
    #[serde(default)]
    expires: i64,
    #[serde(default)]
    signature: String,
}

pub(crate) async fn download_handler<O>(
    State(objects): State<Arc<O>>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Response
where
    O: ObjectStorage + 'static,
{
    match objects.fetch_signed(&path, query.expires, &query.signature) {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content.content_type)],
            content.bytes,
        )
            .into_response(),
        Err(StorageError::InvalidSignature | StorageError::Expired) => {
            error_response(StatusCode::FORBIDDEN, "link is invalid or has expired")
        }
        Err(StorageError::NotFound) => error_response(StatusCode::NOT_FOUND, "object not found"),
        Err(err) => {
            error!(error = %err, %path, "signed download failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "download failed")
        }
    }
}
