use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use docqa_core::{
    AnswerEngine, Document, DocumentStore, IngestionPipeline, Message, NewDocument, StoreError,
    VectorIndex, MIME_DOCX, MIME_PDF, MIME_TXT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub index: Arc<dyn VectorIndex>,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<AnswerEngine>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Slack on top of the document limit so multipart framing never trips
    // the body cap before our own size check does.
    let body_limit = (state.max_upload_bytes as usize).saturating_add(1024 * 1024);

    Router::new()
        .route(
            "/api/documents",
            get(list_documents)
                .post(upload_document)
                .delete(clear_documents),
        )
        .route(
            "/api/documents/{id}",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/refresh", axum::routing::post(refresh_documents))
        .route(
            "/api/messages",
            get(list_messages).post(create_message).delete(clear_messages),
        )
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error responses ============

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, message)
}

fn payload_too_large(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, message)
}

fn internal(message: impl Into<String>) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DocumentNotFound(_) | StoreError::ChunkNotFound(_) => {
                not_found(error.to_string())
            }
        }
    }
}

// ============ GET /health ============

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============ Documents ============

async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.store.documents().await?))
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    state
        .store
        .document(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Document not found"))
}

async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| bad_request(format!("invalid multipart body: {error}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = sanitize_filename(field.file_name().unwrap_or("upload"));
        let declared = field.content_type().map(str::to_string);
        let Some(filetype) = resolve_filetype(declared.as_deref(), &filename) else {
            return Err(bad_request("Only PDF, DOCX, and TXT files are accepted"));
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|error| bad_request(format!("failed to read upload: {error}")))?;
        if bytes.len() as u64 > state.max_upload_bytes {
            return Err(payload_too_large(format!(
                "file exceeds the {} byte upload limit",
                state.max_upload_bytes
            )));
        }

        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(|error| internal(format!("failed to prepare upload dir: {error}")))?;
        let stored_path = state
            .upload_dir
            .join(format!("{}-{}", Utc::now().timestamp_millis(), filename));
        tokio::fs::write(&stored_path, &bytes)
            .await
            .map_err(|error| internal(format!("failed to store upload: {error}")))?;

        let document = state
            .store
            .create_document(NewDocument {
                filename,
                filesize: bytes.len() as u64,
                filetype: filetype.to_string(),
            })
            .await?;
        info!(
            document_id = %document.id,
            filename = %document.filename,
            filesize = document.filesize,
            "upload accepted, starting ingestion"
        );

        // Ingestion runs in the background; the caller polls for status.
        let pipeline = state.pipeline.clone();
        let document_id = document.id.clone();
        tokio::spawn(async move {
            let report = pipeline.process_document(&document_id, &stored_path).await;
            if !report.success {
                error!(
                    document_id = %document_id,
                    message = report.message.as_deref().unwrap_or("unknown"),
                    "background ingestion failed"
                );
            }
        });

        return Ok((StatusCode::CREATED, Json(document)));
    }

    Err(bad_request("No file uploaded"))
}

async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete_document(&id).await?;
    if !deleted {
        return Err(not_found("Document not found"));
    }

    state
        .index
        .remove_document(&id)
        .await
        .map_err(|error| internal(error.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_documents(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    for document in state.store.documents().await? {
        state.store.delete_document(&document.id).await?;
        state
            .index
            .remove_document(&document.id)
            .await
            .map_err(|error| internal(error.to_string()))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_documents() -> Json<serde_json::Value> {
    // Re-indexing hook kept for API compatibility; uploads are indexed as
    // they arrive, so there is nothing to rebuild.
    Json(serde_json::json!({ "success": true }))
}

// ============ Messages ============

#[derive(Debug, Deserialize)]
struct CreateMessageRequest {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessagePair {
    user_message: Message,
    assistant_message: Message,
}

async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.store.messages().await?))
}

async fn create_message(
    State(state): State<AppState>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessagePair>), ApiError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(bad_request("Message content is required"));
    }

    let user_message = state.store.create_message(content, true, None).await?;

    let answer = state.engine.answer_question(content).await;
    let sources = if answer.sources.is_empty() {
        None
    } else {
        Some(answer.sources)
    };
    let assistant_message = state
        .store
        .create_message(&answer.answer, false, sources)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessagePair {
            user_message,
            assistant_message,
        }),
    ))
}

async fn clear_messages(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_messages().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ Upload helpers ============

/// Keeps only the final path component of a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    std::path::Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string()
}

/// Accepts the declared MIME type when it is in the whitelist, otherwise
/// falls back to the file extension. Returns `None` for everything else.
fn resolve_filetype(declared: Option<&str>, filename: &str) -> Option<&'static str> {
    let declared = declared.map(|value| value.split(';').next().unwrap_or(value).trim());
    match declared {
        Some(MIME_PDF) => return Some(MIME_PDF),
        Some(MIME_DOCX) => return Some(MIME_DOCX),
        Some(MIME_TXT) => return Some(MIME_TXT),
        _ => {}
    }

    let extension = std::path::Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "txt" => Some(MIME_TXT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_mime_wins_over_extension() {
        assert_eq!(
            resolve_filetype(Some(MIME_PDF), "weird.bin"),
            Some(MIME_PDF)
        );
        assert_eq!(
            resolve_filetype(Some("text/plain; charset=utf-8"), "notes.bin"),
            Some(MIME_TXT)
        );
    }

    #[test]
    fn extension_fallback_for_generic_mime() {
        assert_eq!(
            resolve_filetype(Some("application/octet-stream"), "report.pdf"),
            Some(MIME_PDF)
        );
        assert_eq!(resolve_filetype(None, "notes.txt"), Some(MIME_TXT));
        assert_eq!(resolve_filetype(None, "deck.pptx"), None);
    }

    #[test]
    fn filenames_are_stripped_to_their_last_component() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
