//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::ingestion::IngestPipeline;
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// POST /upload - Store, chunk, embed and index one document
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::InvalidRequest("Uploaded file has no filename".to_string()))?;

        // Reject before reading the body
        if let Err(e) = IngestPipeline::validate_upload(&filename) {
            tracing::warn!("Rejected upload '{}': {}", filename, e);
            return Err(e);
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        return match state.ingest_pipeline().ingest(&filename, &data).await {
            Ok(outcome) => Ok(Json(UploadResponse::processed(
                &outcome.filename,
                outcome.chunks_count,
            ))),
            Err(e) => {
                tracing::error!("Ingestion of '{}' failed: {}", filename, e);
                Err(e)
            }
        };
    }

    Err(Error::InvalidRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}
