//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a question from the indexed documents
pub async fn query_documents(
    State(state): State<AppState>,
    request: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = request.map_err(|e| Error::InvalidRequest(e.body_text()))?;

    tracing::info!("Query: \"{}\"", request.question);

    match state.query_engine().answer(&request.question).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Query failed: {}", e);
            Err(e)
        }
    }
}
