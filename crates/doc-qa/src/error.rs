//! Error types for the document QA service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload rejected before any processing
    #[error("{0}")]
    InvalidFormat(String),

    /// Malformed request (e.g. no file in the upload)
    #[error("{0}")]
    InvalidRequest(String),

    /// Extension the parser cannot handle
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Generation provider failed or returned nothing usable
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Any failure inside the ingestion flow
    #[error("{0}")]
    Ingestion(#[source] Box<Error>),

    /// Any failure inside the query flow
    #[error("{0}")]
    Query(#[source] Box<Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap an error raised while ingesting a document
    pub fn ingestion(err: Error) -> Self {
        match err {
            already @ Error::Ingestion(_) => already,
            other => Error::Ingestion(Box::new(other)),
        }
    }

    /// Wrap an error raised while answering a question
    pub fn query(err: Error) -> Self {
        match err {
            already @ Error::Query(_) => already,
            other => Error::Query(Box::new(other)),
        }
    }

    /// The wrapped error of an `Ingestion`/`Query` failure, or `self`
    pub fn root(&self) -> &Error {
        match self {
            Error::Ingestion(inner) | Error::Query(inner) => inner.root(),
            other => other,
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidFormat(_) | Error::InvalidRequest(_) | Error::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
