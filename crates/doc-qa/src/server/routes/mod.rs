//! HTTP routes for the QA server

pub mod query;
pub mod report;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all service routes
pub fn service_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query_documents))
        .route("/report", get(report::get_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::RagConfig;
    use crate::providers::local::LocalDocumentStore;
    use crate::server::state::Providers;
    use crate::testing::{HashEmbedder, MemoryVectorStore, ScriptedLlm};
    use crate::types::INSUFFICIENT_INFORMATION_ANSWER;

    const BOUNDARY: &str = "doc-qa-test-boundary";

    struct Harness {
        _dir: tempfile::TempDir,
        upload_dir: PathBuf,
        store: Arc<MemoryVectorStore>,
        llm: Arc<ScriptedLlm>,
        router: Router,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let store = Arc::new(MemoryVectorStore::default());
        let llm = Arc::new(ScriptedLlm::answering("The answer is 42."));

        let mut config = RagConfig::default();
        config.embeddings.dimensions = 16;

        let state = AppState::from_providers(
            config,
            Providers {
                document_store: Arc::new(LocalDocumentStore::new(upload_dir.clone()).unwrap()),
                embedder: Arc::new(HashEmbedder::new(16)),
                vector_store: store.clone(),
                llm: llm.clone(),
            },
        )
        .unwrap();

        Harness {
            _dir: dir,
            upload_dir,
            store,
            llm,
            router: service_routes(1024 * 1024).with_state(state),
        }
    }

    fn upload_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn query_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_report_is_static() {
        let h = harness();
        let request = Request::builder().uri("/report").body(Body::empty()).unwrap();

        let (status, body) = send(&h.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context_precision"], 0.9);
        assert_eq!(body["faithfulness"], 0.85);
    }

    #[tokio::test]
    async fn test_query_on_empty_index() {
        let h = harness();

        let (status, body) = send(&h.router, query_request(r#"{"question": "What is the refund policy?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], INSUFFICIENT_INFORMATION_ANSWER);
        assert_eq!(body["sources"], serde_json::json!([]));
        assert_eq!(h.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_then_query() {
        let h = harness();
        let text = "a".repeat(2500);

        let (status, body) = send(&h.router, upload_request("file", "policy.txt", text.as_bytes())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully processed policy.txt");
        assert_eq!(body["chunks_count"], 4);
        assert_eq!(h.store.records().len(), 4);
        assert!(h.upload_dir.join("policy.txt").exists());

        let (status, body) = send(&h.router, query_request(r#"{"question": "What is it?"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "The answer is 42.");
        assert_eq!(body["sources"].as_array().unwrap().len(), 3);
        assert_eq!(h.llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_extension() {
        let h = harness();

        let (status, body) = send(&h.router, upload_request("file", "setup.exe", b"MZ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains(".exe"));
        assert!(h.store.records().is_empty());
        assert_eq!(std::fs::read_dir(&h.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let h = harness();

        let (status, body) = send(&h.router, upload_request("attachment", "notes.txt", b"hi")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("file"));
    }

    #[tokio::test]
    async fn test_upload_parse_failure_is_server_error() {
        let h = harness();

        let (status, body) = send(&h.router, upload_request("file", "broken.pdf", b"not a pdf")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("broken.pdf"));
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.embeddings.dimensions = 16;
        let store = Arc::new(MemoryVectorStore::default());
        let router = service_routes(1024).with_state(
            AppState::from_providers(
                config,
                Providers {
                    document_store: Arc::new(LocalDocumentStore::new(dir.path().to_path_buf()).unwrap()),
                    embedder: Arc::new(HashEmbedder::new(16)),
                    vector_store: store.clone(),
                    llm: Arc::new(ScriptedLlm::failing()),
                },
            )
            .unwrap(),
        );
        let record = crate::types::IndexRecord::new("chunk".to_string(), vec![1.0; 16], "a.txt");
        crate::providers::VectorStoreProvider::insert_records(store.as_ref(), &[record])
            .await
            .unwrap();

        let (status, body) = send(&router, query_request(r#"{"question": "q"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("Generation failed"));
    }

    #[tokio::test]
    async fn test_malformed_query_body() {
        let h = harness();

        let (status, body) = send(&h.router, query_request(r#"{"q": 1}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }
}
