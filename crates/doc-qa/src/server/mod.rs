//! HTTP server for the document QA service

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// QA HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a new server, building all providers from `config`
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around an already assembled state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            .merge(routes::service_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::providers::local::LocalDocumentStore;
    use crate::server::state::Providers;
    use crate::testing::{HashEmbedder, MemoryVectorStore, ScriptedLlm};

    fn server(enable_cors: bool, dir: &std::path::Path) -> RagServer {
        let mut config = RagConfig::default();
        config.embeddings.dimensions = 8;
        config.server.enable_cors = enable_cors;

        let state = AppState::from_providers(
            config,
            Providers {
                document_store: Arc::new(LocalDocumentStore::new(dir.to_path_buf()).unwrap()),
                embedder: Arc::new(HashEmbedder::new(8)),
                vector_store: Arc::new(MemoryVectorStore::default()),
                llm: Arc::new(ScriptedLlm::answering("ok")),
            },
        )
        .unwrap();
        RagServer::with_state(state)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let router = server(false, dir.path()).build_router();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_cors_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let request = || {
            Request::builder()
                .uri("/report")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap()
        };

        let with_cors = server(true, dir.path()).build_router().oneshot(request()).await.unwrap();
        assert_eq!(
            with_cors.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );

        let without_cors = server(false, dir.path()).build_router().oneshot(request()).await.unwrap();
        assert!(without_cors
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_address() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(server(false, dir.path()).address(), "0.0.0.0:8000");
    }
}
