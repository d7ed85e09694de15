//! Document store provider trait for persisting raw uploads

use async_trait::async_trait;
use std::path::PathBuf;
use crate::error::Result;

/// Trait for raw upload storage
///
/// Implementations:
/// - `LocalDocumentStore`: Local filesystem
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Store an upload under `filename`, replacing any previous file of the
    /// same name. Returns where it was written.
    async fn store_document(&self, filename: &str, data: &[u8]) -> Result<PathBuf>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
