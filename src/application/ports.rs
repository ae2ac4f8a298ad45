use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;
use crate::domain::{detection::RawDetection, errors::DomainResult, model::ModelId};

/// Raw Detection Source. Implementations may block; callers run them on the
/// blocking pool and must be able to share one instance across requests.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage, conf_threshold: f32) -> DomainResult<Vec<RawDetection>>;
    fn class_names(&self) -> &[String];
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
    async fn load(&self, model: &ModelId) -> DomainResult<Arc<dyn DetectorPort>>;
}

/// A file written under the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub url: String,
}

#[async_trait]
pub trait UploadStorePort: Send + Sync {
    /// Writes the upload under a fresh, collision-free name built from `original_name`.
    async fn persist(&self, original_name: &str, bytes: &[u8]) -> DomainResult<StoredFile>;
    /// Writes a sibling of `source` named `<prefix><source name>`.
    async fn persist_derived(
        &self,
        source: &StoredFile,
        prefix: &str,
        bytes: &[u8],
    ) -> DomainResult<StoredFile>;
    /// Name a derived file would get, whether or not it exists yet.
    fn derived(&self, source: &StoredFile, prefix: &str) -> StoredFile;
    async fn remove(&self, file: &StoredFile) -> DomainResult<()>;
    fn location(&self) -> String;
}
