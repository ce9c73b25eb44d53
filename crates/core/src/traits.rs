use crate::classify::{ClassificationRequest, OracleVerdict};
use crate::models::{DedupKey, Document, DocumentFilter, DocumentId, DocumentPatch, StoredDocument};
use crate::{ClassifyError, StoreError};
use async_trait::async_trait;

/// Persistence and search-index layer the pipeline writes through.
#[async_trait]
pub trait DocumentStore {
    async fn find(&self, key: &DedupKey) -> Result<Vec<StoredDocument>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the URL is already stored.
    async fn insert(&self, document: &Document) -> Result<DocumentId, StoreError>;

    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError>;

    async fn count(&self, filter: &DocumentFilter) -> Result<u64, StoreError>;

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>, StoreError>;
}

/// External scorer assigning category and sector relevance.
#[async_trait]
pub trait ClassificationOracle {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<OracleVerdict, ClassifyError>;
}
