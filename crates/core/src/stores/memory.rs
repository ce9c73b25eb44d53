//! In-process [`DocumentStore`] backed by a `BTreeMap` behind `std::sync::RwLock`.
//!
//! Used by tests and dry runs. Enforces the same URL uniqueness the search
//! index does, and counts every mutating call so callers can assert that a
//! pass performed no writes.

use crate::models::{DedupKey, Document, DocumentFilter, DocumentId, DocumentPatch, StoredDocument};
use crate::traits::DocumentStore;
use crate::StoreError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Stable identifier derived from the document URL.
pub fn document_id_for(url: &str) -> DocumentId {
    DocumentId(format!("{:x}", Sha256::digest(url.as_bytes())))
}

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentId, Document>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert, update and delete calls that changed the store.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn snapshot(&self, filter: impl Fn(&Document) -> bool) -> Vec<StoredDocument> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents
            .iter()
            .filter(|(_, document)| filter(document))
            .map(|(id, document)| StoredDocument {
                id: id.clone(),
                document: document.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, key: &DedupKey) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(self.snapshot(|document| key.matches(document)))
    }

    async fn insert(&self, document: &Document) -> Result<DocumentId, StoreError> {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        if documents.values().any(|stored| stored.url == document.url) {
            return Err(StoreError::UniqueViolation(document.url.clone()));
        }

        let id = document_id_for(&document.url);
        documents.insert(id.clone(), document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> Result<(), StoreError> {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(document);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<u64, StoreError> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.values().filter(|document| filter.matches(document)).count() as u64)
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(self.snapshot(|document| filter.matches(document)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::bill;

    #[tokio::test]
    async fn rejects_second_document_with_same_url() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let first = bill("AI Act", "artificial intelligence");
        let id = store.insert(&first).await?;
        assert_eq!(id, document_id_for(&first.url));

        let mut copy = first.clone();
        copy.title = "Another title".to_string();
        let result = store.insert(&copy).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation(url)) if url == first.url));
        assert_eq!(store.write_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn find_matches_dedup_key_only() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        store.insert(&bill("AI Act", "one")).await?;
        store.insert(&bill("Budget Act", "two")).await?;

        let found = store.find(&bill("AI Act", "other text").dedup_key()).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document.title, "AI Act");
        Ok(())
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let store = MemoryStore::new();
        let id = DocumentId("missing".to_string());
        assert!(matches!(store.delete(&id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(&id, &DocumentPatch::Snippets(Vec::new())).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.write_count(), 0);
    }
}
