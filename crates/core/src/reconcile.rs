//! Decides how each incoming document relates to what is already stored and
//! applies the matching insert, update or delete.

use crate::models::{
    DedupKey, Document, DocumentId, DocumentMetadata, DocumentPatch, StoredDocument,
};
use crate::traits::DocumentStore;
use crate::StoreError;
use serde::Serialize;
use tracing::{debug, error, warn};

/// Outcome of comparing a candidate with the stored documents sharing its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Insert,
    /// No stored match and no keywords, so nothing is persisted.
    Discard,
    Unchanged { id: DocumentId },
    UpdateMetadata { id: DocumentId, metadata: DocumentMetadata },
    /// Metadata and full text changed: drop the stored record and insert
    /// the candidate.
    Replace { id: DocumentId },
    /// Several stored records share the key. Nothing is touched.
    Ambiguous { ids: Vec<DocumentId> },
}

pub fn decide(candidate: &Document, existing: &[StoredDocument]) -> Decision {
    match existing {
        [] if candidate.total_keyword_count > 0 => Decision::Insert,
        [] => Decision::Discard,
        [stored] => {
            let id = stored.id.clone();
            if stored.document.metadata().same_progress(&candidate.metadata()) {
                // Text is only compared once the bill has moved.
                Decision::Unchanged { id }
            } else if stored.document.full_text == candidate.full_text {
                Decision::UpdateMetadata {
                    id,
                    metadata: candidate.metadata(),
                }
            } else {
                Decision::Replace { id }
            }
        }
        many => Decision::Ambiguous {
            ids: many.iter().map(|stored| stored.id.clone()).collect(),
        },
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedRecord {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: u64,
    pub updated: u64,
    pub replaced: u64,
    pub unchanged: u64,
    /// Candidates without keywords that were not persisted.
    pub not_added: u64,
    /// Insert rejected by the store, usually a duplicate URL.
    pub conflicts: u64,
    pub skipped: Vec<SkippedRecord>,
    pub ambiguous: Vec<String>,
}

impl ReconcileReport {
    pub fn record_skip(&mut self, label: impl Into<String>, reason: impl ToString) {
        self.skipped.push(SkippedRecord {
            label: label.into(),
            reason: reason.to_string(),
        });
    }

    pub fn writes(&self) -> u64 {
        self.added + self.updated + self.replaced
    }
}

/// Applies [`decide`] against a store. Candidates are handled one at a time,
/// so the delete and re-insert of a replaced key never interleave with
/// another candidate for the same key.
pub struct Reconciler<'a, S> {
    store: &'a S,
}

impl<'a, S> Reconciler<'a, S>
where
    S: DocumentStore + Send + Sync,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn reconcile(
        &self,
        candidate: &Document,
        report: &mut ReconcileReport,
    ) -> Result<Decision, StoreError> {
        let key = candidate.dedup_key();
        let existing = self.store.find(&key).await?;
        let decision = decide(candidate, &existing);
        debug!(key = %key, decision = ?decision, "reconciling candidate");

        match &decision {
            Decision::Insert => {
                if self.insert(candidate, &key, report).await? {
                    report.added += 1;
                }
            }
            Decision::Discard => report.not_added += 1,
            Decision::Unchanged { .. } => report.unchanged += 1,
            Decision::UpdateMetadata { id, metadata } => {
                self.store
                    .update(id, &DocumentPatch::Metadata(metadata.clone()))
                    .await?;
                report.updated += 1;
            }
            Decision::Replace { id } => {
                self.store.delete(id).await?;
                if candidate.total_keyword_count == 0 {
                    report.not_added += 1;
                } else if self.insert(candidate, &key, report).await? {
                    report.replaced += 1;
                } else {
                    error!(
                        key = %key,
                        deleted_id = %id,
                        url = %candidate.url,
                        "replacement rejected after the stored document was deleted"
                    );
                }
            }
            Decision::Ambiguous { ids } => {
                warn!(
                    key = %key,
                    matches = ids.len(),
                    "several stored documents share a key, leaving them for review"
                );
                report.ambiguous.push(key.to_string());
            }
        }

        Ok(decision)
    }

    async fn insert(
        &self,
        candidate: &Document,
        key: &DedupKey,
        report: &mut ReconcileReport,
    ) -> Result<bool, StoreError> {
        match self.store.insert(candidate).await {
            Ok(_) => Ok(true),
            Err(StoreError::UniqueViolation(url)) => {
                warn!(key = %key, url = %url, "insert rejected as duplicate");
                report.conflicts += 1;
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}
