//! Whole-store sweeps run after ingestion: recounting with a newer
//! vocabulary, filling in missing snippets and bulk deletes.

use crate::codes::SourceCollection;
use crate::models::{DocumentFilter, DocumentPatch};
use crate::scanner::{scan_with, SnippetConfig};
use crate::traits::DocumentStore;
use crate::vocabulary::Vocabulary;
use crate::StoreError;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: u64,
    pub updated: u64,
}

/// Rescans every stored document and rewrites counts and snippets wherever
/// they differ from what `vocabulary` produces for the stored text.
pub async fn recount_keywords<S>(
    store: &S,
    vocabulary: &Vocabulary,
    config: SnippetConfig,
) -> Result<SweepReport, StoreError>
where
    S: DocumentStore + Send + Sync,
{
    let mut report = SweepReport::default();

    for stored in store.list(&DocumentFilter::all()).await? {
        report.examined += 1;
        let document = &stored.document;
        let scan = scan_with(&document.full_text, vocabulary, config);

        let unchanged = scan.counts == document.keyword_counts
            && scan.total == document.total_keyword_count
            && scan.snippets == document.keyword_snippets;
        if unchanged {
            continue;
        }

        debug!(
            id = %stored.id,
            before = document.total_keyword_count,
            after = scan.total,
            "recounted"
        );
        store.update(&stored.id, &DocumentPatch::keywords(&scan)).await?;
        report.updated += 1;
    }

    info!(
        vocabulary_version = vocabulary.version(),
        examined = report.examined,
        updated = report.updated,
        "keyword recount finished"
    );
    Ok(report)
}

/// Fills snippets for documents stored without any. Counts are left alone.
pub async fn backfill_snippets<S>(
    store: &S,
    vocabulary: &Vocabulary,
    config: SnippetConfig,
) -> Result<SweepReport, StoreError>
where
    S: DocumentStore + Send + Sync,
{
    let filter = DocumentFilter {
        missing_snippets_only: true,
        ..DocumentFilter::default()
    };
    let mut report = SweepReport::default();

    for stored in store.list(&filter).await? {
        report.examined += 1;
        let scan = scan_with(&stored.document.full_text, vocabulary, config);
        if scan.snippets.is_empty() {
            continue;
        }

        store
            .update(&stored.id, &DocumentPatch::Snippets(scan.snippets))
            .await?;
        report.updated += 1;
    }

    info!(examined = report.examined, updated = report.updated, "snippet backfill finished");
    Ok(report)
}

/// Deletes every document matching `filter` and returns how many were removed.
pub async fn purge<S>(store: &S, filter: &DocumentFilter) -> Result<u64, StoreError>
where
    S: DocumentStore + Send + Sync,
{
    let mut removed = 0;
    for stored in store.list(filter).await? {
        store.delete(&stored.id).await?;
        removed += 1;
    }
    info!(removed, "purge finished");
    Ok(removed)
}

pub async fn purge_zero_keyword<S>(store: &S) -> Result<u64, StoreError>
where
    S: DocumentStore + Send + Sync,
{
    purge(store, &DocumentFilter::zero_keywords()).await
}

pub async fn purge_collection<S>(store: &S, collection: SourceCollection) -> Result<u64, StoreError>
where
    S: DocumentStore + Send + Sync,
{
    purge(store, &DocumentFilter::collection(collection)).await
}
