use crate::normalizer::Normalizer;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::scanner::SnippetConfig;
use crate::sources::{RawRecord, SourceArchive, TextSource};
use crate::traits::DocumentStore;
use crate::vocabulary::Vocabulary;
use crate::{IngestError, NormalizeError};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub snippets: SnippetConfig,
}

/// Normalizes and reconciles one record. Record-level failures land in the
/// report; only store failures abort the batch.
async fn process_record<S, T>(
    record: &RawRecord,
    normalizer: &Normalizer<'_, T>,
    reconciler: &Reconciler<'_, S>,
    report: &mut ReconcileReport,
) -> Result<(), IngestError>
where
    S: DocumentStore + Send + Sync,
    T: TextSource,
{
    let document = match normalizer.normalize(record) {
        Ok(document) => document,
        Err(
            failure @ (NormalizeError::UnknownJurisdiction(_)
            | NormalizeError::UnknownCollection(_)),
        ) => {
            error!(
                record = %record.label(),
                error = %failure,
                "code table has no entry for record"
            );
            report.record_skip(record.label(), failure);
            return Ok(());
        }
        Err(failure) => {
            warn!(record = %record.label(), error = %failure, "skipping record");
            report.record_skip(record.label(), failure);
            return Ok(());
        }
    };

    reconciler.reconcile(&document, report).await?;
    Ok(())
}

pub async fn ingest_records<S, T, I>(
    records: I,
    texts: &T,
    store: &S,
    vocabulary: &Vocabulary,
    options: PipelineOptions,
) -> Result<ReconcileReport, IngestError>
where
    S: DocumentStore + Send + Sync,
    T: TextSource,
    I: IntoIterator<Item = RawRecord>,
{
    let normalizer = Normalizer::new(vocabulary, texts).with_snippet_config(options.snippets);
    let reconciler = Reconciler::new(store);
    let mut report = ReconcileReport::default();

    for record in records {
        process_record(&record, &normalizer, &reconciler, &mut report).await?;
    }

    Ok(report)
}

/// Runs every bill file in the legislative archive through the pipeline.
/// Unreadable bill files are skipped and reported.
pub async fn ingest_legislative<S>(
    archive: &SourceArchive,
    store: &S,
    vocabulary: &Vocabulary,
    options: PipelineOptions,
) -> Result<ReconcileReport, IngestError>
where
    S: DocumentStore + Send + Sync,
{
    let normalizer = Normalizer::new(vocabulary, archive).with_snippet_config(options.snippets);
    let reconciler = Reconciler::new(store);
    let mut report = ReconcileReport::default();
    let files = archive.legislative.discover_bill_files();

    for path in &files {
        let bundle = match archive.legislative.load_bill(path) {
            Ok(bundle) => bundle,
            Err(failure) => {
                warn!(path = %path.display(), error = %failure, "skipping unreadable bill file");
                report.record_skip(path.display().to_string(), failure);
                continue;
            }
        };

        let record = RawRecord::Legislative(bundle);
        process_record(&record, &normalizer, &reconciler, &mut report).await?;
    }

    info!(
        files = files.len(),
        added = report.added,
        skipped = report.skipped.len(),
        "legislative ingest finished"
    );
    Ok(report)
}

/// Runs every item of the federal content list through the pipeline. A
/// content list that cannot be read fails the whole run.
pub async fn ingest_federal<S>(
    archive: &SourceArchive,
    store: &S,
    vocabulary: &Vocabulary,
    options: PipelineOptions,
) -> Result<ReconcileReport, IngestError>
where
    S: DocumentStore + Send + Sync,
{
    let content_list = archive.federal.load_content_list()?;
    let normalizer = Normalizer::new(vocabulary, archive).with_snippet_config(options.snippets);
    let reconciler = Reconciler::new(store);
    let mut report = ReconcileReport::default();

    for (position, item) in content_list.items().enumerate() {
        let item = match item {
            Ok(item) => item,
            Err(failure) => {
                warn!(position, error = %failure, "skipping malformed content list entry");
                report.record_skip(format!("content list entry {position}"), failure);
                continue;
            }
        };

        let record = RawRecord::Federal(item);
        process_record(&record, &normalizer, &reconciler, &mut report).await?;
    }

    info!(
        items = content_list.results.len(),
        added = report.added,
        skipped = report.skipped.len(),
        "federal ingest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentFilter;
    use crate::normalizer::fakes::MapTextSource;
    use crate::sources::{FederalArchive, LegislativeArchive, LegislativeBundle};
    use crate::stores::MemoryStore;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_bill(
        root: &Path,
        file: &str,
        state: &str,
        title: &str,
        doc_id: u64,
        last_action: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let bill = json!({
            "bill": {
                "bill_id": 1,
                "state": state,
                "title": title,
                "description": "Relating to automated systems.",
                "status": 1,
                "status_date": "2024-02-10",
                "url": format!("https://legiscan.com/{state}/bill/{file}/2024"),
                "bill_number": file,
                "bill_type_id": "1",
                "sponsors": [{"name": "Jane Doe"}],
                "history": [{"date": "2024-02-10", "action": last_action}],
                "texts": [{"doc_id": doc_id}]
            }
        });
        fs::create_dir_all(root.join("bill"))?;
        fs::write(root.join("bill").join(format!("{file}.json")), bill.to_string())?;
        Ok(())
    }

    fn write_text(root: &Path, doc_id: u64, html: &str) -> Result<(), Box<dyn std::error::Error>> {
        let text = json!({
            "text": {"doc_id": doc_id, "mime_id": 1, "doc": STANDARD.encode(html)}
        });
        fs::create_dir_all(root.join("text"))?;
        fs::write(root.join("text").join(format!("{doc_id}.json")), text.to_string())?;
        Ok(())
    }

    fn archive(root: &Path) -> SourceArchive {
        SourceArchive {
            legislative: LegislativeArchive::from_root(&root.join("legiscan")),
            federal: FederalArchive::from_root(&root.join("govinfo")),
        }
    }

    #[tokio::test]
    async fn legislative_ingest_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = archive(dir.path());
        let legiscan = dir.path().join("legiscan");
        write_bill(&legiscan, "AB1", "CA", "Automated Decisions Act", 10, "Introduced")?;
        write_text(
            &legiscan,
            10,
            "<html><body><p>Regulates automated decision tools.</p><script>ai()</script></body></html>",
        )?;
        write_bill(&legiscan, "HB2", "ZZ", "Unknown State Act", 11, "Introduced")?;
        write_bill(&legiscan, "SB3", "NY", "Parks Act", 12, "Introduced")?;
        write_text(&legiscan, 12, "<p>Funding for state parks.</p>")?;
        fs::write(legiscan.join("bill").join("broken.json"), "{")?;

        let store = MemoryStore::new();
        let vocabulary = Vocabulary::standard()?;
        let first =
            ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;

        assert_eq!(first.added, 1);
        assert_eq!(first.not_added, 1);
        assert_eq!(first.skipped.len(), 2);
        assert!(first.skipped.iter().any(|skip| skip.reason.contains("ZZ")));

        let stored = store.list(&DocumentFilter::all()).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document.full_text, "Regulates automated decision tools.");
        assert_eq!(stored[0].document.keyword_counts.automated, 1);

        let writes = store.write_count();
        let second =
            ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;
        assert_eq!(second.unchanged, 1);
        assert_eq!(store.write_count(), writes);
        Ok(())
    }

    #[tokio::test]
    async fn new_history_entry_updates_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = archive(dir.path());
        let legiscan = dir.path().join("legiscan");
        write_bill(&legiscan, "AB1", "CA", "AI Act", 10, "Introduced")?;
        write_text(&legiscan, 10, "<p>artificial intelligence</p>")?;

        let store = MemoryStore::new();
        let vocabulary = Vocabulary::standard()?;
        ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;

        write_bill(&legiscan, "AB1", "CA", "AI Act", 10, "Passed Assembly")?;
        let report =
            ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;

        assert_eq!(report.updated, 1);
        let stored = store.list(&DocumentFilter::all()).await?;
        let details = stored[0].document.legislation.clone().ok_or("missing details")?;
        assert_eq!(details.last_action.as_deref(), Some("Passed Assembly"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_text_artifact_keeps_stored_bill() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = archive(dir.path());
        let legiscan = dir.path().join("legiscan");
        write_bill(&legiscan, "AB1", "CA", "AI Act", 10, "Introduced")?;
        write_text(&legiscan, 10, "<p>artificial intelligence</p>")?;

        let store = MemoryStore::new();
        let vocabulary = Vocabulary::standard()?;
        ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;
        let writes = store.write_count();

        fs::remove_file(legiscan.join("text").join("10.json"))?;
        let report =
            ingest_legislative(&archive, &store, &vocabulary, PipelineOptions::default()).await?;

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.not_added, 0);
        assert_eq!(store.write_count(), writes);
        let stored = store.list(&DocumentFilter::all()).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document.full_text, "artificial intelligence");
        Ok(())
    }

    #[tokio::test]
    async fn federal_ingest_reads_content_list() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = archive(dir.path());
        fs::create_dir_all(&archive.federal.txt_dir)?;
        fs::write(
            archive.federal.txt_dir.join("CHRG-118hhrg1.txt"),
            "Hearing on machine learning and deepfake media.",
        )?;

        let content = json!({
            "count": 3,
            "results": [
                {
                    "title": "Hearing on AI",
                    "packageId": "CHRG-118hhrg1",
                    "dateIssued": "2024-06-01",
                    "collectionCode": "CHRG",
                    "governmentAuthor": ["House", "Committee on Science"],
                    "download": {"txtLink": "https://api.govinfo.gov/packages/CHRG-118hhrg1/htm"}
                },
                {
                    "title": "Missing file",
                    "packageId": "CREC-2024-06-02",
                    "dateIssued": "2024-06-02",
                    "collectionCode": "CREC",
                    "download": {"txtLink": "https://api.govinfo.gov/packages/CREC-2024-06-02/htm"}
                },
                {"title": "No package id"}
            ]
        });
        fs::write(&archive.federal.content_list, content.to_string())?;

        let store = MemoryStore::new();
        let vocabulary = Vocabulary::standard()?;
        let report =
            ingest_federal(&archive, &store, &vocabulary, PipelineOptions::default()).await?;

        assert_eq!(report.added, 1);
        assert_eq!(report.not_added, 1);
        assert_eq!(report.skipped.len(), 1);

        let stored = store.list(&DocumentFilter::all()).await?;
        assert_eq!(stored[0].document.publisher, "Committee on Science");
        assert_eq!(stored[0].document.total_keyword_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_records_flow_through_pipeline() -> Result<(), Box<dyn std::error::Error>> {
        let bundle: LegislativeBundle = serde_json::from_value(json!({
            "bill": {
                "state": "TX",
                "title": "Chatbot Disclosure Act",
                "status": "2",
                "status_date": "2024-04-01",
                "url": "https://legiscan.com/TX/bill/HB9/2024",
                "bill_number": "HB9",
                "texts": [{"doc_id": "7"}]
            }
        }))?;
        let mut texts = MapTextSource::default();
        texts.legislative.insert(7, "A chatbot must disclose that it is a chatbot.".to_string());

        let store = MemoryStore::new();
        let vocabulary = Vocabulary::standard()?;
        let report = ingest_records(
            vec![RawRecord::Legislative(bundle)],
            &texts,
            &store,
            &vocabulary,
            PipelineOptions::default(),
        )
        .await?;

        assert_eq!(report.added, 1);
        let stored = store.list(&DocumentFilter::all()).await?;
        assert_eq!(stored[0].document.keyword_counts.chatbot, 2);
        assert_eq!(stored[0].document.keyword_snippets.len(), 2);
        Ok(())
    }
}
