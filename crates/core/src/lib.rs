pub mod classify;
pub mod codes;
pub mod error;
pub mod extractor;
pub mod govinfo;
pub mod ingest;
pub mod maintenance;
pub mod models;
pub mod normalizer;
pub mod reconcile;
pub mod scanner;
pub mod sources;
pub mod stores;
pub mod traits;
pub mod vocabulary;

pub use classify::{
    classify_documents, AnalysisCache, ChatCompletionsOracle, ClassificationRequest,
    ClassifyReport, OracleConfig, OracleVerdict,
};
pub use codes::{Jurisdiction, SourceCollection};
pub use error::{
    ClassifyError, ExtractError, FetchError, IngestError, NormalizeError, Result, StoreError,
};
pub use extractor::{
    extract_base64_text, extract_text, extract_text_with, html_to_text, LopdfExtractor,
    PdfExtractor, SourceFormat,
};
pub use govinfo::{FetchOptions, FetchReport, GovInfoClient};
pub use ingest::{ingest_federal, ingest_legislative, ingest_records, PipelineOptions};
pub use maintenance::{
    backfill_snippets, purge_collection, purge_zero_keyword, recount_keywords, SweepReport,
};
pub use models::{
    BillStatus, Classification, DedupKey, Document, DocumentFilter, DocumentId, DocumentMetadata,
    DocumentPatch, LegislativeDetails, StoredDocument,
};
pub use normalizer::Normalizer;
pub use reconcile::{decide, Decision, ReconcileReport, Reconciler};
pub use scanner::{scan, scan_with, KeywordScan, SnippetConfig};
pub use sources::{FederalArchive, LegislativeArchive, RawRecord, SourceArchive, TextSource};
pub use stores::{MemoryStore, OpenSearchStore};
pub use traits::{ClassificationOracle, DocumentStore};
pub use vocabulary::{KeywordCounts, KeywordField, KeywordTerm, Vocabulary, VOCABULARY_VERSION};
