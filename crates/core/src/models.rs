use crate::codes::{Jurisdiction, SourceCollection};
use crate::scanner::KeywordScan;
use crate::vocabulary::KeywordCounts;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TITLE_MAX_CHARS: usize = 300;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const ELLIPSIS: &str = "...";
pub const NOT_AVAILABLE: &str = "N/A";

/// Cuts `value` to at most `max_chars` characters, ending in [`ELLIPSIS`]
/// whenever anything was removed.
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated = value.chars().take(keep).collect::<String>();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BillStatus {
    Other,
    Introduced,
    Engrossed,
    Enrolled,
    Passed,
    Vetoed,
}

impl BillStatus {
    const ORDERED: [BillStatus; 6] = [
        BillStatus::Other,
        BillStatus::Introduced,
        BillStatus::Engrossed,
        BillStatus::Enrolled,
        BillStatus::Passed,
        BillStatus::Vetoed,
    ];

    /// Upstream progress code. Anything outside 1..=5 is `Other`.
    pub fn from_code(code: i64) -> Self {
        match usize::try_from(code) {
            Ok(index @ 1..=5) => Self::ORDERED[index],
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegislativeDetails {
    pub status: BillStatus,
    pub bill_number: String,
    pub bill_type: String,
    pub primary_sponsor: String,
    pub total_sponsor_count: u32,
    pub last_action: Option<String>,
    pub last_action_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScores {
    pub societal_impact: u8,
    pub data_governance: u8,
    pub system_integrity: u8,
    pub robustness: u8,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectorScores {
    pub politics_elections: u8,
    pub government_public: u8,
    pub judicial: u8,
    pub healthcare: u8,
    pub private_enterprise: u8,
    pub academic: u8,
    pub international: u8,
    pub nonprofits: u8,
    pub other_sector: u8,
}

/// Oracle scores. All zero means the document has not been classified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub categories: CategoryScores,
    pub category_reasoning: String,
    pub sectors: SectorScores,
    pub sector_reasoning: String,
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        self.categories != CategoryScores::default() || self.sectors != SectorScores::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub jurisdiction: Jurisdiction,
    pub source_collection: SourceCollection,
    pub status_date: NaiveDate,
    pub description: String,
    pub full_text: String,
    pub url: String,
    pub publisher: String,
    pub legislation: Option<LegislativeDetails>,
    #[serde(flatten)]
    pub keyword_counts: KeywordCounts,
    pub total_keyword_count: u32,
    pub keyword_snippets: Vec<String>,
    pub classification: Classification,
}

impl Document {
    pub fn dedup_key(&self) -> DedupKey {
        if self.source_collection.is_legislation() {
            DedupKey::Legislative {
                jurisdiction: self.jurisdiction,
                title: self.title.clone(),
            }
        } else {
            DedupKey::Federal {
                source_collection: self.source_collection,
                title: self.title.clone(),
                status_date: self.status_date,
            }
        }
    }

    pub fn apply_scan(&mut self, scan: &KeywordScan) {
        self.keyword_counts = scan.counts;
        self.total_keyword_count = scan.total;
        self.keyword_snippets = scan.snippets.clone();
    }

    pub fn metadata(&self) -> DocumentMetadata {
        let legislation = self.legislation.as_ref();
        DocumentMetadata {
            status_date: self.status_date,
            status: legislation.map(|details| details.status),
            last_action: legislation.and_then(|details| details.last_action.clone()),
            last_action_date: legislation.and_then(|details| details.last_action_date),
        }
    }
}

/// Field tuple deciding whether an incoming document already exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DedupKey {
    Legislative {
        jurisdiction: Jurisdiction,
        title: String,
    },
    Federal {
        source_collection: SourceCollection,
        title: String,
        status_date: NaiveDate,
    },
}

impl DedupKey {
    pub fn matches(&self, document: &Document) -> bool {
        *self == document.dedup_key()
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupKey::Legislative {
                jurisdiction,
                title,
            } => write!(f, "{jurisdiction} / {title}"),
            DedupKey::Federal {
                source_collection,
                title,
                status_date,
            } => write!(f, "{source_collection} / {title} / {status_date}"),
        }
    }
}

/// Fields that change as a bill moves through the legislature without its
/// text changing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub status_date: NaiveDate,
    pub status: Option<BillStatus>,
    pub last_action: Option<String>,
    pub last_action_date: Option<NaiveDate>,
}

impl DocumentMetadata {
    /// Status and last action agree. `status_date` is written on update but
    /// does not by itself make a record stale.
    pub fn same_progress(&self, other: &DocumentMetadata) -> bool {
        self.status == other.status
            && self.last_action == other.last_action
            && self.last_action_date == other.last_action_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub document: Document,
}

/// Partial update accepted by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPatch {
    Metadata(DocumentMetadata),
    Keywords {
        counts: KeywordCounts,
        total: u32,
        snippets: Vec<String>,
    },
    Snippets(Vec<String>),
    Classification(Classification),
}

impl DocumentPatch {
    pub fn keywords(scan: &KeywordScan) -> Self {
        Self::Keywords {
            counts: scan.counts,
            total: scan.total,
            snippets: scan.snippets.clone(),
        }
    }

    pub fn apply_to(&self, document: &mut Document) {
        match self {
            DocumentPatch::Metadata(metadata) => {
                document.status_date = metadata.status_date;
                if let Some(details) = document.legislation.as_mut() {
                    if let Some(status) = metadata.status {
                        details.status = status;
                    }
                    details.last_action = metadata.last_action.clone();
                    details.last_action_date = metadata.last_action_date;
                }
            }
            DocumentPatch::Keywords {
                counts,
                total,
                snippets,
            } => {
                document.keyword_counts = *counts;
                document.total_keyword_count = *total;
                document.keyword_snippets = snippets.clone();
            }
            DocumentPatch::Snippets(snippets) => {
                document.keyword_snippets = snippets.clone();
            }
            DocumentPatch::Classification(classification) => {
                document.classification = classification.clone();
            }
        }
    }
}

/// Selection used by sweeps and counts. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub source_collection: Option<SourceCollection>,
    pub zero_keywords_only: bool,
    pub unclassified_only: bool,
    pub missing_snippets_only: bool,
    pub status_date_from: Option<NaiveDate>,
}

impl DocumentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn collection(source_collection: SourceCollection) -> Self {
        Self {
            source_collection: Some(source_collection),
            ..Self::default()
        }
    }

    pub fn zero_keywords() -> Self {
        Self {
            zero_keywords_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        if let Some(collection) = self.source_collection {
            if document.source_collection != collection {
                return false;
            }
        }
        if self.zero_keywords_only && document.total_keyword_count != 0 {
            return false;
        }
        if self.unclassified_only && document.classification.is_classified() {
            return false;
        }
        if self.missing_snippets_only && !document.keyword_snippets.is_empty() {
            return false;
        }
        if let Some(from) = self.status_date_from {
            if document.status_date < from {
                return false;
            }
        }
        true
    }
}
