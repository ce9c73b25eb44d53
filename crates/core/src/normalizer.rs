use crate::codes::{Jurisdiction, SourceCollection};
use crate::error::NormalizeError;
use crate::extractor::{NO_TEXT_AVAILABLE, TEXT_NOT_FOUND};
use crate::models::{
    truncate_with_ellipsis, BillStatus, Classification, Document, LegislativeDetails,
    DESCRIPTION_MAX_CHARS, NOT_AVAILABLE, TITLE_MAX_CHARS,
};
use crate::scanner::{scan_with, SnippetConfig};
use crate::sources::{FederalItem, LegislativeBill, RawRecord, TextSource};
use crate::vocabulary::{KeywordCounts, Vocabulary};

/// Maps raw upstream records onto [`Document`], resolving text and running
/// the keyword scan along the way.
pub struct Normalizer<'a, T> {
    vocabulary: &'a Vocabulary,
    texts: &'a T,
    snippets: SnippetConfig,
}

impl<'a, T: TextSource> Normalizer<'a, T> {
    pub fn new(vocabulary: &'a Vocabulary, texts: &'a T) -> Self {
        Self {
            vocabulary,
            texts,
            snippets: SnippetConfig::default(),
        }
    }

    pub fn with_snippet_config(mut self, snippets: SnippetConfig) -> Self {
        self.snippets = snippets;
        self
    }

    pub fn normalize(&self, record: &RawRecord) -> Result<Document, NormalizeError> {
        let mut document = match record {
            RawRecord::Legislative(bundle) => self.legislative(&bundle.bill)?,
            RawRecord::Federal(item) => self.federal(item)?,
        };

        let scan = scan_with(&document.full_text, self.vocabulary, self.snippets);
        document.apply_scan(&scan);
        Ok(document)
    }

    fn legislative(&self, bill: &LegislativeBill) -> Result<Document, NormalizeError> {
        let jurisdiction = Jurisdiction::from_code(&bill.state)?;
        let last_entry = bill.history.last();

        let status_date = bill
            .status_date
            .or_else(|| last_entry.and_then(|entry| entry.date))
            .ok_or_else(|| NormalizeError::MissingField {
                field: "status_date",
                record: bill.title.clone(),
            })?;

        let primary_sponsor = bill
            .sponsors
            .first()
            .map(|sponsor| sponsor.name.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let details = LegislativeDetails {
            status: BillStatus::from_code(bill.status),
            bill_number: bill.bill_number.clone(),
            bill_type: bill
                .bill_type_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            primary_sponsor,
            total_sponsor_count: u32::try_from(bill.sponsors.len()).unwrap_or(u32::MAX),
            last_action: last_entry.and_then(|entry| entry.action.clone()),
            last_action_date: last_entry.and_then(|entry| entry.date),
        };

        Ok(Document {
            title: truncate_with_ellipsis(&bill.title, TITLE_MAX_CHARS),
            jurisdiction,
            source_collection: SourceCollection::LEGISLATION,
            status_date,
            description: truncate_with_ellipsis(&bill.description, DESCRIPTION_MAX_CHARS),
            full_text: self.resolve_legislative_text(bill)?,
            url: bill.url.clone(),
            publisher: NOT_AVAILABLE.to_string(),
            legislation: Some(details),
            keyword_counts: KeywordCounts::default(),
            total_keyword_count: 0,
            keyword_snippets: Vec::new(),
            classification: Classification::default(),
        })
    }

    fn federal(&self, item: &FederalItem) -> Result<Document, NormalizeError> {
        let source_collection = SourceCollection::from_code(item.collection())?;

        Ok(Document {
            title: truncate_with_ellipsis(&item.title, TITLE_MAX_CHARS),
            jurisdiction: Jurisdiction::FEDERAL,
            source_collection,
            status_date: item.date_issued,
            description: NOT_AVAILABLE.to_string(),
            full_text: self.texts.federal_text(item)?,
            url: item.details_url(),
            publisher: item
                .government_author
                .last()
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            legislation: None,
            keyword_counts: KeywordCounts::default(),
            total_keyword_count: 0,
            keyword_snippets: Vec::new(),
            classification: Classification::default(),
        })
    }

    /// Latest listed revision first, then the original filing, then the
    /// placeholder.
    pub fn resolve_legislative_text(
        &self,
        bill: &LegislativeBill,
    ) -> Result<String, NormalizeError> {
        let (Some(first), Some(latest)) = (bill.texts.first(), bill.texts.last()) else {
            return Ok(NO_TEXT_AVAILABLE.to_string());
        };

        if let Some(text) = self.texts.legislative_text(latest.doc_id)? {
            return Ok(text);
        }

        if first.doc_id != latest.doc_id {
            if let Some(text) = self.texts.legislative_text(first.doc_id)? {
                return Ok(text);
            }
        }

        Ok(TEXT_NOT_FOUND.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::MapTextSource;
    use super::*;
    use crate::sources::{FederalDownload, HistoryEntry, LegislativeBundle, Sponsor, TextReference};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn bill(texts: &[u64]) -> LegislativeBill {
        LegislativeBill {
            bill_id: Some(1),
            state: "NY".to_string(),
            title: "An act concerning automated employment decision tools".to_string(),
            description: "Requires audits.".to_string(),
            status: 1,
            status_date: Some(date(2024, 1, 10)),
            url: "https://legiscan.com/NY/bill/A1/2024".to_string(),
            bill_number: "A1".to_string(),
            bill_type_id: Some(1),
            sponsors: vec![
                Sponsor {
                    name: "Ada Lovelace".to_string(),
                },
                Sponsor {
                    name: "Alan Turing".to_string(),
                },
            ],
            history: vec![
                HistoryEntry {
                    date: Some(date(2024, 1, 10)),
                    action: Some("Introduced".to_string()),
                },
                HistoryEntry {
                    date: Some(date(2024, 2, 1)),
                    action: Some("Referred to committee".to_string()),
                },
            ],
            texts: texts.iter().map(|doc_id| TextReference { doc_id: *doc_id }).collect(),
        }
    }

    fn vocabulary() -> Vocabulary {
        Vocabulary::standard().expect("standard vocabulary compiles")
    }

    #[test]
    fn legislative_record_maps_to_document() -> Result<(), Box<dyn std::error::Error>> {
        let mut texts = MapTextSource::default();
        texts
            .legislative
            .insert(2, "Automated decision tools and an algorithm.".to_string());
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);

        let record = RawRecord::Legislative(LegislativeBundle { bill: bill(&[1, 2]) });
        let document = normalizer.normalize(&record)?;

        assert_eq!(document.jurisdiction.name(), "New York");
        assert!(document.source_collection.is_legislation());
        assert_eq!(document.total_keyword_count, 2);
        assert_eq!(document.keyword_snippets.len(), 2);
        let details = document.legislation.ok_or("missing details")?;
        assert_eq!(details.status, BillStatus::Introduced);
        assert_eq!(details.primary_sponsor, "Ada Lovelace");
        assert_eq!(details.total_sponsor_count, 2);
        assert_eq!(details.last_action.as_deref(), Some("Referred to committee"));
        assert_eq!(details.last_action_date, Some(date(2024, 2, 1)));
        Ok(())
    }

    #[test]
    fn text_falls_back_to_first_revision() -> Result<(), Box<dyn std::error::Error>> {
        let mut texts = MapTextSource::default();
        texts.legislative.insert(1, "original filing".to_string());
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);

        assert_eq!(
            normalizer.resolve_legislative_text(&bill(&[1, 2, 3]))?,
            "original filing"
        );
        assert_eq!(normalizer.resolve_legislative_text(&bill(&[4, 5]))?, TEXT_NOT_FOUND);
        assert_eq!(normalizer.resolve_legislative_text(&bill(&[]))?, NO_TEXT_AVAILABLE);
        Ok(())
    }

    #[test]
    fn unknown_jurisdiction_fails_the_record() {
        let texts = MapTextSource::default();
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);
        let mut raw = bill(&[]);
        raw.state = "ZZ".to_string();

        let result = normalizer.normalize(&RawRecord::Legislative(LegislativeBundle { bill: raw }));

        assert!(matches!(result, Err(NormalizeError::UnknownJurisdiction(_))));
    }

    #[test]
    fn anomalous_status_code_maps_to_other() -> Result<(), Box<dyn std::error::Error>> {
        let texts = MapTextSource::default();
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);
        let mut raw = bill(&[]);
        raw.status = 9;
        raw.sponsors.clear();

        let record = RawRecord::Legislative(LegislativeBundle { bill: raw });
        let document = normalizer.normalize(&record)?;
        let details = document.legislation.ok_or("missing details")?;

        assert_eq!(details.status, BillStatus::Other);
        assert_eq!(details.primary_sponsor, NOT_AVAILABLE);
        assert_eq!(details.total_sponsor_count, 0);
        assert_eq!(document.full_text, NO_TEXT_AVAILABLE);
        assert_eq!(document.total_keyword_count, 0);
        Ok(())
    }

    #[test]
    fn long_titles_are_truncated() -> Result<(), Box<dyn std::error::Error>> {
        let texts = MapTextSource::default();
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);
        let mut raw = bill(&[]);
        raw.title = "t".repeat(310);
        raw.description = "d".repeat(600);

        let record = RawRecord::Legislative(LegislativeBundle { bill: raw });
        let document = normalizer.normalize(&record)?;

        assert_eq!(document.title.chars().count(), 300);
        assert!(document.title.ends_with("..."));
        assert_eq!(document.description.chars().count(), 500);
        assert!(document.description.ends_with("..."));
        Ok(())
    }

    #[test]
    fn federal_record_maps_to_document() -> Result<(), Box<dyn std::error::Error>> {
        let mut texts = MapTextSource::default();
        texts.federal.insert(
            "CREC-2024-05-02-pt1-PgS1".to_string(),
            "Remarks on large language model safety.".to_string(),
        );
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);
        let item = FederalItem {
            title: "Senate session".to_string(),
            package_id: "CREC-2024-05-02".to_string(),
            granule_id: Some("CREC-2024-05-02-pt1-PgS1".to_string()),
            date_issued: date(2024, 5, 2),
            collection_code: "CREC".to_string(),
            government_author: vec!["Congress".to_string(), "Senate".to_string()],
            download: FederalDownload {
                txt_link: Some("https://api.govinfo.gov/x.htm".to_string()),
                pdf_link: None,
            },
        };

        let document = normalizer.normalize(&RawRecord::Federal(item))?;

        assert_eq!(document.source_collection.name(), "Congressional Record");
        assert_eq!(document.jurisdiction, Jurisdiction::FEDERAL);
        assert_eq!(document.publisher, "Senate");
        assert_eq!(document.keyword_counts.large_language_model, 1);
        assert!(document.legislation.is_none());
        assert_eq!(
            document.url,
            "https://govinfo.gov/app/details/CREC-2024-05-02/CREC-2024-05-02-pt1-PgS1/summary"
        );
        Ok(())
    }

    #[test]
    fn unknown_collection_fails_the_record() {
        let texts = MapTextSource::default();
        let vocabulary = vocabulary();
        let normalizer = Normalizer::new(&vocabulary, &texts);
        let item = FederalItem {
            title: "Mystery".to_string(),
            package_id: "X-1".to_string(),
            granule_id: None,
            date_issued: date(2024, 5, 2),
            collection_code: "XYZ".to_string(),
            government_author: Vec::new(),
            download: FederalDownload::default(),
        };

        let result = normalizer.normalize(&RawRecord::Federal(item));

        assert!(matches!(result, Err(NormalizeError::UnknownCollection(code)) if code == "XYZ"));
    }
}
