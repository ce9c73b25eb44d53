//! Upstream record shapes and the on-disk archives they are read from.
//!
//! Legislative bundles are one JSON file per bill, with each text revision
//! kept as a separate JSON file holding a base64 document. Federal items come
//! from a single content list next to `txt_files/` and `pdf_files/`.

use crate::error::NormalizeError;
use crate::extractor::{
    extract_base64_text, extract_text, SourceFormat, NO_TEXT_AVAILABLE, TEXT_NOT_FOUND,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Mime id marking an HTML text artifact; every other id is read as PDF.
pub const HTML_MIME_ID: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislativeBundle {
    pub bill: LegislativeBill,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislativeBill {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub bill_id: Option<u64>,
    pub state: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub status_date: Option<NaiveDate>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub bill_number: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub bill_type_id: Option<u32>,
    #[serde(default)]
    pub sponsors: Vec<Sponsor>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub texts: Vec<TextReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub action: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextReference {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub doc_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextArtifactBundle {
    pub text: TextArtifact,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextArtifact {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub doc_id: Option<u64>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub mime_id: u32,
    pub doc: String,
}

impl TextArtifact {
    pub fn format(&self) -> SourceFormat {
        if self.mime_id == HTML_MIME_ID {
            SourceFormat::Html
        } else {
            SourceFormat::Pdf
        }
    }

    pub fn plain_text(&self) -> String {
        extract_base64_text(&self.doc, self.format())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FederalDownload {
    #[serde(rename = "txtLink", default, skip_serializing_if = "Option::is_none")]
    pub txt_link: Option<String>,
    #[serde(rename = "pdfLink", default, skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FederalItem {
    pub title: String,
    pub package_id: String,
    #[serde(default)]
    pub granule_id: Option<String>,
    pub date_issued: NaiveDate,
    pub collection_code: String,
    #[serde(default)]
    pub government_author: Vec<String>,
    #[serde(default)]
    pub download: FederalDownload,
}

impl FederalItem {
    /// Last entry of the `;`-separated collection code list.
    pub fn collection(&self) -> &str {
        self.collection_code
            .rsplit(';')
            .next()
            .unwrap_or(&self.collection_code)
            .trim()
    }

    /// Identifier the downloaded file is stored under.
    pub fn file_stem(&self) -> &str {
        match self.granule_id.as_deref() {
            Some(granule) if !granule.is_empty() => granule,
            _ => &self.package_id,
        }
    }

    pub fn details_url(&self) -> String {
        let mut url = format!("https://govinfo.gov/app/details/{}", self.package_id);
        if let Some(granule) = self.granule_id.as_deref().filter(|value| !value.is_empty()) {
            url.push('/');
            url.push_str(granule);
        }
        url.push_str("/summary");
        url
    }
}

/// Search result page or the merged content list. Items are kept verbatim
/// so rewriting the list never drops upstream fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederalResultBundle {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl FederalResultBundle {
    pub fn items(&self) -> impl Iterator<Item = Result<FederalItem, serde_json::Error>> + '_ {
        self.results
            .iter()
            .map(|value| FederalItem::deserialize(value))
    }
}

/// One upstream record, tagged by the shape it arrived in.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Legislative(LegislativeBundle),
    Federal(FederalItem),
}

impl RawRecord {
    pub fn label(&self) -> String {
        match self {
            RawRecord::Legislative(bundle) => {
                format!("{} {}", bundle.bill.state, bundle.bill.bill_number)
            }
            RawRecord::Federal(item) => item.file_stem().to_string(),
        }
    }
}

/// Where resolved text lives for both upstream sources.
pub trait TextSource {
    fn legislative_text(&self, doc_id: u64) -> Result<Option<String>, NormalizeError>;

    fn federal_text(&self, item: &FederalItem) -> Result<String, NormalizeError>;
}

#[derive(Debug, Clone)]
pub struct LegislativeArchive {
    pub bill_dir: PathBuf,
    pub text_dir: PathBuf,
}

impl LegislativeArchive {
    /// Layout of a bulk cache root: `<root>/bill/*.json` and `<root>/text/*.json`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            bill_dir: root.join("bill"),
            text_dir: root.join("text"),
        }
    }

    pub fn discover_bill_files(&self) -> Vec<PathBuf> {
        discover_json_files(&self.bill_dir)
    }

    pub fn load_bill(&self, path: &Path) -> Result<LegislativeBundle, NormalizeError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn text_path(&self, doc_id: u64) -> PathBuf {
        self.text_dir.join(format!("{doc_id}.json"))
    }
}

#[derive(Debug, Clone)]
pub struct FederalArchive {
    pub content_list: PathBuf,
    pub txt_dir: PathBuf,
    pub pdf_dir: PathBuf,
}

impl FederalArchive {
    pub fn from_root(root: &Path) -> Self {
        Self {
            content_list: root.join("content_list.json"),
            txt_dir: root.join("txt_files"),
            pdf_dir: root.join("pdf_files"),
        }
    }

    pub fn load_content_list(&self) -> Result<FederalResultBundle, NormalizeError> {
        match fs::read_to_string(&self.content_list) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(FederalResultBundle::default()),
            Err(error) => Err(error.into()),
        }
    }

    pub fn txt_path(&self, item: &FederalItem) -> PathBuf {
        self.txt_dir.join(format!("{}.txt", item.file_stem()))
    }

    pub fn pdf_path(&self, item: &FederalItem) -> PathBuf {
        self.pdf_dir.join(format!("{}.pdf", item.file_stem()))
    }
}

/// Both archives behind one [`TextSource`].
#[derive(Debug, Clone)]
pub struct SourceArchive {
    pub legislative: LegislativeArchive,
    pub federal: FederalArchive,
}

impl TextSource for SourceArchive {
    fn legislative_text(&self, doc_id: u64) -> Result<Option<String>, NormalizeError> {
        let path = self.legislative.text_path(doc_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "text artifact missing");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let bundle: TextArtifactBundle = serde_json::from_str(&raw)?;
        Ok(Some(bundle.text.plain_text()))
    }

    fn federal_text(&self, item: &FederalItem) -> Result<String, NormalizeError> {
        let (path, format) = if item.download.txt_link.is_some() {
            (self.federal.txt_path(item), SourceFormat::PlainText)
        } else if item.download.pdf_link.is_some() {
            (self.federal.pdf_path(item), SourceFormat::Pdf)
        } else {
            return Ok(NO_TEXT_AVAILABLE.to_string());
        };

        match fs::read(&path) {
            Ok(bytes) => Ok(extract_text(&bytes, format)),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "federal text file missing");
                Ok(TEXT_NOT_FOUND.to_string())
            }
            Err(error) => Err(error.into()),
        }
    }
}

pub fn discover_json_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn legislative_bundle_accepts_numeric_strings() -> Result<(), Box<dyn std::error::Error>> {
        let raw = r#"{"bill": {
            "bill_id": "1650",
            "state": "TX",
            "title": "Relating to artificial intelligence",
            "status": "2",
            "status_date": "2024-02-01",
            "bill_number": "HB 9",
            "bill_type_id": 1,
            "texts": [{"doc_id": "77"}]
        }}"#;

        let bundle: LegislativeBundle = serde_json::from_str(raw)?;

        assert_eq!(bundle.bill.bill_id, Some(1650));
        assert_eq!(bundle.bill.status, 2);
        assert_eq!(bundle.bill.bill_type_id, Some(1));
        assert_eq!(bundle.bill.texts[0].doc_id, 77);
        assert!(bundle.bill.history.is_empty());
        Ok(())
    }

    #[test]
    fn federal_item_derives_identifiers() -> Result<(), Box<dyn std::error::Error>> {
        let raw = r#"{
            "title": "Hearing on automated systems",
            "packageId": "CHRG-118shrg1",
            "granuleId": null,
            "dateIssued": "2024-05-02",
            "collectionCode": "USCOURTS;CHRG",
            "governmentAuthor": ["Congress", "Senate"],
            "download": {"pdfLink": "https://api.govinfo.gov/x.pdf"}
        }"#;

        let item: FederalItem = serde_json::from_str(raw)?;

        assert_eq!(item.collection(), "CHRG");
        assert_eq!(item.file_stem(), "CHRG-118shrg1");
        assert_eq!(
            item.details_url(),
            "https://govinfo.gov/app/details/CHRG-118shrg1/summary"
        );
        Ok(())
    }

    #[test]
    fn discover_only_lists_json_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        File::create(dir.path().join("b.json"))?;
        File::create(dir.path().join("a.json"))?;
        File::create(dir.path().join(".DS_Store"))?;

        let files = discover_json_files(dir.path());

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.json"));
        Ok(())
    }

    #[test]
    fn missing_text_artifact_is_reported_as_absent() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = SourceArchive {
            legislative: LegislativeArchive::from_root(dir.path()),
            federal: FederalArchive::from_root(dir.path()),
        };

        assert_eq!(archive.legislative_text(42)?, None);
        Ok(())
    }

    #[test]
    fn html_text_artifact_is_decoded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = SourceArchive {
            legislative: LegislativeArchive::from_root(dir.path()),
            federal: FederalArchive::from_root(dir.path()),
        };
        fs::create_dir_all(&archive.legislative.text_dir)?;
        let doc = STANDARD.encode("<html><body><p>Deep learning audit</p></body></html>");
        fs::write(
            archive.legislative.text_dir.join("9.json"),
            format!(r#"{{"text": {{"doc_id": 9, "mime_id": 1, "doc": "{doc}"}}}}"#),
        )?;

        assert_eq!(
            archive.legislative_text(9)?.as_deref(),
            Some("Deep learning audit")
        );
        Ok(())
    }

    #[test]
    fn federal_text_falls_back_to_placeholders() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = SourceArchive {
            legislative: LegislativeArchive::from_root(dir.path()),
            federal: FederalArchive::from_root(dir.path()),
        };
        let mut item = FederalItem {
            title: "Record".to_string(),
            package_id: "CREC-2024-05-02".to_string(),
            granule_id: Some("CREC-2024-05-02-pt1-PgS1".to_string()),
            date_issued: NaiveDate::from_ymd_opt(2024, 5, 2).ok_or("bad date")?,
            collection_code: "CREC".to_string(),
            government_author: Vec::new(),
            download: FederalDownload::default(),
        };

        assert_eq!(archive.federal_text(&item)?, NO_TEXT_AVAILABLE);

        item.download.txt_link = Some("https://api.govinfo.gov/x.htm".to_string());
        assert_eq!(archive.federal_text(&item)?, TEXT_NOT_FOUND);

        fs::create_dir_all(&archive.federal.txt_dir)?;
        fs::write(archive.federal.txt_path(&item), "Chatbot remarks")?;
        assert_eq!(archive.federal_text(&item)?, "Chatbot remarks");
        Ok(())
    }

    #[test]
    fn missing_content_list_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let archive = FederalArchive::from_root(dir.path());
        assert!(archive.load_content_list()?.results.is_empty());
        Ok(())
    }
}
