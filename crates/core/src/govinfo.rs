//! Refreshes the federal content list from the GovInfo search API and
//! downloads the text or PDF behind every listed item that is not on disk yet.

use crate::sources::{FederalArchive, FederalResultBundle};
use crate::vocabulary::Vocabulary;
use crate::FetchError;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub const GOVINFO_SEARCH_URL: &str = "https://api.govinfo.gov/search";

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub collections: Vec<String>,
    pub lookback_days: i64,
    /// Largest page the search API returns. A larger `count` means results
    /// were cut off and the page is rejected.
    pub page_size: u64,
    pub search_url: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            collections: vec!["CFR".to_string(), "CHRG".to_string(), "CREC".to_string()],
            lookback_days: 30,
            page_size: 1000,
            search_url: GOVINFO_SEARCH_URL.to_string(),
        }
    }
}

pub fn search_query(collection: &str, since: NaiveDate, vocabulary: &Vocabulary) -> String {
    let content = vocabulary
        .phrases()
        .map(|phrase| format!("content:({phrase})"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "collection:({collection}) AND publishdate:range({},) AND ({content})",
        since.format("%Y-%m-%d")
    )
}

pub fn search_body(query: &str, page_size: u64) -> Value {
    json!({
        "query": query,
        "pageSize": page_size,
        "offsetMark": "*",
        "sorts": [{"field": "relevancy", "sortOrder": "DESC"}],
        "historical": true,
        "resultLevel": "default"
    })
}

pub fn check_result_count(
    collection: &str,
    bundle: &FederalResultBundle,
    cap: u64,
) -> Result<(), FetchError> {
    if bundle.count > cap {
        return Err(FetchError::TooManyResults {
            collection: collection.to_string(),
            count: bundle.count,
            cap,
        });
    }
    Ok(())
}

/// Appends unseen items to `existing` in arrival order and returns how many
/// were new.
pub fn merge_results(existing: &mut FederalResultBundle, incoming: FederalResultBundle) -> usize {
    let before = existing.results.len();
    for item in incoming.results {
        if !existing.results.contains(&item) {
            existing.results.push(item);
        }
    }
    existing.count = existing.results.len() as u64;
    existing.results.len() - before
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDownload {
    pub link: String,
    pub path: PathBuf,
}

/// Files listed in the content list but missing on disk. A text link wins
/// over a PDF link; items with neither are skipped.
pub fn plan_downloads(
    archive: &FederalArchive,
    bundle: &FederalResultBundle,
) -> Vec<PlannedDownload> {
    let mut planned = Vec::new();

    for item in bundle.items() {
        let item = match item {
            Ok(item) => item,
            Err(error) => {
                warn!(error = %error, "skipping malformed content list entry");
                continue;
            }
        };

        let (link, path) = if let Some(link) = item.download.txt_link.as_deref() {
            (link, archive.txt_path(&item))
        } else if let Some(link) = item.download.pdf_link.as_deref() {
            (link, archive.pdf_path(&item))
        } else {
            debug!(item = item.file_stem(), "no txt or pdf file available");
            continue;
        };

        if !path.is_file() {
            planned.push(PlannedDownload {
                link: link.to_string(),
                path,
            });
        }
    }

    planned
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub collections_queried: u64,
    pub items_added: u64,
    pub rejected: Vec<String>,
    pub downloaded: u64,
    pub failures: Vec<String>,
}

pub struct GovInfoClient {
    client: Arc<Client>,
    api_key: String,
    options: FetchOptions,
}

impl GovInfoClient {
    pub fn new(api_key: impl Into<String>, options: FetchOptions) -> Self {
        Self {
            client: Arc::new(Client::new()),
            api_key: api_key.into(),
            options,
        }
    }

    fn with_key(&self, link: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(link)?;
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        Ok(url)
    }

    pub async fn search(
        &self,
        collection: &str,
        since: NaiveDate,
        vocabulary: &Vocabulary,
    ) -> Result<FederalResultBundle, FetchError> {
        let query = search_query(collection, since, vocabulary);
        let body = search_body(&query, self.options.page_size);
        let response = self
            .client
            .post(self.with_key(&self.options.search_url)?)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            return Err(FetchError::Request(format!(
                "search for {collection} returned {status}: {details}"
            )));
        }

        let bundle: FederalResultBundle = response.json().await?;
        check_result_count(collection, &bundle, self.options.page_size)?;
        Ok(bundle)
    }

    pub async fn download(&self, planned: &PlannedDownload) -> Result<(), FetchError> {
        let response = self.client.get(self.with_key(&planned.link)?).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Request(format!(
                "download of {} returned {}",
                planned.link,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = planned.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&planned.path, &bytes).await?;
        Ok(())
    }

    /// Queries each configured collection for documents published in the
    /// lookback window, merges them into the content list and downloads the
    /// missing files. Rejected or failed collections do not stop the run.
    pub async fn refresh(
        &self,
        archive: &FederalArchive,
        vocabulary: &Vocabulary,
        today: NaiveDate,
    ) -> Result<FetchReport, FetchError> {
        let since = today - Duration::days(self.options.lookback_days);
        let mut content_list = archive.load_content_list()?;
        let mut report = FetchReport::default();

        for collection in &self.options.collections {
            report.collections_queried += 1;
            match self.search(collection, since, vocabulary).await {
                Ok(bundle) => {
                    let added = merge_results(&mut content_list, bundle);
                    info!(collection = %collection, added, "content list updated");
                    report.items_added += added as u64;
                }
                Err(error @ FetchError::TooManyResults { .. }) => {
                    warn!(error = %error, "search result rejected");
                    report.rejected.push(collection.clone());
                }
                Err(error) => {
                    warn!(collection = %collection, error = %error, "search failed");
                    report.failures.push(error.to_string());
                }
            }
        }

        if let Some(parent) = archive.content_list.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(&content_list)?;
        tokio::fs::write(&archive.content_list, serialized).await?;

        for planned in plan_downloads(archive, &content_list) {
            match self.download(&planned).await {
                Ok(()) => report.downloaded += 1,
                Err(error) => {
                    warn!(link = %planned.link, error = %error, "download failed");
                    report.failures.push(error.to_string());
                }
            }
        }

        Ok(report)
    }
}
