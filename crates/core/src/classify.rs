//! Category and sector scoring through an external oracle, with a per-document
//! result cache so repeated sweeps only pay for documents never scored before.

use crate::models::{
    CategoryScores, Classification, Document, DocumentFilter, DocumentPatch, SectorScores,
    NOT_AVAILABLE,
};
use crate::traits::{ClassificationOracle, DocumentStore};
use crate::ClassifyError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ORACLE_TEXT_LIMIT: usize = 20_000;
pub const DEFAULT_ORACLE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-4o-mini";

const CLASSIFICATION_PROMPT: &str = r#"You categorize AI-related legislation and government documents (texts) by their relevance to four categories and nine sectors.

For each text, find the portions that explicitly pertain to AI, focusing on where these keywords appear: Artificial Intelligence/AI, Algorithm/Algorithmic, Machine Learning, Neural Network, Deep Learning, Automated Decision, Automation/Automated, Deepfake/Deep Fake, Synthetic Media, Large Language Model/LLM, Foundation Model, Chatbot, Recommender System.

Write thorough reasoning before scoring. Score every category and sector from 1 to 5:
1: Not relevant
2: Slightly relevant
3: Moderately relevant
4: Very relevant
5: Extremely relevant
Score three independent passes and report the average. A final score of 4 or 5 assigns the category, so avoid marginal associations. Interpret the descriptions broadly, including related terminology and concepts.

Categories:
Social Impact: the impact of AI on society and individuals, such as the carbon footprint of AI systems, developer accountability for outputs, fairness and bias metrics against AI-driven discrimination, use of AI by minors, consumer protections for AI products, psychological, physical or material harm from AI systems, and the role of AI in misinformation and trust in public institutions.
Data Governance: secure and accurate collection and management of data within AI systems, such as rectifying inaccuracies or biases in data sets, intellectual property in training data, encryption, anonymization, controlled access and consumer privacy compliance.
System Integrity: inherent security, transparency and control of AI systems, such as human intervention and oversight, interoperability in essential services, threat modeling, penetration testing and incident response.
Robustness: new benchmarks for AI performance, such as certification against benchmarks, compliance with international standards, auditing and transparent reporting, and specialized oversight bodies.

Sectors:
Politics and Elections: AI in political campaigns, electoral processes and related legislative activity.
Government Agencies and Public Services: AI used by state and federal agencies and in the delivery of public services.
Judicial System: AI in judicial and legal systems, including case management and legal decision making.
Healthcare: AI in hospitals and clinics, AI-enabled diagnostic tools and medical data management.
Private Enterprises, Labor, and Employment: AI in business, fair competition, labor markets, employment practices and corporate governance.
Academic and Research Institutions: AI in educational and research contexts.
International Cooperation and Standards: international cooperation on AI, multinational standards, cross-border data practices and global ethical guidelines.
Nonprofits and NGOs: AI used by nonprofits and non-governmental organizations.
Hybrid, Emerging, and Unclassified: texts that fit no other sector, or AI in hybrid or emerging sectors.

Answer with a JSON object with exactly these fields:
{
    "Category reasoning": "Reasoning about the category decisions",
    "Social impact": int,
    "Data governance": int,
    "System integrity": int,
    "Robustness": int,
    "Sector reasoning": "Reasoning about the sector decisions",
    "Politics and Elections": int,
    "Government Agencies and Public Services": int,
    "Judicial System": int,
    "Healthcare": int,
    "Private Enterprises, Labor, and Employment": int,
    "Academic and Research Institutions": int,
    "International Cooperation and Standards": int,
    "Nonprofits and NGOs": int,
    "Hybrid, Emerging, and Unclassified": int
}"#;

/// What the oracle sees of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub text: String,
}

impl ClassificationRequest {
    pub fn from_document(document: &Document) -> Self {
        let description = document.description.trim();
        Self {
            url: document.url.clone(),
            title: document.title.clone(),
            description: (!description.is_empty() && description != NOT_AVAILABLE)
                .then(|| document.description.clone()),
            text: document.full_text.chars().take(ORACLE_TEXT_LIMIT).collect(),
        }
    }

    pub fn user_content(&self) -> String {
        match &self.description {
            Some(description) => format!(
                "Title: {}\n Description: {}\n Text: {}",
                self.title, description, self.text
            ),
            None => format!("Title: {}\n Text: {}", self.title, self.text),
        }
    }
}

/// Oracle answer in its wire shape. Also the cache file format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OracleVerdict {
    #[serde(rename = "Category reasoning")]
    pub category_reasoning: String,
    #[serde(rename = "Social impact", deserialize_with = "score")]
    pub social_impact: u8,
    #[serde(rename = "Data governance", deserialize_with = "score")]
    pub data_governance: u8,
    #[serde(rename = "System integrity", deserialize_with = "score")]
    pub system_integrity: u8,
    #[serde(rename = "Robustness", deserialize_with = "score")]
    pub robustness: u8,
    #[serde(rename = "Sector reasoning")]
    pub sector_reasoning: String,
    #[serde(rename = "Politics and Elections", deserialize_with = "score")]
    pub politics_elections: u8,
    #[serde(rename = "Government Agencies and Public Services", deserialize_with = "score")]
    pub government_public: u8,
    #[serde(rename = "Judicial System", deserialize_with = "score")]
    pub judicial: u8,
    #[serde(rename = "Healthcare", deserialize_with = "score")]
    pub healthcare: u8,
    #[serde(rename = "Private Enterprises, Labor, and Employment", deserialize_with = "score")]
    pub private_enterprise: u8,
    #[serde(rename = "Academic and Research Institutions", deserialize_with = "score")]
    pub academic: u8,
    #[serde(rename = "International Cooperation and Standards", deserialize_with = "score")]
    pub international: u8,
    #[serde(rename = "Nonprofits and NGOs", deserialize_with = "score")]
    pub nonprofits: u8,
    #[serde(rename = "Hybrid, Emerging, and Unclassified", deserialize_with = "score")]
    pub other_sector: u8,
}

/// Averaged scores may come back fractional; they are rounded into 0..=5.
fn score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, 5.0) as u8)
}

impl From<OracleVerdict> for Classification {
    fn from(verdict: OracleVerdict) -> Self {
        Classification {
            categories: CategoryScores {
                societal_impact: verdict.social_impact,
                data_governance: verdict.data_governance,
                system_integrity: verdict.system_integrity,
                robustness: verdict.robustness,
            },
            category_reasoning: verdict.category_reasoning,
            sectors: SectorScores {
                politics_elections: verdict.politics_elections,
                government_public: verdict.government_public,
                judicial: verdict.judicial,
                healthcare: verdict.healthcare,
                private_enterprise: verdict.private_enterprise,
                academic: verdict.academic,
                international: verdict.international,
                nonprofits: verdict.nonprofits,
                other_sector: verdict.other_sector,
            },
            sector_reasoning: verdict.sector_reasoning,
        }
    }
}

/// One JSON file per document, named after its URL.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    directory: PathBuf,
}

impl AnalysisCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn cache_key(url: &str) -> String {
        let stripped = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        format!("{}.json", stripped.replace('/', ""))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.directory.join(Self::cache_key(url))
    }

    /// Unreadable or corrupt entries count as a miss.
    pub async fn load(&self, url: &str) -> Option<OracleVerdict> {
        let path = self.path_for(url);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(verdict) => Some(verdict),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "ignoring corrupt analysis cache entry"
                );
                None
            }
        }
    }

    pub async fn store(&self, url: &str, verdict: &OracleVerdict) -> Result<(), ClassifyError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let body = serde_json::to_string_pretty(verdict)?;
        tokio::fs::write(self.path_for(url), body).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ORACLE_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_ORACLE_MODEL.to_string(),
        }
    }
}

impl OracleConfig {
    /// Reads `LLM_ENDPOINT`, `LLM_API_KEY` (or `OPENAI_API_KEY`) and `LLM_MODEL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: non_empty_var("LLM_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: non_empty_var("LLM_API_KEY").or_else(|| non_empty_var("OPENAI_API_KEY")),
            model: non_empty_var("LLM_MODEL").unwrap_or(defaults.model),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Oracle backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatCompletionsOracle {
    client: Arc<Client>,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            config,
        }
    }

    fn request_body(&self, request: &ClassificationRequest) -> Value {
        json!({
            "model": self.config.model,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": CLASSIFICATION_PROMPT},
                {"role": "user", "content": request.user_content()}
            ]
        })
    }
}

#[async_trait]
impl ClassificationOracle for ChatCompletionsOracle {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<OracleVerdict, ClassifyError> {
        let mut call = self
            .client
            .post(&self.config.endpoint)
            .header("content-type", "application/json")
            .json(&self.request_body(request));

        if let Some(api_key) = &self.config.api_key {
            call = call.bearer_auth(api_key);
        }

        let response = call.send().await?;
        if !response.status().is_success() {
            return Err(ClassifyError::Oracle(format!(
                "classification request to {} returned {}",
                self.config.endpoint,
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        parse_completion(&payload)
    }
}

fn parse_completion(payload: &Value) -> Result<OracleVerdict, ClassifyError> {
    let content = payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifyError::Oracle("completion has no message content".to_string()))?;
    Ok(serde_json::from_str(content)?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub examined: u64,
    pub classified: u64,
    pub from_cache: u64,
    pub failed: Vec<(String, String)>,
}

/// Scores every unclassified document dated on or after `since`. The cache is
/// consulted first; fresh verdicts are written to it before the store is
/// updated. A failing oracle call is recorded and the sweep moves on.
pub async fn classify_documents<S, O>(
    store: &S,
    oracle: &O,
    cache: &AnalysisCache,
    since: NaiveDate,
) -> Result<ClassifyReport, ClassifyError>
where
    S: DocumentStore + Send + Sync,
    O: ClassificationOracle + Send + Sync,
{
    let filter = DocumentFilter {
        unclassified_only: true,
        status_date_from: Some(since),
        ..DocumentFilter::default()
    };
    let pending = store.list(&filter).await?;
    let mut report = ClassifyReport::default();

    for stored in pending {
        report.examined += 1;
        let url = stored.document.url.clone();

        let verdict = match cache.load(&url).await {
            Some(verdict) => {
                debug!(url = %url, "using cached analysis");
                report.from_cache += 1;
                verdict
            }
            None => {
                let request = ClassificationRequest::from_document(&stored.document);
                match oracle.classify(&request).await {
                    Ok(verdict) => {
                        cache.store(&url, &verdict).await?;
                        verdict
                    }
                    Err(error) => {
                        warn!(url = %url, error = %error, "classification failed");
                        report.failed.push((url, error.to_string()));
                        continue;
                    }
                }
            }
        };

        store
            .update(&stored.id, &DocumentPatch::Classification(verdict.into()))
            .await?;
        report.classified += 1;
    }

    info!(
        examined = report.examined,
        classified = report.classified,
        from_cache = report.from_cache,
        failed = report.failed.len(),
        "classification sweep finished"
    );
    Ok(report)
}
