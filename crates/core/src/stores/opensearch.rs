use crate::models::{
    DedupKey, Document, DocumentFilter, DocumentId, DocumentPatch, StoredDocument,
};
use crate::stores::memory::document_id_for;
use crate::traits::DocumentStore;
use crate::vocabulary::KeywordCounts;
use crate::StoreError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

const BACKEND: &str = "opensearch";
const PAGE_SIZE: usize = 500;

const SCORE_FIELDS: [&str; 13] = [
    "classification.categories.societal_impact",
    "classification.categories.data_governance",
    "classification.categories.system_integrity",
    "classification.categories.robustness",
    "classification.sectors.politics_elections",
    "classification.sectors.government_public",
    "classification.sectors.judicial",
    "classification.sectors.healthcare",
    "classification.sectors.private_enterprise",
    "classification.sectors.academic",
    "classification.sectors.international",
    "classification.sectors.nonprofits",
    "classification.sectors.other_sector",
];

/// Document store on an OpenSearch index. The document id is the SHA-256 of
/// its URL, so a second insert of the same URL is rejected by the index.
pub struct OpenSearchStore {
    client: Arc<Client>,
    endpoint: String,
    index_name: String,
}

impl OpenSearchStore {
    pub fn new(endpoint: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            client: Arc::new(Client::new()),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            index_name: index_name.into(),
        }
    }

    fn index_url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.endpoint, self.index_name, suffix)
    }

    pub async fn ensure_index(&self) -> Result<(), StoreError> {
        let response = self.client.head(self.index_url("")).send().await?;

        if response.status() == StatusCode::OK {
            return Ok(());
        }

        if !response.status().is_client_error() {
            return Err(backend_error(response.status()));
        }

        let response = self
            .client
            .put(self.index_url(""))
            .json(&index_definition())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("index setup failed with {}", response.status()),
            });
        }

        Ok(())
    }

    async fn search_page(
        &self,
        query: &Value,
        search_after: Option<&Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut body = json!({
            "size": PAGE_SIZE,
            "query": query,
            "sort": [{"url": "asc"}]
        });
        if let Some(after) = search_after {
            body["search_after"] = after.clone();
        }

        let response = self
            .client
            .post(self.index_url("/_search"))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response)?;
        let response_json: Value = response.json().await?;

        Ok(response_json
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_all(&self, query: Value) -> Result<Vec<StoredDocument>, StoreError> {
        let mut result = Vec::new();
        let mut search_after: Option<Value> = None;

        loop {
            let hits = self.search_page(&query, search_after.as_ref()).await?;
            let page_len = hits.len();

            for raw in hits {
                search_after = raw.get("sort").cloned();
                result.push(stored_from_hit(raw)?);
            }

            if page_len < PAGE_SIZE || search_after.is_none() {
                break;
            }
        }

        debug!(index = %self.index_name, hits = result.len(), "opensearch scan finished");
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    async fn find(&self, key: &DedupKey) -> Result<Vec<StoredDocument>, StoreError> {
        let hits = self.search_all(key_query(key)).await?;
        Ok(hits
            .into_iter()
            .filter(|stored| key.matches(&stored.document))
            .collect())
    }

    async fn insert(&self, document: &Document) -> Result<DocumentId, StoreError> {
        let id = document_id_for(&document.url);
        let response = self
            .client
            .put(self.index_url(&format!("/_create/{id}?refresh=wait_for")))
            .json(document)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::UniqueViolation(document.url.clone()));
        }
        ensure_success(response)?;
        Ok(id)
    }

    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> Result<(), StoreError> {
        let partial = patch_body(patch)?;
        let response = self
            .client
            .post(self.index_url(&format!("/_update/{id}?refresh=wait_for")))
            .json(&json!({ "doc": partial }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        ensure_success(response)?;
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.index_url(&format!("/_doc/{id}?refresh=wait_for")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        ensure_success(response)?;
        Ok(())
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<u64, StoreError> {
        let response = self
            .client
            .post(self.index_url("/_count"))
            .json(&json!({ "query": filter_query(filter) }))
            .send()
            .await?;
        let response = ensure_success(response)?;
        let response_json: Value = response.json().await?;

        response_json
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "count response without a count".to_string(),
            })
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>, StoreError> {
        self.search_all(filter_query(filter)).await
    }
}

fn backend_error(status: StatusCode) -> StoreError {
    StoreError::BackendResponse {
        backend: BACKEND.to_string(),
        details: status.to_string(),
    }
}

fn ensure_success(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(backend_error(response.status()))
    }
}

fn stored_from_hit(raw: Value) -> Result<StoredDocument, StoreError> {
    let id = raw
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "search hit without an _id".to_string(),
        })?
        .to_string();
    let source = raw.get("_source").cloned().unwrap_or(Value::Null);

    Ok(StoredDocument {
        id: DocumentId(id),
        document: serde_json::from_value(source)?,
    })
}

fn index_definition() -> Value {
    let mut properties = json!({
        "title": {"type": "text", "fields": {"raw": {"type": "keyword"}}},
        "jurisdiction": {"type": "keyword"},
        "source_collection": {"type": "keyword"},
        "status_date": {"type": "date", "format": "yyyy-MM-dd"},
        "description": {"type": "text"},
        "full_text": {"type": "text"},
        "url": {"type": "keyword"},
        "publisher": {"type": "keyword"},
        "total_keyword_count": {"type": "integer"},
        "keyword_snippets": {"type": "text"}
    });

    if let Ok(Value::Object(counts)) = serde_json::to_value(KeywordCounts::default()) {
        for field in counts.keys() {
            properties[field.as_str()] = json!({"type": "integer"});
        }
    }

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": properties
        }
    })
}

fn key_query(key: &DedupKey) -> Value {
    let predicates = match key {
        DedupKey::Legislative {
            jurisdiction,
            title,
        } => vec![
            json!({"term": {"jurisdiction": jurisdiction.name()}}),
            json!({"term": {"title.raw": title}}),
        ],
        DedupKey::Federal {
            source_collection,
            title,
            status_date,
        } => vec![
            json!({"term": {"source_collection": source_collection.name()}}),
            json!({"term": {"title.raw": title}}),
            json!({"term": {"status_date": status_date.to_string()}}),
        ],
    };

    json!({"bool": {"filter": predicates}})
}

fn filter_query(filter: &DocumentFilter) -> Value {
    let mut predicates = Vec::new();
    let mut exclusions = Vec::new();

    if let Some(collection) = filter.source_collection {
        predicates.push(json!({"term": {"source_collection": collection.name()}}));
    }
    if filter.zero_keywords_only {
        predicates.push(json!({"term": {"total_keyword_count": 0}}));
    }
    if let Some(from) = filter.status_date_from {
        predicates.push(json!({"range": {"status_date": {"gte": from.to_string()}}}));
    }
    if filter.unclassified_only {
        exclusions.extend(
            SCORE_FIELDS
                .iter()
                .map(|field| json!({"range": {*field: {"gt": 0}}})),
        );
    }
    if filter.missing_snippets_only {
        exclusions.push(json!({"exists": {"field": "keyword_snippets"}}));
    }

    if predicates.is_empty() && exclusions.is_empty() {
        return json!({"match_all": {}});
    }

    json!({"bool": {"filter": predicates, "must_not": exclusions}})
}

/// Partial document for the `_update` API. Objects merge recursively, so a
/// metadata patch leaves the rest of the legislative details in place.
fn patch_body(patch: &DocumentPatch) -> Result<Value, StoreError> {
    let mut body = Map::new();

    match patch {
        DocumentPatch::Metadata(metadata) => {
            body.insert("status_date".to_string(), serde_json::to_value(metadata.status_date)?);
            if let Some(status) = metadata.status {
                body.insert(
                    "legislation".to_string(),
                    json!({
                        "status": status,
                        "last_action": metadata.last_action,
                        "last_action_date": metadata.last_action_date,
                    }),
                );
            }
        }
        DocumentPatch::Keywords {
            counts,
            total,
            snippets,
        } => {
            if let Value::Object(fields) = serde_json::to_value(counts)? {
                body.extend(fields);
            }
            body.insert("total_keyword_count".to_string(), json!(total));
            body.insert("keyword_snippets".to_string(), json!(snippets));
        }
        DocumentPatch::Snippets(snippets) => {
            body.insert("keyword_snippets".to_string(), json!(snippets));
        }
        DocumentPatch::Classification(classification) => {
            body.insert("classification".to_string(), serde_json::to_value(classification)?);
        }
    }

    Ok(Value::Object(body))
}
