use std::{collections::HashMap, fmt::Write as _, time::Duration};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{error::AppError, utils::config::AppConfig};

use super::{
    document_store::DocumentStore,
    types::{
        bulk::{BulkItemResult, BulkReport, IndexCreation},
        document::Document,
        search_hit::StoreHit,
    },
};

/// Elasticsearch REST client implementing the document store contract.
#[derive(Clone)]
pub struct ElasticsearchClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
}

#[derive(Debug, Deserialize)]
struct AcknowledgedResponse {
    #[serde(default)]
    acknowledged: bool,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkResponseItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkResponseItem {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchResponseHit>,
}

#[derive(Debug, Deserialize)]
struct SearchResponseHit {
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: Document,
}

impl ElasticsearchClient {
    pub fn new(
        base_url: &str,
        username: Option<&str>,
        password: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|err| {
            AppError::Validation(format!("invalid elasticsearch url '{base_url}': {err}"))
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let credentials =
            username.map(|user| (user.to_string(), password.map(ToString::to_string)));

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            &config.elasticsearch_url,
            config.es_username.as_deref(),
            config.es_password.as_deref(),
            Duration::from_secs(config.elasticsearch_timeout_secs),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!("elasticsearch url '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, AppError> {
        let builder = self.http.request(method, self.endpoint(segments)?);
        Ok(match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_deref()),
            None => builder,
        })
    }

    async fn ensure_success(response: Response, operation: &str) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("{operation} failed with status {status}: {body}");
        if AppError::is_transient_status(status.as_u16()) {
            Err(AppError::Transport(message))
        } else {
            Err(AppError::Store(message))
        }
    }

    fn bulk_body(index: &str, documents: &[Document]) -> Result<String, AppError> {
        let mut body = String::new();
        for document in documents {
            let action = json!({ "index": { "_index": index, "_id": document.id } });
            let source = serde_json::to_string(document)?;
            writeln!(body, "{action}\n{source}")
                .map_err(|err| AppError::InternalError(err.to_string()))?;
        }
        Ok(body)
    }

    fn bulk_report(response: BulkResponse, documents: &[Document]) -> BulkReport {
        if !response.errors {
            return BulkReport {
                items: documents
                    .iter()
                    .map(|document| BulkItemResult {
                        id: document.id.clone(),
                        error: None,
                    })
                    .collect(),
            };
        }

        // Documents without a matching item are counted as failed.
        let mut results = response.items.into_iter();
        let items = documents
            .iter()
            .map(|document| {
                let result = results
                    .next()
                    .and_then(|mut item| item.remove("index").or_else(|| item.into_values().next()));
                match result {
                    Some(result) => BulkItemResult {
                        id: result.id.unwrap_or_else(|| document.id.clone()),
                        error: result.error.map(|error| error.to_string()),
                    },
                    None => BulkItemResult {
                        id: document.id.clone(),
                        error: Some("missing bulk item result".to_string()),
                    },
                }
            })
            .collect();

        BulkReport { items }
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchClient {
    fn source_name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn create_index(&self, index: &str, schema: &Value) -> Result<IndexCreation, AppError> {
        let exists = self.request(Method::HEAD, &[index])?.send().await?;
        if exists.status().is_success() {
            info!(index, "Index already exists");
            return Ok(IndexCreation::AlreadyExists);
        }
        if exists.status() != StatusCode::NOT_FOUND {
            Self::ensure_success(exists, "index existence check").await?;
        }

        let response = self.request(Method::PUT, &[index])?.json(schema).send().await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let body: Value = response.json().await?;
            if body["error"]["type"] == "resource_already_exists_exception" {
                info!(index, "Index created concurrently; treating as existing");
                return Ok(IndexCreation::AlreadyExists);
            }
            return Err(AppError::Store(format!("create index '{index}' rejected: {body}")));
        }

        let response = Self::ensure_success(response, "create index").await?;
        let ack: AcknowledgedResponse = response.json().await?;
        if ack.acknowledged {
            info!(index, "Successfully created index");
            Ok(IndexCreation::Created)
        } else {
            Ok(IndexCreation::NotAcknowledged)
        }
    }

    async fn bulk_write(
        &self,
        index: &str,
        documents: &[Document],
    ) -> Result<BulkReport, AppError> {
        if documents.is_empty() {
            return Ok(BulkReport::default());
        }

        let body = Self::bulk_body(index, documents)?;
        let response = self
            .request(Method::POST, &["_bulk"])?
            .query(&[("refresh", "true")])
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let response = Self::ensure_success(response, "bulk write").await?;
        let parsed: BulkResponse = response.json().await?;
        debug!(index, documents = documents.len(), errors = parsed.errors, "Bulk write answered");

        Ok(Self::bulk_report(parsed, documents))
    }

    async fn get_by_id(&self, index: &str, id: &str) -> Result<Option<Document>, AppError> {
        let response = self.request(Method::GET, &[index, "_doc", id])?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::ensure_success(response, "get document").await?;
        let parsed: GetResponse = response.json().await?;
        Ok(parsed.source.filter(|_| parsed.found))
    }

    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
        offset: usize,
    ) -> Result<Vec<StoreHit>, AppError> {
        let body = json!({ "query": query, "size": size, "from": offset });
        let response = self
            .request(Method::POST, &[index, "_search"])?
            .json(&body)
            .send()
            .await?;
        let response = Self::ensure_success(response, "search").await?;
        let parsed: SearchResponse = response.json().await?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| StoreHit {
                score: hit.score.unwrap_or_default(),
                document: hit.source,
            })
            .collect())
    }

    async fn update_index_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, AppError> {
        let response = self
            .request(Method::PUT, &[index, "_settings"])?
            .json(settings)
            .send()
            .await?;
        let response = Self::ensure_success(response, "update index settings").await?;
        let ack: AcknowledgedResponse = response.json().await?;
        Ok(ack.acknowledged)
    }
}
