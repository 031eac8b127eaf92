use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, error, info};
use url::Url;

use super::{RecordStore, StoredRecord};
use crate::domain::error::{AppError, Result};
use crate::domain::import::EntityKind;

/// Managed backend exposing PostgREST-style table endpoints
pub struct RestRecordStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::ConfigError(format!("Invalid backend URL {}: {}", base_url, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    pub(crate) fn table_url(&self, entity: EntityKind) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{}", entity.schema().table))
            .map_err(|e| AppError::ConfigError(format!("Invalid table URL: {}", e)))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn ensure_success(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    error!(status = %status, body = %text, "Backend request failed: {}", action);
    Err(AppError::HttpError(format!(
        "Failed to {} ({}): {}",
        action, status, text
    )))
}

fn stored_from_row(row: serde_json::Value) -> StoredRecord {
    let id = match &row["id"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };
    let code = row["code"].as_str().map(str::to_string);

    StoredRecord {
        id,
        code,
        payload: row,
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert_many(
        &self,
        entity: EntityKind,
        batch_id: &str,
        payloads: &[serde_json::Map<String, serde_json::Value>],
    ) -> Result<Vec<StoredRecord>> {
        let url = self.table_url(entity)?;

        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=representation")
            .json(payloads)
            .send()
            .await
            .map_err(|e| AppError::HttpError(format!("Request failed: {}", e)))?;

        let response = ensure_success(response, "insert records").await?;
        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse JSON: {}", e)))?;

        info!(entity = %entity, batch_id = %batch_id, inserted = rows.len(), "Stored import batch");
        Ok(rows.into_iter().map(stored_from_row).collect())
    }

    async fn existing_keys(&self, entity: EntityKind) -> Result<HashSet<String>> {
        let url = self.table_url(entity)?;
        collect_keys(KEY_PAGE_SIZE, |offset, limit| {
            self.fetch_key_page(url.clone(), offset, limit)
        })
        .await
    }
}

impl RestRecordStore {
    async fn fetch_key_page(
        &self,
        mut url: Url,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>> {
        url.query_pairs_mut()
            .append_pair("select", "code")
            .append_pair("order", "code")
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::HttpError(format!("Request failed: {}", e)))?;

        let response = ensure_success(response, "fetch existing keys").await?;
        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse JSON: {}", e)))
    }
}

/// Rows requested per existing-key page
const KEY_PAGE_SIZE: usize = 1000;

/// Page through `code` rows until an empty page.
///
/// The server may cap a page below `page_size`, so a short page does not
/// end the scan; the offset advances by the rows actually returned.
async fn collect_keys<F, Fut>(page_size: usize, mut fetch_page: F) -> Result<HashSet<String>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<serde_json::Value>>>,
{
    let mut keys = HashSet::new();
    let mut offset = 0;

    loop {
        let rows = fetch_page(offset, page_size).await?;
        if rows.is_empty() {
            break;
        }
        offset += rows.len();
        keys.extend(
            rows.iter()
                .filter_map(|row| row["code"].as_str())
                .map(str::to_string),
        );
    }

    debug!(keys = keys.len(), rows = offset, "Fetched existing keys");
    Ok(keys)
}
