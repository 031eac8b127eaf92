pub mod rest;
pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::error::Result;
use crate::domain::import::EntityKind;

pub use rest::RestRecordStore;
pub use sqlite::SqliteRecordStore;

/// A row as the backing store returned it after insertion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: String,
    pub code: Option<String>,
    pub payload: serde_json::Value,
}

/// Destination of committed imports.
///
/// `insert_many` is all-or-nothing: either every payload is stored or the
/// call fails and nothing is.
#[async_trait]
pub trait RecordStore {
    async fn insert_many(
        &self,
        entity: EntityKind,
        batch_id: &str,
        payloads: &[serde_json::Map<String, serde_json::Value>],
    ) -> Result<Vec<StoredRecord>>;

    /// Identifier values already present for `entity`
    async fn existing_keys(&self, entity: EntityKind) -> Result<HashSet<String>>;
}
