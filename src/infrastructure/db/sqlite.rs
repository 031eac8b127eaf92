use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::{RecordStore, StoredRecord};
use crate::domain::error::{AppError, Result};
use crate::domain::import::EntityKind;

/// Local store keeping every imported record as a JSON payload
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to ":memory:" is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS import_records (
                id TEXT PRIMARY KEY,
                batch_id TEXT NOT NULL,
                entity TEXT NOT NULL,
                code TEXT,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(entity, code)
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        debug!(database_url = %database_url, "Import record store ready");
        Ok(Self { pool })
    }

    /// Stored records of one entity, oldest first
    pub async fn list(&self, entity: EntityKind) -> Result<Vec<StoredRecord>> {
        sqlx::query_as::<_, ImportRecordEntity>(
            "SELECT id, code, payload FROM import_records WHERE entity = ? ORDER BY created_at, rowid",
        )
        .bind(entity.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch records: {}", e)))?
        .into_iter()
        .map(StoredRecord::try_from)
        .collect()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_many(
        &self,
        entity: EntityKind,
        batch_id: &str,
        payloads: &[serde_json::Map<String, serde_json::Value>],
    ) -> Result<Vec<StoredRecord>> {
        let created_at = chrono::Utc::now().timestamp_millis();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let mut stored = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let id = uuid::Uuid::new_v4().to_string();
            let code = payload
                .get("code")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let payload_json = serde_json::to_string(payload)?;

            sqlx::query(
                "INSERT INTO import_records (id, batch_id, entity, code, payload, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(batch_id)
            .bind(entity.as_str())
            .bind(&code)
            .bind(&payload_json)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to insert {} {}: {}",
                    entity,
                    code.as_deref().unwrap_or("record"),
                    e
                ))
            })?;

            stored.push(StoredRecord {
                id,
                code,
                payload: serde_json::Value::Object(payload.clone()),
            });
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        info!(entity = %entity, batch_id = %batch_id, inserted = stored.len(), "Stored import batch");
        Ok(stored)
    }

    async fn existing_keys(&self, entity: EntityKind) -> Result<HashSet<String>> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT code FROM import_records WHERE entity = ? AND code IS NOT NULL",
        )
        .bind(entity.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch existing keys: {}", e)))?;

        Ok(codes.into_iter().collect())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct ImportRecordEntity {
    id: String,
    code: Option<String>,
    payload: String,
}

impl TryFrom<ImportRecordEntity> for StoredRecord {
    type Error = AppError;

    fn try_from(e: ImportRecordEntity) -> Result<Self> {
        Ok(Self {
            id: e.id,
            code: e.code,
            payload: serde_json::from_str(&e.payload)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_existing_keys() {
        let store = SqliteRecordStore::init("sqlite::memory:").await.unwrap();
        let payloads = vec![
            payload(json!({"code": "CTRL-001", "name": "Access Control"})),
            payload(json!({"code": "CTRL-002", "name": "Backups"})),
        ];

        let stored = store
            .insert_many(EntityKind::Control, "batch-1", &payloads)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].code.as_deref(), Some("CTRL-001"));

        let keys = store.existing_keys(EntityKind::Control).await.unwrap();
        assert!(keys.contains("CTRL-001") && keys.contains("CTRL-002"));
        assert!(store.existing_keys(EntityKind::Vendor).await.unwrap().is_empty());

        let listed = store.list(EntityKind::Control).await.unwrap();
        assert_eq!(listed[1].payload["name"], "Backups");
    }

    #[tokio::test]
    async fn test_insert_is_all_or_nothing() {
        let store = SqliteRecordStore::init("sqlite::memory:").await.unwrap();
        store
            .insert_many(
                EntityKind::Vendor,
                "batch-1",
                &[payload(json!({"code": "VND-001", "name": "Acme"}))],
            )
            .await
            .unwrap();

        let err = store
            .insert_many(
                EntityKind::Vendor,
                "batch-2",
                &[
                    payload(json!({"code": "VND-002", "name": "Globex"})),
                    payload(json!({"code": "VND-001", "name": "Acme again"})),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));

        let listed = store.list(EntityKind::Vendor).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
