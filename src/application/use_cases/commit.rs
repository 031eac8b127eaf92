use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::Result;
use crate::domain::import::{EntityKind, ImportResult};
use crate::infrastructure::db::RecordStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitSummary {
    pub entity: EntityKind,
    pub inserted: usize,
    pub skipped_invalid: usize,
    /// `None` when there was nothing to insert
    pub batch_id: Option<String>,
}

/// Writes the valid subset of a previewed import to the record store
pub struct CommitUseCase {
    store: Arc<dyn RecordStore + Send + Sync>,
}

impl CommitUseCase {
    pub fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self { store }
    }

    pub async fn existing_keys(&self, entity: EntityKind) -> Result<HashSet<String>> {
        self.store.existing_keys(entity).await
    }

    pub async fn commit(&self, result: &ImportResult) -> Result<CommitSummary> {
        let entity = result.entity();
        let payloads: Vec<_> = result.valid_records().map(|r| r.to_payload()).collect();

        if payloads.is_empty() {
            info!(entity = %entity, "No valid records to commit ({})", result.summary());
            return Ok(CommitSummary {
                entity,
                inserted: 0,
                skipped_invalid: result.invalid_count(),
                batch_id: None,
            });
        }

        let batch_id = Uuid::new_v4().to_string();
        let stored = self
            .store
            .insert_many(entity, &batch_id, &payloads)
            .await
            .map_err(|e| {
                error!(entity = %entity, batch_id = %batch_id, error = %e, "Import commit failed");
                e
            })?;

        info!(
            entity = %entity,
            batch_id = %batch_id,
            inserted = stored.len(),
            "Import committed ({})",
            result.summary()
        );

        Ok(CommitSummary {
            entity,
            inserted: stored.len(),
            skipped_invalid: result.invalid_count(),
            batch_id: Some(batch_id),
        })
    }
}
