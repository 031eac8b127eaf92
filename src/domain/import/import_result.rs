// ============================================================
// IMPORT RESULT
// ============================================================
// Aggregate of one parse run; superseded, never mutated

use serde::Serialize;

use super::{ColumnMapping, DelimiterChoice, EntityKind, ParsedRecord};

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    entity: EntityKind,
    total_count: usize,
    valid_count: usize,
    invalid_count: usize,

    /// `None` for JSON uploads
    delimiter: Option<DelimiterChoice>,

    mapping: ColumnMapping,
    records: Vec<ParsedRecord>,
}

impl ImportResult {
    pub fn new(
        entity: EntityKind,
        delimiter: Option<DelimiterChoice>,
        mapping: ColumnMapping,
        records: Vec<ParsedRecord>,
    ) -> Self {
        let valid_count = records.iter().filter(|r| r.is_valid()).count();

        Self {
            entity,
            total_count: records.len(),
            valid_count,
            invalid_count: records.len() - valid_count,
            delimiter,
            mapping,
            records,
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    pub fn delimiter(&self) -> Option<DelimiterChoice> {
        self.delimiter
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn records(&self) -> &[ParsedRecord] {
        &self.records
    }

    pub fn valid_records(&self) -> impl Iterator<Item = &ParsedRecord> {
        self.records.iter().filter(|r| r.is_valid())
    }

    /// Short count line for logs and notifications
    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} valid, {} invalid",
            self.total_count, self.valid_count, self.invalid_count
        )
    }
}
