// ============================================================
// FIELD MAPPING
// ============================================================
// Header -> canonical field associations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied mapping: raw header -> canonical key, `None` = unmapped
pub type FieldMapping = HashMap<String, Option<String>>;

/// One resolved column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    /// Zero-based column position in the tokenized row
    pub index: usize,

    /// Header text as it appears in the file
    pub header: String,

    /// Canonical field key
    pub field: String,
}

/// Resolved mapping for one file, ordered by column index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: Vec<MappedColumn>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `field` for column `index`. Returns false if the field is already taken.
    pub fn assign(&mut self, index: usize, header: &str, field: &str) -> bool {
        if self.contains_field(field) {
            return false;
        }

        self.columns.push(MappedColumn {
            index,
            header: header.to_string(),
            field: field.to_string(),
        });
        self.columns.sort_by_key(|c| c.index);
        true
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c.field == field)
    }

    pub fn field_for_index(&self, index: usize) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.field.as_str())
    }

    pub fn columns(&self) -> &[MappedColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw `{field: value}` for one tokenized row; missing trailing cells read as empty
    pub fn extract(&self, values: &[String]) -> HashMap<String, String> {
        self.columns
            .iter()
            .map(|c| {
                let value = values.get(c.index).map(|v| v.trim()).unwrap_or("");
                (c.field.clone(), value.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_claimed_once() {
        let mut mapping = ColumnMapping::new();
        assert!(mapping.assign(0, "Code", "code"));
        assert!(!mapping.assign(2, "ID", "code"));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.field_for_index(0), Some("code"));
        assert_eq!(mapping.field_for_index(2), None);
    }

    #[test]
    fn test_extract_ignores_unmapped_and_short_rows() {
        let mut mapping = ColumnMapping::new();
        mapping.assign(2, "Weight", "weight");
        mapping.assign(0, "Code", "code");

        let raw = mapping.extract(&["CTRL-1".to_string(), "ignored".to_string()]);
        assert_eq!(raw.get("code").map(String::as_str), Some("CTRL-1"));
        assert_eq!(raw.get("weight").map(String::as_str), Some(""));
        assert_eq!(raw.len(), 2);
    }
}
