// ============================================================
// PARSED RECORD
// ============================================================
// One normalized output row with its validation outcome

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Typed value of a canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
}

impl FieldValue {
    /// Optional text: empty strings become `Null`
    pub fn text_or_null(value: &str) -> Self {
        if value.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::Text(value.to_string())
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Integer(n) => serde_json::Value::from(*n),
            FieldValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A single imported row.
///
/// Validity is derived from `errors`, so the two can never disagree.
/// Warnings (e.g. an enum value replaced by its default) do not affect validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    row_number: usize,
    values: BTreeMap<String, FieldValue>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ParsedRecord {
    pub fn new(
        row_number: usize,
        values: BTreeMap<String, FieldValue>,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            row_number,
            values,
            errors,
            warnings,
        }
    }

    /// 1-based position among non-blank data lines
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Row in the shape the record store expects
    pub fn to_payload(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl Serialize for ParsedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ParsedRecord", 5)?;
        state.serialize_field("row_number", &self.row_number)?;
        state.serialize_field("values", &self.values)?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.serialize_field("is_valid", &self.is_valid())?;
        state.end()
    }
}
