// Header -> canonical field resolution.
//
// Aliases live in the entity synonym tables; this module only matches them.
// Both sides are normalized: lowercase, no underscores, hyphens or whitespace.

use std::collections::HashMap;

use crate::domain::error::{AppError, Result};
use crate::domain::import::{ColumnMapping, EntitySchema, FieldMapping};

pub fn normalize_header(s: &str) -> String {
    s.trim()
        .trim_matches('"')
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == '_' || *c == '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical key whose alias set contains `normalized`, in schema priority order
fn match_field(
    normalized: &str,
    schema: &EntitySchema,
    taken: impl Fn(&str) -> bool,
) -> Option<&'static str> {
    schema
        .fields
        .iter()
        .filter(|field| !taken(field.key))
        .find(|field| {
            normalize_header(field.key) == normalized
                || normalize_header(field.label) == normalized
                || schema
                    .aliases(field.key)
                    .iter()
                    .any(|alias| normalize_header(alias) == normalized)
        })
        .map(|field| field.key)
}

/// Synonym-based mapping, first come first served from left to right
pub fn auto_map(headers: &[String], schema: &EntitySchema) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();

    for (index, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            continue;
        }

        if let Some(key) = match_field(&normalized, schema, |k| mapping.contains_field(k)) {
            mapping.assign(index, header, key);
        }
    }

    mapping
}

/// Mapping picked by a person in the mapping UI.
///
/// Headers missing from `explicit` or mapped to `None` stay unmapped.
/// Naming a field the entity does not have is a file-level error.
pub fn explicit_map(
    headers: &[String],
    explicit: &FieldMapping,
    schema: &EntitySchema,
) -> Result<ColumnMapping> {
    for target in explicit.values().flatten() {
        if schema.field(target).is_none() {
            return Err(AppError::ValidationError(format!(
                "Unknown {} field in mapping: {}",
                schema.kind, target
            )));
        }
    }

    let mut mapping = ColumnMapping::new();
    for (index, header) in headers.iter().enumerate() {
        let target = explicit
            .get(header)
            .or_else(|| explicit.get(header.trim()))
            .and_then(|t| t.as_deref());

        if let Some(key) = target {
            mapping.assign(index, header, key);
        }
    }

    Ok(mapping)
}

/// Fails with every required field that has no column
pub fn ensure_required(mapping: &ColumnMapping, schema: &EntitySchema) -> Result<()> {
    let missing: Vec<String> = schema
        .required_fields()
        .filter(|f| !mapping.contains_field(f.key))
        .map(|f| format!("{} ({})", f.key, f.label))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingRequiredFields(missing))
    }
}

/// Auto-map suggestion for every header, for pre-filling the mapping UI
pub fn suggest_mapping(headers: &[String], schema: &EntitySchema) -> FieldMapping {
    let mapping = auto_map(headers, schema);

    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            (
                header.clone(),
                mapping.field_for_index(index).map(str::to_string),
            )
        })
        .collect::<HashMap<_, _>>()
}
