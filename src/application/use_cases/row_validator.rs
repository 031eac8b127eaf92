// ============================================================
// ROW NORMALIZER & VALIDATOR
// ============================================================
// Raw mapped strings -> typed values plus every applicable error.
// Checks never short-circuit: a row reports all of its problems at once.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::import::{
    EntitySchema, EnumPolicy, FieldKind, FieldValue, ImportConfig, ParsedRecord, SystemField,
};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Lowercase, trimmed, spaces and hyphens folded into underscores
pub fn normalize_enum_value(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Strict `YYYY-MM-DD` that is also a real calendar date
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn numeric_suffix(code: &str, prefix: &str) -> Option<u32> {
    code.trim()
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Validates the rows of one file.
///
/// Holds the file-scoped state: identifiers seen so far and the counter for
/// generated codes.
pub struct RowValidator<'a> {
    schema: &'static EntitySchema,
    config: &'a ImportConfig,
    existing_keys: &'a HashSet<String>,
    seen_keys: HashSet<String>,
    reserved_keys: HashSet<String>,
    last_generated: u32,
}

impl<'a> RowValidator<'a> {
    /// `file_keys` are the explicit identifiers of every row in the file, so
    /// generated codes never collide with a later row.
    pub fn new(
        schema: &'static EntitySchema,
        config: &'a ImportConfig,
        existing_keys: &'a HashSet<String>,
        file_keys: impl IntoIterator<Item = String>,
    ) -> Self {
        let reserved_keys: HashSet<String> = file_keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let last_generated = match schema.identifier().map(|f| f.kind) {
            Some(FieldKind::Identifier {
                prefix: Some(prefix),
            }) => existing_keys
                .iter()
                .chain(reserved_keys.iter())
                .filter_map(|k| numeric_suffix(k, prefix))
                .max()
                .unwrap_or(0),
            _ => 0,
        };

        Self {
            schema,
            config,
            existing_keys,
            seen_keys: HashSet::new(),
            reserved_keys,
            last_generated,
        }
    }

    /// Normalize and validate one row
    pub fn validate(&mut self, row_number: usize, raw: &HashMap<String, String>) -> ParsedRecord {
        let mut values = BTreeMap::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for field in self.schema.fields {
            let value = raw.get(field.key).map(|v| v.trim()).unwrap_or("");
            let normalized = match field.kind {
                FieldKind::Identifier { prefix } => {
                    self.identifier(field, prefix, value, &mut errors)
                }
                FieldKind::Name | FieldKind::Text => {
                    if value.is_empty() && field.required {
                        errors.push(format!("{} is required", field.key));
                    }
                    FieldValue::text_or_null(value)
                }
                FieldKind::Enumeration { allowed, policy } => {
                    let policy =
                        self.config
                            .enum_policy(self.schema.kind, field.key, allowed, policy);
                    enumeration(field, allowed, policy, value, &mut errors, &mut warnings)
                }
                FieldKind::Integer { min, max, default } => {
                    integer(field, min, max, default, value, &mut errors)
                }
                FieldKind::Email => {
                    if value.is_empty() {
                        required_or_null(field, &mut errors)
                    } else if is_valid_email(value) {
                        FieldValue::Text(value.to_string())
                    } else {
                        errors.push(format!("invalid {} \"{}\"", field.key, value));
                        FieldValue::Null
                    }
                }
                FieldKind::Date => {
                    if value.is_empty() {
                        required_or_null(field, &mut errors)
                    } else if let Some(date) = parse_iso_date(value) {
                        FieldValue::Date(date)
                    } else {
                        errors.push(format!(
                            "invalid {} \"{}\" (expected YYYY-MM-DD)",
                            field.key, value
                        ));
                        FieldValue::Null
                    }
                }
                FieldKind::OrderIndex => value
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .unwrap_or(FieldValue::Integer(row_number as i64)),
            };

            values.insert(field.key.to_string(), normalized);
        }

        ParsedRecord::new(row_number, values, errors, warnings)
    }

    fn identifier(
        &mut self,
        field: &SystemField,
        prefix: Option<&'static str>,
        value: &str,
        errors: &mut Vec<String>,
    ) -> FieldValue {
        if value.is_empty() {
            return match prefix {
                Some(prefix) => match self.generate_code(prefix) {
                    Some(code) => FieldValue::Text(code),
                    None => {
                        errors.push(format!(
                            "cannot generate {}: no free number left for prefix {}",
                            field.key, prefix
                        ));
                        FieldValue::Null
                    }
                },
                None => required_or_null(field, errors),
            };
        }

        if self.seen_keys.contains(value) {
            errors.push(format!("duplicate {} \"{}\" in file", field.key, value));
        }
        if self.existing_keys.contains(value) {
            errors.push(format!("{} \"{}\" already exists", field.key, value));
        }

        self.seen_keys.insert(value.to_string());
        FieldValue::Text(value.to_string())
    }

    /// `None` once the counter is exhausted
    fn generate_code(&mut self, prefix: &str) -> Option<String> {
        loop {
            self.last_generated = self.last_generated.checked_add(1)?;
            let candidate = format!("{}-{:03}", prefix, self.last_generated);
            if !self.existing_keys.contains(&candidate)
                && !self.reserved_keys.contains(&candidate)
                && !self.seen_keys.contains(&candidate)
            {
                self.seen_keys.insert(candidate.clone());
                return Some(candidate);
            }
        }
    }
}

fn required_or_null(field: &SystemField, errors: &mut Vec<String>) -> FieldValue {
    if field.required {
        errors.push(format!("{} is required", field.key));
    }
    FieldValue::Null
}

fn enumeration(
    field: &SystemField,
    allowed: &[&str],
    policy: EnumPolicy,
    value: &str,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> FieldValue {
    if value.is_empty() {
        return match policy {
            EnumPolicy::Fallback(default) => FieldValue::Text(default.to_string()),
            EnumPolicy::Strict => required_or_null(field, errors),
        };
    }

    let normalized = normalize_enum_value(value);
    if allowed.contains(&normalized.as_str()) {
        return FieldValue::Text(normalized);
    }

    match policy {
        EnumPolicy::Strict => {
            errors.push(format!(
                "invalid {} \"{}\" (expected one of: {})",
                field.key,
                value,
                allowed.join(", ")
            ));
            FieldValue::Null
        }
        EnumPolicy::Fallback(default) => {
            warnings.push(format!(
                "unknown {} \"{}\", using \"{}\"",
                field.key, value, default
            ));
            FieldValue::Text(default.to_string())
        }
    }
}

fn integer(
    field: &SystemField,
    min: i64,
    max: i64,
    default: Option<i64>,
    value: &str,
    errors: &mut Vec<String>,
) -> FieldValue {
    if value.is_empty() {
        return match default {
            Some(n) => FieldValue::Integer(n),
            None => required_or_null(field, errors),
        };
    }

    match value.parse::<i64>() {
        Ok(n) if (min..=max).contains(&n) => FieldValue::Integer(n),
        Ok(_) => {
            errors.push(format!(
                "{} must be between {} and {}",
                field.key, min, max
            ));
            FieldValue::Null
        }
        Err(_) => {
            errors.push(format!(
                "{} must be a whole number between {} and {}",
                field.key, min, max
            ));
            FieldValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{EntityKind, EnumOverride};

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_enum_value() {
        assert_eq!(normalize_enum_value(" In Progress "), "in_progress");
        assert_eq!(normalize_enum_value("NOT-APPLICABLE"), "not_applicable");
    }

    #[test]
    fn test_date_must_be_strict_and_real() {
        assert!(parse_iso_date("2025-02-28").is_some());
        assert!(parse_iso_date("2025-02-30").is_none());
        assert!(parse_iso_date("28.02.2025").is_none());
        assert!(parse_iso_date("2025-2-28").is_none());
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane doe@example.com"));
    }

    #[test]
    fn test_valid_control_row() {
        let config = ImportConfig::default();
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Control.schema(), &config, &existing, Vec::new());

        let record = validator.validate(
            1,
            &raw(&[
                ("code", "CTRL-001"),
                ("name", "Access Control"),
                ("status", "In Progress"),
                ("weight", "3"),
                ("review_date", "2025-06-30"),
            ]),
        );

        assert!(record.is_valid(), "{:?}", record.errors());
        assert_eq!(record.get("status"), Some(&FieldValue::Text("in_progress".into())));
        assert_eq!(record.get("weight"), Some(&FieldValue::Integer(3)));
        assert_eq!(record.get("description"), Some(&FieldValue::Null));
        // order_index falls back to the row position
        assert_eq!(record.get("order_index"), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn test_errors_accumulate() {
        let config = ImportConfig::default();
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Control.schema(), &config, &existing, Vec::new());

        let record = validator.validate(
            4,
            &raw(&[
                ("code", ""),
                ("name", ""),
                ("owner_email", "not-an-email"),
                ("review_date", "30/06/2025"),
                ("weight", "abc"),
            ]),
        );

        assert!(!record.is_valid());
        assert_eq!(
            record.errors(),
            &[
                "code is required".to_string(),
                "name is required".to_string(),
                "weight must be a whole number between 1 and 5".to_string(),
                "invalid owner_email \"not-an-email\"".to_string(),
                "invalid review_date \"30/06/2025\" (expected YYYY-MM-DD)".to_string(),
            ]
        );
        assert_eq!(record.get("review_date"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_duplicate_in_file_and_existing() {
        let config = ImportConfig::default();
        let existing: HashSet<String> = ["CTRL-900".to_string()].into_iter().collect();
        let mut validator =
            RowValidator::new(EntityKind::Control.schema(), &config, &existing, Vec::new());

        let first = validator.validate(1, &raw(&[("code", "CTRL-001"), ("name", "A")]));
        let second = validator.validate(2, &raw(&[("code", "CTRL-001"), ("name", "B")]));
        let third = validator.validate(3, &raw(&[("code", "CTRL-900"), ("name", "C")]));

        assert!(first.is_valid());
        assert_eq!(second.errors(), &["duplicate code \"CTRL-001\" in file".to_string()]);
        assert_eq!(third.errors(), &["code \"CTRL-900\" already exists".to_string()]);
    }

    #[test]
    fn test_out_of_range_weight_is_not_clamped() {
        let config = ImportConfig::default();
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Control.schema(), &config, &existing, Vec::new());

        let record = validator.validate(1, &raw(&[("code", "C-1"), ("name", "A"), ("weight", "9")]));
        assert_eq!(record.errors(), &["weight must be between 1 and 5".to_string()]);
        assert_eq!(record.get("weight"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_generated_codes_continue_after_existing_and_file_codes() {
        let config = ImportConfig::default();
        let existing: HashSet<String> =
            ["VND-007".to_string(), "OTHER-050".to_string()].into_iter().collect();
        let mut validator = RowValidator::new(
            EntityKind::Vendor.schema(),
            &config,
            &existing,
            vec!["VND-009".to_string()],
        );

        let a = validator.validate(1, &raw(&[("name", "Acme")]));
        let b = validator.validate(2, &raw(&[("name", "Globex")]));
        let c = validator.validate(3, &raw(&[("code", "VND-009"), ("name", "Initech")]));

        assert_eq!(a.get("code"), Some(&FieldValue::Text("VND-010".into())));
        assert_eq!(b.get("code"), Some(&FieldValue::Text("VND-011".into())));
        assert!(c.is_valid());
    }

    #[test]
    fn test_exhausted_code_counter_is_a_row_error() {
        let config = ImportConfig::default();
        let existing: HashSet<String> = [format!("VND-{}", u32::MAX)].into_iter().collect();
        let mut validator =
            RowValidator::new(EntityKind::Vendor.schema(), &config, &existing, Vec::new());

        let record = validator.validate(1, &raw(&[("name", "Acme")]));
        assert!(!record.is_valid());
        assert_eq!(
            record.first_error(),
            Some("cannot generate code: no free number left for prefix VND")
        );
        assert_eq!(record.get("code"), Some(&FieldValue::Null));

        // Explicit codes are unaffected
        let explicit = validator.validate(2, &raw(&[("code", "VND-1"), ("name", "Globex")]));
        assert!(explicit.is_valid());
    }

    #[test]
    fn test_enum_policies() {
        let config = ImportConfig::default();
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Vendor.schema(), &config, &existing, Vec::new());

        let record = validator.validate(
            1,
            &raw(&[
                ("name", "Acme"),
                ("criticality", "extreme"),
                ("classification", "top secret"),
            ]),
        );

        assert_eq!(
            record.errors(),
            &["invalid criticality \"extreme\" (expected one of: low, medium, high, critical)"
                .to_string()]
        );
        assert_eq!(
            record.get("classification"),
            Some(&FieldValue::Text("internal".into()))
        );
        assert_eq!(record.warnings().len(), 1);
        assert_eq!(record.get("status"), Some(&FieldValue::Text("active".into())));
        assert_eq!(record.get("criticality"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_enum_override_relaxes_strict_field() {
        let config = ImportConfig::new().with_enum_override(
            EntityKind::Vendor,
            "criticality",
            EnumOverride::Fallback {
                default: "medium".into(),
            },
        );
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Vendor.schema(), &config, &existing, Vec::new());

        let record = validator.validate(1, &raw(&[("name", "Acme"), ("criticality", "extreme")]));
        assert!(record.is_valid());
        assert_eq!(record.get("criticality"), Some(&FieldValue::Text("medium".into())));
        assert_eq!(record.warnings().len(), 1);
    }

    #[test]
    fn test_explicit_order_index() {
        let config = ImportConfig::default();
        let existing = HashSet::new();
        let mut validator =
            RowValidator::new(EntityKind::Control.schema(), &config, &existing, Vec::new());

        let explicit = validator.validate(
            5,
            &raw(&[("code", "C-1"), ("name", "A"), ("order_index", "42")]),
        );
        let garbage = validator.validate(
            6,
            &raw(&[("code", "C-2"), ("name", "B"), ("order_index", "first")]),
        );

        assert_eq!(explicit.get("order_index"), Some(&FieldValue::Integer(42)));
        assert_eq!(garbage.get("order_index"), Some(&FieldValue::Integer(6)));
        assert!(garbage.is_valid());
    }
}
