// ============================================================
// IMPORT CONFIGURATION
// ============================================================
// Tunables for delimiter sniffing, upload limits and enum handling

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use super::{Delimiter, EntityKind, EnumPolicy, FieldKind};
use crate::domain::error::{AppError, Result};

/// Per-field override of the built-in enum policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum EnumOverride {
    Strict,
    Fallback { default: String },
}

/// Configuration for the import pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImportConfig {
    /// Number of non-blank lines inspected by the delimiter detector (default: 10)
    #[validate(range(min = 1, max = 100))]
    pub sample_lines: usize,

    /// Used when the sample has no lines or no candidate occurs in the header
    pub fallback_delimiter: Delimiter,

    /// Upload size limit in bytes (default: 10 MiB)
    #[validate(range(min = 1))]
    pub max_file_bytes: u64,

    /// `"entity.field" -> policy`, e.g. `"vendor.criticality"`
    pub enum_overrides: HashMap<String, EnumOverride>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sample_lines: 10,
            fallback_delimiter: Delimiter::Comma,
            max_file_bytes: 10 * 1024 * 1024,
            enum_overrides: HashMap::new(),
        }
    }
}

impl ImportConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enum_override(mut self, entity: EntityKind, field: &str, policy: EnumOverride) -> Self {
        self.enum_overrides
            .insert(format!("{}.{}", entity.as_str(), field), policy);
        self
    }

    /// Validate ranges and that every override targets an enumerated field
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid import config: {}", e)))?;

        for (key, policy) in &self.enum_overrides {
            let (entity, field) = key.split_once('.').ok_or_else(|| {
                AppError::ConfigError(format!(
                    "Enum override key must look like entity.field: {}",
                    key
                ))
            })?;
            let entity: EntityKind = entity
                .parse()
                .map_err(|e: AppError| AppError::ConfigError(e.to_string()))?;

            let allowed = match entity.schema().field(field).map(|f| f.kind) {
                Some(FieldKind::Enumeration { allowed, .. }) => allowed,
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "{} is not an enumerated field",
                        key
                    )))
                }
            };

            if let EnumOverride::Fallback { default } = policy {
                if !allowed.contains(&default.as_str()) {
                    return Err(AppError::ConfigError(format!(
                        "Fallback \"{}\" for {} is not one of: {}",
                        default,
                        key,
                        allowed.join(", ")
                    )));
                }
            }
        }

        Ok(())
    }

    /// Effective policy for an enumerated field
    pub fn enum_policy(
        &self,
        entity: EntityKind,
        field: &str,
        allowed: &'static [&'static str],
        built_in: EnumPolicy,
    ) -> EnumPolicy {
        let key = format!("{}.{}", entity.as_str(), field);
        match self.enum_overrides.get(&key) {
            Some(EnumOverride::Strict) => EnumPolicy::Strict,
            Some(EnumOverride::Fallback { default }) => allowed
                .iter()
                .find(|a| **a == default.as_str())
                .map(|a| EnumPolicy::Fallback(*a))
                .unwrap_or(built_in),
            None => built_in,
        }
    }
}
