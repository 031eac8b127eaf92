// ============================================================
// SYSTEM FIELD DESCRIPTORS
// ============================================================
// Canonical fields an import can populate, and how each is normalized

use serde::Serialize;

/// What to do with an enumerated value outside the allowed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "default")]
pub enum EnumPolicy {
    /// Unknown values are a row error
    Strict,

    /// Unknown values are replaced by the default and reported as a warning
    Fallback(&'static str),
}

/// Normalization rule attached to a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldKind {
    /// Entity key. With a prefix, absent values get a generated `PREFIX-###` code.
    Identifier { prefix: Option<&'static str> },

    /// Display name / label
    Name,

    Enumeration {
        allowed: &'static [&'static str],
        policy: EnumPolicy,
    },

    /// Whole number in a closed range
    Integer {
        min: i64,
        max: i64,
        default: Option<i64>,
    },

    Email,

    /// Strict `YYYY-MM-DD`
    Date,

    Text,

    /// Sort position; falls back to the row number
    OrderIndex,
}

/// Descriptor of one canonical field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SystemField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub kind: FieldKind,
    /// Sample value written into downloadable templates
    pub example: &'static str,
}

impl SystemField {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        required: bool,
        description: &'static str,
        kind: FieldKind,
        example: &'static str,
    ) -> Self {
        Self {
            key,
            label,
            required,
            description,
            kind,
            example,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, FieldKind::Identifier { .. })
    }
}
