// ============================================================
// DELIMITER
// ============================================================
// Candidate field separators for tabular uploads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field separator accepted by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    /// All candidates, in tie-break order
    pub const ALL: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }

    /// Human-readable name shown next to the mapping table
    pub fn name(&self) -> &'static str {
        match self {
            Delimiter::Comma => "Comma",
            Delimiter::Semicolon => "Semicolon",
            Delimiter::Tab => "Tab",
            Delimiter::Pipe => "Pipe",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_char() == c)
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Comma
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Delimiter picked for one file, together with its display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelimiterChoice {
    pub delimiter: Delimiter,
    pub delimiter_name: &'static str,
}

impl DelimiterChoice {
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            delimiter_name: delimiter.name(),
        }
    }
}

impl From<Delimiter> for DelimiterChoice {
    fn from(delimiter: Delimiter) -> Self {
        Self::new(delimiter)
    }
}
