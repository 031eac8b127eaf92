// ============================================================
// IMPORT SESSION
// ============================================================
// One upload workflow for one entity:
//   Idle -> Loading -> Success(result) | Error(message), reset() -> Idle

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::import_parser::{parser_for, HeaderPreview, ParseOptions};
use crate::domain::error::{AppError, Result};
use crate::domain::import::{Delimiter, EntityKind, ImportConfig, ImportResult};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ImportState {
    #[default]
    Idle,
    Loading,
    Success(ImportResult),
    Error(String),
}

impl ImportState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ImportState::Loading)
    }
}

pub struct ImportSession {
    entity: EntityKind,
    config: ImportConfig,
    state: ImportState,
    /// (content fingerprint, delimiter) of the last file seen
    cached_delimiter: Option<(String, Delimiter)>,
}

/// SHA-256 of the decoded text, hex encoded
pub fn content_fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

impl ImportSession {
    pub fn new(entity: EntityKind, config: ImportConfig) -> Self {
        Self {
            entity,
            config,
            state: ImportState::Idle,
            cached_delimiter: None,
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn result(&self) -> Option<&ImportResult> {
        match &self.state {
            ImportState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        debug!(entity = %self.entity, "Resetting import session");
        self.state = ImportState::Idle;
        self.cached_delimiter = None;
    }

    /// Enter `Loading`; any previous result is no longer committable
    pub fn begin_loading(&mut self) {
        self.state = ImportState::Loading;
    }

    /// Record a failure that happened outside the parser, e.g. fetching keys
    pub fn fail(&mut self, error: &AppError) {
        warn!(entity = %self.entity, error = %error, "Import failed");
        self.state = ImportState::Error(error.to_string());
    }

    fn cached_for(&self, fingerprint: &str) -> Option<Delimiter> {
        self.cached_delimiter
            .as_ref()
            .filter(|(cached, _)| cached == fingerprint)
            .map(|(_, delimiter)| *delimiter)
    }

    /// Phase one: headers, delimiter and a suggested mapping
    pub fn extract_headers(
        &mut self,
        file_name: &str,
        content: &str,
        delimiter: Option<Delimiter>,
    ) -> Result<HeaderPreview> {
        let fingerprint = content_fingerprint(content);
        let delimiter = delimiter.or_else(|| self.cached_for(&fingerprint));
        let parser = parser_for(self.entity, file_name, self.config.clone());

        match parser.extract_headers(content, delimiter) {
            Ok(preview) => {
                if let Some(choice) = preview.delimiter {
                    self.cached_delimiter = Some((fingerprint, choice.delimiter));
                }
                debug!(
                    entity = %self.entity,
                    file_name = %file_name,
                    headers = preview.headers.len(),
                    "Extracted import headers"
                );
                Ok(preview)
            }
            Err(e) => {
                warn!(entity = %self.entity, file_name = %file_name, error = %e, "Header extraction failed");
                self.state = ImportState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Phase two: full preview parse. Nothing is persisted.
    pub fn parse(
        &mut self,
        file_name: &str,
        content: &str,
        options: &ParseOptions,
    ) -> Result<ImportResult> {
        let fingerprint = content_fingerprint(content);
        let mut options = options.clone();
        if options.delimiter.is_none() {
            options.delimiter = self.cached_for(&fingerprint);
        }

        self.begin_loading();
        let parser = parser_for(self.entity, file_name, self.config.clone());

        match parser.parse(content, &options) {
            Ok(result) => {
                if let Some(choice) = result.delimiter() {
                    self.cached_delimiter = Some((fingerprint, choice.delimiter));
                }
                info!(
                    entity = %self.entity,
                    file_name = %file_name,
                    total = result.total_count(),
                    valid = result.valid_count(),
                    invalid = result.invalid_count(),
                    "Import preview ready"
                );
                self.state = ImportState::Success(result.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(entity = %self.entity, file_name = %file_name, error = %e, "Import parse failed");
                self.state = ImportState::Error(e.to_string());
                Err(e)
            }
        }
    }
}
