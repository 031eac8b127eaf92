use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::use_cases::commit::{CommitSummary, CommitUseCase};
use crate::application::use_cases::import_parser::{HeaderPreview, ParseOptions};
use crate::application::use_cases::import_session::{ImportSession, ImportState};
use crate::domain::error::{AppError, Result};
use crate::domain::import::{Delimiter, EntityKind, FieldMapping, ImportResult};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::{csv_template, json_template, read_upload, template_file_name};

pub struct AppState {
    pub config: AppConfig,
    pub commit_use_case: CommitUseCase,
    pub sessions: Mutex<HashMap<EntityKind, ImportSession>>,
}

impl AppState {
    pub fn new(config: AppConfig, commit_use_case: CommitUseCase) -> Self {
        Self {
            config,
            commit_use_case,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn with_session<T>(
        &self,
        entity: EntityKind,
        f: impl FnOnce(&mut ImportSession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| AppError::Internal(format!("Import session lock poisoned: {}", e)))?;

        let session = sessions
            .entry(entity)
            .or_insert_with(|| ImportSession::new(entity, self.config.import.clone()));
        f(session)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub entity: EntityKind,
    pub file_name: String,
    pub content: String,
    #[serde(default)]
    pub mapping: Option<FieldMapping>,
    #[serde(default)]
    pub delimiter: Option<Delimiter>,
    /// Fetched from the record store when absent
    #[serde(default)]
    pub existing_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateFile {
    pub file_name: String,
    pub content: String,
}

/// Read and decode an upload from disk
pub async fn import_read_file(state: &AppState, path: String) -> Result<String> {
    read_upload(Path::new(&path), &state.config.import)
        .await
        .map_err(|e| {
            error!(path = %path, error = %e, "Failed to read import file");
            e
        })
}

pub async fn import_extract_headers(
    state: &AppState,
    entity: EntityKind,
    file_name: String,
    content: String,
    delimiter: Option<Delimiter>,
) -> Result<HeaderPreview> {
    info!(entity = %entity, file_name = %file_name, "import_extract_headers");
    state.with_session(entity, |session| {
        session.extract_headers(&file_name, &content, delimiter)
    })
}

pub async fn import_preview(state: &AppState, request: PreviewRequest) -> Result<ImportResult> {
    info!(entity = %request.entity, file_name = %request.file_name, "import_preview");

    state.with_session(request.entity, |session| {
        session.begin_loading();
        Ok(())
    })?;

    let existing_keys = match request.existing_keys {
        Some(keys) => keys.into_iter().collect(),
        None => match state.commit_use_case.existing_keys(request.entity).await {
            Ok(keys) => keys,
            Err(e) => {
                error!(entity = %request.entity, error = %e, "Failed to fetch existing keys");
                state.with_session(request.entity, |session| {
                    session.fail(&e);
                    Ok(())
                })?;
                return Err(e);
            }
        },
    };

    let options = ParseOptions {
        mapping: request.mapping,
        delimiter: request.delimiter,
        existing_keys,
    };

    state.with_session(request.entity, |session| {
        session.parse(&request.file_name, &request.content, &options)
    })
}

/// Commit the valid records of the current preview, then reset the session
pub async fn import_commit(state: &AppState, entity: EntityKind) -> Result<CommitSummary> {
    info!(entity = %entity, "import_commit");

    let result = state.with_session(entity, |session| {
        if session.state().is_loading() {
            return Err(AppError::ValidationError(format!(
                "{} import preview is still loading",
                entity
            )));
        }
        session.result().cloned().ok_or_else(|| {
            AppError::ValidationError(format!("No {} import preview to commit", entity))
        })
    })?;

    let summary = state.commit_use_case.commit(&result).await?;
    state.with_session(entity, |session| {
        session.reset();
        Ok(())
    })?;

    Ok(summary)
}

pub async fn import_reset(state: &AppState, entity: EntityKind) -> Result<()> {
    info!(entity = %entity, "import_reset");
    state.with_session(entity, |session| {
        session.reset();
        Ok(())
    })
}

pub async fn import_state(state: &AppState, entity: EntityKind) -> Result<ImportState> {
    state.with_session(entity, |session| Ok(session.state().clone()))
}

pub async fn import_template(
    entity: EntityKind,
    format: TemplateFormat,
    delimiter: Option<Delimiter>,
) -> Result<TemplateFile> {
    info!(entity = %entity, format = ?format, "import_template");
    match format {
        TemplateFormat::Csv => Ok(TemplateFile {
            file_name: template_file_name(entity, "csv"),
            content: csv_template(entity, delimiter.unwrap_or_default())?,
        }),
        TemplateFormat::Json => Ok(TemplateFile {
            file_name: template_file_name(entity, "json"),
            content: json_template(entity)?,
        }),
    }
}
