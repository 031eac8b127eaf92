pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::{init_tracing, start};
pub use application::{
    CommitSummary, CommitUseCase, CsvImportParser, HeaderPreview, ImportParser, ImportSession,
    ImportState, JsonImportParser, ParseOptions,
};
pub use domain::error::{AppError, Result};
pub use domain::import::{
    Delimiter, DelimiterChoice, EntityKind, FieldMapping, FieldValue, ImportConfig, ImportResult,
    ParsedRecord,
};
pub use infrastructure::config::AppConfig;
pub use infrastructure::db::{RecordStore, RestRecordStore, SqliteRecordStore, StoredRecord};
pub use interfaces::commands::AppState;
