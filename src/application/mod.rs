pub mod use_cases;

pub use use_cases::commit::{CommitSummary, CommitUseCase};
pub use use_cases::import_parser::{
    CsvImportParser, HeaderPreview, ImportParser, JsonImportParser, ParseOptions,
};
pub use use_cases::import_session::{ImportSession, ImportState};
