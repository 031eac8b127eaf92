// ============================================================
// IMPORT DOMAIN LAYER
// ============================================================
// Core types for tabular imports of controls, vendors and backup records
// No I/O, no async

mod delimiter;
pub mod entity;
mod field_mapping;
mod import_config;
mod import_result;
mod parsed_record;
mod system_field;

pub use delimiter::{Delimiter, DelimiterChoice};
pub use entity::{EntityKind, EntitySchema, SynonymTable};
pub use field_mapping::{ColumnMapping, FieldMapping, MappedColumn};
pub use import_config::{EnumOverride, ImportConfig};
pub use import_result::ImportResult;
pub use parsed_record::{FieldValue, ParsedRecord};
pub use system_field::{EnumPolicy, FieldKind, SystemField};
