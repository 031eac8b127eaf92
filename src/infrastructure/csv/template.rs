// ============================================================
// TEMPLATE GENERATOR
// ============================================================
// Downloadable sample files matching the expected headers

use crate::domain::error::{AppError, Result};
use crate::domain::import::{Delimiter, EntityKind};

/// Header row of canonical keys plus one example row
pub fn csv_template(entity: EntityKind, delimiter: Delimiter) -> Result<String> {
    let schema = entity.schema();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer
        .write_record(schema.fields.iter().map(|f| f.key))
        .map_err(|e| AppError::Internal(format!("Failed to write template header: {}", e)))?;
    writer
        .write_record(schema.fields.iter().map(|f| f.example))
        .map_err(|e| AppError::Internal(format!("Failed to write template row: {}", e)))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush template: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("Template is not valid UTF-8: {}", e)))
}

/// JSON array with one example object
pub fn json_template(entity: EntityKind) -> Result<String> {
    let example: serde_json::Map<String, serde_json::Value> = entity
        .schema()
        .fields
        .iter()
        .map(|f| (f.key.to_string(), serde_json::Value::String(f.example.to_string())))
        .collect();

    Ok(serde_json::to_string_pretty(&vec![example])?)
}

/// Suggested download name, e.g. `vendor_import_template.csv`
pub fn template_file_name(entity: EntityKind, extension: &str) -> String {
    format!("{}_import_template.{}", entity.as_str(), extension)
}
