// ============================================================
// IMPORT PARSERS
// ============================================================
// The side-effect-free half of an import: text in, ImportResult out.
// Persisting valid records is the commit use case's job.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field_mapper::{auto_map, ensure_required, explicit_map, suggest_mapping};
use super::row_validator::RowValidator;
use crate::domain::error::{AppError, Result};
use crate::domain::import::{
    ColumnMapping, Delimiter, DelimiterChoice, EntityKind, EntitySchema, FieldMapping,
    ImportConfig, ImportResult, ParsedRecord,
};
use crate::infrastructure::csv::{detect_delimiter, split_lines, strip_bom, tokenize_line};

/// Phase-one output used to populate the mapping UI
#[derive(Debug, Clone, Serialize)]
pub struct HeaderPreview {
    pub headers: Vec<String>,

    /// `None` for JSON uploads
    pub delimiter: Option<DelimiterChoice>,

    /// Auto-map guess for every header
    pub suggested_mapping: FieldMapping,
}

/// Inputs of a preview parse besides the file content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Explicit header -> field mapping; auto-mapping when absent
    pub mapping: Option<FieldMapping>,

    /// Wins over detection and over any cached delimiter
    pub delimiter: Option<Delimiter>,

    /// Identifiers already present in the target store
    pub existing_keys: HashSet<String>,
}

impl ParseOptions {
    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_existing_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.existing_keys = keys.into_iter().collect();
        self
    }
}

/// Parsing capability. Implementations must not persist anything.
pub trait ImportParser: Send + Sync {
    fn entity(&self) -> EntityKind;

    fn extract_headers(&self, content: &str, delimiter: Option<Delimiter>) -> Result<HeaderPreview>;

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ImportResult>;
}

fn resolve_mapping(
    headers: &[String],
    explicit: Option<&FieldMapping>,
    schema: &EntitySchema,
) -> Result<ColumnMapping> {
    let mapping = match explicit {
        Some(explicit) => explicit_map(headers, explicit, schema)?,
        None => auto_map(headers, schema),
    };

    // Required-field gate runs before any row is touched
    ensure_required(&mapping, schema)?;
    Ok(mapping)
}

/// Validate already-mapped rows; row numbers are 1-based positions
fn build_records(
    schema: &'static EntitySchema,
    config: &ImportConfig,
    existing_keys: &HashSet<String>,
    rows: &[HashMap<String, String>],
) -> Vec<ParsedRecord> {
    let file_keys: Vec<String> = match schema.identifier() {
        Some(id) => rows.iter().filter_map(|r| r.get(id.key).cloned()).collect(),
        None => Vec::new(),
    };

    let mut validator = RowValidator::new(schema, config, existing_keys, file_keys);
    rows.iter()
        .enumerate()
        .map(|(i, raw)| validator.validate(i + 1, raw))
        .collect()
}

// ------------------------------------------------------------
// CSV
// ------------------------------------------------------------

/// Delimited-text parser, used by every entity
pub struct CsvImportParser {
    entity: EntityKind,
    config: ImportConfig,
}

impl CsvImportParser {
    pub fn new(entity: EntityKind, config: ImportConfig) -> Self {
        Self { entity, config }
    }

    fn resolve_delimiter(&self, content: &str, delimiter: Option<Delimiter>) -> DelimiterChoice {
        delimiter
            .map(DelimiterChoice::new)
            .unwrap_or_else(|| detect_delimiter(content, &self.config))
    }
}

impl ImportParser for CsvImportParser {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn extract_headers(&self, content: &str, delimiter: Option<Delimiter>) -> Result<HeaderPreview> {
        let lines = split_lines(content);
        let header_line = lines
            .first()
            .ok_or_else(|| AppError::ValidationError("File is empty".to_string()))?;

        let choice = self.resolve_delimiter(content, delimiter);
        let headers = tokenize_line(header_line, choice.delimiter);
        let suggested_mapping = suggest_mapping(&headers, self.entity.schema());

        Ok(HeaderPreview {
            headers,
            delimiter: Some(choice),
            suggested_mapping,
        })
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ImportResult> {
        self.config.check()?;

        let lines = split_lines(content);
        if lines.len() < 2 {
            return Err(AppError::ValidationError(
                "File must contain a header row and at least one data row".to_string(),
            ));
        }

        let schema = self.entity.schema();
        let choice = self.resolve_delimiter(content, options.delimiter);
        let headers = tokenize_line(lines[0], choice.delimiter);
        let mapping = resolve_mapping(&headers, options.mapping.as_ref(), schema)?;

        debug!(
            entity = %self.entity,
            delimiter = choice.delimiter_name,
            mapped_columns = mapping.len(),
            "Parsing delimited upload"
        );

        let rows: Vec<HashMap<String, String>> = lines[1..]
            .iter()
            .map(|line| mapping.extract(&tokenize_line(line, choice.delimiter)))
            .collect();

        let records = build_records(schema, &self.config, &options.existing_keys, &rows);
        Ok(ImportResult::new(self.entity, Some(choice), mapping, records))
    }
}

// ------------------------------------------------------------
// JSON
// ------------------------------------------------------------

/// Array-of-objects parser; the backup import accepts this format.
///
/// Object keys play the role of headers (in the order they first appear),
/// scalar values are read as their text form and `null` as empty.
pub struct JsonImportParser {
    entity: EntityKind,
    config: ImportConfig,
}

impl JsonImportParser {
    pub fn new(entity: EntityKind, config: ImportConfig) -> Self {
        Self { entity, config }
    }

    fn read_objects(content: &str) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let value: serde_json::Value = serde_json::from_str(strip_bom(content).trim())
            .map_err(|e| AppError::ParseError(format!("Invalid JSON upload: {}", e)))?;

        let serde_json::Value::Array(items) = value else {
            return Err(AppError::ValidationError(
                "JSON upload must be an array of objects".to_string(),
            ));
        };

        if items.is_empty() {
            return Err(AppError::ValidationError(
                "File contains no records".to_string(),
            ));
        }

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                serde_json::Value::Object(map) => Ok(map),
                _ => Err(AppError::ValidationError(format!(
                    "Record {} is not an object",
                    i + 1
                ))),
            })
            .collect()
    }

    fn headers(objects: &[serde_json::Map<String, serde_json::Value>]) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for object in objects {
            for key in object.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
        headers
    }
}

fn json_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

impl ImportParser for JsonImportParser {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn extract_headers(&self, content: &str, _delimiter: Option<Delimiter>) -> Result<HeaderPreview> {
        let objects = Self::read_objects(content)?;
        let headers = Self::headers(&objects);
        let suggested_mapping = suggest_mapping(&headers, self.entity.schema());

        Ok(HeaderPreview {
            headers,
            delimiter: None,
            suggested_mapping,
        })
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> Result<ImportResult> {
        self.config.check()?;

        let schema = self.entity.schema();
        let objects = Self::read_objects(content)?;
        let headers = Self::headers(&objects);
        let mapping = resolve_mapping(&headers, options.mapping.as_ref(), schema)?;

        debug!(
            entity = %self.entity,
            objects = objects.len(),
            mapped_columns = mapping.len(),
            "Parsing JSON upload"
        );

        let rows: Vec<HashMap<String, String>> = objects
            .iter()
            .map(|object| {
                let cells: Vec<String> = headers.iter().map(|h| json_cell(object.get(h))).collect();
                mapping.extract(&cells)
            })
            .collect();

        let records = build_records(schema, &self.config, &options.existing_keys, &rows);
        Ok(ImportResult::new(self.entity, None, mapping, records))
    }
}

/// Parser for an upload, chosen by file extension
pub fn parser_for(entity: EntityKind, file_name: &str, config: ImportConfig) -> Box<dyn ImportParser> {
    let is_json = file_name
        .rsplit('.')
        .next()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Box::new(JsonImportParser::new(entity, config))
    } else {
        Box::new(CsvImportParser::new(entity, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::FieldValue;

    const SCENARIO: &str = "code;name;weight\n\
        CTRL-001;Access Control;3\n\
        CTRL-001;Duplicate Name;2\n\
        ;No Code;1\n\
        CTRL-003;Bad Weight;9\n";

    fn control_parser() -> CsvImportParser {
        CsvImportParser::new(EntityKind::Control, ImportConfig::default())
    }

    #[test]
    fn test_control_scenario() {
        let result = control_parser()
            .parse(SCENARIO, &ParseOptions::default())
            .unwrap();

        assert_eq!(result.delimiter().unwrap().delimiter, Delimiter::Semicolon);
        assert_eq!(result.total_count(), 4);
        assert_eq!(result.valid_count(), 1);
        assert_eq!(result.invalid_count(), 3);

        let records = result.records();
        assert!(records[0].is_valid());
        assert_eq!(records[1].first_error(), Some("duplicate code \"CTRL-001\" in file"));
        assert_eq!(records[2].first_error(), Some("code is required"));
        assert_eq!(records[3].first_error(), Some("weight must be between 1 and 5"));

        let numbers: Vec<_> = records.iter().map(|r| r.row_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = control_parser();
        let options = ParseOptions::default().with_existing_keys(vec!["CTRL-003".to_string()]);

        let first = parser.parse(SCENARIO, &options).unwrap();
        let second = parser.parse(SCENARIO, &options).unwrap();

        assert_eq!(first.records(), second.records());
        assert_eq!(first.valid_count(), second.valid_count());
    }

    #[test]
    fn test_existing_key_is_reported() {
        let options = ParseOptions::default().with_existing_keys(vec!["CTRL-001".to_string()]);
        let result = control_parser().parse(SCENARIO, &options).unwrap();

        assert_eq!(
            result.records()[0].errors(),
            &["code \"CTRL-001\" already exists".to_string()]
        );
        let second = result.records()[1].errors();
        assert!(second.contains(&"duplicate code \"CTRL-001\" in file".to_string()));
        assert!(second.contains(&"code \"CTRL-001\" already exists".to_string()));
    }

    #[test]
    fn test_blank_lines_do_not_consume_row_numbers() {
        let content = "code,name\n\nC-1,One\n   \r\nC-2,Two\n";
        let result = control_parser().parse(content, &ParseOptions::default()).unwrap();

        let numbers: Vec<_> = result.records().iter().map(|r| r.row_number()).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(result.valid_count(), 2);
    }

    #[test]
    fn test_too_few_lines() {
        let err = control_parser()
            .parse("code;name\n\n", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_required_field_gate_runs_before_rows() {
        let mut mapping = FieldMapping::new();
        mapping.insert("code".into(), Some("code".into()));
        mapping.insert("weight".into(), Some("weight".into()));

        let err = control_parser()
            .parse(SCENARIO, &ParseOptions::default().with_mapping(mapping))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredFields(ref f) if f.len() == 1));
    }

    #[test]
    fn test_delimiter_override_wins() {
        let content = "code,name\nC-1,One\n";
        let parser = control_parser();
        assert!(parser.parse(content, &ParseOptions::default()).is_ok());

        // Splitting on ';' leaves a single "code,name" column
        let err = parser
            .parse(content, &ParseOptions::default().with_delimiter(Delimiter::Semicolon))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredFields(ref f) if f.len() == 2));

        let preview = parser
            .extract_headers(content, Some(Delimiter::Semicolon))
            .unwrap();
        assert_eq!(preview.headers, vec!["code,name"]);
    }

    #[test]
    fn test_extract_headers() {
        let preview = control_parser()
            .extract_headers("\u{FEFF}Control ID;Title;Prio\nC-1;A;1", None)
            .unwrap();

        assert_eq!(preview.headers, vec!["Control ID", "Title", "Prio"]);
        assert_eq!(preview.delimiter.unwrap().delimiter_name, "Semicolon");
        assert_eq!(preview.suggested_mapping["Control ID"].as_deref(), Some("code"));
        assert_eq!(preview.suggested_mapping["Prio"].as_deref(), Some("weight"));
    }

    #[test]
    fn test_vendor_import_generates_codes() {
        let parser = CsvImportParser::new(EntityKind::Vendor, ImportConfig::default());
        let content = "Vendor;E-Mail;Criticality\n\
            Acme;ops@acme.example;High\n\
            Globex;bad-address;unknown\n";
        let options = ParseOptions::default().with_existing_keys(vec!["VND-004".to_string()]);

        let result = parser.parse(content, &options).unwrap();
        assert_eq!(result.valid_count(), 1);

        let acme = &result.records()[0];
        assert_eq!(acme.get("code"), Some(&FieldValue::Text("VND-005".into())));
        assert_eq!(acme.get("criticality"), Some(&FieldValue::Text("high".into())));

        let globex = &result.records()[1];
        assert_eq!(globex.errors().len(), 2);
    }

    #[test]
    fn test_json_backup_import() {
        let parser = JsonImportParser::new(EntityKind::Backup, ImportConfig::default());
        let content = r#"[
            {"system": "ERP", "type": "Full", "criticality": 1, "last_backup_date": "2025-01-15"},
            {"system": "CRM", "type": "tape", "criticality": null, "last_backup_date": "15.01.2025"},
            {"type": "snapshot"}
        ]"#;

        let result = parser.parse(content, &ParseOptions::default()).unwrap();
        assert!(result.delimiter().is_none());
        assert_eq!(result.total_count(), 3);
        assert_eq!(result.valid_count(), 1);

        let erp = &result.records()[0];
        assert_eq!(erp.get("code"), Some(&FieldValue::Text("BKP-001".into())));
        assert_eq!(erp.get("criticality"), Some(&FieldValue::Integer(1)));

        let crm = &result.records()[1];
        assert_eq!(crm.errors().len(), 2);
        assert_eq!(crm.get("criticality"), Some(&FieldValue::Integer(2)));

        assert_eq!(result.records()[2].first_error(), Some("system_name is required"));
    }

    #[test]
    fn test_json_headers_keep_file_order() {
        let parser = JsonImportParser::new(EntityKind::Backup, ImportConfig::default());
        let content = r#"[{"system": "ERP", "name": "Nightly job"}]"#;

        let preview = parser.extract_headers(content, None).unwrap();
        assert_eq!(preview.headers, vec!["system", "name"]);

        // Both keys alias system_name; the leftmost one claims it
        let result = parser.parse(content, &ParseOptions::default()).unwrap();
        assert_eq!(
            result.records()[0].get("system_name"),
            Some(&FieldValue::Text("ERP".into()))
        );
        assert_eq!(result.mapping().field_for_index(1), None);
    }

    #[test]
    fn test_json_must_be_array() {
        let parser = JsonImportParser::new(EntityKind::Backup, ImportConfig::default());
        assert!(matches!(
            parser.parse("{\"system\": \"ERP\"}", &ParseOptions::default()),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            parser.parse("[]", &ParseOptions::default()),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            parser.parse("not json", &ParseOptions::default()),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_parser_for_extension() {
        let config = ImportConfig::default();
        let parser = parser_for(EntityKind::Backup, "backups.JSON", config.clone());
        assert!(parser
            .extract_headers("[{\"system\": \"ERP\"}]", None)
            .unwrap()
            .delimiter
            .is_none());

        let parser = parser_for(EntityKind::Backup, "backups.csv", config);
        assert!(parser.extract_headers("system;type", None).unwrap().delimiter.is_some());
    }
}
