// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Delimiter sniffing, line tokenizing, upload decoding and templates

mod decoder;
mod delimiter_detector;
mod line_tokenizer;
mod template;

pub use decoder::{decode_upload, read_upload};
pub use delimiter_detector::{count_unquoted, detect_delimiter};
pub use line_tokenizer::{split_lines, strip_bom, tokenize_line};
pub use template::{csv_template, json_template, template_file_name};
