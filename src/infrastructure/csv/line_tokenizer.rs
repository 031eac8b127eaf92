// ============================================================
// LINE TOKENIZER
// ============================================================
// Quote-aware splitting of a single line into trimmed fields

use crate::domain::import::Delimiter;

const BOM: char = '\u{FEFF}';

/// UTF-8 BOM bytes after a Windows-1252 decode
const MISDECODED_BOM: &str = "\u{EF}\u{BB}\u{BF}";

/// Remove a leading byte-order mark, if any
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM)
        .or_else(|| text.strip_prefix(MISDECODED_BOM))
        .unwrap_or(text)
}

/// Split text on `\r?\n` and drop blank lines
pub fn split_lines(text: &str) -> Vec<&str> {
    strip_bom(text)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Split one line into fields.
///
/// `""` inside a quoted span is a literal quote; the delimiter only splits
/// outside quotes. The last field is always emitted, so a well-formed line
/// yields `delimiter count + 1` fields.
pub fn tokenize_line(line: &str, delimiter: Delimiter) -> Vec<String> {
    let delimiter = delimiter.as_char();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}
