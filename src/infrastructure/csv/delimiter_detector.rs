// ============================================================
// DELIMITER DETECTOR
// ============================================================
// Best-effort sniffing of the field separator from a text sample

use tracing::debug;

use super::line_tokenizer::split_lines;
use crate::domain::import::{Delimiter, DelimiterChoice, ImportConfig};

/// Count `delimiter` outside quoted spans
pub fn count_unquoted(line: &str, delimiter: Delimiter) -> usize {
    let target = delimiter.as_char();
    let mut in_quotes = false;
    let mut count = 0;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == target && !in_quotes {
            count += 1;
        }
    }

    count
}

/// A data line is consistent with the header when its count lies in
/// `[floor(header / 2), header + 1]`.
fn is_consistent(header_count: usize, line_count: usize) -> bool {
    line_count >= header_count / 2 && line_count <= header_count + 1
}

/// Pick the most plausible delimiter for `text`.
///
/// Candidates absent from the header are rejected. Among candidates whose
/// count is consistent on every sampled data line the highest header count
/// wins; if none is consistent the highest raw header count wins. Ties keep
/// candidate order (comma, semicolon, tab, pipe).
pub fn detect_delimiter(text: &str, config: &ImportConfig) -> DelimiterChoice {
    let sample: Vec<&str> = split_lines(text)
        .into_iter()
        .take(config.sample_lines.max(1))
        .collect();

    let Some((header, data_lines)) = sample.split_first() else {
        debug!(fallback = %config.fallback_delimiter, "No sample lines, using fallback delimiter");
        return DelimiterChoice::new(config.fallback_delimiter);
    };

    let mut best_consistent: Option<(Delimiter, usize)> = None;
    let mut best_raw: Option<(Delimiter, usize)> = None;

    for delimiter in Delimiter::ALL {
        let header_count = count_unquoted(header, delimiter);
        if header_count == 0 {
            continue;
        }

        let consistent = data_lines
            .iter()
            .all(|line| is_consistent(header_count, count_unquoted(line, delimiter)));

        debug!(
            delimiter = delimiter.name(),
            header_count,
            consistent,
            "Delimiter candidate"
        );

        if best_raw.map_or(true, |(_, n)| header_count > n) {
            best_raw = Some((delimiter, header_count));
        }
        if consistent && best_consistent.map_or(true, |(_, n)| header_count > n) {
            best_consistent = Some((delimiter, header_count));
        }
    }

    let delimiter = best_consistent
        .or(best_raw)
        .map(|(d, _)| d)
        .unwrap_or(config.fallback_delimiter);

    DelimiterChoice::new(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Delimiter {
        detect_delimiter(text, &ImportConfig::default()).delimiter
    }

    #[test]
    fn test_detect_common_delimiters() {
        assert_eq!(detect("a,b,c\nd,e,f"), Delimiter::Comma);
        assert_eq!(detect("a;b;c\nd;e;f"), Delimiter::Semicolon);
        assert_eq!(detect("a\tb\tc\nd\te\tf"), Delimiter::Tab);
        assert_eq!(detect("a|b|c\nd|e|f"), Delimiter::Pipe);
    }

    #[test]
    fn test_semicolon_with_commas_inside_quotes() {
        let text = "code;name;weight\nCTRL-001;\"Access, review\";3\nCTRL-002;\"Backup, restore, test\";2";
        let choice = detect_delimiter(text, &ImportConfig::default());
        assert_eq!(choice.delimiter, Delimiter::Semicolon);
        assert_eq!(choice.delimiter_name, "Semicolon");
    }

    #[test]
    fn test_consistent_candidate_beats_frequent_one() {
        // Header has more commas, but data lines do not agree with them
        let text = "a,b,c,d;x\n1;2\nfoo;bar";
        assert_eq!(detect(text), Delimiter::Semicolon);
    }

    #[test]
    fn test_inconsistent_file_falls_back_to_raw_count() {
        let text = "a,b,c;d\n1,2,3,4,5,6,7\n1;2;3;4;5";
        assert_eq!(detect(text), Delimiter::Comma);
    }

    #[test]
    fn test_single_column_and_empty_use_fallback() {
        assert_eq!(detect("name\nAlice\nBob"), Delimiter::Comma);
        assert_eq!(detect(""), Delimiter::Comma);
        assert_eq!(detect("\n \r\n"), Delimiter::Comma);

        let config = ImportConfig {
            fallback_delimiter: Delimiter::Semicolon,
            ..Default::default()
        };
        assert_eq!(detect_delimiter("name\nAlice", &config).delimiter, Delimiter::Semicolon);
    }

    #[test]
    fn test_bom_is_ignored() {
        assert_eq!(detect("\u{FEFF}a;b\n1;2"), Delimiter::Semicolon);
    }

    #[test]
    fn test_count_unquoted() {
        assert_eq!(count_unquoted("a,\"b,c\",d", Delimiter::Comma), 2);
        assert_eq!(count_unquoted("a;b", Delimiter::Comma), 0);
    }
}
