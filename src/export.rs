//! CSV export of highlights
//!
//! Columns: `Text,Category,Note,Created At`. Text and note are always
//! quoted with embedded quotes doubled; the category is quoted only when it
//! needs to be.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::annotations::Highlight;

/// CSV header row
pub const CSV_HEADER: &str = "Text,Category,Note,Created At";

/// Errors while exporting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("There are no highlights to export")]
    Empty,
}

/// A finished export, ready to be offered as a download
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    pub rows: usize,
}

impl CsvExport {
    pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_bytes()
    }
}

/// Serialize highlights to CSV
pub fn export_csv(highlights: &[Highlight]) -> Result<CsvExport, ExportError> {
    if highlights.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut content = String::with_capacity(64 + highlights.len() * 96);
    content.push_str(CSV_HEADER);
    content.push('\n');

    for highlight in highlights {
        content.push_str(&quote(&highlight.text));
        content.push(',');
        content.push_str(&quote_if_needed(&highlight.category));
        content.push(',');
        content.push_str(&quote(highlight.note.as_deref().unwrap_or("")));
        content.push(',');
        content.push_str(
            &highlight
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        content.push('\n');
    }

    let filename = format!("contract-highlights-{}.csv", Utc::now().timestamp_millis());
    tracing::info!(rows = highlights.len(), filename = %filename, "Exported highlights");

    Ok(CsvExport {
        filename,
        content,
        rows: highlights.len(),
    })
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn quote_if_needed(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote(field)
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{HighlightCategory, SelectionPayload};

    fn highlight(text: &str, category: &str, note: Option<&str>) -> Highlight {
        let mut h = Highlight::new(
            SelectionPayload {
                text: text.to_string(),
                start_index: 0,
                end_index: text.chars().count(),
            },
            &HighlightCategory::new(category, category, "#F44336", None),
        );
        h.note = note.map(|n| n.to_string());
        h
    }

    /// Minimal RFC 4180 reader for checking output
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                ('"', true) => in_quotes = false,
                ('"', false) => in_quotes = true,
                (',', false) => row.push(std::mem::take(&mut field)),
                ('\n', false) => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                (c, _) => field.push(c),
            }
        }
        rows
    }

    #[test]
    fn test_empty_export_fails() {
        assert_eq!(export_csv(&[]).unwrap_err(), ExportError::Empty);
    }

    #[test]
    fn test_quote_escaping() {
        let h = highlight("He said \"hi\", ok", "risk", None);
        let export = export_csv(&[h]).unwrap();

        let line = export.content.lines().nth(1).unwrap();
        assert!(line.starts_with("\"He said \"\"hi\"\", ok\",risk,\"\","));

        let rows = parse_csv(&export.content);
        assert_eq!(rows[1][0], "He said \"hi\", ok");
    }

    #[test]
    fn test_round_trip_fields() {
        let highlights = vec![
            highlight("Tenant shall indemnify", "obligation", Some("Uncapped, check\nsection 9")),
            highlight("30 days", "key-term", None),
            highlight("fees, costs", "a,b", Some("quote \" inside")),
        ];
        let export = export_csv(&highlights).unwrap();
        let rows = parse_csv(&export.content);

        assert_eq!(export.rows, 3);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec!["Text", "Category", "Note", "Created At"]);
        assert_eq!(rows[1][2], "Uncapped, check\nsection 9");
        assert_eq!(rows[2][2], "");
        assert_eq!(rows[3][1], "a,b");
        assert_eq!(rows[3][2], "quote \" inside");

        for (row, h) in rows[1..].iter().zip(&highlights) {
            assert_eq!(row.len(), 4);
            assert_eq!(row[0], h.text);
            let parsed = chrono::DateTime::parse_from_rfc3339(&row[3]).unwrap();
            assert_eq!(parsed.timestamp_millis(), h.created_at.timestamp_millis());
        }
    }

    #[test]
    fn test_filename_pattern() {
        let export = export_csv(&[highlight("x", "risk", None)]).unwrap();
        let stamp = export
            .filename
            .strip_prefix("contract-highlights-")
            .and_then(|s| s.strip_suffix(".csv"))
            .unwrap();
        assert!(stamp.parse::<i64>().unwrap() > 0);
    }
}
