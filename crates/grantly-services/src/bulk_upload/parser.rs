//! CSV parsing for bulk grant uploads.
//!
//! Turns raw delimited text into an ordered sequence of header-keyed rows.
//! Structural problems (empty file, unreadable records) are reported
//! separately from data errors: a malformed row is split best-effort and
//! left for schema validation to reject, never a parse failure.

use grantly_core::models::UploadRow;

/// Structural error for an upload with no data rows.
pub const EMPTY_FILE_ERROR: &str = "CSV file is empty";

/// Parser output: rows in file order plus structural errors.
#[derive(Debug, Default)]
pub struct ParsedUpload {
    pub rows: Vec<UploadRow>,
    pub errors: Vec<String>,
}

/// Indices of the recognized columns within the header row.
///
/// Header order is irrelevant; unrecognized columns are ignored and a
/// missing recognized column yields an empty value on every row.
#[derive(Debug, Default)]
struct ColumnIndex {
    user_email: Option<usize>,
    system_name: Option<usize>,
    instance_name: Option<usize>,
    access_tier_name: Option<usize>,
    notes: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut index = Self::default();
        for (i, header) in headers.iter().enumerate() {
            match header.trim().to_ascii_lowercase().as_str() {
                "user_email" => index.user_email = Some(i),
                "system_name" => index.system_name = Some(i),
                "instance_name" => index.instance_name = Some(i),
                "access_tier_name" => index.access_tier_name = Some(i),
                "notes" => index.notes = Some(i),
                _ => {}
            }
        }
        index
    }

    fn field(&self, record: &csv::StringRecord, column: Option<usize>) -> String {
        column
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    }
}

/// Parse raw CSV text into upload rows.
///
/// The first line is the header; each data row's `row_number` is its
/// 1-indexed line in the original file, so blank lines (which are skipped)
/// do not shift numbering. A file with zero data rows produces the
/// [`EMPTY_FILE_ERROR`] structural error.
pub fn parse_csv(content: &str) -> ParsedUpload {
    let mut parsed = ParsedUpload::default();

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => ColumnIndex::from_headers(headers),
        Err(err) => {
            parsed.errors.push(format!("Unreadable CSV header: {}", err));
            return parsed;
        }
    };

    for result in reader.records() {
        match result {
            Ok(record) => {
                // The reader drops fully empty lines on its own; lines of
                // bare whitespace come through as one blank field and are
                // skipped here. They still count toward line numbering.
                if record.len() <= 1 && record.get(0).map(|f| f.trim().is_empty()).unwrap_or(true) {
                    continue;
                }
                let row_number = record
                    .position()
                    .map(|p| p.line() as u32)
                    .unwrap_or_default();
                parsed.rows.push(UploadRow {
                    row_number,
                    user_email: columns.field(&record, columns.user_email),
                    system_name: columns.field(&record, columns.system_name),
                    instance_name: columns.field(&record, columns.instance_name),
                    access_tier_name: columns.field(&record, columns.access_tier_name),
                    notes: columns.field(&record, columns.notes),
                });
            }
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line().to_string())
                    .unwrap_or_else(|| "?".to_string());
                parsed
                    .errors
                    .push(format!("Unreadable row at line {}: {}", line, err));
            }
        }
    }

    if parsed.rows.is_empty() && parsed.errors.is_empty() {
        parsed.errors.push(EMPTY_FILE_ERROR.to_string());
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order_is_irrelevant() {
        let csv = "notes,access_tier_name,system_name,user_email\nok,Admin,GitHub,a@example.com\n";
        let parsed = parse_csv(csv);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.user_email, "a@example.com");
        assert_eq!(row.system_name, "GitHub");
        assert_eq!(row.access_tier_name, "Admin");
        assert_eq!(row.notes, "ok");
        assert_eq!(row.instance_name, "");
    }

    #[test]
    fn test_row_numbers_follow_original_file_lines() {
        let csv = "user_email,system_name,access_tier_name\na@example.com,GitHub,Admin\n\nb@example.com,GitHub,Viewer\n";
        let parsed = parse_csv(csv);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].row_number, 2);
        // The blank line 3 is skipped but still counts toward numbering.
        assert_eq!(parsed.rows[1].row_number, 4);
    }

    #[test]
    fn test_quoted_field_protects_embedded_comma() {
        let csv = "user_email,system_name,access_tier_name,notes\na@example.com,GitHub,Admin,\"granted for oncall, temporary\"\n";
        let parsed = parse_csv(csv);
        assert_eq!(parsed.rows[0].notes, "granted for oncall, temporary");
    }

    #[test]
    fn test_missing_recognized_column_yields_empty_values() {
        let csv = "user_email,system_name\na@example.com,GitHub\n";
        let parsed = parse_csv(csv);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].access_tier_name, "");
        assert_eq!(parsed.rows[0].instance_name, "");
        assert_eq!(parsed.rows[0].notes, "");
    }

    #[test]
    fn test_unrecognized_columns_are_ignored() {
        let csv = "user_email,approved_by,system_name,access_tier_name\na@example.com,someone,GitHub,Admin\n";
        let parsed = parse_csv(csv);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].system_name, "GitHub");
    }

    #[test]
    fn test_empty_input_is_a_structural_error() {
        for content in ["", "   \n  \n", "user_email,system_name,access_tier_name\n"] {
            let parsed = parse_csv(content);
            assert!(parsed.rows.is_empty(), "content {:?}", content);
            assert_eq!(parsed.errors, vec![EMPTY_FILE_ERROR.to_string()]);
        }
    }

    #[test]
    fn test_short_row_is_split_best_effort() {
        // Fewer fields than headers: remaining fields come back empty and
        // schema validation downstream rejects the row.
        let csv = "user_email,system_name,access_tier_name\na@example.com,GitHub\n";
        let parsed = parse_csv(csv);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].access_tier_name, "");
    }
}
