//! Terminal output for the command-line tool
//!
//! - `table`: tabled previews of matrices, catalogs and the action table
//! - response header listing for finished exports

pub mod table;

pub use table::{TableFormatter, TableStyle};

use crate::export::ExportResult;

/// Response headers of an export, one `Name: value` per line
pub fn format_headers(result: &ExportResult) -> String {
    result
        .headers()
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of an export
pub fn format_summary(result: &ExportResult) -> String {
    format!(
        "{} record(s), {} bytes, generated {}",
        result.record_count,
        result.bytes.len(),
        result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Disposition;
    use chrono::{TimeZone, Utc};

    fn result() -> ExportResult {
        ExportResult {
            bytes: b"a,b\n".to_vec(),
            filename: "book_list.csv".to_string(),
            content_type: "text/csv".to_string(),
            disposition: Disposition::Inline,
            record_count: 1,
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_headers() {
        assert_eq!(
            format_headers(&result()),
            "Filename: book_list.csv\nContent-Disposition: filename=book_list.csv\nContent-Type: text/csv"
        );
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(
            format_summary(&result()),
            "1 record(s), 4 bytes, generated 2024-03-01 12:00:00 UTC"
        );
    }
}
