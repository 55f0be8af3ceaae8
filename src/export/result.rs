//! Export results and response metadata

use std::fmt;

use chrono::{DateTime, Utc};
use mime::Mime;

/// How the client should present the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn from_attachment(as_attachment: bool) -> Self {
        if as_attachment {
            Disposition::Attachment
        } else {
            Disposition::Inline
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Inline => write!(f, "inline"),
            Disposition::Attachment => write!(f, "attachment"),
        }
    }
}

/// Encoded export plus the metadata a response needs
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub disposition: Disposition,
    /// Records that made it past the access filter
    pub record_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl ExportResult {
    /// `Content-Disposition` value: `attachment; filename=...` or `filename=...`
    pub fn content_disposition(&self) -> String {
        match self.disposition {
            Disposition::Attachment => format!("attachment; filename={}", self.filename),
            Disposition::Inline => format!("filename={}", self.filename),
        }
    }

    /// Response headers in the order they are emitted
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Filename", self.filename.clone()),
            ("Content-Disposition", self.content_disposition()),
            ("Content-Type", self.content_type.clone()),
        ]
    }
}

/// `<model>_list.<extension>`
pub fn export_filename(model: &str, extension: &str) -> String {
    format!("{model}_list.{extension}")
}

/// Replace the extension of `filename`
pub fn fix_filename_extension(filename: &str, extension: &str) -> String {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    format!("{stem}.{extension}")
}

/// Guess the content type of a file from its extension
pub fn guess_content_type(filename: &str) -> Option<Mime> {
    let (_, extension) = filename.rsplit_once('.')?;
    let known = match extension.to_lowercase().as_str() {
        "csv" => mime::TEXT_CSV,
        "tsv" => mime::TEXT_TAB_SEPARATED_VALUES,
        "txt" => mime::TEXT_PLAIN,
        "html" | "htm" => mime::TEXT_HTML,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "xml" => mime::TEXT_XML,
        "xls" => "application/vnd.ms-excel".parse().ok()?,
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            .parse()
            .ok()?,
        "ods" => "application/vnd.oasis.opendocument.spreadsheet".parse().ok()?,
        "tex" => "text/x-tex".parse().ok()?,
        "yaml" | "yml" => "application/yaml".parse().ok()?,
        _ => return None,
    };
    Some(known)
}

/// Guessed content type, falling back to an opaque byte stream
pub fn content_type_for(filename: &str) -> String {
    guess_content_type(filename)
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(disposition: Disposition) -> ExportResult {
        ExportResult {
            bytes: Vec::new(),
            filename: "book_list.csv".to_string(),
            content_type: content_type_for("book_list.csv"),
            disposition,
            record_count: 0,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_headers() {
        let headers = result(Disposition::Attachment).headers();
        assert_eq!(headers[0], ("Filename", "book_list.csv".to_string()));
        assert_eq!(
            headers[1],
            ("Content-Disposition", "attachment; filename=book_list.csv".to_string())
        );
        assert_eq!(headers[2], ("Content-Type", "text/csv".to_string()));

        assert_eq!(
            result(Disposition::Inline).content_disposition(),
            "filename=book_list.csv"
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a.PDF"), Some(mime::APPLICATION_PDF));
        assert_eq!(
            content_type_for("a.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(guess_content_type("a.unknown"), None);
        assert_eq!(guess_content_type("noext"), None);
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_filenames() {
        assert_eq!(export_filename("book", "csv"), "book_list.csv");
        assert_eq!(fix_filename_extension("book_list.pdf", "tex"), "book_list.tex");
        assert_eq!(fix_filename_extension("book_list", "pdf"), "book_list.pdf");
    }
}
