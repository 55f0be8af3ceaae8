//! Delimited text encoders (CSV, TSV)

use tracing::debug;

use super::{Matrix, SpreadsheetEncoder, encoder_error};
use crate::error::Result;

/// Writes each matrix line as one delimited record
#[derive(Debug, Clone, Copy)]
pub struct DelimitedEncoder {
    delimiter: u8,
}

impl DelimitedEncoder {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn csv() -> Self {
        Self::new(b',')
    }

    pub fn tsv() -> Self {
        Self::new(b'\t')
    }
}

impl SpreadsheetEncoder for DelimitedEncoder {
    fn encode(&self, matrix: &Matrix, format: &str) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(Vec::new());

        for line in matrix.lines() {
            writer.write_record(line)?;
        }

        let bytes = writer.into_inner().map_err(encoder_error)?;
        debug!("Encoded {} rows as {} ({} bytes)", matrix.record_count(), format, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Matrix {
        Matrix::new(
            Some(vec!["Title".to_string(), "Author".to_string()]),
            vec![
                vec!["Dune".to_string(), "Herbert, Frank".to_string()],
                vec!["Say \"hi\"".to_string(), String::new()],
            ],
        )
    }

    #[test]
    fn test_csv_quotes_fields() {
        let bytes = DelimitedEncoder::csv().encode(&matrix(), "csv").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "Title,Author\nDune,\"Herbert, Frank\"\n\"Say \"\"hi\"\"\",\n"
        );
    }

    #[test]
    fn test_tsv_uses_tabs() {
        let matrix = Matrix::new(None, vec![vec!["a".to_string(), "b c".to_string()]]);
        let bytes = DelimitedEncoder::tsv().encode(&matrix, "tsv").unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a\tb c\n");
    }
}
