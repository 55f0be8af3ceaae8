//! XLSX encoder
//!
//! Writes a single-sheet SpreadsheetML workbook. Every cell is an inline
//! string, so no shared-string table or style part is needed.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::{Matrix, SpreadsheetEncoder, encoder_error};
use crate::error::Result;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Single-sheet workbook writer
#[derive(Debug, Clone)]
pub struct XlsxEncoder {
    sheet_name: String,
}

impl XlsxEncoder {
    pub fn new() -> Self {
        Self::with_sheet_name("Export")
    }

    pub fn with_sheet_name(name: impl Into<String>) -> Self {
        Self {
            sheet_name: name.into(),
        }
    }

    fn workbook_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
            ),
            escape(self.sheet_name.as_str())
        )
    }
}

impl Default for XlsxEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetEncoder for XlsxEncoder {
    fn encode(&self, matrix: &Matrix, format: &str) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("xl/workbook.xml", self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
            ("xl/worksheets/sheet1.xml", sheet_xml(matrix)),
        ];
        for (name, body) in parts {
            zip.start_file(name, deflated).map_err(encoder_error)?;
            zip.write_all(body.as_bytes())?;
        }

        let bytes = zip.finish().map_err(encoder_error)?.into_inner();
        debug!("Encoded {} rows as {} ({} bytes)", matrix.record_count(), format, bytes.len());
        Ok(bytes)
    }
}

fn sheet_xml(matrix: &Matrix) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#
    ));

    for (r, line) in matrix.lines().enumerate() {
        let row = r + 1;
        xml.push_str(&format!(r#"<row r="{row}">"#));
        for (c, cell) in line.iter().enumerate() {
            let text = strip_control_chars(cell);
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c),
                row,
                escape(text.as_str())
            ));
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Zero-based column index to its letter name (0 -> A, 26 -> AA)
fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// XML 1.0 forbids most control characters
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_workbook_parts_and_cells() {
        let matrix = Matrix::new(
            Some(vec!["Title".to_string()]),
            vec![vec!["Fish & <Chips>".to_string()]],
        );
        let bytes = XlsxEncoder::new().encode(&matrix, "xlsx").unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("xl/workbook.xml").is_ok());

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">Title</t>"#));
        assert!(sheet.contains("Fish &amp; &lt;Chips&gt;"));
        assert!(sheet.contains(r#"<row r="2">"#));
    }
}
