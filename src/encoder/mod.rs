//! Output encoders
//!
//! Encoders are the sinks at the end of each export channel:
//! - `SpreadsheetEncoder` turns a header+row matrix into bytes for a format
//! - `DocumentEncoder` renders a typed-document template
//! - `StructuredSerializer` serializes whole records
//!
//! `EncoderRegistry` maps format names to encoders. It is built once at
//! startup and only read afterwards.

pub mod delimited;
pub mod latex;
pub mod serializer;
pub mod xlsx;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::record::{ContentType, Record};
use crate::template::{Context, Template};

pub use delimited::DelimitedEncoder;
pub use latex::LatexEncoder;
pub use serializer::{JsonSerializer, XmlSerializer};
pub use xlsx::XlsxEncoder;

/// Header row plus resolved data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl Matrix {
    pub fn new(header: Option<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Header (if any) followed by the data rows
    pub fn lines(&self) -> impl Iterator<Item = &Vec<String>> {
        self.header.iter().chain(self.rows.iter())
    }

    /// Number of data rows
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }
}

/// Encodes a matrix into a spreadsheet format
pub trait SpreadsheetEncoder: Send + Sync {
    fn encode(&self, matrix: &Matrix, format: &str) -> Result<Vec<u8>>;
}

/// Renders a typed-document template
pub trait DocumentEncoder: Send + Sync {
    fn encode(&self, template: &Template, context: &Context) -> Result<Vec<u8>>;

    /// File extension of the produced document
    fn extension(&self) -> &str;
}

/// Serializes full records
pub trait StructuredSerializer: Send + Sync {
    fn serialize(&self, content_type: &ContentType, records: &[Record]) -> Result<Vec<u8>>;

    /// MIME type of the produced stream
    fn content_type(&self) -> &str;
}

/// Format name to encoder tables
#[derive(Clone)]
pub struct EncoderRegistry {
    spreadsheets: BTreeMap<String, Arc<dyn SpreadsheetEncoder>>,
    document: Arc<dyn DocumentEncoder>,
    serializers: BTreeMap<String, Arc<dyn StructuredSerializer>>,
}

impl EncoderRegistry {
    /// Create a registry with a document encoder and no formats
    pub fn new(document: Arc<dyn DocumentEncoder>) -> Self {
        Self {
            spreadsheets: BTreeMap::new(),
            document,
            serializers: BTreeMap::new(),
        }
    }

    /// Registry with every built-in encoder, configured from `config`
    pub fn with_defaults(config: &Config) -> Self {
        let resolver = crate::fields::PathResolver::new(config.resolver.clone());
        let mut registry = Self::new(Arc::new(LatexEncoder::new(config.pdf.clone(), resolver)));
        registry.register_spreadsheet("csv", Arc::new(DelimitedEncoder::csv()));
        registry.register_spreadsheet("tsv", Arc::new(DelimitedEncoder::tsv()));
        registry.register_spreadsheet("xlsx", Arc::new(XlsxEncoder::new()));
        registry.register_serializer("json", Arc::new(JsonSerializer::new(config.export.json_pretty)));
        registry.register_serializer("xml", Arc::new(XmlSerializer::new()));
        registry
    }

    pub fn register_spreadsheet(&mut self, format: &str, encoder: Arc<dyn SpreadsheetEncoder>) {
        self.spreadsheets.insert(format.to_lowercase(), encoder);
    }

    pub fn register_serializer(&mut self, format: &str, serializer: Arc<dyn StructuredSerializer>) {
        self.serializers.insert(format.to_lowercase(), serializer);
    }

    pub fn spreadsheet(&self, format: &str) -> Option<&dyn SpreadsheetEncoder> {
        self.spreadsheets.get(&format.to_lowercase()).map(|e| e.as_ref())
    }

    pub fn serializer(&self, format: &str) -> Option<&dyn StructuredSerializer> {
        self.serializers.get(&format.to_lowercase()).map(|s| s.as_ref())
    }

    pub fn document(&self) -> &dyn DocumentEncoder {
        self.document.as_ref()
    }

    pub fn spreadsheet_formats(&self) -> impl Iterator<Item = &str> {
        self.spreadsheets.keys().map(String::as_str)
    }

    pub fn serializer_formats(&self) -> impl Iterator<Item = &str> {
        self.serializers.keys().map(String::as_str)
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderRegistry")
            .field("spreadsheets", &self.spreadsheets.keys().collect::<Vec<_>>())
            .field("document", &self.document.extension())
            .field("serializers", &self.serializers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Wrap any encoder-side failure
pub(crate) fn encoder_error<E: fmt::Display>(e: E) -> ExportError {
    ExportError::Encoder(e.to_string())
}
