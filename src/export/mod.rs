//! Export pipeline
//!
//! An export runs through these stages:
//!
//! 1. **ExportRequest**: record type, selection and format parsed from the
//!    request parameters
//! 2. **AccessFilter**: the selected records narrowed to what the caller may see
//! 3. **FieldCatalog**: the columns to export
//! 4. **PathResolver**: one display string per cell
//! 5. **Encoders**: the matrix (or a template context) turned into bytes
//!
//! `ExportDispatcher` drives the stages for each of the three channels and
//! returns an `ExportResult` carrying the bytes and response metadata.

pub mod actions;
pub mod dispatcher;
pub mod request;
pub mod result;

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

pub use actions::{ALL_EXPORT_ACTIONS, ExportAction, selection_query};
pub use dispatcher::ExportDispatcher;
pub use request::{ExportRequest, Selection};
pub use result::{Disposition, ExportResult, guess_content_type};

/// Export pipeline selected by the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Header+row matrix into a tabular format
    Spreadsheet,
    /// Typed document rendered from a template
    Pdf,
    /// Whole records through a structured serializer
    Data,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Spreadsheet => "spreadsheet",
            Channel::Pdf => "pdf",
            Channel::Data => "data",
        }
    }

    /// Request path serving the channel
    pub fn path(&self) -> &'static str {
        match self {
            Channel::Spreadsheet => "/export/spreadsheet/",
            Channel::Pdf => "/export/pdf/",
            Channel::Data => "/export/data/",
        }
    }

    /// Whether requests on this channel must name a format
    pub fn requires_format(&self) -> bool {
        !matches!(self, Channel::Pdf)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spreadsheet" => Ok(Channel::Spreadsheet),
            "pdf" => Ok(Channel::Pdf),
            "data" | "serializer" => Ok(Channel::Data),
            other => Err(ConfigError::InvalidValue {
                field: "channel".to_string(),
                value: other.to_string(),
            }),
        }
    }
}
