//! Admin export library
//!
//! Exports stored records in three channels: spreadsheets (a header row plus
//! one row per record), typed documents rendered from LaTeX templates, and
//! whole-record structured serializations. Cells are resolved through dotted
//! field paths, and every export is narrowed to the records the caller may
//! change.
//!
//! # Modules
//!
//! - `access`: Per-caller record filtering
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `encoder`: Spreadsheet, document and data encoders
//! - `error`: Error types and handling
//! - `export`: Requests, dispatcher, results and export actions
//! - `fields`: Field specs, path resolution and field catalogs
//! - `formatter`: Terminal previews
//! - `record`: Record values and record sources
//! - `template`: Export templates and the default document layout
//!
//! # Example
//!
//! ```no_run
//! use admin_export::{Config, EncoderRegistry, ExportDispatcher, ExportRequest, MemorySource};
//! use admin_export::access::{Caller, PermissionTable};
//! use admin_export::export::Channel;
//! use admin_export::template::NoTemplates;
//!
//! fn main() -> admin_export::Result<()> {
//!     let config = Config::default();
//!     let source = MemorySource::from_file("books.json")?;
//!     let encoders = EncoderRegistry::with_defaults(&config);
//!     let mut grants = PermissionTable::new();
//!     grants.grant("alice", "library.change_book");
//!
//!     let request = ExportRequest::from_query(
//!         Channel::Spreadsheet,
//!         "contenttype=library.book&format=csv&query=all",
//!     )?;
//!     let result = ExportDispatcher::new(&source, &NoTemplates, &encoders, &config)
//!         .with_grants(&grants)
//!         .export(&request, Some(&Caller::new("alice")))?;
//!     println!("{} records", result.record_count);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod fields;
pub mod formatter;
pub mod record;
pub mod template;

// Re-export commonly used types
pub use config::Config;
pub use encoder::EncoderRegistry;
pub use error::{ExportError, Result};
pub use export::{ExportDispatcher, ExportRequest, ExportResult};
pub use fields::{FieldCatalog, FieldSpec, PathResolver};
pub use record::{ContentType, MemorySource, Record, RecordSource, RecordValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
