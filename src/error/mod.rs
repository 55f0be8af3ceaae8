//! Error handling module for export operations.
//!
//! Fatal conditions (bad requests, encoder failures, faulting record methods)
//! travel as [`ExportError`]. Data-level problems never do: a path that cannot
//! be resolved becomes a diagnostic cell, and a caller without access simply
//! sees an empty export.
//!
//! # Example
//!
//! ```rust,no_run
//! use admin_export::error::{ConfigError, ExportError, Result};
//!
//! fn require_format(format: Option<&str>) -> Result<&str> {
//!     format.ok_or_else(|| ConfigError::MissingParameter("format".into()).into())
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{
    ConfigError, ExportError, ResolveError, Result, SourceError, TemplateError,
};
