use std::{fmt, io};

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for export operations.
///
/// Only fatal conditions are represented here. Unresolvable field paths and
/// failed zero-argument invocations degrade to display strings inside the
/// resolver, and denied access yields an empty record set.
#[derive(Debug)]
pub enum ExportError {
    /// Request or configuration problems (missing parameters, unknown formats).
    Config(ConfigError),

    /// Unexpected faults raised while walking a field path.
    Resolve(ResolveError),

    /// Record source failures.
    Source(SourceError),

    /// Template loading or rendering failures.
    Template(TemplateError),

    /// Output encoder failures. No partial output is ever returned.
    Encoder(String),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// A required request parameter is absent.
    MissingParameter(String),

    /// The requested format has no encoder (or template) on this channel.
    UnknownFormat { channel: String, format: String },

    /// The content type parameter is not of the form `app_label.model`.
    InvalidContentType(String),

    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// A non-recoverable fault raised during path resolution.
///
/// Missing keys, attributes and indexes never produce this error; only an
/// invocation that reports a fatal fault does.
#[derive(Debug)]
pub enum ResolveError {
    /// A method invoked during resolution failed with a fatal fault.
    InvocationFault {
        path: String,
        segment: String,
        message: String,
    },
}

/// Record source errors.
#[derive(Debug)]
pub enum SourceError {
    /// The content type is unknown to the record source.
    UnknownContentType(String),

    /// The dataset backing the source could not be read.
    InvalidDataset(String),

    /// The source failed while fetching records.
    QueryFailed(String),
}

/// Template errors.
#[derive(Debug)]
pub enum TemplateError {
    /// Template syntax error.
    Syntax { template: String, message: String },

    /// Rendering failed (unknown filter, fatal lookup fault).
    Render { template: String, message: String },

    /// A template file exists but could not be read.
    Unreadable { path: String, message: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Resolve(e) => write!(f, "Resolution error: {e}"),
            ExportError::Source(e) => write!(f, "Record source error: {e}"),
            ExportError::Template(e) => write!(f, "Template error: {e}"),
            ExportError::Encoder(msg) => write!(f, "Encoder failed: {msg}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingParameter(name) => {
                write!(f, "Export views require a {name} parameter")
            }
            ConfigError::UnknownFormat { channel, format } => {
                write!(f, "Unsupported {channel} format: {format}")
            }
            ConfigError::InvalidContentType(ct) => {
                write!(f, "Invalid content type '{ct}' (expected app_label.model)")
            }
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvocationFault {
                path,
                segment,
                message,
            } => write!(
                f,
                "Calling '{segment}' while resolving '{path}' failed: {message}"
            ),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::UnknownContentType(ct) => write!(f, "Unknown content type: {ct}"),
            SourceError::InvalidDataset(msg) => write!(f, "Invalid dataset: {msg}"),
            SourceError::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax { template, message } => {
                write!(f, "Syntax error in template '{template}': {message}")
            }
            TemplateError::Render { template, message } => {
                write!(f, "Cannot render template '{template}': {message}")
            }
            TemplateError::Unreadable { path, message } => {
                write!(f, "Cannot read template '{path}': {message}")
            }
        }
    }
}

impl std::error::Error for ExportError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ResolveError {}
impl std::error::Error for SourceError {}
impl std::error::Error for TemplateError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<ResolveError> for ExportError {
    fn from(err: ResolveError) -> Self {
        ExportError::Resolve(err)
    }
}

impl From<SourceError> for ExportError {
    fn from(err: SourceError) -> Self {
        ExportError::Source(err)
    }
}

impl From<TemplateError> for ExportError {
    fn from(err: TemplateError) -> Self {
        ExportError::Template(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Encoder(format!("CSV error: {err}"))
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Encoder(format!("ZIP error: {err}"))
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Encoder(format!("JSON error: {err}"))
    }
}

impl From<String> for ExportError {
    fn from(msg: String) -> Self {
        ExportError::Generic(msg)
    }
}

impl From<&str> for ExportError {
    fn from(msg: &str) -> Self {
        ExportError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err: ExportError = ConfigError::MissingParameter("format".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Export views require a format parameter"
        );
    }

    #[test]
    fn test_unknown_format_message() {
        let err = ConfigError::UnknownFormat {
            channel: "spreadsheet".to_string(),
            format: "ods".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported spreadsheet format: ods");
    }
}
