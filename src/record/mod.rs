//! Records and the record source collaborator
//!
//! This module defines what the exporter consumes:
//! - `RecordValue`: dynamic values that field paths are resolved against
//! - `Record`: an identified record of some content type
//! - `ContentType`: the `app_label.model` pair naming a record type
//! - `RecordSource`: the storage-facing collaborator producing records
//!
//! `MemorySource` is a JSON-backed source used by the command-line tool.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

pub mod memory;
pub mod value;

pub use memory::MemorySource;
pub use value::{InvokeFault, Method, RecordObject, RecordValue};

/// Identifies a record type as `app_label.model`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentType {
    pub app_label: String,
    pub model: String,
}

impl ContentType {
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into(),
        }
    }

    /// Permission name for an action on this type, e.g. `library.change_book`
    pub fn permission(&self, action: &str) -> String {
        format!("{}.{}_{}", self.app_label, action, self.model)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((app, model))
                if !app.is_empty() && !model.is_empty() && !model.contains('.') =>
            {
                Ok(ContentType::new(app.to_lowercase(), model.to_lowercase()))
            }
            _ => Err(ConfigError::InvalidContentType(s.to_string())),
        }
    }
}

/// A record produced by the record source
#[derive(Debug, Clone)]
pub struct Record {
    /// Primary key, as text
    pub id: String,
    pub value: RecordValue,
}

impl Record {
    pub fn new(id: impl Into<String>, value: RecordValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// A declared field of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Human-readable name, if the type declares one
    pub verbose_name: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose_name: None,
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }
}

/// Storage-facing collaborator producing records.
///
/// Implementations may block; the exporter calls them once per request.
pub trait RecordSource {
    /// Every record of the type, in source order
    fn all_records(&self, content_type: &ContentType) -> Result<Vec<Record>>;

    /// Records whose id is in `ids`, in source order
    fn by_ids(&self, content_type: &ContentType, ids: &[String]) -> Result<Vec<Record>>;

    /// Declared fields of the type, in declaration order
    fn fields_of(&self, content_type: &ContentType) -> Result<Vec<FieldDescriptor>>;
}
