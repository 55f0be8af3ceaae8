//! Field catalog
//!
//! Decides which columns an export carries and how they are labelled.
//! Columns come from the first available of:
//!
//! 1. an explicit field list given by the caller
//! 2. a field list declared for the record type in the template store
//!    (`export_fields.txt`, one field spec per line)
//! 3. the record type's declared fields

use tracing::debug;

use super::spec::{FieldSpec, safe_field_name};
use crate::error::Result;
use crate::record::{ContentType, FieldDescriptor, RecordSource};
use crate::template::TemplateStore;

/// Where the catalog's field list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    Explicit,
    Declared,
    Introspected,
}

/// One exported column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Field spec as written
    pub raw: String,
    pub spec: FieldSpec,
    /// Header text
    pub label: String,
}

/// Ordered columns of one export
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    columns: Vec<Column>,
    origin: CatalogOrigin,
}

impl FieldCatalog {
    /// Build the catalog for a record type
    ///
    /// # Arguments
    /// * `content_type` - Record type being exported
    /// * `explicit` - Caller-provided field specs; used as-is when non-empty
    /// * `templates` - Store holding declared field lists
    /// * `source` - Record source describing the type's fields
    ///
    /// # Returns
    /// * `Result<FieldCatalog>` - Columns in export order
    pub fn build(
        content_type: &ContentType,
        explicit: Option<&[String]>,
        templates: &dyn TemplateStore,
        source: &dyn RecordSource,
    ) -> Result<Self> {
        let declared = source.fields_of(content_type)?;

        let (specs, origin) = match explicit.filter(|fields| !fields.is_empty()) {
            Some(fields) => (fields.to_vec(), CatalogOrigin::Explicit),
            None => match templates.export_fields(content_type)? {
                Some(text) => (parse_field_list(&text), CatalogOrigin::Declared),
                None => (
                    declared.iter().map(|f| f.name.clone()).collect(),
                    CatalogOrigin::Introspected,
                ),
            },
        };

        if origin != CatalogOrigin::Introspected {
            for raw in &specs {
                FieldSpec::decode(raw).validate()?;
            }
        }

        debug!(
            "Field catalog for {}: {} columns ({:?})",
            content_type,
            specs.len(),
            origin
        );

        Ok(Self::from_specs(&specs, &declared, origin))
    }

    /// Build a catalog from field specs, inferring labels from `declared`
    pub fn from_specs(specs: &[String], declared: &[FieldDescriptor], origin: CatalogOrigin) -> Self {
        let columns = specs
            .iter()
            .map(|raw| Column {
                raw: raw.clone(),
                spec: FieldSpec::decode(raw),
                label: titlize(raw, declared),
            })
            .collect();
        Self { columns, origin }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn origin(&self) -> CatalogOrigin {
        self.origin
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.columns.iter().map(|c| &c.spec)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Split a declared field list into specs, skipping blank lines
pub fn parse_field_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive a column label for a field spec
///
/// An explicit label wins. Otherwise a top-level field declared with a verbose
/// name uses it, and anything else is derived from the last path segment.
pub fn titlize(raw: &str, declared: &[FieldDescriptor]) -> String {
    if raw.contains(':') {
        return FieldSpec::decode(raw).label;
    }

    let name = safe_field_name(raw);
    let verbose = if name.contains('.') {
        None
    } else {
        declared
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.verbose_name.clone())
            .filter(|v| !v.is_empty())
    };

    let label = verbose.unwrap_or_else(|| {
        let last = name.rsplit('.').next().unwrap_or(name);
        last.replace('_', " ")
    });
    capfirst(&label)
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
