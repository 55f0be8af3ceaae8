//! Export templates
//!
//! A template store answers two questions for a record type: is there a layout
//! customization for a given channel and format, and is there a declared field
//! list. Templates are addressed by name, `[<base>/]<app_label>/<model>/<file>`:
//!
//! - `export.<format>` for spreadsheet formats
//! - `export.tex` for the typed document
//! - `export_fields.txt` for the declared field list

pub mod engine;
pub mod layout;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Result, TemplateError};
use crate::export::Channel;
use crate::record::ContentType;

pub use engine::{Context, Escape, Template, latex_escape};
pub use layout::{DocumentLayout, Orientation};

/// File name of the typed-document template
pub const DOCUMENT_TEMPLATE: &str = "export.tex";

/// Layout and field-list lookups keyed by record type
pub trait TemplateStore {
    /// Find the layout customization for a channel, if any
    ///
    /// # Arguments
    /// * `content_type` - Record type being exported
    /// * `channel` - Export channel
    /// * `format` - Requested format, when the channel uses one
    fn lookup(
        &self,
        content_type: &ContentType,
        channel: Channel,
        format: Option<&str>,
    ) -> Result<Option<Template>>;

    /// Raw text of the declared field list, if any
    fn export_fields(&self, content_type: &ContentType) -> Result<Option<String>>;
}

/// A store with no templates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateStore for NoTemplates {
    fn lookup(&self, _: &ContentType, _: Channel, _: Option<&str>) -> Result<Option<Template>> {
        Ok(None)
    }

    fn export_fields(&self, _: &ContentType) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Name of the template file for a channel, if the channel uses templates
fn template_file(channel: Channel, format: Option<&str>) -> Option<String> {
    match channel {
        Channel::Spreadsheet => format.map(|f| format!("export.{f}")),
        Channel::Pdf => Some(DOCUMENT_TEMPLATE.to_string()),
        Channel::Data => None,
    }
}

/// Relative template name for a record type
pub fn template_name(base: Option<&str>, content_type: &ContentType, file: &str) -> String {
    let tail = format!("{}/{}/{}", content_type.app_label, content_type.model, file);
    match base.filter(|b| !b.is_empty()) {
        Some(base) => format!("{base}/{tail}"),
        None => tail,
    }
}

/// Templates read from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    root: PathBuf,
    base: Option<String>,
    fields_file: String,
}

impl DirectoryTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = ExportConfig::default();
        Self {
            root: root.into(),
            base: defaults.template_base,
            fields_file: defaults.export_fields_file,
        }
    }

    /// Build from the export configuration; `None` when no root is configured
    pub fn from_config(config: &ExportConfig) -> Option<Self> {
        let root = config.template_dir.clone()?;
        Some(Self {
            root,
            base: config.template_base.clone(),
            fields_file: config.export_fields_file.clone(),
        })
    }

    /// Replace the directory placed before `<app_label>/<model>/`
    pub fn with_base(mut self, base: Option<&str>) -> Self {
        self.base = base.map(str::to_string);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, content_type: &ContentType, file: &str) -> (String, PathBuf) {
        let name = template_name(self.base.as_deref(), content_type, file);
        let path = self.root.join(&name);
        (name, path)
    }

    fn read_optional(path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TemplateError::Unreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }
}

impl TemplateStore for DirectoryTemplates {
    fn lookup(
        &self,
        content_type: &ContentType,
        channel: Channel,
        format: Option<&str>,
    ) -> Result<Option<Template>> {
        let Some(file) = template_file(channel, format) else {
            return Ok(None);
        };
        let (name, path) = self.path_of(content_type, &file);
        match Self::read_optional(&path)? {
            Some(source) => {
                debug!("Using template {}", path.display());
                Template::compile(name, source).map(Some)
            }
            None => Ok(None),
        }
    }

    fn export_fields(&self, content_type: &ContentType) -> Result<Option<String>> {
        let (_, path) = self.path_of(content_type, &self.fields_file);
        Self::read_optional(&path)
    }
}

/// Templates held in memory, keyed by template name
#[derive(Debug, Clone)]
pub struct MemoryTemplates {
    base: Option<String>,
    sources: BTreeMap<String, String>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self {
            base: ExportConfig::default().template_base,
            sources: BTreeMap::new(),
        }
    }

    /// Register a template for a record type
    pub fn insert(&mut self, content_type: &ContentType, file: &str, source: impl Into<String>) {
        let name = template_name(self.base.as_deref(), content_type, file);
        self.sources.insert(name, source.into());
    }
}

impl Default for MemoryTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore for MemoryTemplates {
    fn lookup(
        &self,
        content_type: &ContentType,
        channel: Channel,
        format: Option<&str>,
    ) -> Result<Option<Template>> {
        let Some(file) = template_file(channel, format) else {
            return Ok(None);
        };
        let name = template_name(self.base.as_deref(), content_type, &file);
        self.sources
            .get(&name)
            .map(|source| Template::compile(name.clone(), source.clone()))
            .transpose()
    }

    fn export_fields(&self, content_type: &ContentType) -> Result<Option<String>> {
        let name = template_name(
            self.base.as_deref(),
            content_type,
            &ExportConfig::default().export_fields_file,
        );
        Ok(self.sources.get(&name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn book() -> ContentType {
        ContentType::new("library", "book")
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("admin/library/book");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("export.csv"), "{% for object in object_list %}{{ object.title }}\n{% endfor %}").unwrap();
        fs::write(folder.join("export_fields.txt"), "title\nauthor.name:Author\n").unwrap();
        dir
    }

    #[test]
    fn test_template_name_with_and_without_base() {
        assert_eq!(
            template_name(Some("admin"), &book(), "export.tex"),
            "admin/library/book/export.tex"
        );
        assert_eq!(template_name(None, &book(), "export.tex"), "library/book/export.tex");
    }

    #[test]
    fn test_directory_lookup_by_channel() {
        let dir = tree();
        let store = DirectoryTemplates::new(dir.path());

        let found = store.lookup(&book(), Channel::Spreadsheet, Some("csv")).unwrap();
        assert_eq!(found.unwrap().name(), "admin/library/book/export.csv");

        assert!(store.lookup(&book(), Channel::Spreadsheet, Some("xlsx")).unwrap().is_none());
        assert!(store.lookup(&book(), Channel::Pdf, None).unwrap().is_none());
        assert!(store.lookup(&book(), Channel::Data, Some("json")).unwrap().is_none());
    }

    #[test]
    fn test_directory_export_fields() {
        let dir = tree();
        let store = DirectoryTemplates::new(dir.path());
        let text = store.export_fields(&book()).unwrap().unwrap();
        assert!(text.contains("author.name:Author"));

        let other = ContentType::new("library", "author");
        assert!(store.export_fields(&other).unwrap().is_none());
    }

    #[test]
    fn test_directory_without_base() {
        let dir = tree();
        let store = DirectoryTemplates::new(dir.path()).with_base(None);
        assert!(store.export_fields(&book()).unwrap().is_none());
    }

    #[test]
    fn test_broken_template_is_an_error() {
        let dir = tree();
        fs::write(dir.path().join("admin/library/book/export.tex"), "{% for x in y %}").unwrap();
        let store = DirectoryTemplates::new(dir.path());
        assert!(store.lookup(&book(), Channel::Pdf, None).is_err());
    }

    #[test]
    fn test_memory_templates() {
        let mut store = MemoryTemplates::new();
        store.insert(&book(), "export.tex", "{{ model }}");
        store.insert(&book(), "export_fields.txt", "title");
        assert!(store.lookup(&book(), Channel::Pdf, None).unwrap().is_some());
        assert_eq!(store.export_fields(&book()).unwrap().as_deref(), Some("title"));
    }
}
