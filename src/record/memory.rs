//! JSON-backed record source
//!
//! Loads records from a dataset made of fixture entries:
//!
//! ```json
//! {
//!   "schema": { "library.book": [{"name": "title", "verbose_name": "book title"}] },
//!   "objects": [
//!     {"model": "library.book", "pk": 1, "fields": {"title": "Dune"}}
//!   ]
//! }
//! ```
//!
//! A bare array of fixture entries is accepted too. Types without a schema
//! entry declare `id` followed by the union of their field names.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{ContentType, FieldDescriptor, Record, RecordSource, RecordValue};
use crate::error::{Result, SourceError};

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    model: String,
    pk: JsonValue,
    #[serde(default)]
    fields: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct SchemaField {
    name: String,
    #[serde(default)]
    verbose_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Dataset {
    Document {
        #[serde(default)]
        schema: BTreeMap<String, Vec<SchemaField>>,
        objects: Vec<FixtureEntry>,
    },
    Fixture(Vec<FixtureEntry>),
}

/// In-memory record source
#[derive(Debug, Default)]
pub struct MemorySource {
    records: BTreeMap<ContentType, Vec<Record>>,
    schema: BTreeMap<ContentType, Vec<FieldDescriptor>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SourceError::InvalidDataset(format!("{}: {}", path.display(), e))
        })?;
        let source = Self::from_json_str(&text)?;
        debug!("Loaded dataset from {}", path.display());
        Ok(source)
    }

    /// Parse a dataset document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(text)
            .map_err(|e| SourceError::InvalidDataset(e.to_string()))?;

        let (schema, objects) = match dataset {
            Dataset::Document { schema, objects } => (schema, objects),
            Dataset::Fixture(objects) => (BTreeMap::new(), objects),
        };

        let mut source = MemorySource::new();
        for (model, fields) in schema {
            let ct: ContentType = model
                .parse()
                .map_err(|e| SourceError::InvalidDataset(format!("{e}")))?;
            let fields = fields
                .into_iter()
                .map(|f| FieldDescriptor {
                    name: f.name,
                    verbose_name: f.verbose_name,
                })
                .collect();
            source.declare(ct, fields);
        }

        for entry in objects {
            let ct: ContentType = entry
                .model
                .parse()
                .map_err(|e| SourceError::InvalidDataset(format!("{e}")))?;
            let id = match &entry.pk {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            let mut map: BTreeMap<String, RecordValue> = entry
                .fields
                .into_iter()
                .map(|(k, v)| (k, RecordValue::from(v)))
                .collect();
            let pk = RecordValue::from(entry.pk);
            map.entry("id".to_string()).or_insert_with(|| pk.clone());
            map.insert("pk".to_string(), pk);
            source.insert(ct, Record::new(id, RecordValue::Map(map)));
        }

        Ok(source)
    }

    /// Declare the fields of a record type
    pub fn declare(&mut self, content_type: ContentType, fields: Vec<FieldDescriptor>) {
        self.schema.insert(content_type, fields);
    }

    /// Append a record
    pub fn insert(&mut self, content_type: ContentType, record: Record) {
        self.records.entry(content_type).or_default().push(record);
    }

    fn records_of(&self, content_type: &ContentType) -> Result<&[Record]> {
        if let Some(records) = self.records.get(content_type) {
            return Ok(records);
        }
        if self.schema.contains_key(content_type) {
            return Ok(&[]);
        }
        Err(SourceError::UnknownContentType(content_type.to_string()).into())
    }
}

impl RecordSource for MemorySource {
    fn all_records(&self, content_type: &ContentType) -> Result<Vec<Record>> {
        Ok(self.records_of(content_type)?.to_vec())
    }

    fn by_ids(&self, content_type: &ContentType, ids: &[String]) -> Result<Vec<Record>> {
        let wanted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .records_of(content_type)?
            .iter()
            .filter(|r| wanted.contains(r.id.as_str()))
            .cloned()
            .collect())
    }

    fn fields_of(&self, content_type: &ContentType) -> Result<Vec<FieldDescriptor>> {
        if let Some(fields) = self.schema.get(content_type) {
            return Ok(fields.clone());
        }

        let mut names = BTreeSet::new();
        for record in self.records_of(content_type)? {
            if let RecordValue::Map(map) = &record.value {
                names.extend(map.keys().filter(|k| *k != "id" && *k != "pk").cloned());
            }
        }

        let mut fields = vec![FieldDescriptor::new("id")];
        fields.extend(names.into_iter().map(FieldDescriptor::new));
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "schema": {
            "library.book": [
                {"name": "id"},
                {"name": "title", "verbose_name": "book title"}
            ]
        },
        "objects": [
            {"model": "library.book", "pk": 1, "fields": {"title": "Dune"}},
            {"model": "library.book", "pk": 2, "fields": {"title": "Emma"}},
            {"model": "library.author", "pk": "a1", "fields": {"name": "Ana", "born": 1970}}
        ]
    }"#;

    fn book() -> ContentType {
        ContentType::new("library", "book")
    }

    #[test]
    fn test_load_document_dataset() {
        let source = MemorySource::from_json_str(DATASET).unwrap();
        let records = source.all_records(&book()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(
            source.fields_of(&book()).unwrap()[1].verbose_name.as_deref(),
            Some("book title")
        );
    }

    #[test]
    fn test_by_ids_keeps_source_order() {
        let source = MemorySource::from_json_str(DATASET).unwrap();
        let ids = vec!["2".to_string(), "1".to_string(), "9".to_string()];
        let records = source.by_ids(&book(), &ids).unwrap();
        let got: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(got, vec!["1", "2"]);
    }

    #[test]
    fn test_inferred_fields_without_schema() {
        let source = MemorySource::from_json_str(DATASET).unwrap();
        let fields = source
            .fields_of(&ContentType::new("library", "author"))
            .unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "born", "name"]);
    }

    #[test]
    fn test_unknown_content_type() {
        let source = MemorySource::from_json_str("[]").unwrap();
        assert!(source.all_records(&book()).is_err());
    }
}
