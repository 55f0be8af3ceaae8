//! Structured serializers
//!
//! Both serializers emit the record-fixture shape: one entry per record with
//! its model, primary key and fields. The primary key never appears among the
//! fields.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value as JsonValue, json};

use super::{StructuredSerializer, encoder_error};
use crate::error::Result;
use crate::record::{ContentType, Record};

/// Keys holding the primary key inside a record's mapping
const PK_KEYS: [&str; 2] = ["pk", "id"];

/// Fields of a record, without its primary key
fn record_fields(record: &Record) -> Map<String, JsonValue> {
    match record.value.to_json() {
        JsonValue::Object(mut map) => {
            for key in PK_KEYS {
                map.remove(key);
            }
            map
        }
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// JSON serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl StructuredSerializer for JsonSerializer {
    fn serialize(&self, content_type: &ContentType, records: &[Record]) -> Result<Vec<u8>> {
        let model = content_type.to_string();
        let entries: Vec<JsonValue> = records
            .iter()
            .map(|record| {
                json!({
                    "model": model,
                    "pk": record.id,
                    "fields": record_fields(record),
                })
            })
            .collect();

        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&entries)?
        } else {
            serde_json::to_vec(&entries)?
        };
        Ok(bytes)
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// XML serializer (`<django-objects version="1.0">`)
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl XmlSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl StructuredSerializer for XmlSerializer {
    fn serialize(&self, content_type: &ContentType, records: &[Record]) -> Result<Vec<u8>> {
        let model = content_type.to_string();
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(encoder_error)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("django-objects").with_attributes([("version", "1.0")]),
            ))
            .map_err(encoder_error)?;

        for record in records {
            writer
                .write_event(Event::Start(BytesStart::new("object").with_attributes([
                    ("model", model.as_str()),
                    ("pk", record.id.as_str()),
                ])))
                .map_err(encoder_error)?;

            for (name, value) in record_fields(record) {
                let field = BytesStart::new("field").with_attributes([("name", name.as_str())]);
                match value {
                    JsonValue::Null => {
                        writer.write_event(Event::Start(field)).map_err(encoder_error)?;
                        writer
                            .write_event(Event::Empty(BytesStart::new("None")))
                            .map_err(encoder_error)?;
                    }
                    other => {
                        let text = match other {
                            JsonValue::String(s) => s,
                            JsonValue::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                            v => v.to_string(),
                        };
                        writer.write_event(Event::Start(field)).map_err(encoder_error)?;
                        writer
                            .write_event(Event::Text(BytesText::new(&text)))
                            .map_err(encoder_error)?;
                    }
                }
                writer
                    .write_event(Event::End(BytesEnd::new("field")))
                    .map_err(encoder_error)?;
            }

            writer
                .write_event(Event::End(BytesEnd::new("object")))
                .map_err(encoder_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("django-objects")))
            .map_err(encoder_error)?;
        Ok(writer.into_inner())
    }

    fn content_type(&self) -> &str {
        "application/xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordValue;

    fn records() -> Vec<Record> {
        vec![
            Record::new(
                "1",
                RecordValue::from(json!({"pk": "1", "id": 1, "title": "Fish & Chips", "isbn": null})),
            ),
            Record::new("2", RecordValue::from(json!({"pk": "2", "title": "Dune", "in_print": true}))),
        ]
    }

    #[test]
    fn test_json_fixture_shape() {
        let ct = ContentType::new("library", "book");
        let bytes = JsonSerializer::new(false).serialize(&ct, &records()).unwrap();
        let parsed: JsonValue = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed[0]["model"], "library.book");
        assert_eq!(parsed[0]["pk"], "1");
        assert_eq!(parsed[0]["fields"]["title"], "Fish & Chips");
        assert!(parsed[0]["fields"].get("id").is_none());
        assert!(parsed[0]["fields"].get("pk").is_none());
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_xml_fixture_shape() {
        let ct = ContentType::new("library", "book");
        let bytes = XmlSerializer::new().serialize(&ct, &records()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(text.contains(r#"<django-objects version="1.0">"#));
        assert!(text.contains(r#"<object model="library.book" pk="2">"#));
        assert!(text.contains(r#"<field name="title">Fish &amp; Chips</field>"#));
        assert!(text.contains("<None/>"));
        assert!(text.contains(r#"<field name="in_print">True</field>"#));
    }

    #[test]
    fn test_empty_record_set() {
        let ct = ContentType::new("library", "book");
        let bytes = JsonSerializer::new(true).serialize(&ct, &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "[]");
    }
}
