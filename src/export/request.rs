//! Export requests
//!
//! Requests arrive as URL query strings:
//!
//! ```text
//! contenttype=library.book&format=csv&query=all
//! contenttype=library.book&format=json&pk=1&pk=4
//! contenttype=library.book&query=1+2+3
//! ```
//!
//! `pk` may repeat and takes precedence over `query`. Without either, nothing
//! is selected.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use super::Channel;
use crate::error::{ConfigError, Result};
use crate::fields::FieldSpec;
use crate::record::ContentType;

/// Which records a request selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every record of the type
    All,
    /// Records with these ids
    Ids(Vec<String>),
    /// No selector given
    Nothing,
}

/// A parsed export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub channel: Channel,
    pub content_type: ContentType,
    pub selection: Selection,
    pub format: Option<String>,
    /// Field specs overriding the catalog
    pub fields: Option<Vec<String>>,
    /// Overrides the configured header setting
    pub include_headers: Option<bool>,
    /// Overrides the channel's attachment default
    pub as_attachment: Option<bool>,
    /// Parameters not consumed by the exporter
    pub extra: BTreeMap<String, Vec<String>>,
}

impl ExportRequest {
    pub fn new(channel: Channel, content_type: ContentType) -> Self {
        Self {
            channel,
            content_type,
            selection: Selection::Nothing,
            format: None,
            fields: None,
            include_headers: None,
            as_attachment: None,
            extra: BTreeMap::new(),
        }
    }

    /// Parse a request from a URL query string
    ///
    /// # Arguments
    /// * `channel` - Channel the request was addressed to
    /// * `query` - Query string, with or without a leading `?`
    ///
    /// # Returns
    /// * `Result<ExportRequest>` - Parsed request, or a configuration error when
    ///   `contenttype` is missing or malformed
    pub fn from_query(channel: Channel, query: &str) -> Result<Self> {
        let params = parse_query(query);
        let get_all = |key: &str| values(&params, key);
        let get = |key: &str| values(&params, key).last().copied();

        let content_type: ContentType = get("contenttype")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingParameter("contenttype".to_string()))?
            .parse()?;

        let selection = if !get_all("pk").is_empty() {
            Selection::Ids(get_all("pk").into_iter().map(str::to_string).collect())
        } else {
            match get("query") {
                Some(q) if q.trim() == "all" => Selection::All,
                Some(q) => Selection::Ids(q.split_whitespace().map(str::to_string).collect()),
                None => Selection::Nothing,
            }
        };

        let fields: Vec<String> = get_all("fields")
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        for field in &fields {
            FieldSpec::decode(field).validate()?;
        }

        let mut request = Self::new(channel, content_type);
        request.selection = selection;
        request.format = get("format")
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        request.fields = (!fields.is_empty()).then_some(fields);
        request.include_headers = get("include_headers")
            .map(|v| parse_flag("include_headers", v))
            .transpose()?;
        request.as_attachment = get("as_attachment")
            .map(|v| parse_flag("as_attachment", v))
            .transpose()?;

        for (key, value) in &params {
            if !RESERVED.contains(&key.as_str()) {
                request.extra.entry(key.clone()).or_default().push(value.clone());
            }
        }

        Ok(request)
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = Some(include);
        self
    }

    pub fn with_attachment(mut self, attachment: bool) -> Self {
        self.as_attachment = Some(attachment);
        self
    }

    /// The format, or a configuration error naming the missing parameter
    pub fn required_format(&self) -> Result<&str> {
        self.format
            .as_deref()
            .ok_or_else(|| ConfigError::MissingParameter("format".to_string()).into())
    }
}

const RESERVED: [&str; 7] = [
    "contenttype",
    "pk",
    "query",
    "format",
    "fields",
    "include_headers",
    "as_attachment",
];

/// Split a query string into decoded key/value pairs, keeping order
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Every value given for `key`, in order
fn values<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// `+` is a space; `%XX` escapes are decoded as UTF-8
fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: other.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    #[test]
    fn test_query_all() {
        let request =
            ExportRequest::from_query(Channel::Spreadsheet, "?query=all&contenttype=library.book&format=CSV")
                .unwrap();
        assert_eq!(request.content_type, ContentType::new("library", "book"));
        assert_eq!(request.selection, Selection::All);
        assert_eq!(request.format.as_deref(), Some("csv"));
    }

    #[test]
    fn test_query_plus_joined_ids() {
        let request = ExportRequest::from_query(Channel::Data, "query=1+2+3&contenttype=library.book").unwrap();
        assert_eq!(
            request.selection,
            Selection::Ids(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert_eq!(request.format, None);
    }

    #[test]
    fn test_repeated_pk_wins_over_query() {
        let request =
            ExportRequest::from_query(Channel::Pdf, "pk=4&query=all&pk=7&contenttype=library.book").unwrap();
        assert_eq!(
            request.selection,
            Selection::Ids(vec!["4".to_string(), "7".to_string()])
        );
    }

    #[test]
    fn test_no_selector_selects_nothing() {
        let request = ExportRequest::from_query(Channel::Pdf, "contenttype=library.book").unwrap();
        assert_eq!(request.selection, Selection::Nothing);
    }

    #[test]
    fn test_missing_contenttype_is_configuration_error() {
        let err = ExportRequest::from_query(Channel::Spreadsheet, "query=all&format=csv").unwrap_err();
        assert!(matches!(
            err,
            ExportError::Config(ConfigError::MissingParameter(ref name)) if name == "contenttype"
        ));
    }

    #[test]
    fn test_percent_decoding_and_overrides() {
        let request = ExportRequest::from_query(
            Channel::Spreadsheet,
            "contenttype=library.book&format=csv&fields=title%3ABook%20title,author.name&include_headers=0&as_attachment=yes&page=2",
        )
        .unwrap();
        assert_eq!(
            request.fields,
            Some(vec!["title:Book title".to_string(), "author.name".to_string()])
        );
        assert_eq!(request.include_headers, Some(false));
        assert_eq!(request.as_attachment, Some(true));
        assert_eq!(request.extra["page"], vec!["2".to_string()]);
    }

    #[test]
    fn test_malformed_field_paths_are_rejected() {
        for query in [
            "contenttype=library.book&fields=title%7D%7D%5Cinput%7B%2Fetc%2Fhostname%7D%7B%7B%20title",
            "contenttype=library.book&fields=%3ALabel",
            "contenttype=library.book&fields=title,author..name",
        ] {
            let err = ExportRequest::from_query(Channel::Pdf, query).unwrap_err();
            assert!(
                matches!(
                    err,
                    ExportError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "fields"
                ),
                "{query}"
            );
        }
    }

    #[test]
    fn test_bad_flag_is_rejected() {
        assert!(
            ExportRequest::from_query(Channel::Spreadsheet, "contenttype=a.b&include_headers=maybe").is_err()
        );
    }

    #[test]
    fn test_required_format() {
        let request = ExportRequest::new(Channel::Data, ContentType::new("a", "b"));
        assert!(request.required_format().is_err());
        assert_eq!(request.with_format("xml").required_format().unwrap(), "xml");
    }
}
