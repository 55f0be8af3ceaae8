//! Field spec decoding
//!
//! A field spec is `path[:label[:default]]`:
//! - `user.name` exports the path under the label `user.name`
//! - `user.name:Owner` relabels it
//! - `user.name:Owner:N/A` additionally shows `N/A` when the value is missing
//!
//! Parts beyond the third are ignored. Each path segment is an identifier or
//! an integer index.

use crate::error::{ConfigError, Result};

/// A decoded field spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dot-separated path
    pub path: String,
    /// Column label; equals `path` when none was given
    pub label: String,
    /// Replacement for missing values
    pub default_for_null: Option<String>,
}

impl FieldSpec {
    /// Decode a field spec string
    pub fn decode(spec: &str) -> Self {
        if !spec.contains(':') {
            return Self {
                path: spec.to_string(),
                label: spec.to_string(),
                default_for_null: Some(String::new()),
            };
        }

        let mut parts = spec.splitn(4, ':');
        let path = parts.next().unwrap_or_default().to_string();
        let label = parts.next().unwrap_or_default();
        // a bare `path:label` still carries an explicit empty default
        let default = parts.next().unwrap_or_default().to_string();

        let label = if label.is_empty() {
            path.clone()
        } else {
            label.to_string()
        };

        Self {
            path,
            label,
            default_for_null: Some(default),
        }
    }

    /// Path segments, left to right
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        path_segments(&self.path)
    }

    /// Reject empty paths and segments that are neither identifiers nor
    /// integer indexes
    ///
    /// # Returns
    /// * `Result<()>` - `ConfigError::InvalidValue` naming the bad path
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() || !self.segments().all(is_valid_segment) {
            return Err(ConfigError::InvalidValue {
                field: "fields".to_string(),
                value: self.path.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Split a dotted path into its segments
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        Some('-') => {
            let digits = chars.as_str();
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        Some(c) if c.is_ascii_digit() => chars.all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Strip everything after the first colon
pub fn safe_field_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((head, _)) => head,
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(spec: &FieldSpec) -> (&str, &str, Option<&str>) {
        (
            spec.path.as_str(),
            spec.label.as_str(),
            spec.default_for_null.as_deref(),
        )
    }

    #[test]
    fn test_decode_path_only() {
        for path in ["name", "user.name", "items.0.sku"] {
            let spec = FieldSpec::decode(path);
            assert_eq!(triple(&spec), (path, path, Some("")));
        }
    }

    #[test]
    fn test_decode_path_and_label() {
        assert_eq!(triple(&FieldSpec::decode("a:b")), ("a", "b", Some("")));
    }

    #[test]
    fn test_decode_full_spec() {
        assert_eq!(
            triple(&FieldSpec::decode("user.name:Owner:N/A")),
            ("user.name", "Owner", Some("N/A"))
        );
    }

    #[test]
    fn test_decode_ignores_extra_parts() {
        assert_eq!(FieldSpec::decode("a:b:c:d"), FieldSpec::decode("a:b:c"));
        assert_eq!(FieldSpec::decode("a:b:c:d:e"), FieldSpec::decode("a:b:c"));
    }

    #[test]
    fn test_decode_empty_label_falls_back_to_path() {
        assert_eq!(triple(&FieldSpec::decode("a::x")), ("a", "a", Some("x")));
        assert_eq!(triple(&FieldSpec::decode("a:")), ("a", "a", Some("")));
    }

    #[test]
    fn test_validate_accepts_identifiers_and_indexes() {
        for spec in ["title", "author.name:Author:n/a", "items.0.sku", "tags.-1", "_private", "größe"] {
            assert!(FieldSpec::decode(spec).validate().is_ok(), "{spec}");
        }
    }

    #[test]
    fn test_validate_rejects_malformed_paths() {
        for spec in [
            ":Label",
            "",
            "a..b",
            "author.",
            "title}}\\input{/etc/hostname}{{ title",
            "a b",
            "items.-",
            "1x",
        ] {
            let err = FieldSpec::decode(spec).validate().unwrap_err();
            assert!(
                matches!(
                    err,
                    crate::error::ExportError::Config(ConfigError::InvalidValue { ref field, .. })
                        if field == "fields"
                ),
                "{spec}"
            );
        }
    }

    #[test]
    fn test_safe_field_name() {
        assert_eq!(safe_field_name("user.name:Owner:N/A"), "user.name");
        assert_eq!(safe_field_name("title"), "title");
    }
}
