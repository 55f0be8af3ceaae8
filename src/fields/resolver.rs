//! Field path resolution
//!
//! Resolves a dotted path such as `author.address.city` or `items.0.sku`
//! against a record. Each segment is looked up by trying, in order:
//!
//! 1. key access (`current[segment]`)
//! 2. attribute access (`current.segment`)
//! 3. integer index access (`current[int(segment)]`)
//!
//! The first strategy that succeeds wins. A segment no strategy can resolve
//! ends the walk with a diagnostic string instead of an error, so a single bad
//! cell never aborts an export.
//!
//! Invocable values met along the way are called with zero arguments, unless
//! they are flagged as not callable or as mutating data.

use std::borrow::Cow;

use tracing::{debug, trace};

use super::spec::{FieldSpec, path_segments};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::record::{InvokeFault, RecordValue};

/// One access strategy: resolve `segment` against `current`, or report a miss
type Lookup = for<'a> fn(&'a RecordValue, &str) -> Option<Cow<'a, RecordValue>>;

/// Strategies in the order they are attempted
const LOOKUPS: [Lookup; 3] = [key_lookup, attribute_lookup, index_lookup];

fn key_lookup<'a>(current: &'a RecordValue, segment: &str) -> Option<Cow<'a, RecordValue>> {
    match current {
        RecordValue::Map(map) => map.get(segment).map(Cow::Borrowed),
        RecordValue::Object(obj) => obj.item(segment).map(Cow::Owned),
        _ => None,
    }
}

fn attribute_lookup<'a>(current: &'a RecordValue, segment: &str) -> Option<Cow<'a, RecordValue>> {
    match current {
        RecordValue::Object(obj) => obj.attribute(segment).map(Cow::Owned),
        _ => None,
    }
}

fn index_lookup<'a>(current: &'a RecordValue, segment: &str) -> Option<Cow<'a, RecordValue>> {
    let index: i64 = segment.trim().parse().ok()?;
    match current {
        RecordValue::List(items) => {
            let position = normalize_index(index, items.len())?;
            items.get(position).map(Cow::Borrowed)
        }
        RecordValue::Text(text) => {
            let count = text.chars().count();
            let position = normalize_index(index, count)?;
            text.chars()
                .nth(position)
                .map(|c| Cow::Owned(RecordValue::Text(c.to_string())))
        }
        RecordValue::Object(obj) => obj.index(index).map(Cow::Owned),
        _ => None,
    }
}

/// Negative indexes count from the end
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}

/// Outcome of walking a path
#[derive(Debug)]
pub enum Resolved<'a> {
    /// The path resolved to a value
    Value(Cow<'a, RecordValue>),
    /// The walk stopped early; the text replaces the value
    Text(String),
}

impl Resolved<'_> {
    /// Apply the null default, then convert to display text
    pub fn into_display(self, default_for_null: Option<&str>) -> String {
        match self {
            Resolved::Value(value) => match (value.as_ref(), default_for_null) {
                (RecordValue::Null, Some(default)) => default.to_string(),
                (value, _) => value.display_text(),
            },
            Resolved::Text(text) => text,
        }
    }
}

/// Resolves field paths against records
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a field spec string to display text
    ///
    /// # Arguments
    /// * `record` - Record to resolve against
    /// * `field` - Field spec (`path[:label[:default]]`)
    ///
    /// # Returns
    /// * `Result<String>` - Display text; errors only on fatal method faults
    pub fn resolve(&self, record: &RecordValue, field: &str) -> Result<String> {
        self.resolve_spec(record, &FieldSpec::decode(field))
    }

    /// Resolve an already decoded field spec to display text
    pub fn resolve_spec(&self, record: &RecordValue, spec: &FieldSpec) -> Result<String> {
        let resolved = self.walk(record, &spec.path)?;
        Ok(resolved.into_display(spec.default_for_null.as_deref()))
    }

    /// Walk a dotted path, returning the reached value or a replacement text
    pub fn walk<'a>(&self, record: &'a RecordValue, path: &str) -> Result<Resolved<'a>> {
        let mut current: Cow<'a, RecordValue> = Cow::Borrowed(record);

        for segment in path_segments(path) {
            if current.is_null() {
                break;
            }

            let next = LOOKUPS.iter().find_map(|lookup| match &current {
                Cow::Borrowed(value) => lookup(*value, segment),
                Cow::Owned(value) => lookup(value, segment).map(|v| Cow::Owned(v.into_owned())),
            });

            let Some(next) = next else {
                trace!("Failed lookup for segment '{}' of '{}'", segment, path);
                return Ok(Resolved::Text(format!(
                    "Failed lookup for key [{}] in {}",
                    segment,
                    current.repr()
                )));
            };
            current = next;

            let method = match current.as_ref() {
                RecordValue::Callable(method) => method.clone(),
                _ => continue,
            };

            if method.is_do_not_call() {
                continue;
            }
            if method.is_alters_data() {
                current = Cow::Owned(RecordValue::Text(
                    self.config.alteration_placeholder.clone(),
                ));
                continue;
            }
            if method.required_args() > 0 {
                current = Cow::Owned(RecordValue::Text(self.config.invalid_placeholder.clone()));
                continue;
            }

            match method.call() {
                Ok(value) => current = Cow::Owned(value),
                Err(InvokeFault::Silent(message)) => {
                    debug!("Method '{}' failed silently: {}", method.name(), message);
                    return Ok(Resolved::Text(self.config.exception_placeholder.clone()));
                }
                Err(InvokeFault::Fatal(message)) => {
                    return Err(ResolveError::InvocationFault {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        message,
                    }
                    .into());
                }
            }
        }

        Ok(Resolved::Value(current))
    }
}
