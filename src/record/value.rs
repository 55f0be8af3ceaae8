//! Dynamic record values
//!
//! Records handed to the exporter may be plain mappings, sequences or
//! application objects. `RecordValue` models all of them so that a single
//! field path can be resolved against any shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

/// A value reachable from a record
#[derive(Clone)]
pub enum RecordValue {
    /// Missing value
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Ordered sequence, supports index access
    List(Vec<RecordValue>),
    /// Keyed mapping, supports key access
    Map(BTreeMap<String, RecordValue>),
    /// Application object exposing some subset of key, attribute and index access
    Object(Arc<dyn RecordObject>),
    /// Zero-argument invocable
    Callable(Method),
}

/// Access capabilities of an application object.
///
/// Every accessor is optional: an object that only knows attributes leaves
/// `item` and `index` at their defaults.
pub trait RecordObject: Send + Sync {
    /// Short type name used in diagnostics
    fn type_name(&self) -> &str;

    /// Attribute-style access (`object.name`)
    fn attribute(&self, _name: &str) -> Option<RecordValue> {
        None
    }

    /// Key-style access (`object[key]`)
    fn item(&self, _key: &str) -> Option<RecordValue> {
        None
    }

    /// Integer index access (`object[i]`)
    fn index(&self, _index: i64) -> Option<RecordValue> {
        None
    }

    /// Display text of the object
    fn display(&self) -> String {
        format!("<{}>", self.type_name())
    }

    /// Full-record representation used by structured serializers
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.display())
    }
}

/// Failure reported by a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeFault {
    /// Tolerated failure; the cell shows the exception placeholder
    Silent(String),
    /// Unexpected failure; aborts the export
    Fatal(String),
}

type MethodBody = dyn Fn() -> Result<RecordValue, InvokeFault> + Send + Sync;

/// A method reachable from a record.
///
/// Methods are only ever invoked with zero arguments. A method declaring
/// required arguments is never called.
#[derive(Clone)]
pub struct Method {
    name: String,
    required_args: usize,
    do_not_call: bool,
    alters_data: bool,
    body: Arc<MethodBody>,
}

impl Method {
    /// Create a zero-argument method
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Result<RecordValue, InvokeFault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            required_args: 0,
            do_not_call: false,
            alters_data: false,
            body: Arc::new(body),
        }
    }

    /// Declare that the method needs `count` arguments
    pub fn with_required_args(mut self, count: usize) -> Self {
        self.required_args = count;
        self
    }

    /// Mark the method as never callable from display contexts
    pub fn do_not_call(mut self) -> Self {
        self.do_not_call = true;
        self
    }

    /// Mark the method as mutating data
    pub fn alters_data(mut self) -> Self {
        self.alters_data = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_args(&self) -> usize {
        self.required_args
    }

    pub fn is_do_not_call(&self) -> bool {
        self.do_not_call
    }

    pub fn is_alters_data(&self) -> bool {
        self.alters_data
    }

    /// Invoke the method body
    pub fn call(&self) -> Result<RecordValue, InvokeFault> {
        (self.body)()
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("required_args", &self.required_args)
            .field("do_not_call", &self.do_not_call)
            .field("alters_data", &self.alters_data)
            .finish()
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Null => write!(f, "Null"),
            RecordValue::Bool(b) => write!(f, "Bool({b})"),
            RecordValue::Int(n) => write!(f, "Int({n})"),
            RecordValue::Float(x) => write!(f, "Float({x})"),
            RecordValue::Text(s) => write!(f, "Text({s:?})"),
            RecordValue::List(items) => f.debug_list().entries(items).finish(),
            RecordValue::Map(map) => f.debug_map().entries(map).finish(),
            RecordValue::Object(obj) => write!(f, "Object({})", obj.type_name()),
            RecordValue::Callable(method) => fmt::Debug::fmt(method, f),
        }
    }
}

impl RecordValue {
    /// Build a mapping from key/value pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RecordValue)>,
    {
        RecordValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap an application object
    pub fn object<T: RecordObject + 'static>(object: T) -> Self {
        RecordValue::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    /// Canonical display text
    pub fn display_text(&self) -> String {
        match self {
            RecordValue::Null => String::new(),
            RecordValue::Bool(b) => b.to_string(),
            RecordValue::Int(n) => n.to_string(),
            RecordValue::Float(x) => display_float(*x),
            RecordValue::Text(s) => s.clone(),
            RecordValue::List(_) | RecordValue::Map(_) => self.to_json().to_string(),
            RecordValue::Object(obj) => obj.display(),
            RecordValue::Callable(method) => format!("<method {}>", method.name()),
        }
    }

    /// Short representation used in lookup diagnostics
    pub fn repr(&self) -> String {
        match self {
            RecordValue::Null => "None".to_string(),
            RecordValue::Object(obj) => obj.display(),
            RecordValue::Callable(method) => format!("<method {}>", method.name()),
            _ => self.to_json().to_string(),
        }
    }

    /// Convert into a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            RecordValue::Null => JsonValue::Null,
            RecordValue::Bool(b) => JsonValue::Bool(*b),
            RecordValue::Int(n) => JsonValue::Number((*n).into()),
            RecordValue::Float(x) => serde_json::Number::from_f64(*x)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            RecordValue::Text(s) => JsonValue::String(s.clone()),
            RecordValue::List(items) => {
                JsonValue::Array(items.iter().map(RecordValue::to_json).collect())
            }
            RecordValue::Map(map) => JsonValue::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            RecordValue::Object(obj) => obj.to_json(),
            RecordValue::Callable(method) => JsonValue::String(format!("<method {}>", method.name())),
        }
    }
}

/// Whole floats keep a trailing `.0` so they read differently from integers
fn display_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

impl From<JsonValue> for RecordValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RecordValue::Null,
            JsonValue::Bool(b) => RecordValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RecordValue::Int(i),
                None => RecordValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => RecordValue::Text(s),
            JsonValue::Array(items) => {
                RecordValue::List(items.into_iter().map(RecordValue::from).collect())
            }
            JsonValue::Object(map) => RecordValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, RecordValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::Text(s.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        RecordValue::Text(s)
    }
}

impl From<i64> for RecordValue {
    fn from(n: i64) -> Self {
        RecordValue::Int(n)
    }
}

impl From<bool> for RecordValue {
    fn from(b: bool) -> Self {
        RecordValue::Bool(b)
    }
}

impl<T: Into<RecordValue>> From<Option<T>> for RecordValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RecordValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text_scalars() {
        assert_eq!(RecordValue::Null.display_text(), "");
        assert_eq!(RecordValue::Bool(true).display_text(), "true");
        assert_eq!(RecordValue::Int(42).display_text(), "42");
        assert_eq!(RecordValue::Float(2.5).display_text(), "2.5");
        assert_eq!(RecordValue::Float(2.0).display_text(), "2.0");
        assert_eq!(RecordValue::Float(-3.0).display_text(), "-3.0");
        assert_eq!(RecordValue::Float(f64::NAN).display_text(), "NaN");
        assert_eq!(RecordValue::from("Ana").display_text(), "Ana");
    }

    #[test]
    fn test_display_text_containers_are_json() {
        let value = RecordValue::from(json!({"a": [1, "b"]}));
        assert_eq!(value.display_text(), r#"{"a":[1,"b"]}"#);
    }

    #[test]
    fn test_json_round_trip_preserves_shape() {
        let source = json!({"user": {"name": "Ana", "age": 31}, "tags": ["x"], "score": 1.5});
        assert_eq!(RecordValue::from(source.clone()).to_json(), source);
    }

    #[test]
    fn test_method_flags() {
        let method = Method::new("delete", || Ok(RecordValue::Null))
            .alters_data()
            .with_required_args(1);
        assert!(method.is_alters_data());
        assert!(!method.is_do_not_call());
        assert_eq!(method.required_args(), 1);
        assert_eq!(RecordValue::Callable(method).display_text(), "<method delete>");
    }
}
