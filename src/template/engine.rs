//! Template rendering on minijinja
//!
//! Export templates are Jinja templates. Record values are exposed as
//! minijinja objects whose attribute, item and index lookups go through the
//! path resolver, so `{{ object.author.name }}` walks a record the same way an
//! export cell does. The `resolve` filter takes a whole field spec, null
//! default included:
//!
//! ```text
//! {% for object in object_list %}{{ object|resolve("author.name::unknown") }}{% endfor %}
//! ```
//!
//! Substituted values are optionally LaTeX-escaped; template text never is.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};

use crate::error::{Result, TemplateError};
use crate::fields::{FieldSpec, PathResolver, Resolved};
use crate::record::RecordValue;

/// Name of the filter resolving a field spec against a record
pub const RESOLVE_FILTER: &str = "resolve";

/// Escaping applied to substituted values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    None,
    Latex,
}

/// Variables visible to a template
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: BTreeMap<String, RecordValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: RecordValue) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.vars.get(name)
    }
}

/// A syntax-checked template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    /// Check template source and keep it for rendering
    ///
    /// # Returns
    /// * `Result<Template>` - The template, or `TemplateError::Syntax`
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();
        Environment::new()
            .template_from_named_str(&name, &source)
            .map_err(|e| template_error(&name, &e, true))?;
        Ok(Self { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against a context
    ///
    /// # Arguments
    /// * `context` - Template variables
    /// * `resolver` - Resolver used for record lookups and the `resolve` filter
    /// * `escape` - Escaping of substituted values
    pub fn render(&self, context: &Context, resolver: &PathResolver, escape: Escape) -> Result<String> {
        let resolver = Arc::new(resolver.clone());
        let env = environment(Arc::clone(&resolver), escape);
        let template = env
            .template_from_named_str(&self.name, &self.source)
            .map_err(|e| template_error(&self.name, &e, true))?;

        let vars = Value::from_iter(
            context
                .vars
                .iter()
                .map(|(name, value)| (name.clone(), to_template_value(value, &resolver))),
        );
        template
            .render(vars)
            .map_err(|e| template_error(&self.name, &e, false))
    }
}

fn environment<'s>(resolver: Arc<PathResolver>, escape: Escape) -> Environment<'s> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    env.set_auto_escape_callback(|_| AutoEscape::None);

    let filter_resolver = Arc::clone(&resolver);
    env.add_filter(RESOLVE_FILTER, move |value: Value, field: &str| {
        resolve_filter(&filter_resolver, &value, field)
    });

    let placeholder = resolver.config().invalid_placeholder.clone();
    env.set_formatter(move |out, _state, value| {
        let text = if value.is_undefined() {
            placeholder.clone()
        } else if value.is_none() {
            String::new()
        } else {
            value.to_string()
        };
        let text = match escape {
            Escape::Latex if !value.is_safe() => latex_escape(&text),
            _ => text,
        };
        out.write_str(&text)
            .map_err(|e| Error::new(ErrorKind::WriteFailure, e.to_string()))
    });
    env
}

fn template_error(name: &str, err: &Error, syntax: bool) -> crate::error::ExportError {
    let template = name.to_string();
    let message = err.to_string();
    if syntax {
        TemplateError::Syntax { template, message }.into()
    } else {
        TemplateError::Render { template, message }.into()
    }
}

/// `value|resolve("path[:label[:default]]")`
fn resolve_filter(resolver: &PathResolver, value: &Value, field: &str) -> std::result::Result<String, Error> {
    let spec = FieldSpec::decode(field);
    let converted;
    let record = match value.downcast_object_ref::<RecordRef>() {
        Some(record) => &record.value,
        None => {
            converted = from_template_value(value);
            &converted
        }
    };

    let resolved = if spec.path.is_empty() {
        Resolved::Value(Cow::Borrowed(record))
    } else {
        resolver
            .walk(record, &spec.path)
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?
    };
    Ok(resolved.into_display(spec.default_for_null.as_deref()))
}

/// A container record value seen from a template
#[derive(Debug)]
struct RecordRef {
    value: RecordValue,
    resolver: Arc<PathResolver>,
}

impl Object for RecordRef {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        match self.value {
            RecordValue::List(_) => ObjectRepr::Seq,
            RecordValue::Map(_) => ObjectRepr::Map,
            _ => ObjectRepr::Plain,
        }
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let segment = match key.as_str() {
            Some(name) => name.to_string(),
            None => key.as_i64()?.to_string(),
        };
        match self.resolver.walk(&self.value, &segment).ok()? {
            Resolved::Value(value) => Some(to_template_value(&value, &self.resolver)),
            Resolved::Text(text) => Some(Value::from(text)),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        match &self.value {
            RecordValue::List(items) => Enumerator::Seq(items.len()),
            RecordValue::Map(map) => {
                Enumerator::Values(map.keys().map(|k| Value::from(k.as_str())).collect())
            }
            _ => Enumerator::NonEnumerable,
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value.display_text())
    }
}

fn to_template_value(value: &RecordValue, resolver: &Arc<PathResolver>) -> Value {
    match value {
        RecordValue::Null => Value::from(()),
        RecordValue::Bool(b) => Value::from(*b),
        RecordValue::Int(n) => Value::from(*n),
        RecordValue::Float(x) => Value::from(*x),
        RecordValue::Text(s) => Value::from(s.as_str()),
        RecordValue::Callable(_) => Value::from(value.display_text()),
        RecordValue::List(_) | RecordValue::Map(_) | RecordValue::Object(_) => {
            Value::from_object(RecordRef {
                value: value.clone(),
                resolver: Arc::clone(resolver),
            })
        }
    }
}

fn from_template_value(value: &Value) -> RecordValue {
    if value.is_undefined() || value.is_none() {
        return RecordValue::Null;
    }
    serde_json::to_value(value)
        .map(RecordValue::from)
        .unwrap_or(RecordValue::Null)
}

/// Escape LaTeX special characters
pub fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}
