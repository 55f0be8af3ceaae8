//! Default typed-document layout
//!
//! When a record type has no `export.tex` of its own, a tabular LaTeX document
//! is synthesized from the export columns and rendered through the same
//! template engine as a hand-written one.

use std::fmt;

use super::engine::{RESOLVE_FILTER, Template, latex_escape};
use crate::error::Result;
use crate::fields::FieldSpec;

/// Columns at which the layout turns to landscape
pub const LANDSCAPE_THRESHOLD: usize = 6;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Tabular layout derived from the export columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    headers: Vec<String>,
    cells: Vec<String>,
}

impl DocumentLayout {
    /// Build a layout from header labels and the matching field specs
    pub fn new<'a>(headers: Vec<String>, fields: impl IntoIterator<Item = &'a FieldSpec>) -> Self {
        let cells = fields.into_iter().map(cell_expression).collect();
        Self { headers, cells }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn orientation(&self) -> Orientation {
        if self.column_count() < LANDSCAPE_THRESHOLD {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// One `l` per column
    pub fn column_spec(&self) -> String {
        "l".repeat(self.column_count())
    }

    /// Template expressions, one per column
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// LaTeX template source
    pub fn to_source(&self) -> String {
        let header_line = self
            .headers
            .iter()
            .map(|h| latex_escape(h))
            .collect::<Vec<_>>()
            .join(" & ");
        let object_line = self
            .cells
            .iter()
            .map(|c| format!("{{{{ {c} }}}}"))
            .collect::<Vec<_>>()
            .join(" & ");

        let mut source = String::from(PREAMBLE);
        source.push_str(&format!(
            "\\geometry{{letterpaper,{},margin=1cm,bottom=1.5cm}}\n",
            self.orientation()
        ));
        source.push_str(PAGE_STYLE);
        source.push_str(&format!("\\begin{{longtable}}{{{}}}%\n", self.column_spec()));
        source.push_str("    \\toprule\n");
        source.push_str(&format!("    {header_line} \\\\\n"));
        source.push_str("    \\midrule\n    \\endhead\n    \\bottomrule\n    \\endfoot\n");
        source.push_str("    {% for object in object_list %}%\n");
        source.push_str(&format!("        {object_line} \\\\\n"));
        source.push_str("    {% endfor %}%\n");
        source.push_str("\\end{longtable}\n\n\\end{document}\n");
        source
    }

    /// Compile the layout into a template
    pub fn into_template(self, name: &str) -> Result<Template> {
        Template::compile(name, self.to_source())
    }
}

/// `object|resolve("<path>[::<default>]")`
///
/// The field goes in as a quoted string literal, so nothing in it can end the
/// expression.
fn cell_expression(spec: &FieldSpec) -> String {
    let field = match spec.default_for_null.as_deref() {
        Some(default) if !default.is_empty() => format!("{}::{}", spec.path, default),
        _ => spec.path.clone(),
    };
    let literal = serde_json::Value::String(field).to_string();
    format!("object|{RESOLVE_FILTER}({literal})")
}

const PREAMBLE: &str = r"\documentclass[letterpaper,10pt]{article}


\usepackage{geometry}
\usepackage{longtable}
\usepackage{booktabs}
\usepackage{times}
\usepackage{fancyhdr}
\usepackage{relsize}
\usepackage[table]{xcolor}

";

const PAGE_STYLE: &str = r"
\pagestyle{fancy}


\lhead{}
\chead{}
\rhead{}
\lfoot{}
\cfoot{ {\footnotesize Generate on \today} }
\rfoot{}

\renewcommand{\headrulewidth}{0pt}
\renewcommand{\footrulewidth}{0pt}

\definecolor{light-gray}{gray}{0.9}
\begin{document}
\rowcolors{3}{white}{light-gray}
\relsize{-0.75}

";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::PathResolver;
    use crate::record::RecordValue;
    use crate::template::{Context, Escape};
    use serde_json::json;

    fn layout(fields: &[&str]) -> DocumentLayout {
        let specs: Vec<FieldSpec> = fields.iter().map(|f| FieldSpec::decode(f)).collect();
        let headers = specs.iter().map(|s| s.label.clone()).collect();
        DocumentLayout::new(headers, &specs)
    }

    #[test]
    fn test_two_columns_portrait() {
        let layout = layout(&["name", "age"]);
        assert_eq!(layout.column_count(), 2);
        assert_eq!(layout.column_spec(), "ll");
        assert_eq!(layout.orientation(), Orientation::Portrait);
        assert!(layout.to_source().contains("letterpaper,portrait,"));
    }

    #[test]
    fn test_six_columns_landscape() {
        let five = layout(&["a", "b", "c", "d", "e"]);
        assert_eq!(five.orientation(), Orientation::Portrait);

        let six = layout(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(six.orientation(), Orientation::Landscape);
        assert!(six.to_source().contains(r"\begin{longtable}{llllll}%"));
    }

    #[test]
    fn test_cell_expressions_drop_labels_keep_defaults() {
        let layout = layout(&["title:Book", "author.name:Author:anonymous"]);
        assert_eq!(
            layout.cells(),
            [
                r#"object|resolve("title")"#,
                r#"object|resolve("author.name::anonymous")"#
            ]
        );
    }

    #[test]
    fn test_default_text_stays_inside_the_literal() {
        let template = layout(&[r#"title:Title:"}}\input{x}{{""#])
            .into_template("default")
            .unwrap();
        let mut context = Context::new();
        context.insert("object_list", RecordValue::from(json!([{"title": null}])));
        let out = template
            .render(&context, &PathResolver::default(), Escape::Latex)
            .unwrap();
        assert!(out.contains(r#""\}\}\textbackslash{}input\{x\}\{\{" \\"#));
        assert!(!out.contains(r"\input{x}"));
    }

    #[test]
    fn test_synthesized_template_renders_rows() {
        let template = layout(&["name:Full name", "age"]).into_template("default").unwrap();
        let mut context = Context::new();
        context.insert(
            "object_list",
            RecordValue::from(json!([{"name": "Ana_B", "age": 31}, {"name": "Bo", "age": null}])),
        );
        let out = template
            .render(&context, &PathResolver::default(), Escape::Latex)
            .unwrap();
        assert!(out.contains(r"Full name & age \\"));
        assert!(out.contains(r"Ana\_B & 31 \\"));
        assert!(out.contains(r"Bo &  \\"));
        assert!(out.contains(r"\cfoot{ {\footnotesize Generate on \today} }"));
    }
}
