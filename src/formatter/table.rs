//! Table previews using tabled
//!
//! Renders export matrices and field catalogs for the terminal:
//! - Builder pattern, one record per matrix line
//! - Long cells wrapped to a maximum column width
//! - Configurable styles

use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::encoder::Matrix;
use crate::export::ExportAction;
use crate::fields::FieldCatalog;

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for export previews
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Table style
    style: TableStyle,
}

/// Available table styles
#[derive(Debug, Clone, Copy)]
pub enum TableStyle {
    /// Modern style with box-drawing characters
    Modern,
    /// ASCII style with basic characters
    Ascii,
    /// Markdown style
    Markdown,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            style: TableStyle::Modern,
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set maximum column width
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Format an export matrix
    ///
    /// # Arguments
    /// * `matrix` - Header (if any) and resolved rows
    ///
    /// # Returns
    /// * `String` - Rendered table
    pub fn format_matrix(&self, matrix: &Matrix) -> String {
        if matrix.rows().is_empty() && matrix.header().is_none() {
            return "(no records)".to_string();
        }

        let mut builder = Builder::default();
        for line in matrix.lines() {
            builder.push_record(line.iter().cloned());
        }
        let width = matrix.lines().map(Vec::len).max().unwrap_or(0);
        self.finish(builder, width, matrix.header().is_some())
    }

    /// Format a field catalog as `Field | Label | Default`
    pub fn format_catalog(&self, catalog: &FieldCatalog) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Label", "Default"].map(String::from));
        for column in catalog.columns() {
            builder.push_record([
                column.spec.path.clone(),
                column.label.clone(),
                column.spec.default_for_null.clone().unwrap_or_default(),
            ]);
        }
        self.finish(builder, 3, true)
    }

    /// Format the export action table
    pub fn format_actions(&self, actions: &[ExportAction]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Action", "Channel", "Format", "Description"].map(String::from));
        for action in actions {
            builder.push_record([
                action.name.to_string(),
                action.channel.to_string(),
                action.format.unwrap_or("-").to_string(),
                action.description.to_string(),
            ]);
        }
        self.finish(builder, 4, true)
    }

    fn finish(&self, builder: Builder, columns: usize, has_header: bool) -> String {
        let mut table = builder.build();
        self.apply_style(&mut table);

        // wrap long values instead of truncating them
        for i in 0..columns {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        if has_header {
            table.with(Modify::new(Rows::first()).with(Alignment::center()));
        }

        table.to_string()
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
