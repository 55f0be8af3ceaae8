//! Export dispatcher
//!
//! Routes a request to its channel. All channels share record selection and
//! access filtering; the spreadsheet and typed-document channels also share
//! the field catalog and cell resolution, while the data channel hands whole
//! records to a serializer.

use chrono::Utc;
use tracing::{debug, info};

use super::request::{ExportRequest, Selection};
use super::result::{Disposition, ExportResult, content_type_for, export_filename, fix_filename_extension};
use super::Channel;
use crate::access::{AccessFilter, AccessGrants, Caller};
use crate::config::{Config, ExportConfig};
use crate::encoder::{EncoderRegistry, Matrix};
use crate::error::{ConfigError, Result};
use crate::fields::{FieldCatalog, PathResolver};
use crate::record::{Record, RecordSource, RecordValue};
use crate::template::{Context, DocumentLayout, Escape, Template, TemplateStore};

/// Name given to the synthesized typed-document template
const DEFAULT_DOCUMENT_TEMPLATE: &str = "default_export.tex";

/// Runs export requests against a record source
pub struct ExportDispatcher<'a> {
    source: &'a dyn RecordSource,
    templates: &'a dyn TemplateStore,
    grants: Option<&'a dyn AccessGrants>,
    encoders: &'a EncoderRegistry,
    resolver: PathResolver,
    settings: ExportConfig,
}

impl<'a> ExportDispatcher<'a> {
    /// Create a dispatcher with no access grants (nothing is released until
    /// grants are attached)
    pub fn new(
        source: &'a dyn RecordSource,
        templates: &'a dyn TemplateStore,
        encoders: &'a EncoderRegistry,
        config: &Config,
    ) -> Self {
        Self {
            source,
            templates,
            grants: None,
            encoders,
            resolver: PathResolver::new(config.resolver.clone()),
            settings: config.export.clone(),
        }
    }

    pub fn with_grants(mut self, grants: &'a dyn AccessGrants) -> Self {
        self.grants = Some(grants);
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Run an export
    ///
    /// # Arguments
    /// * `request` - Parsed export request
    /// * `caller` - Requesting identity, if any
    ///
    /// # Returns
    /// * `Result<ExportResult>` - Encoded output with response metadata.
    ///   Configuration and encoder errors abort the export as a whole.
    pub fn export(&self, request: &ExportRequest, caller: Option<&Caller>) -> Result<ExportResult> {
        debug!(
            "Export of {} via {} ({:?})",
            request.content_type, request.channel, request.selection
        );
        let format = if request.channel.requires_format() {
            Some(request.required_format()?)
        } else {
            None
        };
        let result = match (request.channel, format) {
            (Channel::Spreadsheet, Some(format)) => self.export_spreadsheet(request, format, caller),
            (Channel::Data, Some(format)) => self.export_data(request, format, caller),
            _ => self.export_document(request, caller),
        }?;
        info!(
            "Exported {} {} records to {} ({} bytes)",
            result.record_count,
            request.content_type,
            result.filename,
            result.bytes.len()
        );
        Ok(result)
    }

    /// Records selected by the request, narrowed by the access filter
    pub fn select_records(&self, request: &ExportRequest, caller: Option<&Caller>) -> Result<Vec<Record>> {
        let content_type = &request.content_type;
        let candidates = match &request.selection {
            Selection::All => self.source.all_records(content_type)?,
            Selection::Ids(ids) => self.source.by_ids(content_type, ids)?,
            Selection::Nothing => Vec::new(),
        };

        let filter = match self.grants {
            Some(grants) => AccessFilter::new(grants),
            None => AccessFilter::deny_all(),
        };
        Ok(filter.filter(content_type, candidates, caller))
    }

    /// Columns for the request
    pub fn catalog(&self, request: &ExportRequest) -> Result<FieldCatalog> {
        FieldCatalog::build(
            &request.content_type,
            request.fields.as_deref(),
            self.templates,
            self.source,
        )
    }

    /// Header row (optional) plus one resolved row per record
    pub fn build_matrix(
        &self,
        catalog: &FieldCatalog,
        records: &[Record],
        include_headers: bool,
    ) -> Result<Matrix> {
        let header = include_headers.then(|| catalog.labels());
        let rows = records
            .iter()
            .map(|record| {
                catalog
                    .specs()
                    .map(|spec| self.resolver.resolve_spec(&record.value, spec))
                    .collect::<Result<Vec<String>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Matrix::new(header, rows))
    }

    fn export_spreadsheet(
        &self,
        request: &ExportRequest,
        format: &str,
        caller: Option<&Caller>,
    ) -> Result<ExportResult> {
        let content_type = &request.content_type;

        // decided once, before any record is read
        let template = self
            .templates
            .lookup(content_type, Channel::Spreadsheet, Some(format))?;
        let encoder = self.encoders.spreadsheet(format);
        if template.is_none() && encoder.is_none() {
            return Err(unknown_format(Channel::Spreadsheet, format));
        }

        let records = self.select_records(request, caller)?;
        let catalog = self.catalog(request)?;

        let bytes = match (template, encoder) {
            (Some(template), _) => {
                debug!("Rendering {} through {}", content_type, template.name());
                let context = self.template_context(request, &catalog, &records);
                template
                    .render(&context, &self.resolver, Escape::None)?
                    .into_bytes()
            }
            (None, Some(encoder)) => {
                let include_headers = request
                    .include_headers
                    .unwrap_or(self.settings.include_headers);
                let matrix = self.build_matrix(&catalog, &records, include_headers)?;
                encoder.encode(&matrix, format)?
            }
            (None, None) => return Err(unknown_format(Channel::Spreadsheet, format)),
        };

        let filename = export_filename(&content_type.model, format);
        Ok(ExportResult {
            bytes,
            content_type: content_type_for(&filename),
            filename,
            disposition: Disposition::from_attachment(
                request
                    .as_attachment
                    .unwrap_or(self.settings.spreadsheet_attachment),
            ),
            record_count: records.len(),
            generated_at: Utc::now(),
        })
    }

    fn export_document(&self, request: &ExportRequest, caller: Option<&Caller>) -> Result<ExportResult> {
        let content_type = &request.content_type;
        let records = self.select_records(request, caller)?;
        let catalog = self.catalog(request)?;

        let template = self.document_template(request, &catalog)?;
        let context = self.template_context(request, &catalog, &records);
        let encoder = self.encoders.document();
        let bytes = encoder.encode(&template, &context)?;

        let filename = fix_filename_extension(
            &export_filename(&content_type.model, "pdf"),
            encoder.extension(),
        );
        Ok(ExportResult {
            bytes,
            content_type: content_type_for(&filename),
            filename,
            disposition: Disposition::from_attachment(
                request.as_attachment.unwrap_or(self.settings.pdf_attachment),
            ),
            record_count: records.len(),
            generated_at: Utc::now(),
        })
    }

    /// The record type's own `export.tex`, else a layout synthesized from the
    /// catalog
    pub fn document_template(&self, request: &ExportRequest, catalog: &FieldCatalog) -> Result<Template> {
        match self.templates.lookup(&request.content_type, Channel::Pdf, None)? {
            Some(template) => Ok(template),
            None => {
                debug!("Synthesizing document layout for {}", request.content_type);
                DocumentLayout::new(catalog.labels(), catalog.specs())
                    .into_template(DEFAULT_DOCUMENT_TEMPLATE)
            }
        }
    }

    fn export_data(&self, request: &ExportRequest, format: &str, caller: Option<&Caller>) -> Result<ExportResult> {
        let content_type = &request.content_type;
        let serializer = self
            .encoders
            .serializer(format)
            .ok_or_else(|| unknown_format(Channel::Data, format))?;

        let records = self.select_records(request, caller)?;
        let bytes = serializer.serialize(content_type, &records)?;

        Ok(ExportResult {
            bytes,
            filename: export_filename(&content_type.model, format),
            content_type: serializer.content_type().to_string(),
            disposition: Disposition::from_attachment(
                request.as_attachment.unwrap_or(self.settings.data_attachment),
            ),
            record_count: records.len(),
            generated_at: Utc::now(),
        })
    }

    /// Variables visible to export templates
    fn template_context(&self, request: &ExportRequest, catalog: &FieldCatalog, records: &[Record]) -> Context {
        let objects = RecordValue::List(records.iter().map(|r| r.value.clone()).collect());
        let headers = RecordValue::List(catalog.labels().into_iter().map(RecordValue::Text).collect());

        let mut context = Context::new();
        context.insert(format!("{}_list", request.content_type.model), objects.clone());
        context.insert("object_list", objects);
        context.insert("headers", headers);
        context.insert("content_type", RecordValue::Text(request.content_type.to_string()));
        context
    }
}

fn unknown_format(channel: Channel, format: &str) -> crate::error::ExportError {
    ConfigError::UnknownFormat {
        channel: channel.to_string(),
        format: format.to_string(),
    }
    .into()
}
