//! LaTeX document encoder
//!
//! Renders a typed-document template with LaTeX escaping. In `tex` mode the
//! rendered source is the output; in `pdf` mode it is compiled by the
//! configured LaTeX command inside a temporary directory.

use std::process::Command;

use tracing::{debug, info};

use super::DocumentEncoder;
use crate::config::{PdfConfig, PdfMode};
use crate::error::{ExportError, Result};
use crate::fields::PathResolver;
use crate::template::{Context, Escape, Template};

const JOB_NAME: &str = "export";

/// Typed-document encoder backed by LaTeX
#[derive(Debug, Clone)]
pub struct LatexEncoder {
    config: PdfConfig,
    resolver: PathResolver,
}

impl LatexEncoder {
    pub fn new(config: PdfConfig, resolver: PathResolver) -> Self {
        Self { config, resolver }
    }

    /// Render the template to LaTeX source
    pub fn render_source(&self, template: &Template, context: &Context) -> Result<String> {
        template.render(context, &self.resolver, Escape::Latex)
    }

    /// Compile LaTeX source to PDF
    ///
    /// # Arguments
    /// * `source` - Complete LaTeX document
    ///
    /// # Returns
    /// * `Result<Vec<u8>>` - PDF bytes, or an encoder error with the log tail
    fn compile(&self, source: &str) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let tex_path = dir.path().join(format!("{JOB_NAME}.tex"));
        std::fs::write(&tex_path, source)?;

        for pass in 1..=self.config.passes {
            debug!("Running {} (pass {})", self.config.latex_command, pass);
            let output = Command::new(&self.config.latex_command)
                .arg("-interaction=batchmode")
                .arg("-halt-on-error")
                .arg(format!("-jobname={JOB_NAME}"))
                .arg(&tex_path)
                .current_dir(dir.path())
                .output()
                .map_err(|e| {
                    ExportError::Encoder(format!(
                        "Failed to run '{}': {}",
                        self.config.latex_command, e
                    ))
                })?;

            if !output.status.success() {
                let log = std::fs::read_to_string(dir.path().join(format!("{JOB_NAME}.log")))
                    .unwrap_or_default();
                return Err(ExportError::Encoder(format!(
                    "{} exited with {}: {}",
                    self.config.latex_command,
                    output.status,
                    log_tail(&log, 20)
                )));
            }
        }

        let pdf = std::fs::read(dir.path().join(format!("{JOB_NAME}.pdf")))?;
        info!("Compiled PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

impl DocumentEncoder for LatexEncoder {
    fn encode(&self, template: &Template, context: &Context) -> Result<Vec<u8>> {
        let source = self.render_source(template, context)?;
        match self.config.mode {
            PdfMode::Tex => Ok(source.into_bytes()),
            PdfMode::Pdf => self.compile(&source),
        }
    }

    fn extension(&self) -> &str {
        match self.config.mode {
            PdfMode::Pdf => "pdf",
            PdfMode::Tex => "tex",
        }
    }
}

/// Last `lines` lines of a compiler log
fn log_tail(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
