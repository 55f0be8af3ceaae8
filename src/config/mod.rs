//! Configuration management for admin-export
//!
//! Configuration is read from a TOML file. Precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file (`--config`, else `~/.admin-export/config.toml`)
//! 3. Default values
//!
//! Every field has a serde default, so a partial file is always valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Export behaviour
    #[serde(default)]
    pub export: ExportConfig,

    /// Path resolver placeholders
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Typed-document rendering
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Static access grants
    #[serde(default)]
    pub access: AccessConfig,
}

/// Export behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory of export templates (None disables template lookups)
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Prefix placed before `<app_label>/<model>/` in template paths
    #[serde(default = "default_template_base")]
    pub template_base: Option<String>,

    /// File name of the declared field list
    #[serde(default = "default_export_fields_file")]
    pub export_fields_file: String,

    /// Emit a header row in spreadsheet exports
    #[serde(default = "default_include_headers")]
    pub include_headers: bool,

    /// Serve spreadsheets as attachments
    #[serde(default)]
    pub spreadsheet_attachment: bool,

    /// Serve typed documents as attachments
    #[serde(default)]
    pub pdf_attachment: bool,

    /// Serve serialized data as attachments
    #[serde(default = "default_data_attachment")]
    pub data_attachment: bool,

    /// Pretty-print JSON serializer output
    #[serde(default)]
    pub json_pretty: bool,
}

/// Placeholders substituted by the path resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Shown when a method needs arguments
    #[serde(default)]
    pub invalid_placeholder: String,

    /// Shown when a method fails silently
    #[serde(default = "default_exception_placeholder")]
    pub exception_placeholder: String,

    /// Shown instead of calling a data-mutating method
    #[serde(default = "default_alteration_placeholder")]
    pub alteration_placeholder: String,
}

/// Typed-document output mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PdfMode {
    /// Compile the rendered LaTeX to PDF
    Pdf,
    /// Return the rendered LaTeX source
    Tex,
}

/// Typed-document rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_mode")]
    pub mode: PdfMode,

    /// LaTeX compiler executable
    #[serde(default = "default_latex_command")]
    pub latex_command: String,

    /// Compiler passes (longtable needs more than one to settle widths)
    #[serde(default = "default_latex_passes")]
    pub passes: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Static access grant table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub users: Vec<UserGrant>,
}

/// Grants held by one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserGrant {
    pub username: String,

    /// Holds every permission
    #[serde(default)]
    pub superuser: bool,

    /// Blanket permissions, e.g. `library.change_book`
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Per-object grants: permission name to record ids
    #[serde(default)]
    pub objects: BTreeMap<String, Vec<String>>,
}

// Default value functions
fn default_template_base() -> Option<String> {
    Some("admin".to_string())
}

fn default_export_fields_file() -> String {
    "export_fields.txt".to_string()
}

fn default_include_headers() -> bool {
    true
}

fn default_data_attachment() -> bool {
    true
}

fn default_exception_placeholder() -> String {
    "<< invalid -- exception >>".to_string()
}

fn default_alteration_placeholder() -> String {
    "<< invalid -- no data alteration >>".to_string()
}

fn default_pdf_mode() -> PdfMode {
    PdfMode::Pdf
}

fn default_latex_command() -> String {
    "pdflatex".to_string()
}

fn default_latex_passes() -> u32 {
    2
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            template_base: default_template_base(),
            export_fields_file: default_export_fields_file(),
            include_headers: default_include_headers(),
            spreadsheet_attachment: false,
            pdf_attachment: false,
            data_attachment: default_data_attachment(),
            json_pretty: false,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            invalid_placeholder: String::new(),
            exception_placeholder: default_exception_placeholder(),
            alteration_placeholder: default_alteration_placeholder(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            mode: default_pdf_mode(),
            latex_command: default_latex_command(),
            passes: default_latex_passes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with proper precedence
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present, and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".admin-export")
            .join("config.toml")
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.export.export_fields_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.export_fields_file".to_string(),
                value: self.export.export_fields_file.clone(),
            }
            .into());
        }
        if self.pdf.passes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pdf.passes".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if let Some(user) = self.access.users.iter().find(|u| u.username.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "access.users.username".to_string(),
                value: user.username.clone(),
            }
            .into());
        }
        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
