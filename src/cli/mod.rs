//! Command-line interface for admin-export
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and argument overrides
//! - Running exports against a dataset file

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::access::{Caller, PermissionTable};
use crate::config::{Config, LogLevel};
use crate::encoder::EncoderRegistry;
use crate::error::Result;
use crate::export::{
    ALL_EXPORT_ACTIONS, Channel, ExportDispatcher, ExportRequest, ExportResult, selection_query,
};
use crate::formatter::{TableFormatter, format_headers, format_summary};
use crate::record::{ContentType, MemorySource};
use crate::template::{DirectoryTemplates, NoTemplates, TemplateStore};

/// Admin export - spreadsheet, document and data exports of stored records
#[derive(Parser, Debug)]
#[command(
    name = "admin-export",
    version,
    about = "Export stored records to spreadsheets, documents and data files",
    long_about = "Runs admin export requests (spreadsheet, typed document and serializer
channels) against a JSON dataset, honouring per-user access grants."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for admin-export
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export
    Export {
        /// Channel (spreadsheet, pdf, data)
        #[arg(value_name = "CHANNEL")]
        channel: Channel,

        /// Request parameters as a URL query string
        ///
        /// Example: "contenttype=library.book&format=csv&query=all"
        #[arg(short = 'p', long, value_name = "QUERY")]
        params: String,

        /// Dataset file (JSON)
        #[arg(short = 'd', long, value_name = "FILE")]
        data: PathBuf,

        /// Export on behalf of this user
        #[arg(short = 'u', long, value_name = "NAME")]
        user: Option<String>,

        /// Field spec (repeatable), e.g. `author.name:Author:n/a`
        #[arg(short = 'f', long = "fields", value_name = "SPEC")]
        fields: Vec<String>,

        /// Template root directory
        #[arg(short = 't', long, value_name = "DIR")]
        templates: Option<PathBuf>,

        /// Serve the export as an attachment
        #[arg(long)]
        attachment: bool,

        /// Omit the header row
        #[arg(long)]
        no_headers: bool,

        /// Write the export to a file instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print a table of the resolved cells instead of encoding
        #[arg(long)]
        preview: bool,
    },

    /// List the export actions
    Actions {
        /// Show redirect targets for this record type
        #[arg(long, value_name = "APP.MODEL")]
        contenttype: Option<ContentType>,

        /// Selected record ids
        #[arg(long, value_name = "ID", num_args = 1..)]
        selected: Vec<String>,
    },

    /// Show the field catalog of a request
    Fields {
        /// Request parameters as a URL query string
        #[arg(short = 'p', long, value_name = "QUERY")]
        params: String,

        /// Dataset file (JSON)
        #[arg(short = 'd', long, value_name = "FILE")]
        data: PathBuf,

        /// Template root directory
        #[arg(short = 't', long, value_name = "DIR")]
        templates: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Validate configuration file only
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        Self::from_args(args)
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, &args);
        Ok(Self { args, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Apply CLI arguments to configuration
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Parsed arguments
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };

        let templates = match &args.command {
            Commands::Export { templates, .. } | Commands::Fields { templates, .. } => {
                templates.clone()
            }
            _ => None,
        };
        if let Some(dir) = templates {
            config.export.template_dir = Some(dir);
        }
    }

    /// Run the selected subcommand
    pub fn run(&self) -> Result<()> {
        match &self.args.command {
            Commands::Export {
                channel,
                params,
                data,
                user,
                fields,
                attachment,
                no_headers,
                output,
                preview,
                ..
            } => {
                let mut request = ExportRequest::from_query(*channel, params)?;
                if !fields.is_empty() {
                    request = request.with_fields(fields.clone());
                }
                if *attachment {
                    request = request.with_attachment(true);
                }
                if *no_headers {
                    request = request.with_headers(false);
                }
                let caller = user.as_deref().map(Caller::new);

                if *preview {
                    self.preview(&request, data, caller.as_ref())
                } else {
                    let result = self.export(&request, data, caller.as_ref())?;
                    self.emit(&result, output.as_deref())
                }
            }
            Commands::Actions {
                contenttype,
                selected,
            } => {
                self.list_actions(contenttype.as_ref(), selected);
                Ok(())
            }
            Commands::Fields { params, data, .. } => {
                let request = ExportRequest::from_query(Channel::Spreadsheet, params)?;
                self.show_fields(&request, data)
            }
            Commands::Config { validate } => self.handle_config_command(*validate),
        }
    }

    /// Run an export request against a dataset
    ///
    /// # Arguments
    /// * `request` - Parsed export request
    /// * `data` - Dataset file
    /// * `caller` - Requesting user, if any
    pub fn export(&self, request: &ExportRequest, data: &Path, caller: Option<&Caller>) -> Result<ExportResult> {
        let source = MemorySource::from_file(data)?;
        let templates = self.template_store();
        let encoders = EncoderRegistry::with_defaults(&self.config);
        let grants = PermissionTable::from_config(&self.config.access);

        ExportDispatcher::new(&source, templates.as_ref(), &encoders, &self.config)
            .with_grants(&grants)
            .export(request, caller)
    }

    /// Print the resolved matrix of a request as a table
    fn preview(&self, request: &ExportRequest, data: &Path, caller: Option<&Caller>) -> Result<()> {
        let source = MemorySource::from_file(data)?;
        let templates = self.template_store();
        let encoders = EncoderRegistry::with_defaults(&self.config);
        let grants = PermissionTable::from_config(&self.config.access);
        let dispatcher = ExportDispatcher::new(&source, templates.as_ref(), &encoders, &self.config)
            .with_grants(&grants);

        let records = dispatcher.select_records(request, caller)?;
        let catalog = dispatcher.catalog(request)?;
        let include_headers = request
            .include_headers
            .unwrap_or(self.config.export.include_headers);
        let matrix = dispatcher.build_matrix(&catalog, &records, include_headers)?;

        println!("{}", TableFormatter::new().format_matrix(&matrix));
        Ok(())
    }

    /// Write export bytes to a file or stdout; headers go to stderr when the
    /// body is on stdout
    fn emit(&self, result: &ExportResult, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                std::fs::write(path, &result.bytes)?;
                debug!("Wrote {} bytes to {}", result.bytes.len(), path.display());
                println!("{}", format_headers(result));
                println!("{}", format_summary(result));
            }
            None => {
                eprintln!("{}", format_headers(result));
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&result.bytes)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn list_actions(&self, content_type: Option<&ContentType>, selected: &[String]) {
        println!("{}", TableFormatter::new().format_actions(&ALL_EXPORT_ACTIONS));

        if let Some(content_type) = content_type {
            let selection = selection_query(selected, selected, selected.len());
            println!();
            for action in ALL_EXPORT_ACTIONS.iter() {
                println!("{}: {}", action.name, action.redirect_url(content_type, &selection));
            }
        }
    }

    fn show_fields(&self, request: &ExportRequest, data: &Path) -> Result<()> {
        let source = MemorySource::from_file(data)?;
        let templates = self.template_store();
        let encoders = EncoderRegistry::with_defaults(&self.config);
        let dispatcher = ExportDispatcher::new(&source, templates.as_ref(), &encoders, &self.config);

        let catalog = dispatcher.catalog(request)?;
        println!("{}", TableFormatter::new().format_catalog(&catalog));
        println!("({:?} field list)", catalog.origin());
        Ok(())
    }

    fn handle_config_command(&self, validate: bool) -> Result<()> {
        self.config.validate()?;
        if validate {
            println!("Configuration is valid");
            return Ok(());
        }

        let text = toml::to_string_pretty(&self.config)
            .map_err(|e| crate::error::ConfigError::InvalidFormat(e.to_string()))?;
        println!("{text}");
        Ok(())
    }

    /// Template store for the configured template root
    fn template_store(&self) -> Box<dyn TemplateStore> {
        match DirectoryTemplates::from_config(&self.config.export) {
            Some(store) => {
                debug!("Using templates under {}", store.root().display());
                Box::new(store)
            }
            None => Box::new(NoTemplates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_export_command() {
        let args = parse(&[
            "admin-export",
            "export",
            "spreadsheet",
            "--params",
            "contenttype=library.book&format=csv&query=all",
            "--data",
            "books.json",
            "--fields",
            "title",
            "--fields",
            "author.name:Author",
            "--no-headers",
        ]);

        match args.command {
            Commands::Export {
                channel,
                fields,
                no_headers,
                attachment,
                ..
            } => {
                assert_eq!(channel, Channel::Spreadsheet);
                assert_eq!(fields, vec!["title", "author.name:Author"]);
                assert!(no_headers);
                assert!(!attachment);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_serializer_alias_for_data_channel() {
        let args = parse(&["admin-export", "export", "serializer", "-p", "contenttype=a.b", "-d", "x.json"]);
        assert!(matches!(args.command, Commands::Export { channel: Channel::Data, .. }));
    }

    #[test]
    fn test_verbosity_overrides_config() {
        let mut config = Config::default();
        let args = parse(&["admin-export", "-v", "actions"]);
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(config.logging.level, LogLevel::Debug);

        let args = parse(&["admin-export", "-q", "actions"]);
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(config.logging.level, LogLevel::Error);
    }

    #[test]
    fn test_templates_flag_sets_template_dir() {
        let mut config = Config::default();
        let args = parse(&[
            "admin-export",
            "fields",
            "-p",
            "contenttype=library.book",
            "-d",
            "books.json",
            "--templates",
            "/srv/templates",
        ]);
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(config.export.template_dir, Some(PathBuf::from("/srv/templates")));
    }

    #[test]
    fn test_export_from_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("books.json");
        std::fs::write(
            &data,
            r#"[
                {"model": "library.book", "pk": 1, "fields": {"title": "Dune"}},
                {"model": "library.book", "pk": 2, "fields": {"title": "Emma"}}
            ]"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.access.users.push(crate::config::UserGrant {
            username: "admin".to_string(),
            superuser: true,
            ..Default::default()
        });
        let cli = CliInterface {
            args: parse(&["admin-export", "actions"]),
            config,
        };

        let request = ExportRequest::from_query(
            Channel::Spreadsheet,
            "contenttype=library.book&format=csv&query=all&fields=title",
        )
        .unwrap();
        let result = cli
            .export(&request, &data, Some(&Caller::new("admin")))
            .unwrap();
        assert_eq!(result.bytes, b"Title\nDune\nEmma\n");
        assert_eq!(result.record_count, 2);
    }
}
