//! admin-export command-line tool
//!
//! Runs export requests against a JSON dataset.
//!
//! # Usage
//!
//! ```bash
//! # Spreadsheet export to a file
//! admin-export export spreadsheet \
//!     --params "contenttype=library.book&format=xlsx&query=all" \
//!     --data books.json --user admin --output books.xlsx
//!
//! # Preview the resolved cells
//! admin-export export spreadsheet --preview \
//!     --params "contenttype=library.book&format=csv&pk=1&pk=2" --data books.json --user admin
//! ```

use tracing::Level;

use admin_export::cli::CliInterface;
use admin_export::error::Result;

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);
    cli.run()
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Logs go to stderr so exports written to stdout stay clean
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
