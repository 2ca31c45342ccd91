//! Bootmount CLI entry point.

use bootmount::cli::{Cli, LogFormat};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for plan output
    let directive = if cli.debug {
        "bootmount=debug"
    } else {
        "bootmount=info"
    };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?));
    match cli.log_format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    // Execute command
    cli.execute()
}
