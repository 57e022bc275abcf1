//! trac-history CLI - Change history extraction from saved Trac ticket pages.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "trac-history")]
#[command(author, version, about = "Extract change history from Trac ticket pages")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Parser config file (defaults to .trac-history.yml in the current directory)
    #[arg(long, global = true, env = "TRAC_HISTORY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the change history of a saved ticket page
    #[command(alias = "log")]
    History {
        /// HTML file, or `-` for stdin
        input: PathBuf,

        /// Ticket number or label used in headings
        #[arg(long, short = 't')]
        ticket: Option<String>,

        /// URL the page was saved from
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Parse metadata, attachments and history of a saved ticket page
    Ticket {
        /// HTML file, or `-` for stdin
        input: PathBuf,

        /// Ticket number or label
        #[arg(long, short = 't')]
        ticket: Option<String>,
    },

    /// Count events, field changes and comments
    Summary {
        /// HTML file, or `-` for stdin
        input: PathBuf,

        /// Ticket number or label
        #[arg(long, short = 't')]
        ticket: Option<String>,
    },

    /// Render a history saved with `--format json` as Markdown
    Render {
        /// JSON file, or `-` for stdin
        input: PathBuf,

        /// Ticket number or label used in the title
        #[arg(long, short = 't')]
        ticket: Option<String>,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the requested format.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::History {
            input,
            ticket,
            source_url,
        } => commands::history(&input, ticket, source_url, config, cli.format),
        Commands::Ticket { input, ticket } => {
            commands::ticket(&input, ticket, config, cli.format)
        }
        Commands::Summary { input, ticket } => {
            commands::summary(&input, ticket, config, cli.format)
        }
        Commands::Render { input, ticket } => commands::render(&input, ticket),
    }
}
