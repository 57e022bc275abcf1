//! CLI command implementations.

use crate::output::{self, OutputFormat, SummaryReport};
use anyhow::{Context, Result};
use console::style;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;
use trac_history_core::{HistorySummary, RenderContext, history_from_json, render_markdown};
use trac_history_parse::{ChangelogParser, ParserConfig};

/// Config file picked up from the current directory when none is given.
const DEFAULT_CONFIG_FILE: &str = ".trac-history.yml";

/// Parse the change history of a saved ticket page.
pub fn history(
    input: &Path,
    ticket: Option<String>,
    source_url: Option<String>,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let parser = load_parser(config)?;
    let bytes = read_input(input)?;
    let events = parser
        .parse_bytes(&bytes)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    if events.is_empty() && matches!(format, OutputFormat::Human) {
        println!("{}", style("  No change history found.").dim());
        return Ok(());
    }

    let mut ctx = RenderContext::new(ticket);
    if let Some(url) = source_url {
        ctx = ctx.with_source_url(url);
    }
    output::print_history(&ctx, &events, format)
}

/// Parse metadata, attachments and history of a saved ticket page.
pub fn ticket(
    input: &Path,
    reference: Option<String>,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let parser = load_parser(config)?;
    let bytes = read_input(input)?;
    let mut ticket = parser
        .parse_ticket_bytes(&bytes)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    if let Some(reference) = reference {
        ticket = ticket.with_reference(reference);
    }
    output::print_ticket(&ticket, format)
}

/// Print event counts and a per-event overview.
pub fn summary(
    input: &Path,
    reference: Option<String>,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let parser = load_parser(config)?;
    let bytes = read_input(input)?;
    let events = parser
        .parse_bytes(&bytes)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let report = SummaryReport {
        reference,
        summary: HistorySummary::from_events(&events),
        events: events.iter().map(Into::into).collect(),
    };
    output::print_summary(&report, format)
}

/// Re-render a JSON history as Markdown.
pub fn render(input: &Path, reference: Option<String>) -> Result<()> {
    let bytes = read_input(input)?;
    let json = std::str::from_utf8(&bytes)
        .with_context(|| format!("{} is not valid UTF-8", input.display()))?;
    let events = history_from_json(json)
        .with_context(|| format!("Failed to read history from {}", input.display()))?;

    print!("{}", render_markdown(&RenderContext::new(reference), &events));
    Ok(())
}

/// Build a parser from the given config file, the default config file if
/// present, or built-in defaults.
fn load_parser(config: Option<&Path>) -> Result<ChangelogParser> {
    let config = match config {
        Some(path) => ParserConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => ParserConfig::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config {DEFAULT_CONFIG_FILE}"))?,
        None => {
            debug!("No config file, using defaults");
            ParserConfig::default()
        }
    };

    ChangelogParser::new(config).context("Invalid parser config")
}

/// Read a file, or stdin when the path is `-`.
fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        return Ok(bytes);
    }

    fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}
