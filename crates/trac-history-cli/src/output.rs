//! Output formatting for the CLI.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;
use trac_history_core::{ChangeEvent, HistorySummary, RenderContext, Ticket, render_markdown};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Markdown document
    Markdown,
}

/// Print a serializable value in a machine format.
fn print_serialized<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Print a change history.
pub fn print_history(
    ctx: &RenderContext,
    events: &[ChangeEvent],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for event in events {
                println!("{}", event.human_display());
            }
            Ok(())
        }
        OutputFormat::Markdown => {
            print!("{}", render_markdown(ctx, events));
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(events, format),
    }
}

/// Print a full ticket record.
pub fn print_ticket(ticket: &Ticket, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{}", ticket.human_display());
            Ok(())
        }
        OutputFormat::Markdown => {
            print!("{}", ticket_markdown(ticket));
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(ticket, format),
    }
}

/// Print a history summary.
pub fn print_summary(report: &SummaryReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{}", report.human_display());
            Ok(())
        }
        OutputFormat::Markdown => {
            print!("{}", summary_markdown(report));
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(report, format),
    }
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

impl HumanDisplay for ChangeEvent {
    fn human_display(&self) -> String {
        let mut out = String::new();

        let time = self.timestamp.as_deref().unwrap_or("unknown time");
        let author = self.author.as_deref().unwrap_or("unknown");
        writeln!(out, "[{}] {time} by {author}", self.label()).unwrap();

        for change in &self.field_changes {
            writeln!(out, "  * {change}").unwrap();
        }

        // Multi-line comments keep their line structure, indented.
        for line in self.comment_text.lines() {
            writeln!(out, "    {line}").unwrap();
        }

        out
    }
}

impl HumanDisplay for Ticket {
    fn human_display(&self) -> String {
        let mut out = String::new();

        if let Some(reference) = &self.reference {
            writeln!(out, "Ticket:    #{reference}").unwrap();
        }
        writeln!(
            out,
            "Summary:   {}",
            self.summary.as_deref().unwrap_or("(none)")
        )
        .unwrap();
        if let Some(version) = &self.trac_version {
            writeln!(out, "Trac:      {version}").unwrap();
        }

        if !self.fields.is_empty() {
            writeln!(out, "Fields:").unwrap();
            for (key, value) in &self.fields {
                writeln!(out, "  {key}: {value}").unwrap();
            }
        }

        if !self.attachments.is_empty() {
            writeln!(out, "Attachments:").unwrap();
            for attachment in &self.attachments {
                writeln!(out, "  {} ({})", attachment.filename, attachment.raw_href()).unwrap();
            }
        }

        if !self.description.is_empty() {
            writeln!(out, "Description:").unwrap();
            for line in self.description.lines() {
                writeln!(out, "  {line}").unwrap();
            }
        }

        writeln!(out, "History:   {} change events", self.history.len()).unwrap();
        writeln!(out, "{}", "-".repeat(60)).unwrap();
        for event in &self.history {
            writeln!(out, "{}", event.human_display()).unwrap();
        }

        out
    }
}

/// Ticket metadata followed by the rendered history.
fn ticket_markdown(ticket: &Ticket) -> String {
    let mut out = String::new();

    if let Some(summary) = &ticket.summary {
        writeln!(out, "**Summary:** {summary}  ").unwrap();
    }
    for (key, value) in &ticket.fields {
        writeln!(out, "**{key}:** {value}  ").unwrap();
    }
    for attachment in &ticket.attachments {
        writeln!(
            out,
            "- Attachment: [{}]({})",
            attachment.filename,
            attachment.raw_href()
        )
        .unwrap();
    }
    if !out.is_empty() {
        writeln!(out).unwrap();
    }

    let ctx = RenderContext::new(ticket.reference.clone());
    out.push_str(&render_markdown(&ctx, &ticket.history));
    out
}

/// Summary plus one overview row per event.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub summary: HistorySummary,
    pub events: Vec<EventRow>,
}

/// One line of the summary table.
#[derive(Debug, Serialize)]
pub struct EventRow {
    pub label: String,
    pub author: Option<String>,
    pub fields: Vec<String>,
    pub has_comment: bool,
}

impl From<&ChangeEvent> for EventRow {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            label: event.label(),
            author: event.author.clone(),
            fields: event
                .field_changes
                .iter()
                .map(|fc| fc.field_name.clone())
                .collect(),
            has_comment: event.has_comment(),
        }
    }
}

impl HumanDisplay for SummaryReport {
    fn human_display(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        if let Some(reference) = &self.reference {
            writeln!(out, "Ticket #{reference}").unwrap();
        }
        writeln!(out, "Events:          {}", s.events).unwrap();
        writeln!(out, "Field changes:   {}", s.field_changes).unwrap();
        writeln!(out, "With comment:    {}", s.events_with_comment).unwrap();
        if let (Some(first), Some(last)) = (s.first_seen, s.last_seen) {
            writeln!(
                out,
                "Span:            {} .. {}",
                first.format("%Y-%m-%d %H:%M UTC"),
                last.format("%Y-%m-%d %H:%M UTC")
            )
            .unwrap();
        }

        if self.events.is_empty() {
            return out;
        }
        writeln!(out).unwrap();

        // Column widths (with minimum for headers)
        let label_width = self
            .events
            .iter()
            .map(|r| r.label.len())
            .max()
            .unwrap_or(5)
            .max(5);
        let author_width = self
            .events
            .iter()
            .map(|r| r.author.as_ref().map_or(1, String::len))
            .max()
            .unwrap_or(6)
            .max(6);

        writeln!(
            out,
            "{:<label_width$}  {:<author_width$}  {:<7}  FIELDS",
            "EVENT", "AUTHOR", "COMMENT"
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(label_width + author_width + 24)).unwrap();

        for row in &self.events {
            let fields = if row.fields.is_empty() {
                "-".to_string()
            } else {
                row.fields.join(", ")
            };
            writeln!(
                out,
                "{:<label_width$}  {:<author_width$}  {:<7}  {fields}",
                row.label,
                row.author.as_deref().unwrap_or("-"),
                if row.has_comment { "yes" } else { "-" },
            )
            .unwrap();
        }

        out
    }
}

fn summary_markdown(report: &SummaryReport) -> String {
    let mut out = String::new();
    let s = &report.summary;

    match &report.reference {
        Some(reference) => writeln!(out, "# History Summary — Ticket #{reference}").unwrap(),
        None => writeln!(out, "# History Summary").unwrap(),
    }
    writeln!(out).unwrap();
    writeln!(out, "- Events: {}", s.events).unwrap();
    writeln!(out, "- Field changes: {}", s.field_changes).unwrap();
    writeln!(out, "- Events with comment: {}", s.events_with_comment).unwrap();
    if !s.fields_changed.is_empty() {
        let names: Vec<&str> = s.fields_changed.iter().map(String::as_str).collect();
        writeln!(out, "- Fields touched: {}", names.join(", ")).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "| Event | Author | Comment | Fields |").unwrap();
    writeln!(out, "|---|---|---|---|").unwrap();
    for row in &report.events {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            row.label,
            row.author.as_deref().unwrap_or("-"),
            if row.has_comment { "yes" } else { "-" },
            row.fields.join(", ")
        )
        .unwrap();
    }

    out
}
