//! Human-readable Markdown rendering of a change history.
//!
//! The output is lossy: paragraph boundaries in comments become blockquote
//! lines and header fields fall back to placeholder text. Use the JSON
//! record format when the history must be read back.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::event::{ChangeEvent, FieldAction, FieldChange};

/// Document-level details printed above the event list.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Ticket label used in the title.
    pub reference: Option<String>,

    /// Where the page came from, if known.
    pub source_url: Option<String>,

    /// Time stamped into the "Exported" line.
    pub exported_at: DateTime<Utc>,
}

impl RenderContext {
    /// Context stamped with the current time.
    #[must_use]
    pub fn new(reference: Option<String>) -> Self {
        Self {
            reference,
            source_url: None,
            exported_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn with_exported_at(mut self, at: DateTime<Utc>) -> Self {
        self.exported_at = at;
        self
    }
}

/// Render a change history as Markdown.
#[must_use]
pub fn render_markdown(ctx: &RenderContext, events: &[ChangeEvent]) -> String {
    let mut out = String::new();

    match &ctx.reference {
        Some(reference) => {
            writeln!(out, "# Change History — Ticket #{reference}").unwrap();
        }
        None => writeln!(out, "# Change History").unwrap(),
    }
    writeln!(out).unwrap();

    if let Some(url) = &ctx.source_url {
        writeln!(out, "**Source:** {url}  ").unwrap();
    }
    writeln!(
        out,
        "**Exported:** {}  ",
        ctx.exported_at.format("%Y-%m-%d %H:%M UTC")
    )
    .unwrap();
    writeln!(out, "**Total change events:** {}", events.len()).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "---").unwrap();
    writeln!(out).unwrap();

    for event in events {
        render_event(&mut out, event);
    }

    out
}

fn render_event(out: &mut String, event: &ChangeEvent) {
    let ts = event.timestamp.as_deref().unwrap_or("unknown time");
    let author = event.author.as_deref().unwrap_or("unknown");

    writeln!(out, "## [{}] — {ts} by **{author}**", event.label()).unwrap();
    writeln!(out).unwrap();

    if !event.field_changes.is_empty() {
        writeln!(out, "**Field changes:**").unwrap();
        writeln!(out).unwrap();
        for change in &event.field_changes {
            writeln!(out, "- {}", markdown_bullet(change)).unwrap();
        }
        writeln!(out).unwrap();
    }

    if event.has_comment() {
        writeln!(out, "**Comment:**").unwrap();
        writeln!(out).unwrap();
        for line in event.comment_text.split('\n') {
            if line.is_empty() {
                writeln!(out, ">").unwrap();
            } else {
                writeln!(out, "> {line}").unwrap();
            }
        }
        writeln!(out).unwrap();
    }

    writeln!(out, "---").unwrap();
    writeln!(out).unwrap();
}

fn markdown_bullet(change: &FieldChange) -> String {
    let field = &change.field_name;
    let old = change.old_value.as_deref();
    let new = change.new_value.as_deref();

    match (change.action, old, new) {
        (Some(FieldAction::Changed), Some(old), Some(new)) => {
            format!("**{field}**: `{old}` → `{new}`")
        }
        (Some(FieldAction::Set), _, Some(new)) => format!("**{field}**: set to `{new}`"),
        (Some(FieldAction::Deleted), Some(old), _) => {
            format!("**{field}**: deleted (was `{old}`)")
        }
        (Some(FieldAction::Deleted), None, _) => format!("**{field}**: deleted"),
        (action, old, new) => {
            let parts: Vec<String> = old
                .map(|o| format!("was `{o}`"))
                .into_iter()
                .chain(new.map(|n| format!("now `{n}`")))
                .collect();
            if parts.is_empty() {
                let verb = action.map_or_else(|| "updated".to_string(), |a| a.to_string());
                format!("**{field}**: {verb}")
            } else {
                format!("**{field}**: {}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixed_ctx() -> RenderContext {
        let at = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        RenderContext::new(Some("1234".to_string()))
            .with_source_url("https://trac.example.org/ticket/1234")
            .with_exported_at(at)
    }

    #[test]
    fn test_render_full_document() {
        let events = vec![
            ChangeEvent {
                comment_number: Some(3),
                timestamp: Some("2024-01-15T10:00:00Z".to_string()),
                author: Some("alice".to_string()),
                field_changes: vec![
                    FieldChange::changed("Component", "libavcodec", "libavformat"),
                    FieldChange::set("Available_date", "2024-02-01"),
                ],
                comment_text: "First.\n\nSecond.".to_string(),
            },
            ChangeEvent {
                field_changes: vec![FieldChange::deleted("Keywords", Some("vp9".to_string()))],
                ..ChangeEvent::default()
            },
        ];

        let md = render_markdown(&fixed_ctx(), &events);
        let expected = [
            "# Change History — Ticket #1234",
            "",
            "**Source:** https://trac.example.org/ticket/1234  ",
            "**Exported:** 2024-03-01 12:30 UTC  ",
            "**Total change events:** 2",
            "",
            "---",
            "",
            "## [comment:3] — 2024-01-15T10:00:00Z by **alice**",
            "",
            "**Field changes:**",
            "",
            "- **Component**: `libavcodec` → `libavformat`",
            "- **Available_date**: set to `2024-02-01`",
            "",
            "**Comment:**",
            "",
            "> First.",
            ">",
            "> Second.",
            "",
            "---",
            "",
            "## [change] — unknown time by **unknown**",
            "",
            "**Field changes:**",
            "",
            "- **Keywords**: deleted (was `vp9`)",
            "",
            "---",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(md, expected);
    }

    #[test]
    fn test_generic_bullets() {
        assert_eq!(
            markdown_bullet(&FieldChange::modified("Cc", None, "bob".to_string())),
            "**Cc**: now `bob`"
        );
        assert_eq!(
            markdown_bullet(&FieldChange::new("Description")),
            "**Description**: updated"
        );
    }

    #[test]
    fn test_empty_history() {
        let md = render_markdown(&RenderContext::new(None), &[]);

        assert!(md.starts_with("# Change History\n"));
        assert!(md.contains("**Total change events:** 0"));
        assert!(!md.contains("**Source:**"));
    }
}
