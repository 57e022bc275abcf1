//! Event assembler and public entry points.

use scraper::{ElementRef, Html};
use tracing::{debug, trace};
use trac_history_core::{ChangeEvent, Ticket};

use crate::comment::parse_comment;
use crate::config::ParserConfig;
use crate::dom::DomNode;
use crate::error::Result;
use crate::fields::{find_field_list, parse_field_list};
use crate::header::{ChangeHeader, find_heading, parse_header};
use crate::locate::locate;
use crate::ticket::parse_ticket_metadata;

/// Change-history parser. Holds only configuration, so one instance can be
/// shared across threads and reused for any number of documents.
#[derive(Debug, Clone, Default)]
pub struct ChangelogParser {
    config: ParserConfig,
}

impl ChangelogParser {
    /// Build a parser from validated hints.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the hints can never match.
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the change history of one rendered ticket page.
    #[must_use]
    pub fn parse(&self, html: &str) -> Vec<ChangeEvent> {
        let document = Html::parse_document(html);
        self.events_in(document.root_element())
    }

    /// Like [`Self::parse`], for raw bytes.
    ///
    /// # Errors
    /// Returns `Encoding` if the bytes are not UTF-8.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<ChangeEvent>> {
        Ok(self.parse(std::str::from_utf8(bytes)?))
    }

    /// Parse metadata, attachments and history of one ticket page.
    #[must_use]
    pub fn parse_ticket(&self, html: &str) -> Ticket {
        let document = Html::parse_document(html);
        let mut ticket = parse_ticket_metadata(&document);
        ticket.history = self.events_in(document.root_element());
        ticket
    }

    /// Like [`Self::parse_ticket`], for raw bytes.
    ///
    /// # Errors
    /// Returns `Encoding` if the bytes are not UTF-8.
    pub fn parse_ticket_bytes(&self, bytes: &[u8]) -> Result<Ticket> {
        Ok(self.parse_ticket(std::str::from_utf8(bytes)?))
    }

    fn events_in(&self, root: ElementRef<'_>) -> Vec<ChangeEvent> {
        let located = locate(root, &self.config);
        let total = located.blocks.len();

        let events = assemble(
            located
                .blocks
                .into_iter()
                .map(|block| self.interpret_block(block)),
        );

        debug!(
            tier = ?located.tier,
            blocks = total,
            events = events.len(),
            "Parsed change history"
        );
        events
    }

    /// Run the header and body interpreters over one block.
    pub fn interpret_block<'a, N: DomNode<'a>>(&self, block: N) -> ChangeEvent {
        let header = find_heading(block, &self.config)
            .map(parse_header)
            .unwrap_or_default();
        let field_changes = find_field_list(block)
            .map(parse_field_list)
            .unwrap_or_default();

        let ChangeHeader {
            comment_number,
            timestamp,
            author,
        } = header;

        ChangeEvent {
            comment_number,
            timestamp,
            author,
            field_changes,
            comment_text: parse_comment(block),
        }
    }
}

/// Keep events with at least one field change or a comment, in order.
pub fn assemble(events: impl IntoIterator<Item = ChangeEvent>) -> Vec<ChangeEvent> {
    events
        .into_iter()
        .enumerate()
        .filter_map(|(idx, event)| {
            if event.has_content() {
                Some(event)
            } else {
                trace!(block = idx, label = %event.label(), "Dropping empty change block");
                None
            }
        })
        .collect()
}

/// Parse a ticket page's change history with the default hints.
#[must_use]
pub fn parse(html: &str) -> Vec<ChangeEvent> {
    ChangelogParser::default().parse(html)
}

/// Parse raw page bytes with the default hints.
///
/// # Errors
/// Returns `Encoding` if the bytes are not UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<ChangeEvent>> {
    ChangelogParser::default().parse_bytes(bytes)
}

/// Parse a full ticket page with the default hints.
#[must_use]
pub fn parse_ticket(html: &str) -> Ticket {
    ChangelogParser::default().parse_ticket(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use pretty_assertions::assert_eq;
    use trac_history_core::FieldChange;

    #[test]
    fn test_assemble_filters_and_keeps_order() {
        let events = vec![
            ChangeEvent {
                comment_number: Some(1),
                comment_text: "a".to_string(),
                ..ChangeEvent::default()
            },
            ChangeEvent {
                comment_number: Some(2),
                ..ChangeEvent::default()
            },
            ChangeEvent {
                comment_number: Some(3),
                field_changes: vec![FieldChange::set("Status", "new")],
                ..ChangeEvent::default()
            },
        ];

        let kept: Vec<Option<u32>> = assemble(events).iter().map(|e| e.comment_number).collect();
        assert_eq!(kept, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_block_with_only_comment() {
        let html = r#"<div id="changelog"><div class="change" id="trac-change-1">
            <div class="comment searchable"><p>Looks good to me.</p></div>
        </div></div>"#;

        assert_eq!(
            parse(html),
            vec![ChangeEvent {
                comment_text: "Looks good to me.".to_string(),
                ..ChangeEvent::default()
            }]
        );
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let result = parse_bytes(&[0x3c, 0x70, 0x3e, 0xff, 0xfe]);
        assert!(matches!(result, Err(ParseError::Encoding(_))));
    }

    #[test]
    fn test_valid_bytes_parse() {
        let events = parse_bytes(b"<html><body></body></html>").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ParserConfig {
            heading_tags: Vec::new(),
            ..ParserConfig::default()
        };
        assert!(matches!(
            ChangelogParser::new(config),
            Err(ParseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deeply_nested_markup_parses() {
        let depth = 100_000;
        let html = format!(
            r#"<div id="changelog"><div class="change" id="trac-change-1">
                <h3 class="change">comment:1 Changed by alice</h3>
                <div class="comment"><p>{}deep{}</p></div>
            </div></div>"#,
            "<span>".repeat(depth),
            "</span>".repeat(depth),
        );

        let events = parse(&html);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].comment_number, Some(1));
        assert_eq!(events[0].comment_text, "deep");
    }

    #[test]
    fn test_nested_legacy_blocks_report_changes_once() {
        let html = r#"<div id="changelog"><div class="change">
            <h3 class="change">comment:1 Changed by alice</h3>
            <div class="change"><ul class="changes">
              <li><strong>X</strong> set to <em>1</em></li>
            </ul></div>
        </div></div>"#;

        let events = parse(html);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field_changes, vec![FieldChange::set("X", "1")]);
    }

    #[test]
    fn test_parser_is_reusable_across_threads() {
        let parser = std::sync::Arc::new(ChangelogParser::default());
        let html = r#"<div class="change" id="trac-change-1"><ul class="changes">
            <li><strong>Status</strong> set to <em>new</em></li></ul></div>"#;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let parser = std::sync::Arc::clone(&parser);
                std::thread::spawn(move || parser.parse(html).len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
