//! Ticket page model: metadata, attachments and change history.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::ChangeEvent;

/// Path segment of an attachment's preview page.
const ATTACHMENT_SEGMENT: &str = "/attachment/";
/// Path segment serving the attachment's raw bytes.
const RAW_ATTACHMENT_SEGMENT: &str = "/raw-attachment/";

/// A file attached to a ticket, as listed on the ticket page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown in the attachment list.
    pub filename: String,

    /// Link target of the attachment's preview page.
    pub href: String,
}

impl Attachment {
    #[must_use]
    pub fn new(filename: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            href: href.into(),
        }
    }

    /// Link serving the raw file.
    ///
    /// Preview links under `/attachment/` map to `/raw-attachment/`; any other
    /// link gets `format=raw` appended.
    #[must_use]
    pub fn raw_href(&self) -> String {
        if self.href.contains(RAW_ATTACHMENT_SEGMENT) {
            return self.href.clone();
        }
        if self.href.contains(ATTACHMENT_SEGMENT) {
            return self
                .href
                .replacen(ATTACHMENT_SEGMENT, RAW_ATTACHMENT_SEGMENT, 1);
        }
        let sep = if self.href.contains('?') { '&' } else { '?' };
        format!("{}{sep}format=raw", self.href)
    }
}

/// Everything extracted from one rendered ticket page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Caller-supplied label (ticket number or URL); never parsed from the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Ticket title.
    pub summary: Option<String>,

    /// Property table, keyed by lower-cased label.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Ticket description text; empty when absent.
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Trac version advertised in the page footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trac_version: Option<String>,

    /// Change history in document order.
    #[serde(default)]
    pub history: Vec<ChangeEvent>,
}

impl Ticket {
    /// Attach the caller's label.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Look up a property by label, ignoring case.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_href_from_preview_link() {
        let att = Attachment::new("crash.log", "/attachment/ticket/1234/crash.log");
        assert_eq!(att.raw_href(), "/raw-attachment/ticket/1234/crash.log");
    }

    #[test]
    fn test_raw_href_passthrough_and_query() {
        let raw = Attachment::new("a.patch", "/raw-attachment/ticket/1/a.patch");
        assert_eq!(raw.raw_href(), "/raw-attachment/ticket/1/a.patch");

        let other = Attachment::new("b.txt", "/files/b.txt?rev=2");
        assert_eq!(other.raw_href(), "/files/b.txt?rev=2&format=raw");
    }

    #[test]
    fn test_field_lookup_case_insensitive() {
        let mut ticket = Ticket::default().with_reference("1234");
        ticket.fields.insert("component".to_string(), "avcodec".to_string());

        assert_eq!(ticket.field("Component"), Some("avcodec"));
        assert_eq!(ticket.field("owner"), None);
        assert_eq!(ticket.reference.as_deref(), Some("1234"));
    }
}
