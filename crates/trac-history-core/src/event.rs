//! Change event model recovered from a ticket's change history.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// How a field was mutated inside one change block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAction {
    /// Old value replaced by a new one.
    Changed,
    /// New value with no prior value recorded.
    Set,
    /// Value removed.
    Deleted,
    /// Unrecognized verb, but at least one value token was present.
    Modified,
}

impl fmt::Display for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => write!(f, "changed"),
            Self::Set => write!(f, "set"),
            Self::Deleted => write!(f, "deleted"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One attribute mutation recorded inside a [`ChangeEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field label as rendered (e.g. "Component").
    pub field_name: String,

    /// Classified action; `None` when the item carried no verb and no values.
    pub action: Option<FieldAction>,

    pub old_value: Option<String>,

    pub new_value: Option<String>,
}

impl FieldChange {
    /// A field change with no action and no values.
    #[must_use]
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            action: None,
            old_value: None,
            new_value: None,
        }
    }

    /// `old → new` transition.
    #[must_use]
    pub fn changed(
        field_name: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            action: Some(FieldAction::Changed),
            old_value: Some(old.into()),
            new_value: Some(new.into()),
            ..Self::new(field_name)
        }
    }

    /// First-time assignment.
    #[must_use]
    pub fn set(field_name: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            action: Some(FieldAction::Set),
            new_value: Some(new.into()),
            ..Self::new(field_name)
        }
    }

    /// Removal, optionally recording the value that was removed.
    #[must_use]
    pub fn deleted(field_name: impl Into<String>, old: Option<String>) -> Self {
        Self {
            action: Some(FieldAction::Deleted),
            old_value: old,
            ..Self::new(field_name)
        }
    }

    /// Fallback bucket for unfamiliar verbs.
    #[must_use]
    pub fn modified(field_name: impl Into<String>, old: Option<String>, new: String) -> Self {
        Self {
            action: Some(FieldAction::Modified),
            old_value: old,
            new_value: Some(new),
            ..Self::new(field_name)
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.field_name;
        let old = self.old_value.as_deref();
        let new = self.new_value.as_deref();

        match (self.action, old, new) {
            (Some(FieldAction::Changed), Some(old), Some(new)) => {
                write!(f, "{name}: {old} → {new}")
            }
            (Some(FieldAction::Set), _, Some(new)) => write!(f, "{name}: set to {new}"),
            (Some(FieldAction::Deleted), Some(old), _) => {
                write!(f, "{name}: deleted (was {old})")
            }
            (Some(FieldAction::Deleted), None, _) => write!(f, "{name}: deleted"),
            (_, None, None) => write!(f, "{name}: updated"),
            (_, old, new) => {
                let parts: Vec<String> = old
                    .map(|o| format!("was {o}"))
                    .into_iter()
                    .chain(new.map(|n| format!("now {n}")))
                    .collect();
                write!(f, "{name}: {}", parts.join(", "))
            }
        }
    }
}

/// One logical thing that happened to a ticket at one point in time.
///
/// `comment_text` is empty when no free-text comment was posted; the other
/// header fields use `None` for absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Sequence number of the associated comment, if any.
    pub comment_number: Option<u32>,

    /// Best-effort timestamp, as rendered by the source.
    pub timestamp: Option<String>,

    /// Author identity, as rendered by the source.
    pub author: Option<String>,

    /// Field mutations in document order.
    #[serde(default)]
    pub field_changes: Vec<FieldChange>,

    /// Free-text comment; paragraphs joined with `\n`.
    #[serde(default)]
    pub comment_text: String,
}

impl ChangeEvent {
    /// An event worth keeping has at least one field change or a comment.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.field_changes.is_empty() || !self.comment_text.is_empty()
    }

    /// Whether a free-text comment accompanies this event.
    #[must_use]
    pub fn has_comment(&self) -> bool {
        !self.comment_text.is_empty()
    }

    /// Label used in headings: `comment:N` or `change`.
    #[must_use]
    pub fn label(&self) -> String {
        self.comment_number
            .map_or_else(|| "change".to_string(), |n| format!("comment:{n}"))
    }

    /// Interpret the timestamp as a UTC date-time when its format allows.
    ///
    /// Accepts RFC 3339, ISO 8601 with a `+hhmm` offset and offset-less
    /// ISO 8601 (taken as UTC). Free-text timestamps yield `None`.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

/// Serialize a history as pretty-printed JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn history_to_json(events: &[ChangeEvent]) -> Result<String> {
    Ok(serde_json::to_string_pretty(events)?)
}

/// Deserialize a history previously written by [`history_to_json`].
///
/// # Errors
/// Returns error if the JSON is malformed or a record has an empty field name.
pub fn history_from_json(json: &str) -> Result<Vec<ChangeEvent>> {
    let events: Vec<ChangeEvent> = serde_json::from_str(json)?;

    if let Some(bad) = events.iter().find(|e| e.comment_number == Some(0)) {
        return Err(CoreError::Validation(format!(
            "comment numbers start at 1: {bad:?}"
        )));
    }

    if let Some(bad) = events
        .iter()
        .flat_map(|e| &e.field_changes)
        .find(|fc| fc.field_name.trim().is_empty())
    {
        return Err(CoreError::Validation(format!(
            "field change without a field name: {bad:?}"
        )));
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ChangeEvent {
        ChangeEvent {
            comment_number: Some(3),
            timestamp: Some("2024-01-15T10:00:00Z".to_string()),
            author: Some("alice".to_string()),
            field_changes: vec![
                FieldChange::changed("Component", "libavcodec", "libavformat"),
                FieldChange::set("Available_date", "2024-02-01"),
                FieldChange::new("Description"),
            ],
            comment_text: "First paragraph.\nSecond paragraph.".to_string(),
        }
    }

    #[test]
    fn test_has_content() {
        assert!(!ChangeEvent::default().has_content());

        let comment_only = ChangeEvent {
            comment_text: "Looks good to me.".to_string(),
            ..ChangeEvent::default()
        };
        assert!(comment_only.has_content());

        let fields_only = ChangeEvent {
            field_changes: vec![FieldChange::set("Status", "closed")],
            ..ChangeEvent::default()
        };
        assert!(fields_only.has_content());
        assert!(!fields_only.has_comment());
    }

    #[test]
    fn test_label() {
        assert_eq!(sample().label(), "comment:3");
        assert_eq!(ChangeEvent::default().label(), "change");
    }

    #[test]
    fn test_json_round_trip() {
        let events = vec![sample(), ChangeEvent::default()];
        let json = history_to_json(&events).unwrap();
        let back = history_from_json(&json).unwrap();

        assert_eq!(back, events);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_string(&sample()).unwrap();

        assert!(json.contains(r#""comment_number":3"#));
        assert!(json.contains(r#""field_name":"Component""#));
        assert!(json.contains(r#""action":"changed""#));
        assert!(json.contains(r#""action":null"#));
        assert!(json.contains(r#""comment_text":"First paragraph.\nSecond paragraph.""#));
    }

    #[test]
    fn test_from_json_rejects_blank_field_name() {
        let json = r#"[{"comment_number":null,"timestamp":null,"author":null,
            "field_changes":[{"field_name":" ","action":"set","old_value":null,"new_value":"x"}],
            "comment_text":""}]"#;

        assert!(matches!(
            history_from_json(json),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_comment_zero() {
        let json = r#"[{"comment_number":0,"timestamp":null,"author":null,
            "field_changes":[],"comment_text":"x"}]"#;

        assert!(matches!(
            history_from_json(json),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_field_change_display() {
        assert_eq!(
            FieldChange::changed("Component", "a", "b").to_string(),
            "Component: a → b"
        );
        assert_eq!(
            FieldChange::set("Milestone", "1.0").to_string(),
            "Milestone: set to 1.0"
        );
        assert_eq!(
            FieldChange::deleted("Keywords", Some("vp9".to_string())).to_string(),
            "Keywords: deleted (was vp9)"
        );
        assert_eq!(
            FieldChange::deleted("Keywords", None).to_string(),
            "Keywords: deleted"
        );
        assert_eq!(
            FieldChange::modified("Cc", Some("bob".to_string()), "carol".to_string()).to_string(),
            "Cc: was bob, now carol"
        );
        assert_eq!(FieldChange::new("Description").to_string(), "Description: updated");
    }

    #[test]
    fn test_parsed_timestamp_formats() {
        let with = |ts: &str| ChangeEvent {
            timestamp: Some(ts.to_string()),
            ..ChangeEvent::default()
        };
        let expected = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(with("2024-01-15T10:00:00Z").parsed_timestamp(), Some(expected));
        assert_eq!(with("2024-01-15T11:00:00+01:00").parsed_timestamp(), Some(expected));
        assert_eq!(with("2024-01-15T10:00:00+0000").parsed_timestamp(), Some(expected));
        assert_eq!(with("2024-01-15 10:00:00").parsed_timestamp(), Some(expected));
        assert_eq!(with("2024-01-15T10:00").parsed_timestamp(), Some(expected));
        assert_eq!(with("2 years ago").parsed_timestamp(), None);
        assert_eq!(ChangeEvent::default().parsed_timestamp(), None);
    }
}
