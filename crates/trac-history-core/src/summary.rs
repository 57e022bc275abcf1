//! Aggregate counts over a parsed change history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::event::ChangeEvent;

/// Totals describing one ticket's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub events: usize,
    pub field_changes: usize,
    pub events_with_comment: usize,
    /// Distinct field names, sorted.
    pub fields_changed: BTreeSet<String>,
    /// Earliest timestamp that could be interpreted as a date-time.
    pub first_seen: Option<DateTime<Utc>>,
    /// Latest timestamp that could be interpreted as a date-time.
    pub last_seen: Option<DateTime<Utc>>,
}

impl HistorySummary {
    #[must_use]
    pub fn from_events(events: &[ChangeEvent]) -> Self {
        let times: Vec<DateTime<Utc>> =
            events.iter().filter_map(ChangeEvent::parsed_timestamp).collect();

        Self {
            events: events.len(),
            field_changes: events.iter().map(|e| e.field_changes.len()).sum(),
            events_with_comment: events.iter().filter(|e| e.has_comment()).count(),
            fields_changed: events
                .iter()
                .flat_map(|e| &e.field_changes)
                .map(|fc| fc.field_name.clone())
                .collect(),
            first_seen: times.iter().min().copied(),
            last_seen: times.iter().max().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FieldChange;

    #[test]
    fn test_summary_counts() {
        let events = vec![
            ChangeEvent {
                timestamp: Some("2024-01-15T10:00:00Z".to_string()),
                field_changes: vec![
                    FieldChange::set("Status", "new"),
                    FieldChange::set("Component", "avcodec"),
                ],
                ..ChangeEvent::default()
            },
            ChangeEvent {
                timestamp: Some("yesterday".to_string()),
                comment_text: "ping".to_string(),
                ..ChangeEvent::default()
            },
            ChangeEvent {
                timestamp: Some("2023-12-01 08:00:00".to_string()),
                field_changes: vec![FieldChange::changed("Status", "new", "closed")],
                comment_text: "fixed".to_string(),
                ..ChangeEvent::default()
            },
        ];

        let summary = HistorySummary::from_events(&events);

        assert_eq!(summary.events, 3);
        assert_eq!(summary.field_changes, 3);
        assert_eq!(summary.events_with_comment, 2);
        assert_eq!(
            summary.fields_changed.iter().collect::<Vec<_>>(),
            vec!["Component", "Status"]
        );
        assert_eq!(
            summary.first_seen.map(|t| t.to_rfc3339()),
            Some("2023-12-01T08:00:00+00:00".to_string())
        );
        assert_eq!(
            summary.last_seen.map(|t| t.to_rfc3339()),
            Some("2024-01-15T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(HistorySummary::from_events(&[]), HistorySummary::default());
    }
}
