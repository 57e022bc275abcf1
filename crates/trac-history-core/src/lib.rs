//! trac-history-core: Records recovered from Trac ticket pages.
//!
//! This crate provides:
//! - `ChangeEvent` / `FieldChange`: One change-history entry and its field mutations
//! - `Ticket`: Page-level metadata, attachments and history
//! - Markdown rendering and history summaries

pub mod error;
pub mod event;
pub mod render;
pub mod summary;
pub mod ticket;

pub use error::{CoreError, Result};
pub use event::{ChangeEvent, FieldAction, FieldChange, history_from_json, history_to_json};
pub use render::{RenderContext, render_markdown};
pub use summary::HistorySummary;
pub use ticket::{Attachment, Ticket};
