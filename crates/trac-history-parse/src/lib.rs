//! Change-history parsing engine for rendered Trac ticket pages.
//!
//! Parsing runs in four stages:
//! - `locate`: Split the changelog into change blocks, with tiered fallbacks
//! - `header`: Comment number, timestamp and author from a block's heading
//! - `fields` / `comment`: Field changes and comment text from a block's body
//! - `parser`: Drop empty blocks and expose the public entry points
//!
//! Missing markup never fails a parse; it yields fewer or emptier events.

pub mod comment;
pub mod config;
pub mod dom;
pub mod error;
pub mod fields;
pub mod header;
pub mod locate;
pub mod parser;
pub mod ticket;

pub use config::{BlockHint, ParserConfig};
pub use dom::{Child, DomNode};
pub use error::{ParseError, Result};
pub use header::ChangeHeader;
pub use locate::{Located, LocatorTier};
pub use parser::{ChangelogParser, assemble, parse, parse_bytes, parse_ticket};
pub use ticket::parse_ticket_metadata;
