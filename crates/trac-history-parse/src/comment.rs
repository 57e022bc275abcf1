//! Body interpreter, part two: the free-text comment region.

use crate::dom::{DomNode, block_text};

/// Find the comment region: a `div` carrying a `comment` class token.
///
/// Legacy markup adds further tokens (`comment searchable`), so the match is
/// on one token, not on the whole attribute.
pub fn find_comment<'a, N: DomNode<'a>>(block: N) -> Option<N> {
    block.find(|e| e.is("div") && e.has_class("comment"))
}

/// Comment text of a block, one line per paragraph; empty when the block has
/// no comment region.
pub fn parse_comment<'a, N: DomNode<'a>>(block: N) -> String {
    find_comment(block).map(block_text).unwrap_or_default()
}
