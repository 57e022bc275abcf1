//! Body interpreter, part one: the `<ul class="changes">` field-change list.

use tracing::trace;
use trac_history_core::FieldChange;

use crate::dom::DomNode;

/// Find the field-change list of a block.
pub fn find_field_list<'a, N: DomNode<'a>>(block: N) -> Option<N> {
    block.find(|e| e.is("ul") && e.has_class("changes"))
}

/// Parse every direct `<li>` of a field-change list, in markup order.
///
/// Items without a bold field-name marker are dropped; they carry nothing
/// that could be attributed to a field.
pub fn parse_field_list<'a, N: DomNode<'a>>(list: N) -> Vec<FieldChange> {
    list.children()
        .into_iter()
        .filter(|e| e.is("li"))
        .filter_map(parse_item)
        .collect()
}

fn parse_item<'a, N: DomNode<'a>>(item: N) -> Option<FieldChange> {
    let Some(name) = item
        .find(|e| e.is("strong") || e.is("b"))
        .map(|marker| marker.normalized_text())
        .filter(|name| !name.is_empty())
    else {
        trace!(item = %item.normalized_text(), "Skipping field change without a field name");
        return None;
    };

    let values: Vec<String> = item
        .find_all(|e| e.is("em"))
        .iter()
        .map(|e| e.normalized_text())
        .collect();

    Some(classify(name, &item.normalized_text(), values))
}

/// Decide the action from the item's verb phrase and its value tokens.
///
/// Checked in order: "changed from" with two values, "set to" with one,
/// "deleted", then any value at all. An item matching none keeps its name
/// with no action.
fn classify(name: String, text: &str, mut values: Vec<String>) -> FieldChange {
    if text.contains("changed from") && values.len() >= 2 {
        let new = values.swap_remove(1);
        let old = values.swap_remove(0);
        return FieldChange::changed(name, old, new);
    }
    if text.contains("set to") && !values.is_empty() {
        return FieldChange::set(name, values.swap_remove(0));
    }
    if text.contains("deleted") {
        return FieldChange::deleted(name, values.into_iter().next());
    }
    match values.pop() {
        None => FieldChange::new(name),
        Some(new) => FieldChange::modified(name, values.into_iter().next(), new),
    }
}
