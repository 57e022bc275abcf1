//! Ticket page metadata: summary, property table, description, attachments.
//!
//! Each item is looked up through a ranked selector list; the first selector
//! producing a non-empty result wins.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use trac_history_core::{Attachment, Ticket};

use crate::dom::{DomNode, block_text, normalize_ws};

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).expect("invalid selector: ticket metadata"))
        .collect()
}

static SUMMARY: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        "#ticket h1.summary",
        "h1.summary",
        "#ticket .summary",
        "#content h1",
        "h1",
    ])
});

static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        "#ticket .description .searchable",
        ".description .searchable",
        "#ticket .description",
        ".description",
    ])
});

static PROPERTY_ROWS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        "#ticket table.properties tr",
        "#properties table.properties tr",
        "#properties table tr",
        "#properties tr",
    ])
});

static ATTACHMENT_LINKS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&["#attachments dt a", "dl#attachments dt a", "#attachments a"])
});

static FOOTER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#footer").expect("invalid selector: footer"));

static SELECTED_OPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("select option[selected]").expect("invalid selector: selected option")
});

static ANY_OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select option").expect("invalid selector: option"));

static TEXT_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[type='text']").expect("invalid selector: input"));

static TEXTAREA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("textarea").expect("invalid selector: textarea"));

static RE_TRAC_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Trac\s+([\d.]+)").expect("invalid regex: trac version"));

/// Ticket-box cells consulted when the property table comes up short.
static FIELD_CELLS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    [
        "reporter",
        "owner",
        "status",
        "priority",
        "component",
        "version",
        "milestone",
        "keywords",
        "cc",
    ]
    .into_iter()
    .map(|name| {
        let css = format!("#ticket .trac-field-{name}");
        let selector = Selector::parse(&css).expect("invalid selector: ticket field");
        (selector, name)
    })
    .collect()
});

/// Below this many table fields the ticket-box cells are consulted too.
const MIN_TABLE_FIELDS: usize = 5;

/// Extract everything but the change history from a ticket page.
#[must_use]
pub fn parse_ticket_metadata(document: &Html) -> Ticket {
    let ticket = Ticket {
        summary: first_match(document, &SUMMARY, |e| e.normalized_text()),
        fields: properties(document),
        description: first_match(document, &DESCRIPTION, block_text).unwrap_or_default(),
        attachments: attachments(document),
        trac_version: trac_version(document),
        ..Ticket::default()
    };
    debug!(
        fields = ticket.fields.len(),
        attachments = ticket.attachments.len(),
        "Parsed ticket metadata"
    );
    ticket
}

fn first_match<'a>(
    document: &'a Html,
    selectors: &[Selector],
    render: impl Fn(ElementRef<'a>) -> String,
) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .map(&render)
            .find(|text| !text.is_empty())
    })
}

fn properties(document: &Html) -> BTreeMap<String, String> {
    let rows: Vec<ElementRef<'_>> = PROPERTY_ROWS
        .iter()
        .map(|selector| document.select(selector).collect::<Vec<_>>())
        .find(|rows| !rows.is_empty())
        .unwrap_or_default();

    let mut fields: BTreeMap<String, String> = rows.into_iter().flat_map(row_fields).collect();

    if fields.len() < MIN_TABLE_FIELDS {
        for (selector, name) in FIELD_CELLS.iter() {
            if fields.contains_key(*name) {
                continue;
            }
            if let Some(value) = document
                .select(selector)
                .map(|e| e.normalized_text())
                .find(|v| !v.is_empty())
            {
                fields.insert((*name).to_string(), value);
            }
        }
    }
    fields
}

/// `th`/`td` pairs of one table row.
fn row_fields(row: ElementRef<'_>) -> Vec<(String, String)> {
    let cells = row.children();
    cells
        .windows(2)
        .filter(|pair| pair[0].is("th") && pair[1].is("td"))
        .filter_map(|pair| {
            let label = pair[0].normalized_text();
            let label = label.trim_end_matches(':').trim().to_lowercase();
            let value = cell_value(pair[1])?;
            (!label.is_empty()).then_some((label, value))
        })
        .collect()
}

/// Displayed value of a cell, reading through form controls.
fn cell_value(cell: ElementRef<'_>) -> Option<String> {
    let value = if cell.select(&ANY_OPTION).next().is_some() {
        cell.select(&SELECTED_OPTION)
            .next()
            .or_else(|| cell.select(&ANY_OPTION).next())
            .map(|o| o.normalized_text())
    } else if let Some(input) = cell.select(&TEXT_INPUT).next() {
        input.attr("value").map(normalize_ws)
    } else if let Some(area) = cell.select(&TEXTAREA).next() {
        Some(area.joined_text("\n"))
    } else {
        Some(cell.normalized_text())
    };
    value.filter(|v| !v.is_empty())
}

fn attachments(document: &Html) -> Vec<Attachment> {
    let mut found: Vec<Attachment> = Vec::new();

    for selector in ATTACHMENT_LINKS.iter() {
        for link in document.select(selector) {
            if link.has_class("trac-rawlink") {
                continue;
            }
            let filename = link.normalized_text().trim_matches('\u{200b}').trim().to_string();
            // Author and timeline links share the list entries.
            let Some(href) = link.attr("href").filter(|h| h.contains("attachment")) else {
                continue;
            };
            if filename.is_empty() || found.iter().any(|a| a.href == href) {
                continue;
            }
            found.push(Attachment::new(filename, href));
        }
        if !found.is_empty() {
            break;
        }
    }
    found
}

fn trac_version(document: &Html) -> Option<String> {
    let footer = document.select(&FOOTER).next()?.normalized_text();
    RE_TRAC_VERSION
        .captures(&footer)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .filter(|v| !v.is_empty())
}
