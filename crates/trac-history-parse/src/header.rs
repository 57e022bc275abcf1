//! Header interpreter: comment number, timestamp and author of one change block.
//!
//! Trac has rendered the same heading in several shapes over the years:
//!
//! - 0.11: `<h3 id="comment:3" class="change">Changed <a title="2008-01-15T10:00:00+0000 in Timeline">…</a> by alice</h3>`
//! - 0.12 / 1.0: `<span class="cnum"><a href="#comment:3">comment:3</a></span>` plus
//!   `<span class="trac-author">alice</span>`
//! - plain text: `comment:3 Changed 2024-01-15T10:00:00Z by alice`
//!
//! Each field is resolved independently through a ranked list of sources;
//! a field no source can provide stays `None`.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::config::ParserConfig;
use crate::dom::DomNode;

static RE_COMMENT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"comment:(\d+)").expect("invalid regex: comment number"));

static RE_TITLE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("invalid regex: title date"));

static RE_ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2})?(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("invalid regex: iso datetime")
});

static RE_BY_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bby\s+(\S+)").expect("invalid regex: by author"));

/// Header fields of one change block; each may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeHeader {
    pub comment_number: Option<u32>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
}

/// The heading element of a block: one carrying the change class, else the
/// first heading tag.
pub fn find_heading<'a, N: DomNode<'a>>(block: N, config: &ParserConfig) -> Option<N> {
    block
        .find(|e| config.is_heading_tag(e.tag()) && e.has_class(&config.change_class))
        .or_else(|| block.find(|e| config.is_heading_tag(e.tag())))
}

/// Extract the header triple from a heading element.
pub fn parse_header<'a, N: DomNode<'a>>(heading: N) -> ChangeHeader {
    let text = heading.joined_text(" ");

    let header = ChangeHeader {
        comment_number: comment_number(heading, &text),
        timestamp: timestamp(heading, &text),
        author: author(heading, &text),
    };
    trace!(?header, heading = %text, "Parsed change header");
    header
}

fn comment_number<'a, N: DomNode<'a>>(heading: N, text: &str) -> Option<u32> {
    heading
        .find(|e| e.is("span") && e.has_class("cnum"))
        .and_then(|span| number_in(&span.joined_text("")))
        .or_else(|| {
            heading
                .find_all(|e| e.is("a"))
                .into_iter()
                .filter_map(|a| a.attr("href"))
                .filter(|href| href.contains("#comment:"))
                .find_map(number_in)
        })
        .or_else(|| heading.attr("id").and_then(number_in))
        .or_else(|| number_in(text))
}

fn number_in(source: &str) -> Option<u32> {
    RE_COMMENT_NUMBER
        .captures(source)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|n| *n > 0)
}

fn timestamp<'a, N: DomNode<'a>>(heading: N, text: &str) -> Option<String> {
    let titled = heading
        .find_all(|e| e.is("a"))
        .into_iter()
        .filter_map(|a| a.attr("title"))
        .find(|title| RE_TITLE_DATE.is_match(title))
        .map(|title| {
            RE_ISO_DATETIME
                .find(title)
                .map_or_else(|| title.trim().to_string(), |m| m.as_str().to_string())
        });

    titled
        .or_else(|| RE_ISO_DATETIME.find(text).map(|m| m.as_str().to_string()))
        .or_else(|| timeline_href(heading))
}

/// The `from=` parameter of a timeline link, as rendered by newer Trac
/// when the title holds a localized date.
fn timeline_href<'a, N: DomNode<'a>>(heading: N) -> Option<String> {
    heading
        .find_all(|e| e.is("a"))
        .into_iter()
        .filter_map(|a| a.attr("href"))
        .filter_map(|href| href.split_once('?').map(|(_, query)| query))
        .find_map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "from")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| RE_ISO_DATETIME.is_match(value))
}

fn author<'a, N: DomNode<'a>>(heading: N, text: &str) -> Option<String> {
    heading
        .find(|e| e.is("span") && e.classes().any(|c| c.starts_with("trac-author")))
        .map(|span| span.normalized_text())
        .filter(|name| !name.is_empty())
        .or_else(|| RE_BY_AUTHOR.captures(text).map(|caps| caps[1].to_string()))
}
