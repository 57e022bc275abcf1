//! Block locator: split the changelog into change blocks.

use tracing::debug;

use crate::config::ParserConfig;
use crate::dom::DomNode;

/// Which strategy produced the blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorTier {
    /// Change-class element with a `trac-change…` id.
    ChangeId,
    /// Change-class element without an id (Trac 0.11).
    Legacy,
    /// A configured [`crate::BlockHint`].
    Hint,
    /// Parent of a heading using change vocabulary.
    Heading,
}

/// Blocks found in a document plus the tier that found them.
#[derive(Debug, Clone)]
pub struct Located<N> {
    pub tier: Option<LocatorTier>,
    pub blocks: Vec<N>,
}

/// The changelog container: the first configured root id present, else the
/// document itself.
pub fn find_root<'a, N: DomNode<'a>>(document: N, config: &ParserConfig) -> N {
    config
        .root_ids
        .iter()
        .find_map(|id| document.find(|e| e.attr("id") == Some(id.as_str())))
        .unwrap_or(document)
}

/// Locate change blocks, trying each tier until one yields results.
///
/// No blocks at any tier means the ticket has no history yet.
pub fn locate<'a, N: DomNode<'a>>(document: N, config: &ParserConfig) -> Located<N> {
    let root = find_root(document, config);

    let strategies: [(LocatorTier, &dyn Fn(N) -> Vec<N>); 4] = [
        (LocatorTier::ChangeId, &|r: N| by_change_id(r, config)),
        (LocatorTier::Legacy, &|r: N| by_change_class(r, config)),
        (LocatorTier::Hint, &|r: N| by_hints(r, config)),
        (LocatorTier::Heading, &|r: N| by_heading(r, config)),
    ];

    for (tier, strategy) in strategies {
        let blocks = strategy(root);
        if !blocks.is_empty() {
            debug!(?tier, count = blocks.len(), "Located change blocks");
            return Located {
                tier: Some(tier),
                blocks,
            };
        }
    }

    debug!("No change blocks found");
    Located {
        tier: None,
        blocks: Vec::new(),
    }
}

fn is_change_block<'a, N: DomNode<'a>>(e: &N, config: &ParserConfig) -> bool {
    config.is_block_tag(e.tag()) && e.has_class(&config.change_class)
}

// Blocks nested inside an accepted block belong to it; the outer block's
// body interpreters already see their markup.
fn by_change_id<'a, N: DomNode<'a>>(root: N, config: &ParserConfig) -> Vec<N> {
    root.find_outermost(|e| {
        is_change_block(e, config)
            && e
                .attr("id")
                .is_some_and(|id| id.starts_with(&config.change_id_prefix))
    })
}

fn by_change_class<'a, N: DomNode<'a>>(root: N, config: &ParserConfig) -> Vec<N> {
    root.find_outermost(|e| is_change_block(e, config))
}

fn by_hints<'a, N: DomNode<'a>>(root: N, config: &ParserConfig) -> Vec<N> {
    config
        .extra_blocks
        .iter()
        .map(|hint| root.find_outermost(|e| hint.matches(e)))
        .find(|blocks| !blocks.is_empty())
        .unwrap_or_default()
}

fn by_heading<'a, N: DomNode<'a>>(root: N, config: &ParserConfig) -> Vec<N> {
    let mut parents: Vec<N> = Vec::new();

    for heading in root.find_all(|e| config.is_heading_tag(e.tag())) {
        let text = heading.joined_text(" ");
        if !config.heading_keywords.iter().any(|k| text.contains(k.as_str())) {
            continue;
        }
        let Some(parent) = heading.parent_element() else {
            continue;
        };
        // Several headings may share one container; keep it once.
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }
    parents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockHint;
    use scraper::{ElementRef, Html};

    fn ids(located: &Located<ElementRef<'_>>) -> Vec<String> {
        located
            .blocks
            .iter()
            .map(|b| b.attr("id").unwrap_or("-").to_string())
            .collect()
    }

    #[test]
    fn test_change_id_tier_wins() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <div class="change" id="trac-change-1"><h3 class="change">comment:1</h3></div>
                <div class="change" id="decorative"></div>
                <li class="change" id="trac-change-2"></li>
            </div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(located.tier, Some(LocatorTier::ChangeId));
        assert_eq!(ids(&located), vec!["trac-change-1", "trac-change-2"]);
    }

    #[test]
    fn test_legacy_tier() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <div class="change"><h3 class="change">Changed by a</h3></div>
                <div class="change"><h3 class="change">Changed by b</h3></div>
            </div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(located.tier, Some(LocatorTier::Legacy));
        assert_eq!(located.blocks.len(), 2);
    }

    #[test]
    fn test_nested_change_block_is_not_split() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <div class="change" id="outer">
                  <h3 class="change">Changed by a</h3>
                  <div class="change" id="inner">
                    <ul class="changes"><li><strong>X</strong> set to <em>1</em></li></ul>
                  </div>
                </div>
                <div class="change" id="next"></div>
            </div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(located.tier, Some(LocatorTier::Legacy));
        assert_eq!(ids(&located), vec!["outer", "next"]);
    }

    #[test]
    fn test_nested_change_id_block_is_not_split() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <div class="change" id="trac-change-1">
                  <div class="change" id="trac-change-1-inner"></div>
                </div>
                <div class="change" id="trac-change-2"></div>
            </div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(ids(&located), vec!["trac-change-1", "trac-change-2"]);
    }

    #[test]
    fn test_heading_tier_uses_parent() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <section id="s1"><h3>Changed 3 days ago by a</h3><p>x</p></section>
                <section id="s2"><h3>Modified by b</h3></section>
                <section id="s3"><h3>comment:4</h3></section>
            </div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(located.tier, Some(LocatorTier::Heading));
        assert_eq!(ids(&located), vec!["s1", "s3"]);
        assert!(located.blocks.iter().all(|b| b.is("section")));
    }

    #[test]
    fn test_hint_tier_before_heading() {
        let doc = Html::parse_document(
            r#"<div id="changelog">
                <article class="entry" id="e1"><h3>Changed by a</h3></article>
            </div>"#,
        );
        let config = ParserConfig {
            extra_blocks: vec![BlockHint {
                tag: Some("article".to_string()),
                class: Some("entry".to_string()),
                id_prefix: None,
            }],
            ..ParserConfig::default()
        };
        let located = locate(doc.root_element(), &config);

        assert_eq!(located.tier, Some(LocatorTier::Hint));
        assert_eq!(ids(&located), vec!["e1"]);
    }

    #[test]
    fn test_root_fallback_is_whole_document() {
        let doc = Html::parse_document(
            r#"<body><div class="change" id="trac-change-9"></div></body>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(ids(&located), vec!["trac-change-9"]);
    }

    #[test]
    fn test_root_limits_search() {
        let doc = Html::parse_document(
            r#"<div class="change" id="trac-change-outside"></div>
               <div id="changelog"><div class="change" id="trac-change-inside"></div></div>"#,
        );
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(ids(&located), vec!["trac-change-inside"]);
    }

    #[test]
    fn test_nothing_found() {
        let doc = Html::parse_document("<p>No history here.</p>");
        let located = locate(doc.root_element(), &ParserConfig::default());

        assert_eq!(located.tier, None);
        assert!(located.blocks.is_empty());
    }
}
