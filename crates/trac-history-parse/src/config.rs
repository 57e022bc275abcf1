//! Parser configuration: selector-fallback hints.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::dom::DomNode;
use crate::error::{ParseError, Result};

/// Hints steering the block locator and header interpreter.
///
/// Usually read from `.trac-history.yml`; every field has a default that
/// matches stock Trac markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Ids of the changelog container, tried in order.
    #[serde(default = "default_root_ids")]
    pub root_ids: Vec<String>,

    /// Id prefix carried by true change blocks.
    #[serde(default = "default_change_id_prefix")]
    pub change_id_prefix: String,

    /// Tags that may form a change block.
    #[serde(default = "default_block_tags")]
    pub block_tags: Vec<String>,

    /// Class token marking change blocks and their headings.
    #[serde(default = "default_change_class")]
    pub change_class: String,

    /// Tags rendered as change headings.
    #[serde(default = "default_heading_tags")]
    pub heading_tags: Vec<String>,

    /// Heading vocabulary for the last-resort locator tier.
    #[serde(default = "default_heading_keywords")]
    pub heading_keywords: Vec<String>,

    /// Extra block matchers for unusual layouts, tried after the built-in
    /// structural tiers.
    #[serde(default)]
    pub extra_blocks: Vec<BlockHint>,
}

fn default_root_ids() -> Vec<String> {
    vec!["changelog".to_string()]
}

fn default_change_id_prefix() -> String {
    "trac-change".to_string()
}

fn default_block_tags() -> Vec<String> {
    vec!["div".to_string(), "li".to_string()]
}

fn default_change_class() -> String {
    "change".to_string()
}

fn default_heading_tags() -> Vec<String> {
    vec!["h3".to_string()]
}

fn default_heading_keywords() -> Vec<String> {
    vec!["Changed".to_string(), "comment".to_string()]
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            root_ids: default_root_ids(),
            change_id_prefix: default_change_id_prefix(),
            block_tags: default_block_tags(),
            change_class: default_change_class(),
            heading_tags: default_heading_tags(),
            heading_keywords: default_heading_keywords(),
            extra_blocks: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Load and validate a YAML config file.
    ///
    /// # Errors
    /// Returns error if the file is missing, malformed or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ParseError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path.display(), "Loaded parser config");
        Ok(config)
    }

    /// Parse and validate a YAML config document.
    ///
    /// # Errors
    /// Returns error if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which no block could ever be found.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.change_id_prefix.trim().is_empty() {
            return Err(ParseError::InvalidConfig(
                "change_id_prefix must not be empty".to_string(),
            ));
        }
        if self.change_class.trim().is_empty() {
            return Err(ParseError::InvalidConfig(
                "change_class must not be empty".to_string(),
            ));
        }
        if self.block_tags.is_empty() {
            return Err(ParseError::InvalidConfig(
                "block_tags must name at least one tag".to_string(),
            ));
        }
        if self.heading_tags.is_empty() {
            return Err(ParseError::InvalidConfig(
                "heading_tags must name at least one tag".to_string(),
            ));
        }
        if self.heading_keywords.is_empty() {
            return Err(ParseError::InvalidConfig(
                "heading_keywords must name at least one keyword".to_string(),
            ));
        }
        if self.heading_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ParseError::InvalidConfig(
                "heading_keywords must not contain blank entries".to_string(),
            ));
        }
        if let Some(idx) = self.extra_blocks.iter().position(BlockHint::is_unconstrained) {
            return Err(ParseError::InvalidConfig(format!(
                "extra_blocks[{idx}] needs at least one of tag, class, id_prefix"
            )));
        }
        Ok(())
    }

    pub(crate) fn is_block_tag(&self, tag: &str) -> bool {
        self.block_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn is_heading_tag(&self, tag: &str) -> bool {
        self.heading_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A declarative block matcher; every given constraint must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockHint {
    #[serde(default)]
    pub tag: Option<String>,

    /// Class token the element must carry.
    #[serde(default)]
    pub class: Option<String>,

    /// Prefix the element's id must start with.
    #[serde(default)]
    pub id_prefix: Option<String>,
}

impl BlockHint {
    fn is_unconstrained(&self) -> bool {
        self.tag.is_none() && self.class.is_none() && self.id_prefix.is_none()
    }

    pub(crate) fn matches<'a, N: DomNode<'a>>(&self, node: &N) -> bool {
        self.tag
            .as_deref()
            .is_none_or(|t| node.tag().eq_ignore_ascii_case(t))
            && self.class.as_deref().is_none_or(|c| node.has_class(c))
            && self
                .id_prefix
                .as_deref()
                .is_none_or(|p| node.attr("id").is_some_and(|id| id.starts_with(p)))
    }
}
