//! Parsed ruleset documents.
//!
//! A [`RulesetDocument`] is a tree of [`Node`]s where every scalar, key and
//! container carries its `[start, end)` byte range in the source text. It is
//! produced by the tree-sitter YAML grammar and can be flattened into plain
//! `serde_json` values for property lookups.

mod node;
mod parse;

use std::collections::HashMap;

use rulemap_core::ByteRange;
use serde_json::{Map, Value};
use tracing::{error, warn};

pub use node::{Entry, Node, NodeKind, ScalarValue};

use crate::error::Result;

/// Upper bound on alias expansions while flattening one node.
const MAX_ALIAS_EXPANSIONS: usize = 1024;

/// One parsed ruleset file.
#[derive(Debug, Clone, Default)]
pub struct RulesetDocument {
    root: Option<Node>,
    anchors: HashMap<String, Node>,
}

impl RulesetDocument {
    /// Parse raw markup text.
    pub fn parse(text: &str) -> Result<Self> {
        let tree = parse::parse_tree(text)?;
        Ok(Self {
            root: tree.root,
            anchors: tree.anchors,
        })
    }

    /// Parse, logging a failure and degrading to an empty document.
    pub fn parse_or_empty(text: &str) -> Self {
        match Self::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                error!(error = %e, "could not parse ruleset document");
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Top-level `section: [entries]` items, or `None` (with a warning) when
    /// the document has no top-level mapping.
    pub fn sections(&self) -> Option<&[Entry]> {
        let sections = self.root.as_ref().and_then(Node::as_mapping);
        if sections.is_none() {
            warn!("document does not have any top-level items");
        }
        sections
    }

    /// Byte range of the node declared with `&name`.
    pub fn anchor_range(&self, name: &str) -> Option<ByteRange> {
        self.anchors.get(name).and_then(|node| node.range)
    }

    /// The whole document as a plain JSON value (`Null` when empty).
    pub fn to_json(&self) -> Value {
        self.root
            .as_ref()
            .map(|root| self.flatten(root))
            .unwrap_or(Value::Null)
    }

    /// Flatten one node, resolving aliases and `<<` merge keys.
    pub fn flatten(&self, node: &Node) -> Value {
        let mut budget = MAX_ALIAS_EXPANSIONS;
        self.flatten_node(node, &mut budget)
    }

    /// Flatten a mapping node into its property map.
    pub fn flatten_properties(&self, node: &Node) -> Map<String, Value> {
        match self.flatten(node) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn flatten_node(&self, node: &Node, budget: &mut usize) -> Value {
        match &node.kind {
            NodeKind::Null => Value::Null,
            NodeKind::Scalar(value) => value.to_json(),
            NodeKind::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.flatten_node(item, budget))
                    .collect(),
            ),
            NodeKind::Mapping(entries) => {
                let mut map = Map::new();
                let mut merges = Vec::new();
                for entry in entries {
                    let value = self.flatten_node(&entry.value, budget);
                    let key = match entry.key.key_text() {
                        Some(key) => key,
                        None => self.flatten_node(&entry.key, budget).to_string(),
                    };
                    if key == "<<" {
                        merges.push(value);
                    } else {
                        map.insert(key, value);
                    }
                }
                for merged in merges {
                    merge_missing(&mut map, merged);
                }
                Value::Object(map)
            }
            NodeKind::Alias(name) => {
                if *budget == 0 {
                    warn!(alias = %name, "alias expansion limit reached");
                    return Value::Null;
                }
                *budget -= 1;
                match self.anchors.get(name) {
                    Some(target) => self.flatten_node(target, budget),
                    None => {
                        warn!(alias = %name, "alias refers to an unknown anchor");
                        Value::Null
                    }
                }
            }
        }
    }
}

/// `<<: *base` or `<<: [*a, *b]`: copy keys not already present.
fn merge_missing(map: &mut Map<String, Value>, merged: Value) {
    match merged {
        Value::Object(source) => {
            for (key, value) in source {
                map.entry(key).or_insert(value);
            }
        }
        Value::Array(sources) => {
            for source in sources {
                merge_missing(map, source);
            }
        }
        _ => {}
    }
}

/// String form of a scalar JSON value; `None` for null and containers.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
