//! tree-sitter-yaml adapter: turns a concrete syntax tree into [`Node`]s.

use std::collections::HashMap;

use rulemap_core::ByteRange;
use tracing::warn;
use tree_sitter::{Node as TsNode, Parser};

use super::node::{Entry, Node, NodeKind, ScalarValue};
use crate::error::{Result, RuleError};

/// Root node of the first document plus every anchored node.
pub(super) struct ParsedTree {
    pub root: Option<Node>,
    pub anchors: HashMap<String, Node>,
}

pub(super) fn parse_tree(text: &str) -> Result<ParsedTree> {
    let language: tree_sitter::Language = tree_sitter_yaml::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| RuleError::Parse(e.to_string()))?;

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| RuleError::Parse("parser returned no syntax tree".to_string()))?;
    let stream = tree.root_node();

    if stream.is_error() {
        return Err(RuleError::Parse(format!(
            "unrecoverable syntax error at byte {}",
            stream.start_byte()
        )));
    }
    if stream.has_error() {
        if let Some(at) = first_error(stream) {
            warn!(byte = at, "syntax errors in document, erroneous nodes are ignored");
        }
    }

    let mut builder = Builder {
        source: text.as_bytes(),
        anchors: HashMap::new(),
    };

    let content = named_children(stream)
        .into_iter()
        .find(|child| child.kind() == "document")
        .and_then(|document| {
            named_children(document)
                .into_iter()
                .find(|child| matches!(child.kind(), "block_node" | "flow_node"))
        });
    let root = content.map(|node| builder.convert(node));

    Ok(ParsedTree {
        root,
        anchors: builder.anchors,
    })
}

fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn first_error(node: TsNode<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_byte());
    }
    named_children(node)
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn range_of(node: TsNode<'_>) -> ByteRange {
    ByteRange::new(node.start_byte(), node.end_byte())
}

struct Builder<'a> {
    source: &'a [u8],
    anchors: HashMap<String, Node>,
}

impl Builder<'_> {
    fn text(&self, node: TsNode<'_>) -> &str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    fn convert(&mut self, node: TsNode<'_>) -> Node {
        match node.kind() {
            "block_node" | "flow_node" => self.convert_with_properties(node),
            "block_mapping" | "flow_mapping" => {
                let entries = named_children(node)
                    .into_iter()
                    .filter_map(|child| match child.kind() {
                        "block_mapping_pair" | "flow_pair" => Some(self.convert_pair(child)),
                        // `{ a, b }`: keys without values
                        "flow_node" => Some(Entry {
                            key: self.convert(child),
                            value: Node::null(None),
                        }),
                        _ => None,
                    })
                    .collect();
                Node::new(NodeKind::Mapping(entries), Some(range_of(node)))
            }
            "block_sequence" => {
                let items = named_children(node)
                    .into_iter()
                    .filter(|child| child.kind() == "block_sequence_item")
                    .map(|item| {
                        named_children(item)
                            .into_iter()
                            .find(|child| matches!(child.kind(), "block_node" | "flow_node"))
                            .map(|content| self.convert(content))
                            .unwrap_or_else(|| Node::null(Some(range_of(item))))
                    })
                    .collect();
                Node::new(NodeKind::Sequence(items), Some(range_of(node)))
            }
            "flow_sequence" => {
                let items = named_children(node)
                    .into_iter()
                    .filter_map(|child| match child.kind() {
                        "flow_node" => Some(self.convert(child)),
                        "flow_pair" => {
                            let entry = self.convert_pair(child);
                            Some(Node::new(
                                NodeKind::Mapping(vec![entry]),
                                Some(range_of(child)),
                            ))
                        }
                        _ => None,
                    })
                    .collect();
                Node::new(NodeKind::Sequence(items), Some(range_of(node)))
            }
            "plain_scalar" => self.convert_plain(node),
            "double_quote_scalar" => {
                let raw = self.text(node);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                Node::new(
                    NodeKind::Scalar(ScalarValue::String(unescape_double(inner))),
                    Some(inner_range(node)),
                )
            }
            "single_quote_scalar" => {
                let raw = self.text(node);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                Node::new(
                    NodeKind::Scalar(ScalarValue::String(inner.replace("''", "'"))),
                    Some(inner_range(node)),
                )
            }
            "block_scalar" => Node::new(
                NodeKind::Scalar(ScalarValue::String(block_scalar_text(self.text(node)))),
                Some(range_of(node)),
            ),
            "alias" => {
                let name = self.text(node).trim_start_matches('*').to_string();
                Node::new(NodeKind::Alias(name), Some(range_of(node)))
            }
            _ => Node::null(Some(range_of(node))),
        }
    }

    /// `block_node` / `flow_node`: optional anchor and tag, then the content.
    fn convert_with_properties(&mut self, node: TsNode<'_>) -> Node {
        let mut anchor = None;
        let mut content = None;
        for child in named_children(node) {
            match child.kind() {
                "anchor" => {
                    anchor = Some(self.text(child).trim_start_matches('&').to_string());
                }
                "tag" | "comment" => {}
                _ => content = Some(child),
            }
        }

        let mut converted = match content {
            Some(content) => self.convert(content),
            None => Node::null(Some(range_of(node))),
        };
        if let Some(name) = anchor {
            converted.anchor = Some(name.clone());
            self.anchors.insert(name, converted.clone());
        }
        converted
    }

    fn convert_pair(&mut self, pair: TsNode<'_>) -> Entry {
        let key = pair
            .child_by_field_name("key")
            .map(|key| self.convert(key))
            .unwrap_or_else(|| Node::null(None));
        let value = pair
            .child_by_field_name("value")
            .map(|value| self.convert(value))
            .unwrap_or_else(|| Node::null(None));
        Entry { key, value }
    }

    fn convert_plain(&mut self, node: TsNode<'_>) -> Node {
        let range = Some(range_of(node));
        let text = self.text(node);
        let kind = node.named_child(0).map(|child| child.kind()).unwrap_or("string_scalar");

        let value = match kind {
            "null_scalar" => return Node::null(range),
            "boolean_scalar" => ScalarValue::Bool(text.eq_ignore_ascii_case("true")),
            "integer_scalar" => parse_integer(text)
                .map(ScalarValue::Integer)
                .unwrap_or_else(|| ScalarValue::String(text.to_string())),
            "float_scalar" => text
                .parse::<f64>()
                .map(ScalarValue::Float)
                .unwrap_or_else(|_| ScalarValue::String(text.to_string())),
            _ => ScalarValue::String(fold_plain(text)),
        };
        Node::new(NodeKind::Scalar(value), range).with_raw(text)
    }
}

fn inner_range(node: TsNode<'_>) -> ByteRange {
    let start = node.start_byte();
    let end = node.end_byte();
    if end >= start + 2 {
        ByteRange::new(start + 1, end - 1)
    } else {
        ByteRange::new(start, end)
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Multi-line plain scalars fold line breaks into single spaces.
fn fold_plain(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('/') => out.push('/'),
            Some('\\') => out.push('\\'),
            Some(' ') => out.push(' '),
            Some('x') => push_code_point(&mut out, &mut chars, 2),
            Some('u') => push_code_point(&mut out, &mut chars, 4),
            Some('U') => push_code_point(&mut out, &mut chars, 8),
            // escaped line break: continuation, drop it
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, chars: &mut std::str::Chars<'_>, digits: usize) {
    let hex: String = chars.by_ref().take(digits).collect();
    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push_str(&hex),
    }
}

/// Content of a `|` or `>` block scalar with its indentation removed.
fn block_scalar_text(raw: &str) -> String {
    let mut lines = raw.lines();
    let header = lines.next().unwrap_or_default();
    let folded = header.trim_start().starts_with('>');
    let body: Vec<&str> = lines.collect();

    let indent = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let body: Vec<&str> = body
        .iter()
        .map(|line| line.get(indent..).unwrap_or_default())
        .collect();

    let mut text = if folded {
        let mut out = String::new();
        for (i, line) in body.iter().enumerate() {
            if i > 0 {
                if line.is_empty() {
                    out.push('\n');
                } else if !body[i - 1].is_empty() {
                    out.push(' ');
                }
            }
            out.push_str(line);
        }
        out
    } else {
        body.join("\n")
    };

    if header.contains('-') {
        text.truncate(text.trim_end_matches('\n').len());
    } else if !header.contains('+') {
        text.truncate(text.trim_end_matches('\n').len());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_in_common_notations() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("4x"), None);
    }

    #[test]
    fn double_quoted_escapes() {
        assert_eq!(unescape_double(r#"a\"b\\c\nd"#), "a\"b\\c\nd");
        assert_eq!(unescape_double(r"ét\x41"), "étA");
    }

    #[test]
    fn literal_block_scalar_keeps_lines() {
        let raw = "|\n  first line\n  second line\n";
        assert_eq!(block_scalar_text(raw), "first line\nsecond line\n");
    }

    #[test]
    fn folded_block_scalar_joins_lines() {
        let raw = ">-\n  one\n  two\n\n  three";
        assert_eq!(block_scalar_text(raw), "one two\nthree");
    }

    #[test]
    fn multi_line_plain_scalar_folds() {
        assert_eq!(fold_plain("a long\n    value"), "a long value");
    }
}
