//! Parsed document tree: mappings, sequences and scalars tagged with byte ranges.

use rulemap_core::ByteRange;
use serde_json::Value;

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ScalarValue {
    /// String form, as used for mapping keys and name comparisons.
    pub fn as_text(&self) -> String {
        match self {
            ScalarValue::String(s) => s.clone(),
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::Bool(b) => b.to_string(),
        }
    }

    /// Direct equality for strings, string-coerced equality otherwise.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            ScalarValue::String(s) => s == key,
            other => other.as_text() == key,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::String(s) => Value::String(s.clone()),
            ScalarValue::Integer(i) => Value::from(*i),
            ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScalarValue::Bool(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Mapping(Vec<Entry>),
    Sequence(Vec<Node>),
    Scalar(ScalarValue),
    /// `*name`, resolved against the document's anchors when flattened.
    Alias(String),
    Null,
}

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Option<ByteRange>,
    pub anchor: Option<String>,
    /// Source token of a plain scalar (`0500`, `True`) before typing.
    pub raw: Option<String>,
}

/// A `key: value` pair of a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Node,
    pub value: Node,
}

impl Node {
    pub fn new(kind: NodeKind, range: Option<ByteRange>) -> Self {
        Self {
            kind,
            range,
            anchor: None,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn null(range: Option<ByteRange>) -> Self {
        Self::new(NodeKind::Null, range)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_) | NodeKind::Sequence(_))
    }

    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match &self.kind {
            NodeKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Text of a scalar node, used when the node is a mapping key.
    pub fn key_text(&self) -> Option<String> {
        self.as_scalar().map(ScalarValue::as_text)
    }

    /// True if this scalar's value, or the token as written, equals `key`.
    pub fn matches(&self, key: &str) -> bool {
        self.as_scalar().is_some_and(|value| value.matches(key))
            || (self.as_scalar().is_some() && self.raw.as_deref() == Some(key))
    }

    /// Entry of a mapping node whose key text equals `key`.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.as_mapping()?
            .iter()
            .find(|entry| entry.key.key_text().as_deref() == Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_scalars_match_their_text() {
        assert!(ScalarValue::Integer(500).matches("500"));
        assert!(!ScalarValue::Integer(500).matches("0500"));
        assert!(ScalarValue::Float(1.5).matches("1.5"));
        assert!(ScalarValue::Bool(true).matches("true"));
        assert!(ScalarValue::String("STR_X".into()).matches("STR_X"));
    }

    #[test]
    fn nodes_also_match_their_source_token() {
        let node = Node::new(NodeKind::Scalar(ScalarValue::Integer(500)), None).with_raw("0500");
        assert!(node.matches("0500"));
        assert!(node.matches("500"));
        assert!(!node.matches("05"));
        assert!(!Node::null(None).with_raw("~").matches("~"));
    }

    #[test]
    fn nan_flattens_to_null() {
        assert_eq!(ScalarValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(ScalarValue::Integer(3).to_json(), Value::from(3));
    }
}
