use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Extra display attributes captured alongside a definition or match.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Project-wide named values (top-level keys that are not rule sections).
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// `locale -> key -> text`.
pub type Translations = BTreeMap<String, BTreeMap<String, String>>;

/// Half-open `[start, end)` byte offsets into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Shift both offsets forward by `delta` bytes.
    pub const fn shifted(self, delta: usize) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }
}

impl From<std::ops::Range<usize>> for ByteRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One named rule entry found in a ruleset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub name: String,
    pub range: ByteRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Definition {
    pub fn new(rule_type: impl Into<String>, name: impl Into<String>, range: ByteRange) -> Self {
        Self {
            rule_type: rule_type.into(),
            name: name.into(),
            range,
            metadata: None,
        }
    }

    /// Attach this definition to the file it was read from.
    pub fn into_lookup(self, file: PathBuf) -> DefinitionLookup {
        DefinitionLookup {
            rule_type: self.rule_type,
            range: self.range,
            metadata: self.metadata,
            file,
        }
    }
}

/// A definition as stored in the project index, keyed externally by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionLookup {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub range: ByteRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub file: PathBuf,
}

/// Semantic position of a source range: enclosing rule type and dotted field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleType {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl RuleType {
    pub fn new(rule_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            key: key.into(),
            metadata: None,
        }
    }

    /// Split a matched dotted path into rule type and key.
    ///
    /// `items.requires` becomes type `items`, key `requires`. A path without
    /// a `.` is taken as the rule type with an empty key.
    pub fn from_path(path: &str) -> Self {
        match path.split_once('.') {
            Some((rule_type, key)) => Self::new(rule_type, key),
            None => Self::new(path, ""),
        }
    }

    /// `type.key`, the form used by the cross-reference tables.
    pub fn qualified_key(&self) -> String {
        if self.key.is_empty() {
            self.rule_type.clone()
        } else {
            format!("{}.{}", self.rule_type, self.key)
        }
    }
}

/// A single localized string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub key: String,
    pub value: String,
}
