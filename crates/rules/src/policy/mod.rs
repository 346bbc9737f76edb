//! Typed-rule policy: which field names an entry, and which rule types an
//! identifier may resolve to given where it was found.
//!
//! Everything here is a pure lookup over the tables in [`tables`]; every
//! resolution and cross-reference decision elsewhere in the crate goes
//! through these functions.

mod tables;

use rulemap_core::RuleType;
use serde_json::{Map, Value};

use crate::document::scalar_to_string;

use self::tables::{
    KeyRewrite, EXTRA_FILE_SECTIONS, LOGIC_OVERRIDES, METADATA_FIELDS, SINGLE_SPRITE_TYPE_KEY,
    STRINGS_SECTION, TARGETS, TYPE_KEYS,
};

// ── Sections ────────────────────────────────────────────────────────

/// How a top-level section of a ruleset file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Sequence of entries, each named by a type-key field.
    Named,
    /// `extraSprites` / `extraSounds`: named entries whose `files` keys are
    /// definitions as well.
    ExtraFiles,
    /// `extraStrings`: per-language string tables.
    Strings,
    /// Not a recognized rule section; passed through as a project variable.
    Opaque,
}

/// Classify a top-level key of a ruleset document.
pub fn classify_section(name: &str) -> SectionKind {
    if name == STRINGS_SECTION {
        SectionKind::Strings
    } else if EXTRA_FILE_SECTIONS.contains(&name) {
        SectionKind::ExtraFiles
    } else if TYPE_KEYS.iter().any(|(section, _)| *section == name) {
        SectionKind::Named
    } else {
        SectionKind::Opaque
    }
}

// ── Type keys ───────────────────────────────────────────────────────

/// Field of an entry that holds its name, given the entry's flattened properties.
///
/// `extraSprites` entries without a `type` field are named by `typeSingle`.
pub fn type_key_for(rule_type: &str, properties: &Map<String, Value>) -> Option<&'static str> {
    if rule_type == "extraSprites"
        && !properties.contains_key("type")
        && properties.contains_key(SINGLE_SPRITE_TYPE_KEY)
    {
        return Some(SINGLE_SPRITE_TYPE_KEY);
    }

    TYPE_KEYS
        .iter()
        .find(|(section, _)| *section == rule_type)
        .map(|(_, field)| *field)
}

/// True if `candidate` is the value of this entry's type-key field.
pub fn is_type_property_for_key(
    rule_type: &str,
    properties: &Map<String, Value>,
    candidate: &str,
) -> bool {
    type_key_for(rule_type, properties)
        .and_then(|field| properties.get(field))
        .and_then(scalar_to_string)
        .is_some_and(|name| name == candidate)
}

// ── Cross-reference policy ──────────────────────────────────────────

/// Effective lookup for an identifier after known retargets are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicOverride {
    /// Name to look up in the definitions index.
    pub key: String,
    /// The single rule type a candidate must have, if forced.
    pub target: Option<String>,
}

/// Apply retargets that hold regardless of the generic target table.
pub fn check_for_logic_overrides(key: &str, source: Option<&RuleType>) -> LogicOverride {
    let forced = source.and_then(|source| {
        let qualified = source.qualified_key();
        LOGIC_OVERRIDES
            .iter()
            .find(|(field, _, _)| *field == qualified)
    });

    match forced {
        Some((_, target, rewrite)) => LogicOverride {
            key: match rewrite {
                KeyRewrite::Keep => key.to_string(),
                KeyRewrite::Suffix(suffix) => format!("{key}{suffix}"),
            },
            target: Some((*target).to_string()),
        },
        None => LogicOverride {
            key: key.to_string(),
            target: None,
        },
    }
}

/// Can an identifier found at `source` resolve to a definition of `candidate`?
///
/// Fields without an entry in the target table accept any rule type.
pub fn is_target_for_source_rule(source: &RuleType, candidate: &str) -> bool {
    let qualified = source.qualified_key();
    match TARGETS.iter().find(|(field, _)| *field == qualified) {
        Some((_, targets)) => targets.contains(&candidate),
        None => true,
    }
}

/// Fields captured as match metadata for entries under `path`.
pub fn metadata_fields_for_type(path: &str) -> Option<&'static [&'static str]> {
    METADATA_FIELDS
        .iter()
        .find(|(entry_path, _)| *entry_path == path)
        .map(|(_, fields)| *fields)
}
