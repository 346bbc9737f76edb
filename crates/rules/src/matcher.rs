//! Recursive key matcher: which rule type and field does a byte range sit in?
//!
//! The walk starts at the entries of every top-level section and carries the
//! dotted path of the current position (`units.stats.tu`). Sequences nested
//! below an entry add `[]` to the path of their container items
//! (`alienMissions.waves[].ufo`). A token matches only when its node range is
//! exactly the queried range *and* its text equals the queried key; equal
//! text at another offset is a different token.

use rulemap_core::{ByteRange, RuleType};
use tracing::{debug, error};

use crate::document::{Node, NodeKind, RulesetDocument};
use crate::extract::capture_metadata;
use crate::policy::metadata_fields_for_type;

/// Resolve the token covering `range` in `text`.
///
/// The key is read from the text itself. A range that includes the quotes
/// of a quoted scalar is narrowed to its content first.
pub fn resolve_at_range(text: &str, range: ByteRange) -> Option<RuleType> {
    let (key, range) = token_at(text, range)?;
    resolve_key(text, key, range)
}

/// Resolve a known key at `range` in `text`.
pub fn resolve_key(text: &str, key: &str, range: ByteRange) -> Option<RuleType> {
    let doc = RulesetDocument::parse_or_empty(text);
    find_key(&doc, key, range)
}

/// Resolve `key` at `range` in an already parsed document.
pub fn find_key(doc: &RulesetDocument, key: &str, range: ByteRange) -> Option<RuleType> {
    let matcher = KeyMatcher { doc, key, range };
    let sections = doc.sections()?;

    for section in sections {
        let Some(rule_type) = section.key.key_text() else {
            continue;
        };
        if section.key.range == Some(range) && section.key.matches(key) {
            return Some(RuleType::new(rule_type, ""));
        }
        let Some(entries) = section.value.as_sequence() else {
            continue;
        };
        for entry in entries {
            if let Some(found) = matcher.walk_item(entry, &rule_type) {
                debug!(key, path = %found.qualified_key(), "resolved key");
                return Some(found);
            }
        }
    }

    debug!(key, %range, "no token at range");
    None
}

/// Range of the node anchored as `name` (`&name`), for following a `*name` alias.
///
/// A leading `*` or `&` on `name` is ignored.
pub fn find_anchor(text: &str, name: &str) -> Option<ByteRange> {
    let name = name.trim_start_matches(['*', '&']);
    let found = RulesetDocument::parse_or_empty(text).anchor_range(name);
    if found.is_none() {
        debug!(name, "no such anchor");
    }
    found
}

fn token_at(text: &str, range: ByteRange) -> Option<(&str, ByteRange)> {
    let slice = text.get(range.start..range.end)?;
    for quote in ['"', '\''] {
        if slice.len() >= 2 && slice.starts_with(quote) && slice.ends_with(quote) {
            let inner = ByteRange::new(range.start + 1, range.end - 1);
            return Some((&slice[1..slice.len() - 1], inner));
        }
    }
    Some((slice, range))
}

struct KeyMatcher<'a> {
    doc: &'a RulesetDocument,
    key: &'a str,
    range: ByteRange,
}

impl KeyMatcher<'_> {
    fn is_match(&self, node: &Node) -> bool {
        node.range == Some(self.range) && node.matches(self.key)
    }

    /// One element of a sequence whose own path is `path`.
    fn walk_item(&self, node: &Node, path: &str) -> Option<RuleType> {
        match &node.kind {
            NodeKind::Mapping(_) => self.walk_mapping(node, path),
            NodeKind::Sequence(items) => {
                let path = format!("{path}[]");
                items.iter().find_map(|item| self.walk_item(item, &path))
            }
            NodeKind::Scalar(_) => self.is_match(node).then(|| RuleType::from_path(path)),
            NodeKind::Null => {
                error!(path, range = ?node.range, "null entry in ruleset, skipping");
                None
            }
            NodeKind::Alias(_) => None,
        }
    }

    fn walk_value(&self, node: &Node, path: &str) -> Option<RuleType> {
        match &node.kind {
            NodeKind::Mapping(_) => self.walk_mapping(node, path),
            NodeKind::Sequence(items) => items.iter().find_map(|item| {
                if item.is_container() {
                    self.walk_item(item, &format!("{path}[]"))
                } else {
                    self.walk_item(item, path)
                }
            }),
            NodeKind::Scalar(_) => self.is_match(node).then(|| RuleType::from_path(path)),
            NodeKind::Null | NodeKind::Alias(_) => None,
        }
    }

    fn walk_mapping(&self, node: &Node, path: &str) -> Option<RuleType> {
        let entries = node.as_mapping()?;

        let found = entries.iter().find_map(|entry| {
            if entry.key.is_null() {
                error!(path, range = ?entry.key.range, "mapping entry without a key, skipping");
                return None;
            }
            if self.is_match(&entry.key) {
                return Some(RuleType::from_path(path));
            }
            let field = entry.key.key_text()?;
            self.walk_value(&entry.value, &format!("{path}.{field}"))
        });

        found.map(|mut found| {
            if found.metadata.is_none() {
                found.metadata = metadata_fields_for_type(path)
                    .and_then(|fields| capture_metadata(&self.doc.flatten_properties(node), fields));
            }
            found
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nth_range(text: &str, needle: &str, nth: usize) -> ByteRange {
        let start = text
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .expect("needle present");
        ByteRange::new(start, start + needle.len())
    }

    const ITEMS: &str = "items:\n  - type: STR_RIFLE\n    requires:\n      - STR_LASER\n    costBuy: 500\n  - type: STR_PISTOL\n    requires:\n      - STR_LASER\n";

    #[test]
    fn type_value_resolves_to_its_field() {
        let found = resolve_at_range(ITEMS, nth_range(ITEMS, "STR_RIFLE", 0)).unwrap();
        assert_eq!(found.rule_type, "items");
        assert_eq!(found.key, "type");
    }

    #[test]
    fn scalar_sequence_elements_keep_the_field_path() {
        let found = resolve_at_range(ITEMS, nth_range(ITEMS, "STR_LASER", 0)).unwrap();
        assert_eq!(found.rule_type, "items");
        assert_eq!(found.key, "requires");
    }

    #[test]
    fn equal_text_at_another_range_is_not_a_match() {
        let first = nth_range(ITEMS, "STR_LASER", 0);
        let second = nth_range(ITEMS, "STR_LASER", 1);
        assert!(resolve_key(ITEMS, "STR_LASER", first).is_some());
        assert!(resolve_key(ITEMS, "STR_LASER", second).is_some());

        let shifted = ByteRange::new(first.start + 1, first.end);
        assert!(resolve_key(ITEMS, "STR_LASER", shifted).is_none());
        assert!(resolve_key(ITEMS, "STR_PISTOL", first).is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_their_own_entry() {
        let text = "units:\n  - type: STR_SOLDIER\n    armor: STR_A\n  - type: STR_SOLDIER\n    race: STR_HUMAN\n";
        let first = resolve_at_range(text, nth_range(text, "STR_SOLDIER", 0)).unwrap();
        let second = resolve_at_range(text, nth_range(text, "STR_SOLDIER", 1)).unwrap();
        assert_eq!(first.qualified_key(), "units.type");
        assert_eq!(second.qualified_key(), "units.type");

        let armor = resolve_at_range(text, nth_range(text, "STR_A", 0)).unwrap();
        assert_eq!(armor.key, "armor");
    }

    #[test]
    fn numbers_match_by_their_text() {
        let found = resolve_at_range(ITEMS, nth_range(ITEMS, "500", 0)).unwrap();
        assert_eq!(found.key, "costBuy");
    }

    #[test]
    fn typed_scalars_match_as_written() {
        let text = "items:\n  - type: STR_RIFLE\n    weight: 0500\n    power: 1.0\n    twoHanded: True\n";
        for (token, field) in [("0500", "weight"), ("1.0", "power"), ("True", "twoHanded")] {
            let found = resolve_at_range(text, nth_range(text, token, 0))
                .unwrap_or_else(|| panic!("{token} resolves"));
            assert_eq!(found.key, field);
        }
    }

    #[test]
    fn aliases_lead_to_their_anchor() {
        let text = "items:\n  - type: STR_BASE\n    stats: &STATS\n      power: 10\n  - type: STR_CHILD\n    stats: *STATS\n";
        let anchored = find_anchor(text, "*STATS").unwrap();
        assert_eq!(find_anchor(text, "STATS"), Some(anchored));
        assert_eq!(text[anchored.start..anchored.end].trim_end(), "power: 10");
        assert_eq!(find_anchor(text, "MISSING"), None);
    }

    #[test]
    fn nested_mappings_extend_the_path() {
        let text = "units:\n  - type: STR_SOLDIER\n    stats:\n      tu: 60\n";
        let found = resolve_at_range(text, nth_range(text, "60", 0)).unwrap();
        assert_eq!(found.qualified_key(), "units.stats.tu");
    }

    #[test]
    fn mappings_inside_sequences_add_brackets() {
        let text = "alienMissions:\n  - type: STR_ALIEN_RESEARCH\n    waves:\n      - ufo: STR_SMALL_SCOUT\n        count: 1\n";
        let found = resolve_at_range(text, nth_range(text, "STR_SMALL_SCOUT", 0)).unwrap();
        assert_eq!(found.rule_type, "alienMissions");
        assert_eq!(found.key, "waves[].ufo");
    }

    #[test]
    fn key_tokens_resolve_to_the_containing_mapping() {
        let text = "extraSprites:\n  - type: BIGOBS.PCK\n    files:\n      512: Resources/rifle.png\n";
        let found = resolve_at_range(text, nth_range(text, "512", 0)).unwrap();
        assert_eq!(found.qualified_key(), "extraSprites.files");
    }

    #[test]
    fn section_name_resolves_to_bare_type() {
        let found = resolve_at_range(ITEMS, nth_range(ITEMS, "items", 0)).unwrap();
        assert_eq!(found.rule_type, "items");
        assert_eq!(found.key, "");
    }

    #[test]
    fn metadata_is_captured_from_the_enclosing_entry() {
        let text = "extraSprites:\n  - type: BIGOBS.PCK\n    width: 32\n    height: 48\n    files:\n      512: Resources/rifle.png\n";
        let found = resolve_at_range(text, nth_range(text, "BIGOBS.PCK", 0)).unwrap();
        let metadata = found.metadata.unwrap();
        assert_eq!(metadata["width"], 32);
        assert_eq!(metadata["height"], 48);
    }

    #[test]
    fn innermost_metadata_wins() {
        let text = "interfaces:\n  - type: geoscape\n    elements:\n      - id: button\n        color: 8\n      - id: window\n        color: 9\n";
        let found = resolve_at_range(text, nth_range(text, "window", 0)).unwrap();
        assert_eq!(found.key, "elements[].id");
        assert_eq!(found.metadata.unwrap()["color"], 9);
    }

    #[test]
    fn quoted_range_is_narrowed_to_content() {
        let text = "items:\n  - type: \"STR_RIFLE\"\n";
        let start = text.find('"').unwrap();
        let found = resolve_at_range(text, ByteRange::new(start, start + "\"STR_RIFLE\"".len())).unwrap();
        assert_eq!(found.key, "type");
    }

    #[test]
    fn null_items_are_skipped_and_siblings_still_match() {
        let text = "items:\n  -\n  - type: STR_RIFLE\n";
        let found = resolve_at_range(text, nth_range(text, "STR_RIFLE", 0)).unwrap();
        assert_eq!(found.qualified_key(), "items.type");
    }

    #[test]
    fn out_of_bounds_or_unmatched_ranges_yield_nothing() {
        assert!(resolve_at_range(ITEMS, ByteRange::new(1000, 1004)).is_none());
        assert!(resolve_at_range(ITEMS, ByteRange::new(0, 3)).is_none());
        assert!(resolve_at_range("", ByteRange::new(0, 0)).is_none());
    }
}
