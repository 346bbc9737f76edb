//! Definition extraction: every named rule entry in one document.

use rulemap_core::Definition;
use serde_json::{Map, Value};

use crate::document::{scalar_to_string, Node, RulesetDocument};
use crate::policy::{classify_section, metadata_fields_for_type, type_key_for, SectionKind};

use super::capture_metadata;

/// Field of `extraSprites` / `extraSounds` entries whose keys are definitions.
const FILES_KEY: &str = "files";

/// Collect `(ruleType, name, range)` for every definition in the document.
///
/// Entries without a recognized type-key field are skipped. A document with
/// no top-level items yields nothing.
pub fn find_all_definitions(doc: &RulesetDocument) -> Vec<Definition> {
    let Some(sections) = doc.sections() else {
        return Vec::new();
    };

    let mut definitions = Vec::new();
    for section in sections {
        let Some(rule_type) = section.key.key_text() else {
            continue;
        };
        let kind = classify_section(&rule_type);
        if !matches!(kind, SectionKind::Named | SectionKind::ExtraFiles) {
            continue;
        }
        let Some(entries) = section.value.as_sequence() else {
            continue;
        };

        for entry in entries.iter().filter(|entry| entry.as_mapping().is_some()) {
            let properties = doc.flatten_properties(entry);

            if kind == SectionKind::ExtraFiles {
                extra_file_definitions(&rule_type, entry, &properties, &mut definitions);
            }

            if let Some(definition) = named_definition(&rule_type, entry, &properties) {
                definitions.push(definition);
            }
        }
    }

    definitions
}

fn named_definition(
    rule_type: &str,
    entry: &Node,
    properties: &Map<String, Value>,
) -> Option<Definition> {
    let type_key = type_key_for(rule_type, properties)?;
    let name = properties.get(type_key).and_then(scalar_to_string)?;
    let range = entry.entry(type_key)?.value.range?;

    let mut definition = Definition::new(rule_type, name, range);
    definition.metadata = metadata_fields_for_type(rule_type)
        .and_then(|fields| capture_metadata(properties, fields));
    Some(definition)
}

/// `extraSprites: [{ type: BIGOBS.PCK, files: { 0: a.png } }]` defines
/// `0` as `extraSprites.BIGOBS.PCK.files`.
fn extra_file_definitions(
    rule_type: &str,
    entry: &Node,
    properties: &Map<String, Value>,
    definitions: &mut Vec<Definition>,
) {
    let Some(files) = entry.entry(FILES_KEY).and_then(|e| e.value.as_mapping()) else {
        return;
    };
    let entry_type = type_key_for(rule_type, properties)
        .and_then(|key| properties.get(key))
        .and_then(scalar_to_string)
        .unwrap_or_default();
    let file_rule_type = format!("{rule_type}.{entry_type}.{FILES_KEY}");
    let metadata = metadata_fields_for_type(rule_type)
        .and_then(|fields| capture_metadata(properties, fields));

    for file in files {
        let (Some(name), Some(range)) = (file.key.key_text(), file.key.range) else {
            continue;
        };
        let mut definition = Definition::new(file_rule_type.clone(), name, range);
        definition.metadata = metadata.clone();
        definitions.push(definition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulemap_core::ByteRange;

    fn definitions(text: &str) -> Vec<Definition> {
        find_all_definitions(&RulesetDocument::parse(text).unwrap())
    }

    fn range_of(text: &str, needle: &str) -> ByteRange {
        let start = text.find(needle).expect("needle present");
        ByteRange::new(start, start + needle.len())
    }

    #[test]
    fn finds_named_entries_with_value_ranges() {
        let text = "items:\n  - type: STR_RIFLE\n    requires: STR_LASER\n  - type: STR_PISTOL\nresearch:\n  - name: STR_LASER\n";
        let defs = definitions(text);
        assert_eq!(defs.len(), 3);

        assert_eq!(defs[0].rule_type, "items");
        assert_eq!(defs[0].name, "STR_RIFLE");
        assert_eq!(defs[0].range, range_of(text, "STR_RIFLE"));
        assert_eq!(defs[1].name, "STR_PISTOL");
        assert_eq!(defs[2].rule_type, "research");
        assert_eq!(defs[2].name, "STR_LASER");
        let start = text.rfind("STR_LASER").unwrap();
        assert_eq!(defs[2].range, ByteRange::new(start, start + "STR_LASER".len()));
    }

    #[test]
    fn entries_without_type_key_are_skipped() {
        let text = "items:\n  - delete: STR_RIFLE\n  - type: STR_PISTOL\n";
        let defs = definitions(text);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "STR_PISTOL");
    }

    #[test]
    fn variables_and_strings_are_not_definitions() {
        let text = "maxViewDistance: 20\nextraStrings:\n  - type: en-US\n    strings:\n      STR_X: X\n";
        assert!(definitions(text).is_empty());
    }

    #[test]
    fn extra_sprite_files_are_definitions() {
        let text = "extraSprites:\n  - type: BIGOBS.PCK\n    width: 32\n    height: 48\n    files:\n      512: Resources/rifle.png\n      513: Resources/pistol.png\n";
        let defs = definitions(text);
        assert_eq!(defs.len(), 3);

        assert_eq!(defs[0].rule_type, "extraSprites.BIGOBS.PCK.files");
        assert_eq!(defs[0].name, "512");
        assert_eq!(defs[0].range, range_of(text, "512"));
        let metadata = defs[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["width"], 32);
        assert_eq!(metadata["height"], 48);

        assert_eq!(defs[1].name, "513");
        assert_eq!(defs[2].rule_type, "extraSprites");
        assert_eq!(defs[2].name, "BIGOBS.PCK");
    }

    #[test]
    fn extra_sounds_files_are_definitions() {
        let text = "extraSounds:\n  - type: BATTLE.CAT\n    files:\n      55: Resources/shot.ogg\n";
        let defs = definitions(text);
        assert_eq!(defs[0].rule_type, "extraSounds.BATTLE.CAT.files");
        assert_eq!(defs[0].name, "55");
        assert!(defs[0].metadata.is_none());
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(definitions("").is_empty());
        assert!(definitions("# only a comment\n").is_empty());
    }
}
