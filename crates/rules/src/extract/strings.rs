//! Translation and variable extraction from flattened documents.

use rulemap_core::{Translation, Variables};
use serde_json::Value;

use crate::document::scalar_to_string;
use crate::error::Result;
use crate::policy::{classify_section, SectionKind};

/// Top-level keys that are not rule sections, passed through unchanged.
pub fn variables_from_document(document: &Value) -> Variables {
    let Value::Object(items) = document else {
        return Variables::new();
    };
    items
        .iter()
        .filter(|(key, _)| classify_section(key) == SectionKind::Opaque)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// `extraStrings: [{ type: <locale>, strings: { key: text } }]` of a ruleset file.
pub fn translations_from_ruleset(document: &Value) -> Vec<Translation> {
    let Some(entries) = document.get("extraStrings").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut translations = Vec::new();
    for entry in entries {
        let Some(language) = entry.get("type").and_then(scalar_to_string) else {
            continue;
        };
        let Some(strings) = entry.get("strings").and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in strings {
            if let Some(value) = scalar_to_string(value) {
                translations.push(Translation {
                    language: language.clone(),
                    key: key.clone(),
                    value,
                });
            }
        }
    }
    translations
}

/// A language file: `{ <locale>: { key: text } }`.
pub fn translations_from_language_file(text: &str) -> Result<Vec<Translation>> {
    let document: serde_yaml::Value = serde_yaml::from_str(text)?;
    let serde_yaml::Value::Mapping(locales) = document else {
        return Ok(Vec::new());
    };

    let mut translations = Vec::new();
    for (language, strings) in &locales {
        let (Some(language), serde_yaml::Value::Mapping(strings)) = (yaml_scalar(language), strings)
        else {
            continue;
        };
        for (key, value) in strings {
            if let (Some(key), Some(value)) = (yaml_scalar(key), yaml_scalar(value)) {
                translations.push(Translation {
                    language: language.clone(),
                    key,
                    value,
                });
            }
        }
    }
    Ok(translations)
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variables_are_unrecognized_top_level_keys() {
        let doc = json!({
            "items": [{ "type": "STR_RIFLE" }],
            "maxViewDistance": 20,
            "globe": { "textureSize": 4 },
            "extraStrings": [],
        });
        let variables = variables_from_document(&doc);
        assert_eq!(variables.len(), 2);
        assert_eq!(variables["maxViewDistance"], 20);
        assert_eq!(variables["globe"]["textureSize"], 4);
    }

    #[test]
    fn non_object_document_has_no_variables() {
        assert!(variables_from_document(&json!(null)).is_empty());
        assert!(variables_from_document(&json!([1, 2])).is_empty());
    }

    #[test]
    fn extra_strings_become_translations() {
        let doc = json!({
            "extraStrings": [
                { "type": "en-US", "strings": { "STR_RIFLE": "Rifle", "STR_COUNT": 3 } },
                { "type": "de", "strings": { "STR_RIFLE": "Gewehr" } },
                { "strings": { "STR_ORPHAN": "no locale" } },
            ]
        });
        let mut translations = translations_from_ruleset(&doc);
        translations.sort_by(|a, b| (&a.language, &a.key).cmp(&(&b.language, &b.key)));
        assert_eq!(translations.len(), 3);
        assert_eq!(translations[0].language, "de");
        assert_eq!(translations[1].key, "STR_COUNT");
        assert_eq!(translations[1].value, "3");
        assert_eq!(translations[2].value, "Rifle");
    }

    #[test]
    fn language_file_is_grouped_by_locale() {
        let text = "en-US:\n  STR_RIFLE: Rifle\n  STR_PISTOL: \"Pistol\"\n";
        let translations = translations_from_language_file(text).unwrap();
        assert_eq!(translations.len(), 2);
        assert!(translations.iter().all(|t| t.language == "en-US"));
        assert!(translations
            .iter()
            .any(|t| t.key == "STR_PISTOL" && t.value == "Pistol"));
    }

    #[test]
    fn broken_language_file_is_an_error() {
        assert!(translations_from_language_file("en-US: [unclosed").is_err());
    }
}
