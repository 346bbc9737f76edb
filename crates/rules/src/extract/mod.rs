//! Per-document extraction: definitions, variables and translations.

mod definitions;
mod strings;

use rulemap_core::Metadata;
use serde_json::{Map, Value};

pub use self::definitions::find_all_definitions;
pub use self::strings::{
    translations_from_language_file, translations_from_ruleset, variables_from_document,
};

/// Copy the listed fields out of a flattened entry; `None` when none are set.
pub(crate) fn capture_metadata(properties: &Map<String, Value>, fields: &[&str]) -> Option<Metadata> {
    let metadata: Metadata = fields
        .iter()
        .filter_map(|field| {
            properties
                .get(*field)
                .map(|value| ((*field).to_string(), value.clone()))
        })
        .collect();
    (!metadata.is_empty()).then_some(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captures_only_listed_fields() {
        let properties = match json!({ "width": 32, "height": 48, "files": {} }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let metadata = capture_metadata(&properties, &["width", "height", "subX"]).unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["width"], 32);

        assert!(capture_metadata(&properties, &["color"]).is_none());
    }
}
