//! Deep-merge of JSON maps for combining per-file variable contributions.

use serde_json::Value;

/// Deep-merge two JSON values: `overlay` scalars win, containers combine.
///
/// Objects merge recursively and arrays concatenate base then overlay. For
/// any other pair the overlay value replaces the base.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(bm), Value::Object(om)) => {
            let mut merged = bm.clone();
            for (key, overlay_val) in om {
                let value = match bm.get(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (Value::Array(ba), Value::Array(oa)) => {
            Value::Array(ba.iter().chain(oa).cloned().collect())
        }
        (_, overlay) => overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge() {
        let base = json!({ "globe": { "size": 3, "radius": 10 }, "maxViewDistance": 20 });
        let overlay = json!({ "globe": { "size": 5 }, "fogOfWar": true });
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({ "globe": { "size": 5, "radius": 10 }, "maxViewDistance": 20, "fogOfWar": true })
        );
    }

    #[test]
    fn arrays_concatenate_in_order() {
        let base = json!({ "startingBase": { "facilities": ["LIFT", "HANGAR"] } });
        let overlay = json!({ "startingBase": { "facilities": ["LAB"] } });
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({ "startingBase": { "facilities": ["LIFT", "HANGAR", "LAB"] } })
        );
    }

    #[test]
    fn mismatched_kinds_are_replaced() {
        let base = json!({ "list": [1, 2, 3], "name": "a" });
        let overlay = json!({ "list": 4, "name": { "nested": true } });
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({ "list": 4, "name": { "nested": true } })
        );
    }
}
