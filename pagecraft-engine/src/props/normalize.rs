use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::{
    css_map_from_json, is_styling_key, PropKind, PropMap, PropValue, CUSTOM_CSS_KEY, TAILWIND_KEY,
    WRAPPED_VALUE_KEY,
};

/// Content fields that mark an object as a structured content record
/// (link, image, contact entry, ...).
const CONTENT_FIELDS: &[&str] = &[
    "text", "src", "href", "email", "alt", "url", "label", "title", "phone",
];

/// Normalizes a raw props mapping into canonical [`PropValue`]s.
///
/// Total: a non-object input yields an empty map.
pub fn normalize(raw: &Value) -> PropMap {
    match raw {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), normalize_value(value)))
            .collect(),
        Value::Null => PropMap::new(),
        other => {
            debug!(shape = json_shape(other), "props root is not a mapping, ignoring");
            PropMap::new()
        }
    }
}

/// Normalizes one prop value. Never fails; unknown shapes degrade to text.
pub fn normalize_value(raw: &Value) -> PropValue {
    if let Value::Object(map) = raw {
        if let Some(kind) = shaped_kind(map) {
            return from_shaped(map, kind);
        }
    }
    classify(raw)
}

/// Gives an array element the record shape every array editor expects.
///
/// Records that already carry utility classes are kept untouched; other
/// records get empty styling fields; scalars are wrapped under `value`.
pub fn wrap_element(element: &Value) -> Value {
    match element {
        Value::Object(map) if map.contains_key(TAILWIND_KEY) => element.clone(),
        Value::Object(map) => {
            let mut record = map.clone();
            record.insert(TAILWIND_KEY.to_string(), Value::String(String::new()));
            record
                .entry(CUSTOM_CSS_KEY.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            Value::Object(record)
        }
        scalar => {
            let mut record = Map::new();
            record.insert(WRAPPED_VALUE_KEY.to_string(), scalar.clone());
            record.insert(TAILWIND_KEY.to_string(), Value::String(String::new()));
            record.insert(CUSTOM_CSS_KEY.to_string(), Value::Object(Map::new()));
            Value::Object(record)
        }
    }
}

fn shaped_kind(map: &Map<String, Value>) -> Option<PropKind> {
    if !map.contains_key("value") {
        return None;
    }
    map.get("kind")
        .or_else(|| map.get("type"))
        .and_then(Value::as_str)
        .and_then(PropKind::parse)
}

fn from_shaped(map: &Map<String, Value>, kind: PropKind) -> PropValue {
    let value = map.get("value").unwrap_or(&Value::Null);
    let classes = map.get(TAILWIND_KEY).and_then(Value::as_str).unwrap_or_default();
    let css = map.get(CUSTOM_CSS_KEY).map(css_map_from_json).unwrap_or_default();

    let mut prop = match (kind, value) {
        (PropKind::Text, Value::String(_)) => classify(value),
        (PropKind::Object, Value::Object(_)) => classify(value),
        (PropKind::Array, Value::Array(_)) => classify(value),
        (PropKind::Text, Value::Number(_) | Value::Bool(_)) => classify(value),
        _ => {
            debug!(
                declared = ?kind,
                shape = json_shape(value),
                "tagged prop payload does not match its kind, reclassifying"
            );
            classify(value)
        }
    };

    if !classes.is_empty() {
        prop.tailwind_classes = classes.to_string();
    }
    if !css.is_empty() {
        prop.custom_css_overrides = css;
    }
    prop
}

fn classify(raw: &Value) -> PropValue {
    match raw {
        Value::String(s) => PropValue::text(s.clone()),
        Value::Number(n) => PropValue::text(n.to_string()),
        Value::Bool(b) => PropValue::text(b.to_string()),
        Value::Null => {
            debug!("null prop value normalized to empty text");
            PropValue::text(String::new())
        }
        Value::Array(items) => PropValue {
            kind: PropKind::Array,
            value: Value::Array(items.iter().map(wrap_element).collect()),
            tailwind_classes: String::new(),
            custom_css_overrides: BTreeMap::new(),
        },
        Value::Object(map) => {
            if !map.keys().any(|k| CONTENT_FIELDS.contains(&k.as_str())) {
                debug!(keys = map.len(), "object prop without content fields kept as object");
            }
            let classes = map
                .get(TAILWIND_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let css = map.get(CUSTOM_CSS_KEY).map(css_map_from_json).unwrap_or_default();
            let value: Map<String, Value> = map
                .iter()
                .filter(|(k, _)| !is_styling_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            PropValue {
                kind: PropKind::Object,
                value: Value::Object(value),
                tailwind_classes: classes,
                custom_css_overrides: css,
            }
        }
    }
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::props_to_json;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flat_string_becomes_text() {
        let prop = normalize_value(&json!("Welcome"));
        assert_eq!(prop, PropValue::text("Welcome"));
    }

    #[test]
    fn numbers_and_bools_are_stringified() {
        assert_eq!(normalize_value(&json!(42)).as_text(), Some("42"));
        assert_eq!(normalize_value(&json!(true)).as_text(), Some("true"));
        assert_eq!(normalize_value(&Value::Null).as_text(), Some(""));
    }

    #[test]
    fn tagged_value_passes_through() {
        let raw = json!({
            "kind": "text",
            "value": "Hi",
            "tailwindClasses": "font-bold",
            "customCssOverrides": { "color": "red" }
        });
        let prop = normalize_value(&raw);
        assert_eq!(prop.kind, PropKind::Text);
        assert_eq!(prop.tailwind_classes, "font-bold");
        assert_eq!(prop.custom_css_overrides.get("color").map(String::as_str), Some("red"));
        assert_eq!(prop.to_json(), raw);
    }

    #[test]
    fn content_object_lifts_styling() {
        let prop = normalize_value(&json!({ "text": "Buy", "href": "/buy", "tailwindClasses": "px-4" }));
        assert_eq!(prop.kind, PropKind::Object);
        assert_eq!(prop.value, json!({ "text": "Buy", "href": "/buy" }));
        assert_eq!(prop.tailwind_classes, "px-4");
    }

    #[test]
    fn array_elements_get_styling_fields() {
        let prop = normalize_value(&json!([{ "title": "A" }, "plain"]));
        assert_eq!(prop.kind, PropKind::Array);
        assert_eq!(
            prop.value,
            json!([
                { "title": "A", "tailwindClasses": "", "customCssOverrides": {} },
                { "value": "plain", "tailwindClasses": "", "customCssOverrides": {} }
            ])
        );
    }

    #[test]
    fn array_elements_with_classes_are_kept() {
        let element = json!({ "title": "A", "tailwindClasses": "p-2" });
        let prop = normalize_value(&json!([element.clone()]));
        assert_eq!(prop.elements(), &[element]);
    }

    #[test]
    fn mismatched_tagged_payload_is_reclassified() {
        let prop = normalize_value(&json!({ "kind": "array", "value": "oops" }));
        assert_eq!(prop.kind, PropKind::Text);
        assert_eq!(prop.as_text(), Some("oops"));
    }

    #[test]
    fn normalize_is_idempotent_on_mixed_props() {
        let raw = json!({
            "title": "Hello",
            "cta": { "text": "Go", "href": "#" },
            "links": ["/a", "/b"],
            "count": 3
        });
        let once = normalize(&raw);
        let twice = normalize(&props_to_json(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn non_object_root_is_empty() {
        assert!(normalize(&json!([1, 2])).is_empty());
        assert!(normalize(&json!("x")).is_empty());
    }
}
